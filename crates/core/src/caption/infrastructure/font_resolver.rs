use std::env;
use std::path::{Path, PathBuf};

use crate::shared::constants::{
    BUNDLED_FONT_DIR, BUNDLED_FONT_NAME, FONT_ENV_VAR, FONT_EXTENSIONS, SYSTEM_FONT_CANDIDATES,
};
use crate::shared::error::OverlayError;

/// Picks the font file captions are rendered with.
///
/// Resolution order:
/// 1. Explicit path (must exist)
/// 2. Configured default (`TEXTBURN_FONT`, must exist when set)
/// 3. Bundled `fonts/` directory next to the executable
/// 4. User font directory
/// 5. Well-known system fonts
#[derive(Clone, Debug)]
pub struct FontResolver {
    explicit: Option<PathBuf>,
    configured: Option<PathBuf>,
    bundled_dir: Option<PathBuf>,
    search_system: bool,
}

impl FontResolver {
    pub fn new(explicit: Option<PathBuf>) -> Self {
        Self {
            explicit,
            configured: None,
            bundled_dir: None,
            search_system: true,
        }
    }

    /// Resolver configured from the environment and the executable location.
    pub fn from_env(explicit: Option<PathBuf>) -> Self {
        let configured = env::var_os(FONT_ENV_VAR)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        let bundled_dir = env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join(BUNDLED_FONT_DIR)));
        Self {
            configured,
            bundled_dir,
            ..Self::new(explicit)
        }
    }

    pub fn with_configured_default(mut self, path: impl Into<PathBuf>) -> Self {
        self.configured = Some(path.into());
        self
    }

    pub fn with_bundled_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.bundled_dir = Some(dir.into());
        self
    }

    pub fn without_system_fonts(mut self) -> Self {
        self.search_system = false;
        self
    }

    pub fn resolve(&self) -> Result<PathBuf, OverlayError> {
        if let Some(required) = self.explicit.as_ref().or(self.configured.as_ref()) {
            return if required.is_file() {
                Ok(required.clone())
            } else {
                Err(OverlayError::FontMissing(required.clone()))
            };
        }

        if let Some(found) = self.bundled_dir.as_deref().and_then(find_in_dir) {
            return Ok(found);
        }

        if self.search_system {
            let user_font = dirs::font_dir().map(|dir| dir.join(BUNDLED_FONT_NAME));
            let system = SYSTEM_FONT_CANDIDATES.iter().map(PathBuf::from);
            if let Some(found) = user_font.into_iter().chain(system).find(|p| p.is_file()) {
                return Ok(found);
            }
        }

        Err(OverlayError::FontNotFound)
    }
}

/// Prefers the default font name, otherwise the first font file by name.
fn find_in_dir(dir: &Path) -> Option<PathBuf> {
    let preferred = dir.join(BUNDLED_FONT_NAME);
    if preferred.is_file() {
        return Some(preferred);
    }
    let mut fonts: Vec<PathBuf> = std::fs::read_dir(dir)
        .ok()?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| is_font_file(path))
        .collect();
    fonts.sort();
    fonts.into_iter().next()
}

fn is_font_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| FONT_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
            .unwrap_or(false)
}

/// First installed font from the system fallback list, if any.
pub fn system_font() -> Option<PathBuf> {
    FontResolver::new(None).resolve().ok()
}
