use std::ffi::OsString;
use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};

use textburn_core::caption::domain::time_parser::parse_time;
use textburn_core::caption::infrastructure::font_resolver::FontResolver;
use textburn_core::overlay::domain::filter_graph::build_filter_graph;
use textburn_core::overlay::domain::overlay_backend::ProgressCallback;
use textburn_core::overlay::infrastructure::backend_factory::{create_backend, BackendChoice};
use textburn_core::pipeline::add_text_use_case::{
    default_output_path, AddTextRequest, AddTextUseCase, DEFAULT_DURATION, DEFAULT_FONTSIZE,
    DEFAULT_PADDING,
};
use textburn_core::shared::constants::FFMPEG_ENV_VAR;
use textburn_core::shared::error::OverlayError;

/// Burns timed, fading text captions into videos.
#[derive(Parser, Debug)]
#[command(name = "textburn", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Overlay one caption, or several timed ones, onto a video.
    Addtext(AddTextArgs),
}

#[derive(Args, Debug)]
struct AddTextArgs {
    /// Input video file.
    main_video: PathBuf,

    /// Caption text.
    #[arg(short = 't', long, conflicts_with = "multi_text")]
    text: Option<String>,

    /// Timed caption as "text,start,duration" (repeatable, alias -mt).
    #[arg(long = "multi-text", value_name = "TEXT,START,DURATION")]
    multi_text: Vec<String>,

    /// Output file [default: <input stem>_text.mp4 next to the input].
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// top-left, top-right, bottom-left, bottom-right, center or bottom.
    #[arg(short, long, default_value = "bottom")]
    position: String,

    /// Caption start, in seconds or m:s / h:m:s (alias -st).
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    start_time: String,

    /// Caption end; defaults to start + duration (alias -et).
    #[arg(long, allow_hyphen_values = true)]
    end_time: Option<String>,

    /// Font size in pixels.
    #[arg(short, long, default_value_t = DEFAULT_FONTSIZE, allow_negative_numbers = true)]
    fontsize: i64,

    /// Margin around the caption in pixels (alias -pad).
    #[arg(long, default_value_t = DEFAULT_PADDING)]
    padding: u32,

    /// Caption duration in seconds, used when --end-time is absent.
    #[arg(short, long, default_value_t = DEFAULT_DURATION, allow_negative_numbers = true)]
    duration: f64,

    /// Font file (falls back to TEXTBURN_FONT, bundled and system fonts).
    #[arg(long)]
    font: Option<PathBuf>,

    /// Text color: a name or #rrggbb.
    #[arg(long, default_value = "white")]
    color: String,

    /// Outline width in pixels [default: 2, or 10 with --sticker].
    #[arg(long)]
    stroke_width: Option<u32>,

    /// Heavy outline sticker style.
    #[arg(long)]
    sticker: bool,

    /// Renderer to use.
    #[arg(long, default_value = "composite", value_parser = ["composite", "ffmpeg"])]
    backend: String,

    /// ffmpeg executable for the ffmpeg backend.
    #[arg(long, env = FFMPEG_ENV_VAR)]
    ffmpeg: Option<PathBuf>,

    /// Print the drawtext filter graph and exit without encoding.
    #[arg(long)]
    print_filter: bool,
}

impl AddTextArgs {
    fn to_request(&self) -> Result<AddTextRequest, OverlayError> {
        Ok(AddTextRequest {
            text: self.text.clone(),
            multi_text: self.multi_text.clone(),
            start_time: parse_time(&self.start_time)?,
            end_time: self.end_time.as_deref().map(parse_time).transpose()?,
            duration: self.duration,
            position: self.position.clone(),
            fontsize: self.fontsize,
            padding: self.padding,
            stroke_width: self.stroke_width,
            sticker: self.sticker,
            color: self.color.clone(),
            ..AddTextRequest::new(&self.main_video)
        })
    }
}

/// Single-dash long flags accepted for compatibility.
const LEGACY_FLAGS: [(&str, &str); 4] = [
    ("-st", "--start-time"),
    ("-et", "--end-time"),
    ("-mt", "--multi-text"),
    ("-pad", "--padding"),
];

/// Rewrites `-st 5` / `-st=5` style flags to their long forms. Stops at `--`.
fn rewrite_legacy_flags(args: impl IntoIterator<Item = OsString>) -> Vec<OsString> {
    let mut passthrough = false;
    args.into_iter()
        .map(|arg| {
            if passthrough {
                return arg;
            }
            let Some(text) = arg.to_str() else {
                return arg;
            };
            if text == "--" {
                passthrough = true;
                return arg;
            }
            for (legacy, long) in LEGACY_FLAGS {
                if text == legacy {
                    return long.into();
                }
                if let Some(value) = text.strip_prefix(legacy).and_then(|v| v.strip_prefix('=')) {
                    return format!("{long}={value}").into();
                }
            }
            arg
        })
        .collect()
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(e.exit_code());
    }
}

fn run() -> Result<(), OverlayError> {
    let cli = Cli::parse_from(rewrite_legacy_flags(std::env::args_os()));
    match cli.command {
        Command::Addtext(args) => add_text(&args),
    }
}

fn add_text(args: &AddTextArgs) -> Result<(), OverlayError> {
    let request = args.to_request()?;
    let captions = request.validate()?;
    let fonts = FontResolver::from_env(args.font.clone());

    if args.print_filter {
        let font = fonts.resolve()?;
        println!("{}", build_filter_graph(&captions, &font));
        return Ok(());
    }

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&request.video));
    let choice: BackendChoice = args.backend.parse()?;
    let backend = create_backend(choice, &fonts, args.ffmpeg.as_deref())?;

    let progress: ProgressCallback = Box::new(|done: usize, total: usize| {
        if total > 0 {
            eprint!("\rRendering frame {done}/{total}");
        } else {
            eprint!("\rRendering frame {done}");
        }
    });

    let mut use_case = AddTextUseCase::new(backend, Some(progress));
    use_case.execute(&request.video, &captions, &output)?;
    eprintln!();
    log::info!("Output written to {}", output.display());
    Ok(())
}
