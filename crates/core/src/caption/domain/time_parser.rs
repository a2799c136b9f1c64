use crate::shared::error::OverlayError;

/// Converts a time token to seconds.
///
/// Accepts bare seconds (`"5"`, `"2.5"`) and colon notation (`"1:20"`,
/// `"1:02:03.5"`). A comma may stand in for the decimal point (`"0:01,5"`).
pub fn parse_time(token: &str) -> Result<f64, OverlayError> {
    let invalid = || OverlayError::TimeFormat(token.to_string());

    let parts: Vec<&str> = token.trim().split(':').collect();
    if parts.len() > 3 {
        return Err(invalid());
    }

    let mut seconds = 0.0;
    for part in &parts {
        let value = parse_component(part).ok_or_else(invalid)?;
        if parts.len() > 1 && value < 0.0 {
            return Err(invalid());
        }
        seconds = seconds * 60.0 + value;
    }
    Ok(seconds)
}

fn parse_component(part: &str) -> Option<f64> {
    let normalized = part.trim().replace(',', ".");
    if normalized.is_empty() {
        return None;
    }
    let value: f64 = normalized.parse().ok()?;
    value.is_finite().then_some(value)
}

/// Splits a `"text,start,duration"` caption spec.
///
/// Only the first two commas separate fields, so any further comma ends up
/// in `duration` and is rejected. `start` accepts any [`parse_time`]
/// notation; `duration` is plain seconds.
pub fn parse_multi_caption(spec: &str) -> Result<(String, f64, f64), OverlayError> {
    let invalid = || OverlayError::MultiCaptionFormat(spec.to_string());

    let mut fields = spec.splitn(3, ',');
    let (Some(text), Some(start), Some(duration)) = (fields.next(), fields.next(), fields.next())
    else {
        return Err(invalid());
    };

    let text = text.trim();
    if text.is_empty() {
        return Err(invalid());
    }
    let start = parse_time(start).map_err(|_| invalid())?;
    let duration = duration
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|d| d.is_finite())
        .ok_or_else(invalid)?;

    Ok((text.to_string(), start, duration))
}
