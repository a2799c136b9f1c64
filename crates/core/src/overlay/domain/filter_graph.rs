use std::fmt;
use std::path::Path;

use crate::caption::domain::caption_spec::CaptionSpec;
use crate::shared::constants::STROKE_COLOR_NAME;

/// Characters ffmpeg's option parser splits or unquotes on.
const OPTION_SPECIAL: [char; 3] = ['\\', '\'', ':'];
/// Characters the filter graph parser splits or unquotes on.
const GRAPH_SPECIAL: [char; 6] = ['\\', '\'', '[', ']', ',', ';'];

/// One `drawtext` filter clause.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawText {
    pub fontfile: String,
    pub text: String,
    pub fontsize: u32,
    pub fontcolor: String,
    pub borderw: u32,
    pub x: String,
    pub y: String,
    pub alpha: String,
}

impl DrawText {
    pub fn for_caption(caption: &CaptionSpec, font: &Path) -> Self {
        let style = caption.style();
        let expr = style.position.pixel_expr(style.text_inset());
        Self {
            fontfile: font.to_string_lossy().into_owned(),
            text: caption.text().to_string(),
            fontsize: style.fontsize,
            fontcolor: style.color.ffmpeg_literal(),
            borderw: style.effective_stroke_width(),
            x: expr.x_expr(),
            y: expr.y_expr(),
            alpha: caption.fade_window().alpha_expression().to_string(),
        }
    }

    fn options(&self) -> [(&'static str, String); 9] {
        [
            ("fontfile", self.fontfile.clone()),
            ("text", escape_expansion(&self.text)),
            ("fontsize", self.fontsize.to_string()),
            ("fontcolor", self.fontcolor.clone()),
            ("borderw", self.borderw.to_string()),
            ("bordercolor", STROKE_COLOR_NAME.to_string()),
            ("x", self.x.clone()),
            ("y", self.y.clone()),
            ("alpha", self.alpha.clone()),
        ]
    }
}

/// Renders the clause as one filter graph entry. Values are escaped for the
/// option parser, then the whole argument list for the graph parser.
impl fmt::Display for DrawText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let args = self
            .options()
            .iter()
            .map(|(key, value)| format!("{key}={}", escape_token(value, &OPTION_SPECIAL)))
            .collect::<Vec<_>>()
            .join(":");
        write!(f, "drawtext={}", escape_token(&args, &GRAPH_SPECIAL))
    }
}

/// Chains one `drawtext` per caption, in order, into a single `-vf` value.
pub fn build_filter_graph(captions: &[CaptionSpec], font: &Path) -> String {
    captions
        .iter()
        .map(|caption| DrawText::for_caption(caption, font).to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Quotes `%` and `\` so `drawtext` prints them instead of expanding them.
fn escape_expansion(text: &str) -> String {
    text.replace('\\', "\\\\").replace('%', "\\%")
}

/// Backslash-escapes every `special` character, plus whitespace at either
/// end, which ffmpeg's tokenizer would otherwise trim.
fn escape_token(value: &str, special: &[char]) -> String {
    let last = value.chars().count().saturating_sub(1);
    let mut out = String::with_capacity(value.len());
    for (i, c) in value.chars().enumerate() {
        if special.contains(&c) || (c.is_whitespace() && (i == 0 || i == last)) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caption::domain::caption_spec::CaptionStyle;
    use crate::caption::domain::position::Position;
    use crate::caption::domain::text_color::TextColor;
    use rstest::rstest;

    fn caption(text: &str, start: f64, duration: f64) -> CaptionSpec {
        CaptionSpec::new(text, start, duration, CaptionStyle::default()).unwrap()
    }

    // --- ffmpeg's parsing, for decoding clauses back ---

    const WHITESPACE: [char; 4] = [' ', '\n', '\t', '\r'];

    /// Reads one token up to a `term` character, honouring `\` escapes and
    /// `'` quoting and trimming unprotected whitespace, as libavutil does.
    fn get_token<'a>(buf: &'a str, term: &str) -> (String, &'a str) {
        let buf = buf.trim_start_matches(WHITESPACE);
        let mut out = String::new();
        let mut keep = 0;
        let mut chars = buf.char_indices();
        let mut rest = "";
        while let Some((i, c)) = chars.next() {
            if term.contains(c) {
                rest = &buf[i..];
                break;
            }
            match c {
                '\\' => match chars.next() {
                    Some((_, next)) => {
                        out.push(next);
                        keep = out.len();
                    }
                    None => out.push(c),
                },
                '\'' => {
                    let mut closed = false;
                    for (_, q) in chars.by_ref() {
                        if q == '\'' {
                            closed = true;
                            break;
                        }
                        out.push(q);
                    }
                    if closed {
                        keep = out.len();
                    }
                }
                _ => out.push(c),
            }
        }
        let tail = out[keep..].trim_end_matches(WHITESPACE).len();
        out.truncate(keep + tail);
        (out, rest)
    }

    /// Splits a filter chain into its filters' `key=value` options.
    fn parse_chain(graph: &str) -> Vec<Vec<(String, String)>> {
        let mut filters = Vec::new();
        let mut rest = graph;
        loop {
            let (name, after) = get_token(rest, "=,;[");
            assert_eq!(name, "drawtext");
            let after = after.strip_prefix('=').unwrap();
            let (args, after) = get_token(after, "[],;");
            filters.push(parse_options(&args));
            match after.strip_prefix(',') {
                Some(next) => rest = next,
                None => {
                    assert_eq!(after, "");
                    return filters;
                }
            }
        }
    }

    fn parse_options(args: &str) -> Vec<(String, String)> {
        let mut options = Vec::new();
        let mut rest = args;
        while !rest.is_empty() {
            let (key, after) = rest.split_once('=').unwrap();
            let (value, after) = get_token(after, ":");
            options.push((key.to_string(), value));
            rest = after.strip_prefix(':').unwrap_or(after);
        }
        options
    }

    /// `drawtext` text expansion for text without `%{...}` sequences.
    fn expand(text: &str) -> String {
        let mut out = String::new();
        let mut chars = text.chars();
        while let Some(c) = chars.next() {
            match c {
                '\\' => out.extend(chars.next()),
                '%' => panic!("stray % in {text:?}"),
                _ => out.push(c),
            }
        }
        out
    }

    fn option<'a>(options: &'a [(String, String)], key: &str) -> &'a str {
        options
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .unwrap()
    }

    #[test]
    fn test_clause_for_default_style() {
        let clause = DrawText::for_caption(&caption("Hello", 2.0, 4.0), Path::new("/f/a.ttf"));
        assert_eq!(
            clause.to_string(),
            "drawtext=fontfile=/f/a.ttf:text=Hello:fontsize=50:fontcolor=0xFFFFFF:\
             borderw=2:bordercolor=black:x=(w-text_w)/2:y=h-text_h-52:\
             alpha=between(t\\,2\\,6)*min(1\\,min((t-2)/0.5\\,(6-t)/0.5))"
        );
    }

    #[test]
    fn test_clause_uses_style() {
        let style = CaptionStyle {
            position: Position::TopLeft,
            fontsize: 32,
            padding: 10,
            stroke_width: None,
            color: "#ff0000".parse::<TextColor>().unwrap(),
            sticker: true,
        };
        let caption = CaptionSpec::new("x", 0.0, 1.0, style).unwrap();
        let clause = DrawText::for_caption(&caption, Path::new("f.ttf"));
        assert_eq!(clause.fontsize, 32);
        assert_eq!(clause.fontcolor, "0xFF0000");
        assert_eq!(clause.borderw, 10);
        assert_eq!((clause.x.as_str(), clause.y.as_str()), ("20", "20"));
    }

    #[test]
    fn test_chain_keeps_caption_order() {
        let graph = build_filter_graph(
            &[caption("first", 0.0, 2.0), caption("second", 3.0, 2.0)],
            Path::new("f.ttf"),
        );
        let filters = parse_chain(&graph);
        assert_eq!(filters.len(), 2);
        assert_eq!(option(&filters[0], "text"), "first");
        assert_eq!(option(&filters[1], "text"), "second");
    }

    #[test]
    fn test_empty_caption_list_gives_empty_graph() {
        assert_eq!(build_filter_graph(&[], Path::new("f.ttf")), "");
    }

    #[rstest]
    #[case::plain("plain")]
    #[case::apostrophe("it's")]
    #[case::percent("100%")]
    #[case::apostrophe_and_percent("it's 100%")]
    #[case::colon("a:b")]
    #[case::backslash("back\\slash")]
    #[case::graph_separators("one, two; [three]")]
    #[case::outer_spaces(" padded ")]
    #[case::quoted_word("say 'hi'")]
    fn test_text_survives_ffmpeg_parsing(#[case] text: &str) {
        let graph = build_filter_graph(
            &[caption(text, 2.0, 4.0), caption("next", 6.0, 2.0)],
            Path::new("f.ttf"),
        );
        let filters = parse_chain(&graph);
        assert_eq!(filters.len(), 2);

        let options = &filters[0];
        let keys: Vec<_> = options.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(
            keys,
            ["fontfile", "text", "fontsize", "fontcolor", "borderw", "bordercolor", "x", "y", "alpha"]
        );
        assert_eq!(expand(option(options, "text")), text);
        assert_eq!(option(options, "fontsize"), "50");
        assert_eq!(
            option(options, "alpha"),
            "between(t,2,6)*min(1,min((t-2)/0.5,(6-t)/0.5))"
        );
    }

    #[rstest]
    #[case("C:/Fonts/a.ttf")]
    #[case("/fonts/it's here/a,b.ttf")]
    fn test_font_path_survives_ffmpeg_parsing(#[case] font: &str) {
        let graph = build_filter_graph(&[caption("x", 0.0, 1.0)], Path::new(font));
        let filters = parse_chain(&graph);
        assert_eq!(option(&filters[0], "fontfile"), font);
    }

    #[rstest]
    #[case("plain", &OPTION_SPECIAL, "plain")]
    #[case("a:b's", &OPTION_SPECIAL, "a\\:b\\'s")]
    #[case("f(a,b)", &GRAPH_SPECIAL, "f(a\\,b)")]
    #[case(" x ", &OPTION_SPECIAL, "\\ x\\ ")]
    #[case("a b", &OPTION_SPECIAL, "a b")]
    fn test_escape_token(#[case] input: &str, #[case] special: &[char], #[case] expected: &str) {
        assert_eq!(escape_token(input, special), expected);
    }

    #[test]
    fn test_escape_expansion() {
        assert_eq!(escape_expansion("100% \\o/"), "100\\% \\\\o/");
    }
}
