use std::fmt;
use std::str::FromStr;

use crate::shared::error::OverlayError;

/// Where a caption sits on the frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Position {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Center,
    Bottom,
}

impl Position {
    pub const ALL: [Position; 6] = [
        Position::TopLeft,
        Position::TopRight,
        Position::BottomLeft,
        Position::BottomRight,
        Position::Center,
        Position::Bottom,
    ];

    pub fn keyword(self) -> &'static str {
        match self {
            Position::TopLeft => "top-left",
            Position::TopRight => "top-right",
            Position::BottomLeft => "bottom-left",
            Position::BottomRight => "bottom-right",
            Position::Center => "center",
            Position::Bottom => "bottom",
        }
    }

    pub fn keywords() -> Vec<&'static str> {
        Self::ALL.iter().map(|p| p.keyword()).collect()
    }

    /// Anchor pair used by the compositing backend.
    pub fn anchor(self) -> Anchor {
        use HorizontalAnchor as H;
        use VerticalAnchor as V;
        let (horizontal, vertical) = match self {
            Position::TopLeft => (H::Left, V::Top),
            Position::TopRight => (H::Right, V::Top),
            Position::BottomLeft => (H::Left, V::Bottom),
            Position::BottomRight => (H::Right, V::Bottom),
            Position::Center => (H::Center, V::Center),
            Position::Bottom => (H::Center, V::Bottom),
        };
        Anchor {
            horizontal,
            vertical,
        }
    }

    /// `drawtext` x/y expressions. The glyph box is inset by `inset` from
    /// the edges it is anchored to. Pass the padding plus the stroke width to
    /// match the margin around the glyphs of a composited text layer.
    pub fn pixel_expr(self, inset: u32) -> PixelExpr {
        let edge = |anchor: Edge| match anchor {
            Edge::Start => AxisExpr::Start(inset),
            Edge::Middle => AxisExpr::Centered,
            Edge::End => AxisExpr::End(inset),
        };
        let anchor = self.anchor();
        PixelExpr {
            x: edge(anchor.horizontal.edge()),
            y: edge(anchor.vertical.edge()),
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl FromStr for Position {
    type Err = OverlayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.keyword() == s)
            .ok_or_else(|| OverlayError::InvalidPosition(s.to_string()))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Edge {
    Start,
    Middle,
    End,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HorizontalAnchor {
    Left,
    Center,
    Right,
}

impl HorizontalAnchor {
    fn edge(self) -> Edge {
        match self {
            HorizontalAnchor::Left => Edge::Start,
            HorizontalAnchor::Center => Edge::Middle,
            HorizontalAnchor::Right => Edge::End,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VerticalAnchor {
    Top,
    Center,
    Bottom,
}

impl VerticalAnchor {
    fn edge(self) -> Edge {
        match self {
            VerticalAnchor::Top => Edge::Start,
            VerticalAnchor::Center => Edge::Middle,
            VerticalAnchor::Bottom => Edge::End,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Anchor {
    pub horizontal: HorizontalAnchor,
    pub vertical: VerticalAnchor,
}

impl Anchor {
    /// Top-left pixel of a `layer`-sized box placed on a `frame`-sized canvas.
    ///
    /// Layers larger than the frame get a negative origin and are clipped
    /// when composited.
    pub fn origin(&self, frame: (u32, u32), layer: (u32, u32)) -> (i64, i64) {
        (
            place(self.horizontal.edge(), frame.0, layer.0),
            place(self.vertical.edge(), frame.1, layer.1),
        )
    }
}

fn place(edge: Edge, frame: u32, layer: u32) -> i64 {
    let free = frame as i64 - layer as i64;
    match edge {
        Edge::Start => 0,
        Edge::Middle => free / 2,
        Edge::End => free,
    }
}

/// One axis of a `drawtext` position expression.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AxisExpr {
    /// Offset from the leading edge.
    Start(u32),
    Centered,
    /// Offset from the trailing edge.
    End(u32),
}

impl AxisExpr {
    /// Renders the expression for the axis whose frame/text extents are
    /// named `frame_var` / `text_var` (`w`/`text_w` or `h`/`text_h`).
    pub fn render(&self, frame_var: &str, text_var: &str) -> String {
        match self {
            AxisExpr::Start(pad) => pad.to_string(),
            AxisExpr::Centered => format!("({frame_var}-{text_var})/2"),
            AxisExpr::End(pad) => format!("{frame_var}-{text_var}-{pad}"),
        }
    }

    /// Evaluates the expression the way ffmpeg would for concrete extents.
    pub fn evaluate(&self, frame_extent: f64, text_extent: f64) -> f64 {
        match self {
            AxisExpr::Start(pad) => *pad as f64,
            AxisExpr::Centered => (frame_extent - text_extent) / 2.0,
            AxisExpr::End(pad) => frame_extent - text_extent - *pad as f64,
        }
    }
}

/// x/y expression pair for the filter-graph backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelExpr {
    pub x: AxisExpr,
    pub y: AxisExpr,
}

impl PixelExpr {
    pub fn x_expr(&self) -> String {
        self.x.render("w", "text_w")
    }

    pub fn y_expr(&self) -> String {
        self.y.render("h", "text_h")
    }
}

/// Which renderer a placement is resolved for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendKind {
    Composite,
    FilterGraph,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
    Anchor(Anchor),
    Expr(PixelExpr),
}

/// Looks up the backend-specific placement of `position`.
pub fn resolve(position: Position, backend: BackendKind, inset: u32) -> Placement {
    match backend {
        BackendKind::Composite => Placement::Anchor(position.anchor()),
        BackendKind::FilterGraph => Placement::Expr(position.pixel_expr(inset)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_keywords_round_trip() {
        for position in Position::ALL {
            assert_eq!(position.keyword().parse::<Position>().unwrap(), position);
        }
        assert_eq!(Position::keywords().len(), 6);
    }

    #[rstest]
    #[case("diagonal")]
    #[case("Bottom")]
    #[case("")]
    fn test_unknown_keyword_is_rejected(#[case] keyword: &str) {
        let err = keyword.parse::<Position>().unwrap_err();
        assert!(matches!(err, OverlayError::InvalidPosition(ref k) if k == keyword));
    }

    #[test]
    fn test_bottom_anchor() {
        let anchor = Position::Bottom.anchor();
        assert_eq!(anchor.horizontal, HorizontalAnchor::Center);
        assert_eq!(anchor.vertical, VerticalAnchor::Bottom);
    }

    #[test]
    fn test_anchor_origin() {
        let frame = (1920, 1080);
        let layer = (400, 100);
        assert_eq!(Position::TopLeft.anchor().origin(frame, layer), (0, 0));
        assert_eq!(Position::BottomRight.anchor().origin(frame, layer), (1520, 980));
        assert_eq!(Position::Center.anchor().origin(frame, layer), (760, 490));
        assert_eq!(Position::Bottom.anchor().origin(frame, layer), (760, 980));
    }

    #[test]
    fn test_oversized_layer_gets_negative_origin() {
        let origin = Position::Center.anchor().origin((100, 100), (300, 50));
        assert_eq!(origin, (-100, 25));
    }

    #[test]
    fn test_pixel_expressions() {
        let expr = Position::TopRight.pixel_expr(50);
        assert_eq!(expr.x_expr(), "w-text_w-50");
        assert_eq!(expr.y_expr(), "50");

        let expr = Position::Center.pixel_expr(50);
        assert_eq!(expr.x_expr(), "(w-text_w)/2");
        assert_eq!(expr.y_expr(), "(h-text_h)/2");
    }

    #[test]
    fn test_resolve_by_backend() {
        assert_eq!(
            resolve(Position::Bottom, BackendKind::Composite, 10),
            Placement::Anchor(Position::Bottom.anchor())
        );
        assert_eq!(
            resolve(Position::Bottom, BackendKind::FilterGraph, 10),
            Placement::Expr(Position::Bottom.pixel_expr(10))
        );
    }

    fn side(start: f64, extent: f64, frame: f64) -> i8 {
        let center = start + extent / 2.0;
        let third = frame / 6.0;
        if center < frame / 2.0 - third {
            -1
        } else if center > frame / 2.0 + third {
            1
        } else {
            0
        }
    }

    /// Both backends put the glyphs on the same edge for every keyword. The
    /// composited layer carries the stroke and the padding around the glyphs.
    #[rstest]
    fn test_backends_agree_on_placement(
        #[values(
            Position::TopLeft,
            Position::TopRight,
            Position::BottomLeft,
            Position::BottomRight,
            Position::Center,
            Position::Bottom
        )]
        position: Position,
        #[values((100, 100), (640, 360), (1920, 1080), (1080, 1920))] frame: (u32, u32),
        #[values(0, 2, 10)] stroke: u32,
    ) {
        let padding = frame.0.min(frame.1) / 20;
        let text = (frame.0 / 5, frame.1 / 10);
        let margin = padding + stroke;
        let layer = (text.0 + 2 * margin, text.1 + 2 * margin);

        let (lx, ly) = position.anchor().origin(frame, layer);
        let composite_text_x = lx as f64 + margin as f64;
        let composite_text_y = ly as f64 + margin as f64;

        let expr = position.pixel_expr(margin);
        let filter_x = expr.x.evaluate(frame.0 as f64, text.0 as f64);
        let filter_y = expr.y.evaluate(frame.1 as f64, text.1 as f64);

        let (fw, fh) = (frame.0 as f64, frame.1 as f64);
        assert_eq!(
            side(composite_text_x, text.0 as f64, fw),
            side(filter_x, text.0 as f64, fw)
        );
        assert_eq!(
            side(composite_text_y, text.1 as f64, fh),
            side(filter_y, text.1 as f64, fh)
        );
        assert!((composite_text_x - filter_x).abs() <= 1.0);
        assert!((composite_text_y - filter_y).abs() <= 1.0);
    }
}
