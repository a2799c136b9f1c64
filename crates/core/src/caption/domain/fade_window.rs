use std::fmt;

use crate::shared::constants::FADE_SECONDS;

/// Visibility window of a caption with linear fade-in and fade-out ramps.
///
/// When `duration < 2 * fade` the ramps overlap: opacity rises until the
/// midpoint and falls again without reaching 1.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FadeWindow {
    start: f64,
    end: f64,
    fade: f64,
}

impl FadeWindow {
    pub fn new(start: f64, duration: f64, fade: f64) -> Self {
        Self {
            start,
            end: start + duration,
            fade: fade.max(0.0),
        }
    }

    pub fn with_default_fade(start: f64, duration: f64) -> Self {
        Self::new(start, duration, FADE_SECONDS)
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn fade(&self) -> f64 {
        self.fade
    }

    /// `[start, start + fade, end - fade, end]`.
    pub fn breakpoints(&self) -> [f64; 4] {
        [
            self.start,
            self.start + self.fade,
            self.end - self.fade,
            self.end,
        ]
    }

    /// Length of the full-opacity interval; zero or negative for short captions.
    pub fn plateau(&self) -> f64 {
        let [_, fade_in_end, fade_out_start, _] = self.breakpoints();
        fade_out_start - fade_in_end
    }

    pub fn contains(&self, t: f64) -> bool {
        t >= self.start && t <= self.end
    }

    pub fn opacity_at(&self, t: f64) -> f64 {
        if !self.contains(t) {
            return 0.0;
        }
        if self.fade == 0.0 {
            return 1.0;
        }
        let rising = (t - self.start) / self.fade;
        let falling = (self.end - t) / self.fade;
        rising.min(falling).clamp(0.0, 1.0)
    }

    /// The opacity curve as a closed-form expression of `t`, suitable for
    /// the `alpha` option of ffmpeg's `drawtext`.
    pub fn alpha_expression(&self) -> AlphaExpr {
        use AlphaExpr::*;
        let gate = Between(self.start, self.end);
        if self.fade == 0.0 {
            return gate;
        }
        let rising = Div(
            Box::new(Sub(Box::new(Time), Box::new(Const(self.start)))),
            Box::new(Const(self.fade)),
        );
        let falling = Div(
            Box::new(Sub(Box::new(Const(self.end)), Box::new(Time))),
            Box::new(Const(self.fade)),
        );
        let ramp = Min(
            Box::new(Const(1.0)),
            Box::new(Min(Box::new(rising), Box::new(falling))),
        );
        Mul(Box::new(gate), Box::new(ramp))
    }
}

/// Subset of ffmpeg's expression language needed for opacity curves.
#[derive(Clone, Debug, PartialEq)]
pub enum AlphaExpr {
    Const(f64),
    Time,
    /// `between(t, low, high)`: 1 inside the closed interval, else 0.
    Between(f64, f64),
    Sub(Box<AlphaExpr>, Box<AlphaExpr>),
    Mul(Box<AlphaExpr>, Box<AlphaExpr>),
    Div(Box<AlphaExpr>, Box<AlphaExpr>),
    Min(Box<AlphaExpr>, Box<AlphaExpr>),
}

impl AlphaExpr {
    pub fn evaluate(&self, t: f64) -> f64 {
        match self {
            AlphaExpr::Const(v) => *v,
            AlphaExpr::Time => t,
            AlphaExpr::Between(low, high) => {
                if t >= *low && t <= *high {
                    1.0
                } else {
                    0.0
                }
            }
            AlphaExpr::Sub(a, b) => a.evaluate(t) - b.evaluate(t),
            AlphaExpr::Mul(a, b) => a.evaluate(t) * b.evaluate(t),
            AlphaExpr::Div(a, b) => a.evaluate(t) / b.evaluate(t),
            AlphaExpr::Min(a, b) => a.evaluate(t).min(b.evaluate(t)),
        }
    }
}

impl fmt::Display for AlphaExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlphaExpr::Const(v) => write!(f, "{v}"),
            AlphaExpr::Time => f.write_str("t"),
            AlphaExpr::Between(low, high) => write!(f, "between(t,{low},{high})"),
            AlphaExpr::Sub(a, b) => write!(f, "({a}-{b})"),
            AlphaExpr::Mul(a, b) => write!(f, "{a}*{b}"),
            AlphaExpr::Div(a, b) => write!(f, "{a}/{b}"),
            AlphaExpr::Min(a, b) => write!(f, "min({a},{b})"),
        }
    }
}
