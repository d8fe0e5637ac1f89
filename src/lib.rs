// SPDX: CC0-1.0

pub mod buffer;
pub mod eval;
pub mod format;
pub mod lex;
pub mod parse;
pub mod sample;
pub mod shell;
pub mod stdlib;

use core::{fmt, num::NonZeroU16, ops::Range, str::FromStr};
use eval::EvalErr;
use lex::Lexer;
use parse::{Node, SyntaxErr};
use sample::SampleResult;
use std::sync::Arc;

pub type Number = f64;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point<X, Y = X> {
    pub x: X,
    pub y: Y,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AngleMode {
    #[default]
    Degrees,
    Radians,
}

impl AngleMode {
    pub const fn toggled(self) -> Self {
        match self {
            Self::Degrees => Self::Radians,
            Self::Radians => Self::Degrees,
        }
    }
}

impl fmt::Display for AngleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Degrees => write!(f, "degrees"),
            Self::Radians => write!(f, "radians"),
        }
    }
}

impl FromStr for AngleMode {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deg" | "degrees" => Ok(Self::Degrees),
            "rad" | "radians" => Ok(Self::Radians),
            _ => Err(()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EvalCtx {
    pub precision: u32,
    pub angle_mode: AngleMode,
    pub binding: Option<Number>,
}

impl Default for EvalCtx {
    fn default() -> Self {
        Self {
            precision: format::DEFAULT_PRECISION,
            angle_mode: AngleMode::default(),
            binding: None,
        }
    }
}

/// `density` points over `x`, both ends included.
#[derive(Clone, Debug, PartialEq)]
pub struct Window {
    pub x: Range<Number>,
    pub density: NonZeroU16,
}

impl Window {
    pub const DEFAULT_DENSITY: u16 = 400;

    pub fn points(&self) -> impl Iterator<Item = Number> + '_ {
        let n = self.density.get();
        let step = if n > 1 {
            (self.x.end - self.x.start) / Number::from(n - 1)
        } else {
            0.0
        };
        (0..n).map(move |i| {
            if n > 1 && i == n - 1 {
                self.x.end
            } else {
                self.x.start + step * Number::from(i)
            }
        })
    }
}

impl Default for Window {
    fn default() -> Self {
        Self {
            x: -10.0..10.0,
            density: NonZeroU16::new(Self::DEFAULT_DENSITY).unwrap_or(NonZeroU16::MIN),
        }
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Window")
            .field("x range", &self.x)
            .field("density", &self.density)
            .finish()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    Syntax(SyntaxErr),
    Eval(EvalErr),
}

impl Error {
    /// The short string a calculator display shows instead of a result.
    pub fn display_str(&self) -> &'static str {
        match self {
            Self::Eval(err) if err.typ.is_undefined() => format::UNDEFINED,
            Self::Syntax(_) | Self::Eval(_) => format::ERROR,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax(err) => write!(f, "syntax error: {err}"),
            Self::Eval(err) => write!(f, "evaluation error: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Syntax(err) => Some(err),
            Self::Eval(err) => Some(err),
        }
    }
}

impl From<SyntaxErr> for Error {
    fn from(err: SyntaxErr) -> Self {
        Self::Syntax(err)
    }
}

impl From<EvalErr> for Error {
    fn from(err: EvalErr) -> Self {
        Self::Eval(err)
    }
}

pub fn compile(text: &str) -> Result<Node, SyntaxErr> {
    let src = Arc::new(text.to_string());
    parse::parse(Lexer::new(&src))
}

pub fn calculate(text: &str, ctx: &EvalCtx) -> Result<Number, Error> {
    let tree = compile(text)?;
    Ok(eval::evaluate_constant(&tree, ctx)?)
}

/// Never fails: errors come back as `"ERROR"` or `"UNDEFINED"`.
pub fn evaluate_expression(text: &str, precision: u32, angle_mode: AngleMode) -> String {
    let ctx = EvalCtx {
        precision,
        angle_mode,
        binding: None,
    };
    match calculate(text, &ctx) {
        Ok(val) => format::format(val, precision),
        Err(err) => err.display_str().to_string(),
    }
}

pub fn plot_expression<I>(
    text: &str,
    domain: I,
    angle_mode: AngleMode,
) -> Result<SampleResult, SyntaxErr>
where
    I: IntoIterator<Item = Number>,
{
    let tree = compile(text)?;
    let ctx = EvalCtx {
        angle_mode,
        ..EvalCtx::default()
    };
    Ok(sample::sample(&tree, domain, &ctx))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_window_matches_linspace() {
        let win = Window::default();
        let pts: Vec<Number> = win.points().collect();
        assert_eq!(pts.len(), 400);
        assert_eq!(pts[0], -10.0);
        assert_eq!(pts[399], 10.0);
        let step = 20.0 / 399.0;
        assert!((pts[1] - (-10.0 + step)).abs() < 1e-12);
        assert!(pts.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn single_point_window() {
        let win = Window {
            x: 2.0..5.0,
            density: NonZeroU16::MIN,
        };
        assert_eq!(win.points().collect::<Vec<_>>(), vec![2.0]);
    }

    #[test]
    fn display_strings_follow_error_kind() {
        let deg = AngleMode::Degrees;
        assert_eq!(evaluate_expression("sqrt(4)", 8, deg), "2.00000000");
        assert_eq!(evaluate_expression("factorial(5)", 0, deg), "120");
        assert_eq!(evaluate_expression("sqrt(-1)", 8, deg), "UNDEFINED");
        assert_eq!(evaluate_expression("tan(90)", 8, deg), "UNDEFINED");
        assert_eq!(evaluate_expression("1/0", 8, deg), "UNDEFINED");
        assert_eq!(evaluate_expression("foo(1)", 8, deg), "ERROR");
        assert_eq!(evaluate_expression("x+1", 8, deg), "ERROR");
        assert_eq!(evaluate_expression("1/0+x", 8, deg), "ERROR");
        assert_eq!(evaluate_expression("(1+2", 8, deg), "ERROR");
        assert_eq!(evaluate_expression("", 8, deg), "ERROR");
    }

    #[test]
    fn huge_precision_is_clamped() {
        let deg = AngleMode::Degrees;
        let shown = evaluate_expression("1", 70_000, deg);
        assert_eq!(shown, evaluate_expression("1", format::MAX_PRECISION, deg));
        assert_eq!(shown.len(), 2 + format::MAX_PRECISION as usize);
    }

    #[test]
    fn angle_mode_parses() {
        assert_eq!("rad".parse::<AngleMode>(), Ok(AngleMode::Radians));
        assert_eq!("degrees".parse::<AngleMode>(), Ok(AngleMode::Degrees));
        assert_eq!("grad".parse::<AngleMode>(), Err(()));
        assert_eq!(AngleMode::Degrees.toggled(), AngleMode::Radians);
    }
}
