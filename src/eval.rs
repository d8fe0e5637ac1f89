// SPDX: CC0-1.0

use crate::{
    lex::SubStr,
    parse::{Node, NodeTyp},
    stdlib::{self, DomainResult, Ident, X},
    EvalCtx, Number,
};
use core::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperatorTyp {
    Neg,
    Pos,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    FloorDiv,
    Pow,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Associativity {
    Left,
    Right,
}

impl OperatorTyp {
    pub const fn precedence(&self) -> i8 {
        match self {
            Self::Add => 1,
            Self::Sub => 1,
            Self::Mul => 2,
            Self::Div => 2,
            Self::Mod => 2,
            Self::FloorDiv => 2,
            Self::Neg => 3,
            Self::Pos => 3,
            Self::Pow => 4,
        }
    }

    pub const fn associativity(&self) -> Associativity {
        use Associativity::{Left, Right};
        match self {
            Self::Neg => Right,
            Self::Pos => Right,
            Self::Add => Left,
            Self::Sub => Left,
            Self::Mul => Left,
            Self::Div => Left,
            Self::Mod => Left,
            Self::FloorDiv => Left,
            Self::Pow => Right,
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Neg => "neg",
            Self::Pos => "pos",
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Mul => "mul",
            Self::Div => "div",
            Self::Mod => "mod",
            Self::FloorDiv => "floordiv",
            Self::Pow => "pow",
        }
    }

    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::Neg | Self::Sub => "-",
            Self::Pos | Self::Add => "+",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::FloorDiv => "//",
            Self::Pow => "**",
        }
    }
}

impl fmt::Display for OperatorTyp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DomainFault {
    Undefined,
    OutOfDomain,
}

#[derive(Clone, Debug, PartialEq)]
pub enum EvalErrTyp {
    /// `name` is the function or operator that rejected its input.
    Domain {
        name: &'static str,
        fault: DomainFault,
    },
    DivisionByZero,
    UnboundVariable,
    UnknownSymbol(String),
}

impl EvalErrTyp {
    /// Mathematically undefined, as opposed to ill-formed input.
    pub const fn is_undefined(&self) -> bool {
        matches!(self, Self::Domain { .. } | Self::DivisionByZero)
    }
}

impl fmt::Display for EvalErrTyp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Domain {
                name,
                fault: DomainFault::Undefined,
            } => write!(f, "'{name}' is undefined here"),
            Self::Domain {
                name,
                fault: DomainFault::OutOfDomain,
            } => write!(f, "argument outside the domain of '{name}'"),
            Self::DivisionByZero => write!(f, "division by zero"),
            Self::UnboundVariable => {
                write!(f, "variable '{X}' has no value outside of plotting")
            }
            Self::UnknownSymbol(name) => write!(f, "unknown symbol '{name}'"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct EvalErr {
    pub typ: EvalErrTyp,
    pub loc: SubStr,
}

impl fmt::Display for EvalErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.typ)
    }
}

impl std::error::Error for EvalErr {}

fn floor_mod(a: Number, b: Number) -> Number {
    let r = a % b;
    if r != 0.0 && (r < 0.0) != (b < 0.0) {
        r + b
    } else {
        r
    }
}

fn apply_binary(op: OperatorTyp, a: Number, b: Number) -> Result<Number, EvalErrTyp> {
    let val = match op {
        OperatorTyp::Add => a + b,
        OperatorTyp::Sub => a - b,
        OperatorTyp::Mul => a * b,
        OperatorTyp::Div | OperatorTyp::Mod | OperatorTyp::FloorDiv if b == 0.0 => {
            return Err(EvalErrTyp::DivisionByZero)
        }
        OperatorTyp::Div => a / b,
        OperatorTyp::Mod => floor_mod(a, b),
        OperatorTyp::FloorDiv => (a / b).floor(),
        OperatorTyp::Pow if a == 0.0 && b < 0.0 => return Err(EvalErrTyp::DivisionByZero),
        OperatorTyp::Pow => a.powf(b),
        OperatorTyp::Neg | OperatorTyp::Pos => unreachable!("prefix operator used as binary"),
    };
    Ok(val)
}

/// NaN never leaves the evaluator; it becomes a domain error naming the
/// operation that produced it.
fn check_nan(val: Number, name: &'static str) -> Result<Number, EvalErrTyp> {
    if val.is_nan() {
        Err(EvalErrTyp::Domain {
            name,
            fault: DomainFault::OutOfDomain,
        })
    } else {
        Ok(val)
    }
}

/// Walks `tree` bottom-up. `ctx.binding` supplies the value of `x`.
pub fn eval(tree: &Node, ctx: &EvalCtx) -> Result<Number, EvalErr> {
    let at = |typ: EvalErrTyp| EvalErr {
        typ,
        loc: tree.loc().clone(),
    };

    match tree.typ() {
        NodeTyp::Literal(val) => Ok(*val),

        NodeTyp::Variable => {
            if tree.name() != X {
                Err(at(EvalErrTyp::UnknownSymbol(tree.name().to_string())))
            } else if let Some(val) = ctx.binding {
                Ok(val)
            } else {
                Err(at(EvalErrTyp::UnboundVariable))
            }
        }

        NodeTyp::Unary(op, operand) => {
            let val = eval(operand, ctx)?;
            match op {
                OperatorTyp::Neg => Ok(-val),
                _ => Ok(val),
            }
        }

        NodeTyp::Binary(op, lhs, rhs) => {
            let a = eval(lhs, ctx)?;
            let b = eval(rhs, ctx)?;
            apply_binary(*op, a, b)
                .and_then(|val| check_nan(val, op.name()))
                .map_err(at)
        }

        NodeTyp::Call(args) => {
            let Some((name, ident)) = stdlib::registry().get(tree.name()) else {
                return Err(at(EvalErrTyp::UnknownSymbol(tree.name().to_string())));
            };
            let fun = match ident {
                Ident::Fun(fun) => fun,
                Ident::Const(val) => return Ok(*val),
            };

            let vals = args
                .iter()
                .map(|arg| eval(arg, ctx))
                .collect::<Result<Vec<Number>, EvalErr>>()?;

            match fun.call(&vals, ctx.angle_mode) {
                DomainResult::Ok(val) => check_nan(val, name).map_err(at),
                DomainResult::Undefined => Err(at(EvalErrTyp::Domain {
                    name,
                    fault: DomainFault::Undefined,
                })),
                DomainResult::OutOfDomain => Err(at(EvalErrTyp::Domain {
                    name,
                    fault: DomainFault::OutOfDomain,
                })),
            }
        }
    }
}

/// Calculator mode: `x` is not available.
pub fn evaluate_constant(tree: &Node, ctx: &EvalCtx) -> Result<Number, EvalErr> {
    // a free `x` beats whatever else would go wrong first
    if let Some(var) = tree.find_variable(X) {
        return Err(EvalErr {
            typ: EvalErrTyp::UnboundVariable,
            loc: var.loc().clone(),
        });
    }
    let ctx = EvalCtx {
        binding: None,
        ..*ctx
    };
    eval(tree, &ctx)
}

/// Plotting mode: `x` evaluates to `x`.
pub fn bind_variable(tree: &Node, x: Number, ctx: &EvalCtx) -> Result<Number, EvalErr> {
    let ctx = EvalCtx {
        binding: Some(x),
        ..*ctx
    };
    eval(tree, &ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{lex::Lexer, parse::parse, AngleMode};
    use std::sync::Arc;

    fn tree(input: &str) -> Node {
        let src = Arc::new(input.to_string());
        parse(Lexer::new(&src)).unwrap()
    }

    fn constant(input: &str) -> Result<Number, EvalErrTyp> {
        evaluate_constant(&tree(input), &EvalCtx::default()).map_err(|err| err.typ)
    }

    fn approx(input: &str, want: Number) {
        let got = constant(input).unwrap();
        assert!((got - want).abs() < 1e-9, "{input}: got {got}, want {want}");
    }

    #[test]
    fn arithmetic() {
        approx("1+2*3", 7.0);
        approx("2**3**2", 512.0);
        approx("-2**2", -4.0);
        approx("2**-1", 0.5);
        approx("10/4", 2.5);
        approx("7//2", 3.0);
        approx("-7//2", -4.0);
        approx("7%3", 1.0);
        approx("-7%3", 2.0);
        approx("7%-3", -2.0);
        approx("5.5%2", 1.5);
    }

    #[test]
    fn functions_and_constants() {
        approx("sqrt(2)+sin(30)", 2f64.sqrt() + 0.5);
        approx("factorial(5)", 120.0);
        approx("abs(-3)", 3.0);
        approx("log(100)", 2.0);
        approx("ln(e)", 1.0);
        approx("exp(0)", 1.0);
        approx("cos(pi*0)", 1.0);
        approx("cot(45)", 1.0);
    }

    #[test]
    fn angle_mode_is_applied() {
        let ctx = EvalCtx {
            angle_mode: AngleMode::Radians,
            ..EvalCtx::default()
        };
        let val = evaluate_constant(&tree("sin(pi/2)"), &ctx).unwrap();
        assert!((val - 1.0).abs() < 1e-12);
        let val = evaluate_constant(&tree("sin(90)"), &EvalCtx::default()).unwrap();
        assert!((val - 1.0).abs() < 1e-12);
        assert!(matches!(
            evaluate_constant(&tree("tan(pi/2)"), &ctx).unwrap_err().typ,
            EvalErrTyp::Domain {
                name: "tan",
                fault: DomainFault::Undefined
            }
        ));
    }

    #[test]
    fn domain_errors() {
        let undefined = |name| EvalErrTyp::Domain {
            name,
            fault: DomainFault::Undefined,
        };
        let outside = |name| EvalErrTyp::Domain {
            name,
            fault: DomainFault::OutOfDomain,
        };
        assert_eq!(constant("tan(90)"), Err(undefined("tan")));
        assert_eq!(constant("cot(0)"), Err(undefined("cot")));
        assert_eq!(constant("cot(180)"), Err(undefined("cot")));
        assert_eq!(constant("sqrt(-1)"), Err(outside("sqrt")));
        assert_eq!(constant("factorial(-1)"), Err(outside("factorial")));
        assert_eq!(constant("factorial(2.5)"), Err(outside("factorial")));
        assert_eq!(constant("factorial(1000)"), Err(outside("factorial")));
        assert_eq!(constant("log(0)"), Err(outside("log")));
        assert_eq!(constant("(-8)**(1/3)"), Err(outside("pow")));
        assert_eq!(constant("exp(1000)-exp(1000)"), Err(outside("sub")));
        assert!(constant("tan(89.9999999999)").unwrap().is_finite());
    }

    #[test]
    fn division_by_zero() {
        for input in ["1/0", "1//0", "1%0", "0**-1", "5/(2-2)"] {
            assert_eq!(constant(input), Err(EvalErrTyp::DivisionByZero), "{input}");
        }
    }

    #[test]
    fn overflow_is_a_value() {
        assert_eq!(constant("10**400"), Ok(Number::INFINITY));
        assert_eq!(constant("-exp(1000)"), Ok(Number::NEG_INFINITY));
    }

    #[test]
    fn unknown_symbols_are_never_evaluated() {
        assert_eq!(
            constant("foo(1)"),
            Err(EvalErrTyp::UnknownSymbol("foo".to_string()))
        );
        assert_eq!(
            constant("1+y"),
            Err(EvalErrTyp::UnknownSymbol("y".to_string()))
        );
        assert_eq!(
            constant("__import__(1)"),
            Err(EvalErrTyp::UnknownSymbol("__import__".to_string()))
        );
        // the unknown call is rejected before its argument is looked at
        assert_eq!(
            constant("foo(1/0)"),
            Err(EvalErrTyp::UnknownSymbol("foo".to_string()))
        );
    }

    #[test]
    fn free_variable() {
        assert_eq!(constant("x**2-4"), Err(EvalErrTyp::UnboundVariable));
        assert_eq!(constant("1/0+x"), Err(EvalErrTyp::UnboundVariable));
        assert_eq!(constant("sqrt(-1)*x"), Err(EvalErrTyp::UnboundVariable));
        let err = evaluate_constant(&tree("1/0 + x"), &EvalCtx::default()).unwrap_err();
        assert_eq!(err.loc.start(), 6);

        let tree = tree("x**2-4");
        let ctx = EvalCtx {
            binding: Some(100.0),
            ..EvalCtx::default()
        };
        assert_eq!(bind_variable(&tree, 3.0, &ctx), Ok(5.0));
        // a binding smuggled in through the context is ignored in constant mode
        assert_eq!(
            evaluate_constant(&tree, &ctx).unwrap_err().typ,
            EvalErrTyp::UnboundVariable
        );
    }

    #[test]
    fn errors_point_at_their_source() {
        let err = evaluate_constant(&tree("1 + sqrt(-4)"), &EvalCtx::default()).unwrap_err();
        assert_eq!(err.loc.get(), "sqrt");
        assert_eq!(err.loc.start(), 4);
    }
}
