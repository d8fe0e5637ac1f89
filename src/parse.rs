// SPDX: CC0-1.0

// recursive descent with precedence climbing over the binary operators
// (see https://en.wikipedia.org/wiki/Operator-precedence_parser#Precedence_climbing_method)
//
//   expr    := unary (binop unary)*        binop is one of + - * / % //
//   unary   := ('-' | '+') unary | power
//   power   := primary ('**' unary)?       right-associative through unary
//   primary := number | ident | ident '(' args? ')' | '(' expr ')'

use crate::{
    eval::{Associativity, OperatorTyp},
    lex::{Lexer, SubStr, Tok, TokTyp},
    stdlib::{self, Ident},
    Number,
};
use core::{fmt, iter::Peekable};
use std::{sync::Arc, vec};

/// Deepest nesting of parentheses and prefix operators accepted.
pub const MAX_DEPTH: usize = 256;

#[derive(Clone, Debug, PartialEq)]
pub enum SyntaxErrTyp {
    UnexpectedChar(char),
    MalformedNumber,
    UnbalancedParens,
    ArityMismatch {
        name: &'static str,
        expected: usize,
        found: usize,
    },
    EmptyExpression,
    UnexpectedToken,
    UnexpectedEnd,
    TooDeep,
}

impl fmt::Display for SyntaxErrTyp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedChar(chr) => write!(f, "unexpected character '{chr}'"),
            Self::MalformedNumber => write!(f, "malformed number"),
            Self::UnbalancedParens => write!(f, "unbalanced parentheses"),
            Self::ArityMismatch {
                name,
                expected,
                found,
            } => write!(
                f,
                "function '{name}' takes {expected} argument{s}, but found {found}",
                s = if *expected == 1 { "" } else { "s" }
            ),
            Self::EmptyExpression => write!(f, "empty expression"),
            Self::UnexpectedToken => write!(f, "unexpected token"),
            Self::UnexpectedEnd => write!(f, "unexpected end of expression"),
            Self::TooDeep => write!(f, "expression is nested too deeply"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SyntaxErr {
    pub typ: SyntaxErrTyp,
    pub loc: SubStr,
}

impl SyntaxErr {
    /// Byte offset of the offending input.
    pub const fn pos(&self) -> usize {
        self.loc.start()
    }
}

impl fmt::Display for SyntaxErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at position {}", self.typ, self.pos() + 1)
    }
}

impl std::error::Error for SyntaxErr {}

#[derive(Clone, Debug, PartialEq)]
pub enum NodeTyp {
    Literal(Number),
    /// Named by the node's span; only `x` ever evaluates.
    Variable,
    Unary(OperatorTyp, Box<Node>),
    Binary(OperatorTyp, Box<Node>, Box<Node>),
    /// Named by the node's span. Arity is already checked for registered
    /// functions.
    Call(Vec<Node>),
}

/// Expression tree node. Only the parser builds these, so every call to a
/// registered function has the right number of arguments.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    typ: NodeTyp,
    loc: SubStr,
}

impl Node {
    pub const fn typ(&self) -> &NodeTyp {
        &self.typ
    }

    /// The token that produced this node: the literal, name, or operator.
    pub const fn loc(&self) -> &SubStr {
        &self.loc
    }

    pub fn name(&self) -> &str {
        self.loc.get()
    }

    /// Whether `x` (or any other free name) occurs in the tree.
    pub fn has_variable(&self) -> bool {
        match &self.typ {
            NodeTyp::Literal(_) => false,
            NodeTyp::Variable => true,
            NodeTyp::Unary(_, operand) => operand.has_variable(),
            NodeTyp::Binary(_, lhs, rhs) => lhs.has_variable() || rhs.has_variable(),
            NodeTyp::Call(args) => args.iter().any(Node::has_variable),
        }
    }

    /// Leftmost occurrence of the variable `name`.
    pub fn find_variable(&self, name: &str) -> Option<&Node> {
        match &self.typ {
            NodeTyp::Literal(_) => None,
            NodeTyp::Variable => (self.name() == name).then_some(self),
            NodeTyp::Unary(_, operand) => operand.find_variable(name),
            NodeTyp::Binary(_, lhs, rhs) => {
                lhs.find_variable(name).or_else(|| rhs.find_variable(name))
            }
            NodeTyp::Call(args) => args.iter().find_map(|arg| arg.find_variable(name)),
        }
    }
}

/// Fully parenthesized rendering, handy for checking how input was grouped.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.typ {
            NodeTyp::Literal(_) | NodeTyp::Variable => write!(f, "{}", self.loc),
            NodeTyp::Unary(op, operand) => write!(f, "({op}{operand})"),
            NodeTyp::Binary(op, lhs, rhs) => write!(f, "({lhs} {op} {rhs})"),
            NodeTyp::Call(args) => {
                write!(f, "{}(", self.loc)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
        }
    }
}

struct Parser {
    toks: Peekable<vec::IntoIter<Tok>>,
    src: Arc<String>,
    depth: usize,
}

impl Parser {
    fn peek_typ(&mut self) -> Option<TokTyp> {
        self.toks.peek().map(|tok| tok.typ)
    }

    fn unexpected(&mut self) -> SyntaxErr {
        match self.toks.next() {
            Some(tok) => SyntaxErr {
                typ: SyntaxErrTyp::UnexpectedToken,
                loc: tok.loc,
            },
            None => SyntaxErr {
                typ: SyntaxErrTyp::UnexpectedEnd,
                loc: SubStr::end_of(&self.src),
            },
        }
    }

    fn expr(&mut self, min_prec: i8) -> Result<Node, SyntaxErr> {
        let mut lhs = self.unary()?;

        while let Some(TokTyp::Op(op)) = self.peek_typ() {
            if op == OperatorTyp::Pow || op.precedence() < min_prec {
                break;
            }
            let Some(tok) = self.toks.next() else {
                break;
            };
            let next_min = match op.associativity() {
                Associativity::Left => op.precedence() + 1,
                Associativity::Right => op.precedence(),
            };
            let rhs = self.expr(next_min)?;
            lhs = Node {
                typ: NodeTyp::Binary(op, Box::new(lhs), Box::new(rhs)),
                loc: tok.loc,
            };
        }

        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Node, SyntaxErr> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            let loc = match self.toks.peek() {
                Some(tok) => tok.loc.clone(),
                None => SubStr::end_of(&self.src),
            };
            return Err(SyntaxErr {
                typ: SyntaxErrTyp::TooDeep,
                loc,
            });
        }

        let ret = match self.peek_typ() {
            Some(TokTyp::Op(op @ (OperatorTyp::Sub | OperatorTyp::Add))) => {
                let tok = self.toks.next().ok_or_else(|| self.unexpected())?;
                let prefix = if op == OperatorTyp::Sub {
                    OperatorTyp::Neg
                } else {
                    OperatorTyp::Pos
                };
                self.unary().map(|operand| Node {
                    typ: NodeTyp::Unary(prefix, Box::new(operand)),
                    loc: tok.loc,
                })
            }
            _ => self.power(),
        };

        self.depth -= 1;
        ret
    }

    fn power(&mut self) -> Result<Node, SyntaxErr> {
        let base = self.primary()?;
        if let Some(TokTyp::Op(OperatorTyp::Pow)) = self.peek_typ() {
            let tok = self.toks.next().ok_or_else(|| self.unexpected())?;
            let exponent = self.unary()?;
            return Ok(Node {
                typ: NodeTyp::Binary(OperatorTyp::Pow, Box::new(base), Box::new(exponent)),
                loc: tok.loc,
            });
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<Node, SyntaxErr> {
        match self.peek_typ() {
            Some(TokTyp::Number(val)) => {
                let tok = self.toks.next().ok_or_else(|| self.unexpected())?;
                Ok(Node {
                    typ: NodeTyp::Literal(val),
                    loc: tok.loc,
                })
            }

            Some(TokTyp::Ident) => {
                let tok = self.toks.next().ok_or_else(|| self.unexpected())?;
                if let Some(TokTyp::OpenParen) = self.peek_typ() {
                    self.call(tok)
                } else {
                    Ok(self.resolve_name(tok))
                }
            }

            Some(TokTyp::OpenParen) => {
                self.toks.next();
                let inner = self.expr(0)?;
                match self.peek_typ() {
                    Some(TokTyp::CloseParen) => {
                        self.toks.next();
                        Ok(inner)
                    }
                    _ => Err(self.unexpected()),
                }
            }

            _ => Err(self.unexpected()),
        }
    }

    /// Constants fold to literals here; anything else stays a free name for
    /// the evaluator to bind or reject.
    fn resolve_name(&self, tok: Tok) -> Node {
        match stdlib::registry().get(tok.loc.get()) {
            Some((_, Ident::Const(val))) => Node {
                typ: NodeTyp::Literal(*val),
                loc: tok.loc,
            },
            _ => Node {
                typ: NodeTyp::Variable,
                loc: tok.loc,
            },
        }
    }

    fn call(&mut self, name: Tok) -> Result<Node, SyntaxErr> {
        // opening paren
        self.toks.next();

        let mut args = Vec::new();
        if let Some(TokTyp::CloseParen) = self.peek_typ() {
            self.toks.next();
        } else {
            loop {
                args.push(self.expr(0)?);
                match self.peek_typ() {
                    Some(TokTyp::Comma) => {
                        self.toks.next();
                    }
                    Some(TokTyp::CloseParen) => {
                        self.toks.next();
                        break;
                    }
                    _ => return Err(self.unexpected()),
                }
            }
        }

        match stdlib::registry().get(name.loc.get()) {
            Some((key, ident)) if ident.arity() != args.len() => Err(SyntaxErr {
                typ: SyntaxErrTyp::ArityMismatch {
                    name: key,
                    expected: ident.arity(),
                    found: args.len(),
                },
                loc: name.loc,
            }),
            Some((_, Ident::Const(val))) => Ok(Node {
                typ: NodeTyp::Literal(*val),
                loc: name.loc,
            }),
            // unknown names are rejected when evaluated
            _ => Ok(Node {
                typ: NodeTyp::Call(args),
                loc: name.loc,
            }),
        }
    }
}

fn check_parens(toks: &[Tok]) -> Result<(), SyntaxErr> {
    let mut open: Vec<&Tok> = Vec::new();
    for tok in toks {
        match tok.typ {
            TokTyp::OpenParen => open.push(tok),
            TokTyp::CloseParen => {
                if open.pop().is_none() {
                    return Err(SyntaxErr {
                        typ: SyntaxErrTyp::UnbalancedParens,
                        loc: tok.loc.clone(),
                    });
                }
            }
            _ => {}
        }
    }
    match open.pop() {
        Some(tok) => Err(SyntaxErr {
            typ: SyntaxErrTyp::UnbalancedParens,
            loc: tok.loc.clone(),
        }),
        None => Ok(()),
    }
}

/// Builds an expression tree. Never evaluates anything; only structure and
/// function arity are validated.
pub fn parse(lex: Lexer<'_>) -> Result<Node, SyntaxErr> {
    let src = Arc::clone(lex.src());
    let toks = lex.collect::<Result<Vec<Tok>, SyntaxErr>>()?;

    if toks.is_empty() {
        return Err(SyntaxErr {
            typ: SyntaxErrTyp::EmptyExpression,
            loc: SubStr::all(src),
        });
    }
    check_parens(&toks)?;

    let mut parser = Parser {
        toks: toks.into_iter().peekable(),
        src,
        depth: 0,
    };
    let tree = parser.expr(0)?;
    if parser.toks.peek().is_some() {
        return Err(parser.unexpected());
    }
    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_str(input: &str) -> Result<Node, SyntaxErr> {
        let src = Arc::new(input.to_string());
        parse(Lexer::new(&src))
    }

    fn grouping(input: &str) -> String {
        parse_str(input).unwrap().to_string()
    }

    fn err_typ(input: &str) -> SyntaxErrTyp {
        parse_str(input).unwrap_err().typ
    }

    #[test]
    fn precedence_and_associativity() {
        assert_eq!(grouping("1+2*3"), "(1 + (2 * 3))");
        assert_eq!(grouping("1-2-3"), "((1 - 2) - 3)");
        assert_eq!(grouping("8/4//2%3"), "(((8 / 4) // 2) % 3)");
        assert_eq!(grouping("2**3**2"), "(2 ** (3 ** 2))");
        assert_eq!(grouping("(1+2)*3"), "((1 + 2) * 3)");
    }

    #[test]
    fn unary_binds_looser_than_power() {
        assert_eq!(grouping("-2**2"), "(-(2 ** 2))");
        assert_eq!(grouping("2**-1"), "(2 ** (-1))");
        assert_eq!(grouping("--+3"), "(-(-(+3)))");
        assert_eq!(grouping("2*-3"), "(2 * (-3))");
    }

    #[test]
    fn calls_and_names() {
        assert_eq!(grouping("sqrt(2)+sin(30)"), "(sqrt(2) + sin(30))");
        assert_eq!(grouping("x**2-4"), "((x ** 2) - 4)");
        assert_eq!(grouping("foo(1, x)"), "foo(1, x)");

        let tree = parse_str("pi").unwrap();
        assert_eq!(tree.typ(), &NodeTyp::Literal(core::f64::consts::PI));
        assert_eq!(tree.name(), "pi");
        assert!(!tree.has_variable());
        assert!(parse_str("cos(x)").unwrap().has_variable());
    }

    #[test]
    fn arity_is_checked_at_parse_time() {
        assert_eq!(
            err_typ("sqrt(1, 2)"),
            SyntaxErrTyp::ArityMismatch {
                name: "sqrt",
                expected: 1,
                found: 2
            }
        );
        assert_eq!(
            err_typ("factorial()"),
            SyntaxErrTyp::ArityMismatch {
                name: "factorial",
                expected: 1,
                found: 0
            }
        );
        assert_eq!(
            err_typ("e(2)"),
            SyntaxErrTyp::ArityMismatch {
                name: "e",
                expected: 0,
                found: 1
            }
        );
    }

    #[test]
    fn unbalanced_parens() {
        for input in ["(1+2", "1+2)", ")(", "sqrt(4", "((1)"] {
            assert_eq!(err_typ(input), SyntaxErrTyp::UnbalancedParens, "{input}");
        }
        let err = parse_str("(1+2").unwrap_err();
        assert_eq!(err.pos(), 0);
    }

    #[test]
    fn empty_input() {
        assert_eq!(err_typ(""), SyntaxErrTyp::EmptyExpression);
        assert_eq!(err_typ("   "), SyntaxErrTyp::EmptyExpression);
    }

    #[test]
    fn implicit_multiplication_is_rejected() {
        assert_eq!(err_typ("2(3)"), SyntaxErrTyp::UnexpectedToken);
        assert_eq!(err_typ("2 x"), SyntaxErrTyp::UnexpectedToken);
        assert_eq!(err_typ("pi(2)"), SyntaxErrTyp::ArityMismatch {
            name: "pi",
            expected: 0,
            found: 1
        });
    }

    #[test]
    fn dangling_operators() {
        assert_eq!(err_typ("1+"), SyntaxErrTyp::UnexpectedEnd);
        assert_eq!(err_typ("*2"), SyntaxErrTyp::UnexpectedToken);
        assert_eq!(err_typ("()"), SyntaxErrTyp::UnexpectedToken);
        assert_eq!(err_typ("1,2"), SyntaxErrTyp::UnexpectedToken);
        assert_eq!(err_typ("abs(1,)"), SyntaxErrTyp::UnexpectedToken);
    }

    #[test]
    fn lexer_errors_pass_through() {
        assert_eq!(err_typ("1 & 2"), SyntaxErrTyp::UnexpectedChar('&'));
        assert_eq!(err_typ("1.+2"), SyntaxErrTyp::MalformedNumber);
    }

    #[test]
    fn nesting_is_bounded() {
        let deep = format!("{}1{}", "(".repeat(MAX_DEPTH + 1), ")".repeat(MAX_DEPTH + 1));
        assert_eq!(err_typ(&deep), SyntaxErrTyp::TooDeep);
        assert_eq!(err_typ(&"-".repeat(10_000)), SyntaxErrTyp::TooDeep);

        let fine = format!("{}1{}", "(".repeat(100), ")".repeat(100));
        assert!(parse_str(&fine).is_ok());
    }
}
