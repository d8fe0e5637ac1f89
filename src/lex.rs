// SPDX: CC0-1.0

use crate::{
    eval::OperatorTyp,
    parse::{SyntaxErr, SyntaxErrTyp},
    Number,
};
use core::{fmt, iter::Peekable, str::CharIndices};
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SubStr {
    // yes, silly, but atomic operations are cheap for this use case
    src: Arc<String>,
    start: usize,
    len: usize,
}

impl SubStr {
    #[inline]
    pub const fn new(src: Arc<String>, start: usize, len: usize) -> Self {
        Self { src, start, len }
    }

    #[inline]
    pub fn all(src: Arc<String>) -> Self {
        let len = src.len();
        Self::new(src, 0, len)
    }

    /// Zero-length span just past the last byte of `src`.
    pub fn end_of(src: &Arc<String>) -> Self {
        Self::new(Arc::clone(src), src.len(), 0)
    }

    pub fn src(&self) -> Arc<String> {
        Arc::clone(&self.src)
    }

    pub const fn start(&self) -> usize {
        self.start
    }

    pub const fn len(&self) -> usize {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self) -> &str {
        &self.src[self.start..self.start + self.len]
    }
}

impl fmt::Display for SubStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.get())
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TokTyp {
    Ident,
    Number(Number),
    Op(OperatorTyp),
    Comma,
    OpenParen,
    CloseParen,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Tok {
    pub typ: TokTyp,
    pub loc: SubStr,
}

/// Lazily scans `src` into tokens. Yields `None` forever after the first
/// error.
#[derive(Debug)]
pub struct Lexer<'src> {
    src: &'src Arc<String>,
    cur: Peekable<CharIndices<'src>>,
    has_errored: bool,
}

impl<'src> Lexer<'src> {
    pub fn new(src: &'src Arc<String>) -> Self {
        Self {
            src,
            cur: src.char_indices().peekable(),
            has_errored: false,
        }
    }

    pub fn src(&self) -> &'src Arc<String> {
        self.src
    }

    pub fn trim_whitespace(&mut self) {
        while let Some((_, chr)) = self.cur.peek() {
            if chr.is_whitespace() {
                self.cur.next();
            } else {
                break;
            }
        }
    }

    fn span(&self, start: usize, len: usize) -> SubStr {
        SubStr::new(Arc::clone(self.src), start, len)
    }

    fn next_is(&mut self, want: char) -> bool {
        matches!(self.cur.peek(), Some((_, chr)) if *chr == want)
    }

    /// Consumes characters while `predicate` holds, returning how many bytes
    /// were eaten.
    pub fn consume_by<P>(&mut self, predicate: P) -> usize
    where
        P: Fn(char) -> bool,
    {
        let mut len = 0;
        while let Some((_, chr)) = self.cur.peek().copied() {
            if predicate(chr) {
                len += chr.len_utf8();
                self.cur.next();
            } else {
                break;
            }
        }
        len
    }

    pub fn consume_operator(&mut self) -> Option<Tok> {
        let (idx, chr) = self.cur.peek().copied()?;
        let typ = match chr {
            '+' => TokTyp::Op(OperatorTyp::Add),
            '-' => TokTyp::Op(OperatorTyp::Sub),
            '*' => TokTyp::Op(OperatorTyp::Mul),
            '/' => TokTyp::Op(OperatorTyp::Div),
            '%' => TokTyp::Op(OperatorTyp::Mod),
            ',' => TokTyp::Comma,
            '(' => TokTyp::OpenParen,
            ')' => TokTyp::CloseParen,
            _ => return None,
        };
        self.cur.next();

        // `**` and `//` must win over their single-character prefixes
        let (typ, len) = match typ {
            TokTyp::Op(OperatorTyp::Mul) if self.next_is('*') => {
                self.cur.next();
                (TokTyp::Op(OperatorTyp::Pow), 2)
            }
            TokTyp::Op(OperatorTyp::Div) if self.next_is('/') => {
                self.cur.next();
                (TokTyp::Op(OperatorTyp::FloorDiv), 2)
            }
            typ => (typ, 1),
        };

        Some(Tok {
            typ,
            loc: self.span(idx, len),
        })
    }

    /// `[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?`
    fn consume_number(&mut self, start: usize) -> Result<Tok, SyntaxErr> {
        let mut len = self.consume_by(|chr| chr.is_ascii_digit());

        if self.next_is('.') {
            self.cur.next();
            len += 1;
            let frac = self.consume_by(|chr| chr.is_ascii_digit());
            if frac == 0 {
                return Err(self.malformed(start, len));
            }
            len += frac;
        }

        if self.next_is('e') || self.next_is('E') {
            self.cur.next();
            len += 1;
            if self.next_is('+') || self.next_is('-') {
                self.cur.next();
                len += 1;
            }
            let exp = self.consume_by(|chr| chr.is_ascii_digit());
            if exp == 0 {
                return Err(self.malformed(start, len));
            }
            len += exp;
        }

        let loc = self.span(start, len);
        match loc.get().parse::<Number>() {
            Ok(val) => Ok(Tok {
                typ: TokTyp::Number(val),
                loc,
            }),
            Err(_) => Err(SyntaxErr {
                typ: SyntaxErrTyp::MalformedNumber,
                loc,
            }),
        }
    }

    fn malformed(&self, start: usize, len: usize) -> SyntaxErr {
        SyntaxErr {
            typ: SyntaxErrTyp::MalformedNumber,
            loc: self.span(start, len),
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Tok, SyntaxErr>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.has_errored {
            return None;
        }

        self.trim_whitespace();

        let (next_idx, next_chr) = self.cur.peek().copied()?;
        let ret = if let Some(tok) = self.consume_operator() {
            Ok(tok)
        } else if next_chr.is_ascii_alphabetic() || next_chr == '_' {
            let len = self.consume_by(|chr| chr.is_ascii_alphanumeric() || chr == '_');
            Ok(Tok {
                typ: TokTyp::Ident,
                loc: self.span(next_idx, len),
            })
        } else if next_chr.is_ascii_digit() {
            self.consume_number(next_idx)
        } else {
            Err(SyntaxErr {
                typ: SyntaxErrTyp::UnexpectedChar(next_chr),
                loc: self.span(next_idx, next_chr.len_utf8()),
            })
        };

        if ret.is_err() {
            self.has_errored = true;
        }
        Some(ret)
    }
}

/// Scans all of `src` at once.
pub fn tokenize(src: &Arc<String>) -> Result<Vec<Tok>, SyntaxErr> {
    Lexer::new(src).collect()
}
