// SPDX: CC0-1.0

use crate::{
    eval::EvalErrTyp,
    lex::SubStr,
    parse::{Node, SyntaxErrTyp},
    stdlib::{self, X},
    Error,
};
use anyhow::Context;
use chrono::Local;
use core::fmt;
use std::{
    io::{self, stdin, BufRead, Write},
    sync::Arc,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Help,
    Quit,
    Set,
    Append,
    Delete,
    Clear,
    Negate,
    Percent,
    Wrap,
    Eval,
    Plot,
    SetWin,
    Precision,
    Angle,
    PrintTree,
}

impl Command {
    pub const fn exhaustive() -> &'static [Command] {
        &[
            Self::Help,
            Self::Quit,
            Self::Set,
            Self::Append,
            Self::Delete,
            Self::Clear,
            Self::Negate,
            Self::Percent,
            Self::Wrap,
            Self::Eval,
            Self::Plot,
            Self::SetWin,
            Self::Precision,
            Self::Angle,
            Self::PrintTree,
        ]
    }

    pub const fn help(&self) -> &'static str {
        match self {
            Self::Help => "display help for each command",
            Self::Quit => "quit the shell",
            Self::Set => "replace the input with a new expression",
            Self::Append => "append text to the input",
            Self::Delete => "delete the last character of the input",
            Self::Clear => "clear the input",
            Self::Negate => "toggle a leading minus sign on the input",
            Self::Percent => "divide the input by 100",
            Self::Wrap => "apply a one-argument function to the input",
            Self::Eval => "evaluate the input and replace it with the result",
            Self::Plot => "sample the input as a function of x and write the points to a file",
            Self::SetWin => "set the sampling window used by plot",
            Self::Precision => "set the number of fractional digits shown",
            Self::Angle => "switch between degrees and radians",
            Self::PrintTree => "print how the input is grouped (for debugging)",
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Help => "help",
            Self::Quit => "quit",
            Self::Set => "set",
            Self::Append => "append",
            Self::Delete => "del",
            Self::Clear => "ac",
            Self::Negate => "neg",
            Self::Percent => "percent",
            Self::Wrap => "wrap",
            Self::Eval => "eval",
            Self::Plot => "plot",
            Self::SetWin => "window",
            Self::Precision => "precision",
            Self::Angle => "angle",
            Self::PrintTree => "tree",
        }
    }
}

impl core::str::FromStr for Command {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "=" {
            return Ok(Self::Eval);
        }
        for c in Self::exhaustive() {
            if s == c.name() {
                return Ok(*c);
            }
        }
        Err(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Info,
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// `2024-01-31 12:00:00,123 - ERROR - message`
pub fn log<W: Write>(mut out: W, level: Level, msg: impl fmt::Display) -> io::Result<()> {
    let now = Local::now();
    writeln!(
        out,
        "{stamp} - {level} - {msg}",
        stamp = now.format("%Y-%m-%d %H:%M:%S,%3f")
    )
}

/// Reads one trimmed line. `None` means standard input is exhausted.
pub fn input<W: Write>(out: W, prompt: impl fmt::Display) -> anyhow::Result<Option<String>> {
    fn inner<W: Write>(mut out: W, prompt: impl fmt::Display) -> io::Result<Option<String>> {
        write!(out, "{prompt}")?;
        out.flush()?;
        let mut stdin = stdin().lock();
        let mut s = String::new();
        if stdin.read_line(&mut s)? == 0 {
            return Ok(None);
        }
        Ok(Some(s.trim().to_string()))
    }

    let s = inner(out, prompt).context("read from standard input failed")?;
    Ok(s)
}

pub fn read_fromstr<W: Write, T: core::str::FromStr>(
    mut out: W,
    prompt: impl fmt::Display,
) -> anyhow::Result<Result<Option<T>, <T as core::str::FromStr>::Err>>
where
    <T as core::str::FromStr>::Err: fmt::Display,
{
    let input = match input(&mut out, prompt)? {
        Some(input) if !input.is_empty() => Arc::new(input),
        _ => return Ok(Ok(None)),
    };
    match input.parse::<T>() {
        Ok(new) => Ok(Ok(Some(new))),
        Err(err) => {
            writeln!(out)?;
            underline(&mut out, &SubStr::all(input))?;
            writeln!(out, "parse error: {err}")?;
            Ok(Err(err))
        }
    }
}

pub fn underline<W: Write>(mut out: W, span: &SubStr) -> io::Result<()> {
    let src = span.src();
    // columns, not bytes
    let pad = src[..span.start()].chars().count();
    let width = span.get().chars().count();
    writeln!(out, "{src}")?;
    writeln!(out, "{}{}", " ".repeat(pad), "^".repeat(width.max(1)))?;
    Ok(())
}

pub fn dump_tree<W: Write>(mut out: W, tree: &Node, title: fmt::Arguments) -> io::Result<()> {
    writeln!(out, "{title}: {tree}")?;
    if tree.has_variable() {
        writeln!(out, "  (depends on '{X}')")?;
    }
    Ok(())
}

/// Closest registered name to `text`, if any is reasonably close.
pub fn suggest(text: &str) -> Option<(&'static str, &'static str)> {
    let text = text.to_ascii_lowercase();
    stdlib::registry()
        .iter()
        .map(|(name, ident)| (name, ident.kind_name()))
        .chain([(X, "variable")])
        .map(|(name, kind)| {
            (
                strsim::normalized_damerau_levenshtein(&text, &name.to_ascii_lowercase()),
                (name, kind),
            )
        })
        .filter(|(sim, _)| *sim > 0.3)
        .max_by(|(a, _), (b, _)| a.total_cmp(b))
        .map(|(_, found)| found)
}

/// Underlines where `err` happened, explains it, and adds a hint when there is
/// an obvious one.
pub fn report<W: Write>(mut out: W, err: &Error) -> io::Result<()> {
    match err {
        Error::Syntax(err) => {
            writeln!(out)?;
            underline(&mut out, &err.loc)?;
            writeln!(out, "parse error: {}", err.typ)?;
            match &err.typ {
                SyntaxErrTyp::UnexpectedChar('^') => {
                    writeln!(out, "note: use '**' for exponentiation")?
                }
                SyntaxErrTyp::UnexpectedChar('|') => writeln!(
                    out,
                    "note: use the 'abs' function to compute absolute value"
                )?,
                SyntaxErrTyp::UnexpectedChar('=') => {
                    writeln!(out, "note: expected an expression but found an equation")?
                }
                SyntaxErrTyp::UnexpectedChar('<' | '>') => {
                    writeln!(out, "note: expected an expression but found an inequality")?
                }
                SyntaxErrTyp::UnexpectedChar(_) => writeln!(
                    out,
                    "note: available tokens are numbers, identifiers, and symbols + - * / // % ** , ( )"
                )?,
                SyntaxErrTyp::MalformedNumber => {
                    writeln!(out, "note: numbers look like 12, 1.5 or 2e-3")?
                }
                SyntaxErrTyp::UnexpectedToken => writeln!(
                    out,
                    "note: implicit multiplication is not supported, so for example '5x' would be '5*x'",
                )?,
                SyntaxErrTyp::UnbalancedParens
                | SyntaxErrTyp::ArityMismatch { .. }
                | SyntaxErrTyp::EmptyExpression
                | SyntaxErrTyp::UnexpectedEnd
                | SyntaxErrTyp::TooDeep => {}
            }
        }

        Error::Eval(err) => {
            underline(&mut out, &err.loc)?;
            writeln!(out, "evaluation error: {err}")?;
            match &err.typ {
                EvalErrTyp::UnknownSymbol(text) => {
                    if let Some((name, kind)) = suggest(text) {
                        writeln!(out, "note: {kind} '{name}' has a similar name")?;
                    }
                }
                EvalErrTyp::UnboundVariable => {
                    writeln!(out, "note: use plot to evaluate an expression of '{X}'")?
                }
                EvalErrTyp::Domain { .. } | EvalErrTyp::DivisionByZero => {}
            }
        }
    }
    Ok(())
}
