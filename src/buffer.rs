// SPDX: CC0-1.0

//! The calculator's in-progress input. The engine itself is stateless; this
//! is the state a front end keeps between key presses.

use crate::{calculate, format, Error, EvalCtx};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InputBuffer {
    text: String,
}

impl InputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn set(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn push(&mut self, text: &str) {
        self.text.push_str(text);
    }

    /// Removes the last character, if any.
    pub fn delete_last(&mut self) {
        self.text.pop();
    }

    pub fn clear(&mut self) {
        self.text.clear();
    }

    /// Adds a leading minus sign, or removes one that is already there.
    pub fn toggle_sign(&mut self) {
        if let Some(rest) = self.text.strip_prefix('-') {
            self.text = rest.to_string();
        } else {
            self.text.insert(0, '-');
        }
    }

    /// `(text)/100`
    pub fn percent(&mut self) {
        self.text = format!("({})/100", self.text);
    }

    /// `fun(text)`, for the one-argument function keys.
    pub fn wrap(&mut self, fun: &str) {
        self.text = format!("{fun}({})", self.text);
    }

    /// Evaluates the buffer. A finite result replaces the input so it can be
    /// continued; `inf`, failures and errors clear it.
    pub fn equals(&mut self, ctx: &EvalCtx) -> Result<&str, Error> {
        match calculate(&self.text, ctx) {
            // `inf` would not parse back in
            Ok(val) if val.is_infinite() => {
                self.text.clear();
                Ok(if val > 0.0 { "inf" } else { "-inf" })
            }
            Ok(val) => {
                self.text = format::format(val, ctx.precision);
                Ok(&self.text)
            }
            Err(err) => {
                self.text.clear();
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn editing() {
        let mut buf = InputBuffer::new();
        buf.push("12");
        buf.push("+3");
        assert_eq!(buf.text(), "12+3");
        buf.delete_last();
        assert_eq!(buf.text(), "12+");
        buf.clear();
        assert!(buf.is_empty());
        buf.delete_last();
        assert!(buf.is_empty());
    }

    #[test]
    fn sign_toggles() {
        let mut buf = InputBuffer::new();
        buf.set("5");
        buf.toggle_sign();
        assert_eq!(buf.text(), "-5");
        buf.toggle_sign();
        assert_eq!(buf.text(), "5");
    }

    #[test]
    fn function_keys_wrap_the_input() {
        let ctx = EvalCtx::default();
        let mut buf = InputBuffer::new();
        buf.set("2+3");
        buf.wrap("factorial");
        assert_eq!(buf.text(), "factorial(2+3)");
        assert_eq!(buf.equals(&ctx).unwrap(), "120.00000000");

        buf.set("50");
        buf.percent();
        assert_eq!(buf.equals(&ctx).unwrap(), "0.50000000");
    }

    #[test]
    fn results_can_be_continued() {
        let ctx = EvalCtx {
            precision: 2,
            ..EvalCtx::default()
        };
        let mut buf = InputBuffer::new();
        buf.set("1/4");
        assert_eq!(buf.equals(&ctx).unwrap(), "0.25");
        buf.push("*4");
        assert_eq!(buf.equals(&ctx).unwrap(), "1.00");
    }

    #[test]
    fn overflow_is_shown_but_not_kept() {
        let ctx = EvalCtx::default();
        let mut buf = InputBuffer::new();
        buf.set("10**400");
        assert_eq!(buf.equals(&ctx).unwrap(), "inf");
        assert!(buf.is_empty());

        buf.set("-exp(1000)");
        assert_eq!(buf.equals(&ctx).unwrap(), "-inf");
        buf.push("2*3");
        assert_eq!(buf.equals(&ctx).unwrap(), "6.00000000");
    }

    #[test]
    fn failures_clear_the_input() {
        let ctx = EvalCtx::default();
        let mut buf = InputBuffer::new();
        buf.set("tan(90)");
        assert_eq!(buf.equals(&ctx).unwrap_err().display_str(), "UNDEFINED");
        assert!(buf.is_empty());

        buf.set("2**");
        assert_eq!(buf.equals(&ctx).unwrap_err().display_str(), "ERROR");
        assert!(buf.is_empty());
    }
}
