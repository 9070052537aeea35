use std::{fmt, ops::Deref};

use super::{
    Token,
    lexer::{Lexer, LexerBuilder},
    tokenizer::Scanner,
};
use crate::{
    automaton::{FiniteAutomaton, delegate_automaton},
    builder::BuildError,
    prelude::*,
    re::{ParseError, RegularExpression},
};

/// Identifier of the token produced by [`Quotation`]
pub const QUOTATION: &str = "string";

/// A rewrite applied to every token tagged with a given identifier
///
/// A process may pull further tokens from the scanner.  Returning `None`
/// rejects the token and whatever it consumed.
pub trait Process: fmt::Debug {
    /// Rewrite `token`, reading ahead through `scanner` as needed
    fn apply(&self, token: Token, scanner: &mut PreprocessorScanner<'_>) -> Option<Token>;
}

/// Merge everything up to the next token with the same identifier into one
/// [`QUOTATION`] token
#[derive(Debug, Clone, Copy, Default)]
pub struct Quotation;

impl Process for Quotation {
    fn apply(&self, token: Token, scanner: &mut PreprocessorScanner<'_>) -> Option<Token> {
        let mut text = String::new();

        while let Some(next) = scanner.next_token() {
            if next.identifier == token.identifier {
                return Some(Token {
                    text,
                    state: token.state,
                    identifier: Some(QUOTATION.into()),
                });
            }

            text.push_str(&scanner.apply(next)?.text);
        }

        None
    }
}

/// Drop the escape character leading a keyword
#[derive(Debug, Clone, Copy, Default)]
pub struct Keyword;

impl Process for Keyword {
    fn apply(&self, token: Token, _: &mut PreprocessorScanner<'_>) -> Option<Token> {
        let mut chars = token.text.chars();
        chars.next();

        Some(Token {
            text: chars.as_str().into(),
            ..token
        })
    }
}

/// Attach a sign to the token that follows it, if the sign itself follows a
/// separator
#[derive(Debug, Clone, Copy, Default)]
pub struct Number;

impl Process for Number {
    fn apply(&self, token: Token, scanner: &mut PreprocessorScanner<'_>) -> Option<Token> {
        let after_separator = scanner
            .last_token()
            .is_some_and(|t| scanner.is_separator(t));

        if after_separator && scanner.has_next() {
            let mut next = scanner.process_token()?;
            next.text.insert_str(0, &token.text);
            Some(next)
        } else {
            Some(token)
        }
    }
}

/// A [`Lexer`] that rewrites its tokens through registered [`Process`]es
#[derive(Debug)]
pub struct Preprocessor {
    lexer: Lexer,
    processes: BTreeMap<String, Box<dyn Process>>,
    separators: BTreeSet<(String, String)>,
}

delegate_automaton!(Preprocessor => lexer);

impl Deref for Preprocessor {
    type Target = Lexer;

    #[inline]
    fn deref(&self) -> &Lexer { &self.lexer }
}

impl Preprocessor {
    /// Lazily split `input` into tokens, running processes on demand
    #[inline]
    #[must_use]
    pub fn scan<'a>(&'a self, input: &'a str) -> PreprocessorScanner<'a> {
        PreprocessorScanner {
            pre: self,
            scanner: self.lexer.scan(input),
            last_token: None,
        }
    }

    /// The process registered for `identifier`
    #[inline]
    #[must_use]
    pub fn process(&self, identifier: &str) -> Option<&dyn Process> {
        self.processes.get(identifier).map(AsRef::as_ref)
    }
}

/// Collects the expressions, processes and separators of a [`Preprocessor`]
#[derive(Debug, Default)]
pub struct PreprocessorBuilder {
    lexer: LexerBuilder,
    processes: BTreeMap<String, Box<dyn Process>>,
    separators: BTreeSet<(String, String)>,
}

impl PreprocessorBuilder {
    /// An empty builder
    #[inline]
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// See [`LexerBuilder::add_expression`]
    ///
    /// # Errors
    /// Returns [`BuildError::CapacityExceeded`] if minimization runs out of
    /// state ids.
    #[inline]
    pub fn add_expression<A: FiniteAutomaton + ?Sized>(
        &mut self,
        expr: &A,
        identifier: impl Into<String>,
    ) -> Result<(), BuildError> {
        self.lexer.add_expression(expr, identifier)
    }

    /// Run `process` on tokens tagged `identifier`, returning the process it
    /// replaces
    pub fn add_process(
        &mut self,
        identifier: impl Into<String>,
        process: impl Process + 'static,
    ) -> Option<Box<dyn Process>> {
        self.processes.insert(identifier.into(), Box::new(process))
    }

    /// Declare tokens with this text and identifier as separators, after
    /// which [`Number`] attaches a sign to the following token
    pub fn add_number_separator(&mut self, text: impl Into<String>, identifier: impl Into<String>) {
        self.separators.insert((text.into(), identifier.into()));
    }

    /// # Errors
    /// See [`LexerBuilder::build`].
    pub fn build(self) -> Result<Preprocessor, BuildError> {
        Ok(Preprocessor {
            lexer: self.lexer.build()?,
            processes: self.processes,
            separators: self.separators,
        })
    }

    /// A double quote
    ///
    /// # Errors
    /// Never fails in practice.
    pub fn quotation_mark() -> Result<RegularExpression, ParseError> {
        RegularExpression::literal('"').map_err(Into::into)
    }

    /// An escaped double quote
    ///
    /// # Errors
    /// Never fails in practice.
    pub fn keywords() -> Result<RegularExpression, ParseError> {
        RegularExpression::parse(r#"\\""#)
    }

    /// Decimal integers without leading zeros
    ///
    /// # Errors
    /// Never fails in practice.
    pub fn integer() -> Result<RegularExpression, ParseError> {
        RegularExpression::parse("(1+2+3+4+5+6+7+8+9)(0+1+2+3+4+5+6+7+8+9)*+0")
    }

    /// Decimals with a fraction, an exponent or both
    ///
    /// # Errors
    /// Never fails in practice.
    pub fn float() -> Result<RegularExpression, ParseError> {
        let integer = Self::integer()?;
        let digits = RegularExpression::parse("(0+1+2+3+4+5+6+7+8+9)(0+1+2+3+4+5+6+7+8+9)*")?;
        let point = RegularExpression::literal('.')?;
        let number = RegularExpression::concatenation([&integer, &point, &digits])?;

        let e = RegularExpression::parse("e+E")?;
        let exponent = RegularExpression::concatenation([&e, &integer])?;
        let optional = RegularExpression::union([&exponent, &RegularExpression::parse("")?])?;

        let scientific = RegularExpression::concatenation([&integer, &exponent])?;
        let decimal = RegularExpression::concatenation([&number, &optional])?;
        RegularExpression::union([&scientific, &decimal]).map_err(Into::into)
    }
}

/// Pulls processed tokens out of one input
#[derive(Debug)]
pub struct PreprocessorScanner<'a> {
    pre: &'a Preprocessor,
    scanner: Scanner<'a>,
    last_token: Option<Token>,
}

impl PreprocessorScanner<'_> {
    /// Check whether input remains
    #[inline]
    pub fn has_next(&mut self) -> bool { self.scanner.has_next() }

    /// The next token of the underlying [`Lexer`], unprocessed
    #[inline]
    pub fn next_token(&mut self) -> Option<Token> { self.scanner.next_token() }

    /// The result of the previous [`process_token`](Self::process_token)
    #[inline]
    #[must_use]
    pub fn last_token(&self) -> Option<&Token> { self.last_token.as_ref() }

    /// Check whether `token` matches a registered number separator
    #[must_use]
    pub fn is_separator(&self, token: &Token) -> bool {
        token.identifier.as_ref().is_some_and(|id| {
            self.pre
                .separators
                .iter()
                .any(|(text, sep)| *text == token.text && sep == id)
        })
    }

    /// Run the process registered for the token's identifier, if any
    pub fn apply(&mut self, token: Token) -> Option<Token> {
        let pre = self.pre;
        match token.identifier().and_then(|id| pre.process(id)) {
            Some(process) => process.apply(token, self),
            None => Some(token),
        }
    }

    /// Skip tokens without an identifier, then process the first one with
    /// an identifier
    ///
    /// Returns `None` if the input runs out first or the process rejects the
    /// token.
    pub fn process_token(&mut self) -> Option<Token> {
        let mut token = self.scanner.next_token();
        while token.as_ref().is_some_and(|t| t.identifier.is_none()) && self.scanner.has_next() {
            token = self.scanner.next_token();
        }

        let processed = token
            .filter(|t| t.identifier.is_some())
            .and_then(|t| self.apply(t));
        trace!(?processed, "Processed token");

        self.last_token.clone_from(&processed);
        processed
    }
}

#[cfg(test)]
mod test {
    use super::{Keyword, Number, Preprocessor, PreprocessorBuilder, Quotation};
    use crate::{FiniteAutomaton, RegularExpression, lex::Token, symbols};

    fn preprocessor() -> Preprocessor {
        let mut b = PreprocessorBuilder::new();
        let exprs = [
            (RegularExpression::parse("test").unwrap(), "stuff"),
            (RegularExpression::parse("-").unwrap(), "-"),
            (RegularExpression::parse(r"\*").unwrap(), "*"),
            (PreprocessorBuilder::quotation_mark().unwrap(), "\""),
            (PreprocessorBuilder::keywords().unwrap(), "keyword"),
            (PreprocessorBuilder::integer().unwrap(), "integer"),
            (PreprocessorBuilder::float().unwrap(), "float"),
        ];
        for (re, id) in &exprs {
            b.add_expression(re, *id).unwrap();
        }

        b.add_number_separator("*", "*");
        b.add_number_separator("-", "-");
        b.add_process("\"", Quotation);
        b.add_process("keyword", Keyword);
        b.add_process("-", Number);
        b.build().unwrap()
    }

    fn pair(token: Option<Token>) -> Option<(String, String)> {
        token.map(|t| (t.text, t.identifier.unwrap()))
    }

    fn expect(pre: &Preprocessor, input: &str, tokens: &[(&str, &str)]) {
        let mut scanner = pre.scan(input);
        for &(text, id) in tokens {
            assert_eq!(
                pair(scanner.process_token()),
                Some((text.into(), id.into())),
                "{input:?}"
            );
        }
        assert_eq!(scanner.process_token(), None, "{input:?}");
    }

    #[test]
    fn plain_tokens() {
        let pre = preprocessor();
        expect(&pre, "testtest", &[("test", "stuff"), ("test", "stuff")]);
        expect(&pre, "xxxtest", &[("test", "stuff")]);
        expect(&pre, "x", &[]);
        expect(&pre, "", &[]);
    }

    #[test]
    fn quotation() {
        let pre = preprocessor();
        expect(&pre, "\"xxtestxx\"", &[("xxtestxx", "string")]);
        expect(&pre, "\"xxtestxx\"test", &[("xxtestxx", "string"), ("test", "stuff")]);
        expect(&pre, "\"test", &[]);
        expect(&pre, "\"", &[]);
    }

    #[test]
    fn keyword() {
        let pre = preprocessor();
        expect(&pre, "\\\"test", &[("\"", "keyword"), ("test", "stuff")]);
    }

    #[test]
    fn signs() {
        let pre = preprocessor();
        expect(&pre, "12345-", &[("12345", "integer"), ("-", "-")]);
        expect(&pre, "--", &[("-", "-"), ("-", "-")]);
        expect(&pre, "12345-12345", &[("12345", "integer"), ("-", "-"), ("12345", "integer")]);
        expect(&pre, "-12345", &[("-", "-"), ("12345", "integer")]);
        expect(&pre, "--12345", &[("-", "-"), ("-12345", "integer")]);
        expect(&pre, "12345*-12345", &[("12345", "integer"), ("*", "*"), ("-12345", "integer")]);
        expect(&pre, "12345", &[("12345", "integer")]);
    }

    #[test]
    fn apply() {
        let pre = preprocessor();
        let mut scanner = pre.scan("");

        let unknown = Token {
            text: "stuff".into(),
            state: 0,
            identifier: Some("test".into()),
        };
        assert_eq!(scanner.apply(unknown.clone()), Some(unknown));

        let escaped = Token {
            text: "\\\"".into(),
            state: 0,
            identifier: Some("keyword".into()),
        };
        assert_eq!(pair(scanner.apply(escaped)), Some(("\"".into(), "keyword".into())));
    }

    #[test]
    fn builtin_expressions() {
        let accepts = |re: &RegularExpression, w: &str| re.run(symbols(w)).unwrap();

        assert!(accepts(&PreprocessorBuilder::quotation_mark().unwrap(), "\""));
        assert!(accepts(&PreprocessorBuilder::keywords().unwrap(), "\\\""));

        let integer = PreprocessorBuilder::integer().unwrap();
        for w in ["0", "1000", "1234456789"] {
            assert!(accepts(&integer, w), "{w:?}");
        }
        assert!(!accepts(&integer, "01"));

        let float = PreprocessorBuilder::float().unwrap();
        for w in ["1000.54321", "1000.543210", "100e10", "100E10"] {
            assert!(accepts(&float, w), "{w:?}");
        }
        assert!(!accepts(&float, "1000"));

        let pre = preprocessor();
        for w in ["\\\"", "0", "1000", "1000.54321", "100E10"] {
            assert_eq!(pre.run_str(w), Ok(true), "{w:?}");
        }
    }
}
