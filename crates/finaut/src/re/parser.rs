use std::{
    iter::{Enumerate, Peekable},
    str::Chars,
};

use super::Regex;
use crate::{EPSILON, builder::BuildError, symbol};

/// A malformed regular expression
///
/// Positions count characters from zero.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// A character that cannot start or continue an expression here
    #[error("Unexpected {found:?} at position {position}")]
    UnexpectedChar {
        /// The offending character
        found: char,
        /// Its index in the input
        position: usize,
    },
    /// A backslash before a character with no special meaning
    #[error("Invalid escape sequence \\{found} at position {position}")]
    InvalidEscape {
        /// The escaped character
        found: char,
        /// Index of the backslash
        position: usize,
    },
    /// A trailing backslash
    #[error("Unterminated escape sequence at position {position}")]
    UnterminatedEscape {
        /// Index of the backslash
        position: usize,
    },
    /// An `(` with no matching `)`
    #[error("Group opened at position {position} was never closed")]
    UnclosedGroup {
        /// Index of the `(`
        position: usize,
    },
    /// The input ended where an operand was required
    #[error("Unexpected end of input")]
    UnexpectedEnd,
    /// Compiling the parsed tree failed
    #[error(transparent)]
    Build(#[from] BuildError),
}

/// Characters with a meaning of their own, written with a leading backslash
/// to be read literally
pub const RESERVED: [char; 5] = ['\\', '+', '*', '(', ')'];

/// Recursive-descent parser with one character of lookahead
///
/// ```text
/// regex  := united ('+' united)*
/// united := starred starred*          (up to ')' or '+')
/// starred := atom '*'*
/// atom   := '(' regex ')' | '\' reserved | literal
/// ```
struct Parser<'a> {
    input: Peekable<Enumerate<Chars<'a>>>,
}

impl<'a> Parser<'a> {
    #[inline]
    fn new(s: &'a str) -> Self {
        Self {
            input: s.chars().enumerate().peekable(),
        }
    }

    #[inline]
    fn peek(&mut self) -> Option<char> { self.input.peek().map(|&(_, c)| c) }

    fn regex(&mut self) -> Result<Regex, ParseError> {
        let mut alts = vec![self.united()?];
        while self.peek() == Some('+') {
            self.input.next();
            alts.push(self.united()?);
        }

        Ok(Regex::alt(alts))
    }

    fn united(&mut self) -> Result<Regex, ParseError> {
        let mut cat = vec![self.starred()?];
        while let Some(c) = self.peek()
            && c != ')'
            && c != '+'
        {
            cat.push(self.starred()?);
        }

        Ok(Regex::cat(cat))
    }

    fn starred(&mut self) -> Result<Regex, ParseError> {
        let mut re = self.atom()?;
        while self.peek() == Some('*') {
            self.input.next();
            re = Regex::Star(re.into());
        }

        Ok(re)
    }

    fn atom(&mut self) -> Result<Regex, ParseError> {
        match self.input.next() {
            None => Err(ParseError::UnexpectedEnd),
            Some((position, '(')) => {
                let re = self.regex()?;
                match self.input.next() {
                    Some((_, ')')) => Ok(re),
                    Some((position, found)) => Err(ParseError::UnexpectedChar { found, position }),
                    None => Err(ParseError::UnclosedGroup { position }),
                }
            },
            Some((position, '\\')) => match self.input.next() {
                None => Err(ParseError::UnterminatedEscape { position }),
                Some((_, c)) if RESERVED.contains(&c) => Ok(Regex::Lit(symbol(c))),
                Some((position, found)) => Err(ParseError::InvalidEscape { found, position }),
            },
            Some((position, found @ (')' | '*' | '+'))) => {
                Err(ParseError::UnexpectedChar { found, position })
            },
            Some((_, c)) => Ok(Regex::Lit(symbol(c))),
        }
    }
}

/// Parse a regular expression into its syntax tree
///
/// The empty string denotes the language containing only the empty word.
///
/// # Errors
/// Returns a [`ParseError`] locating the first malformed construct.
pub fn parse(s: &str) -> Result<Regex, ParseError> {
    let mut parser = Parser::new(s);
    if parser.peek().is_none() {
        return Ok(Regex::Lit(EPSILON));
    }

    let re = parser.regex()?;
    match parser.input.next() {
        None => Ok(re),
        Some((position, found)) => Err(ParseError::UnexpectedChar { found, position }),
    }
}

#[cfg(test)]
mod test {
    use super::{ParseError, parse};
    use crate::{EPSILON, re::Regex, symbol};

    fn lit(c: char) -> Regex { Regex::Lit(symbol(c)) }

    #[test]
    fn precedence() {
        assert_eq!(
            parse("ab*+c").unwrap(),
            Regex::Alt(vec![
                Regex::Cat(vec![lit('a'), Regex::Star(lit('b').into())]),
                lit('c'),
            ])
        );
        assert_eq!(
            parse("(a+b)**").unwrap(),
            Regex::Star(Regex::Star(Regex::Alt(vec![lit('a'), lit('b')]).into()).into())
        );
        assert_eq!(parse("").unwrap(), Regex::Lit(EPSILON));
    }

    #[test]
    fn escapes() {
        assert_eq!(
            parse(r"\(\\\+\*\)").unwrap(),
            Regex::Cat(vec![lit('('), lit('\\'), lit('+'), lit('*'), lit(')')])
        );
        assert_eq!(
            parse(r"a\x"),
            Err(ParseError::InvalidEscape {
                found: 'x',
                position: 2,
            })
        );
        assert_eq!(
            parse(r"ab\"),
            Err(ParseError::UnterminatedEscape { position: 2 })
        );
    }

    #[test]
    fn malformed() {
        for (input, expected) in [
            ("*a", ParseError::UnexpectedChar {
                found: '*',
                position: 0,
            }),
            ("+", ParseError::UnexpectedChar {
                found: '+',
                position: 0,
            }),
            ("a)", ParseError::UnexpectedChar {
                found: ')',
                position: 1,
            }),
            ("()", ParseError::UnexpectedChar {
                found: ')',
                position: 1,
            }),
            ("a+", ParseError::UnexpectedEnd),
            ("x(ab", ParseError::UnclosedGroup { position: 1 }),
            ("a(b+)", ParseError::UnexpectedChar {
                found: ')',
                position: 4,
            }),
        ] {
            assert_eq!(parse(input), Err(expected), "{input:?}");
        }
    }

    #[test]
    fn positions_count_chars() {
        assert_eq!(
            parse("éé)"),
            Err(ParseError::UnexpectedChar {
                found: ')',
                position: 2,
            })
        );
    }
}
