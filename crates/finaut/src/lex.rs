//! Longest-match scanning on top of a DFA
//!
//! A [`Tokenizer`] splits text into maximal runs the automaton can extend
//! toward a final state.  A [`Lexer`] additionally tags every token with the
//! identifier of the first registered expression it matched, and a
//! [`Preprocessor`] rewrites tagged tokens through per-identifier
//! [`Process`]es.

mod lexer;
mod preprocessor;
mod tokenizer;

pub use lexer::{Lexer, LexerBuilder};
pub use preprocessor::{
    Keyword, Number, Preprocessor, PreprocessorBuilder, PreprocessorScanner, Process, QUOTATION,
    Quotation,
};
pub use tokenizer::{Scanner, Tokenizer, TokenizerBuilder};

use crate::State;

/// A run of input matched by a scanner
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    /// The consumed characters
    pub text: String,
    /// The state the scan ended in
    pub state: State,
    /// The identifier of the matched expression, if any
    pub identifier: Option<String>,
}

impl Token {
    /// The identifier as a borrowed string
    #[inline]
    #[must_use]
    pub fn identifier(&self) -> Option<&str> { self.identifier.as_deref() }
}
