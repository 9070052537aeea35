use std::{iter::Peekable, ops::Deref, str::Chars};

use hashbrown::HashSet;

use super::Token;
use crate::{
    automaton::{FiniteAutomaton, delegate_automaton},
    builder::BuildError,
    dfa::Dfa,
    nfa,
    prelude::*,
    re::RegularExpression,
    symbol,
};

/// Automaton matching the [`ERROR`] symbol once
pub(super) fn error_automaton() -> Result<Dfa, BuildError> {
    RegularExpression::singleton(ERROR)?.minimize()
}

/// A DFA with precomputed sink states, ready to split text into tokens
#[derive(Debug, Clone)]
pub struct Tokenizer {
    dfa: Dfa,
    sinks: HashSet<State>,
    identifiers: BTreeMap<State, String>,
}

delegate_automaton!(Tokenizer => dfa);

impl Deref for Tokenizer {
    type Target = Dfa;

    #[inline]
    fn deref(&self) -> &Dfa { &self.dfa }
}

impl Tokenizer {
    /// Scan with `dfa`, which need not be total
    #[must_use]
    pub fn new(dfa: Dfa) -> Self { Self::with_identifiers(dfa, BTreeMap::new()) }

    pub(super) fn with_identifiers(dfa: Dfa, identifiers: BTreeMap<State, String>) -> Self {
        let sinks = dfa.sink_states();
        debug!(
            states = dfa.states().len(),
            sinks = sinks.len(),
            "Computed tokenizer sink states"
        );

        Self {
            dfa,
            sinks,
            identifiers,
        }
    }

    /// States from which no final state is reachable
    #[inline]
    #[must_use]
    pub fn sink_states(&self) -> &HashSet<State> { &self.sinks }

    /// The identifier attached to tokens ending in `state`
    #[inline]
    #[must_use]
    pub fn identifier(&self, state: State) -> Option<&str> {
        self.identifiers.get(&state).map(String::as_str)
    }

    /// Lazily split `input` into tokens
    #[inline]
    #[must_use]
    pub fn scan<'a>(&'a self, input: &'a str) -> Scanner<'a> { Scanner::new(self, input) }

    /// The symbol read for `c`; characters the automaton has no column for
    /// read as [`ERROR`]
    fn symbol(&self, c: char) -> Symbol {
        let sym = symbol(c);
        let alphabet = self.dfa.alphabet();
        if alphabet.contains(&sym) || alphabet.contains(&DEFAULT) {
            sym
        } else {
            ERROR
        }
    }

    /// The successor of `state` on `c`, or `None` if it is a sink
    fn advance(&self, state: State, c: char) -> Option<State> {
        self.dfa
            .try_step(state, self.symbol(c))
            .filter(|s| !self.sinks.contains(s))
    }
}

/// Collects the expressions of a [`Tokenizer`]
#[derive(Debug, Clone, Default)]
pub struct TokenizerBuilder {
    expressions: Vec<Dfa>,
}

impl TokenizerBuilder {
    /// A builder with no expressions
    #[inline]
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Register the minimal DFA of `expr`
    ///
    /// # Errors
    /// Returns [`BuildError::CapacityExceeded`] if minimization runs out of
    /// state ids.
    pub fn add_expression<A: FiniteAutomaton + ?Sized>(
        &mut self,
        expr: &A,
    ) -> Result<(), BuildError> {
        self.expressions.push(expr.minimize()?);
        Ok(())
    }

    /// Minimize the union of the registered expressions and the error
    /// automaton
    ///
    /// # Errors
    /// Returns [`BuildError::CapacityExceeded`] if the automata do not fit.
    pub fn build(&self) -> Result<Tokenizer, BuildError> {
        let error = error_automaton()?;
        let union = nfa::union(std::iter::once(&error).chain(&self.expressions))?;
        Ok(Tokenizer::new(union.minimize()?))
    }
}

/// Iterator over the tokens of one input
#[derive(Debug, Clone)]
pub struct Scanner<'a> {
    tokenizer: &'a Tokenizer,
    input: Peekable<Chars<'a>>,
}

impl<'a> Scanner<'a> {
    /// Start scanning `input` from its first character
    #[must_use]
    pub fn new(tokenizer: &'a Tokenizer, input: &'a str) -> Self {
        Self {
            tokenizer,
            input: input.chars().peekable(),
        }
    }

    /// Check whether any input is left
    #[inline]
    pub fn has_next(&mut self) -> bool { self.input.peek().is_some() }

    /// Consume the longest prefix that does not lead into a sink
    ///
    /// If the first character already sinks the automaton it is consumed on
    /// its own as an unidentified token, so every call makes progress.
    /// Returns `None` once the input is exhausted.
    pub fn next_token(&mut self) -> Option<Token> {
        let tok = self.tokenizer;
        let mut state = tok.dfa.initial_state();
        let mut text = String::new();
        let mut stuck = false;

        while let Some(&c) = self.input.peek() {
            if let Some(next) = tok.advance(state, c) {
                text.push(c);
                self.input.next();
                state = next;
            } else {
                if text.is_empty() {
                    text.push(c);
                    self.input.next();
                    stuck = true;
                }
                break;
            }
        }

        if text.is_empty() {
            return None;
        }

        let identifier = if stuck {
            None
        } else {
            tok.identifier(state).map(str::to_owned)
        };
        trace!(%text, state, ?identifier, "Scanned token");

        Some(Token {
            text,
            state,
            identifier,
        })
    }
}

impl Iterator for Scanner<'_> {
    type Item = Token;

    #[inline]
    fn next(&mut self) -> Option<Token> { self.next_token() }
}

#[cfg(test)]
mod test {
    use super::{Tokenizer, TokenizerBuilder};
    use crate::{DfaBuilder, RegularExpression, symbol};

    fn tokenizer(exprs: &[&str]) -> Tokenizer {
        let mut b = TokenizerBuilder::new();
        for expr in exprs {
            b.add_expression(&RegularExpression::parse(expr).unwrap())
                .unwrap();
        }
        b.build().unwrap()
    }

    fn texts(tok: &Tokenizer, input: &str) -> Vec<String> {
        tok.scan(input).map(|t| t.text).collect()
    }

    #[test]
    fn longest_match() {
        let tok = tokenizer(&["ab", "ba"]);
        assert_eq!(texts(&tok, "abbba"), ["ab", "b", "ba"]);
    }

    #[test]
    fn unknown_characters_split() {
        let tok = tokenizer(&["ab", "ba"]);
        assert_eq!(texts(&tok, "abaxaabxbax"), [
            "ab", "a", "x", "a", "ab", "x", "ba", "x"
        ]);
    }

    #[test]
    fn sinking_first_character_is_consumed() {
        let tok = tokenizer(&["ab", "ba", "ac"]);
        assert_eq!(texts(&tok, "c"), ["c"]);
        assert_eq!(texts(&tok, "cab"), ["c", "ab"]);
    }

    #[test]
    fn only_the_first_character_is_forced() {
        // s0 -a-> s1 -b-> s0, with s0 final
        let mut b = DfaBuilder::new();
        let s0 = b.add_initial_state().unwrap();
        let s1 = b.add_state().unwrap();
        b.make_final(s0).unwrap();
        b.add_transition(s0, symbol('a'), s1).unwrap();
        b.add_transition(s1, symbol('b'), s0).unwrap();
        let tok = Tokenizer::new(b.build().unwrap());

        assert_eq!(texts(&tok, "abb"), ["ab", "b"]);
        assert_eq!(texts(&tok, "ababbab"), ["abab", "b", "ab"]);
    }

    #[test]
    fn exhausted_input() {
        let tok = tokenizer(&["a"]);
        let mut scanner = tok.scan("a");
        assert!(scanner.has_next());
        assert_eq!(scanner.next_token().unwrap().text, "a");
        assert!(!scanner.has_next());
        assert_eq!(scanner.next_token(), None);
        assert_eq!(tok.scan("").count(), 0);
    }

    #[test]
    fn sink_states_end_tokens() {
        // s0 -a-> s1 -b-> s2, with s3 unable to reach s2
        let mut b = DfaBuilder::new();
        let s0 = b.add_initial_state().unwrap();
        let s1 = b.add_state().unwrap();
        let s2 = b.add_final_state().unwrap();
        let s3 = b.add_state().unwrap();
        b.add_transition(s0, symbol('a'), s1).unwrap();
        b.add_transition(s1, symbol('b'), s2).unwrap();
        b.add_transition(s1, symbol('a'), s3).unwrap();
        let tok = Tokenizer::new(b.build().unwrap());

        assert!(tok.sink_states().contains(&s3));
        let tokens: Vec<_> = tok.scan("abaab").collect();
        assert_eq!(
            tokens.iter().map(|t| t.text.as_str()).collect::<Vec<_>>(),
            ["ab", "a", "ab"]
        );
        assert_eq!(tokens[0].state, s2);
        assert_eq!(tokens[1].state, s1);
        assert!(tokens.iter().all(|t| t.identifier.is_none()));
    }
}
