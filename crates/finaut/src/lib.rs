//! Finite automata over integer-coded alphabets
//!
//! The crate is organized leaf-first: an [`Alphabet`](alphabet::Alphabet)
//! interns words to symbol ids, [builders](builder) stage states and
//! transitions, and the built [`Nfa`](nfa::Nfa) and [`Dfa`](dfa::Dfa) types
//! provide subset construction, Brzozowski minimization and complementation.
//! On top of those sit the [regular expression compiler](re), the
//! [product construction](product), a longest-match [lexing pipeline](lex)
//! and [action automata](action).

#![deny(
    clippy::disallowed_methods,
    clippy::suspicious,
    clippy::style,
    clippy::clone_on_ref_ptr,
    missing_debug_implementations,
    missing_copy_implementations
)]
#![warn(clippy::pedantic, missing_docs)]
#![allow(clippy::module_name_repetitions)]

pub mod action;
pub mod alphabet;
pub mod automaton;
pub mod builder;
mod closure;
pub mod dfa;
mod free;
pub mod lex;
pub mod nfa;
pub mod product;
pub mod re;

pub use automaton::{FiniteAutomaton, Transition};
pub use builder::{BuildError, DfaBuilder, NfaBuilder};
pub use dfa::{Dfa, MissingTransition};
pub use nfa::Nfa;
pub use re::RegularExpression;

mod prelude {
    pub use std::collections::{BTreeMap, BTreeSet, VecDeque};

    pub use tracing::{debug, trace};

    pub use crate::{State, Symbol, DEFAULT, EPSILON, ERROR};
}

/// Identifier of an automaton state
pub type State = u32;

/// Identifier of an input symbol
///
/// Non-negative values are real alphabet entries; the negative values are
/// reserved for [`EPSILON`], [`ERROR`] and [`DEFAULT`].
pub type Symbol = i32;

/// Pseudo-symbol labelling transitions that consume no input
pub const EPSILON: Symbol = -1;

/// Sentinel symbol for input that has no valid transition
pub const ERROR: Symbol = -2;

/// Column under which "any other symbol" transitions are stored
pub const DEFAULT: Symbol = -3;

/// The largest symbol id an alphabet may hand out
pub const MAX_SYMBOL: Symbol = Symbol::MAX;

/// Map a character to the symbol with the same Unicode scalar value
#[inline]
#[must_use]
pub fn symbol(c: char) -> Symbol {
    Symbol::try_from(u32::from(c)).unwrap_or_else(|_| unreachable!())
}

/// Map every character of a string to its symbol
#[inline]
pub fn symbols(s: &str) -> impl Iterator<Item = Symbol> + '_ { s.chars().map(symbol) }

/// Check whether a symbol may label a transition added through a builder
#[inline]
#[must_use]
pub fn is_label(sym: Symbol) -> bool { sym >= 0 || sym == ERROR }
