//! Deterministic automata

use std::fmt;

use crate::{
    automaton::{FiniteAutomaton, Transition},
    builder::BuildError,
    prelude::*,
};

mod sink;

/// A DFA has no transition for a state and symbol
///
/// This signals an automaton whose transition function is partial, as
/// opposed to a word the automaton rejects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("No transition from state {state} on symbol {symbol}")]
pub struct MissingTransition {
    /// The state being stepped from
    pub state: State,
    /// The symbol with no column entry
    pub symbol: Symbol,
}

/// An immutable DFA
///
/// Symbols outside the alphabet are read through the [`DEFAULT`] column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dfa {
    states: BTreeSet<State>,
    initial: State,
    accept: BTreeSet<State>,
    table: BTreeMap<State, BTreeMap<Symbol, State>>,
    alphabet: BTreeSet<Symbol>,
    names: BTreeMap<State, String>,
}

impl Dfa {
    pub(crate) fn from_parts(
        states: BTreeSet<State>,
        initial: State,
        accept: BTreeSet<State>,
        table: BTreeMap<State, BTreeMap<Symbol, State>>,
        alphabet: BTreeSet<Symbol>,
        names: BTreeMap<State, String>,
    ) -> Self {
        Self {
            states,
            initial,
            accept,
            table,
            alphabet,
            names,
        }
    }

    /// The single initial state
    #[inline]
    #[must_use]
    pub fn initial_state(&self) -> State { self.initial }

    /// The column consulted when reading `symbol`
    #[inline]
    #[must_use]
    pub fn column(&self, symbol: Symbol) -> Symbol {
        if self.alphabet.contains(&symbol) {
            symbol
        } else {
            DEFAULT
        }
    }

    /// Like [`step`](Self::step), returning `None` for a missing transition
    #[must_use]
    pub fn try_step(&self, state: State, symbol: Symbol) -> Option<State> {
        if symbol == EPSILON {
            return self.states.contains(&state).then_some(state);
        }

        self.table.get(&state)?.get(&self.column(symbol)).copied()
    }

    /// Follow the transition for `symbol` out of `state`
    ///
    /// Reading [`EPSILON`] stays in place.
    ///
    /// # Errors
    /// Returns [`MissingTransition`] if the transition is not defined.
    #[inline]
    pub fn step(&self, state: State, symbol: Symbol) -> Result<State, MissingTransition> {
        self.try_step(state, symbol)
            .ok_or(MissingTransition { state, symbol })
    }

    /// The outgoing transitions of a state, keyed by column
    pub fn row(&self, state: State) -> impl Iterator<Item = (Symbol, State)> + '_ {
        self.table
            .get(&state)
            .into_iter()
            .flatten()
            .map(|(&s, &t)| (s, t))
    }

    pub(crate) fn complemented(mut self) -> Self {
        self.accept = self.states.difference(&self.accept).copied().collect();
        self
    }
}

impl FiniteAutomaton for Dfa {
    #[inline]
    fn states(&self) -> &BTreeSet<State> { &self.states }

    #[inline]
    fn initial_states(&self) -> BTreeSet<State> { [self.initial].into() }

    #[inline]
    fn final_states(&self) -> &BTreeSet<State> { &self.accept }

    #[inline]
    fn alphabet(&self) -> &BTreeSet<Symbol> { &self.alphabet }

    fn transition_set(&self) -> BTreeSet<Transition> {
        self.table
            .iter()
            .flat_map(|(&from, row)| {
                row.iter()
                    .map(move |(&symbol, &to)| Transition { from, symbol, to })
            })
            .collect()
    }

    #[inline]
    fn state_name(&self, state: State) -> Option<&str> {
        self.names.get(&state).map(String::as_str)
    }

    fn run<I: IntoIterator<Item = Symbol>>(&self, word: I) -> Result<bool, MissingTransition> {
        let mut state = self.initial;
        for symbol in word {
            state = self.step(state, symbol)?;
        }

        Ok(self.accept.contains(&state))
    }

    /// Brzozowski's algorithm: reverse and determinize twice
    fn minimize(&self) -> Result<Dfa, BuildError> {
        let min = self.reverse().determinize()?.reverse().determinize()?;
        debug!(
            before = self.states.len(),
            after = min.states.len(),
            "Minimized DFA"
        );
        Ok(min)
    }
}

impl fmt::Display for Dfa {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &state in &self.states {
            let name = self.names.get(&state).map_or_else(String::new, |n| format!(" ({n})"));
            let init = if state == self.initial { ">" } else { " " };
            let fin = if self.accept.contains(&state) { "*" } else { " " };
            writeln!(f, "{init}{fin}{state}{name}")?;

            for (symbol, to) in self.row(state) {
                writeln!(f, "    {symbol} -> {to}")?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::MissingTransition;
    use crate::{DfaBuilder, EPSILON, FiniteAutomaton, RegularExpression, symbol, symbols};

    fn ab() -> super::Dfa {
        let mut b = DfaBuilder::new();
        let s0 = b.add_initial_state().unwrap();
        let s1 = b.add_state().unwrap();
        let s2 = b.add_final_state().unwrap();
        let s3 = b.add_state().unwrap();
        b.add_transition(s0, symbol('a'), s1).unwrap();
        b.add_transition(s1, symbol('b'), s2).unwrap();
        // unreachable duplicate of s1
        b.add_transition(s3, symbol('b'), s2).unwrap();
        b.build().unwrap()
    }

    #[test]
    fn step_and_missing_transition() {
        let dfa = ab();
        assert_eq!(dfa.step(0, symbol('a')), Ok(1));
        assert_eq!(dfa.step(0, EPSILON), Ok(0));
        assert_eq!(
            dfa.step(0, symbol('z')),
            Err(MissingTransition {
                state: 0,
                symbol: symbol('z'),
            })
        );
        assert_eq!(dfa.run_str("ab"), Ok(true));
        assert_eq!(dfa.run_str("aa"), Ok(false));
        assert!(dfa.run_str("az").is_err());
    }

    #[test]
    fn minimize_drops_redundant_states() {
        let dfa = ab();
        let min = dfa.minimize().unwrap();
        // start, after a, after ab, dead
        assert_eq!(min.states().len(), 4);
        assert_eq!(min.run_str("ab"), Ok(true));
        assert_eq!(min.run_str("ba"), Ok(false));
        assert_eq!(min.minimize().unwrap().states().len(), 4);
    }

    #[test]
    fn complement_flips_language() {
        let c = ab().complement().unwrap();
        for (word, expected) in [
            ("", true),
            ("a", true),
            ("ab", false),
            ("abb", true),
            ("ba", true),
        ] {
            assert_eq!(c.run_str(word), Ok(expected), "{word:?}");
        }

        let cc = c.complement().unwrap();
        assert_eq!(cc.run_str("ab"), Ok(true));
        assert_eq!(cc.run_str("b"), Ok(false));
    }

    #[test]
    fn emptiness() {
        assert!(!ab().is_empty());

        let mut b = DfaBuilder::new();
        let s0 = b.add_initial_state().unwrap();
        let s1 = b.add_state().unwrap();
        let s2 = b.add_final_state().unwrap();
        b.add_transition(s0, 0, s1).unwrap();
        b.add_transition(s2, 0, s1).unwrap();
        let dfa = b.build().unwrap();
        assert!(dfa.is_empty());
        assert!(dfa.minimize().unwrap().final_states().is_empty());

        let eps = RegularExpression::parse("").unwrap();
        assert!(!eps.is_empty());
        assert!(eps.complement().unwrap().is_empty());
    }

    #[test]
    fn minimal_a_star() {
        let min = RegularExpression::parse("a*").unwrap().minimize().unwrap();
        assert_eq!(min.states().len(), 1);
        assert_eq!(min.run(symbols("aaaa")), Ok(true));
    }
}
