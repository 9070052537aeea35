//! Nondeterministic automata with epsilon moves

use std::fmt;

use self::determinize::Determinizer;
use crate::{
    automaton::{FiniteAutomaton, Transition},
    builder::{BuildError, NfaBuilder},
    closure::ClosureBuilder,
    dfa::{Dfa, MissingTransition},
    prelude::*,
};

mod determinize;

/// An immutable NFA
///
/// Transitions map a state and symbol to a set of states.  Epsilon moves are
/// stored under [`EPSILON`] and moves for symbols outside the alphabet under
/// [`DEFAULT`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nfa {
    states: BTreeSet<State>,
    initial: BTreeSet<State>,
    accept: BTreeSet<State>,
    edges: BTreeMap<State, BTreeMap<Symbol, BTreeSet<State>>>,
    alphabet: BTreeSet<Symbol>,
    names: BTreeMap<State, String>,
}

impl Nfa {
    pub(crate) fn from_parts(
        states: BTreeSet<State>,
        initial: BTreeSet<State>,
        accept: BTreeSet<State>,
        edges: BTreeMap<State, BTreeMap<Symbol, BTreeSet<State>>>,
        alphabet: BTreeSet<Symbol>,
        names: BTreeMap<State, String>,
    ) -> Self {
        Self {
            states,
            initial,
            accept,
            edges,
            alphabet,
            names,
        }
    }

    /// The column consulted when reading `symbol`
    #[inline]
    fn column(&self, symbol: Symbol) -> Symbol {
        if symbol == EPSILON || self.alphabet.contains(&symbol) {
            symbol
        } else {
            DEFAULT
        }
    }

    /// Raw targets of one column of one state
    pub(crate) fn targets(&self, state: State, column: Symbol) -> impl Iterator<Item = State> + '_ {
        self.edges
            .get(&state)
            .and_then(|r| r.get(&column))
            .into_iter()
            .flatten()
            .copied()
    }

    /// The given states plus every state reachable from them by epsilon moves
    pub fn closure<I: IntoIterator<Item = State>>(&self, states: I) -> BTreeSet<State> {
        let mut closure = ClosureBuilder::default();
        closure.init(states);
        closure.solve(BTreeSet::new(), |s| self.targets(s, EPSILON))
    }

    /// Read one symbol from every state of `states`, then take the closure
    ///
    /// Reading [`EPSILON`] only takes the closure.
    #[must_use]
    pub fn step(&self, states: &BTreeSet<State>, symbol: Symbol) -> BTreeSet<State> {
        if symbol == EPSILON {
            return self.closure(states.iter().copied());
        }

        let column = self.column(symbol);
        self.closure(states.iter().flat_map(|&s| self.targets(s, column)))
    }

    /// Convert to an equivalent total DFA by subset construction
    ///
    /// # Errors
    /// Returns [`BuildError::CapacityExceeded`] if the subsets outnumber the
    /// state id space.
    #[inline]
    pub fn determinize(&self) -> Result<Dfa, BuildError> { Determinizer::new(self).build() }
}

impl FiniteAutomaton for Nfa {
    #[inline]
    fn states(&self) -> &BTreeSet<State> { &self.states }

    #[inline]
    fn initial_states(&self) -> BTreeSet<State> { self.initial.clone() }

    #[inline]
    fn final_states(&self) -> &BTreeSet<State> { &self.accept }

    #[inline]
    fn alphabet(&self) -> &BTreeSet<Symbol> { &self.alphabet }

    fn transition_set(&self) -> BTreeSet<Transition> {
        self.edges
            .iter()
            .flat_map(|(&from, row)| {
                row.iter().flat_map(move |(&symbol, to)| {
                    to.iter().map(move |&to| Transition { from, symbol, to })
                })
            })
            .collect()
    }

    #[inline]
    fn state_name(&self, state: State) -> Option<&str> {
        self.names.get(&state).map(String::as_str)
    }

    fn run<I: IntoIterator<Item = Symbol>>(&self, word: I) -> Result<bool, MissingTransition> {
        let mut live = self.closure(self.initial.iter().copied());

        for symbol in word {
            if live.is_empty() {
                return Ok(false);
            }

            live = self.step(&live, symbol);
        }

        Ok(!live.is_disjoint(&self.accept))
    }

    #[inline]
    fn minimize(&self) -> Result<Dfa, BuildError> { self.determinize()?.minimize() }
}

impl fmt::Display for Nfa {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &state in &self.states {
            let name = self.names.get(&state).map_or_else(String::new, |n| format!(" ({n})"));
            let init = if self.initial.contains(&state) { ">" } else { " " };
            let fin = if self.accept.contains(&state) { "*" } else { " " };
            writeln!(f, "{init}{fin}{state}{name}")?;

            for (&symbol, targets) in self.edges.get(&state).into_iter().flatten() {
                writeln!(f, "    {symbol} -> {targets:?}")?;
            }
        }

        Ok(())
    }
}

/// Build the union of several automata
///
/// A fresh initial state has epsilon moves into each automaton and a fresh
/// final state is entered by epsilon moves from each automaton's final
/// states.
///
/// # Errors
/// Returns [`BuildError::CapacityExceeded`] if the states do not fit.
pub fn union<'a, A: FiniteAutomaton + 'a>(
    automata: impl IntoIterator<Item = &'a A>,
) -> Result<Nfa, BuildError> {
    let mut builder = NfaBuilder::new();
    let start = builder.add_initial_state()?;
    let end = builder.add_final_state()?;

    for automaton in automata {
        let imported = builder.add_automaton(automaton)?;

        for &init in &imported.initial {
            builder.add_epsilon_transition(start, init)?;
        }

        for &fin in &imported.accept {
            builder.add_epsilon_transition(fin, end)?;
        }
    }

    builder.build()
}

#[cfg(test)]
mod test {
    use super::union;
    use crate::{EPSILON, FiniteAutomaton, NfaBuilder, symbol, symbols};

    fn sample() -> super::Nfa {
        // a(b|ε)* with an epsilon loop
        let mut b = NfaBuilder::new();
        let s0 = b.add_initial_state().unwrap();
        let s1 = b.add_state().unwrap();
        let s2 = b.add_state().unwrap();
        let s3 = b.add_final_state().unwrap();
        b.add_transition(s0, symbol('a'), s1).unwrap();
        b.add_epsilon_transition(s1, s2).unwrap();
        b.add_epsilon_transition(s2, s1).unwrap();
        b.add_epsilon_transition(s2, s3).unwrap();
        b.add_transition(s3, symbol('b'), s2).unwrap();
        b.build().unwrap()
    }

    #[test]
    fn closure_follows_epsilon_cycles() {
        let nfa = sample();
        assert_eq!(nfa.closure([1]), [1, 2, 3].into());
        assert_eq!(nfa.closure([0]), [0].into());
        assert_eq!(nfa.step(&[1].into(), EPSILON), [1, 2, 3].into());
        assert_eq!(nfa.step(&[0].into(), symbol('a')), [1, 2, 3].into());
        assert!(nfa.step(&[0].into(), symbol('b')).is_empty());
    }

    #[test]
    fn run_and_determinize_agree() {
        let nfa = sample();
        let dfa = nfa.determinize().unwrap();

        for (word, expected) in [
            ("", false),
            ("a", true),
            ("ab", true),
            ("abbb", true),
            ("ba", false),
            ("aa", false),
            ("abab", false),
        ] {
            assert_eq!(nfa.run_str(word), Ok(expected), "{word:?}");
            assert_eq!(dfa.run_str(word), Ok(expected), "{word:?}");
        }
    }

    #[test]
    fn determinize_is_total() {
        let dfa = sample().determinize().unwrap();
        for &state in dfa.states() {
            for &sym in dfa.alphabet() {
                assert!(dfa.step(state, sym).is_ok());
            }
        }
    }

    #[test]
    fn reverse_reads_backwards() {
        let rev = sample().reverse();
        assert_eq!(rev.initial_states(), [3].into());
        assert_eq!(rev.run(symbols("bba")), Ok(true));
        assert_eq!(rev.run(symbols("ab")), Ok(false));
    }

    #[test]
    fn union_of_many() {
        let a = sample();
        let mut b = NfaBuilder::new();
        let s0 = b.add_initial_state().unwrap();
        let s1 = b.add_final_state().unwrap();
        b.add_transition(s0, symbol('c'), s1).unwrap();
        let c = b.build().unwrap();

        let u = union([&a, &c]).unwrap();
        assert_eq!(u.run_str("abb"), Ok(true));
        assert_eq!(u.run_str("c"), Ok(true));
        assert_eq!(u.run_str("ac"), Ok(false));

        let empty = union::<super::Nfa>([]).unwrap();
        assert!(empty.is_empty());
    }
}
