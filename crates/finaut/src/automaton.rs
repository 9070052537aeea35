//! Behavior shared by all finite automata

use crate::{
    builder::BuildError,
    closure::ClosureBuilder,
    dfa::{Dfa, MissingTransition},
    nfa::Nfa,
    prelude::*,
};

/// A single `(from, symbol, to)` edge of an automaton
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Transition {
    /// Source state
    pub from: State,
    /// Symbol read, [`EPSILON`] for epsilon moves
    pub symbol: Symbol,
    /// Target state
    pub to: State,
}

/// Read-only view of a built automaton and the transformations every
/// automaton supports
pub trait FiniteAutomaton {
    /// Every state, reachable or not
    fn states(&self) -> &BTreeSet<State>;

    /// The states a run starts in; exactly one for a DFA
    fn initial_states(&self) -> BTreeSet<State>;

    /// The accepting states
    fn final_states(&self) -> &BTreeSet<State>;

    /// Every symbol with a column in the transition store, including
    /// [`DEFAULT`] if the automaton has default moves
    fn alphabet(&self) -> &BTreeSet<Symbol>;

    /// Enumerate every transition, including epsilon moves
    fn transition_set(&self) -> BTreeSet<Transition>;

    /// The name a state was given by its builder
    fn state_name(&self, state: State) -> Option<&str>;

    /// Check whether the automaton accepts `word`
    ///
    /// # Errors
    /// Deterministic automata return [`MissingTransition`] if the word leaves
    /// the defined transition function.
    fn run<I: IntoIterator<Item = Symbol>>(&self, word: I) -> Result<bool, MissingTransition>;

    /// Compute the minimal total DFA for the accepted language
    ///
    /// # Errors
    /// Returns [`BuildError::CapacityExceeded`] if the intermediate automata
    /// exhaust the state id space.
    fn minimize(&self) -> Result<Dfa, BuildError>;

    /// [`run`](Self::run) over the characters of a string
    ///
    /// # Errors
    /// See [`run`](Self::run).
    #[inline]
    fn run_str(&self, word: &str) -> Result<bool, MissingTransition> {
        self.run(crate::symbols(word))
    }

    /// Check whether `state` accepts
    #[inline]
    fn is_final(&self, state: State) -> bool { self.final_states().contains(&state) }

    /// Swap initial and final states and invert every edge
    fn reverse(&self) -> Nfa {
        let mut edges: BTreeMap<State, BTreeMap<Symbol, BTreeSet<State>>> = BTreeMap::new();
        for Transition { from, symbol, to } in self.transition_set() {
            edges
                .entry(to)
                .or_default()
                .entry(symbol)
                .or_default()
                .insert(from);
        }

        Nfa::from_parts(
            self.states().clone(),
            self.final_states().clone(),
            self.initial_states(),
            edges,
            self.alphabet().clone(),
            BTreeMap::new(),
        )
    }

    /// Minimize, then swap final and non-final states
    ///
    /// # Errors
    /// See [`minimize`](Self::minimize).
    fn complement(&self) -> Result<Dfa, BuildError> { Ok(self.minimize()?.complemented()) }

    /// Check whether no word is accepted, including the empty word
    fn is_empty(&self) -> bool {
        let mut succ: BTreeMap<State, Vec<State>> = BTreeMap::new();
        for t in self.transition_set() {
            succ.entry(t.from).or_default().push(t.to);
        }

        let mut closure = ClosureBuilder::default();
        closure.init(self.initial_states());
        let reachable = closure.solve(BTreeSet::new(), |s| {
            succ.get(&s).into_iter().flatten().copied()
        });

        reachable.is_disjoint(self.final_states())
    }
}

/// Implement [`FiniteAutomaton`] for a wrapper by forwarding to a field
///
/// The `run = method` form routes [`run`](FiniteAutomaton::run) through an
/// inherent method of the wrapper instead.
macro_rules! delegate_automaton {
    (@view $field:tt) => {
        #[inline]
        fn states(&self) -> &std::collections::BTreeSet<$crate::State> {
            $crate::automaton::FiniteAutomaton::states(&self.$field)
        }

        #[inline]
        fn initial_states(&self) -> std::collections::BTreeSet<$crate::State> {
            $crate::automaton::FiniteAutomaton::initial_states(&self.$field)
        }

        #[inline]
        fn final_states(&self) -> &std::collections::BTreeSet<$crate::State> {
            $crate::automaton::FiniteAutomaton::final_states(&self.$field)
        }

        #[inline]
        fn alphabet(&self) -> &std::collections::BTreeSet<$crate::Symbol> {
            $crate::automaton::FiniteAutomaton::alphabet(&self.$field)
        }

        #[inline]
        fn transition_set(&self) -> std::collections::BTreeSet<$crate::automaton::Transition> {
            $crate::automaton::FiniteAutomaton::transition_set(&self.$field)
        }

        #[inline]
        fn state_name(&self, state: $crate::State) -> Option<&str> {
            $crate::automaton::FiniteAutomaton::state_name(&self.$field, state)
        }

        #[inline]
        fn minimize(&self) -> Result<$crate::dfa::Dfa, $crate::builder::BuildError> {
            $crate::automaton::FiniteAutomaton::minimize(&self.$field)
        }
    };

    ($ty:ty => $field:tt) => {
        impl $crate::automaton::FiniteAutomaton for $ty {
            $crate::automaton::delegate_automaton!(@view $field);

            #[inline]
            fn run<I: IntoIterator<Item = $crate::Symbol>>(
                &self,
                word: I,
            ) -> Result<bool, $crate::dfa::MissingTransition> {
                $crate::automaton::FiniteAutomaton::run(&self.$field, word)
            }
        }
    };

    ($ty:ty => $field:tt, run = $run:ident) => {
        impl $crate::automaton::FiniteAutomaton for $ty {
            $crate::automaton::delegate_automaton!(@view $field);

            #[inline]
            fn run<I: IntoIterator<Item = $crate::Symbol>>(
                &self,
                word: I,
            ) -> Result<bool, $crate::dfa::MissingTransition> {
                self.$run(word)
            }
        }
    };
}

pub(crate) use delegate_automaton;
