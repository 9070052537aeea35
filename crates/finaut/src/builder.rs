//! Mutable staging of automata
//!
//! A [`Builder`] allocates state ids sequentially, validates every transition
//! as it is added and produces an owned, immutable automaton on
//! [`build`](NfaBuilder::build).  The builder may keep being used afterwards;
//! nothing it does later is observed by automata it already built.

use std::collections::btree_map::Entry;

use crate::{
    alphabet::{Alphabet, AlphabetError},
    automaton::FiniteAutomaton,
    dfa::Dfa,
    free::Free,
    is_label,
    nfa::Nfa,
    prelude::*,
};

/// Misuse of a builder or exhaustion of its id space
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    /// No state id is left below the configured maximum
    #[error("State id space exhausted")]
    CapacityExceeded,
    /// A second initial state was requested; carries the existing one
    #[error("State {0} is already the initial state")]
    DuplicateInitialState(State),
    /// A state id this builder never handed out
    #[error("State {0} was never added")]
    UnknownState(State),
    /// A DFA state would get two transitions on one symbol
    #[error("State {from} already has a transition on symbol {symbol}")]
    NondeterministicTransition {
        /// The state with the existing transition
        from: State,
        /// The symbol it already reads
        symbol: Symbol,
    },
    /// `build` was called before an initial state was set
    #[error("No initial state was designated")]
    NoInitialState,
    /// A DFA state may have one default transition
    #[error("State {0} already has a default transition")]
    DuplicateDefaultTransition(State),
    /// A reserved symbol used as a label
    #[error("Symbol {0} cannot label this transition")]
    InvalidSymbol(Symbol),
    /// Names are unique within a builder
    #[error("A state named {0:?} already exists")]
    DuplicateStateName(String),
    /// Interning a word label failed
    #[error(transparent)]
    Alphabet(#[from] AlphabetError),
}

/// Staging area for an automaton whose transitions lead to `T`
///
/// `T` is a set of states for [`NfaBuilder`] and a single state for
/// [`DfaBuilder`].
#[derive(Debug, Clone)]
pub struct Builder<T> {
    alphabet: Alphabet,
    free: Free<State>,
    states: BTreeSet<State>,
    initial: Option<State>,
    accept: BTreeSet<State>,
    names: BTreeMap<String, State>,
    edges: BTreeMap<State, BTreeMap<Symbol, T>>,
    defaults: BTreeMap<State, T>,
    // Symbols an imported default transition must not cover
    known: BTreeMap<State, BTreeSet<Symbol>>,
    declared: BTreeSet<Symbol>,
}

/// Builder for [`Nfa`]s
pub type NfaBuilder = Builder<BTreeSet<State>>;

/// Builder for [`Dfa`]s
pub type DfaBuilder = Builder<State>;

impl<T> Default for Builder<T> {
    fn default() -> Self {
        Self {
            alphabet: Alphabet::new(),
            free: Free::new(0, State::MAX),
            states: BTreeSet::new(),
            initial: None,
            accept: BTreeSet::new(),
            names: BTreeMap::new(),
            edges: BTreeMap::new(),
            defaults: BTreeMap::new(),
            known: BTreeMap::new(),
            declared: BTreeSet::new(),
        }
    }
}

/// The states an imported automaton was mapped onto
#[derive(Debug, Clone)]
pub struct Imported {
    /// New ids of the imported initial states
    pub initial: BTreeSet<State>,
    /// New ids of the imported final states
    pub accept: BTreeSet<State>,
    map: BTreeMap<State, State>,
}

impl Imported {
    /// Look up the new id of a state of the imported automaton
    #[inline]
    #[must_use]
    pub fn state(&self, old: State) -> Option<State> { self.map.get(&old).copied() }
}

impl<T> Builder<T> {
    /// An empty builder with a fresh alphabet
    #[inline]
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Use `alphabet` to intern the words of
    /// [`add_word_transition`](NfaBuilder::add_word_transition)
    #[inline]
    #[must_use]
    pub fn with_alphabet(mut self, alphabet: Alphabet) -> Self {
        self.alphabet = alphabet;
        self
    }

    /// Limit state ids to `0..=max`
    ///
    /// This restarts id allocation and is meant for a fresh builder.
    #[inline]
    #[must_use]
    pub fn with_max_states(mut self, max: State) -> Self {
        self.free = Free::new(0, max);
        self
    }

    /// The alphabet word labels are interned in
    #[inline]
    #[must_use]
    pub fn alphabet(&self) -> &Alphabet { &self.alphabet }

    /// Mutable access, for interning words ahead of use
    #[inline]
    pub fn alphabet_mut(&mut self) -> &mut Alphabet { &mut self.alphabet }

    /// Every state added since construction or the last [`clear`](Self::clear)
    #[inline]
    #[must_use]
    pub fn states(&self) -> &BTreeSet<State> { &self.states }

    /// The designated initial state, if any
    #[inline]
    #[must_use]
    pub fn initial_state(&self) -> Option<State> { self.initial }

    /// The states marked final so far
    #[inline]
    #[must_use]
    pub fn final_states(&self) -> &BTreeSet<State> { &self.accept }

    /// Check whether `state` was added
    #[inline]
    #[must_use]
    pub fn contains_state(&self, state: State) -> bool { self.states.contains(&state) }

    /// Look up a state by the name it was added with
    #[inline]
    #[must_use]
    pub fn state_named(&self, name: &str) -> Option<State> { self.names.get(name).copied() }

    /// Allocate a fresh state
    ///
    /// # Errors
    /// Returns [`BuildError::CapacityExceeded`] once the id space is used up.
    pub fn add_state(&mut self) -> Result<State, BuildError> {
        let state = self.free.fresh().ok_or(BuildError::CapacityExceeded)?;
        self.states.insert(state);
        Ok(state)
    }

    /// # Errors
    /// Fails if the name is taken or the id space is used up.
    pub fn add_named_state(&mut self, name: impl Into<String>) -> Result<State, BuildError> {
        let name = name.into();
        if self.names.contains_key(&name) {
            return Err(BuildError::DuplicateStateName(name));
        }

        let state = self.add_state()?;
        self.names.insert(name, state);
        Ok(state)
    }

    /// # Errors
    /// Fails if an initial state already exists or the id space is used up.
    pub fn add_initial_state(&mut self) -> Result<State, BuildError> {
        self.check_no_initial()?;
        let state = self.add_state()?;
        self.initial = Some(state);
        Ok(state)
    }

    /// # Errors
    /// Fails if an initial state already exists, the name is taken or the id
    /// space is used up.
    pub fn add_named_initial_state(
        &mut self,
        name: impl Into<String>,
    ) -> Result<State, BuildError> {
        self.check_no_initial()?;
        let state = self.add_named_state(name)?;
        self.initial = Some(state);
        Ok(state)
    }

    /// # Errors
    /// Returns [`BuildError::CapacityExceeded`] once the id space is used up.
    pub fn add_final_state(&mut self) -> Result<State, BuildError> {
        let state = self.add_state()?;
        self.accept.insert(state);
        Ok(state)
    }

    /// # Errors
    /// Fails if the name is taken or the id space is used up.
    pub fn add_named_final_state(&mut self, name: impl Into<String>) -> Result<State, BuildError> {
        let state = self.add_named_state(name)?;
        self.accept.insert(state);
        Ok(state)
    }

    /// Designate an existing state as the initial state
    ///
    /// # Errors
    /// Fails if the state is unknown or a different state is already initial.
    pub fn make_initial(&mut self, state: State) -> Result<(), BuildError> {
        self.check(state)?;
        match self.initial {
            Some(initial) if initial != state => Err(BuildError::DuplicateInitialState(initial)),
            _ => {
                self.initial = Some(state);
                Ok(())
            },
        }
    }

    /// # Errors
    /// Returns [`BuildError::UnknownState`] if the state was never added.
    pub fn make_final(&mut self, state: State) -> Result<(), BuildError> {
        self.check(state)?;
        self.accept.insert(state);
        Ok(())
    }

    /// Include a symbol in the built alphabet even if no transition uses it
    ///
    /// # Errors
    /// Returns [`BuildError::InvalidSymbol`] for [`EPSILON`].
    pub fn declare_symbol(&mut self, symbol: Symbol) -> Result<(), BuildError> {
        if symbol == EPSILON {
            return Err(BuildError::InvalidSymbol(symbol));
        }

        self.declared.insert(symbol);
        Ok(())
    }

    /// Forget every state and transition, keeping the configuration and the
    /// interned words
    pub fn clear(&mut self) {
        self.free = Free::new(0, self.free.max());
        self.states.clear();
        self.initial = None;
        self.accept.clear();
        self.names.clear();
        self.edges.clear();
        self.defaults.clear();
        self.known.clear();
        self.declared.clear();
    }

    pub(crate) fn declare_all(&mut self, symbols: impl IntoIterator<Item = Symbol>) {
        self.declared
            .extend(symbols.into_iter().filter(|&s| s != EPSILON));
    }

    #[inline]
    fn check(&self, state: State) -> Result<(), BuildError> {
        if self.states.contains(&state) {
            Ok(())
        } else {
            Err(BuildError::UnknownState(state))
        }
    }

    #[inline]
    fn check_no_initial(&self) -> Result<(), BuildError> {
        self.initial
            .map_or(Ok(()), |s| Err(BuildError::DuplicateInitialState(s)))
    }

    fn symbols(&self) -> BTreeSet<Symbol> {
        let mut symbols = self.declared.clone();
        symbols.extend(
            self.edges
                .values()
                .flat_map(BTreeMap::keys)
                .copied()
                .filter(|&s| s != EPSILON),
        );
        if !self.defaults.is_empty() {
            symbols.insert(DEFAULT);
        }
        symbols
    }

    fn state_names(&self) -> BTreeMap<State, String> {
        self.names.iter().map(|(n, &s)| (s, n.clone())).collect()
    }
}

impl<T: Clone> Builder<T> {
    /// Expand default transitions into explicit edges over `symbols` plus the
    /// [`DEFAULT`] column
    fn expanded_edges(&self, symbols: &BTreeSet<Symbol>) -> BTreeMap<State, BTreeMap<Symbol, T>> {
        let mut edges = self.edges.clone();

        for (&from, target) in &self.defaults {
            let known = self.known.get(&from);
            let row = edges.entry(from).or_default();

            for &sym in symbols {
                if sym == DEFAULT || known.is_some_and(|k| k.contains(&sym)) {
                    continue;
                }

                row.entry(sym).or_insert_with(|| target.clone());
            }

            row.entry(DEFAULT).or_insert_with(|| target.clone());
        }

        edges
    }
}

impl Builder<BTreeSet<State>> {
    /// Add a transition, returning false if it already existed
    ///
    /// # Errors
    /// Fails if either state is unknown or the symbol is reserved.
    pub fn add_transition(
        &mut self,
        from: State,
        symbol: Symbol,
        to: State,
    ) -> Result<bool, BuildError> {
        if !(is_label(symbol) || symbol == EPSILON) {
            return Err(BuildError::InvalidSymbol(symbol));
        }

        self.link(from, symbol, to)
    }

    /// # Errors
    /// Returns [`BuildError::UnknownState`] if either state is unknown.
    #[inline]
    pub fn add_epsilon_transition(&mut self, from: State, to: State) -> Result<bool, BuildError> {
        self.link(from, EPSILON, to)
    }

    /// Add a transition on the interned id of `word`
    ///
    /// # Errors
    /// Fails if either state is unknown or the alphabet is full.
    pub fn add_word_transition(
        &mut self,
        from: State,
        word: &str,
        to: State,
    ) -> Result<bool, BuildError> {
        let symbol = self.alphabet.intern(word)?;
        self.link(from, symbol, to)
    }

    /// Add a transition taken on any symbol `from` has no labeled transition
    /// for
    ///
    /// # Errors
    /// Returns [`BuildError::UnknownState`] if either state is unknown.
    pub fn add_default_transition(&mut self, from: State, to: State) -> Result<bool, BuildError> {
        self.check(from)?;
        self.check(to)?;
        Ok(self.defaults.entry(from).or_default().insert(to))
    }

    /// Check for an edge; [`DEFAULT`] asks about default transitions
    #[must_use]
    pub fn contains_transition(&self, from: State, symbol: Symbol, to: State) -> bool {
        let map = if symbol == DEFAULT {
            self.defaults.get(&from)
        } else {
            self.edges.get(&from).and_then(|r| r.get(&symbol))
        };

        map.is_some_and(|t| t.contains(&to))
    }

    pub(crate) fn link(
        &mut self,
        from: State,
        symbol: Symbol,
        to: State,
    ) -> Result<bool, BuildError> {
        self.check(from)?;
        self.check(to)?;
        Ok(self
            .edges
            .entry(from)
            .or_default()
            .entry(symbol)
            .or_default()
            .insert(to))
    }

    /// Copy another automaton into this builder as a disconnected subgraph
    ///
    /// Every state of `other` gets a fresh id and every transition is
    /// replayed under the new ids.  No state is marked initial or final; the
    /// returned [`Imported`] lists which new states correspond to `other`'s
    /// initial and final states.
    ///
    /// # Errors
    /// Returns [`BuildError::CapacityExceeded`] if the states do not fit.
    pub fn add_automaton<A: FiniteAutomaton + ?Sized>(
        &mut self,
        other: &A,
    ) -> Result<Imported, BuildError> {
        let mut map = BTreeMap::new();
        for &state in other.states() {
            map.insert(state, self.add_state()?);
        }
        let get = |s: State| map.get(&s).copied().unwrap_or_else(|| unreachable!());

        let foreign: BTreeSet<_> = other
            .alphabet()
            .iter()
            .copied()
            .filter(|&s| s != DEFAULT)
            .collect();
        self.declared.extend(&foreign);

        for t in other.transition_set() {
            let (from, to) = (get(t.from), get(t.to));

            if t.symbol == DEFAULT {
                self.defaults.entry(from).or_default().insert(to);
                self.known
                    .entry(from)
                    .or_insert_with(|| foreign.clone());
            } else {
                self.link(from, t.symbol, to)?;
            }
        }

        Ok(Imported {
            initial: other.initial_states().into_iter().map(get).collect(),
            accept: other.final_states().iter().copied().map(get).collect(),
            map,
        })
    }

    /// Produce an owned NFA from the current contents
    ///
    /// # Errors
    /// Returns [`BuildError::NoInitialState`] if no initial state exists.
    pub fn build(&self) -> Result<Nfa, BuildError> {
        let initial = self.initial.ok_or(BuildError::NoInitialState)?;
        let alphabet = self.symbols();
        let edges = self.expanded_edges(&alphabet);

        Ok(Nfa::from_parts(
            self.states.clone(),
            [initial].into(),
            self.accept.clone(),
            edges,
            alphabet,
            self.state_names(),
        ))
    }
}

impl Builder<State> {
    /// # Errors
    /// Fails if either state is unknown, the symbol is reserved or `from`
    /// already has a transition on `symbol`.
    pub fn add_transition(
        &mut self,
        from: State,
        symbol: Symbol,
        to: State,
    ) -> Result<(), BuildError> {
        if !is_label(symbol) {
            return Err(BuildError::InvalidSymbol(symbol));
        }

        self.link(from, symbol, to)
    }

    /// Add a transition on the interned id of `word`
    ///
    /// # Errors
    /// Fails like [`add_transition`](Self::add_transition) or if the alphabet
    /// is full.
    pub fn add_word_transition(
        &mut self,
        from: State,
        word: &str,
        to: State,
    ) -> Result<(), BuildError> {
        let symbol = self.alphabet.intern(word)?;
        self.link(from, symbol, to)
    }

    /// Add a transition taken on any symbol `from` has no labeled transition
    /// for
    ///
    /// # Errors
    /// Fails if either state is unknown or `from` already has a default.
    pub fn add_default_transition(&mut self, from: State, to: State) -> Result<(), BuildError> {
        self.check(from)?;
        self.check(to)?;
        match self.defaults.entry(from) {
            Entry::Occupied(_) => Err(BuildError::DuplicateDefaultTransition(from)),
            Entry::Vacant(v) => {
                v.insert(to);
                Ok(())
            },
        }
    }

    /// The target of `from` on `symbol`; [`DEFAULT`] looks up the default
    /// transition
    #[inline]
    #[must_use]
    pub fn transition(&self, from: State, symbol: Symbol) -> Option<State> {
        if symbol == DEFAULT {
            self.defaults.get(&from).copied()
        } else {
            self.edges.get(&from)?.get(&symbol).copied()
        }
    }

    /// Check whether [`transition`](Self::transition) leads to `to`
    #[inline]
    #[must_use]
    pub fn contains_transition(&self, from: State, symbol: Symbol, to: State) -> bool {
        self.transition(from, symbol) == Some(to)
    }

    pub(crate) fn link(
        &mut self,
        from: State,
        symbol: Symbol,
        to: State,
    ) -> Result<(), BuildError> {
        self.check(from)?;
        self.check(to)?;
        match self.edges.entry(from).or_default().entry(symbol) {
            Entry::Occupied(_) => Err(BuildError::NondeterministicTransition { from, symbol }),
            Entry::Vacant(v) => {
                v.insert(to);
                Ok(())
            },
        }
    }

    /// Produce an owned DFA from the current contents
    ///
    /// If some state lacks a transition on a symbol of the alphabet, a single
    /// sink state is added and every missing transition, including the
    /// sink's own, is routed to it.
    ///
    /// # Errors
    /// Fails if no initial state exists or no id is left for the sink.
    pub fn build(&self) -> Result<Dfa, BuildError> {
        let initial = self.initial.ok_or(BuildError::NoInitialState)?;
        let alphabet = self.symbols();
        let mut states = self.states.clone();
        let mut table = self.expanded_edges(&alphabet);

        let partial = states.iter().any(|s| {
            let row = table.get(s);
            alphabet
                .iter()
                .any(|a| row.is_none_or(|r| !r.contains_key(a)))
        });

        if partial {
            let mut free = self.free;
            let sink = free.fresh().ok_or(BuildError::CapacityExceeded)?;
            states.insert(sink);

            for &state in &states {
                let row = table.entry(state).or_default();
                for &sym in &alphabet {
                    row.entry(sym).or_insert(sink);
                }
            }

            trace!(sink, "Completed partial transition table");
        }

        Ok(Dfa::from_parts(
            states,
            initial,
            self.accept.clone(),
            table,
            alphabet,
            self.state_names(),
        ))
    }
}
