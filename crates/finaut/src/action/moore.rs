use std::{
    fmt,
    ops::{Deref, DerefMut},
    rc::Rc,
};

use crate::{
    automaton::{FiniteAutomaton, delegate_automaton},
    builder::{BuildError, DfaBuilder},
    dfa::{Dfa, MissingTransition},
    prelude::*,
};

/// Called with the entered state
pub type MooreAction = Rc<dyn Fn(State)>;

/// A [`DfaBuilder`] that also records state actions
#[derive(Default)]
pub struct MooreBuilder {
    dfa: DfaBuilder,
    outputs: BTreeMap<State, MooreAction>,
}

impl fmt::Debug for MooreBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MooreBuilder")
            .field("dfa", &self.dfa)
            .field("outputs", &self.outputs.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Deref for MooreBuilder {
    type Target = DfaBuilder;

    #[inline]
    fn deref(&self) -> &DfaBuilder { &self.dfa }
}

impl DerefMut for MooreBuilder {
    #[inline]
    fn deref_mut(&mut self) -> &mut DfaBuilder { &mut self.dfa }
}

impl MooreBuilder {
    /// An empty builder with no outputs
    #[inline]
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Fire `action` whenever a step enters `state`, returning the action it
    /// replaces
    pub fn set_output(
        &mut self,
        state: State,
        action: impl Fn(State) + 'static,
    ) -> Option<MooreAction> {
        self.outputs.insert(state, Rc::new(action))
    }

    /// # Errors
    /// See [`DfaBuilder::build`].
    pub fn build(&self) -> Result<MooreAutomaton, BuildError> {
        Ok(MooreAutomaton {
            dfa: self.dfa.build()?,
            outputs: self.outputs.clone(),
        })
    }
}

/// A DFA with actions on its states
#[derive(Clone)]
pub struct MooreAutomaton {
    dfa: Dfa,
    outputs: BTreeMap<State, MooreAction>,
}

delegate_automaton!(MooreAutomaton => dfa, run = fire);

impl fmt::Debug for MooreAutomaton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MooreAutomaton")
            .field("dfa", &self.dfa)
            .field("outputs", &self.outputs.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Deref for MooreAutomaton {
    type Target = Dfa;

    #[inline]
    fn deref(&self) -> &Dfa { &self.dfa }
}

impl MooreAutomaton {
    /// Follow the transition for `symbol`, then fire the action of the
    /// entered state
    ///
    /// # Errors
    /// Returns [`MissingTransition`] if the transition is not defined.
    pub fn step(&self, state: State, symbol: Symbol) -> Result<State, MissingTransition> {
        let to = self.dfa.step(state, symbol)?;
        if let Some(action) = self.outputs.get(&to) {
            trace!(state = to, "Firing state action");
            action(to);
        }
        Ok(to)
    }

    fn fire<I: IntoIterator<Item = Symbol>>(&self, word: I) -> Result<bool, MissingTransition> {
        let mut state = self.dfa.initial_state();
        for symbol in word {
            state = self.step(state, symbol)?;
        }

        Ok(self.dfa.is_final(state))
    }
}
