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

/// Called with the entered state and the symbol read
pub type MealyAction = Rc<dyn Fn(State, Symbol)>;

/// A [`DfaBuilder`] that also records transition actions
#[derive(Default)]
pub struct MealyBuilder {
    dfa: DfaBuilder,
    outputs: BTreeMap<(State, Symbol), MealyAction>,
}

impl fmt::Debug for MealyBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MealyBuilder")
            .field("dfa", &self.dfa)
            .field("outputs", &self.outputs.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Deref for MealyBuilder {
    type Target = DfaBuilder;

    #[inline]
    fn deref(&self) -> &DfaBuilder { &self.dfa }
}

impl DerefMut for MealyBuilder {
    #[inline]
    fn deref_mut(&mut self) -> &mut DfaBuilder { &mut self.dfa }
}

impl MealyBuilder {
    /// An empty builder with no outputs
    #[inline]
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Fire `action` whenever reading `symbol` enters `state`, returning the
    /// action it replaces
    pub fn set_output(
        &mut self,
        state: State,
        symbol: Symbol,
        action: impl Fn(State, Symbol) + 'static,
    ) -> Option<MealyAction> {
        self.outputs.insert((state, symbol), Rc::new(action))
    }

    /// # Errors
    /// See [`DfaBuilder::build`].
    pub fn build(&self) -> Result<MealyAutomaton, BuildError> {
        Ok(MealyAutomaton {
            dfa: self.dfa.build()?,
            outputs: self.outputs.clone(),
        })
    }
}

/// A DFA with actions on its transitions
#[derive(Clone)]
pub struct MealyAutomaton {
    dfa: Dfa,
    outputs: BTreeMap<(State, Symbol), MealyAction>,
}

delegate_automaton!(MealyAutomaton => dfa, run = fire);

impl fmt::Debug for MealyAutomaton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MealyAutomaton")
            .field("dfa", &self.dfa)
            .field("outputs", &self.outputs.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Deref for MealyAutomaton {
    type Target = Dfa;

    #[inline]
    fn deref(&self) -> &Dfa { &self.dfa }
}

impl MealyAutomaton {
    /// Follow the transition for `symbol`, then fire the action for the
    /// entered state and `symbol`
    ///
    /// # Errors
    /// Returns [`MissingTransition`] if the transition is not defined.
    pub fn step(&self, state: State, symbol: Symbol) -> Result<State, MissingTransition> {
        let to = self.dfa.step(state, symbol)?;
        if let Some(action) = self.outputs.get(&(to, symbol)) {
            trace!(state = to, symbol, "Firing transition action");
            action(to, symbol);
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

#[cfg(test)]
mod test {
    use std::{cell::RefCell, rc::Rc};

    use super::{MealyAutomaton, MealyBuilder};
    use crate::{FiniteAutomaton, Symbol};

    const A: Symbol = 0;
    const B: Symbol = 1;
    const C: Symbol = 2;
    const D: Symbol = 3;
    const E: Symbol = 4;

    fn automaton(log: &Rc<RefCell<Vec<Symbol>>>) -> MealyAutomaton {
        let mut b = MealyBuilder::new();
        let s0 = b.add_initial_state().unwrap();
        let s1 = b.add_state().unwrap();
        let s2 = b.add_state().unwrap();
        let s3 = b.add_final_state().unwrap();
        let s4 = b.add_final_state().unwrap();
        b.add_transition(s0, A, s1).unwrap();
        b.add_transition(s1, B, s2).unwrap();
        b.add_transition(s2, C, s3).unwrap();
        b.add_transition(s3, D, s0).unwrap();
        b.add_transition(s0, E, s4).unwrap();

        for (state, symbol) in [(s1, A), (s0, D), (s4, E)] {
            let log = Rc::clone(log);
            b.set_output(state, symbol, move |_, sym| log.borrow_mut().push(sym));
        }
        b.build().unwrap()
    }

    #[test]
    fn step_fires_on_entered_state() {
        let log = Rc::new(RefCell::new(vec![]));
        let m = automaton(&log);

        m.step(0, A).unwrap();
        assert_eq!(*log.borrow(), [A]);
        m.step(3, D).unwrap();
        assert_eq!(*log.borrow(), [A, D]);
        m.step(1, B).unwrap();
        assert_eq!(*log.borrow(), [A, D]);
        m.step(0, E).unwrap();
        assert_eq!(*log.borrow(), [A, D, E]);
    }

    #[test]
    fn run_fires_along_the_path() {
        let log = Rc::new(RefCell::new(vec![]));
        let m = automaton(&log);

        assert_eq!(m.run([A, B, C, D, E]), Ok(true));
        assert_eq!(*log.borrow(), [A, D, E]);
        assert_eq!(m.run([A, B]), Ok(false));
        assert_eq!(*log.borrow(), [A, D, E, A]);
    }

    #[test]
    fn set_output_replaces() {
        let mut b = MealyBuilder::new();
        let s0 = b.add_initial_state().unwrap();
        assert!(b.set_output(s0, A, |_, _| ()).is_none());
        assert!(b.set_output(s0, A, |_, _| ()).is_some());
    }
}
