use std::borrow::BorrowMut;

use indexmap::IndexMap;

use super::Nfa;
use crate::{
    builder::{BuildError, DfaBuilder},
    closure::ClosureBuilder,
    dfa::Dfa,
    prelude::*,
};

/// Subset construction over an epsilon-NFA
///
/// Subsets are numbered in discovery order; the map doubles as the worklist,
/// with every entry past the cursor still waiting to be expanded.  The empty
/// subset becomes an ordinary non-final state when it is reached, which
/// makes the output total over the input alphabet.
pub(super) struct Determinizer<'a> {
    nfa: &'a Nfa,
    closure: ClosureBuilder<State>,
}

impl<'a> Determinizer<'a> {
    pub fn new(nfa: &'a Nfa) -> Self {
        Self {
            nfa,
            closure: ClosureBuilder::default(),
        }
    }

    fn solve_closure<S: BorrowMut<BTreeSet<State>>>(&mut self, set: S) -> S {
        let nfa = self.nfa;
        self.closure.solve(set, |s| nfa.targets(s, EPSILON))
    }

    fn intern(
        &self,
        subsets: &mut IndexMap<BTreeSet<State>, State>,
        builder: &mut DfaBuilder,
        subset: BTreeSet<State>,
    ) -> Result<State, BuildError> {
        if let Some(&state) = subsets.get(&subset) {
            return Ok(state);
        }

        let state = if subsets.is_empty() {
            builder.add_initial_state()?
        } else {
            builder.add_state()?
        };

        if !subset.is_disjoint(&self.nfa.accept) {
            builder.make_final(state)?;
        }

        subsets.insert(subset, state);
        Ok(state)
    }

    pub fn build(mut self) -> Result<Dfa, BuildError> {
        let nfa = self.nfa;
        let mut builder = DfaBuilder::new();
        builder.declare_all(nfa.alphabet.iter().copied());

        let mut subsets = IndexMap::new();
        self.closure.init(nfa.initial.iter().copied());
        let start = self.solve_closure(BTreeSet::new());
        self.intern(&mut subsets, &mut builder, start)?;

        let mut cursor = 0;
        while let Some((subset, &from)) = subsets.get_index(cursor) {
            let subset = subset.clone();
            cursor += 1;

            for &symbol in &nfa.alphabet {
                self.closure
                    .init(subset.iter().flat_map(|&s| nfa.targets(s, symbol)));
                let target = self.solve_closure(BTreeSet::new());
                let to = self.intern(&mut subsets, &mut builder, target)?;
                builder.link(from, symbol, to)?;
            }
        }

        debug!(
            nfa_states = nfa.states.len(),
            dfa_states = subsets.len(),
            "Determinized NFA"
        );

        builder.build()
    }
}
