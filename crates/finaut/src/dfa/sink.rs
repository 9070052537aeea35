use hashbrown::HashSet;

use super::Dfa;
use crate::{closure::ClosureBuilder, prelude::*};

impl Dfa {
    /// States from which no final state is reachable
    #[must_use]
    pub fn sink_states(&self) -> HashSet<State> {
        let mut preds: BTreeMap<State, Vec<State>> = BTreeMap::new();
        for (&from, row) in &self.table {
            for &to in row.values() {
                preds.entry(to).or_default().push(from);
            }
        }

        let mut closure = ClosureBuilder::default();
        closure.init(self.accept.iter().copied());
        let productive: HashSet<State> = closure.solve(HashSet::new(), |s| {
            preds.get(&s).into_iter().flatten().copied()
        });

        self.states
            .iter()
            .copied()
            .filter(|s| !productive.contains(s))
            .collect()
    }
}

#[cfg(test)]
mod test {
    use hashbrown::HashSet;

    use crate::{DfaBuilder, symbol};

    #[test]
    fn sinks_cannot_reach_final_states() {
        let mut b = DfaBuilder::new();
        let s0 = b.add_initial_state().unwrap();
        let s1 = b.add_final_state().unwrap();
        let s2 = b.add_state().unwrap();
        let s3 = b.add_state().unwrap();
        b.add_transition(s0, symbol('a'), s1).unwrap();
        b.add_transition(s0, symbol('b'), s2).unwrap();
        b.add_transition(s2, symbol('a'), s3).unwrap();
        b.add_transition(s3, symbol('a'), s2).unwrap();
        let dfa = b.build().unwrap();

        // s4 is the completion sink
        assert_eq!(dfa.sink_states(), HashSet::from([s2, s3, 4]));
    }
}
