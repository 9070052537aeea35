//! Boolean combinations of DFAs by the product construction

use std::{fmt, ops::Deref, str::FromStr};

use indexmap::IndexMap;

use crate::{
    automaton::{FiniteAutomaton, delegate_automaton},
    builder::{BuildError, DfaBuilder},
    dfa::Dfa,
    prelude::*,
};

/// Acceptance policy of a product state, given which components are final
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Comparator {
    /// Every component is final
    #[default]
    And,
    /// At least one component is final
    Or,
    /// Some but not all components are final
    Xor,
    /// Either all or none of the components are final
    Xand,
    /// No component is final
    Not,
}

/// A string that names no [`Comparator`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown comparator {0:?}")]
pub struct ParseComparatorError(String);

impl Comparator {
    /// Every comparator, in declaration order
    pub const ALL: [Self; 5] = [Self::And, Self::Or, Self::Xor, Self::Xand, Self::Not];

    /// Decide acceptance from the per-component final flags
    #[must_use]
    pub fn apply(self, finals: &[bool]) -> bool {
        let any = finals.iter().any(|&f| f);
        let all = finals.iter().all(|&f| f);

        match self {
            Self::And => all,
            Self::Or => any,
            Self::Xor => any && !all,
            Self::Xand => all || !any,
            Self::Not => !any,
        }
    }

    /// The upper-case name, as parsed by [`FromStr`]
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
            Self::Xor => "XOR",
            Self::Xand => "XAND",
            Self::Not => "NOT",
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name()) }
}

impl FromStr for Comparator {
    type Err = ParseComparatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseComparatorError(s.into()))
    }
}

/// Collects the components of a [`ProductAutomaton`]
#[derive(Debug, Clone, Default)]
pub struct ProductBuilder {
    automata: Vec<Dfa>,
    comparator: Comparator,
}

impl ProductBuilder {
    /// A builder with no components and [`Comparator::And`]
    #[inline]
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Builder-style [`set_comparator`](Self::set_comparator)
    #[inline]
    #[must_use]
    pub fn with_comparator(mut self, comparator: Comparator) -> Self {
        self.comparator = comparator;
        self
    }

    /// Decide finality of product states with `comparator`
    #[inline]
    pub fn set_comparator(&mut self, comparator: Comparator) { self.comparator = comparator; }

    /// Append a component; its index is the number of components added
    /// before it
    #[inline]
    pub fn add_automaton(&mut self, dfa: Dfa) { self.automata.push(dfa); }

    /// The number of components
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize { self.automata.len() }

    /// Check whether no component was added
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool { self.automata.is_empty() }

    /// Explore the reachable part of the product
    ///
    /// Every product state reads every symbol of the combined alphabet.  A
    /// component without a transition for a symbol drops out for the rest of
    /// the word and counts as non-final.
    ///
    /// # Errors
    /// Returns [`BuildError::CapacityExceeded`] if the product does not fit.
    pub fn build(&self) -> Result<ProductAutomaton, BuildError> {
        let alphabet: BTreeSet<Symbol> = self
            .automata
            .iter()
            .flat_map(|a| a.alphabet().iter().copied())
            .collect();

        let mut builder = DfaBuilder::new();
        builder.declare_all(alphabet.iter().copied());

        let mut tuples: IndexMap<Vec<Option<State>>, State> = IndexMap::new();
        let mut accepting = BTreeMap::new();
        let start = self
            .automata
            .iter()
            .map(|a| Some(a.initial_state()))
            .collect();
        self.intern(&mut tuples, &mut accepting, &mut builder, start)?;

        let mut cursor = 0;
        while let Some((tuple, &from)) = tuples.get_index(cursor) {
            let tuple = tuple.clone();
            cursor += 1;

            for &symbol in &alphabet {
                let next = tuple
                    .iter()
                    .zip(&self.automata)
                    .map(|(s, a)| s.and_then(|s| a.try_step(s, symbol)))
                    .collect();
                let to = self.intern(&mut tuples, &mut accepting, &mut builder, next)?;
                builder.link(from, symbol, to)?;
            }
        }

        debug!(
            components = self.automata.len(),
            states = tuples.len(),
            comparator = %self.comparator,
            "Built product automaton"
        );

        Ok(ProductAutomaton {
            dfa: builder.build()?,
            comparator: self.comparator,
            accepting,
        })
    }

    fn intern(
        &self,
        tuples: &mut IndexMap<Vec<Option<State>>, State>,
        accepting: &mut BTreeMap<State, BTreeSet<usize>>,
        builder: &mut DfaBuilder,
        tuple: Vec<Option<State>>,
    ) -> Result<State, BuildError> {
        if let Some(&state) = tuples.get(&tuple) {
            return Ok(state);
        }

        let state = if tuples.is_empty() {
            builder.add_initial_state()?
        } else {
            builder.add_state()?
        };

        let finals: Vec<bool> = tuple
            .iter()
            .zip(&self.automata)
            .map(|(s, a)| s.is_some_and(|s| a.is_final(s)))
            .collect();

        if self.comparator.apply(&finals) {
            builder.make_final(state)?;
        }

        accepting.insert(
            state,
            finals
                .iter()
                .enumerate()
                .filter_map(|(i, &f)| f.then_some(i))
                .collect(),
        );

        tuples.insert(tuple, state);
        Ok(state)
    }
}

/// The accessible part of the cross product of several DFAs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductAutomaton {
    dfa: Dfa,
    comparator: Comparator,
    accepting: BTreeMap<State, BTreeSet<usize>>,
}

delegate_automaton!(ProductAutomaton => dfa);

impl Deref for ProductAutomaton {
    type Target = Dfa;

    #[inline]
    fn deref(&self) -> &Dfa { &self.dfa }
}

impl From<ProductAutomaton> for Dfa {
    #[inline]
    fn from(product: ProductAutomaton) -> Self { product.dfa }
}

impl ProductAutomaton {
    /// Combine `automata` under `comparator`
    ///
    /// # Errors
    /// See [`ProductBuilder::build`].
    pub fn new(
        automata: impl IntoIterator<Item = Dfa>,
        comparator: Comparator,
    ) -> Result<Self, BuildError> {
        let mut builder = ProductBuilder::new().with_comparator(comparator);
        automata
            .into_iter()
            .for_each(|a| builder.add_automaton(a));
        builder.build()
    }

    /// The comparator the product was built with
    #[inline]
    #[must_use]
    pub fn comparator(&self) -> Comparator { self.comparator }

    /// Indices of the components that are final in `state`, in ascending
    /// order
    pub fn accepting_components(&self, state: State) -> impl Iterator<Item = usize> + '_ {
        self.accepting.get(&state).into_iter().flatten().copied()
    }
}
