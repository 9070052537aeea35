use std::ops::Deref;

use super::tokenizer::{Scanner, Tokenizer, error_automaton};
use crate::{
    automaton::{FiniteAutomaton, delegate_automaton},
    builder::BuildError,
    dfa::Dfa,
    prelude::*,
    product::{Comparator, ProductBuilder},
};

/// A [`Tokenizer`] whose tokens carry the identifier of the expression they
/// matched
///
/// When a token matches several expressions, the one registered first wins.
#[derive(Debug, Clone)]
pub struct Lexer(Tokenizer);

delegate_automaton!(Lexer => 0);

impl Deref for Lexer {
    type Target = Tokenizer;

    #[inline]
    fn deref(&self) -> &Tokenizer { &self.0 }
}

impl Lexer {
    /// Lazily split `input` into tokens
    #[inline]
    #[must_use]
    pub fn scan<'a>(&'a self, input: &'a str) -> Scanner<'a> { self.0.scan(input) }
}

/// Collects the identified expressions of a [`Lexer`]
#[derive(Debug, Clone, Default)]
pub struct LexerBuilder {
    expressions: Vec<(Dfa, String)>,
}

impl LexerBuilder {
    /// A builder with no expressions
    #[inline]
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Register the minimal DFA of `expr` under `identifier`
    ///
    /// # Errors
    /// Returns [`BuildError::CapacityExceeded`] if minimization runs out of
    /// state ids.
    pub fn add_expression<A: FiniteAutomaton + ?Sized>(
        &mut self,
        expr: &A,
        identifier: impl Into<String>,
    ) -> Result<(), BuildError> {
        self.expressions.push((expr.minimize()?, identifier.into()));
        Ok(())
    }

    /// The number of registered expressions
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize { self.expressions.len() }

    /// Check whether no expression is registered
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool { self.expressions.is_empty() }

    /// Combine the error automaton and every expression under
    /// [`Comparator::Or`]
    ///
    /// # Errors
    /// Returns [`BuildError::CapacityExceeded`] if the product does not fit.
    pub fn build(&self) -> Result<Lexer, BuildError> {
        let mut product = ProductBuilder::new().with_comparator(Comparator::Or);
        product.add_automaton(error_automaton()?);
        for (dfa, _) in &self.expressions {
            product.add_automaton(dfa.clone());
        }
        let product = product.build()?;

        // Component 0 is the error automaton
        let identifiers: BTreeMap<State, String> = product
            .states()
            .iter()
            .filter_map(|&s| {
                let i = product.accepting_components(s).find(|&i| i > 0)?;
                Some((s, self.expressions[i - 1].1.clone()))
            })
            .collect();

        debug!(
            expressions = self.expressions.len(),
            states = product.states().len(),
            identified = identifiers.len(),
            "Built lexer"
        );

        Ok(Lexer(Tokenizer::with_identifiers(product.into(), identifiers)))
    }
}
