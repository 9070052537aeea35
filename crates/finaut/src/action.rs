//! DFAs that fire side effects as they step
//!
//! A [`MealyAutomaton`] triggers actions on transitions, keyed by the state a
//! transition enters together with the symbol read.  A [`MooreAutomaton`]
//! triggers actions on the state entered alone.  Actions never influence
//! which state is reached.

mod mealy;
mod moore;

pub use mealy::{MealyAction, MealyAutomaton, MealyBuilder};
pub use moore::{MooreAction, MooreAutomaton, MooreBuilder};
