//! Entailment scoring of translated evidence against the translated claim.

pub mod mock;
pub mod traits;

pub use mock::MockEntailmentScorer;
pub use traits::EntailmentScorer;
