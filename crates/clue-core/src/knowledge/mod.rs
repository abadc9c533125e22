//! Client-side knowledge about card ownership, as last reported by the
//! backend.
//!
//! This module is composed of:
//! - `belief`: the per-card `OwnershipBelief` and its state codes.
//! - `store`: the `KnowledgeStore` holding one belief per card, replaced
//!   wholesale by validated update batches.
//! - `view`: text rendering of beliefs through the roster's current names.

mod belief;
mod store;
pub mod view;

pub use belief::{BeliefState, OwnershipBelief};
pub use store::{CardUpdate, KnowledgeError, KnowledgeStore};
pub use view::BeliefView;
