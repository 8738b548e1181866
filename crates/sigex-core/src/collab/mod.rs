//! Collaboration records and the mediator that persists them

mod mediator;
mod record;

pub use mediator::{ApplyOutcome, CollabMediator};
pub use record::CollabConfig;
