//! Internal implementation details.

pub(crate) mod circular;
pub(crate) mod dispose_bag;

pub(crate) use circular::{ChainId, Entered, InFlight};
pub(crate) use dispose_bag::{run_reverse, DisposalEntry, DisposeBag};
pub use dispose_bag::{DisposalFailure, ShutdownReport};
