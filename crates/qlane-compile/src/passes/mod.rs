//! Built-in schedule passes.
//!
//! - [`resolution`]: replace barriers by padding or runtime rendezvous
//! - [`verification`]: check the invariants downstream code relies on

pub mod resolution;
pub mod verification;

pub use resolution::{BarrierResolution, FullSynchronization};
pub use verification::{BarrierFreeVerification, LabelVerification, LabelSummary};
