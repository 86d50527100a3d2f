//! Pluggable auth and voting strategies.
//!
//! Strategies are closed enums keyed by their deployed address in a
//! [`StrategyRegistry`]. Looking up an address nobody registered is an
//! ordinary error.

pub mod auth;
pub mod registry;
pub mod voting;

pub use auth::{dispatch, AuthStrategy};
pub use registry::StrategyRegistry;
pub use voting::{StrategyContext, VotingStrategy};
