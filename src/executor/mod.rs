//! The executor turns discovered cases into execution units, drives them to
//! completion, and collects results.

pub mod results;
mod context;
mod iter;
mod unit;

pub use context::Context;
pub use iter::Units;
pub use unit::{Phase, Unit};
