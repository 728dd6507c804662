//! sf-core: stable foundation for sweepflow.
//!
//! Contains:
//! - units (uom SI types + the user-unit conversion contract)
//! - numeric (Real + tolerances + float helpers)
//! - error (shared error types)

pub mod error;
pub mod numeric;
pub mod units;

pub use error::{CoreError, CoreResult};
pub use numeric::*;
pub use units::*;
