//! de-core: stable foundation for diffenergy.
//!
//! Contains:
//! - units (uom SI pressure + dry-air constants)
//! - numeric (Real + tolerances + nearest-value search)
//! - ids (stable pair identifiers)
//! - level (vertical level decoding)
//! - time (timestamps and labels)
//! - error (shared error types)

pub mod error;
pub mod ids;
pub mod level;
pub mod numeric;
pub mod time;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{CoreError, CoreResult};
pub use ids::*;
pub use level::Level;
pub use numeric::*;
pub use time::*;
pub use units::*;
