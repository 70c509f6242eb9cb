//! Core types, capabilities, and validation for visit analytics.

pub mod device;
pub mod environment;
pub mod error;
pub mod events;
pub mod identity;
pub mod limits;
pub mod range;
pub mod store;
pub mod visit;

pub use device::*;
pub use environment::*;
pub use error::{DbErrorCode, Error, Result, ValidationErrorCode};
pub use events::*;
pub use identity::*;
pub use range::*;
pub use store::*;
pub use visit::*;
