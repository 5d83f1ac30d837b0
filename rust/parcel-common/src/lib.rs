//! Error type, result alias and validation macros shared by the parcel crates.

pub mod error;
pub mod macros;
pub mod result;

pub use result::Result;
