//! Common types, errors and channels shared across the crate

pub mod channels;
pub mod errors;
pub mod types;
