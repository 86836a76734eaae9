//! Focusplay Core - Shared functionality for the Focusplay tools
//!
//! A focus timer with forced short and long breaks, and a rest mode whose
//! time is deducted from the focus credit.

pub mod format;
pub mod paths;

pub use paths::Paths;
