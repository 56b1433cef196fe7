//! ptf - protocol test framework adapter dispatch
//!
//! Re-exports [`ptf_core`] under a single name.
pub use ptf_core::*;
