//! Type system utilities and aliases.
//!
//! ## Modules
//!
//! - [`aliases`]: Type aliases for handler closures, listener lists and locked maps.

pub mod aliases;

pub use aliases::*;
