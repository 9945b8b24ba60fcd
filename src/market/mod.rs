//! Market inputs of a surface: raw quotes, the underlying and rate curves.

pub mod rates;
pub mod types;
pub mod underlying;

pub use rates::*;
pub use types::*;
pub use underlying::*;
