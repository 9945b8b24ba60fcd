//! Trading-day conventions: the New York offset cache and the 17:00 NY
//! rollover rule.

pub mod effective;
pub mod offset_cache;

pub use effective::*;
pub use offset_cache::*;
