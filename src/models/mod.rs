pub mod bs;
pub mod delta;
pub mod smile;
pub mod term_structure;
