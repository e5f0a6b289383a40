//! Terminal presentation: the log line formatter and colored result trees.

pub mod logging;
pub mod print;
