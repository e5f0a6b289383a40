//! # Domain Models
//!
//! Value types shared by every stage of a probing run. All of them are immutable
//! once built; the engine hands them around by reference or by clone.

pub mod credential;
pub mod endpoint;
pub mod output;
pub mod result;
pub mod state;
