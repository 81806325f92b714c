//! Internal utilities.

pub mod strtod;
