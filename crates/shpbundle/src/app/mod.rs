//! Application layer orchestrating grouping, bundling, and document IO.

pub mod bundle;
pub mod group;
pub mod io;
