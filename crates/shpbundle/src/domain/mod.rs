//! Core domain types shared across the application.

pub mod errors;
pub mod model;
