//! Domain models shared across the API and core layers.

pub mod auth;
pub mod content;
pub mod social;
