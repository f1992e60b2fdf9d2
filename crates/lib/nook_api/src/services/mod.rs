//! Services composing core calls for the handlers.

pub mod auth;
pub mod enrich;
pub mod side_effects;
pub mod validation;
