//! Request and response bodies exposed by the HTTP API.

pub mod common;
pub mod description;
pub mod game;
pub mod health;
pub mod validation;
