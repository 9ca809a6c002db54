//! HTTP route handlers

pub mod play;
pub mod status;
