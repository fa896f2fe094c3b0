//! HTTP handlers.

pub mod cluster;
pub mod commands;
pub mod health;
pub mod translate;
