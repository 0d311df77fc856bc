//! CLI command implementations.

pub mod combine;
pub mod common;
pub mod config;
pub mod fetch;
pub mod inspect;
pub mod order;
pub mod split;
