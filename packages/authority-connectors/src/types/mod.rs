//! Data types shared by all connectors.

pub mod config;
pub mod manifest;
pub mod record;
