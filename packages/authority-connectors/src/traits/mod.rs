//! Core trait abstractions for the connector library.
//!
//! The connector capability set plus the collaborators connectors depend
//! on: HTTP transport and the display surface previews render into.

pub mod connector;
pub mod surface;
pub mod transport;
