//! Beadsprite - image to fuse-bead pattern service
//!
//! HTTP API, CLI helpers and rendering around the `bead-pattern` core.
//! This library exposes modules for integration testing.

pub mod api;
pub mod assets;
pub mod error;
pub mod models;
pub mod rendering;
pub mod server;
pub mod services;
