//! Storage infrastructure: configuration file persistence.
//!
//! The `config` sub-module reads the TOML configuration file from the
//! platform-appropriate directory (or an explicit path), writes it back, and
//! falls back to sensible defaults on first run.
//!
//! Recording files are not stored here: they travel as bytes through the
//! session's save and load controls, and the front-end decides where they go.

pub mod config;
