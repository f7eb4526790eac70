//! Kalycs: a background organizer for the Downloads folder.
//!
//! The library surface is the lifecycle façade ([`App`]) plus the per-OS
//! directory resolution; the `kalycsd` binary wires them to the watcher.

pub mod app;
pub mod dirs;

pub use app::App;
