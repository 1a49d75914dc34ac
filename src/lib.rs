//! Workspace umbrella crate.
//!
//! With the `desktop-shims` feature (on by default) this re-exports
//! `core-service` built against the desktop bridge defaults, so a host
//! plugin can depend on `refsync-workspace` alone.

#[cfg(feature = "desktop-shims")]
pub use core_service;
