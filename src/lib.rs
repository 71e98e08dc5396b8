//! Workspace placeholder crate.
//!
//! This crate exists to expose shared feature flags that map to the individual
//! workspace crates (`bridge-traits`, `core-player`). Host applications can
//! depend on `svp-workspace` and enable the documented features (e.g.
//! `http-streaming`) without needing to wire each crate individually.

pub use bridge_traits;
pub use core_player;
