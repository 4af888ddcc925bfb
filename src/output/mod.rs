// src/output/mod.rs
//! Output handling: rendering results, then delivering them.
//!
//! Rendering is pure ([`render`]); [`deliver`] is the only code here that
//! touches the filesystem or stdout.

mod render;
mod writer;

pub use render::{render_batch, render_health, render_result, ConfigResponse};
pub use writer::{deliver, DeliveryTarget};
