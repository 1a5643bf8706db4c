//! Circlet engine crate.
//!
//! Instanced circle batches on wgpu, plus the window/GPU runtime used to put
//! them on screen.

pub mod device;
pub mod window;
pub mod time;
pub mod core;

pub mod logging;
pub mod coords;
pub mod render;
pub mod paint;
