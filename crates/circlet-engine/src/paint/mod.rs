//! Color representation for circle instances and frame clears.
//!
//! Colors are supplied as straight-alpha 8-bit channels and normalized to
//! `0..1` only when packed for the GPU.

mod rgba8;

pub use rgba8::Rgba8;
