//! Instanced circle batches.
//!
//! A batch owns one shared unit-circle ring, one shader program and one
//! instance buffer holding a fixed number of circles. Drawing is a single
//! instanced draw call no matter how many circles the batch holds.
//!
//! - [`CircleBatch`] keeps a host mirror and supports indexed reads/updates.
//! - [`StaticCircleBatch`] uploads once and can only be drawn.
//!
//! Both implement [`Drawable`] for any [`GraphicsContext`](crate::render::GraphicsContext).

mod drawable;
mod error;
pub mod geometry;
mod immutable;
pub mod instance;
mod mutable;
mod resources;
mod shader;
pub mod transform;

pub use drawable::Drawable;
pub use error::BatchError;
pub use geometry::MIN_SEGMENTS;
pub use immutable::StaticCircleBatch;
pub use instance::{Circle, CircleInstance, INSTANCE_FLOATS, INSTANCE_STRIDE};
pub use mutable::CircleBatch;
pub use shader::ShaderSources;
