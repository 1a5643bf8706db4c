//! GPU rendering subsystem.
//!
//! Renderers are written against the [`GraphicsContext`] trait and receive the
//! context explicitly on every GPU-touching call. [`RenderCtx`] is the wgpu
//! implementation; [`recording::RecordingContext`] records calls without a GPU.
//!
//! Convention:
//! - circle positions and radii are in physical pixels of the render target
//! - the vertex shader converts to NDC using a transform uniform

pub mod backend;
pub mod batch;
mod ctx;
pub mod recording;
pub mod wgsl;

pub use backend::{DrawTarget, GraphicsContext, ShaderStage};
pub use ctx::{FanIndices, RenderCtx, RenderTarget, WgpuProgram, WgpuShader};
