//! GPU device + surface management.
//!
//! This module is responsible for:
//! - creating the wgpu device and queue for the benchmark window
//! - configuring the swapchain from [`GpuInit`] and following resizes
//! - acquiring, submitting and presenting frames

mod context;
mod init;
mod surface;

pub use context::{Gpu, GpuFrame, SurfaceErrorAction};
pub use init::GpuInit;
