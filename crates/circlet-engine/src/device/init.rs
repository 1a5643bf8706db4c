/// How the benchmark asks for a device and a swapchain.
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// `Fifo` caps the frame rate at the display refresh; `AutoNoVsync`
    /// (`Immediate` or `Mailbox` where available) lets it run unthrottled,
    /// which is what throughput measurements want.
    pub present_mode: wgpu::PresentMode,

    /// Adapter choice on machines with more than one GPU.
    pub power_preference: wgpu::PowerPreference,

    /// Pick an sRGB swapchain format when the surface offers one. Instance
    /// colors are then blended in linear space and encoded on store.
    pub prefer_srgb: bool,

    /// Frames the CPU may queue ahead of the GPU. Lower values measure
    /// latency more honestly; higher ones smooth throughput.
    pub desired_maximum_frame_latency: u32,
}

impl GpuInit {
    /// Default setup, synchronized to the display or not.
    pub fn with_vsync(vsync: bool) -> Self {
        Self {
            present_mode: if vsync {
                wgpu::PresentMode::Fifo
            } else {
                wgpu::PresentMode::AutoNoVsync
            },
            ..Self::default()
        }
    }
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            present_mode: wgpu::PresentMode::Fifo,
            power_preference: wgpu::PowerPreference::HighPerformance,
            prefer_srgb: true,
            desired_maximum_frame_latency: 2,
        }
    }
}
