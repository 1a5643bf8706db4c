use anyhow::{ensure, Result};
use clap::{Parser, ValueEnum};
use winit::dpi::PhysicalSize;

use circlet_engine::device::GpuInit;
use circlet_engine::logging::LoggingConfig;
use circlet_engine::render::batch::MIN_SEGMENTS;
use circlet_engine::window::RuntimeConfig;

use crate::scene::FieldConfig;

/// Which batch flavor to benchmark.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Upload once, draw every frame.
    Static,
    /// Mutable batch with a host mirror, never updated.
    Mutable,
    /// Mutable batch, a chunk of circles jittered every frame.
    Animate,
    /// Same field drawn with one draw call per circle, as a baseline.
    Naive,
}

/// Draws a field of random circles with one instanced draw call per frame.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
pub struct Args {
    /// Number of circles in the batch
    #[arg(short = 'n', long, default_value_t = 300_000)]
    pub circles: usize,

    /// Segments per circle outline
    #[arg(short, long, default_value_t = 100)]
    pub segments: u32,

    /// Smallest radius in whole pixels
    #[arg(long, default_value_t = 1)]
    pub min_radius: u32,

    /// Largest radius in whole pixels
    #[arg(long, default_value_t = 5)]
    pub max_radius: u32,

    /// Window width in physical pixels
    #[arg(short, long, default_value_t = 1920)]
    pub width: u32,

    /// Window height in physical pixels
    #[arg(long, default_value_t = 1080)]
    pub height: u32,

    #[arg(short, long, value_enum, default_value_t = Mode::Static)]
    pub mode: Mode,

    /// Circles rewritten per frame in animate mode
    #[arg(long, default_value_t = 10_000)]
    pub update_chunk: usize,

    /// Seed for the circle field; random when omitted
    #[arg(long)]
    pub seed: Option<u64>,

    /// Wait for vertical sync when presenting
    #[arg(long)]
    pub vsync: bool,

    /// Log filter in env_logger syntax (overrides RUST_LOG)
    #[arg(long)]
    pub log: Option<String>,
}

impl Args {
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.segments >= MIN_SEGMENTS,
            "--segments must be at least {MIN_SEGMENTS}, got {}",
            self.segments
        );
        ensure!(
            self.min_radius > 0 && self.min_radius <= self.max_radius,
            "radius range [{}, {}] is empty or non-positive",
            self.min_radius,
            self.max_radius
        );
        ensure!(self.width > 0 && self.height > 0, "window size must be non-zero");
        Ok(())
    }

    pub fn field(&self) -> FieldConfig {
        FieldConfig {
            count: self.circles,
            width: self.width,
            height: self.height,
            min_radius: self.min_radius,
            max_radius: self.max_radius,
        }
    }

    pub fn logging_config(&self) -> LoggingConfig {
        LoggingConfig {
            env_filter: self.log.clone(),
            ..Default::default()
        }
    }

    pub fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            title: title(self.mode, self.circles),
            initial_size: PhysicalSize::new(self.width, self.height),
            resizable: true,
        }
    }

    pub fn gpu_init(&self) -> GpuInit {
        GpuInit::with_vsync(self.vsync)
    }
}

pub fn title(mode: Mode, circles: usize) -> String {
    let mode = match mode {
        Mode::Static => "static",
        Mode::Mutable => "mutable",
        Mode::Animate => "animate",
        Mode::Naive => "naive",
    };
    format!("circlet: {circles} circles ({mode})")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_reference_benchmark() {
        let args = Args::parse_from(["circlet-bench"]);
        assert_eq!(args.circles, 300_000);
        assert_eq!(args.segments, 100);
        assert_eq!((args.min_radius, args.max_radius), (1, 5));
        assert_eq!((args.width, args.height), (1920, 1080));
        assert_eq!(args.mode, Mode::Static);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn parses_mode_and_seed() {
        let args = Args::parse_from(["circlet-bench", "--mode", "animate", "--seed", "7", "-n", "10"]);
        assert_eq!(args.mode, Mode::Animate);
        assert_eq!(args.seed, Some(7));
        assert_eq!(args.field().count, 10);

        let args = Args::parse_from(["circlet-bench", "-m", "naive"]);
        assert_eq!(args.mode, Mode::Naive);
        assert_eq!(args.runtime_config().title, "circlet: 300000 circles (naive)");
    }

    #[test]
    fn rejects_bad_ranges() {
        let args = Args::parse_from(["circlet-bench", "--segments", "2"]);
        assert!(args.validate().is_err());

        let args = Args::parse_from(["circlet-bench", "--min-radius", "6"]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn vsync_selects_fifo() {
        let args = Args::parse_from(["circlet-bench", "--vsync"]);
        assert_eq!(args.gpu_init().present_mode, wgpu::PresentMode::Fifo);
        let args = Args::parse_from(["circlet-bench"]);
        assert_eq!(args.gpu_init().present_mode, wgpu::PresentMode::AutoNoVsync);
    }
}
