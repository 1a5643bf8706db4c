//! Random circle field benchmark.
//!
//! Builds one circle batch from a seeded random field and redraws it
//! continuously, reporting frames per second.

mod app;
mod cli;
mod scene;

use anyhow::Result;
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Instant;

use circlet_engine::coords::Vec2;
use circlet_engine::logging::init_logging;
use circlet_engine::window::Runtime;

use crate::app::BenchApp;
use crate::cli::Args;
use crate::scene::{random_circles, Jitter};

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.logging_config());
    args.validate()?;

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let started = Instant::now();
    let circles = random_circles(&args.field(), &mut rng);
    log::info!(
        "generated {} circles in {:.1} ms",
        circles.len(),
        started.elapsed().as_secs_f64() * 1000.0
    );

    let bounds = Vec2::new(args.width as f32, args.height as f32);
    let jitter = Jitter::new(args.update_chunk, app::JITTER_SPEED, bounds);
    let app = BenchApp::new(args.mode, args.segments, circles, jitter, rng);

    Runtime::run(args.runtime_config(), args.gpu_init(), app)
}
