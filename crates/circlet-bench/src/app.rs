use anyhow::Context;
use rand::rngs::StdRng;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::keyboard::{Key, NamedKey};
use winit::window::WindowId;

use circlet_engine::coords::Vec2;
use circlet_engine::core::{App, AppControl, FrameCtx};
use circlet_engine::paint::Rgba8;
use circlet_engine::render::batch::{Circle, CircleBatch, Drawable, StaticCircleBatch};
use circlet_engine::render::RenderCtx;
use circlet_engine::time::FpsCounter;

use crate::cli::{self, Mode};
use crate::scene::Jitter;

const CLEAR: Rgba8 = Rgba8::black();

// Largest nudge per axis in animate mode, in pixels per second.
pub const JITTER_SPEED: f32 = 90.0;

enum Batch {
    Static(StaticCircleBatch<RenderCtx>),
    Mutable(CircleBatch<RenderCtx>),
}

impl Batch {
    fn drawable(&self) -> &dyn Drawable<RenderCtx> {
        match self {
            Batch::Static(b) => b,
            Batch::Mutable(b) => b,
        }
    }
}

/// GPU state created on the first frame, once a device exists.
struct Loaded {
    rctx: RenderCtx,
    batch: Batch,
}

pub struct BenchApp {
    mode: Mode,
    segments: u32,
    count: usize,

    // Consumed when the batch is built.
    pending: Vec<Circle>,
    loaded: Option<Loaded>,

    jitter: Jitter,
    rng: StdRng,
    fps: FpsCounter,
}

impl BenchApp {
    pub fn new(
        mode: Mode,
        segments: u32,
        circles: Vec<Circle>,
        jitter: Jitter,
        rng: StdRng,
    ) -> Self {
        Self {
            mode,
            segments,
            count: circles.len(),
            pending: circles,
            loaded: None,
            jitter,
            rng,
            fps: FpsCounter::new(),
        }
    }

    fn load(&mut self, rctx: RenderCtx) -> anyhow::Result<Loaded> {
        let circles = std::mem::take(&mut self.pending);
        let batch = match self.mode {
            Mode::Static | Mode::Naive => Batch::Static(
                StaticCircleBatch::new(&rctx, &circles, self.segments)
                    .context("failed to create static circle batch")?,
            ),
            Mode::Mutable | Mode::Animate => Batch::Mutable(
                CircleBatch::new(&rctx, &circles, self.segments)
                    .context("failed to create circle batch")?,
            ),
        };
        log::info!(
            "batch ready: {} circles, {} segments, {:?} mode",
            self.count,
            self.segments,
            self.mode
        );
        Ok(Loaded { rctx, batch })
    }
}

impl App for BenchApp {
    fn on_window_event(&mut self, _window_id: WindowId, event: &WindowEvent) -> AppControl {
        match event {
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key: Key::Named(NamedKey::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => AppControl::Exit,
            WindowEvent::Resized(size) => {
                self.jitter
                    .set_bounds(Vec2::new(size.width as f32, size.height as f32));
                AppControl::Continue
            }
            _ => AppControl::Continue,
        }
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if self.loaded.is_none() {
            match self.load(ctx.render_ctx()) {
                Ok(loaded) => self.loaded = Some(loaded),
                Err(e) => {
                    ctx.runtime.fail(e);
                    return AppControl::Exit;
                }
            }
        }
        let Some(loaded) = self.loaded.as_mut() else {
            return AppControl::Exit;
        };

        if self.mode == Mode::Animate {
            if let Batch::Mutable(batch) = &mut loaded.batch {
                if let Err(e) = self.jitter.advance(&loaded.rctx, batch, &mut self.rng, ctx.time.dt) {
                    ctx.runtime.fail(e.into());
                    return AppControl::Exit;
                }
            }
        }

        let batch = &loaded.batch;
        let naive = self.mode == Mode::Naive;
        let control = ctx.render(CLEAR, |rctx, target| match batch {
            Batch::Static(b) if naive => b.draw_each(rctx, target),
            other => other.drawable().draw(rctx, target),
        });

        if let Some(fps) = self.fps.frame(ctx.time.now) {
            log::info!(
                "{fps:.1} fps ({} circles, frame {})",
                self.count,
                ctx.time.frame_index
            );
            ctx.window
                .set_title(&format!("{} - {fps:.0} fps", cli::title(self.mode, self.count)));
        }

        control
    }
}
