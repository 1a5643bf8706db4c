use crate::render::backend::{BufferKind, GraphicsContext};

use super::drawable::Drawable;
use super::error::BatchError;
use super::instance::Circle;
use super::resources::BatchResources;
use super::shader::ShaderSources;

/// Display-only circle batch.
///
/// Circles are uploaded once into a static buffer and no host copy is kept.
/// Use [`CircleBatch`](super::CircleBatch) when circles change after creation.
pub struct StaticCircleBatch<C: GraphicsContext> {
    count: usize,
    gpu: BatchResources<C>,
}

impl<C: GraphicsContext> StaticCircleBatch<C> {
    pub fn new(ctx: &C, circles: &[Circle], segments: u32) -> Result<Self, BatchError> {
        Self::with_shaders(ctx, circles, segments, &ShaderSources::circle())
    }

    pub fn with_shaders(
        ctx: &C,
        circles: &[Circle],
        segments: u32,
        sources: &ShaderSources,
    ) -> Result<Self, BatchError> {
        let gpu = BatchResources::new(ctx, circles, segments, sources, BufferKind::StaticVertex)?;
        log::debug!("static circle batch created: {} circles, {} segments", circles.len(), segments);
        Ok(Self {
            count: circles.len(),
            gpu,
        })
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn segments(&self) -> u32 {
        self.gpu.segments()
    }

    #[inline]
    pub fn vertex_count(&self) -> u32 {
        self.gpu.vertex_count()
    }

    /// Draws with one draw call per circle instead of one for the batch.
    ///
    /// Baseline for comparing against [`Drawable::draw`]; the output is the
    /// same.
    pub fn draw_each(&self, ctx: &C, target: &mut C::Target<'_>) {
        self.gpu.draw_each(ctx, target);
    }
}

impl<C: GraphicsContext> Drawable<C> for StaticCircleBatch<C> {
    fn draw(&self, ctx: &C, target: &mut C::Target<'_>) {
        self.gpu.draw(ctx, target);
    }
}
