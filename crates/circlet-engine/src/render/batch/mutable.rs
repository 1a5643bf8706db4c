use crate::render::backend::{BufferKind, GraphicsContext};

use super::drawable::Drawable;
use super::error::BatchError;
use super::instance::{self, Circle};
use super::resources::BatchResources;
use super::shader::ShaderSources;

/// A fixed-size batch of circles that can be read and updated in place.
///
/// Circles live in two places: a host mirror (authoritative for reads) and a
/// GPU instance buffer (what gets drawn). Every successful update writes the
/// GPU buffer first and then the mirror, so both hold the same bytes for every
/// index the update touched.
///
/// Updating `k` contiguous circles through [`set_range`](Self::set_range)
/// costs one GPU transfer; [`set`](Self::set) costs one transfer per call.
pub struct CircleBatch<C: GraphicsContext> {
    circles: Vec<Circle>,
    gpu: BatchResources<C>,
}

impl<C: GraphicsContext> CircleBatch<C> {
    /// Creates a batch drawing `circles` with `segments` segments per circle.
    pub fn new(ctx: &C, circles: &[Circle], segments: u32) -> Result<Self, BatchError> {
        Self::with_shaders(ctx, circles, segments, &ShaderSources::circle())
    }

    /// Like [`new`](Self::new) with caller-supplied shader sources.
    pub fn with_shaders(
        ctx: &C,
        circles: &[Circle],
        segments: u32,
        sources: &ShaderSources,
    ) -> Result<Self, BatchError> {
        let gpu = BatchResources::new(ctx, circles, segments, sources, BufferKind::DynamicVertex)?;
        log::debug!("circle batch created: {} circles, {} segments", circles.len(), segments);
        Ok(Self {
            circles: circles.to_vec(),
            gpu,
        })
    }

    /// Number of circles. Fixed for the batch's lifetime.
    #[inline]
    pub fn count(&self) -> usize {
        self.circles.len()
    }

    #[inline]
    pub fn segments(&self) -> u32 {
        self.gpu.segments()
    }

    /// Vertices in the shared ring (`segments + 1`).
    #[inline]
    pub fn vertex_count(&self) -> u32 {
        self.gpu.vertex_count()
    }

    /// All circles, read from the host mirror.
    #[inline]
    pub fn circles(&self) -> &[Circle] {
        &self.circles
    }

    /// Returns circle `index` from the host mirror. Never reads back from the GPU.
    pub fn get(&self, index: usize) -> Result<Circle, BatchError> {
        self.circles
            .get(index)
            .copied()
            .ok_or(BatchError::IndexOutOfRange {
                start: index,
                len: 1,
                count: self.count(),
            })
    }

    /// Replaces circle `index`. Same as `set_range(ctx, index, &[circle])`.
    pub fn set(&mut self, ctx: &C, index: usize, circle: Circle) -> Result<(), BatchError> {
        self.set_range(ctx, index, std::slice::from_ref(&circle))
    }

    /// Replaces circles `[start, start + circles.len())` with one GPU write.
    ///
    /// A range that does not fit leaves both the mirror and the GPU buffer
    /// untouched. An empty slice is a no-op.
    pub fn set_range(&mut self, ctx: &C, start: usize, circles: &[Circle]) -> Result<(), BatchError> {
        let end = start
            .checked_add(circles.len())
            .filter(|&end| end <= self.count())
            .ok_or(BatchError::IndexOutOfRange {
                start,
                len: circles.len(),
                count: self.count(),
            })?;

        if circles.is_empty() {
            return Ok(());
        }

        let packed = instance::pack(circles);
        self.gpu.write_instances(ctx, start, &packed);
        self.circles[start..end].copy_from_slice(circles);

        log::trace!("circle batch: updated [{start}, {end})");
        Ok(())
    }
}

impl<C: GraphicsContext> Drawable<C> for CircleBatch<C> {
    fn draw(&self, ctx: &C, target: &mut C::Target<'_>) {
        self.gpu.draw(ctx, target);
    }
}
