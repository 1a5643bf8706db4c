use crate::render::backend::{BufferKind, DrawTarget, GraphicsContext, InstancedDraw};

use super::error::BatchError;
use super::geometry::{self, RingVertex};
use super::instance::{self, Circle, CircleInstance};
use super::shader::{self, ShaderSources};
use super::transform::pixel_to_ndc;

/// GPU objects owned by one batch.
///
/// Field order is drop order: the program goes first, the instance buffer last.
pub(crate) struct BatchResources<C: GraphicsContext> {
    program: C::Program,
    vertex_array: C::VertexArray,
    geometry: C::Buffer,
    instances: C::Buffer,
    vertex_count: u32,
    instance_count: u32,
    segments: u32,
}

/// Instance count as drawn; a draw call cannot address more than `u32::MAX`.
pub(crate) fn instance_count(circles: usize) -> Result<u32, BatchError> {
    u32::try_from(circles).map_err(|_| BatchError::TooManyCircles {
        count: circles,
        max: u32::MAX,
    })
}

impl<C: GraphicsContext> BatchResources<C> {
    /// Builds geometry and program, then uploads `circles` in one transfer.
    ///
    /// `kind` selects whether the instance buffer accepts later writes.
    pub(crate) fn new(
        ctx: &C,
        circles: &[Circle],
        segments: u32,
        sources: &ShaderSources,
        kind: BufferKind,
    ) -> Result<Self, BatchError> {
        // Reject bad input before any GPU object exists.
        let ring = geometry::unit_circle(segments)?;
        let vertex_count = ring.len() as u32;
        let instance_count = instance_count(circles.len())?;

        let program =
            shader::build_program(ctx, sources, &[RingVertex::layout(), CircleInstance::layout()])?;

        let geometry =
            ctx.create_buffer("circlet batch ring vbo", BufferKind::StaticVertex, bytemuck::cast_slice(&ring));
        let vertex_array = ctx.create_vertex_array(&geometry, vertex_count);

        let packed = instance::pack(circles);
        let instances =
            ctx.create_buffer("circlet batch instance vbo", kind, bytemuck::cast_slice(&packed));

        Ok(Self {
            program,
            vertex_array,
            geometry,
            instances,
            vertex_count,
            instance_count,
            segments,
        })
    }

    #[inline]
    pub(crate) fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    #[inline]
    pub(crate) fn segments(&self) -> u32 {
        self.segments
    }

    /// Issues one sub-range write covering `packed`, starting at instance `start`.
    ///
    /// Range checks are the caller's job.
    pub(crate) fn write_instances(&self, ctx: &C, start: usize, packed: &[CircleInstance]) {
        ctx.write_buffer(&self.instances, instance::byte_offset(start), bytemuck::cast_slice(packed));
    }

    /// One instanced draw of every circle, then a state reset.
    pub(crate) fn draw(&self, ctx: &C, target: &mut C::Target<'_>) {
        self.draw_instances(ctx, target, 0, self.instance_count);
        target.reset_state();
    }

    /// One single-instance draw per circle, in index order.
    ///
    /// Same pixels as [`draw`](Self::draw) at the cost of `count` draw calls.
    pub(crate) fn draw_each(&self, ctx: &C, target: &mut C::Target<'_>) {
        for i in 0..self.instance_count {
            self.draw_instances(ctx, target, i, 1);
        }
        target.reset_state();
    }

    fn draw_instances(&self, ctx: &C, target: &mut C::Target<'_>, first: u32, count: u32) {
        let (width, height) = target.pixel_size();
        let draw = InstancedDraw {
            program: &self.program,
            vertex_array: &self.vertex_array,
            geometry: &self.geometry,
            instances: &self.instances,
            vertex_count: self.vertex_count,
            first_instance: first,
            instance_count: count,
            transform: pixel_to_ndc(width, height),
        };
        ctx.draw_instanced(target, &draw);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instance_count_fits_a_draw_call() {
        assert_eq!(instance_count(0), Ok(0));
        assert_eq!(instance_count(300_000), Ok(300_000));
        assert_eq!(instance_count(u32::MAX as usize), Ok(u32::MAX));
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn instance_count_past_u32_is_rejected() {
        let too_many = u32::MAX as usize + 1;
        assert_eq!(
            instance_count(too_many),
            Err(BatchError::TooManyCircles { count: too_many, max: u32::MAX })
        );
    }
}
