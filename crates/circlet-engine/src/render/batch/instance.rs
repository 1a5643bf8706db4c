use bytemuck::{Pod, Zeroable};

use crate::coords::Vec2;
use crate::paint::Rgba8;
use crate::render::backend::{StepMode, VertexAttribute, VertexBufferLayout, VertexFormat};

/// One circle as supplied by the caller.
///
/// `position` is the center in pixel space. Circles have no identity beyond
/// their index in a batch.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Circle {
    pub position: Vec2,
    pub radius: f32,
    pub color: Rgba8,
}

impl Circle {
    #[inline]
    pub const fn new(position: Vec2, radius: f32, color: Rgba8) -> Self {
        Self { position, radius, color }
    }
}

/// Instance data layout (28 bytes, 7 packed floats):
///
///  offset  0  center  [f32; 2]   loc 1
///  offset  8  radius  f32        loc 2
///  offset 12  color   [f32; 4]   loc 3  (0..1, straight alpha)
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct CircleInstance {
    pub center: [f32; 2],
    pub radius: f32,
    pub color: [f32; 4],
}

/// Floats per instance.
pub const INSTANCE_FLOATS: usize = 7;

/// Bytes per instance.
pub const INSTANCE_STRIDE: usize = std::mem::size_of::<CircleInstance>();

const _: () = assert!(INSTANCE_STRIDE == INSTANCE_FLOATS * std::mem::size_of::<f32>());

impl CircleInstance {
    const ATTRS: [VertexAttribute; 3] = [
        VertexAttribute { location: 1, format: VertexFormat::Float32x2, offset: 0 },
        VertexAttribute { location: 2, format: VertexFormat::Float32, offset: 8 },
        VertexAttribute { location: 3, format: VertexFormat::Float32x4, offset: 12 },
    ];

    pub const fn layout() -> VertexBufferLayout {
        VertexBufferLayout {
            stride: INSTANCE_STRIDE as u64,
            step: StepMode::Instance,
            attributes: &Self::ATTRS,
        }
    }
}

impl From<&Circle> for CircleInstance {
    #[inline]
    fn from(c: &Circle) -> Self {
        Self {
            center: [c.position.x, c.position.y],
            radius: c.radius,
            color: c.color.to_unit(),
        }
    }
}

/// Serializes `circles` into the packed instance layout.
pub fn pack(circles: &[Circle]) -> Vec<CircleInstance> {
    circles.iter().map(CircleInstance::from).collect()
}

/// Byte offset of instance `index` in the instance buffer.
#[inline]
pub const fn byte_offset(index: usize) -> u64 {
    (index * INSTANCE_STRIDE) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stride_is_seven_floats() {
        assert_eq!(INSTANCE_STRIDE, 28);
        assert_eq!(CircleInstance::layout().stride, 28);
    }

    #[test]
    fn attributes_tile_the_stride() {
        let layout = CircleInstance::layout();
        let end = layout
            .attributes
            .iter()
            .map(|a| a.offset + 4 * a.format.components() as u64)
            .max()
            .unwrap();
        assert_eq!(end, layout.stride);
    }

    #[test]
    fn packs_in_field_order_with_unit_color() {
        let c = Circle::new(Vec2::new(10.0, 20.0), 3.5, Rgba8::new(255, 0, 51, 102));
        let floats: Vec<f32> = bytemuck::cast_slice(&pack(&[c])).to_vec();
        assert_eq!(floats, vec![10.0, 20.0, 3.5, 1.0, 0.0, 0.2, 0.4]);
    }

    #[test]
    fn offsets_scale_with_index() {
        assert_eq!(byte_offset(0), 0);
        assert_eq!(byte_offset(3), 84);
    }
}
