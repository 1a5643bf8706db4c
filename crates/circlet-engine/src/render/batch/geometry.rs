//! Shared unit-circle geometry.
//!
//! One ring of `segments + 1` vertices is built per batch and reused by every
//! instance. The last vertex repeats the first so the ring closes when read as
//! a triangle fan.

use bytemuck::{Pod, Zeroable};

use crate::render::backend::{StepMode, VertexAttribute, VertexBufferLayout, VertexFormat};

use super::error::BatchError;

/// Smallest segment count that forms a closed polygon (a triangle).
pub const MIN_SEGMENTS: u32 = 3;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct RingVertex {
    pub pos: [f32; 2], // on the unit circle
}

impl RingVertex {
    const ATTRS: [VertexAttribute; 1] = [VertexAttribute {
        location: 0,
        format: VertexFormat::Float32x2,
        offset: 0,
    }];

    pub const fn layout() -> VertexBufferLayout {
        VertexBufferLayout {
            stride: std::mem::size_of::<RingVertex>() as u64,
            step: StepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// Builds the closed unit-circle ring for `segments` segments.
///
/// Vertex `i` sits at angle `2π·i/segments` for `i` in `0..=segments`.
pub fn unit_circle(segments: u32) -> Result<Vec<RingVertex>, BatchError> {
    if segments < MIN_SEGMENTS || segments == u32::MAX {
        return Err(BatchError::InvalidSegments {
            segments,
            min: MIN_SEGMENTS,
        });
    }

    let step = std::f32::consts::TAU / segments as f32;
    let ring = (0..=segments)
        .map(|i| {
            // Close the ring exactly rather than trusting cos/sin at 2π.
            let i = if i == segments { 0 } else { i };
            let angle = step * i as f32;
            RingVertex { pos: [angle.cos(), angle.sin()] }
        })
        .collect();

    Ok(ring)
}

/// Triangle-list indices that reproduce a fan over `vertex_count` ring vertices.
///
/// Triangles pivot on vertex 0: `(0, i, i + 1)` for `i` in `1..vertex_count - 1`.
pub fn fan_indices(vertex_count: u32) -> Vec<u32> {
    if vertex_count < 3 {
        return Vec::new();
    }
    (1..vertex_count - 1).flat_map(|i| [0, i, i + 1]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_has_segments_plus_one_vertices() {
        for s in [3, 4, 17, 100] {
            assert_eq!(unit_circle(s).unwrap().len(), s as usize + 1);
        }
    }

    #[test]
    fn ring_is_closed_and_on_unit_circle() {
        let ring = unit_circle(12).unwrap();
        assert_eq!(ring.first(), ring.last());
        for v in &ring {
            let r = (v.pos[0] * v.pos[0] + v.pos[1] * v.pos[1]).sqrt();
            assert!((r - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn quarter_turns_land_on_axes() {
        let ring = unit_circle(4).unwrap();
        let expect = [[1.0, 0.0], [0.0, 1.0], [-1.0, 0.0], [0.0, -1.0], [1.0, 0.0]];
        for (v, e) in ring.iter().zip(expect) {
            assert!((v.pos[0] - e[0]).abs() < 1e-6 && (v.pos[1] - e[1]).abs() < 1e-6);
        }
    }

    #[test]
    fn fewer_than_three_segments_is_rejected() {
        for s in [0, 1, 2] {
            assert_eq!(
                unit_circle(s),
                Err(BatchError::InvalidSegments { segments: s, min: MIN_SEGMENTS })
            );
        }
    }

    #[test]
    fn fan_indices_cover_every_segment() {
        // 4 segments -> 5 ring vertices -> 3 triangles pivoting on vertex 0.
        assert_eq!(fan_indices(5), vec![0, 1, 2, 0, 2, 3, 0, 3, 4]);
        assert_eq!(fan_indices(101).len(), 3 * 99);
    }

    #[test]
    fn fan_indices_degenerate_input_is_empty() {
        assert!(fan_indices(2).is_empty());
    }
}
