use crate::render::backend::Mat4;

/// Orthographic pixel -> NDC mapping for a `width` x `height` target.
///
/// `scale = 2 / size`, offset `(-1, -1)`: pixel `(0, 0)` lands on NDC
/// `(-1, -1)` and `(width, height)` on `(1, 1)`. Column-major. Zero
/// dimensions are treated as 1.
pub fn pixel_to_ndc(width: u32, height: u32) -> Mat4 {
    let sx = 2.0 / width.max(1) as f32;
    let sy = 2.0 / height.max(1) as f32;
    [
        [sx, 0.0, 0.0, 0.0],
        [0.0, sy, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [-1.0, -1.0, 0.0, 1.0],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(m: &Mat4, x: f32, y: f32) -> (f32, f32) {
        let v = [x, y, 0.0, 1.0];
        let mut out = [0.0f32; 4];
        for (col, comp) in m.iter().zip(v) {
            for row in 0..4 {
                out[row] += col[row] * comp;
            }
        }
        (out[0] / out[3], out[1] / out[3])
    }

    fn close(a: (f32, f32), b: (f32, f32)) -> bool {
        (a.0 - b.0).abs() < 1e-6 && (a.1 - b.1).abs() < 1e-6
    }

    #[test]
    fn corners_map_to_ndc_extents() {
        let m = pixel_to_ndc(1920, 1080);
        assert!(close(apply(&m, 0.0, 0.0), (-1.0, -1.0)));
        assert!(close(apply(&m, 1920.0, 1080.0), (1.0, 1.0)));
        assert!(close(apply(&m, 960.0, 540.0), (0.0, 0.0)));
    }

    #[test]
    fn zero_size_does_not_divide_by_zero() {
        let m = pixel_to_ndc(0, 0);
        assert!(m.iter().flatten().all(|v| v.is_finite()));
        assert_eq!(m[0][0], 2.0);
    }
}
