use rand::Rng;

use circlet_engine::coords::Vec2;
use circlet_engine::paint::Rgba8;
use circlet_engine::render::batch::{BatchError, Circle, CircleBatch};
use circlet_engine::render::GraphicsContext;

/// Bounds and radius range for a random circle field.
#[derive(Debug, Copy, Clone)]
pub struct FieldConfig {
    pub count: usize,
    pub width: u32,
    pub height: u32,
    pub min_radius: u32,
    pub max_radius: u32,
}

/// Generates `count` circles with whole-pixel centers and radii.
///
/// Centers fall in `[0, width] x [0, height]`, edges included, and radii in
/// `[min_radius, max_radius]`.
pub fn random_circles<R: Rng>(cfg: &FieldConfig, rng: &mut R) -> Vec<Circle> {
    (0..cfg.count)
        .map(|_| {
            let position = Vec2::new(
                rng.gen_range(0..=cfg.width) as f32,
                rng.gen_range(0..=cfg.height) as f32,
            );
            let radius = rng.gen_range(cfg.min_radius..=cfg.max_radius) as f32;
            let color = Rgba8::new(
                rng.gen_range(0..255),
                rng.gen_range(0..255),
                rng.gen_range(0..255),
                rng.gen_range(0..255),
            );
            Circle::new(position, radius, color)
        })
        .collect()
}

/// Splits `len` indices starting at `cursor` into at most two contiguous
/// spans of a ring of size `count`.
///
/// The second span is empty unless the range wraps past the end.
pub fn wrapping_spans(cursor: usize, len: usize, count: usize) -> [(usize, usize); 2] {
    if count == 0 {
        return [(0, 0), (0, 0)];
    }
    let cursor = cursor % count;
    let len = len.min(count);
    let head = len.min(count - cursor);
    [(cursor, head), (0, len - head)]
}

/// Walks a batch chunk by chunk, nudging each circle by up to `speed * dt`
/// pixels per axis.
#[derive(Debug, Clone)]
pub struct Jitter {
    cursor: usize,
    chunk: usize,
    speed: f32,
    bounds: Vec2,
    scratch: Vec<Circle>,
}

impl Jitter {
    pub fn new(chunk: usize, speed: f32, bounds: Vec2) -> Self {
        Self {
            cursor: 0,
            chunk,
            speed,
            bounds,
            scratch: Vec::with_capacity(chunk),
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn set_bounds(&mut self, bounds: Vec2) {
        self.bounds = bounds;
    }

    /// Updates the next chunk of `batch`, one `set_range` per contiguous span.
    ///
    /// Returns the number of circles rewritten.
    pub fn advance<C, R>(
        &mut self,
        ctx: &C,
        batch: &mut CircleBatch<C>,
        rng: &mut R,
        dt: f32,
    ) -> Result<usize, BatchError>
    where
        C: GraphicsContext,
        R: Rng,
    {
        let count = batch.count();
        let step = (self.speed * dt).abs();
        let mut written = 0;

        for (start, len) in wrapping_spans(self.cursor, self.chunk, count) {
            if len == 0 {
                continue;
            }

            self.scratch.clear();
            self.scratch.extend(batch.circles()[start..start + len].iter().map(|c| {
                let delta = Vec2::new(
                    rng.gen_range(-step..=step),
                    rng.gen_range(-step..=step),
                );
                Circle {
                    position: (c.position + delta).clamp(Vec2::zero(), self.bounds),
                    ..*c
                }
            }));

            batch.set_range(ctx, start, &self.scratch)?;
            written += len;
        }

        if count > 0 {
            self.cursor = (self.cursor + written) % count;
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use circlet_engine::render::recording::RecordingContext;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn field(count: usize) -> FieldConfig {
        FieldConfig {
            count,
            width: 640,
            height: 480,
            min_radius: 1,
            max_radius: 5,
        }
    }

    #[test]
    fn random_field_stays_in_bounds() {
        let mut rng = StdRng::seed_from_u64(1);
        let circles = random_circles(&field(2000), &mut rng);
        assert_eq!(circles.len(), 2000);
        for c in &circles {
            assert!(c.position.x >= 0.0 && c.position.x <= 640.0);
            assert!(c.position.y >= 0.0 && c.position.y <= 480.0);
            assert_eq!(c.position.x.fract(), 0.0);
            assert_eq!(c.radius.fract(), 0.0);
            assert!((1.0..=5.0).contains(&c.radius));
            assert!(c.color.r < 255 && c.color.a < 255);
        }
    }

    #[test]
    fn bounds_are_inclusive() {
        let tiny = FieldConfig {
            count: 400,
            width: 1,
            height: 1,
            min_radius: 2,
            max_radius: 3,
        };
        let circles = random_circles(&tiny, &mut StdRng::seed_from_u64(5));
        assert!(circles.iter().any(|c| c.position.x == 1.0));
        assert!(circles.iter().any(|c| c.position.y == 1.0));
        assert!(circles.iter().any(|c| c.radius == 3.0));
        assert!(circles.iter().any(|c| c.radius == 2.0));
    }

    #[test]
    fn same_seed_same_field() {
        let a = random_circles(&field(50), &mut StdRng::seed_from_u64(42));
        let b = random_circles(&field(50), &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn spans_wrap_at_the_end() {
        assert_eq!(wrapping_spans(0, 4, 10), [(0, 4), (0, 0)]);
        assert_eq!(wrapping_spans(8, 4, 10), [(8, 2), (0, 2)]);
        assert_eq!(wrapping_spans(3, 50, 10), [(3, 7), (0, 3)]);
        assert_eq!(wrapping_spans(5, 4, 0), [(0, 0), (0, 0)]);
    }

    #[test]
    fn one_write_per_contiguous_span() {
        let ctx = RecordingContext::new();
        let mut rng = StdRng::seed_from_u64(3);
        let circles = random_circles(&field(10), &mut rng);
        let mut batch = CircleBatch::new(&ctx, &circles, 8).unwrap();
        let mut jitter = Jitter::new(4, 60.0, Vec2::new(640.0, 480.0));

        ctx.clear_calls();
        assert_eq!(jitter.advance(&ctx, &mut batch, &mut rng, 1.0 / 60.0).unwrap(), 4);
        assert_eq!(jitter.advance(&ctx, &mut batch, &mut rng, 1.0 / 60.0).unwrap(), 4);
        assert_eq!(ctx.writes().len(), 2);

        // Cursor at 8: the next chunk wraps into [8, 10) + [0, 2).
        assert_eq!(jitter.advance(&ctx, &mut batch, &mut rng, 1.0 / 60.0).unwrap(), 4);
        assert_eq!(ctx.writes().len(), 4);
        assert_eq!(jitter.cursor(), 2);
    }

    #[test]
    fn paused_clock_moves_nothing() {
        let ctx = RecordingContext::new();
        let mut rng = StdRng::seed_from_u64(4);
        let circles = random_circles(&field(8), &mut rng);
        let mut batch = CircleBatch::new(&ctx, &circles, 8).unwrap();
        let mut jitter = Jitter::new(8, 90.0, Vec2::new(640.0, 480.0));

        assert_eq!(jitter.advance(&ctx, &mut batch, &mut rng, 0.0).unwrap(), 8);
        assert_eq!(batch.circles(), &circles[..]);
    }

    #[test]
    fn jitter_keeps_circles_on_screen() {
        let ctx = RecordingContext::new();
        let mut rng = StdRng::seed_from_u64(9);
        let edge = vec![Circle::new(Vec2::zero(), 2.0, Rgba8::white()); 16];
        let mut batch = CircleBatch::new(&ctx, &edge, 8).unwrap();
        let mut jitter = Jitter::new(16, 180.0, Vec2::new(640.0, 480.0));

        jitter.advance(&ctx, &mut batch, &mut rng, 1.0 / 60.0).unwrap();
        for c in batch.circles() {
            assert!(c.position.x >= 0.0 && c.position.y >= 0.0);
            assert!(c.position.x <= 3.0 + 1e-4 && c.position.y <= 3.0 + 1e-4);
            assert_eq!(c.radius, 2.0);
        }
    }
}
