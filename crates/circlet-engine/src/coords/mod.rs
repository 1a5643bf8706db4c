//! Coordinate types shared by the batch renderers.
//!
//! Circle positions are pixel-space coordinates of the render target. The
//! batch transform maps pixel `(0, 0)` to NDC `(-1, -1)`.

mod vec2;

pub use vec2::Vec2;
