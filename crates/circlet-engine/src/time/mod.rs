//! Frame timing.
//!
//! - one `FrameClock` per window, ticked once per presented frame
//! - `FpsCounter` turns presented frames into a once-per-second rate

mod fps;
mod frame_clock;

pub use fps::FpsCounter;
pub use frame_clock::{FrameClock, FrameTime};
