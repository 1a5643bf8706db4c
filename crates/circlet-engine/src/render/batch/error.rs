use thiserror::Error;

use crate::render::backend::ShaderStage;

/// Failure reported by a circle batch.
///
/// Construction errors (`InvalidSegments`, `TooManyCircles`, `ShaderCompile`,
/// `ShaderLink`) mean no batch was produced. `IndexOutOfRange` leaves the batch untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchError {
    #[error("a circle needs at least {min} segments, got {segments}")]
    InvalidSegments { segments: u32, min: u32 },

    #[error("a batch holds at most {max} circles, got {count}")]
    TooManyCircles { count: usize, max: u32 },

    #[error("{stage} shader failed to compile:\n{log}")]
    ShaderCompile { stage: ShaderStage, log: String },

    #[error("shader program failed to link:\n{log}")]
    ShaderLink { log: String },

    #[error("circles [{start}, {start}+{len}) are out of range for a batch of {count}")]
    IndexOutOfRange { start: usize, len: usize, count: usize },
}
