use std::borrow::Cow;

use crate::render::backend::{GraphicsContext, ShaderStage, VertexBufferLayout};

use super::error::BatchError;

/// WGSL sources for the two program stages.
///
/// The vertex stage must expose `vs_main` and consume the ring vertex at
/// location 0 plus center/radius/color at locations 1-3; the fragment stage
/// must expose `fs_main`. The transform is a `mat4x4<f32>` uniform at
/// `@group(0) @binding(0)`.
#[derive(Debug, Clone)]
pub struct ShaderSources {
    pub vertex: Cow<'static, str>,
    pub fragment: Cow<'static, str>,
}

impl ShaderSources {
    /// The built-in flat-colored circle program.
    pub fn circle() -> Self {
        Self {
            vertex: Cow::Borrowed(include_str!("shaders/circle_vs.wgsl")),
            fragment: Cow::Borrowed(include_str!("shaders/circle_fs.wgsl")),
        }
    }
}

impl Default for ShaderSources {
    fn default() -> Self {
        Self::circle()
    }
}

/// Compiles both stages and links them. Any failure aborts the build.
///
/// Intermediate stage objects are dropped once the program exists.
pub(crate) fn build_program<C: GraphicsContext>(
    ctx: &C,
    sources: &ShaderSources,
    buffers: &[VertexBufferLayout],
) -> Result<C::Program, BatchError> {
    let vertex = ctx
        .compile_shader(ShaderStage::Vertex, &sources.vertex)
        .map_err(|log| BatchError::ShaderCompile { stage: ShaderStage::Vertex, log })?;

    let fragment = ctx
        .compile_shader(ShaderStage::Fragment, &sources.fragment)
        .map_err(|log| BatchError::ShaderCompile { stage: ShaderStage::Fragment, log })?;

    ctx.link_program(&vertex, &fragment, buffers)
        .map_err(|log| BatchError::ShaderLink { log })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::batch::geometry::RingVertex;
    use crate::render::batch::instance::CircleInstance;
    use crate::render::recording::{GpuCall, RecordingContext};

    fn layouts() -> [VertexBufferLayout; 2] {
        [RingVertex::layout(), CircleInstance::layout()]
    }

    #[test]
    fn builtin_program_builds() {
        let ctx = RecordingContext::new();
        let program = build_program(&ctx, &ShaderSources::circle(), &layouts());
        assert!(program.is_ok());
        assert_eq!(ctx.live_resources(), 1);
    }

    #[test]
    fn vertex_compile_failure_stops_before_fragment() {
        let ctx = RecordingContext::new();
        let sources = ShaderSources {
            vertex: "@vertex fn vs_main( -> ".into(),
            ..ShaderSources::circle()
        };
        let err = build_program(&ctx, &sources, &layouts()).unwrap_err();
        assert!(matches!(err, BatchError::ShaderCompile { stage: ShaderStage::Vertex, ref log } if !log.is_empty()));
        assert_eq!(
            ctx.calls(),
            vec![GpuCall::CompileShader { stage: ShaderStage::Vertex, ok: false }]
        );
    }

    #[test]
    fn fragment_compile_failure_is_reported_with_stage() {
        let ctx = RecordingContext::new();
        let sources = ShaderSources {
            fragment: "@fragment fn fs_main() -> @location(0) vec4<f32> { return 1; }".into(),
            ..ShaderSources::circle()
        };
        let err = build_program(&ctx, &sources, &layouts()).unwrap_err();
        assert!(matches!(err, BatchError::ShaderCompile { stage: ShaderStage::Fragment, .. }));
    }

    #[test]
    fn link_failure_is_fatal() {
        let ctx = RecordingContext::new();
        // Reads a varying the vertex stage never writes.
        let sources = ShaderSources {
            fragment: r#"
                @fragment
                fn fs_main(@location(5) uv: vec2<f32>) -> @location(0) vec4<f32> {
                    return vec4<f32>(uv, 0.0, 1.0);
                }
            "#
            .into(),
            ..ShaderSources::circle()
        };
        let err = build_program(&ctx, &sources, &layouts()).unwrap_err();
        assert!(matches!(err, BatchError::ShaderLink { ref log } if log.contains("@location(5)")));
        assert_eq!(ctx.live_resources(), 0);
    }

    #[test]
    fn transform_bound_elsewhere_is_a_link_error() {
        let ctx = RecordingContext::new();
        let builtin = ShaderSources::circle();
        let moved = builtin
            .vertex
            .replace("@group(0) @binding(0)\nvar<uniform>", "@group(2) @binding(7)\nvar<storage, read>");
        assert_ne!(moved, builtin.vertex);

        let sources = ShaderSources {
            vertex: moved.into(),
            ..builtin
        };
        let err = build_program(&ctx, &sources, &layouts()).unwrap_err();
        assert!(matches!(err, BatchError::ShaderLink { ref log } if log.contains("@group(2) @binding(7)")));
        assert_eq!(ctx.live_resources(), 0);
    }
}
