//! WGSL front-end shared by every backend.
//!
//! Compilation parses and validates a single stage and checks that it exposes
//! the expected entry point. Linking checks the interface between the two
//! stages and the vertex buffer layouts, so that a mismatched program is
//! rejected before any pipeline object exists.

use naga::valid::{Capabilities, ValidationFlags, Validator};
use naga::{AddressSpace, Binding, Handle, Module, Scalar, Type, TypeInner, VectorSize};

use super::backend::{ShaderStage, VertexBufferLayout, VertexFormat};

/// Entry point name required in vertex sources.
pub const VERTEX_ENTRY: &str = "vs_main";
/// Entry point name required in fragment sources.
pub const FRAGMENT_ENTRY: &str = "fs_main";

/// The only resource a program may bind: a `mat4x4<f32>` uniform read by the
/// vertex stage.
pub const TRANSFORM_GROUP: u32 = 0;
pub const TRANSFORM_BINDING: u32 = 0;

/// A parsed and validated shader stage.
#[derive(Debug)]
pub struct CompiledStage {
    pub stage: ShaderStage,
    pub module: Module,
}

impl CompiledStage {
    pub fn entry_point(&self) -> &'static str {
        entry_name(self.stage)
    }

    fn entry(&self) -> Option<&naga::EntryPoint> {
        let name = self.entry_point();
        let want = naga_stage(self.stage);
        self.module
            .entry_points
            .iter()
            .find(|ep| ep.name == name && ep.stage == want)
    }
}

fn entry_name(stage: ShaderStage) -> &'static str {
    match stage {
        ShaderStage::Vertex => VERTEX_ENTRY,
        ShaderStage::Fragment => FRAGMENT_ENTRY,
    }
}

fn naga_stage(stage: ShaderStage) -> naga::ShaderStage {
    match stage {
        ShaderStage::Vertex => naga::ShaderStage::Vertex,
        ShaderStage::Fragment => naga::ShaderStage::Fragment,
    }
}

/// Parses and validates `source` as a single `stage`.
///
/// The error string is the human-readable diagnostic, including source spans.
pub fn compile(stage: ShaderStage, source: &str) -> Result<CompiledStage, String> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| e.emit_to_string(source))?;

    Validator::new(ValidationFlags::all(), Capabilities::empty())
        .validate(&module)
        .map_err(|e| e.emit_to_string(source))?;

    let compiled = CompiledStage { stage, module };
    if compiled.entry().is_none() {
        return Err(format!(
            "{stage} shader has no @{stage} entry point named `{}`",
            compiled.entry_point()
        ));
    }
    Ok(compiled)
}

/// Checks that `vertex` and `fragment` form a complete program fed by `buffers`.
pub fn link(
    vertex: &CompiledStage,
    fragment: &CompiledStage,
    buffers: &[VertexBufferLayout],
) -> Result<(), String> {
    if vertex.stage != ShaderStage::Vertex || fragment.stage != ShaderStage::Fragment {
        return Err("program requires one vertex and one fragment stage".to_string());
    }
    let (Some(vs), Some(fs)) = (vertex.entry(), fragment.entry()) else {
        return Err("missing entry point".to_string());
    };

    check_resources(vertex)?;
    check_resources(fragment)?;

    // Every vertex input must be fed by exactly one attribute of matching shape.
    let mut inputs = Vec::new();
    for arg in &vs.function.arguments {
        collect_locations(&vertex.module, arg.ty, arg.binding.as_ref(), &mut inputs);
    }
    for (location, inner) in &inputs {
        let fed: Vec<VertexFormat> = buffers
            .iter()
            .flat_map(|b| b.attributes.iter())
            .filter(|a| a.location == *location)
            .map(|a| a.format)
            .collect();
        match fed.as_slice() {
            [] => return Err(format!("vertex input @location({location}) is not provided by any buffer")),
            [format] if format_matches(*format, inner) => {}
            [format] => {
                return Err(format!(
                    "vertex input @location({location}) is {inner:?} but the buffer provides {format:?}"
                ));
            }
            _ => return Err(format!("vertex input @location({location}) is provided more than once")),
        }
    }

    let mut varyings = Vec::new();
    if let Some(result) = &vs.function.result {
        collect_locations(&vertex.module, result.ty, result.binding.as_ref(), &mut varyings);
    }

    let mut fs_inputs = Vec::new();
    for arg in &fs.function.arguments {
        collect_locations(&fragment.module, arg.ty, arg.binding.as_ref(), &mut fs_inputs);
    }
    for (location, inner) in &fs_inputs {
        match varyings.iter().find(|(l, _)| l == location) {
            None => {
                return Err(format!(
                    "fragment input @location({location}) is not written by the vertex stage"
                ));
            }
            Some((_, out)) if out != inner => {
                return Err(format!(
                    "@location({location}) type mismatch: vertex writes {out:?}, fragment reads {inner:?}"
                ));
            }
            Some(_) => {}
        }
    }

    let mut targets = Vec::new();
    if let Some(result) = &fs.function.result {
        collect_locations(&fragment.module, result.ty, result.binding.as_ref(), &mut targets);
    }
    if !targets.iter().any(|(l, _)| *l == 0) {
        return Err("fragment stage does not write color target @location(0)".to_string());
    }

    Ok(())
}

/// Rejects any resource the pipeline layout does not provide.
fn check_resources(stage: &CompiledStage) -> Result<(), String> {
    for (_, var) in stage.module.global_variables.iter() {
        let Some(rb) = &var.binding else {
            continue;
        };
        let name = var.name.as_deref().unwrap_or("<unnamed>");

        if stage.stage != ShaderStage::Vertex
            || rb.group != TRANSFORM_GROUP
            || rb.binding != TRANSFORM_BINDING
        {
            return Err(format!(
                "{} resource `{name}` at @group({}) @binding({}) is not bound; \
                 only the vertex transform at @group({TRANSFORM_GROUP}) @binding({TRANSFORM_BINDING}) is",
                stage.stage, rb.group, rb.binding
            ));
        }
        if var.space != AddressSpace::Uniform || !is_transform(&stage.module, var.ty) {
            return Err(format!(
                "`{name}` at @group({TRANSFORM_GROUP}) @binding({TRANSFORM_BINDING}) must be a \
                 uniform mat4x4<f32> or a struct holding only one"
            ));
        }
    }
    Ok(())
}

fn is_transform(module: &Module, ty: Handle<Type>) -> bool {
    match &module.types[ty].inner {
        TypeInner::Matrix { columns: VectorSize::Quad, rows: VectorSize::Quad, scalar } => {
            *scalar == Scalar::F32
        }
        TypeInner::Struct { members, .. } => match members.as_slice() {
            [only] => is_transform(module, only.ty),
            _ => false,
        },
        _ => false,
    }
}

fn collect_locations(
    module: &Module,
    ty: Handle<Type>,
    binding: Option<&Binding>,
    out: &mut Vec<(u32, TypeInner)>,
) {
    match binding {
        Some(Binding::Location { location, .. }) => {
            out.push((*location, module.types[ty].inner.clone()));
        }
        Some(Binding::BuiltIn(_)) => {}
        None => {
            if let TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for member in members {
                    collect_locations(module, member.ty, member.binding.as_ref(), out);
                }
            }
        }
    }
}

fn format_matches(format: VertexFormat, inner: &TypeInner) -> bool {
    match (format, inner) {
        (VertexFormat::Float32, TypeInner::Scalar(s)) => *s == Scalar::F32,
        (VertexFormat::Float32x2, TypeInner::Vector { size: VectorSize::Bi, scalar }) => {
            *scalar == Scalar::F32
        }
        (VertexFormat::Float32x4, TypeInner::Vector { size: VectorSize::Quad, scalar }) => {
            *scalar == Scalar::F32
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::backend::{StepMode, VertexAttribute};

    const VS: &str = r#"
        struct VsOut {
            @builtin(position) clip: vec4<f32>,
            @location(0) color: vec4<f32>,
        };

        @vertex
        fn vs_main(@location(0) pos: vec2<f32>, @location(1) color: vec4<f32>) -> VsOut {
            var out: VsOut;
            out.clip = vec4<f32>(pos, 0.0, 1.0);
            out.color = color;
            return out;
        }
    "#;

    const FS: &str = r#"
        @fragment
        fn fs_main(@location(0) color: vec4<f32>) -> @location(0) vec4<f32> {
            return color;
        }
    "#;

    const ATTRS: [VertexAttribute; 2] = [
        VertexAttribute { location: 0, format: VertexFormat::Float32x2, offset: 0 },
        VertexAttribute { location: 1, format: VertexFormat::Float32x4, offset: 8 },
    ];

    fn layout() -> [VertexBufferLayout; 1] {
        [VertexBufferLayout { stride: 24, step: StepMode::Vertex, attributes: &ATTRS }]
    }

    #[test]
    fn compiles_and_links_matching_stages() {
        let vs = compile(ShaderStage::Vertex, VS).unwrap();
        let fs = compile(ShaderStage::Fragment, FS).unwrap();
        assert_eq!(vs.entry_point(), "vs_main");
        link(&vs, &fs, &layout()).unwrap();
    }

    #[test]
    fn syntax_error_reports_diagnostic() {
        let err = compile(ShaderStage::Vertex, "fn vs_main( {").unwrap_err();
        assert!(!err.is_empty());
    }

    #[test]
    fn missing_entry_point_is_a_compile_error() {
        let err = compile(ShaderStage::Vertex, FS).unwrap_err();
        assert!(err.contains("vs_main"), "{err}");
    }

    #[test]
    fn unfed_vertex_input_fails_link() {
        let vs = compile(ShaderStage::Vertex, VS).unwrap();
        let fs = compile(ShaderStage::Fragment, FS).unwrap();
        let partial = [VertexBufferLayout { stride: 8, step: StepMode::Vertex, attributes: &ATTRS[..1] }];
        let err = link(&vs, &fs, &partial).unwrap_err();
        assert!(err.contains("@location(1)"), "{err}");
    }

    #[test]
    fn wrong_attribute_shape_fails_link() {
        const BAD: [VertexAttribute; 2] = [
            VertexAttribute { location: 0, format: VertexFormat::Float32, offset: 0 },
            VertexAttribute { location: 1, format: VertexFormat::Float32x4, offset: 4 },
        ];
        let vs = compile(ShaderStage::Vertex, VS).unwrap();
        let fs = compile(ShaderStage::Fragment, FS).unwrap();
        let layouts = [VertexBufferLayout { stride: 20, step: StepMode::Vertex, attributes: &BAD }];
        assert!(link(&vs, &fs, &layouts).is_err());
    }

    #[test]
    fn fragment_input_without_varying_fails_link() {
        let fs = r#"
            @fragment
            fn fs_main(@location(3) tint: vec4<f32>) -> @location(0) vec4<f32> {
                return tint;
            }
        "#;
        let vs = compile(ShaderStage::Vertex, VS).unwrap();
        let fs = compile(ShaderStage::Fragment, fs).unwrap();
        let err = link(&vs, &fs, &layout()).unwrap_err();
        assert!(err.contains("@location(3)"), "{err}");
    }

    fn with_uniform(decl: &str) -> String {
        format!(
            r#"
            {decl}

            @vertex
            fn vs_main(@location(0) pos: vec2<f32>, @location(1) color: vec4<f32>) -> @builtin(position) vec4<f32> {{
                return vec4<f32>(pos, 0.0, 1.0) + color * 0.0;
            }}
            "#
        )
    }

    fn link_vertex(source: &str) -> Result<(), String> {
        let fs = r#"
            @fragment
            fn fs_main() -> @location(0) vec4<f32> {
                return vec4<f32>(1.0);
            }
        "#;
        let vs = compile(ShaderStage::Vertex, source)?;
        let fs = compile(ShaderStage::Fragment, fs)?;
        link(&vs, &fs, &layout())
    }

    #[test]
    fn transform_uniform_links() {
        link_vertex(&with_uniform("@group(0) @binding(0) var<uniform> m: mat4x4<f32>;")).unwrap();
        link_vertex(&with_uniform(
            "struct T { m: mat4x4<f32> }; @group(0) @binding(0) var<uniform> t: T;",
        ))
        .unwrap();
    }

    #[test]
    fn resource_outside_the_layout_fails_link() {
        let err = link_vertex(&with_uniform(
            "@group(2) @binding(7) var<storage, read> m: mat4x4<f32>;",
        ))
        .unwrap_err();
        assert!(err.contains("@group(2) @binding(7)"), "{err}");
    }

    #[test]
    fn wrong_transform_shape_fails_link() {
        let storage = link_vertex(&with_uniform(
            "@group(0) @binding(0) var<storage, read> m: mat4x4<f32>;",
        ));
        assert!(storage.unwrap_err().contains("uniform mat4x4"));

        let vec = link_vertex(&with_uniform("@group(0) @binding(0) var<uniform> m: vec4<f32>;"));
        assert!(vec.is_err());
    }

    #[test]
    fn fragment_resources_fail_link() {
        let fs = r#"
            @group(0) @binding(0) var<uniform> tint: mat4x4<f32>;

            @fragment
            fn fs_main(@location(0) color: vec4<f32>) -> @location(0) vec4<f32> {
                return tint * color;
            }
        "#;
        let vs = compile(ShaderStage::Vertex, VS).unwrap();
        let fs = compile(ShaderStage::Fragment, fs).unwrap();
        let err = link(&vs, &fs, &layout()).unwrap_err();
        assert!(err.starts_with("fragment resource"), "{err}");
    }

    #[test]
    fn varying_type_mismatch_fails_link() {
        let fs = r#"
            @fragment
            fn fs_main(@location(0) tint: vec2<f32>) -> @location(0) vec4<f32> {
                return vec4<f32>(tint, 0.0, 1.0);
            }
        "#;
        let vs = compile(ShaderStage::Vertex, VS).unwrap();
        let fs = compile(ShaderStage::Fragment, fs).unwrap();
        assert!(link(&vs, &fs, &layout()).unwrap_err().contains("mismatch"));
    }
}
