//! Backend contracts consumed by the batch renderers.
//!
//! A `GraphicsContext` is the explicit handle to the graphics context that is
//! active on the calling thread. Every operation that touches GPU state takes
//! it by reference; nothing in this crate reaches for an ambient "current"
//! context.

use std::fmt;

/// Column-major 4x4 matrix as uploaded to shaders.
pub type Mat4 = [[f32; 4]; 4];

/// Programmable pipeline stage.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// How a buffer will be used after creation.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BufferKind {
    /// Vertex data uploaded once and never written again.
    StaticVertex,
    /// Vertex data that accepts sub-range writes.
    DynamicVertex,
}

/// Attribute component layout.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum VertexFormat {
    Float32,
    Float32x2,
    Float32x4,
}

impl VertexFormat {
    /// Number of `f32` components.
    #[inline]
    pub const fn components(self) -> u32 {
        match self {
            VertexFormat::Float32 => 1,
            VertexFormat::Float32x2 => 2,
            VertexFormat::Float32x4 => 4,
        }
    }
}

/// Whether an attribute advances per vertex or per instance.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum StepMode {
    Vertex,
    Instance,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct VertexAttribute {
    pub location: u32,
    pub format: VertexFormat,
    /// Byte offset inside one element.
    pub offset: u64,
}

/// Layout of one bound vertex buffer, in binding-slot order.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct VertexBufferLayout {
    pub stride: u64,
    pub step: StepMode,
    pub attributes: &'static [VertexAttribute],
}

/// Render target seen by a draw call.
pub trait DrawTarget {
    /// Current drawable size in physical pixels.
    fn pixel_size(&self) -> (u32, u32);

    /// Restores any global draw state touched by the previous draw so that
    /// unrelated renderers start from a clean slate.
    fn reset_state(&mut self);
}

/// Everything a single instanced draw needs.
pub struct InstancedDraw<'a, C: GraphicsContext + ?Sized> {
    pub program: &'a C::Program,
    pub vertex_array: &'a C::VertexArray,
    /// Slot 0: the shared per-vertex geometry.
    pub geometry: &'a C::Buffer,
    /// Slot 1: per-instance attributes.
    pub instances: &'a C::Buffer,
    pub vertex_count: u32,
    /// First instance record to draw.
    pub first_instance: u32,
    pub instance_count: u32,
    pub transform: Mat4,
}

/// Graphics context primitives used by the batch renderers.
///
/// All resource types are owned handles: dropping one releases the underlying
/// GPU object. Implementations are expected to be confined to the thread that
/// owns the context.
pub trait GraphicsContext {
    /// A compiled, not yet linked, shader stage.
    type Shader;
    /// A linked program (vertex + fragment) bound to a vertex layout.
    type Program;
    type Buffer;
    /// Binding descriptor for the shared geometry.
    type VertexArray;
    type Target<'t>: DrawTarget;

    /// Compiles one stage. On failure returns the compiler diagnostic text.
    fn compile_shader(&self, stage: ShaderStage, source: &str) -> Result<Self::Shader, String>;

    /// Links two compiled stages against `buffers`. On failure returns the
    /// linker diagnostic text.
    fn link_program(
        &self,
        vertex: &Self::Shader,
        fragment: &Self::Shader,
        buffers: &[VertexBufferLayout],
    ) -> Result<Self::Program, String>;

    /// Creates a buffer initialized with `contents`.
    fn create_buffer(&self, label: &str, kind: BufferKind, contents: &[u8]) -> Self::Buffer;

    /// Writes `data` into `buffer` starting at byte `offset`.
    fn write_buffer(&self, buffer: &Self::Buffer, offset: u64, data: &[u8]);

    /// Describes how `geometry` (holding `vertex_count` vertices of a closed
    /// fan) is assembled into primitives.
    fn create_vertex_array(&self, geometry: &Self::Buffer, vertex_count: u32) -> Self::VertexArray;

    /// Records exactly one instanced draw into `target`.
    fn draw_instanced(&self, target: &mut Self::Target<'_>, draw: &InstancedDraw<'_, Self>);
}
