//! Instrumented graphics context that records calls instead of touching a GPU.
//!
//! Buffer contents are kept in memory so callers can compare them byte for byte
//! against what a renderer believes it uploaded. Every handle reports its
//! release when dropped.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use super::backend::{
    BufferKind, DrawTarget, GraphicsContext, InstancedDraw, Mat4, ShaderStage, VertexBufferLayout,
};
use super::wgsl::{self, CompiledStage};

/// Identifier of a recorded GPU object.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ResourceId(pub u32);

/// One call made against a [`RecordingContext`].
#[derive(Debug, Clone, PartialEq)]
pub enum GpuCall {
    CompileShader { stage: ShaderStage, ok: bool },
    LinkProgram { program: Option<ResourceId> },
    CreateBuffer { buffer: ResourceId, kind: BufferKind, len: usize },
    WriteBuffer { buffer: ResourceId, offset: u64, len: usize },
    CreateVertexArray { vertex_array: ResourceId, vertex_count: u32 },
    DrawInstanced {
        program: ResourceId,
        vertex_array: ResourceId,
        vertex_count: u32,
        first_instance: u32,
        instance_count: u32,
        transform: Mat4,
    },
    Release { resource: ResourceId },
}

#[derive(Default)]
struct RecorderState {
    next_id: u32,
    calls: Vec<GpuCall>,
    buffers: HashMap<ResourceId, Vec<u8>>,
    live: HashSet<ResourceId>,
}

impl RecorderState {
    fn allocate(&mut self) -> ResourceId {
        let id = ResourceId(self.next_id);
        self.next_id += 1;
        self.live.insert(id);
        id
    }
}

/// Owned handle to a recorded object; dropping it records a release.
pub struct RecordedHandle {
    id: ResourceId,
    state: Rc<RefCell<RecorderState>>,
}

impl RecordedHandle {
    pub fn id(&self) -> ResourceId {
        self.id
    }
}

impl std::fmt::Debug for RecordedHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("RecordedHandle").field(&self.id).finish()
    }
}

impl Drop for RecordedHandle {
    fn drop(&mut self) {
        let mut state = self.state.borrow_mut();
        state.live.remove(&self.id);
        state.buffers.remove(&self.id);
        state.calls.push(GpuCall::Release { resource: self.id });
    }
}

/// GPU-less [`GraphicsContext`].
///
/// Cloning yields another handle onto the same recording.
#[derive(Clone, Default)]
pub struct RecordingContext {
    state: Rc<RefCell<RecorderState>>,
}

impl RecordingContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every call recorded so far.
    pub fn calls(&self) -> Vec<GpuCall> {
        self.state.borrow().calls.clone()
    }

    /// Forgets recorded calls; live resources and buffer contents are kept.
    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    /// Recorded buffer writes as `(buffer, offset, len)`.
    pub fn writes(&self) -> Vec<(ResourceId, u64, usize)> {
        self.state
            .borrow()
            .calls
            .iter()
            .filter_map(|c| match *c {
                GpuCall::WriteBuffer { buffer, offset, len } => Some((buffer, offset, len)),
                _ => None,
            })
            .collect()
    }

    /// Recorded draws as `(vertex_count, instance_count)`.
    pub fn draws(&self) -> Vec<(u32, u32)> {
        self.state
            .borrow()
            .calls
            .iter()
            .filter_map(|c| match *c {
                GpuCall::DrawInstanced { vertex_count, instance_count, .. } => {
                    Some((vertex_count, instance_count))
                }
                _ => None,
            })
            .collect()
    }

    /// Buffers created with `kind`, oldest first, including released ones.
    pub fn buffers_of_kind(&self, kind: BufferKind) -> Vec<ResourceId> {
        self.state
            .borrow()
            .calls
            .iter()
            .filter_map(|c| match *c {
                GpuCall::CreateBuffer { buffer, kind: k, .. } if k == kind => Some(buffer),
                _ => None,
            })
            .collect()
    }

    /// Current contents of a live buffer.
    pub fn buffer_contents(&self, buffer: ResourceId) -> Option<Vec<u8>> {
        self.state.borrow().buffers.get(&buffer).cloned()
    }

    /// Number of objects created and not yet released.
    pub fn live_resources(&self) -> usize {
        self.state.borrow().live.len()
    }

    fn handle(&self, id: ResourceId) -> RecordedHandle {
        RecordedHandle { id, state: Rc::clone(&self.state) }
    }

    fn push(&self, call: GpuCall) {
        self.state.borrow_mut().calls.push(call);
    }
}

/// Render target paired with [`RecordingContext`].
#[derive(Debug, Clone, Default)]
pub struct RecordingTarget {
    pub width: u32,
    pub height: u32,
    /// Number of `reset_state` calls observed.
    pub resets: usize,
}

impl RecordingTarget {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height, resets: 0 }
    }
}

impl DrawTarget for RecordingTarget {
    fn pixel_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn reset_state(&mut self) {
        self.resets += 1;
    }
}

impl GraphicsContext for RecordingContext {
    type Shader = CompiledStage;
    type Program = RecordedHandle;
    type Buffer = RecordedHandle;
    type VertexArray = RecordedHandle;
    type Target<'t> = RecordingTarget;

    fn compile_shader(&self, stage: ShaderStage, source: &str) -> Result<CompiledStage, String> {
        let result = wgsl::compile(stage, source);
        self.push(GpuCall::CompileShader { stage, ok: result.is_ok() });
        result
    }

    fn link_program(
        &self,
        vertex: &CompiledStage,
        fragment: &CompiledStage,
        buffers: &[VertexBufferLayout],
    ) -> Result<RecordedHandle, String> {
        if let Err(log) = wgsl::link(vertex, fragment, buffers) {
            self.push(GpuCall::LinkProgram { program: None });
            return Err(log);
        }
        let id = self.state.borrow_mut().allocate();
        self.push(GpuCall::LinkProgram { program: Some(id) });
        Ok(self.handle(id))
    }

    fn create_buffer(&self, _label: &str, kind: BufferKind, contents: &[u8]) -> RecordedHandle {
        let id = {
            let mut state = self.state.borrow_mut();
            let id = state.allocate();
            state.buffers.insert(id, contents.to_vec());
            state.calls.push(GpuCall::CreateBuffer { buffer: id, kind, len: contents.len() });
            id
        };
        self.handle(id)
    }

    fn write_buffer(&self, buffer: &RecordedHandle, offset: u64, data: &[u8]) {
        let mut state = self.state.borrow_mut();
        let bytes = state
            .buffers
            .get_mut(&buffer.id)
            .expect("write to a buffer that was never created");
        let start = offset as usize;
        let end = start + data.len();
        assert!(end <= bytes.len(), "write [{start}, {end}) overruns buffer of {} bytes", bytes.len());
        bytes[start..end].copy_from_slice(data);
        state.calls.push(GpuCall::WriteBuffer { buffer: buffer.id, offset, len: data.len() });
    }

    fn create_vertex_array(&self, _geometry: &RecordedHandle, vertex_count: u32) -> RecordedHandle {
        let id = self.state.borrow_mut().allocate();
        self.push(GpuCall::CreateVertexArray { vertex_array: id, vertex_count });
        self.handle(id)
    }

    fn draw_instanced(&self, _target: &mut RecordingTarget, draw: &InstancedDraw<'_, Self>) {
        self.push(GpuCall::DrawInstanced {
            program: draw.program.id,
            vertex_array: draw.vertex_array.id,
            vertex_count: draw.vertex_count,
            first_instance: draw.first_instance,
            instance_count: draw.instance_count,
            transform: draw.transform,
        });
    }
}
