//! In-memory device and surface used to exercise the renderer without a GPU.
//!
//! Textures are plain `f32` arrays. Command streams are executed on submit,
//! in recording order, with a kernel that adds one to every accumulation texel
//! and copies the running sum into the output texel.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use pathtrace_renderer::{
    ComputeKernel, Dispatch, Extent, GpuDevice, PresentationSurface, RenderError, TextureResource,
    TextureRole, Uniforms,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    CreateTexture { id: u64, role: TextureRole, extent: Extent },
    ReleaseTexture { id: u64 },
    ZeroFill { texture: u64 },
    WriteUniforms(Uniforms),
    Dispatch {
        accumulation: u64,
        output: u64,
        dispatch: Dispatch,
        uniforms: Uniforms,
    },
    Copy { source: u64, drawable: u64 },
    Submit,
    Present { drawable: u64 },
}

#[derive(Debug)]
struct TexelStore {
    role: TextureRole,
    extent: Extent,
    texels: Vec<f32>,
}

#[derive(Debug, Default)]
pub struct MockState {
    next_id: u64,
    textures: HashMap<u64, TexelStore>,
    uniforms: Uniforms,
    events: Vec<Event>,
    allocations_before_failure: Option<usize>,
}

impl MockState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

pub type SharedState = Arc<Mutex<MockState>>;

fn lock(state: &SharedState) -> MutexGuard<'_, MockState> {
    state.lock().unwrap()
}

#[derive(Debug)]
pub struct MockKernel {
    pub entry_point: String,
    execution_width: u32,
    max_threads: u32,
}

impl ComputeKernel for MockKernel {
    fn execution_width(&self) -> u32 {
        self.execution_width
    }

    fn max_threads_per_group(&self) -> u32 {
        self.max_threads
    }
}

#[derive(Debug)]
pub struct MockTexture {
    pub id: u64,
    extent: Extent,
    state: SharedState,
}

impl TextureResource for MockTexture {
    fn extent(&self) -> Extent {
        self.extent
    }
}

impl Drop for MockTexture {
    fn drop(&mut self) {
        let mut state = lock(&self.state);
        state.textures.remove(&self.id);
        state.events.push(Event::ReleaseTexture { id: self.id });
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockBindings {
    pub accumulation: u64,
    pub output: u64,
}

#[derive(Debug)]
pub struct MockDrawable {
    pub id: u64,
    pub extent: Extent,
}

#[derive(Debug)]
enum Recorded {
    Dispatch {
        bindings: MockBindings,
        dispatch: Dispatch,
    },
    Copy {
        source: u64,
        drawable: u64,
    },
}

#[derive(Debug, Default)]
pub struct MockStream {
    commands: Vec<Recorded>,
}

/// Device double. Clones share state, so tests keep one to inspect what the
/// renderer did with the other.
#[derive(Debug, Clone)]
pub struct MockDevice {
    state: SharedState,
    entry_points: Vec<String>,
    execution_width: u32,
    max_threads: u32,
}

impl MockDevice {
    pub fn new() -> Self {
        Self {
            state: SharedState::default(),
            entry_points: vec![pathtrace_renderer::DEFAULT_ENTRY_POINT.to_string()],
            execution_width: 32,
            max_threads: 1024,
        }
    }

    pub fn with_kernel_limits(mut self, execution_width: u32, max_threads: u32) -> Self {
        self.execution_width = execution_width;
        self.max_threads = max_threads;
        self
    }

    pub fn with_entry_points(mut self, entry_points: &[&str]) -> Self {
        self.entry_points = entry_points.iter().map(|name| name.to_string()).collect();
        self
    }

    /// Lets `count` more allocations succeed, then fails every later one.
    pub fn fail_allocations_after(&self, count: usize) {
        lock(&self.state).allocations_before_failure = Some(count);
    }

    pub fn allow_allocations(&self) {
        lock(&self.state).allocations_before_failure = None;
    }

    pub fn state(&self) -> SharedState {
        Arc::clone(&self.state)
    }

    pub fn events(&self) -> Vec<Event> {
        lock(&self.state).events.clone()
    }

    pub fn clear_events(&self) {
        lock(&self.state).events.clear();
    }

    pub fn texels(&self, id: u64) -> Vec<f32> {
        lock(&self.state)
            .textures
            .get(&id)
            .map(|store| store.texels.clone())
            .unwrap_or_default()
    }

    pub fn is_all_zero(&self, id: u64) -> bool {
        let state = lock(&self.state);
        let store = state.textures.get(&id).expect("texture is alive");
        store.texels.iter().all(|texel| *texel == 0.0)
    }

    pub fn live_textures(&self) -> usize {
        lock(&self.state).textures.len()
    }

    pub fn surface(&self, size: Extent) -> MockSurface {
        MockSurface::new(self.state(), size)
    }
}

impl GpuDevice for MockDevice {
    type Kernel = MockKernel;
    type Texture = MockTexture;
    type UniformBuffer = ();
    type Bindings = MockBindings;
    type CommandStream = MockStream;
    type Drawable = MockDrawable;

    fn create_kernel(&self, entry_point: &str) -> Result<MockKernel, RenderError> {
        if !self.entry_points.iter().any(|name| name == entry_point) {
            return Err(RenderError::initialization(format!(
                "kernel entry point `{entry_point}` not found"
            )));
        }
        Ok(MockKernel {
            entry_point: entry_point.to_string(),
            execution_width: self.execution_width,
            max_threads: self.max_threads,
        })
    }

    fn create_texture(&self, role: TextureRole, extent: Extent) -> Result<MockTexture, RenderError> {
        let mut state = lock(&self.state);
        if let Some(remaining) = state.allocations_before_failure.as_mut() {
            if *remaining == 0 {
                return Err(RenderError::allocation(role, extent, "mock device out of memory"));
            }
            *remaining -= 1;
        }

        let id = state.next_id();
        // Fresh storage is deliberately non-zero so a missing clear shows up.
        state.textures.insert(
            id,
            TexelStore {
                role,
                extent,
                texels: vec![f32::NAN; extent.pixel_count()],
            },
        );
        state.events.push(Event::CreateTexture { id, role, extent });
        Ok(MockTexture {
            id,
            extent,
            state: Arc::clone(&self.state),
        })
    }

    fn create_uniform_buffer(&self) -> Result<(), RenderError> {
        Ok(())
    }

    fn bind(
        &self,
        _kernel: &MockKernel,
        accumulation: &MockTexture,
        output: &MockTexture,
        _uniforms: &(),
    ) -> MockBindings {
        MockBindings {
            accumulation: accumulation.id,
            output: output.id,
        }
    }

    fn zero_fill(&self, texture: &MockTexture) {
        let mut state = lock(&self.state);
        if let Some(store) = state.textures.get_mut(&texture.id) {
            store.texels.iter_mut().for_each(|texel| *texel = 0.0);
        }
        state.events.push(Event::ZeroFill {
            texture: texture.id,
        });
    }

    fn write_uniforms(&self, _buffer: &(), uniforms: &Uniforms) {
        let mut state = lock(&self.state);
        state.uniforms = *uniforms;
        state.events.push(Event::WriteUniforms(*uniforms));
    }

    fn begin_frame(&self) -> MockStream {
        MockStream::default()
    }

    fn encode_dispatch(
        &self,
        stream: &mut MockStream,
        _kernel: &MockKernel,
        bindings: &MockBindings,
        dispatch: Dispatch,
    ) {
        stream.commands.push(Recorded::Dispatch {
            bindings: *bindings,
            dispatch,
        });
    }

    fn encode_copy(&self, stream: &mut MockStream, source: &MockTexture, target: &MockDrawable) {
        stream.commands.push(Recorded::Copy {
            source: source.id,
            drawable: target.id,
        });
    }

    fn submit(&self, stream: MockStream) {
        let mut state = lock(&self.state);
        for command in stream.commands {
            match command {
                Recorded::Dispatch { bindings, dispatch } => {
                    let uniforms = state.uniforms;
                    let sums: Vec<f32> = {
                        let accumulation = state
                            .textures
                            .get_mut(&bindings.accumulation)
                            .expect("accumulation texture is alive");
                        assert_eq!(accumulation.role, TextureRole::Accumulation);
                        assert_eq!(accumulation.extent, dispatch.grid);
                        accumulation.texels.iter_mut().for_each(|texel| *texel += 1.0);
                        accumulation.texels.clone()
                    };
                    let output = state
                        .textures
                        .get_mut(&bindings.output)
                        .expect("output texture is alive");
                    assert_eq!(output.role, TextureRole::Output);
                    assert_eq!(output.extent, dispatch.grid);
                    output.texels.copy_from_slice(&sums);
                    state.events.push(Event::Dispatch {
                        accumulation: bindings.accumulation,
                        output: bindings.output,
                        dispatch,
                        uniforms,
                    });
                }
                Recorded::Copy { source, drawable } => {
                    state.events.push(Event::Copy { source, drawable });
                }
            }
        }
        state.events.push(Event::Submit);
    }
}

/// Surface double with a scripted drawable availability.
#[derive(Debug)]
pub struct MockSurface {
    state: SharedState,
    size: Extent,
    next_drawable: u64,
    availability: VecDeque<Result<bool, String>>,
    pub size_queries: usize,
    pub presented: Vec<u64>,
}

impl MockSurface {
    fn new(state: SharedState, size: Extent) -> Self {
        Self {
            state,
            size,
            next_drawable: 0,
            availability: VecDeque::new(),
            size_queries: 0,
            presented: Vec::new(),
        }
    }

    pub fn set_size(&mut self, size: Extent) {
        self.size = size;
    }

    /// Next tick has no drawable.
    pub fn withhold_next_drawable(&mut self) {
        self.availability.push_back(Ok(false));
    }

    /// Next tick fails unrecoverably.
    pub fn fail_next_drawable(&mut self, reason: &str) {
        self.availability.push_back(Err(reason.to_string()));
    }
}

impl PresentationSurface for MockSurface {
    type Drawable = MockDrawable;

    fn size(&self) -> Extent {
        self.size
    }

    fn current_drawable(&mut self) -> Result<Option<MockDrawable>, RenderError> {
        match self.availability.pop_front().unwrap_or(Ok(true)) {
            Ok(true) => {
                self.next_drawable += 1;
                Ok(Some(MockDrawable {
                    id: self.next_drawable,
                    extent: self.size,
                }))
            }
            Ok(false) => Ok(None),
            Err(reason) => Err(RenderError::Presentation(reason)),
        }
    }

    fn present(&mut self, drawable: MockDrawable) {
        self.presented.push(drawable.id);
        lock(&self.state).events.push(Event::Present {
            drawable: drawable.id,
        });
    }
}
