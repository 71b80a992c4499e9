//! Render pipeline: per-frame orchestration
//!
//! Runs one frame as a strictly sequential state machine on the rendering
//! thread: gather items into the render list, set up the output target,
//! upload the shared uniform blocks, cull + sort + stream-submit each
//! bucket with state-change minimization, run the 2D overlay pass, present.
//!
//! The pipeline exclusively owns every GPU-side buffer resource it uses
//! (uniform buffers, the shadow-map target). They are created once at
//! construction, registered in an owned-resource list, and released
//! together in reverse-construction order at teardown.

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::foundation::math::{Mat4, Vec4};
use crate::render::camera::Camera;
use crate::render::context2d::Context2d;
use crate::render::device::{
    BufferHandle, ClearFlags, GraphicsDevice, TextureHandle, VertexBufferHandle,
};
use crate::render::item::{DrawKind, RenderItem};
use crate::render::lighting::{LightingClass, SceneLighting};
use crate::render::list::{Bucket, RenderList};
use crate::render::materials::{
    Effect, EffectKey, EffectRegistry, Material, MaterialKey, MaterialRegistry,
};
use crate::render::uniforms::{
    FrameMatrixUniforms, ObjectUniforms, SharedFrameUniforms, CLOUD_SHADOW_TEXTURE_SLOT,
    FRAME_MATRIX_SLOT, LIGHTING_SLOT, OBJECT_SLOT, SHARED_FRAME_SLOT,
};
use crate::render::{RenderError, RenderResult};
use crate::scene::{GameSystem, OverlayScene, Scene};

/// Render pipeline configuration
///
/// Deserializable from the engine's TOML settings; every field has a
/// sensible default so partial config files work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderPipelineConfig {
    /// Clear color for the output target (linear rgba)
    pub clear_color: [f32; 4],

    /// Depth buffer clear value
    pub depth_clear: f32,

    /// Enable frustum culling
    ///
    /// Disabling turns the cull step into a pass-through copy; useful when
    /// diagnosing culling bugs.
    pub enable_frustum_culling: bool,

    /// Edge length of the square shadow-map target in pixels
    pub shadow_map_size: u32,
}

impl Default for RenderPipelineConfig {
    fn default() -> Self {
        Self {
            clear_color: [0.0, 0.0, 0.0, 1.0],
            depth_clear: 1.0,
            enable_frustum_culling: true,
            shadow_map_size: 2048,
        }
    }
}

impl RenderPipelineConfig {
    /// Parse a configuration from a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}

/// Everything the pipeline consumes for one frame
///
/// The pipeline does not own game state; collaborators are borrowed for the
/// duration of `execute` only.
pub struct FrameContext<'a> {
    /// The active 3D scene, when gameplay is running
    ///
    /// Absence is not an error: the pipeline renders an empty cleared frame
    /// with default lighting.
    pub scene: Option<&'a mut dyn Scene>,
    /// The 2D scene (GUI layer) drawn during the overlay pass
    pub overlay: Option<&'a mut dyn OverlayScene>,
    /// Registered game subsystems contributing drawable items
    pub systems: &'a mut [Box<dyn GameSystem>],
    /// The active camera
    pub camera: &'a Camera,
    /// Elapsed time since engine start, in seconds
    pub elapsed_seconds: f32,
}

/// Observer invoked while the render list is being built
pub type BuildListObserver = Box<dyn FnMut(&mut RenderList, &Camera)>;

/// Observer invoked during the 2D overlay pass
pub type Render2dObserver = Box<dyn FnMut(&mut Context2d<'_>)>;

/// GPU resource owned by the pipeline, tracked for ordered teardown
#[derive(Debug, Clone, Copy)]
enum OwnedResource {
    Buffer(BufferHandle),
    Texture(TextureHandle),
}

/// The pipeline's uniform buffers, one per uniform block
#[derive(Debug, Clone, Copy)]
struct UniformBuffers {
    shared_frame: BufferHandle,
    frame_matrices: BufferHandle,
    object: BufferHandle,
    terrain_lighting: BufferHandle,
    object_lighting: BufferHandle,
}

/// The "last item" sentinel threaded through the submission loop
///
/// Explicitly `Option<SubmittedState>` at the call site so "no previous
/// item" is never confused with a previous item whose fields happen to hold
/// default values.
#[derive(Debug, Clone)]
struct SubmittedState {
    effect: EffectKey,
    material: MaterialKey,
    vertex_buffers: [Option<VertexBufferHandle>; 2],
    world: Mat4,
}

/// Per-frame rendering orchestrator
///
/// Owns the graphics device, the render list and every GPU buffer resource
/// involved in uniform management. Collaborators append items during the
/// gather phase and never read the list back.
pub struct RenderPipeline {
    device: Box<dyn GraphicsDevice>,
    config: RenderPipelineConfig,
    render_list: RenderList,
    effects: EffectRegistry,
    materials: MaterialRegistry,
    buffers: UniformBuffers,
    shadow_map: TextureHandle,
    owned: Vec<OwnedResource>,
    build_observers: Vec<BuildListObserver>,
    render_2d_observers: Vec<Render2dObserver>,
}

impl RenderPipeline {
    /// Create a pipeline, allocating all GPU-side resources up front
    ///
    /// # Errors
    /// Propagates the first resource-creation failure. The pipeline never
    /// partially constructs: resources created before the failure are
    /// released, in reverse order, before this returns.
    pub fn new(
        mut device: Box<dyn GraphicsDevice>,
        config: RenderPipelineConfig,
    ) -> RenderResult<Self> {
        let mut owned = Vec::new();

        match Self::create_resources(device.as_mut(), &config, &mut owned) {
            Ok((buffers, shadow_map)) => {
                debug!("render pipeline created with {} owned resources", owned.len());
                Ok(Self {
                    device,
                    config,
                    render_list: RenderList::new(),
                    effects: EffectRegistry::new(),
                    materials: MaterialRegistry::new(),
                    buffers,
                    shadow_map,
                    owned,
                    build_observers: Vec::new(),
                    render_2d_observers: Vec::new(),
                })
            }
            Err(error) => {
                release_resources(device.as_mut(), &mut owned);
                Err(RenderError::InitializationFailed(error.to_string()))
            }
        }
    }

    fn create_resources(
        device: &mut dyn GraphicsDevice,
        config: &RenderPipelineConfig,
        owned: &mut Vec<OwnedResource>,
    ) -> RenderResult<(UniformBuffers, TextureHandle)> {
        let mut uniform = |device: &mut dyn GraphicsDevice,
                           owned: &mut Vec<OwnedResource>,
                           len: usize|
         -> RenderResult<BufferHandle> {
            let handle = device.create_uniform_buffer(len)?;
            owned.push(OwnedResource::Buffer(handle));
            Ok(handle)
        };

        let buffers = UniformBuffers {
            shared_frame: uniform(device, owned, std::mem::size_of::<SharedFrameUniforms>())?,
            frame_matrices: uniform(device, owned, std::mem::size_of::<FrameMatrixUniforms>())?,
            object: uniform(device, owned, std::mem::size_of::<ObjectUniforms>())?,
            terrain_lighting: uniform(
                device,
                owned,
                std::mem::size_of::<crate::render::lighting::LightingConstants>(),
            )?,
            object_lighting: uniform(
                device,
                owned,
                std::mem::size_of::<crate::render::lighting::LightingConstants>(),
            )?,
        };

        let shadow_map =
            device.create_render_target(config.shadow_map_size, config.shadow_map_size)?;
        owned.push(OwnedResource::Texture(shadow_map));

        Ok((buffers, shadow_map))
    }

    /// The pipeline's configuration
    pub const fn config(&self) -> &RenderPipelineConfig {
        &self.config
    }

    /// The shadow-map render target owned by this pipeline
    pub const fn shadow_map(&self) -> TextureHandle {
        self.shadow_map
    }

    /// Register an effect descriptor
    pub fn register_effect(&mut self, effect: Effect) -> EffectKey {
        self.effects.register(effect)
    }

    /// Register a material
    pub fn register_material(&mut self, material: Material) -> MaterialKey {
        self.materials.register(material)
    }

    /// Registered effects
    pub const fn effects(&self) -> &EffectRegistry {
        &self.effects
    }

    /// Registered materials
    pub const fn materials(&self) -> &MaterialRegistry {
        &self.materials
    }

    /// Register a "building render list" observer
    ///
    /// Observers run synchronously on the rendering thread, in registration
    /// order, at the end of the gather phase. They may append items but
    /// must not recurse into frame submission. Only call this outside
    /// `execute`.
    pub fn add_build_list_observer(&mut self, observer: BuildListObserver) {
        self.build_observers.push(observer);
    }

    /// Register a "rendering 2D" observer, invoked during the overlay pass
    ///
    /// Same ordering and threading rules as
    /// [`add_build_list_observer`](Self::add_build_list_observer).
    pub fn add_render_2d_observer(&mut self, observer: Render2dObserver) {
        self.render_2d_observers.push(observer);
    }

    /// Render one frame
    ///
    /// # Errors
    /// Any device error during frame setup, submission, the overlay pass or
    /// present is fatal for this frame and propagates after the command
    /// recording is closed. There is no retry: the next call starts the
    /// state machine over from the gather phase unconditionally.
    pub fn execute(&mut self, mut frame: FrameContext<'_>) -> RenderResult<()> {
        // Step 1: gather. No device commands are recorded yet.
        self.render_list.clear();
        if let Some(scene) = frame.scene.as_mut() {
            scene.build_render_list(&mut self.render_list, frame.camera);
        }
        for system in frame.systems.iter_mut() {
            system.build_render_list(&mut self.render_list);
        }
        for observer in &mut self.build_observers {
            observer(&mut self.render_list, frame.camera);
        }
        trace!("gathered {} render items", self.render_list.len());

        // Steps 2-5 run inside the recording bracket. end_recording is
        // guaranteed before any error propagates; the bracket does not
        // swallow the error.
        self.device.begin_recording()?;
        let recorded = self.record_frame(&mut frame);
        self.device.end_recording();
        recorded?;

        // Step 6: submit and present.
        self.device.present()
    }

    /// Steps 2-5 of the frame state machine
    fn record_frame(&mut self, frame: &mut FrameContext<'_>) -> RenderResult<()> {
        let (viewport_width, viewport_height) = frame.camera.viewport;

        // Step 2: frame setup.
        self.device.bind_output_target()?;
        self.device.clear(
            ClearFlags::COLOR | ClearFlags::DEPTH | ClearFlags::STENCIL,
            self.config.clear_color,
            self.config.depth_clear,
        )?;
        self.device.set_viewport(viewport_width, viewport_height);

        // Step 3: shared uniforms, uploaded unconditionally once per frame.
        self.upload_frame_uniforms(frame)?;

        let cloud_shadow = resolve_cloud_shadow(frame, self.device.as_ref());
        let frustum = self
            .config
            .enable_frustum_culling
            .then(|| frame.camera.frustum());
        let view = frame.camera.view_matrix();

        // Step 4: per-bucket cull + sort + submit, Opaque then Transparent.
        for bucket in Bucket::PROCESSING_ORDER {
            let pending = self.render_list.bucket_mut(bucket);
            pending.cull(frustum.as_ref());
            if pending.visible().is_empty() {
                continue;
            }
            sort_visible(bucket, pending.visible_mut(), &view);

            let Self {
                device,
                render_list,
                effects,
                materials,
                buffers,
                ..
            } = self;
            submit_bucket(
                device.as_mut(),
                effects,
                materials,
                buffers,
                render_list.bucket(bucket).visible(),
                cloud_shadow,
            )?;
        }

        // Step 5: 2D overlay pass.
        self.device.begin_2d(viewport_width, viewport_height)?;
        {
            let mut context =
                Context2d::new(self.device.as_mut(), viewport_width, viewport_height);
            if let Some(scene) = frame.scene.as_mut() {
                scene.render_overlay(&mut context);
            }
            if let Some(overlay) = frame.overlay.as_mut() {
                overlay.render(&mut context);
            }
            for observer in &mut self.render_2d_observers {
                observer(&mut context);
            }
        }
        self.device.end_2d();

        Ok(())
    }

    /// Upload the shared per-frame uniform blocks
    ///
    /// Both lighting classes are uploaded every frame whether or not any
    /// material uses them: the cost is two small constant writes, which is
    /// cheaper than tracking dirtiness at this granularity.
    fn upload_frame_uniforms(&mut self, frame: &FrameContext<'_>) -> RenderResult<()> {
        let camera = frame.camera;
        let eye = camera.eye_position();
        let (viewport_width, viewport_height) = camera.viewport;

        let shared = SharedFrameUniforms {
            camera_position: [eye.x, eye.y, eye.z, 1.0],
            elapsed_seconds: frame.elapsed_seconds,
            _padding: [0.0; 3],
        };
        self.device
            .write_buffer(self.buffers.shared_frame, bytemuck::bytes_of(&shared))?;

        let matrices = FrameMatrixUniforms {
            view_projection: camera.view_projection().into(),
            viewport: [viewport_width as f32, viewport_height as f32],
            _padding: [0.0; 2],
        };
        self.device
            .write_buffer(self.buffers.frame_matrices, bytemuck::bytes_of(&matrices))?;

        let lighting = frame
            .scene
            .as_ref()
            .map_or_else(SceneLighting::default, |scene| scene.lighting());
        self.device.write_buffer(
            self.buffers.terrain_lighting,
            bytemuck::bytes_of(&lighting.terrain),
        )?;
        self.device.write_buffer(
            self.buffers.object_lighting,
            bytemuck::bytes_of(&lighting.object),
        )?;

        Ok(())
    }
}

impl Drop for RenderPipeline {
    fn drop(&mut self) {
        release_resources(self.device.as_mut(), &mut self.owned);
    }
}

/// Release owned resources in reverse-construction order
fn release_resources(device: &mut dyn GraphicsDevice, owned: &mut Vec<OwnedResource>) {
    while let Some(resource) = owned.pop() {
        match resource {
            OwnedResource::Buffer(buffer) => device.destroy_buffer(buffer),
            OwnedResource::Texture(texture) => device.destroy_texture(texture),
        }
    }
}

/// Resolve the environment-driven cloud-shadow texture for this frame
///
/// Falls back to the device's opaque-white texture when no scene, terrain
/// or cloud-shadow map is active, so effects can sample the slot
/// unconditionally.
fn resolve_cloud_shadow(
    frame: &FrameContext<'_>,
    device: &dyn GraphicsDevice,
) -> TextureHandle {
    frame
        .scene
        .as_ref()
        .filter(|scene| scene.lighting().cloud_shadows_enabled)
        .and_then(|scene| scene.terrain())
        .and_then(|terrain| terrain.cloud_shadow_texture())
        .unwrap_or_else(|| device.white_texture())
}

/// Sort a bucket's visible items for submission
///
/// Opaque items group by (effect, material, primary vertex buffer) so
/// consecutive duplicates are adjacent and expensive transitions are
/// skipped. Transparent items sort back-to-front by view-space depth for
/// blending correctness, with the state key as a deterministic tie-break —
/// correctness wins over batching for that bucket.
fn sort_visible(bucket: Bucket, items: &mut [RenderItem], view: &Mat4) {
    match bucket {
        Bucket::Opaque => items.sort_by_key(RenderItem::state_key),
        Bucket::Transparent => items.sort_by(|a, b| {
            let depth_a = view_depth(view, &a.world);
            let depth_b = view_depth(view, &b.world);
            depth_b
                .total_cmp(&depth_a)
                .then_with(|| a.state_key().cmp(&b.state_key()))
        }),
    }
}

/// View-space depth of an item's world-space origin (positive in front)
fn view_depth(view: &Mat4, world: &Mat4) -> f32 {
    let position = Vec4::new(world[(0, 3)], world[(1, 3)], world[(2, 3)], 1.0);
    -(view * position).z
}

/// Stream-submit a sorted item sequence with state-change minimization
///
/// Compares each item against the previous one field-by-field and only
/// reissues the expensive operation whose field differs. The remaining
/// material parameters and the draw call itself are issued for every item.
fn submit_bucket(
    device: &mut dyn GraphicsDevice,
    effects: &EffectRegistry,
    materials: &MaterialRegistry,
    buffers: &UniformBuffers,
    items: &[RenderItem],
    cloud_shadow: TextureHandle,
) -> RenderResult<()> {
    let mut last: Option<SubmittedState> = None;

    for item in items {
        let material = materials.get(item.material).ok_or_else(|| {
            RenderError::RenderingFailed("render item references an unregistered material".into())
        })?;
        let effect = effects.get(item.effect).ok_or_else(|| {
            RenderError::RenderingFailed("render item references an unregistered effect".into())
        })?;

        let effect_changed = last.as_ref().map_or(true, |l| l.effect != item.effect);
        if effect_changed {
            device.begin_effect(item.effect)?;
            device.bind_uniform_buffer(SHARED_FRAME_SLOT, buffers.shared_frame);
            device.bind_uniform_buffer(FRAME_MATRIX_SLOT, buffers.frame_matrices);
            match material.lighting {
                LightingClass::Terrain => {
                    device.bind_uniform_buffer(LIGHTING_SLOT, buffers.terrain_lighting);
                }
                LightingClass::Object => {
                    device.bind_uniform_buffer(LIGHTING_SLOT, buffers.object_lighting);
                }
                LightingClass::None => {}
            }
            device.bind_texture(CLOUD_SHADOW_TEXTURE_SLOT, cloud_shadow);
        }

        let material_changed = last.as_ref().map_or(true, |l| l.material != item.material);
        if material_changed {
            device.apply_pipeline_state(&material.state);
        }

        let primary_changed = last
            .as_ref()
            .map_or(true, |l| l.vertex_buffers[0] != item.vertex_buffers[0]);
        if primary_changed {
            if let Some(buffer) = item.vertex_buffers[0] {
                device.bind_vertex_buffer(0, buffer);
            }
        }
        if let Some(buffer) = item.vertex_buffers[1] {
            let secondary_changed = last
                .as_ref()
                .map_or(true, |l| l.vertex_buffers[1] != item.vertex_buffers[1]);
            if secondary_changed {
                device.bind_vertex_buffer(1, buffer);
            }
        }

        let world_changed = last.as_ref().map_or(true, |l| l.world != item.world);
        if world_changed {
            let object = ObjectUniforms {
                world: item.world.into(),
            };
            device.write_buffer(buffers.object, bytemuck::bytes_of(&object))?;
            if effect.has_object_uniforms {
                device.bind_uniform_buffer(OBJECT_SLOT, buffers.object);
            }
        }

        for &(slot, texture) in &material.textures {
            device.bind_texture(slot, texture);
        }
        match item.kind {
            DrawKind::Linear => device.draw(item.vertex_count, item.first_vertex)?,
            DrawKind::Indexed => {
                let index_buffer = item.index_buffer.ok_or_else(|| {
                    RenderError::RenderingFailed(
                        "indexed render item carries no index buffer".into(),
                    )
                })?;
                device.bind_index_buffer(index_buffer);
                device.draw_indexed(item.index_count, item.first_index, item.first_vertex as i32)?;
            }
        }

        last = Some(SubmittedState {
            effect: item.effect,
            material: item.material,
            vertex_buffers: item.vertex_buffers,
            world: item.world,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::collision::{Aabb, Rect};
    use crate::foundation::math::Vec3;
    use crate::render::device::IndexBufferHandle;
    use crate::render::item::RenderItem;
    use crate::render::materials::PipelineState;
    use crate::scene::TerrainSurface;

    #[derive(Debug, Clone, PartialEq)]
    enum DeviceCall {
        CreateUniformBuffer(u64),
        CreateRenderTarget(u64),
        DestroyBuffer(u64),
        DestroyTexture(u64),
        BeginRecording,
        EndRecording,
        Present,
        BindOutputTarget,
        Clear,
        SetViewport(u32, u32),
        WriteBuffer(u64, usize),
        BindUniformBuffer(u32, u64),
        BeginEffect(EffectKey),
        ApplyPipelineState,
        BindTexture(u32, u64),
        BindVertexBuffer(u32, u64),
        BindIndexBuffer(u64),
        Draw(u32, u32),
        DrawIndexed(u32, u32, i32),
        Begin2d,
        DrawQuad2d,
        End2d,
    }

    /// Instrumented stand-in device that logs every call it receives
    struct RecordingDevice {
        calls: Rc<RefCell<Vec<DeviceCall>>>,
        next_handle: u64,
        allowed_creations: Option<usize>,
        created: usize,
        fail_draws: bool,
    }

    impl RecordingDevice {
        fn new(calls: Rc<RefCell<Vec<DeviceCall>>>) -> Self {
            Self {
                calls,
                next_handle: 0,
                allowed_creations: None,
                created: 0,
                fail_draws: false,
            }
        }

        fn record(&self, call: DeviceCall) {
            self.calls.borrow_mut().push(call);
        }

        fn allocate(&mut self) -> RenderResult<u64> {
            if let Some(limit) = self.allowed_creations {
                if self.created >= limit {
                    return Err(RenderError::ResourceCreationFailed(
                        "out of device memory".into(),
                    ));
                }
            }
            self.created += 1;
            self.next_handle += 1;
            Ok(self.next_handle)
        }
    }

    impl GraphicsDevice for RecordingDevice {
        fn create_uniform_buffer(&mut self, _len: usize) -> RenderResult<BufferHandle> {
            let handle = self.allocate()?;
            self.record(DeviceCall::CreateUniformBuffer(handle));
            Ok(BufferHandle(handle))
        }

        fn create_render_target(
            &mut self,
            _width: u32,
            _height: u32,
        ) -> RenderResult<TextureHandle> {
            let handle = self.allocate()?;
            self.record(DeviceCall::CreateRenderTarget(handle));
            Ok(TextureHandle(handle))
        }

        fn destroy_buffer(&mut self, buffer: BufferHandle) {
            self.record(DeviceCall::DestroyBuffer(buffer.0));
        }

        fn destroy_texture(&mut self, texture: TextureHandle) {
            self.record(DeviceCall::DestroyTexture(texture.0));
        }

        fn white_texture(&self) -> TextureHandle {
            TextureHandle(0)
        }

        fn begin_recording(&mut self) -> RenderResult<()> {
            self.record(DeviceCall::BeginRecording);
            Ok(())
        }

        fn end_recording(&mut self) {
            self.record(DeviceCall::EndRecording);
        }

        fn present(&mut self) -> RenderResult<()> {
            self.record(DeviceCall::Present);
            Ok(())
        }

        fn bind_output_target(&mut self) -> RenderResult<()> {
            self.record(DeviceCall::BindOutputTarget);
            Ok(())
        }

        fn clear(&mut self, _flags: ClearFlags, _color: [f32; 4], _depth: f32) -> RenderResult<()> {
            self.record(DeviceCall::Clear);
            Ok(())
        }

        fn set_viewport(&mut self, width: u32, height: u32) {
            self.record(DeviceCall::SetViewport(width, height));
        }

        fn write_buffer(&mut self, buffer: BufferHandle, data: &[u8]) -> RenderResult<()> {
            self.record(DeviceCall::WriteBuffer(buffer.0, data.len()));
            Ok(())
        }

        fn bind_uniform_buffer(&mut self, slot: u32, buffer: BufferHandle) {
            self.record(DeviceCall::BindUniformBuffer(slot, buffer.0));
        }

        fn begin_effect(&mut self, effect: EffectKey) -> RenderResult<()> {
            self.record(DeviceCall::BeginEffect(effect));
            Ok(())
        }

        fn apply_pipeline_state(&mut self, _state: &PipelineState) {
            self.record(DeviceCall::ApplyPipelineState);
        }

        fn bind_texture(&mut self, slot: u32, texture: TextureHandle) {
            self.record(DeviceCall::BindTexture(slot, texture.0));
        }

        fn bind_vertex_buffer(&mut self, slot: u32, buffer: VertexBufferHandle) {
            self.record(DeviceCall::BindVertexBuffer(slot, buffer.0));
        }

        fn bind_index_buffer(&mut self, buffer: IndexBufferHandle) {
            self.record(DeviceCall::BindIndexBuffer(buffer.0));
        }

        fn draw(&mut self, vertex_count: u32, first_vertex: u32) -> RenderResult<()> {
            if self.fail_draws {
                return Err(RenderError::DeviceError("draw call rejected".into()));
            }
            self.record(DeviceCall::Draw(vertex_count, first_vertex));
            Ok(())
        }

        fn draw_indexed(
            &mut self,
            index_count: u32,
            first_index: u32,
            vertex_offset: i32,
        ) -> RenderResult<()> {
            if self.fail_draws {
                return Err(RenderError::DeviceError("draw call rejected".into()));
            }
            self.record(DeviceCall::DrawIndexed(index_count, first_index, vertex_offset));
            Ok(())
        }

        fn begin_2d(&mut self, _width: u32, _height: u32) -> RenderResult<()> {
            self.record(DeviceCall::Begin2d);
            Ok(())
        }

        fn draw_quad_2d(
            &mut self,
            _rect: &Rect,
            _texture: Option<TextureHandle>,
            _color: [f32; 4],
        ) {
            self.record(DeviceCall::DrawQuad2d);
        }

        fn end_2d(&mut self) {
            self.record(DeviceCall::End2d);
        }
    }

    fn pipeline_with_log() -> (RenderPipeline, Rc<RefCell<Vec<DeviceCall>>>) {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let device = Box::new(RecordingDevice::new(Rc::clone(&calls)));
        let pipeline = RenderPipeline::new(device, RenderPipelineConfig::default())
            .expect("construction must succeed");
        (pipeline, calls)
    }

    fn register_solid(
        pipeline: &mut RenderPipeline,
        has_object_uniforms: bool,
    ) -> (EffectKey, MaterialKey) {
        let effect = pipeline.register_effect(Effect {
            name: "solid".to_string(),
            has_object_uniforms,
        });
        let material = pipeline.register_material(Material {
            effect,
            state: PipelineState::default(),
            lighting: LightingClass::Object,
            textures: Vec::new(),
        });
        (effect, material)
    }

    fn item_at(effect: EffectKey, material: MaterialKey, z: f32, vertex_count: u32) -> RenderItem {
        RenderItem::linear(
            effect,
            material,
            VertexBufferHandle(100),
            vertex_count,
            Mat4::new_translation(&Vec3::new(0.0, 0.0, z)),
            Aabb::from_center_extents(Vec3::new(0.0, 0.0, z), Vec3::new(0.5, 0.5, 0.5)),
        )
    }

    fn test_camera() -> Camera {
        Camera::perspective(
            Vec3::new(0.0, 0.0, 5.0),
            Vec3::zeros(),
            Vec3::y(),
            60.0,
            (800, 600),
            0.1,
            100.0,
        )
    }

    fn push_items(pipeline: &mut RenderPipeline, bucket: Bucket, items: Vec<RenderItem>) {
        pipeline.add_build_list_observer(Box::new(move |list, _| {
            for item in &items {
                list.push(bucket, *item);
            }
        }));
    }

    fn run_frame(pipeline: &mut RenderPipeline, camera: &Camera) -> RenderResult<()> {
        pipeline.execute(FrameContext {
            scene: None,
            overlay: None,
            systems: &mut [],
            camera,
            elapsed_seconds: 1.5,
        })
    }

    struct TestTerrain(TextureHandle);

    impl TerrainSurface for TestTerrain {
        fn cloud_shadow_texture(&self) -> Option<TextureHandle> {
            Some(self.0)
        }
    }

    struct TestScene {
        terrain: TestTerrain,
        lighting: SceneLighting,
    }

    impl Scene for TestScene {
        fn build_render_list(&mut self, _list: &mut RenderList, _camera: &Camera) {}

        fn lighting(&self) -> SceneLighting {
            self.lighting
        }

        fn terrain(&self) -> Option<&dyn TerrainSurface> {
            Some(&self.terrain)
        }
    }

    #[test]
    fn test_construction_creates_uniform_buffers_and_shadow_target() {
        let (_pipeline, calls) = pipeline_with_log();
        let calls = calls.borrow();

        let buffers = calls
            .iter()
            .filter(|c| matches!(c, DeviceCall::CreateUniformBuffer(_)))
            .count();
        let targets = calls
            .iter()
            .filter(|c| matches!(c, DeviceCall::CreateRenderTarget(_)))
            .count();
        assert_eq!(buffers, 5);
        assert_eq!(targets, 1);
    }

    #[test]
    fn test_failed_construction_releases_partial_resources_in_reverse() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let mut device = RecordingDevice::new(Rc::clone(&calls));
        device.allowed_creations = Some(3);

        let result = RenderPipeline::new(Box::new(device), RenderPipelineConfig::default());
        assert!(matches!(result, Err(RenderError::InitializationFailed(_))));

        let calls = calls.borrow();
        let destroys: Vec<&DeviceCall> = calls
            .iter()
            .filter(|c| matches!(c, DeviceCall::DestroyBuffer(_) | DeviceCall::DestroyTexture(_)))
            .collect();
        assert_eq!(
            destroys,
            vec![
                &DeviceCall::DestroyBuffer(3),
                &DeviceCall::DestroyBuffer(2),
                &DeviceCall::DestroyBuffer(1),
            ]
        );
    }

    #[test]
    fn test_empty_frame_clears_uploads_and_presents() {
        let (mut pipeline, calls) = pipeline_with_log();
        let start = calls.borrow().len();

        run_frame(&mut pipeline, &test_camera()).expect("empty frame must render");

        let calls = calls.borrow();
        let frame = &calls[start..];
        assert_eq!(frame.first(), Some(&DeviceCall::BeginRecording));
        assert!(frame.contains(&DeviceCall::BindOutputTarget));
        assert!(frame.contains(&DeviceCall::Clear));
        assert!(frame.contains(&DeviceCall::SetViewport(800, 600)));

        // Shared, matrices and both lighting classes: four unconditional
        // uploads even with nothing to draw.
        let writes = frame
            .iter()
            .filter(|c| matches!(c, DeviceCall::WriteBuffer(_, _)))
            .count();
        assert_eq!(writes, 4);

        assert!(!frame.iter().any(|c| matches!(c, DeviceCall::Draw(_, _))));
        assert_eq!(frame.last(), Some(&DeviceCall::Present));
    }

    #[test]
    fn test_same_effect_items_share_one_begin_effect() {
        let (mut pipeline, calls) = pipeline_with_log();
        let (effect, material) = register_solid(&mut pipeline, true);
        push_items(
            &mut pipeline,
            Bucket::Opaque,
            vec![
                item_at(effect, material, 0.0, 3),
                item_at(effect, material, -2.0, 6),
            ],
        );

        let start = calls.borrow().len();
        run_frame(&mut pipeline, &test_camera()).unwrap();

        let calls = calls.borrow();
        let frame = &calls[start..];
        let begins = frame
            .iter()
            .filter(|c| matches!(c, DeviceCall::BeginEffect(_)))
            .count();
        let draws = frame
            .iter()
            .filter(|c| matches!(c, DeviceCall::Draw(_, _)))
            .count();
        assert_eq!(begins, 1);
        assert_eq!(draws, 2);

        // Lighting stays at two uploads (Terrain + Object) no matter how
        // many items are drawn; buffers 4 and 5 are the lighting buffers.
        let lighting_writes = frame
            .iter()
            .filter(|c| matches!(c, DeviceCall::WriteBuffer(b, _) if *b == 4 || *b == 5))
            .count();
        assert_eq!(lighting_writes, 2);
    }

    #[test]
    fn test_effect_change_restarts_the_effect() {
        let (mut pipeline, calls) = pipeline_with_log();
        let (effect_a, material_a) = register_solid(&mut pipeline, true);
        let (effect_b, material_b) = register_solid(&mut pipeline, true);
        push_items(
            &mut pipeline,
            Bucket::Opaque,
            vec![
                item_at(effect_a, material_a, 0.0, 3),
                item_at(effect_b, material_b, -2.0, 6),
            ],
        );

        let start = calls.borrow().len();
        run_frame(&mut pipeline, &test_camera()).unwrap();

        let calls = calls.borrow();
        let begins = calls[start..]
            .iter()
            .filter(|c| matches!(c, DeviceCall::BeginEffect(_)))
            .count();
        assert_eq!(begins, 2);
    }

    #[test]
    fn test_object_uniforms_upload_only_when_world_changes() {
        // The per-object buffer is the third one created.
        let object_buffer = 3;

        let (mut pipeline, calls) = pipeline_with_log();
        let (effect, material) = register_solid(&mut pipeline, true);
        push_items(
            &mut pipeline,
            Bucket::Opaque,
            vec![
                item_at(effect, material, 0.0, 3),
                item_at(effect, material, 0.0, 6),
            ],
        );

        let start = calls.borrow().len();
        run_frame(&mut pipeline, &test_camera()).unwrap();
        let same_world_writes = calls.borrow()[start..]
            .iter()
            .filter(|c| matches!(c, DeviceCall::WriteBuffer(b, _) if *b == object_buffer))
            .count();
        assert_eq!(same_world_writes, 1);

        let (mut pipeline, calls) = pipeline_with_log();
        let (effect, material) = register_solid(&mut pipeline, true);
        push_items(
            &mut pipeline,
            Bucket::Opaque,
            vec![
                item_at(effect, material, 0.0, 3),
                item_at(effect, material, -2.0, 6),
            ],
        );

        let start = calls.borrow().len();
        run_frame(&mut pipeline, &test_camera()).unwrap();
        let differing_world_writes = calls.borrow()[start..]
            .iter()
            .filter(|c| matches!(c, DeviceCall::WriteBuffer(b, _) if *b == object_buffer))
            .count();
        assert_eq!(differing_world_writes, 2);
    }

    #[test]
    fn test_opaque_draws_before_transparent() {
        let (mut pipeline, calls) = pipeline_with_log();
        let (effect, material) = register_solid(&mut pipeline, true);
        push_items(
            &mut pipeline,
            Bucket::Transparent,
            vec![item_at(effect, material, 0.0, 7)],
        );
        push_items(
            &mut pipeline,
            Bucket::Opaque,
            vec![item_at(effect, material, 0.0, 3)],
        );

        let start = calls.borrow().len();
        run_frame(&mut pipeline, &test_camera()).unwrap();

        let calls = calls.borrow();
        let draws: Vec<u32> = calls[start..]
            .iter()
            .filter_map(|c| match c {
                DeviceCall::Draw(count, _) => Some(*count),
                _ => None,
            })
            .collect();
        assert_eq!(draws, vec![3, 7]);
    }

    #[test]
    fn test_transparent_draws_back_to_front() {
        let (mut pipeline, calls) = pipeline_with_log();
        let (effect, material) = register_solid(&mut pipeline, true);
        // Camera sits at z=5 looking toward -z; larger distance first.
        push_items(
            &mut pipeline,
            Bucket::Transparent,
            vec![
                item_at(effect, material, 0.0, 10),
                item_at(effect, material, -5.0, 20),
                item_at(effect, material, 2.0, 30),
            ],
        );

        let start = calls.borrow().len();
        run_frame(&mut pipeline, &test_camera()).unwrap();

        let calls = calls.borrow();
        let draws: Vec<u32> = calls[start..]
            .iter()
            .filter_map(|c| match c {
                DeviceCall::Draw(count, _) => Some(*count),
                _ => None,
            })
            .collect();
        assert_eq!(draws, vec![20, 10, 30]);
    }

    #[test]
    fn test_mid_frame_error_closes_recording_without_present() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let mut device = RecordingDevice::new(Rc::clone(&calls));
        device.fail_draws = true;

        let mut pipeline =
            RenderPipeline::new(Box::new(device), RenderPipelineConfig::default()).unwrap();
        let (effect, material) = register_solid(&mut pipeline, true);
        push_items(
            &mut pipeline,
            Bucket::Opaque,
            vec![item_at(effect, material, 0.0, 3)],
        );

        let result = run_frame(&mut pipeline, &test_camera());
        assert!(matches!(result, Err(RenderError::DeviceError(_))));

        let calls = calls.borrow();
        assert!(calls.contains(&DeviceCall::EndRecording));
        assert!(!calls.contains(&DeviceCall::Present));
    }

    #[test]
    fn test_drop_releases_resources_in_reverse_creation_order() {
        let (pipeline, calls) = pipeline_with_log();
        drop(pipeline);

        let calls = calls.borrow();
        let destroys: Vec<&DeviceCall> = calls
            .iter()
            .filter(|c| matches!(c, DeviceCall::DestroyBuffer(_) | DeviceCall::DestroyTexture(_)))
            .collect();
        assert_eq!(
            destroys,
            vec![
                &DeviceCall::DestroyTexture(6),
                &DeviceCall::DestroyBuffer(5),
                &DeviceCall::DestroyBuffer(4),
                &DeviceCall::DestroyBuffer(3),
                &DeviceCall::DestroyBuffer(2),
                &DeviceCall::DestroyBuffer(1),
            ]
        );
    }

    #[test]
    fn test_cloud_shadow_slot_falls_back_to_white_texture() {
        let (mut pipeline, calls) = pipeline_with_log();
        let (effect, material) = register_solid(&mut pipeline, true);
        push_items(
            &mut pipeline,
            Bucket::Opaque,
            vec![item_at(effect, material, 0.0, 3)],
        );

        let start = calls.borrow().len();
        run_frame(&mut pipeline, &test_camera()).unwrap();

        let calls = calls.borrow();
        assert!(calls[start..].contains(&DeviceCall::BindTexture(CLOUD_SHADOW_TEXTURE_SLOT, 0)));
    }

    #[test]
    fn test_cloud_shadow_slot_binds_terrain_texture_when_enabled() {
        let (mut pipeline, calls) = pipeline_with_log();
        let (effect, material) = register_solid(&mut pipeline, true);
        push_items(
            &mut pipeline,
            Bucket::Opaque,
            vec![item_at(effect, material, 0.0, 3)],
        );

        let mut scene = TestScene {
            terrain: TestTerrain(TextureHandle(42)),
            lighting: SceneLighting {
                cloud_shadows_enabled: true,
                ..SceneLighting::default()
            },
        };

        let camera = test_camera();
        let start = calls.borrow().len();
        pipeline
            .execute(FrameContext {
                scene: Some(&mut scene),
                overlay: None,
                systems: &mut [],
                camera: &camera,
                elapsed_seconds: 0.0,
            })
            .unwrap();

        let calls = calls.borrow();
        assert!(calls[start..].contains(&DeviceCall::BindTexture(CLOUD_SHADOW_TEXTURE_SLOT, 42)));
    }

    #[test]
    fn test_out_of_frustum_items_issue_no_draws() {
        let (mut pipeline, calls) = pipeline_with_log();
        let (effect, material) = register_solid(&mut pipeline, true);
        // Behind the camera, which sits at z=5 looking toward -z.
        push_items(
            &mut pipeline,
            Bucket::Opaque,
            vec![item_at(effect, material, 20.0, 3)],
        );

        let start = calls.borrow().len();
        run_frame(&mut pipeline, &test_camera()).unwrap();

        let calls = calls.borrow();
        assert!(!calls[start..]
            .iter()
            .any(|c| matches!(c, DeviceCall::Draw(_, _))));
    }

    #[test]
    fn test_render_2d_observer_runs_inside_overlay_pass() {
        let (mut pipeline, calls) = pipeline_with_log();
        pipeline.add_render_2d_observer(Box::new(|context| {
            context.fill_rect(&Rect::new(10.0, 10.0, 64.0, 16.0), [1.0, 0.0, 0.0, 1.0]);
        }));

        let start = calls.borrow().len();
        run_frame(&mut pipeline, &test_camera()).unwrap();

        let calls = calls.borrow();
        let frame = &calls[start..];
        let begin = frame.iter().position(|c| *c == DeviceCall::Begin2d).unwrap();
        let quad = frame.iter().position(|c| *c == DeviceCall::DrawQuad2d).unwrap();
        let end = frame.iter().position(|c| *c == DeviceCall::End2d).unwrap();
        assert!(begin < quad && quad < end);
    }

    #[test]
    fn test_config_parses_partial_toml_with_defaults() {
        let config = RenderPipelineConfig::from_toml_str(
            "clear_color = [0.1, 0.2, 0.3, 1.0]\nshadow_map_size = 1024\n",
        )
        .unwrap();

        assert_eq!(config.clear_color, [0.1, 0.2, 0.3, 1.0]);
        assert_eq!(config.shadow_map_size, 1024);
        assert!(config.enable_frustum_culling);
        assert!((config.depth_clear - 1.0).abs() < f32::EPSILON);
    }
}
