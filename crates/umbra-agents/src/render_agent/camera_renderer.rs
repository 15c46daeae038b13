// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Renders one camera per call.

use super::diagnostics::{NoDiagnostics, RenderDiagnostics};
use std::borrow::Cow;
use umbra_core::lane::{Lane, LaneKind};
use umbra_core::math::{LinearRgba, Vec4};
use umbra_core::renderer::settings::{
    BatchingFlags, BlendMode, CameraBufferSettings, ColorLutResolution, FinalBlendMode,
    PostFxSettings, ShadowSettings,
};
use umbra_core::renderer::{
    execute_and_clear, BlitMaterial, Camera, CameraType, ClearFlags, CommandBuffer,
    CullingResults, DrawingSettings, FilteringSettings, GizmoSubset, LoadAction, PerObjectData,
    RenderContext, RenderQueueRange, RenderTarget, ShaderPropertyId, SortingCriteria,
    StoreAction, TemporaryTextureDesc, TextureFormat, LIT_SHADER_TAG, UNLIT_SHADER_TAG,
};
use umbra_lanes::lighting_lane::{Lighting, LightingArena, LightingOptions};
use umbra_lanes::post_fx_lane::{PostFxFrame, PostFxStack};

/// Smallest supported render scale.
pub const RENDER_SCALE_MIN: f32 = 0.1;
/// Largest supported render scale.
pub const RENDER_SCALE_MAX: f32 = 2.0;

/// Shader property handles written by the camera renderer.
pub mod ids {
    use umbra_core::renderer::ShaderPropertyId;

    /// Intermediate color buffer.
    pub const CAMERA_COLOR_ATTACHMENT: ShaderPropertyId =
        ShaderPropertyId::from_name("_CameraColorAttachment");
    /// Intermediate depth buffer.
    pub const CAMERA_DEPTH_ATTACHMENT: ShaderPropertyId =
        ShaderPropertyId::from_name("_CameraDepthAttachment");
    /// Copy of the opaque color, sampled by transparent shaders.
    pub const CAMERA_COLOR_TEXTURE: ShaderPropertyId =
        ShaderPropertyId::from_name("_CameraColorTexture");
    /// Copy of the opaque depth, sampled by transparent shaders.
    pub const CAMERA_DEPTH_TEXTURE: ShaderPropertyId =
        ShaderPropertyId::from_name("_CameraDepthTexture");
    /// `(1/w, 1/h, w, h)` of the intermediate buffer.
    pub const CAMERA_BUFFER_SIZE: ShaderPropertyId =
        ShaderPropertyId::from_name("_CameraBufferSize");
    /// Input of the camera copy material.
    pub const SOURCE_TEXTURE: ShaderPropertyId = ShaderPropertyId::from_name("_SourceTexture");
    /// Source blend factor of the final copy.
    pub const CAMERA_SRC_BLEND: ShaderPropertyId = ShaderPropertyId::from_name("_CameraSrcBlend");
    /// Destination blend factor of the final copy.
    pub const CAMERA_DST_BLEND: ShaderPropertyId = ShaderPropertyId::from_name("_CameraDstBlend");
}

use self::ids::*;

/// Decisions taken for the camera currently being rendered.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CameraFrameState {
    /// Size of the buffers the camera renders into.
    pub buffer_size: (u32, u32),
    /// Whether the intermediate buffers are HDR.
    pub use_hdr: bool,
    /// Whether the buffer size differs from the camera's pixel size.
    pub use_scaled_rendering: bool,
    /// Whether opaque color is copied for transparent shaders.
    pub use_color_texture: bool,
    /// Whether opaque depth is copied for transparent shaders.
    pub use_depth_texture: bool,
    /// Whether the camera renders into intermediate attachments.
    pub use_intermediate_buffer: bool,
}

/// Renders cameras one at a time.
///
/// Owns the lanes and the light tables they fill, so nothing is allocated per
/// camera once the first frame has run.
pub struct CameraRenderer {
    buffer: CommandBuffer,
    sample_name: Cow<'static, str>,
    lighting: Lighting,
    post_fx: PostFxStack,
    arena: LightingArena,
    diagnostics: Box<dyn RenderDiagnostics>,
    state: CameraFrameState,
}

impl Default for CameraRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Lane for CameraRenderer {
    fn strategy_name(&self) -> &'static str {
        "Render Camera"
    }

    fn lane_kind(&self) -> LaneKind {
        LaneKind::Camera
    }
}

impl CameraRenderer {
    /// Creates a renderer without editor diagnostics.
    pub fn new() -> Self {
        Self::with_diagnostics(Box::new(NoDiagnostics))
    }

    /// Creates a renderer with custom diagnostics hooks.
    pub fn with_diagnostics(diagnostics: Box<dyn RenderDiagnostics>) -> Self {
        Self {
            buffer: CommandBuffer::new("Render Camera"),
            sample_name: Cow::Borrowed("Render Camera"),
            lighting: Lighting::new(),
            post_fx: PostFxStack::new(),
            arena: LightingArena::default(),
            diagnostics,
            state: CameraFrameState::default(),
        }
    }

    /// Decisions taken for the last rendered camera.
    pub fn state(&self) -> &CameraFrameState {
        &self.state
    }

    /// Light and shadow tables of the last rendered camera.
    pub fn arena(&self) -> &LightingArena {
        &self.arena
    }

    /// The light collector.
    pub fn lighting(&self) -> &Lighting {
        &self.lighting
    }

    /// Renders `camera`. Returns `false` when it cannot be culled, in which
    /// case nothing was recorded.
    #[allow(clippy::too_many_arguments)]
    pub fn render(
        &mut self,
        ctx: &mut dyn RenderContext,
        camera: &Camera,
        buffer_settings: &CameraBufferSettings,
        batching: BatchingFlags,
        shadow_settings: &ShadowSettings,
        post_fx_settings: Option<&PostFxSettings>,
        lut_resolution: ColorLutResolution,
    ) -> bool {
        let camera_settings = &camera.settings;
        let is_reflection = camera.camera_type == CameraType::Reflection;
        let (use_color_texture, use_depth_texture) = if is_reflection {
            (
                buffer_settings.copy_color_reflection,
                buffer_settings.copy_depth_reflection,
            )
        } else {
            (
                buffer_settings.copy_color && camera_settings.copy_color,
                buffer_settings.copy_depth && camera_settings.copy_depth,
            )
        };
        let post_fx_settings = camera_settings.resolve_post_fx(post_fx_settings);
        let render_scale = buffer_settings.render_scale;
        let use_scaled_rendering = !(0.99..=1.01).contains(&render_scale)
            && !self.diagnostics.is_scene_window(camera);

        self.sample_name = self.diagnostics.sample_name(camera);
        self.buffer.set_name(self.sample_name.clone());

        let Some(parameters) = camera.culling_parameters(shadow_settings.max_distance) else {
            log::debug!("CameraRenderer: skipping camera '{}', it cannot be culled", camera.name);
            return false;
        };
        let mut culling = ctx.cull(&parameters);

        let (pixel_width, pixel_height) = (camera.pixel_width(), camera.pixel_height());
        let buffer_size = if use_scaled_rendering {
            let scale = render_scale.clamp(RENDER_SCALE_MIN, RENDER_SCALE_MAX);
            (
                (pixel_width as f32 * scale) as u32,
                (pixel_height as f32 * scale) as u32,
            )
        } else {
            (pixel_width, pixel_height)
        };
        self.state = CameraFrameState {
            buffer_size,
            use_hdr: buffer_settings.allow_hdr && camera.allow_hdr,
            use_scaled_rendering,
            use_color_texture,
            use_depth_texture,
            use_intermediate_buffer: false,
        };
        log::trace!(
            "CameraRenderer: '{}' at {}x{} (scaled: {}, hdr: {})",
            camera.name,
            buffer_size.0,
            buffer_size.1,
            use_scaled_rendering,
            self.state.use_hdr
        );

        self.buffer.begin_sample();
        let (w, h) = (buffer_size.0 as f32, buffer_size.1 as f32);
        self.buffer
            .set_global_vector(CAMERA_BUFFER_SIZE, Vec4::new(1.0 / w, 1.0 / h, w, h));
        execute_and_clear(ctx, &mut self.buffer);

        let capabilities = ctx.capabilities();
        self.lighting.setup(
            ctx,
            culling.as_mut(),
            shadow_settings,
            capabilities,
            LightingOptions {
                use_lights_per_object: batching.lights_per_object,
                rendering_layer_mask: camera_settings.light_mask(),
            },
            &mut self.arena,
        );
        let allowed = self.diagnostics.allows_post_fx(camera);
        self.post_fx.setup(
            camera,
            post_fx_settings,
            PostFxFrame {
                buffer_size,
                use_hdr: self.state.use_hdr,
                lut_resolution,
                final_blend_mode: camera_settings.final_blend_mode,
                bicubic_rescaling: buffer_settings.bicubic_rescaling,
            },
            allowed,
        );
        self.buffer.end_sample();

        self.setup(ctx, camera);
        self.draw_visible_geometry(ctx, culling.as_ref(), camera, batching);
        self.diagnostics.draw_unsupported_shaders(ctx, culling.as_ref());
        self.draw_gizmos(ctx, camera, GizmoSubset::PreImageEffects);
        if self.post_fx.is_active() {
            self.post_fx.render(ctx, CAMERA_COLOR_ATTACHMENT);
        } else if self.state.use_intermediate_buffer {
            self.draw_final(camera, camera_settings.final_blend_mode);
            execute_and_clear(ctx, &mut self.buffer);
        }
        self.draw_gizmos(ctx, camera, GizmoSubset::PostImageEffects);
        self.cleanup(ctx);
        self.submit(ctx);
        true
    }

    fn color_format(&self) -> TextureFormat {
        if self.state.use_hdr {
            TextureFormat::DefaultHdr
        } else {
            TextureFormat::Default
        }
    }

    fn setup(&mut self, ctx: &mut dyn RenderContext, camera: &Camera) {
        ctx.setup_camera_properties(camera);
        let mut flags = camera.clear_flags;
        let state = &mut self.state;
        state.use_intermediate_buffer = state.use_scaled_rendering
            || state.use_color_texture
            || state.use_depth_texture
            || self.post_fx.is_active();

        if state.use_intermediate_buffer {
            flags = flags.min(ClearFlags::Color);
            let (width, height) = state.buffer_size;
            let format = self.color_format();
            self.buffer.get_temporary(
                CAMERA_COLOR_ATTACHMENT,
                TemporaryTextureDesc::color(width, height, format),
            );
            self.buffer.get_temporary(
                CAMERA_DEPTH_ATTACHMENT,
                TemporaryTextureDesc::depth(width, height),
            );
            self.buffer.set_render_targets(
                (
                    RenderTarget::Temporary(CAMERA_COLOR_ATTACHMENT),
                    LoadAction::DontCare,
                    StoreAction::Store,
                ),
                (
                    RenderTarget::Temporary(CAMERA_DEPTH_ATTACHMENT),
                    LoadAction::DontCare,
                    StoreAction::Store,
                ),
            );
        }
        let clear_color = if flags == ClearFlags::Color {
            camera.background_color
        } else {
            LinearRgba::TRANSPARENT
        };
        self.buffer.clear_render_target(
            flags <= ClearFlags::Depth,
            flags <= ClearFlags::Color,
            clear_color,
        );
        self.buffer.begin_sample();
        self.buffer
            .set_global_texture(CAMERA_COLOR_TEXTURE, RenderTarget::MissingTexture);
        self.buffer
            .set_global_texture(CAMERA_DEPTH_TEXTURE, RenderTarget::MissingTexture);
        execute_and_clear(ctx, &mut self.buffer);
    }

    fn draw_visible_geometry(
        &mut self,
        ctx: &mut dyn RenderContext,
        culling: &dyn CullingResults,
        camera: &Camera,
        batching: BatchingFlags,
    ) {
        let per_object_data = if batching.lights_per_object {
            PerObjectData::BAKED_LIGHTING | PerObjectData::LIGHT_DATA | PerObjectData::LIGHT_INDICES
        } else {
            PerObjectData::BAKED_LIGHTING
        };
        let mut drawing = DrawingSettings {
            sorting: SortingCriteria::CommonOpaque,
            shader_passes: vec![UNLIT_SHADER_TAG, LIT_SHADER_TAG],
            enable_dynamic_batching: batching.dynamic_batching,
            enable_instancing: batching.gpu_instancing,
            per_object_data,
        };
        let mut filtering = FilteringSettings {
            render_queue_range: RenderQueueRange::OPAQUE,
            rendering_layer_mask: camera.settings.rendering_layer_mask,
        };
        ctx.draw_renderers(culling, &drawing, &filtering);

        if camera.clear_flags == ClearFlags::Skybox {
            ctx.draw_skybox(camera);
        }
        if self.state.use_color_texture || self.state.use_depth_texture {
            self.copy_attachments(ctx);
        }

        drawing.sorting = SortingCriteria::CommonTransparent;
        filtering.render_queue_range = RenderQueueRange::TRANSPARENT;
        ctx.draw_renderers(culling, &drawing, &filtering);
    }

    fn copy_attachments(&mut self, ctx: &mut dyn RenderContext) {
        let copy_supported = ctx.capabilities().copy_texture_support;
        let (width, height) = self.state.buffer_size;
        if self.state.use_color_texture {
            let format = self.color_format();
            self.buffer.get_temporary(
                CAMERA_COLOR_TEXTURE,
                TemporaryTextureDesc::color(width, height, format),
            );
            self.copy(CAMERA_COLOR_ATTACHMENT, CAMERA_COLOR_TEXTURE, false, copy_supported);
        }
        if self.state.use_depth_texture {
            self.buffer.get_temporary(
                CAMERA_DEPTH_TEXTURE,
                TemporaryTextureDesc::depth(width, height),
            );
            self.copy(CAMERA_DEPTH_ATTACHMENT, CAMERA_DEPTH_TEXTURE, true, copy_supported);
        }
        if !copy_supported {
            self.buffer.set_render_targets(
                (
                    RenderTarget::Temporary(CAMERA_COLOR_ATTACHMENT),
                    LoadAction::Load,
                    StoreAction::Store,
                ),
                (
                    RenderTarget::Temporary(CAMERA_DEPTH_ATTACHMENT),
                    LoadAction::Load,
                    StoreAction::Store,
                ),
            );
        }
        execute_and_clear(ctx, &mut self.buffer);
    }

    fn copy(
        &mut self,
        from: ShaderPropertyId,
        to: ShaderPropertyId,
        is_depth: bool,
        copy_supported: bool,
    ) {
        if copy_supported {
            self.buffer
                .copy_texture(RenderTarget::Temporary(from), RenderTarget::Temporary(to));
        } else {
            self.draw(from, RenderTarget::Temporary(to), is_depth);
        }
    }

    /// Full-screen copy with the camera copy material.
    fn draw(&mut self, from: ShaderPropertyId, to: RenderTarget, is_depth: bool) {
        self.buffer
            .set_global_texture(SOURCE_TEXTURE, RenderTarget::Temporary(from));
        self.buffer
            .set_render_target(to, LoadAction::DontCare, StoreAction::Store);
        self.buffer
            .draw_procedural(BlitMaterial::CameraCopy, if is_depth { 1 } else { 0 });
    }

    fn draw_final(&mut self, camera: &Camera, blend: FinalBlendMode) {
        self.buffer
            .set_global_float(CAMERA_SRC_BLEND, blend.source.as_i32() as f32);
        self.buffer
            .set_global_float(CAMERA_DST_BLEND, blend.destination.as_i32() as f32);
        self.buffer.set_global_texture(
            SOURCE_TEXTURE,
            RenderTarget::Temporary(CAMERA_COLOR_ATTACHMENT),
        );
        let load = if blend.destination == BlendMode::Zero && camera.is_full_viewport() {
            LoadAction::DontCare
        } else {
            LoadAction::Load
        };
        self.buffer
            .set_render_target(RenderTarget::CameraTarget, load, StoreAction::Store);
        self.buffer.set_viewport(camera.pixel_rect());
        self.buffer.draw_procedural(BlitMaterial::CameraCopy, 0);
        self.buffer.set_global_float(CAMERA_SRC_BLEND, 1.0);
        self.buffer.set_global_float(CAMERA_DST_BLEND, 0.0);
    }

    fn draw_gizmos(&mut self, ctx: &mut dyn RenderContext, camera: &Camera, subset: GizmoSubset) {
        if !self.diagnostics.wants_gizmos(camera) {
            return;
        }
        if self.state.use_intermediate_buffer {
            self.draw(CAMERA_DEPTH_ATTACHMENT, RenderTarget::CameraTarget, true);
            execute_and_clear(ctx, &mut self.buffer);
        }
        self.diagnostics.draw_gizmos(ctx, camera, subset);
    }

    fn cleanup(&mut self, ctx: &mut dyn RenderContext) {
        self.lighting.cleanup(ctx);
        if self.state.use_intermediate_buffer {
            self.buffer.release_temporary(CAMERA_COLOR_ATTACHMENT);
            self.buffer.release_temporary(CAMERA_DEPTH_ATTACHMENT);
            if self.state.use_color_texture {
                self.buffer.release_temporary(CAMERA_COLOR_TEXTURE);
            }
            if self.state.use_depth_texture {
                self.buffer.release_temporary(CAMERA_DEPTH_TEXTURE);
            }
        }
    }

    fn submit(&mut self, ctx: &mut dyn RenderContext) {
        self.buffer.end_sample();
        execute_and_clear(ctx, &mut self.buffer);
        ctx.submit();
    }
}

impl std::fmt::Debug for CameraRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraRenderer")
            .field("sample_name", &self.sample_name)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
