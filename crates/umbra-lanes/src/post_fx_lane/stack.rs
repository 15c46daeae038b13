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

//! The post-processing stack.

use super::ids::*;
use super::{Pass, MAX_BLOOM_PYRAMID_LEVELS};
use umbra_core::lane::{Lane, LaneKind};
use umbra_core::renderer::settings::{
    BicubicRescalingMode, BlendMode, ColorLutResolution, FinalBlendMode, PostFxSettings,
};
use umbra_core::renderer::{
    execute_and_clear, BlitMaterial, Camera, CommandBuffer, LoadAction, RenderContext,
    RenderTarget, ShaderPropertyId, StoreAction, TextureFormat, Viewport,
};

/// Per-camera inputs of the post-processing stack besides its settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PostFxFrame {
    /// Size of the intermediate buffer the camera renders into.
    pub buffer_size: (u32, u32),
    /// Whether the intermediate buffers are HDR.
    pub use_hdr: bool,
    /// Resolution of the grading LUT.
    pub lut_resolution: ColorLutResolution,
    /// Blending of the final draw into the camera target.
    pub final_blend_mode: FinalBlendMode,
    /// Sampling of the final rescale.
    pub bicubic_rescaling: BicubicRescalingMode,
}

impl Default for PostFxFrame {
    fn default() -> Self {
        Self {
            buffer_size: (1, 1),
            use_hdr: false,
            lut_resolution: ColorLutResolution::default(),
            final_blend_mode: FinalBlendMode::default(),
            bicubic_rescaling: BicubicRescalingMode::Off,
        }
    }
}

/// Bloom, color grading and tone mapping as a chain of full-screen draws.
#[derive(Debug)]
pub struct PostFxStack {
    pub(super) buffer: CommandBuffer,
    pub(super) settings: Option<PostFxSettings>,
    pub(super) frame: PostFxFrame,
    pub(super) camera_rect: Viewport,
    pub(super) camera_size: (u32, u32),
    pub(super) camera_full_viewport: bool,
    pub(super) bloom_pyramid: Vec<ShaderPropertyId>,
}

impl Default for PostFxStack {
    fn default() -> Self {
        Self::new()
    }
}

impl Lane for PostFxStack {
    fn strategy_name(&self) -> &'static str {
        "Post FX"
    }

    fn lane_kind(&self) -> LaneKind {
        LaneKind::PostProcess
    }
}

impl PostFxStack {
    /// Creates an inactive stack and registers the bloom pyramid handles.
    pub fn new() -> Self {
        let bloom_pyramid = (0..MAX_BLOOM_PYRAMID_LEVELS * 2)
            .map(|i| ShaderPropertyId::from_name(&format!("_BloomPyramid{i}")))
            .collect();
        Self {
            buffer: CommandBuffer::new("Post FX"),
            settings: None,
            frame: PostFxFrame::default(),
            camera_rect: Viewport::default(),
            camera_size: (0, 0),
            camera_full_viewport: true,
            bloom_pyramid,
        }
    }

    /// Prepares the stack for one camera.
    ///
    /// The stack is active only with settings, for game and scene-view
    /// cameras, and when `allowed` (the scene view may hide image effects).
    pub fn setup(
        &mut self,
        camera: &Camera,
        settings: Option<&PostFxSettings>,
        frame: PostFxFrame,
        allowed: bool,
    ) {
        self.settings = settings.filter(|_| camera.supports_post_fx() && allowed).copied();
        self.frame = frame;
        self.camera_rect = camera.pixel_rect();
        self.camera_size = (camera.pixel_width(), camera.pixel_height());
        self.camera_full_viewport = camera.is_full_viewport();
        if settings.is_some() && self.settings.is_none() {
            log::trace!("PostFxStack: disabled for camera '{}'", camera.name);
        }
    }

    /// Whether [`render`](Self::render) should replace the final copy.
    pub fn is_active(&self) -> bool {
        self.settings.is_some()
    }

    /// Processes `source` into the camera target.
    pub fn render(&mut self, ctx: &mut dyn RenderContext, source: ShaderPropertyId) {
        let Some(settings) = self.settings else {
            return;
        };
        if self.do_bloom(&settings.bloom, source) {
            self.do_color_grading_and_tone_mapping(&settings, BLOOM_RESULT);
            self.buffer.release_temporary(BLOOM_RESULT);
        } else {
            self.do_color_grading_and_tone_mapping(&settings, source);
        }
        execute_and_clear(ctx, &mut self.buffer);
    }

    pub(super) fn color_format(&self) -> TextureFormat {
        if self.frame.use_hdr {
            TextureFormat::DefaultHdr
        } else {
            TextureFormat::Default
        }
    }

    pub(super) fn draw(&mut self, from: ShaderPropertyId, to: RenderTarget, pass: Pass) {
        self.buffer
            .set_global_texture(POST_FX_SOURCE, RenderTarget::Temporary(from));
        self.buffer
            .set_render_target(to, LoadAction::DontCare, StoreAction::Store);
        self.buffer.draw_procedural(BlitMaterial::PostFx, pass.index());
    }

    /// Draws into the camera target honoring the final blend mode.
    pub(super) fn draw_final(&mut self, from: ShaderPropertyId, pass: Pass) {
        let blend = self.frame.final_blend_mode;
        self.buffer
            .set_global_float(FINAL_SRC_BLEND, blend.source.as_i32() as f32);
        self.buffer
            .set_global_float(FINAL_DST_BLEND, blend.destination.as_i32() as f32);
        self.buffer
            .set_global_texture(POST_FX_SOURCE, RenderTarget::Temporary(from));
        let load = if blend.destination == BlendMode::Zero && self.camera_full_viewport {
            LoadAction::DontCare
        } else {
            LoadAction::Load
        };
        self.buffer
            .set_render_target(RenderTarget::CameraTarget, load, StoreAction::Store);
        self.buffer.set_viewport(self.camera_rect);
        self.buffer.draw_procedural(BlitMaterial::PostFx, pass.index());
    }
}
