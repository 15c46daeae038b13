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

//! The top-level pipeline driver.

use super::camera_renderer::CameraRenderer;
use super::diagnostics::RenderDiagnostics;
use std::time::{Duration, Instant};
use umbra_core::renderer::settings::PipelineSettings;
use umbra_core::renderer::{Camera, RenderContext, SettingsError};

/// Counters describing the work done by [`RenderPipeline::render`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    /// Frames rendered since the pipeline was created.
    pub frame_count: u64,
    /// Cameras rendered in the last frame.
    pub cameras_rendered: u32,
    /// Cameras skipped in the last frame because they could not be culled.
    pub cameras_skipped: u32,
    /// Wall-clock duration of the last frame.
    pub last_frame_time: Duration,
}

/// Renders every camera of a frame with one shared [`CameraRenderer`].
#[derive(Debug)]
pub struct RenderPipeline {
    settings: PipelineSettings,
    renderer: CameraRenderer,
    graphics_applied: bool,
    stats: FrameStats,
}

impl RenderPipeline {
    /// Creates a pipeline without editor diagnostics.
    ///
    /// # Errors
    /// Returns the first field of `settings` that fails validation.
    pub fn new(settings: PipelineSettings) -> Result<Self, SettingsError> {
        Self::with_renderer(settings, CameraRenderer::new())
    }

    /// Creates a pipeline whose cameras report through `diagnostics`.
    pub fn with_diagnostics(
        settings: PipelineSettings,
        diagnostics: Box<dyn RenderDiagnostics>,
    ) -> Result<Self, SettingsError> {
        Self::with_renderer(settings, CameraRenderer::with_diagnostics(diagnostics))
    }

    fn with_renderer(
        settings: PipelineSettings,
        renderer: CameraRenderer,
    ) -> Result<Self, SettingsError> {
        settings.validate()?;
        log::info!(
            "RenderPipeline: created (shadow distance {}, post fx: {})",
            settings.shadows.max_distance,
            settings.post_fx.is_some()
        );
        Ok(Self {
            settings,
            renderer,
            graphics_applied: false,
            stats: FrameStats::default(),
        })
    }

    /// The active settings.
    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Replaces the settings. Global graphics switches are re-applied on the
    /// next frame. Rejected settings leave the current ones in place.
    pub fn set_settings(&mut self, settings: PipelineSettings) -> Result<(), SettingsError> {
        settings.validate()?;
        self.settings = settings;
        self.graphics_applied = false;
        Ok(())
    }

    /// The camera renderer shared by all cameras.
    pub fn camera_renderer(&self) -> &CameraRenderer {
        &self.renderer
    }

    /// Counters of the last frame.
    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// Renders `cameras` in order.
    pub fn render(&mut self, ctx: &mut dyn RenderContext, cameras: &[Camera]) {
        let frame_start = Instant::now();
        if !self.graphics_applied {
            ctx.apply_graphics_settings(&self.settings.graphics());
            self.graphics_applied = true;
        }

        let settings = &self.settings;
        let batching = settings.batching();
        let (mut rendered, mut skipped) = (0, 0);
        for camera in cameras {
            let drawn = self.renderer.render(
                ctx,
                camera,
                &settings.camera_buffer,
                batching,
                &settings.shadows,
                settings.post_fx.as_ref(),
                settings.color_lut_resolution,
            );
            if drawn {
                rendered += 1;
            } else {
                skipped += 1;
            }
        }

        self.stats = FrameStats {
            frame_count: self.stats.frame_count + 1,
            cameras_rendered: rendered,
            cameras_skipped: skipped,
            last_frame_time: frame_start.elapsed(),
        };
        log::trace!(
            "RenderPipeline: frame {} rendered {} camera(s), skipped {} in {:?}",
            self.stats.frame_count,
            rendered,
            skipped,
            self.stats.last_frame_time
        );
    }
}
