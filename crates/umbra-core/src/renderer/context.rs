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

//! The render context: the host engine's side of a frame.

use super::camera::Camera;
use super::command::CommandBuffer;
use super::culling::{CullingParameters, CullingResults, ShadowDrawingSettings};
use super::draw::{DeviceCapabilities, DrawingSettings, FilteringSettings};
use super::settings::GraphicsSettings;

/// Which gizmos to draw relative to post-processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GizmoSubset {
    /// Gizmos affected by image effects.
    PreImageEffects,
    /// Gizmos drawn on top of the final image.
    PostImageEffects,
}

/// The engine services the pipeline drives during a frame.
///
/// Command buffers take effect only when passed to
/// [`execute_command_buffer`](RenderContext::execute_command_buffer); draws
/// issued through the other methods are queued in order with them.
/// [`submit`](RenderContext::submit) flushes everything queued for the current
/// camera.
pub trait RenderContext {
    /// Capabilities of the underlying device.
    fn capabilities(&self) -> DeviceCapabilities;

    /// Applies global switches such as the SRP batcher.
    fn apply_graphics_settings(&mut self, settings: &GraphicsSettings);

    /// Culls the scene for a camera.
    fn cull(&mut self, parameters: &CullingParameters) -> Box<dyn CullingResults>;

    /// Uploads the camera's view and projection globals.
    fn setup_camera_properties(&mut self, camera: &Camera);

    /// Queues the recorded commands of `buffer`.
    fn execute_command_buffer(&mut self, buffer: &CommandBuffer);

    /// Draws the culled renderers matching `filtering`.
    fn draw_renderers(
        &mut self,
        culling: &dyn CullingResults,
        drawing: &DrawingSettings,
        filtering: &FilteringSettings,
    );

    /// Draws the camera's skybox.
    fn draw_skybox(&mut self, camera: &Camera);

    /// Draws the shadow casters of one light split.
    fn draw_shadows(&mut self, settings: &ShadowDrawingSettings);

    /// Draws editor gizmos for the camera.
    fn draw_gizmos(&mut self, camera: &Camera, subset: GizmoSubset);

    /// Flushes all queued work for the current camera.
    fn submit(&mut self);
}

/// Executes `buffer` and clears it for reuse.
pub fn execute_and_clear(ctx: &mut dyn RenderContext, buffer: &mut CommandBuffer) {
    ctx.execute_command_buffer(buffer);
    buffer.clear();
}
