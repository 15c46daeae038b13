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

//! The recording render context.

use super::culling::HeadlessScene;
use super::pool::TexturePool;
use umbra_core::math::{Mat4, Vec4};
use umbra_core::renderer::settings::GraphicsSettings;
use umbra_core::renderer::{
    BlitMaterial, Camera, Command, CommandBuffer, CullingParameters, CullingResults,
    DeviceCapabilities, DrawingSettings, FilteringSettings, GizmoSubset, RenderContext,
    ShaderPropertyId, ShadowDrawingSettings,
};

/// Something the pipeline asked the engine to do, in submission order.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameEvent {
    /// A camera was culled.
    Cull(CullingParameters),
    /// Camera globals were uploaded.
    SetupCamera(String),
    /// A command from an executed command buffer.
    Command(Command),
    /// A geometry draw.
    DrawRenderers {
        /// The drawing settings.
        drawing: DrawingSettings,
        /// The filtering settings.
        filtering: FilteringSettings,
        /// The per-object light index map at draw time.
        light_index_map: Vec<i32>,
    },
    /// The skybox was drawn.
    DrawSkybox,
    /// Shadow casters were drawn for one split.
    DrawShadows(ShadowDrawingSettings),
    /// Gizmos were drawn.
    DrawGizmos(GizmoSubset),
    /// Queued work was flushed.
    Submit,
}

/// A [`RenderContext`] that records instead of rendering.
#[derive(Debug)]
pub struct HeadlessContext {
    scene: HeadlessScene,
    capabilities: DeviceCapabilities,
    graphics: Option<GraphicsSettings>,
    events: Vec<FrameEvent>,
    pool: TexturePool,
    submit_count: usize,
}

impl HeadlessContext {
    /// Creates a context rendering `scene` on a device with default capabilities.
    pub fn new(scene: HeadlessScene) -> Self {
        Self {
            scene,
            capabilities: DeviceCapabilities::default(),
            graphics: None,
            events: Vec::new(),
            pool: TexturePool::default(),
            submit_count: 0,
        }
    }

    /// Overrides the device capabilities.
    pub fn with_capabilities(mut self, capabilities: DeviceCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Every event recorded so far.
    pub fn events(&self) -> &[FrameEvent] {
        &self.events
    }

    /// Forgets recorded events, keeping pool state.
    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    /// The executed commands, in order.
    pub fn commands(&self) -> impl Iterator<Item = &Command> {
        self.events.iter().filter_map(|e| match e {
            FrameEvent::Command(c) => Some(c),
            _ => None,
        })
    }

    /// The temporary texture bookkeeping.
    pub fn pool(&self) -> &TexturePool {
        &self.pool
    }

    /// Graphics settings applied by the driver, if any.
    pub fn graphics_settings(&self) -> Option<&GraphicsSettings> {
        self.graphics.as_ref()
    }

    /// Number of submissions.
    pub fn submit_count(&self) -> usize {
        self.submit_count
    }

    /// The last value set for a global vector.
    pub fn last_vector(&self, id: ShaderPropertyId) -> Option<Vec4> {
        self.commands().fold(None, |last, c| match c {
            Command::SetGlobalVector(i, v) if *i == id => Some(*v),
            _ => last,
        })
    }

    /// The last value set for a global float.
    pub fn last_float(&self, id: ShaderPropertyId) -> Option<f32> {
        self.commands().fold(None, |last, c| match c {
            Command::SetGlobalFloat(i, v) if *i == id => Some(*v),
            _ => last,
        })
    }

    /// The last value set for a global integer.
    pub fn last_int(&self, id: ShaderPropertyId) -> Option<i32> {
        self.commands().fold(None, |last, c| match c {
            Command::SetGlobalInt(i, v) if *i == id => Some(*v),
            _ => last,
        })
    }

    /// The last vector array uploaded under `id`.
    pub fn last_vector_array(&self, id: ShaderPropertyId) -> Option<&[Vec4]> {
        self.commands().fold(None, |last, c| match c {
            Command::SetGlobalVectorArray(i, v) if *i == id => Some(v.as_slice()),
            _ => last,
        })
    }

    /// The last matrix array uploaded under `id`.
    pub fn last_matrix_array(&self, id: ShaderPropertyId) -> Option<&[Mat4]> {
        self.commands().fold(None, |last, c| match c {
            Command::SetGlobalMatrixArray(i, v) if *i == id => Some(v.as_slice()),
            _ => last,
        })
    }

    /// The last state of a keyword, `None` if it was never toggled.
    pub fn keyword_state(&self, keyword: &str) -> Option<bool> {
        self.commands().fold(None, |last, c| match c {
            Command::EnableKeyword(k) if *k == keyword => Some(true),
            Command::DisableKeyword(k) if *k == keyword => Some(false),
            _ => last,
        })
    }

    /// The passes of every full-screen draw with `material`, in order.
    pub fn procedural_passes(&self, material: BlitMaterial) -> Vec<u32> {
        self.commands()
            .filter_map(|c| match c {
                Command::DrawProcedural { material: m, pass } if *m == material => Some(*pass),
                _ => None,
            })
            .collect()
    }

    /// The shadow draws, in order.
    pub fn shadow_draws(&self) -> Vec<ShadowDrawingSettings> {
        self.events
            .iter()
            .filter_map(|e| match e {
                FrameEvent::DrawShadows(s) => Some(*s),
                _ => None,
            })
            .collect()
    }
}

impl RenderContext for HeadlessContext {
    fn capabilities(&self) -> DeviceCapabilities {
        self.capabilities
    }

    fn apply_graphics_settings(&mut self, settings: &GraphicsSettings) {
        log::debug!("HeadlessContext: graphics settings {settings:?}");
        self.graphics = Some(*settings);
    }

    fn cull(&mut self, parameters: &CullingParameters) -> Box<dyn CullingResults> {
        self.events.push(FrameEvent::Cull(*parameters));
        Box::new(self.scene.cull(parameters))
    }

    fn setup_camera_properties(&mut self, camera: &Camera) {
        self.events.push(FrameEvent::SetupCamera(camera.name.clone()));
    }

    fn execute_command_buffer(&mut self, buffer: &CommandBuffer) {
        log::trace!(
            "HeadlessContext: executing '{}' ({} commands)",
            buffer.name(),
            buffer.len()
        );
        for command in buffer.commands() {
            match command {
                Command::GetTemporary { id, desc } => self.pool.acquire(*id, *desc),
                Command::ReleaseTemporary(id) => self.pool.release(*id),
                _ => {}
            }
            self.events.push(FrameEvent::Command(command.clone()));
        }
    }

    fn draw_renderers(
        &mut self,
        culling: &dyn CullingResults,
        drawing: &DrawingSettings,
        filtering: &FilteringSettings,
    ) {
        self.events.push(FrameEvent::DrawRenderers {
            drawing: drawing.clone(),
            filtering: *filtering,
            light_index_map: culling.light_index_map(),
        });
    }

    fn draw_skybox(&mut self, _camera: &Camera) {
        self.events.push(FrameEvent::DrawSkybox);
    }

    fn draw_shadows(&mut self, settings: &ShadowDrawingSettings) {
        self.events.push(FrameEvent::DrawShadows(*settings));
    }

    fn draw_gizmos(&mut self, _camera: &Camera, subset: GizmoSubset) {
        self.events.push(FrameEvent::DrawGizmos(subset));
    }

    fn submit(&mut self) {
        if self.pool.outstanding() > 0 {
            log::warn!(
                "HeadlessContext: submit with {} temporary textures still held",
                self.pool.outstanding()
            );
        }
        self.submit_count += 1;
        self.events.push(FrameEvent::Submit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use umbra_core::renderer::{TemporaryTextureDesc, TextureFormat};

    const ID: ShaderPropertyId = ShaderPropertyId::from_name("_Test");

    #[test]
    fn test_execute_records_and_tracks_textures() {
        let mut ctx = HeadlessContext::new(HeadlessScene::new());
        let mut buffer = CommandBuffer::new("Test");
        buffer.get_temporary(ID, TemporaryTextureDesc::color(8, 8, TextureFormat::Default));
        buffer.set_global_vector(ID, Vec4::ONE);
        buffer.enable_keyword("_K");
        ctx.execute_command_buffer(&buffer);
        assert_eq!(ctx.pool().outstanding(), 1);
        assert_eq!(ctx.last_vector(ID), Some(Vec4::ONE));
        assert_eq!(ctx.keyword_state("_K"), Some(true));
        assert_eq!(ctx.keyword_state("_Other"), None);

        buffer.clear();
        buffer.release_temporary(ID);
        ctx.execute_command_buffer(&buffer);
        ctx.submit();
        assert_eq!(ctx.pool().outstanding(), 0);
        assert_eq!(ctx.submit_count(), 1);
        assert_eq!(ctx.events().last(), Some(&FrameEvent::Submit));
    }
}
