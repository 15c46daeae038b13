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

//! Editor-only hooks of the camera renderer.

use std::borrow::Cow;
use umbra_core::renderer::{
    Camera, CameraType, CullingResults, DrawingSettings, FilteringSettings, GizmoSubset,
    PerObjectData, RenderContext, RenderQueueRange, SortingCriteria,
};

/// Shader passes of legacy materials the pipeline cannot render.
pub const LEGACY_SHADER_TAGS: [&str; 6] = [
    "Always",
    "ForwardBase",
    "PrepassBase",
    "Vertex",
    "VertexLMRGBM",
    "VertexLM",
];

/// Hooks the camera renderer calls at fixed points of a frame.
///
/// The defaults do nothing, which is what a player build wants.
pub trait RenderDiagnostics {
    /// Name of the profiling sample wrapping the camera.
    fn sample_name(&self, _camera: &Camera) -> Cow<'static, str> {
        Cow::Borrowed("Render Camera")
    }

    /// Whether the camera is an editor scene window, which never renders scaled.
    fn is_scene_window(&self, _camera: &Camera) -> bool {
        false
    }

    /// Whether post-processing may run for the camera.
    fn allows_post_fx(&self, _camera: &Camera) -> bool {
        true
    }

    /// Whether gizmos are drawn; the renderer then copies depth to the camera target first.
    fn wants_gizmos(&self, _camera: &Camera) -> bool {
        false
    }

    /// Draws renderers whose shaders have no pass this pipeline supports.
    fn draw_unsupported_shaders(
        &mut self,
        _ctx: &mut dyn RenderContext,
        _culling: &dyn CullingResults,
    ) {
    }

    /// Draws one subset of gizmos.
    fn draw_gizmos(
        &mut self,
        _ctx: &mut dyn RenderContext,
        _camera: &Camera,
        _subset: GizmoSubset,
    ) {
    }
}

/// Player-build diagnostics: nothing extra is drawn.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDiagnostics;

impl RenderDiagnostics for NoDiagnostics {}

/// Editor diagnostics: per-camera samples, unsupported shader highlighting,
/// gizmos and the scene view's image-effects toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditorDiagnostics {
    /// Whether gizmos are drawn.
    pub show_gizmos: bool,
    /// Whether the scene view shows image effects.
    pub scene_view_image_effects: bool,
}

impl Default for EditorDiagnostics {
    fn default() -> Self {
        Self {
            show_gizmos: true,
            scene_view_image_effects: true,
        }
    }
}

impl RenderDiagnostics for EditorDiagnostics {
    fn sample_name(&self, camera: &Camera) -> Cow<'static, str> {
        Cow::Owned(camera.name.clone())
    }

    fn is_scene_window(&self, camera: &Camera) -> bool {
        camera.camera_type == CameraType::SceneView
    }

    fn allows_post_fx(&self, camera: &Camera) -> bool {
        camera.camera_type != CameraType::SceneView || self.scene_view_image_effects
    }

    fn wants_gizmos(&self, _camera: &Camera) -> bool {
        self.show_gizmos
    }

    fn draw_unsupported_shaders(
        &mut self,
        ctx: &mut dyn RenderContext,
        culling: &dyn CullingResults,
    ) {
        let drawing = DrawingSettings {
            sorting: SortingCriteria::CommonOpaque,
            shader_passes: LEGACY_SHADER_TAGS.to_vec(),
            enable_dynamic_batching: false,
            enable_instancing: false,
            per_object_data: PerObjectData::NONE,
        };
        let filtering = FilteringSettings {
            render_queue_range: RenderQueueRange::ALL,
            rendering_layer_mask: u32::MAX,
        };
        ctx.draw_renderers(culling, &drawing, &filtering);
    }

    fn draw_gizmos(&mut self, ctx: &mut dyn RenderContext, camera: &Camera, subset: GizmoSubset) {
        if self.show_gizmos {
            ctx.draw_gizmos(camera, subset);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_view_image_effects_toggle() {
        let scene = Camera::new("Scene", CameraType::SceneView, 8, 8);
        let game = Camera::new("Game", CameraType::Game, 8, 8);
        let editor = EditorDiagnostics {
            scene_view_image_effects: false,
            ..Default::default()
        };
        assert!(!editor.allows_post_fx(&scene));
        assert!(editor.allows_post_fx(&game));
        assert!(NoDiagnostics.allows_post_fx(&scene));
    }

    #[test]
    fn test_sample_names() {
        let game = Camera::new("Main Camera", CameraType::Game, 8, 8);
        assert_eq!(EditorDiagnostics::default().sample_name(&game), "Main Camera");
        assert_eq!(NoDiagnostics.sample_name(&game), "Render Camera");
        assert!(!NoDiagnostics.is_scene_window(&game));
    }
}
