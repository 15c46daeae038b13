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

//! Cameras as seen by the pipeline.

use super::command::Viewport;
use super::culling::CullingParameters;
use super::settings::CameraSettings;
use crate::math::{LinearRgba, Mat4, Vec3};

/// What a camera is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CameraType {
    /// A regular game camera.
    Game,
    /// The editor's scene view.
    SceneView,
    /// Asset preview thumbnails.
    Preview,
    /// Reflection probe capture.
    Reflection,
}

/// How the camera's target is cleared, ordered from most to least clearing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ClearFlags {
    /// Clear depth and color, then draw the skybox.
    Skybox,
    /// Clear depth and color to the background color.
    Color,
    /// Clear depth only.
    Depth,
    /// Clear nothing.
    Nothing,
}

/// A camera to render.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Display name, used for profiling samples.
    pub name: String,
    /// Camera usage.
    pub camera_type: CameraType,
    /// Width of the render target in pixels.
    pub target_width: u32,
    /// Height of the render target in pixels.
    pub target_height: u32,
    /// Normalized viewport rectangle within the target.
    pub viewport_rect: Viewport,
    /// Clear behaviour.
    pub clear_flags: ClearFlags,
    /// Background color in linear space.
    pub background_color: LinearRgba,
    /// Vertical field of view in degrees.
    pub field_of_view: f32,
    /// Near clip distance.
    pub near_clip: f32,
    /// Far clip distance.
    pub far_clip: f32,
    /// Whether the camera itself allows HDR.
    pub allow_hdr: bool,
    /// Layers rendered by this camera.
    pub culling_mask: u32,
    /// World transform; the camera looks along its local -Z axis.
    pub local_to_world: Mat4,
    /// Pipeline-specific camera settings.
    pub settings: CameraSettings,
}

impl Camera {
    /// Creates a full-viewport camera with common defaults.
    pub fn new(name: impl Into<String>, camera_type: CameraType, width: u32, height: u32) -> Self {
        Self {
            name: name.into(),
            camera_type,
            target_width: width,
            target_height: height,
            viewport_rect: Viewport::new(0.0, 0.0, 1.0, 1.0),
            clear_flags: ClearFlags::Skybox,
            background_color: LinearRgba::new(0.19, 0.3, 0.47, 0.0),
            field_of_view: 60.0,
            near_clip: 0.3,
            far_clip: 1000.0,
            allow_hdr: true,
            culling_mask: u32::MAX,
            local_to_world: Mat4::IDENTITY,
            settings: CameraSettings::default(),
        }
    }

    /// The viewport in target pixels.
    pub fn pixel_rect(&self) -> Viewport {
        let w = self.target_width as f32;
        let h = self.target_height as f32;
        Viewport::new(
            self.viewport_rect.x * w,
            self.viewport_rect.y * h,
            self.viewport_rect.width * w,
            self.viewport_rect.height * h,
        )
    }

    /// Viewport width in pixels.
    pub fn pixel_width(&self) -> u32 {
        self.pixel_rect().width as u32
    }

    /// Viewport height in pixels.
    pub fn pixel_height(&self) -> u32 {
        self.pixel_rect().height as u32
    }

    /// Whether the camera covers its whole target.
    pub fn is_full_viewport(&self) -> bool {
        self.viewport_rect == Viewport::new(0.0, 0.0, 1.0, 1.0)
    }

    /// Whether post-processing may run for this camera type.
    pub fn supports_post_fx(&self) -> bool {
        matches!(self.camera_type, CameraType::Game | CameraType::SceneView)
    }

    /// World-space position.
    pub fn position(&self) -> Vec3 {
        self.local_to_world.cols[3].truncate()
    }

    /// Builds culling parameters, or `None` when the camera cannot be culled
    /// (empty viewport, invalid clip planes or field of view).
    pub fn culling_parameters(&self, max_shadow_distance: f32) -> Option<CullingParameters> {
        let (width, height) = (self.pixel_width(), self.pixel_height());
        if width == 0 || height == 0 {
            return None;
        }
        if !(self.near_clip > 0.0 && self.far_clip > self.near_clip) {
            return None;
        }
        if !(self.field_of_view > 0.0 && self.field_of_view < 180.0) {
            return None;
        }
        let forward = (-self.local_to_world.cols[2].truncate()).normalize();
        let up = self.local_to_world.cols[1].truncate().normalize();
        if forward == Vec3::ZERO || up == Vec3::ZERO {
            return None;
        }
        Some(CullingParameters {
            position: self.position(),
            forward,
            up,
            field_of_view: self.field_of_view,
            aspect: width as f32 / height as f32,
            near_clip: self.near_clip,
            far_clip: self.far_clip,
            shadow_distance: max_shadow_distance.min(self.far_clip),
            culling_mask: self.culling_mask,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_rect_scales_normalized_viewport() {
        let mut camera = Camera::new("Main", CameraType::Game, 1920, 1080);
        assert!(camera.is_full_viewport());
        camera.viewport_rect = Viewport::new(0.5, 0.0, 0.5, 1.0);
        assert_eq!(camera.pixel_rect(), Viewport::new(960.0, 0.0, 960.0, 1080.0));
        assert_eq!(camera.pixel_width(), 960);
        assert!(!camera.is_full_viewport());
    }

    #[test]
    fn test_shadow_distance_is_clamped_to_far_plane() {
        let mut camera = Camera::new("Main", CameraType::Game, 800, 600);
        camera.far_clip = 40.0;
        let params = camera.culling_parameters(100.0).unwrap();
        assert_eq!(params.shadow_distance, 40.0);
        assert_eq!(params.forward, Vec3::new(0.0, 0.0, -1.0));
        assert_eq!(camera.culling_parameters(25.0).unwrap().shadow_distance, 25.0);
    }

    #[test]
    fn test_invalid_cameras_cannot_be_culled() {
        let mut camera = Camera::new("Broken", CameraType::Game, 800, 0);
        assert!(camera.culling_parameters(100.0).is_none());
        camera.target_height = 600;
        camera.near_clip = 0.0;
        assert!(camera.culling_parameters(100.0).is_none());
        camera.near_clip = 0.3;
        camera.field_of_view = 0.0;
        assert!(camera.culling_parameters(100.0).is_none());
    }

    #[test]
    fn test_post_fx_camera_types() {
        assert!(Camera::new("a", CameraType::SceneView, 1, 1).supports_post_fx());
        assert!(!Camera::new("b", CameraType::Reflection, 1, 1).supports_post_fx());
        assert!(!Camera::new("c", CameraType::Preview, 1, 1).supports_post_fx());
    }
}
