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

//! The culling facility the host engine provides.
//!
//! Culling decides which lights and objects affect a camera and computes shadow
//! projections for lights. The pipeline only consumes the results; see
//! [`CullingResults`].

use super::light::VisibleLight;
use crate::math::{Mat4, Vec3, Vec4};

/// An axis-aligned bounding box given by center and half extents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Center of the box.
    pub center: Vec3,
    /// Half size along each axis.
    pub extents: Vec3,
}

/// Describes how a shadow split is culled.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ShadowSplitData {
    /// Bounding sphere of the split: `xyz` center, `w` radius.
    pub culling_sphere: Vec4,
    /// Fraction of a cascade's culling sphere that may skip casters already
    /// covered by the previous cascade.
    pub shadow_cascade_blend_culling_factor: f32,
}

/// View and projection for one shadow tile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowMatrices {
    /// World to light view.
    pub view: Mat4,
    /// Light view to clip.
    pub projection: Mat4,
    /// Culling data for the split.
    pub split_data: ShadowSplitData,
}

/// A face of a cube shadow map, in the order point lights render them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CubemapFace {
    /// +X
    PositiveX,
    /// -X
    NegativeX,
    /// +Y
    PositiveY,
    /// -Y
    NegativeY,
    /// +Z
    PositiveZ,
    /// -Z
    NegativeZ,
}

impl CubemapFace {
    /// All faces in rendering order.
    pub const ALL: [CubemapFace; 6] = [
        CubemapFace::PositiveX,
        CubemapFace::NegativeX,
        CubemapFace::PositiveY,
        CubemapFace::NegativeY,
        CubemapFace::PositiveZ,
        CubemapFace::NegativeZ,
    ];

    /// The axis this face looks along.
    pub fn direction(self) -> Vec3 {
        match self {
            CubemapFace::PositiveX => Vec3::X,
            CubemapFace::NegativeX => -Vec3::X,
            CubemapFace::PositiveY => Vec3::Y,
            CubemapFace::NegativeY => -Vec3::Y,
            CubemapFace::PositiveZ => Vec3::Z,
            CubemapFace::NegativeZ => -Vec3::Z,
        }
    }
}

/// How a shadow caster pass projects geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadowProjection {
    /// Directional lights.
    Orthographic,
    /// Spot and point lights.
    Perspective,
}

/// Arguments of one shadow caster draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowDrawingSettings {
    /// Index of the light in [`CullingResults::visible_lights`].
    pub visible_light_index: usize,
    /// Culling data of the split being rendered.
    pub split_data: ShadowSplitData,
    /// Projection type.
    pub projection: ShadowProjection,
}

/// Camera description handed to the culling facility.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CullingParameters {
    /// Camera position in world space.
    pub position: Vec3,
    /// Normalized view direction.
    pub forward: Vec3,
    /// Normalized up vector.
    pub up: Vec3,
    /// Vertical field of view in degrees.
    pub field_of_view: f32,
    /// Width over height.
    pub aspect: f32,
    /// Near clip distance.
    pub near_clip: f32,
    /// Far clip distance.
    pub far_clip: f32,
    /// Distance up to which shadow casters are considered.
    pub shadow_distance: f32,
    /// Layers the camera renders.
    pub culling_mask: u32,
}

/// Results of culling for one camera.
///
/// Implemented by the host engine. All shadow-matrix computations return `None`
/// when the engine cannot produce a projection (for example a degenerate light
/// transform); the pipeline then skips that tile.
pub trait CullingResults {
    /// The lights affecting the camera, in engine order.
    fn visible_lights(&self) -> &[VisibleLight];

    /// Bounds of the shadow casters visible to the light, or `None` when no
    /// caster lies within the shadow distance.
    fn shadow_caster_bounds(&self, visible_light_index: usize) -> Option<Bounds>;

    /// Matrices and split data for one cascade of a directional light.
    fn compute_directional_shadow_matrices(
        &self,
        visible_light_index: usize,
        cascade_index: usize,
        cascade_count: usize,
        cascade_ratios: Vec3,
        tile_resolution: u32,
        near_plane_offset: f32,
    ) -> Option<ShadowMatrices>;

    /// Matrices and split data for a spot light.
    fn compute_spot_shadow_matrices(&self, visible_light_index: usize) -> Option<ShadowMatrices>;

    /// Matrices and split data for one cube face of a point light.
    ///
    /// `fov_bias` widens the face frustum in degrees so filtering near face
    /// edges samples inside the tile.
    fn compute_point_shadow_matrices(
        &self,
        visible_light_index: usize,
        face: CubemapFace,
        fov_bias: f32,
    ) -> Option<ShadowMatrices>;

    /// The per-object light index map: one entry per engine light, holding the
    /// index into the pipeline's light tables or -1.
    fn light_index_map(&self) -> Vec<i32>;

    /// Replaces the per-object light index map.
    fn set_light_index_map(&mut self, map: Vec<i32>);
}
