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

//! Shadow lane: slot allocation, atlas layout and shadow-map rendering.
//!
//! Directional lights get up to four cascaded shadow maps in one atlas; spot and
//! point lights share a second atlas of up to sixteen tiles, a point light
//! taking six of them. Lights that cannot be admitted still receive a strength
//! so shaders can fall back to baked shadows.

pub mod atlas;
mod shadows;

pub use self::atlas::{atlas_split, convert_to_atlas_matrix, AtlasLayout};
pub use self::shadows::*;

/// Shader property handles written by the shadow lane.
pub mod ids {
    use umbra_core::renderer::ShaderPropertyId;

    /// Directional shadow atlas texture.
    pub const DIRECTIONAL_SHADOW_ATLAS: ShaderPropertyId =
        ShaderPropertyId::from_name("_DirectionalShadowAtlas");
    /// Atlas-space matrices of every directional tile.
    pub const DIRECTIONAL_SHADOW_MATRICES: ShaderPropertyId =
        ShaderPropertyId::from_name("_DirectionalShadowMatrices");
    /// Spot and point shadow atlas texture.
    pub const OTHER_SHADOW_ATLAS: ShaderPropertyId =
        ShaderPropertyId::from_name("_OtherShadowAtlas");
    /// Atlas-space matrices of every spot/point tile.
    pub const OTHER_SHADOW_MATRICES: ShaderPropertyId =
        ShaderPropertyId::from_name("_OtherShadowMatrices");
    /// Tile bounds and normal bias of every spot/point tile.
    pub const OTHER_SHADOW_TILES: ShaderPropertyId =
        ShaderPropertyId::from_name("_OtherShadowTiles");
    /// Number of cascades, 0 when no directional shadows are rendered.
    pub const CASCADE_COUNT: ShaderPropertyId = ShaderPropertyId::from_name("_CascadeCount");
    /// Cascade culling spheres, `w` holding the squared filtered radius.
    pub const CASCADE_CULLING_SPHERES: ShaderPropertyId =
        ShaderPropertyId::from_name("_CascadeCullingSpheres");
    /// Per-cascade inverse squared radius and filter-scaled normal bias.
    pub const CASCADE_DATA: ShaderPropertyId = ShaderPropertyId::from_name("_CascadeData");
    /// Atlas sizes and their reciprocals.
    pub const SHADOW_ATLAS_SIZE: ShaderPropertyId = ShaderPropertyId::from_name("_ShadowAtlasSize");
    /// Distance and cascade fade factors.
    pub const SHADOW_DISTANCE_FADE: ShaderPropertyId =
        ShaderPropertyId::from_name("_ShadowDistanceFade");
    /// 1 while rendering orthographic shadow casters, 0 for perspective ones.
    pub const SHADOW_PANCAKING: ShaderPropertyId = ShaderPropertyId::from_name("_ShadowPancaking");
}
