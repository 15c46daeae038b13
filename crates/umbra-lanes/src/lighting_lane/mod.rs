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

//! Lighting lane: collects the visible lights of a camera into fixed-size tables.

mod arena;
mod lighting;

pub use self::arena::{LightBuffers, LightingArena};
pub use self::lighting::*;

/// Most directional lights shaded per camera.
pub const MAX_DIRECTIONAL_LIGHT_COUNT: usize = 4;
/// Most point and spot lights shaded per camera.
pub const MAX_OTHER_LIGHT_COUNT: usize = 64;

/// Keyword enabled when objects index their own light lists.
pub const LIGHTS_PER_OBJECT_KEYWORD: &str = "_LIGHTS_PER_OBJECT";

/// Shader property handles written by the lighting lane.
pub mod ids {
    use umbra_core::renderer::ShaderPropertyId;

    /// Number of directional lights.
    pub const DIRECTIONAL_LIGHT_COUNT: ShaderPropertyId =
        ShaderPropertyId::from_name("_DirectionalLightCount");
    /// Directional light colors.
    pub const DIRECTIONAL_LIGHT_COLORS: ShaderPropertyId =
        ShaderPropertyId::from_name("_DirectionalLightColors");
    /// Directional light directions, `w` carrying the rendering layer mask bits.
    pub const DIRECTIONAL_LIGHT_DIRECTIONS_AND_MASKS: ShaderPropertyId =
        ShaderPropertyId::from_name("_DirectionalLightDirectionsAndMasks");
    /// Directional light shadow data.
    pub const DIRECTIONAL_LIGHT_SHADOW_DATA: ShaderPropertyId =
        ShaderPropertyId::from_name("_DirectionalLightShadowData");
    /// Number of point and spot lights.
    pub const OTHER_LIGHT_COUNT: ShaderPropertyId = ShaderPropertyId::from_name("_OtherLightCount");
    /// Point/spot light colors.
    pub const OTHER_LIGHT_COLORS: ShaderPropertyId =
        ShaderPropertyId::from_name("_OtherLightColors");
    /// Point/spot positions, `w` holding the inverse squared range.
    pub const OTHER_LIGHT_POSITIONS: ShaderPropertyId =
        ShaderPropertyId::from_name("_OtherLightPositions");
    /// Spot directions, `w` carrying the rendering layer mask bits.
    pub const OTHER_LIGHT_DIRECTIONS_AND_MASKS: ShaderPropertyId =
        ShaderPropertyId::from_name("_OtherLightDirectionsAndMasks");
    /// Spot cone attenuation factors.
    pub const OTHER_LIGHT_SPOT_ANGLES: ShaderPropertyId =
        ShaderPropertyId::from_name("_OtherLightSpotAngles");
    /// Point/spot shadow data.
    pub const OTHER_LIGHT_SHADOW_DATA: ShaderPropertyId =
        ShaderPropertyId::from_name("_OtherLightShadowData");
}
