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

//! Describes the lights the host engine reports as visible to a camera.
//!
//! A [`VisibleLight`] is a flattened, per-camera view of a scene light: its
//! color is already multiplied by intensity and its transform is in world space.
//! The light collector in `umbra-lanes` turns these into GPU light tables.

use crate::math::{LinearRgba, Mat4, Vec3, Vec4};

/// The shape of a light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightKind {
    /// Infinitely distant light with parallel rays (sun, moon).
    Directional,
    /// Omnidirectional local light.
    Point,
    /// Cone-shaped local light.
    Spot,
    /// Baked-only area light, ignored by realtime lighting.
    Area,
}

/// Realtime shadow mode of a light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LightShadows {
    /// The light casts no realtime shadows.
    #[default]
    None,
    /// Hard-edged shadows.
    Hard,
    /// Filtered shadows.
    Soft,
}

/// Per-light shadow configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightShadowSettings {
    /// Shadow mode.
    pub mode: LightShadows,
    /// Shadow strength in `[0, 1]`; zero disables the shadow.
    pub strength: f32,
    /// Slope-scaled depth bias applied while rendering the light's shadow map.
    pub bias: f32,
    /// Normal bias applied when sampling the shadow map.
    pub normal_bias: f32,
    /// Near-plane offset used for directional shadow projections.
    pub near_plane: f32,
}

impl Default for LightShadowSettings {
    fn default() -> Self {
        Self {
            mode: LightShadows::None,
            strength: 1.0,
            bias: 0.05,
            normal_bias: 0.4,
            near_plane: 0.2,
        }
    }
}

/// How a light was baked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LightBakeType {
    /// Fully realtime.
    #[default]
    Realtime,
    /// Realtime direct lighting combined with baked contributions.
    Mixed,
    /// Fully baked.
    Baked,
}

/// Mixed lighting mode of the scene the light was baked in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MixedLightingMode {
    /// Only indirect light is baked.
    #[default]
    IndirectOnly,
    /// Shadows of static casters are baked into a shadow mask.
    Shadowmask,
    /// Baked shadows are subtracted from realtime lighting.
    Subtractive,
}

/// Result of light baking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightBakingOutput {
    /// How the light was baked.
    pub bake_type: LightBakeType,
    /// The scene's mixed lighting mode.
    pub mixed_lighting_mode: MixedLightingMode,
    /// The shadow-mask channel holding this light's baked occlusion, or -1.
    pub occlusion_mask_channel: i32,
}

impl Default for LightBakingOutput {
    fn default() -> Self {
        Self {
            bake_type: LightBakeType::Realtime,
            mixed_lighting_mode: MixedLightingMode::IndirectOnly,
            occlusion_mask_channel: -1,
        }
    }
}

/// A light that survived culling for the current camera.
///
/// # Examples
///
/// ```
/// use umbra_core::math::{LinearRgba, Mat4, Vec3, Vec4};
/// use umbra_core::renderer::light::{LightKind, VisibleLight};
///
/// let lamp = VisibleLight::point(LinearRgba::rgb(2.0, 1.8, 1.5), Vec3::new(0.0, 3.0, 0.0), 8.0);
/// assert_eq!(lamp.kind, LightKind::Point);
/// assert_eq!(lamp.position(), Vec4::new(0.0, 3.0, 0.0, 1.0));
///
/// let sun = VisibleLight::directional(LinearRgba::WHITE, Mat4::IDENTITY);
/// // Lights shine along their local -Z axis.
/// assert_eq!(sun.direction(), Vec4::new(0.0, 0.0, -1.0, 0.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibleLight {
    /// The light's shape.
    pub kind: LightKind,
    /// Linear color premultiplied by intensity.
    pub final_color: LinearRgba,
    /// World transform. Column 2 is the light's forward axis, column 3 its position.
    pub local_to_world: Mat4,
    /// Range of local lights in world units.
    pub range: f32,
    /// Full outer cone angle of spot lights, in degrees.
    pub spot_angle: f32,
    /// Full inner cone angle of spot lights, in degrees.
    pub inner_spot_angle: f32,
    /// Realtime shadow configuration.
    pub shadows: LightShadowSettings,
    /// Baking result.
    pub baking: LightBakingOutput,
    /// Rendering layers the light affects.
    pub rendering_layer_mask: u32,
}

impl VisibleLight {
    fn base(kind: LightKind, final_color: LinearRgba, local_to_world: Mat4) -> Self {
        Self {
            kind,
            final_color,
            local_to_world,
            range: 10.0,
            spot_angle: 30.0,
            inner_spot_angle: 21.8,
            shadows: LightShadowSettings::default(),
            baking: LightBakingOutput::default(),
            rendering_layer_mask: 1,
        }
    }

    /// Creates a directional light oriented by `local_to_world`.
    pub fn directional(final_color: LinearRgba, local_to_world: Mat4) -> Self {
        Self::base(LightKind::Directional, final_color, local_to_world)
    }

    /// Creates a point light at `position`.
    pub fn point(final_color: LinearRgba, position: Vec3, range: f32) -> Self {
        Self {
            range,
            ..Self::base(LightKind::Point, final_color, Mat4::from_translation(position))
        }
    }

    /// Creates a spot light with full cone angles in degrees.
    pub fn spot(
        final_color: LinearRgba,
        local_to_world: Mat4,
        range: f32,
        outer_angle: f32,
        inner_angle: f32,
    ) -> Self {
        Self {
            range,
            spot_angle: outer_angle,
            inner_spot_angle: inner_angle,
            ..Self::base(LightKind::Spot, final_color, local_to_world)
        }
    }

    /// Replaces the shadow configuration.
    pub fn with_shadows(mut self, shadows: LightShadowSettings) -> Self {
        self.shadows = shadows;
        self
    }

    /// Replaces the baking output.
    pub fn with_baking(mut self, baking: LightBakingOutput) -> Self {
        self.baking = baking;
        self
    }

    /// Replaces the rendering layer mask.
    pub fn with_rendering_layer_mask(mut self, mask: u32) -> Self {
        self.rendering_layer_mask = mask;
        self
    }

    /// The direction light travels in, as a homogeneous direction (`w` = 0).
    #[inline]
    pub fn direction(&self) -> Vec4 {
        -self.local_to_world.cols[2]
    }

    /// The light position, as a homogeneous point (`w` = 1).
    #[inline]
    pub fn position(&self) -> Vec4 {
        self.local_to_world.cols[3]
    }

    /// The shadow-mask channel used by this light, or -1.
    ///
    /// Only mixed lights baked in shadow-mask mode sample the shadow mask.
    pub fn shadowmask_channel(&self) -> i32 {
        if self.baking.bake_type == LightBakeType::Mixed
            && self.baking.mixed_lighting_mode == MixedLightingMode::Shadowmask
        {
            self.baking.occlusion_mask_channel
        } else {
            -1
        }
    }

    /// Whether the light requests a realtime shadow at all.
    pub fn wants_shadows(&self) -> bool {
        self.shadows.mode != LightShadows::None && self.shadows.strength > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shadowmask_channel_requires_mixed_shadowmask() {
        let baked = LightBakingOutput {
            bake_type: LightBakeType::Mixed,
            mixed_lighting_mode: MixedLightingMode::Shadowmask,
            occlusion_mask_channel: 2,
        };
        let light = VisibleLight::directional(LinearRgba::WHITE, Mat4::IDENTITY).with_baking(baked);
        assert_eq!(light.shadowmask_channel(), 2);

        let subtractive = LightBakingOutput {
            mixed_lighting_mode: MixedLightingMode::Subtractive,
            ..baked
        };
        assert_eq!(light.with_baking(subtractive).shadowmask_channel(), -1);

        let realtime = LightBakingOutput {
            bake_type: LightBakeType::Realtime,
            ..baked
        };
        assert_eq!(light.with_baking(realtime).shadowmask_channel(), -1);
    }

    #[test]
    fn test_wants_shadows() {
        let light = VisibleLight::point(LinearRgba::WHITE, Vec3::ZERO, 5.0);
        assert!(!light.wants_shadows());
        let shadowed = light.with_shadows(LightShadowSettings {
            mode: LightShadows::Soft,
            ..Default::default()
        });
        assert!(shadowed.wants_shadows());
        let faded = light.with_shadows(LightShadowSettings {
            mode: LightShadows::Hard,
            strength: 0.0,
            ..Default::default()
        });
        assert!(!faded.wants_shadows());
    }

    #[test]
    fn test_spot_angles_are_stored_in_degrees() {
        let spot = VisibleLight::spot(LinearRgba::WHITE, Mat4::IDENTITY, 4.0, 60.0, 40.0);
        assert_eq!(spot.spot_angle, 60.0);
        assert_eq!(spot.inner_spot_angle, 40.0);
        assert_eq!(spot.range, 4.0);
    }
}
