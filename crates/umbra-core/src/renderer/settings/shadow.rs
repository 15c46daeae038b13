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

//! Shadow configuration.

use super::{ensure, SettingsResult};
use crate::math::Vec3;
use serde::{Deserialize, Serialize};

/// Edge length of a square shadow atlas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ShadowAtlasSize {
    /// 256 × 256
    Size256,
    /// 512 × 512
    Size512,
    /// 1024 × 1024
    #[default]
    Size1024,
    /// 2048 × 2048
    Size2048,
    /// 4096 × 4096
    Size4096,
    /// 8192 × 8192
    Size8192,
}

impl ShadowAtlasSize {
    /// The edge length in pixels.
    pub fn pixels(self) -> u32 {
        match self {
            ShadowAtlasSize::Size256 => 256,
            ShadowAtlasSize::Size512 => 512,
            ShadowAtlasSize::Size1024 => 1024,
            ShadowAtlasSize::Size2048 => 2048,
            ShadowAtlasSize::Size4096 => 4096,
            ShadowAtlasSize::Size8192 => 8192,
        }
    }
}

/// Percentage-closer filter footprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ShadowFilter {
    /// Hardware 2×2 comparison, the keyword-less variant.
    #[default]
    Pcf2x2,
    /// 3×3 tent filter.
    Pcf3x3,
    /// 5×5 tent filter.
    Pcf5x5,
    /// 7×7 tent filter.
    Pcf7x7,
}

impl ShadowFilter {
    /// Ordinal of the filter, 0 for 2×2 up to 3 for 7×7.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Index into the filter keyword family, `None` for the default variant.
    pub fn keyword_index(self) -> Option<usize> {
        self.index().checked_sub(1)
    }

    /// Filter radius in texels: `index + 1`.
    pub fn texel_scale(self) -> f32 {
        (self.index() + 1) as f32
    }
}

/// How adjacent cascades are blended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CascadeBlendMode {
    /// Hard transition, the keyword-less variant.
    #[default]
    Hard,
    /// Interpolated transition.
    Soft,
    /// Dithered transition.
    Dither,
}

impl CascadeBlendMode {
    /// Index into the blend keyword family, `None` for the default variant.
    pub fn keyword_index(self) -> Option<usize> {
        (self as usize).checked_sub(1)
    }
}

/// How the baked shadow mask is combined with realtime shadows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ShadowmaskMode {
    /// Static casters always use the baked mask.
    Shadowmask,
    /// Baked mask only beyond the realtime shadow distance.
    #[default]
    DistanceShadowmask,
}

/// Directional (cascaded) shadow configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectionalShadowSettings {
    /// Atlas edge length.
    pub atlas_size: ShadowAtlasSize,
    /// Filter footprint.
    pub filter: ShadowFilter,
    /// Number of cascades, 1 to 4.
    pub cascade_count: u32,
    /// Split ratio of the first cascade.
    pub cascade_ratio_1: f32,
    /// Split ratio of the second cascade.
    pub cascade_ratio_2: f32,
    /// Split ratio of the third cascade.
    pub cascade_ratio_3: f32,
    /// Fraction of the last cascade over which shadows fade out.
    pub cascade_fade: f32,
    /// Blend mode between cascades.
    pub cascade_blend: CascadeBlendMode,
}

impl DirectionalShadowSettings {
    /// The three split ratios as a vector.
    pub fn cascade_ratios(&self) -> Vec3 {
        Vec3::new(self.cascade_ratio_1, self.cascade_ratio_2, self.cascade_ratio_3)
    }
}

impl Default for DirectionalShadowSettings {
    fn default() -> Self {
        Self {
            atlas_size: ShadowAtlasSize::Size1024,
            filter: ShadowFilter::Pcf2x2,
            cascade_count: 4,
            cascade_ratio_1: 0.1,
            cascade_ratio_2: 0.25,
            cascade_ratio_3: 0.5,
            cascade_fade: 0.1,
            cascade_blend: CascadeBlendMode::Hard,
        }
    }
}

/// Spot and point light shadow configuration.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OtherShadowSettings {
    /// Atlas edge length.
    pub atlas_size: ShadowAtlasSize,
    /// Filter footprint.
    pub filter: ShadowFilter,
}

/// All realtime shadow settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowSettings {
    /// Distance from the camera beyond which no realtime shadows are drawn.
    pub max_distance: f32,
    /// Fraction of `max_distance` over which shadows fade out.
    pub distance_fade: f32,
    /// Directional light shadows.
    pub directional: DirectionalShadowSettings,
    /// Spot and point light shadows.
    pub other: OtherShadowSettings,
    /// Shadow-mask combination mode.
    pub shadowmask_mode: ShadowmaskMode,
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            max_distance: 100.0,
            distance_fade: 0.1,
            directional: DirectionalShadowSettings::default(),
            other: OtherShadowSettings::default(),
            shadowmask_mode: ShadowmaskMode::DistanceShadowmask,
        }
    }
}

impl ShadowSettings {
    /// Checks value ranges.
    pub fn validate(&self) -> SettingsResult {
        ensure(
            self.max_distance >= 0.001,
            "shadows.max_distance",
            || format!("must be at least 0.001, got {}", self.max_distance),
        )?;
        ensure(
            (0.001..=1.0).contains(&self.distance_fade),
            "shadows.distance_fade",
            || format!("must be within [0.001, 1], got {}", self.distance_fade),
        )?;
        let d = &self.directional;
        ensure(
            (1..=4).contains(&d.cascade_count),
            "shadows.directional.cascade_count",
            || format!("must be between 1 and 4, got {}", d.cascade_count),
        )?;
        let ratios = d.cascade_ratios();
        ensure(
            [ratios.x, ratios.y, ratios.z]
                .iter()
                .all(|r| (0.0..=1.0).contains(r)),
            "shadows.directional.cascade_ratio",
            || format!("ratios must be within [0, 1], got {ratios:?}"),
        )?;
        ensure(
            (0.001..=1.0).contains(&d.cascade_fade),
            "shadows.directional.cascade_fade",
            || format!("must be within [0.001, 1], got {}", d.cascade_fade),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_indices_skip_default_variant() {
        assert_eq!(ShadowFilter::Pcf2x2.keyword_index(), None);
        assert_eq!(ShadowFilter::Pcf7x7.keyword_index(), Some(2));
        assert_eq!(ShadowFilter::Pcf5x5.texel_scale(), 3.0);
        assert_eq!(CascadeBlendMode::Hard.keyword_index(), None);
        assert_eq!(CascadeBlendMode::Dither.keyword_index(), Some(1));
    }

    #[test]
    fn test_defaults_validate() {
        assert!(ShadowSettings::default().validate().is_ok());
        assert_eq!(ShadowAtlasSize::default().pixels(), 1024);
    }

    #[test]
    fn test_rejects_too_many_cascades() {
        let mut settings = ShadowSettings::default();
        settings.directional.cascade_count = 5;
        assert!(settings.validate().is_err());
        settings.directional.cascade_count = 0;
        assert!(settings.validate().is_err());
    }
}
