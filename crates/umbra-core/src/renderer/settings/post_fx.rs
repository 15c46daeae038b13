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

//! Post-processing configuration: bloom, color grading and tone mapping.

use super::{ensure, SettingsResult};
use crate::math::{LinearRgba, Vec3};
use serde::{Deserialize, Serialize};

/// How the blurred bloom pyramid is recombined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BloomMode {
    /// Bloom is added on top of the image.
    #[default]
    Additive,
    /// Bloom redistributes energy, approximating lens scattering.
    Scattering,
}

/// Bloom configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BloomSettings {
    /// Start the pyramid from the camera resolution instead of the scaled buffer.
    pub ignore_render_scale: bool,
    /// Maximum number of pyramid levels, 0 disables bloom.
    pub max_iterations: u32,
    /// Smallest level size in pixels.
    pub downscale_limit: u32,
    /// Use bicubic filtering when upsampling.
    pub bicubic_upsampling: bool,
    /// Brightness threshold in gamma space.
    pub threshold: f32,
    /// Softness of the threshold curve in `[0, 1]`.
    pub threshold_knee: f32,
    /// Bloom strength.
    pub intensity: f32,
    /// Suppress single bright pixels when prefiltering.
    pub fade_fireflies: bool,
    /// Combination mode.
    pub mode: BloomMode,
    /// Scatter amount in `[0.05, 0.95]`, scattering mode only.
    pub scatter: f32,
}

impl Default for BloomSettings {
    fn default() -> Self {
        Self {
            ignore_render_scale: false,
            max_iterations: 16,
            downscale_limit: 2,
            bicubic_upsampling: true,
            threshold: 0.5,
            threshold_knee: 0.5,
            intensity: 1.0,
            fade_fireflies: true,
            mode: BloomMode::Scattering,
            scatter: 0.7,
        }
    }
}

/// Tone-mapping operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u32)]
pub enum ToneMappingMode {
    /// No tone mapping; the grading LUT is baked in linear space.
    #[default]
    None,
    /// ACES filmic curve.
    Aces,
    /// Neutral filmic curve.
    Neutral,
    /// Reinhard curve.
    Reinhard,
}

/// Basic color adjustments.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorAdjustmentsSettings {
    /// Exposure in stops.
    pub post_exposure: f32,
    /// Contrast in `[-100, 100]`.
    pub contrast: f32,
    /// Linear multiplicative tint.
    pub color_filter: LinearRgba,
    /// Hue shift in degrees, `[-180, 180]`.
    pub hue_shift: f32,
    /// Saturation in `[-100, 100]`.
    pub saturation: f32,
}

impl Default for ColorAdjustmentsSettings {
    fn default() -> Self {
        Self {
            post_exposure: 0.0,
            contrast: 0.0,
            color_filter: LinearRgba::WHITE,
            hue_shift: 0.0,
            saturation: 0.0,
        }
    }
}

/// White balance.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WhiteBalanceSettings {
    /// Temperature in `[-100, 100]`.
    pub temperature: f32,
    /// Tint in `[-100, 100]`.
    pub tint: f32,
}

/// Split toning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitToningSettings {
    /// Tint applied to shadows.
    pub shadows: LinearRgba,
    /// Tint applied to highlights.
    pub highlights: LinearRgba,
    /// Balance between the two in `[-100, 100]`.
    pub balance: f32,
}

impl Default for SplitToningSettings {
    fn default() -> Self {
        let neutral = LinearRgba::from_srgb(0.5, 0.5, 0.5, 1.0);
        Self {
            shadows: neutral,
            highlights: neutral,
            balance: 0.0,
        }
    }
}

/// Channel mixer: each vector is the weight of the input RGB channels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelMixerSettings {
    /// Output red row.
    pub red: Vec3,
    /// Output green row.
    pub green: Vec3,
    /// Output blue row.
    pub blue: Vec3,
}

impl Default for ChannelMixerSettings {
    fn default() -> Self {
        Self {
            red: Vec3::X,
            green: Vec3::Y,
            blue: Vec3::Z,
        }
    }
}

/// Shadows / midtones / highlights adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowsMidtonesHighlightsSettings {
    /// Shadow tint.
    pub shadows: LinearRgba,
    /// Midtone tint.
    pub midtones: LinearRgba,
    /// Highlight tint.
    pub highlights: LinearRgba,
    /// Luminance where shadows start fading out.
    pub shadows_start: f32,
    /// Luminance where shadows are gone.
    pub shadows_end: f32,
    /// Luminance where highlights start.
    pub highlights_start: f32,
    /// Luminance where highlights are full.
    pub highlights_end: f32,
}

impl Default for ShadowsMidtonesHighlightsSettings {
    fn default() -> Self {
        Self {
            shadows: LinearRgba::WHITE,
            midtones: LinearRgba::WHITE,
            highlights: LinearRgba::WHITE,
            shadows_start: 0.0,
            shadows_end: 0.3,
            highlights_start: 0.55,
            highlights_end: 1.0,
        }
    }
}

/// The complete post-processing stack configuration.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PostFxSettings {
    /// Bloom.
    pub bloom: BloomSettings,
    /// Tone-mapping operator.
    pub tone_mapping: ToneMappingMode,
    /// Color adjustments.
    pub color_adjustments: ColorAdjustmentsSettings,
    /// White balance.
    pub white_balance: WhiteBalanceSettings,
    /// Split toning.
    pub split_toning: SplitToningSettings,
    /// Channel mixer.
    pub channel_mixer: ChannelMixerSettings,
    /// Shadows / midtones / highlights.
    pub shadows_midtones_highlights: ShadowsMidtonesHighlightsSettings,
}

impl PostFxSettings {
    /// Checks value ranges.
    pub fn validate(&self) -> SettingsResult {
        let bloom = &self.bloom;
        ensure(bloom.max_iterations <= 16, "post_fx.bloom.max_iterations", || {
            format!("must be at most 16, got {}", bloom.max_iterations)
        })?;
        ensure(bloom.downscale_limit >= 1, "post_fx.bloom.downscale_limit", || {
            "must be at least 1".to_owned()
        })?;
        ensure(bloom.threshold >= 0.0, "post_fx.bloom.threshold", || {
            format!("must not be negative, got {}", bloom.threshold)
        })?;
        ensure(
            (0.0..=1.0).contains(&bloom.threshold_knee),
            "post_fx.bloom.threshold_knee",
            || format!("must be within [0, 1], got {}", bloom.threshold_knee),
        )?;
        ensure(bloom.intensity >= 0.0, "post_fx.bloom.intensity", || {
            format!("must not be negative, got {}", bloom.intensity)
        })?;
        ensure(
            (0.05..=0.95).contains(&bloom.scatter),
            "post_fx.bloom.scatter",
            || format!("must be within [0.05, 0.95], got {}", bloom.scatter),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_stack_is_valid() {
        assert!(PostFxSettings::default().validate().is_ok());
    }

    #[test]
    fn test_scatter_range_is_enforced() {
        let mut settings = PostFxSettings::default();
        settings.bloom.scatter = 1.0;
        assert!(settings.validate().is_err());
    }
}
