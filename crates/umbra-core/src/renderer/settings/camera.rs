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

//! Camera buffer and per-camera settings.

use super::{ensure, post_fx::PostFxSettings, SettingsResult};
use serde::{Deserialize, Serialize};

/// When bicubic filtering is used while rescaling to the camera target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BicubicRescalingMode {
    /// Always bilinear.
    #[default]
    Off,
    /// Bicubic only when upscaling.
    UpOnly,
    /// Bicubic for both directions.
    UpAndDown,
}

/// Pipeline-wide camera buffer settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraBufferSettings {
    /// Allow HDR intermediate buffers.
    pub allow_hdr: bool,
    /// Copy the color attachment for regular cameras.
    pub copy_color: bool,
    /// Copy the color attachment for reflection cameras.
    pub copy_color_reflection: bool,
    /// Copy the depth attachment for regular cameras.
    pub copy_depth: bool,
    /// Copy the depth attachment for reflection cameras.
    pub copy_depth_reflection: bool,
    /// Resolution scale in `[0.1, 2]`.
    pub render_scale: f32,
    /// Bicubic rescaling policy.
    pub bicubic_rescaling: BicubicRescalingMode,
}

impl Default for CameraBufferSettings {
    fn default() -> Self {
        Self {
            allow_hdr: true,
            copy_color: false,
            copy_color_reflection: false,
            copy_depth: false,
            copy_depth_reflection: false,
            render_scale: 1.0,
            bicubic_rescaling: BicubicRescalingMode::Off,
        }
    }
}

impl CameraBufferSettings {
    /// Checks value ranges.
    pub fn validate(&self) -> SettingsResult {
        ensure(
            (0.1..=2.0).contains(&self.render_scale),
            "camera_buffer.render_scale",
            || format!("must be within [0.1, 2], got {}", self.render_scale),
        )
    }
}

/// GPU blend factor, numbered as the shaders expect it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i32)]
pub enum BlendMode {
    /// 0
    Zero = 0,
    /// 1
    One = 1,
    /// Destination color.
    DstColor = 2,
    /// Source color.
    SrcColor = 3,
    /// 1 - destination color.
    OneMinusDstColor = 4,
    /// Source alpha.
    SrcAlpha = 5,
    /// 1 - source color.
    OneMinusSrcColor = 6,
    /// Destination alpha.
    DstAlpha = 7,
    /// 1 - destination alpha.
    OneMinusDstAlpha = 8,
    /// Saturated source alpha.
    SrcAlphaSaturate = 9,
    /// 1 - source alpha.
    OneMinusSrcAlpha = 10,
}

impl BlendMode {
    /// The value uploaded to the shader.
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

/// Blend factors of the final draw into the camera target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalBlendMode {
    /// Source factor.
    pub source: BlendMode,
    /// Destination factor.
    pub destination: BlendMode,
}

impl Default for FinalBlendMode {
    /// Opaque overwrite.
    fn default() -> Self {
        Self {
            source: BlendMode::One,
            destination: BlendMode::Zero,
        }
    }
}

/// Settings attached to an individual camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Allow copying the color attachment, combined with the buffer setting.
    pub copy_color: bool,
    /// Allow copying the depth attachment, combined with the buffer setting.
    pub copy_depth: bool,
    /// Rendering layers this camera draws.
    pub rendering_layer_mask: u32,
    /// Restrict lights to the camera's rendering layers as well.
    pub mask_lights: bool,
    /// Use `post_fx_settings` instead of the pipeline's stack.
    pub override_post_fx: bool,
    /// The camera's own stack, used when `override_post_fx` is set.
    pub post_fx_settings: Option<PostFxSettings>,
    /// Blend factors of the final draw.
    pub final_blend_mode: FinalBlendMode,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            copy_color: true,
            copy_depth: true,
            rendering_layer_mask: u32::MAX,
            mask_lights: false,
            override_post_fx: false,
            post_fx_settings: None,
            final_blend_mode: FinalBlendMode::default(),
        }
    }
}

impl CameraSettings {
    /// The rendering-layer mask used to filter lights.
    pub fn light_mask(&self) -> u32 {
        if self.mask_lights {
            self.rendering_layer_mask
        } else {
            u32::MAX
        }
    }

    /// Resolves which post-processing stack the camera uses.
    pub fn resolve_post_fx<'a>(
        &'a self,
        pipeline: Option<&'a PostFxSettings>,
    ) -> Option<&'a PostFxSettings> {
        if self.override_post_fx {
            self.post_fx_settings.as_ref()
        } else {
            pipeline
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_light_mask_only_applies_when_masking() {
        let mut settings = CameraSettings {
            rendering_layer_mask: 0b10,
            ..Default::default()
        };
        assert_eq!(settings.light_mask(), u32::MAX);
        settings.mask_lights = true;
        assert_eq!(settings.light_mask(), 0b10);
    }

    #[test]
    fn test_override_post_fx() {
        let pipeline = PostFxSettings::default();
        let mut settings = CameraSettings::default();
        assert!(settings.resolve_post_fx(Some(&pipeline)).is_some());
        settings.override_post_fx = true;
        assert!(settings.resolve_post_fx(Some(&pipeline)).is_none());
    }

    #[test]
    fn test_blend_mode_values() {
        assert_eq!(BlendMode::Zero.as_i32(), 0);
        assert_eq!(BlendMode::OneMinusSrcAlpha.as_i32(), 10);
    }
}
