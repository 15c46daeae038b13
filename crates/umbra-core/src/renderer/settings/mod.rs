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

//! Pipeline configuration.
//!
//! Settings are plain data with production defaults. They can be authored in
//! RON; every struct uses `#[serde(default)]`, so a file only needs the fields
//! it changes.

pub mod camera;
pub mod post_fx;
pub mod shadow;

pub use camera::*;
pub use post_fx::*;
pub use shadow::*;

use super::error::SettingsError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Result of a settings validation.
pub type SettingsResult = Result<(), SettingsError>;

pub(crate) fn ensure(
    condition: bool,
    field: &'static str,
    reason: impl FnOnce() -> String,
) -> SettingsResult {
    if condition {
        Ok(())
    } else {
        Err(SettingsError::InvalidValue {
            field,
            reason: reason(),
        })
    }
}

/// Resolution of the color-grading lookup table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorLutResolution {
    /// 16³ entries.
    Lut16,
    /// 32³ entries.
    #[default]
    Lut32,
    /// 64³ entries.
    Lut64,
}

impl ColorLutResolution {
    /// Entries per axis.
    pub fn size(self) -> u32 {
        match self {
            ColorLutResolution::Lut16 => 16,
            ColorLutResolution::Lut32 => 32,
            ColorLutResolution::Lut64 => 64,
        }
    }
}

/// Draw-call batching and per-object lighting switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchingFlags {
    /// Merge small meshes on the CPU.
    pub dynamic_batching: bool,
    /// Draw repeated meshes with GPU instancing.
    pub gpu_instancing: bool,
    /// Upload a per-object light index list.
    pub lights_per_object: bool,
}

/// Global switches the driver applies to the engine once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphicsSettings {
    /// Use the SRP batcher.
    pub srp_batching: bool,
    /// Light intensities are specified in linear space.
    pub lights_use_linear_intensity: bool,
}

/// Everything the pipeline driver needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Camera buffer settings.
    pub camera_buffer: CameraBufferSettings,
    /// Enable dynamic batching.
    pub use_dynamic_batching: bool,
    /// Enable GPU instancing.
    pub use_gpu_instancing: bool,
    /// Enable the SRP batcher.
    pub use_srp_batcher: bool,
    /// Upload per-object light indices.
    pub use_lights_per_object: bool,
    /// Shadow settings.
    pub shadows: ShadowSettings,
    /// Default post-processing stack, `None` disables post-processing.
    pub post_fx: Option<PostFxSettings>,
    /// Color-grading LUT resolution.
    pub color_lut_resolution: ColorLutResolution,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            camera_buffer: CameraBufferSettings::default(),
            use_dynamic_batching: true,
            use_gpu_instancing: true,
            use_srp_batcher: true,
            use_lights_per_object: true,
            shadows: ShadowSettings::default(),
            post_fx: None,
            color_lut_resolution: ColorLutResolution::Lut32,
        }
    }
}

impl PipelineSettings {
    /// Parses and validates settings from RON text.
    pub fn from_ron_str(text: &str) -> Result<Self, SettingsError> {
        let settings: Self =
            ron::from_str(text).map_err(|e| SettingsError::Parse(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reads, parses and validates a RON settings file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| SettingsError::Io {
            path: path.display().to_string(),
            source_error: e.to_string(),
        })?;
        log::debug!("Loaded pipeline settings from '{}'", path.display());
        Self::from_ron_str(&text)
    }

    /// Serializes the settings as pretty RON.
    pub fn to_ron_string(&self) -> Result<String, SettingsError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| SettingsError::Serialize(e.to_string()))
    }

    /// Checks every value range.
    pub fn validate(&self) -> SettingsResult {
        self.camera_buffer.validate()?;
        self.shadows.validate()?;
        if let Some(post_fx) = &self.post_fx {
            post_fx.validate()?;
        }
        Ok(())
    }

    /// The batching switches handed to each camera.
    pub fn batching(&self) -> BatchingFlags {
        BatchingFlags {
            dynamic_batching: self.use_dynamic_batching,
            gpu_instancing: self.use_gpu_instancing,
            lights_per_object: self.use_lights_per_object,
        }
    }

    /// The global switches applied once by the driver.
    pub fn graphics(&self) -> GraphicsSettings {
        GraphicsSettings {
            srp_batching: self.use_srp_batcher,
            lights_use_linear_intensity: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_ron_keeps_defaults() {
        let text = r#"(
            shadows: (
                max_distance: 50.0,
                directional: (atlas_size: Size2048, cascade_count: 2, filter: Pcf5x5),
            ),
            post_fx: Some((bloom: (intensity: 2.0), tone_mapping: Aces)),
            color_lut_resolution: Lut64,
        )"#;
        let settings = PipelineSettings::from_ron_str(text).unwrap();
        assert_eq!(settings.shadows.max_distance, 50.0);
        assert_eq!(settings.shadows.distance_fade, 0.1);
        assert_eq!(settings.shadows.directional.atlas_size.pixels(), 2048);
        assert_eq!(settings.shadows.directional.cascade_count, 2);
        assert_eq!(settings.shadows.directional.cascade_ratio_2, 0.25);
        let post_fx = settings.post_fx.unwrap();
        assert_eq!(post_fx.bloom.intensity, 2.0);
        assert_eq!(post_fx.bloom.scatter, 0.7);
        assert_eq!(post_fx.tone_mapping, ToneMappingMode::Aces);
        assert_eq!(settings.color_lut_resolution.size(), 64);
        assert!(settings.use_lights_per_object);
    }

    #[test]
    fn test_invalid_value_is_reported() {
        let err = PipelineSettings::from_ron_str("(camera_buffer: (render_scale: 4.0))").unwrap_err();
        assert!(matches!(
            err,
            SettingsError::InvalidValue {
                field: "camera_buffer.render_scale",
                ..
            }
        ));
    }

    #[test]
    fn test_malformed_text_is_a_parse_error() {
        let err = PipelineSettings::from_ron_str("(shadows: [").unwrap_err();
        assert!(matches!(err, SettingsError::Parse(_)));
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let err = PipelineSettings::load("/definitely/not/here.ron").unwrap_err();
        assert!(matches!(err, SettingsError::Io { .. }));
    }

    #[test]
    fn test_ron_round_trip() {
        let settings = PipelineSettings {
            post_fx: Some(PostFxSettings::default()),
            ..Default::default()
        };
        let text = settings.to_ron_string().unwrap();
        assert_eq!(PipelineSettings::from_ron_str(&text).unwrap(), settings);
    }
}
