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

//! Descriptors for geometry draws submitted through the render context.

use std::ops::BitOr;

/// Per-object data the engine must provide to shaders for a draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PerObjectData {
    bits: u32,
}

impl PerObjectData {
    /// Nothing.
    pub const NONE: Self = Self { bits: 0 };
    /// Reflection probe data.
    pub const REFLECTION_PROBES: Self = Self { bits: 1 << 0 };
    /// Lightmap UVs and scale/offset.
    pub const LIGHTMAPS: Self = Self { bits: 1 << 1 };
    /// Baked shadow-mask data.
    pub const SHADOW_MASK: Self = Self { bits: 1 << 2 };
    /// Light probe spherical harmonics.
    pub const LIGHT_PROBE: Self = Self { bits: 1 << 3 };
    /// Occlusion probe data.
    pub const OCCLUSION_PROBE: Self = Self { bits: 1 << 4 };
    /// Occlusion probe data for light probe proxy volumes.
    pub const OCCLUSION_PROBE_PROXY_VOLUME: Self = Self { bits: 1 << 5 };
    /// Light probe proxy volumes.
    pub const LIGHT_PROBE_PROXY_VOLUME: Self = Self { bits: 1 << 6 };
    /// Per-object light data.
    pub const LIGHT_DATA: Self = Self { bits: 1 << 7 };
    /// Per-object light index lists.
    pub const LIGHT_INDICES: Self = Self { bits: 1 << 8 };

    /// Everything the lit shaders read for baked and probe lighting.
    pub const BAKED_LIGHTING: Self = Self {
        bits: Self::REFLECTION_PROBES.bits
            | Self::LIGHTMAPS.bits
            | Self::SHADOW_MASK.bits
            | Self::LIGHT_PROBE.bits
            | Self::OCCLUSION_PROBE.bits
            | Self::LIGHT_PROBE_PROXY_VOLUME.bits
            | Self::OCCLUSION_PROBE_PROXY_VOLUME.bits,
    };

    /// Returns the raw bits.
    pub const fn bits(&self) -> u32 {
        self.bits
    }

    /// Checks whether every flag of `other` is set.
    pub const fn contains(&self, other: Self) -> bool {
        (self.bits & other.bits) == other.bits
    }
}

impl BitOr for PerObjectData {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self {
            bits: self.bits | rhs.bits,
        }
    }
}

/// Draw order of renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortingCriteria {
    /// Front to back, grouped by state.
    CommonOpaque,
    /// Back to front.
    CommonTransparent,
}

/// An inclusive render-queue range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderQueueRange {
    /// Lowest queue drawn.
    pub lower: u32,
    /// Highest queue drawn.
    pub upper: u32,
}

impl RenderQueueRange {
    /// Opaque and alpha-tested geometry.
    pub const OPAQUE: Self = Self {
        lower: 0,
        upper: 2500,
    };
    /// Transparent geometry.
    pub const TRANSPARENT: Self = Self {
        lower: 2501,
        upper: 5000,
    };
    /// Everything.
    pub const ALL: Self = Self {
        lower: 0,
        upper: 5000,
    };
}

/// Shader pass tags the pipeline renders.
pub const UNLIT_SHADER_TAG: &str = "SRPDefaultUnlit";
/// The lit pass tag.
pub const LIT_SHADER_TAG: &str = "CustomLit";

/// How renderers are drawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawingSettings {
    /// Draw order.
    pub sorting: SortingCriteria,
    /// Shader pass tags drawn, in priority order.
    pub shader_passes: Vec<&'static str>,
    /// Enable dynamic batching.
    pub enable_dynamic_batching: bool,
    /// Enable GPU instancing.
    pub enable_instancing: bool,
    /// Per-object data to provide.
    pub per_object_data: PerObjectData,
}

/// Which renderers are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilteringSettings {
    /// Render-queue range.
    pub render_queue_range: RenderQueueRange,
    /// Rendering layers drawn.
    pub rendering_layer_mask: u32,
}

/// Capabilities of the device behind a render context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceCapabilities {
    /// Depth buffer uses 1 at the near plane and 0 at the far plane.
    pub uses_reversed_z: bool,
    /// Native texture copies are supported.
    pub copy_texture_support: bool,
}

impl Default for DeviceCapabilities {
    fn default() -> Self {
        Self {
            uses_reversed_z: true,
            copy_texture_support: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_object_flags_combine() {
        let flags = PerObjectData::BAKED_LIGHTING | PerObjectData::LIGHT_INDICES;
        assert!(flags.contains(PerObjectData::SHADOW_MASK));
        assert!(flags.contains(PerObjectData::LIGHT_INDICES));
        assert!(!flags.contains(PerObjectData::LIGHT_DATA));
        assert_eq!(PerObjectData::default(), PerObjectData::NONE);
    }

    #[test]
    fn test_shader_tags_are_reexported() {
        use crate::renderer::{LIT_SHADER_TAG as LIT, UNLIT_SHADER_TAG as UNLIT};
        assert_eq!(UNLIT, "SRPDefaultUnlit");
        assert_eq!(LIT, "CustomLit");
    }

    #[test]
    fn test_queue_ranges_do_not_overlap() {
        assert_eq!(RenderQueueRange::OPAQUE.upper + 1, RenderQueueRange::TRANSPARENT.lower);
    }
}
