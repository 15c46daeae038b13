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

//! Per-camera storage for light and shadow tables.

use super::{MAX_DIRECTIONAL_LIGHT_COUNT, MAX_OTHER_LIGHT_COUNT};
use crate::shadow_lane::ShadowBuffers;
use bytemuck::{Pod, Zeroable};
use umbra_core::math::Vec4;

/// The light tables in GPU layout.
///
/// Arrays have fixed capacity and are overwritten in place every camera; only
/// the first `*_count` entries of each are meaningful.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct LightBuffers {
    /// Directional colors.
    pub directional_colors: [Vec4; MAX_DIRECTIONAL_LIGHT_COUNT],
    /// Directional directions and masks.
    pub directional_directions_and_masks: [Vec4; MAX_DIRECTIONAL_LIGHT_COUNT],
    /// Directional shadow data.
    pub directional_shadow_data: [Vec4; MAX_DIRECTIONAL_LIGHT_COUNT],
    /// Point/spot colors.
    pub other_colors: [Vec4; MAX_OTHER_LIGHT_COUNT],
    /// Point/spot positions and inverse squared ranges.
    pub other_positions: [Vec4; MAX_OTHER_LIGHT_COUNT],
    /// Spot directions and masks.
    pub other_directions_and_masks: [Vec4; MAX_OTHER_LIGHT_COUNT],
    /// Spot cone factors.
    pub other_spot_angles: [Vec4; MAX_OTHER_LIGHT_COUNT],
    /// Point/spot shadow data.
    pub other_shadow_data: [Vec4; MAX_OTHER_LIGHT_COUNT],
    /// Number of directional entries written.
    pub directional_count: u32,
    /// Number of point/spot entries written.
    pub other_count: u32,
    _padding: [u32; 2],
}

impl Default for LightBuffers {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl LightBuffers {
    /// Forgets the previous camera's lights. The arrays keep their contents.
    pub fn reset(&mut self) {
        self.directional_count = 0;
        self.other_count = 0;
    }

    #[cfg(test)]
    fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

/// Everything the lighting and shadow lanes write for one camera.
///
/// Owned by the camera renderer and lent to the lanes for a single setup.
#[derive(Debug, Clone, Default)]
pub struct LightingArena {
    /// Light tables.
    pub lights: LightBuffers,
    /// Shadow tables.
    pub shadows: ShadowBuffers,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_light_buffers_have_no_padding_surprises() {
        let buffers = LightBuffers::default();
        let vec4 = std::mem::size_of::<Vec4>();
        let expected = vec4 * (3 * MAX_DIRECTIONAL_LIGHT_COUNT + 5 * MAX_OTHER_LIGHT_COUNT) + 16;
        assert_eq!(buffers.as_bytes().len(), expected);
        assert!(buffers.as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_reset_keeps_array_contents() {
        let mut buffers = LightBuffers::default();
        buffers.other_colors[3] = Vec4::ONE;
        buffers.other_count = 4;
        buffers.directional_count = 1;
        buffers.reset();
        assert_eq!(buffers.other_count, 0);
        assert_eq!(buffers.directional_count, 0);
        assert_eq!(buffers.other_colors[3], Vec4::ONE);
    }
}
