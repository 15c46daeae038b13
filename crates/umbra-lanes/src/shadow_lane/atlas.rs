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

//! Shadow atlas layout and clip-to-atlas conversion.
//!
//! An atlas is a square texture cut into a `split × split` grid of equal tiles,
//! `split ∈ {1, 2, 4}`. Tile `i` sits at column `i % split`, row `i / split`.

use umbra_core::math::{Mat4, Vec2};
use umbra_core::renderer::Viewport;

/// Grid dimension needed to hold `tile_count` tiles.
#[inline]
pub fn atlas_split(tile_count: usize) -> u32 {
    if tile_count <= 1 {
        1
    } else if tile_count <= 4 {
        2
    } else {
        4
    }
}

/// Grid layout of one atlas for the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtlasLayout {
    /// Atlas edge length in pixels.
    pub atlas_size: u32,
    /// Tiles per row and column.
    pub split: u32,
    /// Tile edge length in pixels.
    pub tile_size: u32,
}

impl AtlasLayout {
    /// Lays out an atlas of `atlas_size` pixels holding `tile_count` tiles.
    pub fn new(atlas_size: u32, tile_count: usize) -> Self {
        let split = atlas_split(tile_count);
        Self {
            atlas_size,
            split,
            tile_size: atlas_size / split,
        }
    }

    /// Tile edge length as a fraction of the atlas: `1 / split`.
    #[inline]
    pub fn tile_scale(&self) -> f32 {
        1.0 / self.split as f32
    }

    /// Grid coordinates of tile `index`.
    #[inline]
    pub fn tile_offset(&self, index: usize) -> Vec2 {
        let split = self.split as usize;
        Vec2::new((index % split) as f32, (index / split) as f32)
    }

    /// Pixel viewport of the tile at grid `offset`.
    #[inline]
    pub fn tile_viewport(&self, offset: Vec2) -> Viewport {
        let size = self.tile_size as f32;
        Viewport::new(offset.x * size, offset.y * size, size, size)
    }
}

/// Remaps a light's clip-space view-projection into the texture space of one
/// atlas tile.
///
/// Clip `x, y ∈ [-1, 1]` map to `[offset, offset + 1] · scale`, and depth ends up
/// in `[0, 1]` increasing away from the light. With `reversed_z` the depth row is
/// negated first so that both conventions produce the same orientation.
pub fn convert_to_atlas_matrix(mut m: Mat4, offset: Vec2, scale: f32, reversed_z: bool) -> Mat4 {
    if reversed_z {
        let row2 = m.get_row(2);
        m.set_row(2, -row2);
    }
    let row3 = m.get_row(3);
    let row0 = m.get_row(0);
    let row1 = m.get_row(1);
    let row2 = m.get_row(2);
    m.set_row(0, ((row0 + row3) * 0.5 + row3 * offset.x) * scale);
    m.set_row(1, ((row1 + row3) * 0.5 + row3 * offset.y) * scale);
    m.set_row(2, (row2 + row3) * 0.5);
    m
}
