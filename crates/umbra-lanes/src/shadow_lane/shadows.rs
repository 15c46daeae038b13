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

//! The shadow allocator.

use super::atlas::{convert_to_atlas_matrix, AtlasLayout};
use super::ids::*;
use umbra_core::lane::{Lane, LaneKind};
use umbra_core::math::{LinearRgba, Mat4, Vec2, Vec4, RAD_TO_DEG, SQRT_2};
use umbra_core::renderer::settings::{ShadowFilter, ShadowSettings, ShadowmaskMode};
use umbra_core::renderer::{
    execute_and_clear, CommandBuffer, CubemapFace, CullingResults, DeviceCapabilities, LightKind,
    LoadAction, RenderContext, RenderTarget, ShaderPropertyId, ShadowDrawingSettings,
    ShadowProjection, ShadowSplitData, StoreAction, TemporaryTextureDesc, VisibleLight,
};

/// Directional lights that can have a shadow map at the same time.
pub const MAX_SHADOWED_DIRECTIONAL_LIGHT_COUNT: usize = 4;
/// Spot/point shadow tiles available per frame.
pub const MAX_SHADOWED_OTHER_LIGHT_COUNT: usize = 16;
/// Cascades per directional light.
pub const MAX_CASCADE_COUNT: usize = 4;

const POINT_LIGHT_TILE_COUNT: usize = 6;

/// Directional filter keywords; the 2×2 filter is the keyword-less variant.
pub const DIRECTIONAL_FILTER_KEYWORDS: [&str; 3] =
    ["_DIRECTIONAL_PCF3", "_DIRECTIONAL_PCF5", "_DIRECTIONAL_PCF7"];
/// Spot/point filter keywords.
pub const OTHER_FILTER_KEYWORDS: [&str; 3] = ["_OTHER_PCF3", "_OTHER_PCF5", "_OTHER_PCF7"];
/// Cascade blend keywords; hard blending is the keyword-less variant.
pub const CASCADE_BLEND_KEYWORDS: [&str; 2] = ["_CASCADE_BLEND_SOFT", "_CASCADE_BLEND_DITHER"];
/// Shadow-mask keywords; no keyword means no light uses the shadow mask.
pub const SHADOW_MASK_KEYWORDS: [&str; 2] = ["_SHADOW_MASK_ALWAYS", "_SHADOW_MASK_DISTANCE"];

/// Shadow data of a directional light as handed to the light tables.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalShadowData {
    /// Configured shadow strength.
    pub strength: f32,
    /// First atlas tile of the light's cascades.
    pub tile_index: u32,
    /// Normal bias applied when sampling.
    pub normal_bias: f32,
    /// Shadow-mask channel, or -1.
    pub mask_channel: i32,
    /// Whether a realtime shadow map was allocated.
    pub has_shadow_map: bool,
}

impl DirectionalShadowData {
    /// No shadow at all.
    pub const NONE: Self = Self {
        strength: 0.0,
        tile_index: 0,
        normal_bias: 0.0,
        mask_channel: -1,
        has_shadow_map: false,
    };

    fn baked_only(strength: f32, mask_channel: i32) -> Self {
        Self {
            strength,
            mask_channel,
            ..Self::NONE
        }
    }

    /// GPU encoding: `(±strength, tile, normal bias, mask channel)`, the
    /// strength negated when only baked shadows are available.
    pub fn to_vec4(&self) -> Vec4 {
        Vec4::new(
            encode_strength(self.strength, self.has_shadow_map),
            self.tile_index as f32,
            self.normal_bias,
            self.mask_channel as f32,
        )
    }
}

/// Shadow data of a spot or point light as handed to the light tables.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OtherShadowData {
    /// Configured shadow strength.
    pub strength: f32,
    /// First atlas tile; point lights own six consecutive tiles.
    pub tile_index: u32,
    /// Whether the tiles are cube faces.
    pub is_point: bool,
    /// Shadow-mask channel, or -1.
    pub mask_channel: i32,
    /// Whether realtime shadow tiles were allocated.
    pub has_shadow_map: bool,
}

impl OtherShadowData {
    /// No shadow at all.
    pub const NONE: Self = Self {
        strength: 0.0,
        tile_index: 0,
        is_point: false,
        mask_channel: -1,
        has_shadow_map: false,
    };

    fn baked_only(strength: f32, mask_channel: i32) -> Self {
        Self {
            strength,
            mask_channel,
            ..Self::NONE
        }
    }

    /// GPU encoding: `(±strength, tile, is point, mask channel)`.
    pub fn to_vec4(&self) -> Vec4 {
        Vec4::new(
            encode_strength(self.strength, self.has_shadow_map),
            self.tile_index as f32,
            if self.is_point { 1.0 } else { 0.0 },
            self.mask_channel as f32,
        )
    }
}

fn encode_strength(strength: f32, has_shadow_map: bool) -> f32 {
    if has_shadow_map || strength <= 0.0 {
        strength.max(0.0)
    } else {
        -strength
    }
}

#[derive(Debug, Clone, Copy)]
struct ShadowedDirectionalLight {
    visible_light_index: usize,
    slope_scale_bias: f32,
    near_plane_offset: f32,
}

#[derive(Debug, Clone, Copy)]
struct ShadowedOtherLight {
    visible_light_index: usize,
    slope_scale_bias: f32,
    normal_bias: f32,
    is_point: bool,
    first_tile: usize,
}

/// Fixed-capacity shadow tables reused across frames.
///
/// Only entries written during the current frame are meaningful; the arrays
/// are uploaded whole so the GPU-side layout never changes.
#[derive(Debug, Clone)]
pub struct ShadowBuffers {
    /// Atlas matrices of directional tiles.
    pub directional_matrices: [Mat4; MAX_SHADOWED_DIRECTIONAL_LIGHT_COUNT * MAX_CASCADE_COUNT],
    /// Atlas matrices of spot/point tiles.
    pub other_matrices: [Mat4; MAX_SHADOWED_OTHER_LIGHT_COUNT],
    /// Tile bounds and bias of spot/point tiles.
    pub other_tiles: [Vec4; MAX_SHADOWED_OTHER_LIGHT_COUNT],
    /// Cascade culling spheres.
    pub cascade_culling_spheres: [Vec4; MAX_CASCADE_COUNT],
    /// Cascade data.
    pub cascade_data: [Vec4; MAX_CASCADE_COUNT],
}

impl Default for ShadowBuffers {
    fn default() -> Self {
        Self {
            directional_matrices: [Mat4::IDENTITY;
                MAX_SHADOWED_DIRECTIONAL_LIGHT_COUNT * MAX_CASCADE_COUNT],
            other_matrices: [Mat4::IDENTITY; MAX_SHADOWED_OTHER_LIGHT_COUNT],
            other_tiles: [Vec4::ZERO; MAX_SHADOWED_OTHER_LIGHT_COUNT],
            cascade_culling_spheres: [Vec4::ZERO; MAX_CASCADE_COUNT],
            cascade_data: [Vec4::ZERO; MAX_CASCADE_COUNT],
        }
    }
}

/// Computes the culling sphere and cascade data uploaded for one cascade.
///
/// The sphere radius is shrunk by the filter size so filtering never samples
/// outside the cascade, and stored squared for cheap containment tests.
pub fn cascade_data(culling_sphere: Vec4, tile_size: f32, filter: ShadowFilter) -> (Vec4, Vec4) {
    let texel_size = 2.0 * culling_sphere.w / tile_size;
    let filter_size = texel_size * filter.texel_scale();
    let mut sphere = culling_sphere;
    sphere.w -= filter_size;
    sphere.w *= sphere.w;
    (sphere, Vec4::new(1.0 / sphere.w, filter_size * SQRT_2, 0.0, 0.0))
}

/// Allocates shadow slots during light collection and renders the atlases.
#[derive(Debug)]
pub struct Shadows {
    buffer: CommandBuffer,
    settings: ShadowSettings,
    reversed_z: bool,
    directional: Vec<ShadowedDirectionalLight>,
    other: Vec<ShadowedOtherLight>,
    other_tile_count: usize,
    shadow_mask_in_use: bool,
    seeded_cascades: [bool; MAX_CASCADE_COUNT],
    directional_atlas_acquired: bool,
    other_atlas_acquired: bool,
}

impl Default for Shadows {
    fn default() -> Self {
        Self::new()
    }
}

impl Lane for Shadows {
    fn strategy_name(&self) -> &'static str {
        "Shadows"
    }

    fn lane_kind(&self) -> LaneKind {
        LaneKind::Shadow
    }
}

impl Shadows {
    /// Creates an allocator with empty tables.
    pub fn new() -> Self {
        Self {
            buffer: CommandBuffer::new("Shadows"),
            settings: ShadowSettings::default(),
            reversed_z: false,
            directional: Vec::with_capacity(MAX_SHADOWED_DIRECTIONAL_LIGHT_COUNT),
            other: Vec::with_capacity(MAX_SHADOWED_OTHER_LIGHT_COUNT),
            other_tile_count: 0,
            shadow_mask_in_use: false,
            seeded_cascades: [false; MAX_CASCADE_COUNT],
            directional_atlas_acquired: false,
            other_atlas_acquired: false,
        }
    }

    /// Starts a new camera: forgets every reservation.
    ///
    /// The cascade count is clamped to `1..=MAX_CASCADE_COUNT` so settings
    /// built in code can never index past the cascade arrays.
    pub fn setup(&mut self, settings: &ShadowSettings, capabilities: DeviceCapabilities) {
        self.buffer.set_name(self.strategy_name());
        self.settings = *settings;
        let cascades = &mut self.settings.directional.cascade_count;
        if !(1..=MAX_CASCADE_COUNT as u32).contains(cascades) {
            log::warn!(
                "Shadows: cascade count {} clamped to 1..={}",
                cascades,
                MAX_CASCADE_COUNT
            );
            *cascades = (*cascades).clamp(1, MAX_CASCADE_COUNT as u32);
        }
        self.reversed_z = capabilities.uses_reversed_z;
        self.directional.clear();
        self.other.clear();
        self.other_tile_count = 0;
        self.shadow_mask_in_use = false;
        self.seeded_cascades = [false; MAX_CASCADE_COUNT];
        self.directional_atlas_acquired = false;
        self.other_atlas_acquired = false;
    }

    /// Number of directional lights holding a shadow slot.
    pub fn directional_count(&self) -> usize {
        self.directional.len()
    }

    /// Number of spot/point tiles reserved.
    pub fn other_tile_count(&self) -> usize {
        self.other_tile_count
    }

    /// Whether any admitted or baked-only light samples the shadow mask.
    pub fn shadow_mask_in_use(&self) -> bool {
        self.shadow_mask_in_use
    }

    fn track_mask_channel(&mut self, light: &VisibleLight) -> i32 {
        let channel = light.shadowmask_channel();
        if channel >= 0 {
            self.shadow_mask_in_use = true;
        }
        channel
    }

    /// Tries to reserve cascaded shadow maps for a directional light.
    pub fn reserve_directional_shadow(
        &mut self,
        light: &VisibleLight,
        visible_light_index: usize,
        culling: &dyn CullingResults,
    ) -> DirectionalShadowData {
        if self.directional.len() >= MAX_SHADOWED_DIRECTIONAL_LIGHT_COUNT || !light.wants_shadows() {
            return DirectionalShadowData::NONE;
        }
        let mask_channel = self.track_mask_channel(light);
        if culling.shadow_caster_bounds(visible_light_index).is_none() {
            return DirectionalShadowData::baked_only(light.shadows.strength, mask_channel);
        }

        let slot = self.directional.len();
        self.directional.push(ShadowedDirectionalLight {
            visible_light_index,
            slope_scale_bias: light.shadows.bias,
            near_plane_offset: light.shadows.near_plane,
        });
        DirectionalShadowData {
            strength: light.shadows.strength,
            tile_index: (self.settings.directional.cascade_count as usize * slot) as u32,
            normal_bias: light.shadows.normal_bias,
            mask_channel,
            has_shadow_map: true,
        }
    }

    /// Tries to reserve atlas tiles for a spot (one tile) or point (six tiles) light.
    ///
    /// Point lights are admitted whole or not at all.
    pub fn reserve_other_shadows(
        &mut self,
        light: &VisibleLight,
        visible_light_index: usize,
        culling: &dyn CullingResults,
    ) -> OtherShadowData {
        if !light.wants_shadows() {
            return OtherShadowData::NONE;
        }
        let mask_channel = self.track_mask_channel(light);
        let is_point = light.kind == LightKind::Point;
        let new_count = self.other_tile_count + if is_point { POINT_LIGHT_TILE_COUNT } else { 1 };
        if new_count > MAX_SHADOWED_OTHER_LIGHT_COUNT
            || culling.shadow_caster_bounds(visible_light_index).is_none()
        {
            return OtherShadowData::baked_only(light.shadows.strength, mask_channel);
        }

        let first_tile = self.other_tile_count;
        self.other.push(ShadowedOtherLight {
            visible_light_index,
            slope_scale_bias: light.shadows.bias,
            normal_bias: light.shadows.normal_bias,
            is_point,
            first_tile,
        });
        self.other_tile_count = new_count;
        OtherShadowData {
            strength: light.shadows.strength,
            tile_index: first_tile as u32,
            is_point,
            mask_channel,
            has_shadow_map: true,
        }
    }

    /// Renders both atlases and uploads the shadow globals.
    ///
    /// Without admitted directional lights a 1×1 placeholder atlas is bound so
    /// shaders always have a valid texture; without spot/point tiles the other
    /// atlas aliases the directional one.
    pub fn render(
        &mut self,
        ctx: &mut dyn RenderContext,
        culling: &dyn CullingResults,
        buffers: &mut ShadowBuffers,
    ) {
        if self.directional.is_empty() {
            self.buffer
                .get_temporary(DIRECTIONAL_SHADOW_ATLAS, TemporaryTextureDesc::shadow_map(1, 1));
            self.directional_atlas_acquired = true;
        } else {
            self.render_directional_shadows(ctx, culling, buffers);
        }
        if self.other.is_empty() {
            self.buffer.set_global_texture(
                OTHER_SHADOW_ATLAS,
                RenderTarget::Temporary(DIRECTIONAL_SHADOW_ATLAS),
            );
        } else {
            self.render_other_shadows(ctx, culling, buffers);
        }

        self.buffer.begin_sample();
        let mask_variant = self.shadow_mask_in_use.then(|| match self.settings.shadowmask_mode {
            ShadowmaskMode::Shadowmask => 0,
            ShadowmaskMode::DistanceShadowmask => 1,
        });
        self.buffer.set_keyword_family(&SHADOW_MASK_KEYWORDS, mask_variant);

        let cascade_count = if self.directional.is_empty() {
            0
        } else {
            self.settings.directional.cascade_count as i32
        };
        self.buffer.set_global_int(CASCADE_COUNT, cascade_count);

        let f = 1.0 - self.settings.directional.cascade_fade;
        self.buffer.set_global_vector(
            SHADOW_DISTANCE_FADE,
            Vec4::new(
                1.0 / self.settings.max_distance,
                1.0 / self.settings.distance_fade,
                1.0 / (1.0 - f * f),
                0.0,
            ),
        );
        let dir_size = self.settings.directional.atlas_size.pixels() as f32;
        let other_size = self.settings.other.atlas_size.pixels() as f32;
        self.buffer.set_global_vector(
            SHADOW_ATLAS_SIZE,
            Vec4::new(dir_size, 1.0 / dir_size, other_size, 1.0 / other_size),
        );
        self.buffer.end_sample();
        execute_and_clear(ctx, &mut self.buffer);

        log::trace!(
            "Shadows: {} directional, {} other tiles, shadow mask {}",
            self.directional.len(),
            self.other_tile_count,
            self.shadow_mask_in_use
        );
    }

    fn begin_atlas(
        &mut self,
        ctx: &mut dyn RenderContext,
        id: ShaderPropertyId,
        size: u32,
        pancaking: bool,
    ) {
        self.buffer
            .get_temporary(id, TemporaryTextureDesc::shadow_map(size, size));
        self.buffer.set_render_target(
            RenderTarget::Temporary(id),
            LoadAction::DontCare,
            StoreAction::Store,
        );
        self.buffer
            .clear_render_target(true, false, LinearRgba::TRANSPARENT);
        self.buffer
            .set_global_float(SHADOW_PANCAKING, if pancaking { 1.0 } else { 0.0 });
        self.buffer.begin_sample();
        execute_and_clear(ctx, &mut self.buffer);
    }

    fn draw_tile(
        &mut self,
        ctx: &mut dyn RenderContext,
        view: Mat4,
        projection: Mat4,
        slope_scale_bias: f32,
        settings: ShadowDrawingSettings,
    ) {
        self.buffer.set_view_projection(view, projection);
        self.buffer.set_global_depth_bias(0.0, slope_scale_bias);
        execute_and_clear(ctx, &mut self.buffer);
        ctx.draw_shadows(&settings);
        self.buffer.set_global_depth_bias(0.0, 0.0);
    }

    fn render_directional_shadows(
        &mut self,
        ctx: &mut dyn RenderContext,
        culling: &dyn CullingResults,
        buffers: &mut ShadowBuffers,
    ) {
        let atlas_size = self.settings.directional.atlas_size.pixels();
        self.begin_atlas(ctx, DIRECTIONAL_SHADOW_ATLAS, atlas_size, true);
        self.directional_atlas_acquired = true;

        let cascade_count = self.settings.directional.cascade_count as usize;
        let layout = AtlasLayout::new(atlas_size, self.directional.len() * cascade_count);
        for slot in 0..self.directional.len() {
            self.render_directional_light(ctx, culling, buffers, slot, &layout);
        }

        self.buffer
            .set_global_vector_array(CASCADE_CULLING_SPHERES, &buffers.cascade_culling_spheres);
        self.buffer
            .set_global_vector_array(CASCADE_DATA, &buffers.cascade_data);
        self.buffer
            .set_global_matrix_array(DIRECTIONAL_SHADOW_MATRICES, &buffers.directional_matrices);
        self.buffer.set_keyword_family(
            &DIRECTIONAL_FILTER_KEYWORDS,
            self.settings.directional.filter.keyword_index(),
        );
        self.buffer.set_keyword_family(
            &CASCADE_BLEND_KEYWORDS,
            self.settings.directional.cascade_blend.keyword_index(),
        );
        self.buffer.end_sample();
        execute_and_clear(ctx, &mut self.buffer);
    }

    fn render_directional_light(
        &mut self,
        ctx: &mut dyn RenderContext,
        culling: &dyn CullingResults,
        buffers: &mut ShadowBuffers,
        slot: usize,
        layout: &AtlasLayout,
    ) {
        let light = self.directional[slot];
        let settings = self.settings.directional;
        let cascade_count = settings.cascade_count as usize;
        let ratios = settings.cascade_ratios();
        let culling_factor = (0.8 - settings.cascade_fade).max(0.0);
        let tile_scale = layout.tile_scale();
        let first_tile = slot * cascade_count;

        for cascade in 0..cascade_count {
            let Some(matrices) = culling.compute_directional_shadow_matrices(
                light.visible_light_index,
                cascade,
                cascade_count,
                ratios,
                layout.tile_size,
                light.near_plane_offset,
            ) else {
                log::debug!(
                    "Shadows: no projection for cascade {cascade} of light {}",
                    light.visible_light_index
                );
                continue;
            };
            let split_data = ShadowSplitData {
                shadow_cascade_blend_culling_factor: culling_factor,
                ..matrices.split_data
            };
            if !self.seeded_cascades[cascade] {
                self.seeded_cascades[cascade] = true;
                let (sphere, data) =
                    cascade_data(split_data.culling_sphere, layout.tile_size as f32, settings.filter);
                buffers.cascade_culling_spheres[cascade] = sphere;
                buffers.cascade_data[cascade] = data;
            }

            let tile_index = first_tile + cascade;
            let offset = layout.tile_offset(tile_index);
            self.buffer.set_viewport(layout.tile_viewport(offset));
            buffers.directional_matrices[tile_index] = convert_to_atlas_matrix(
                matrices.projection * matrices.view,
                offset,
                tile_scale,
                self.reversed_z,
            );
            self.draw_tile(
                ctx,
                matrices.view,
                matrices.projection,
                light.slope_scale_bias,
                ShadowDrawingSettings {
                    visible_light_index: light.visible_light_index,
                    split_data,
                    projection: ShadowProjection::Orthographic,
                },
            );
        }
    }

    fn render_other_shadows(
        &mut self,
        ctx: &mut dyn RenderContext,
        culling: &dyn CullingResults,
        buffers: &mut ShadowBuffers,
    ) {
        let atlas_size = self.settings.other.atlas_size.pixels();
        self.begin_atlas(ctx, OTHER_SHADOW_ATLAS, atlas_size, false);
        self.other_atlas_acquired = true;

        let layout = AtlasLayout::new(atlas_size, self.other_tile_count);
        for slot in 0..self.other.len() {
            let light = self.other[slot];
            if light.is_point {
                self.render_point_shadows(ctx, culling, buffers, light, &layout);
            } else {
                self.render_spot_shadows(ctx, culling, buffers, light, &layout);
            }
        }

        self.buffer
            .set_global_matrix_array(OTHER_SHADOW_MATRICES, &buffers.other_matrices);
        self.buffer
            .set_global_vector_array(OTHER_SHADOW_TILES, &buffers.other_tiles);
        self.buffer.set_keyword_family(
            &OTHER_FILTER_KEYWORDS,
            self.settings.other.filter.keyword_index(),
        );
        self.buffer.end_sample();
        execute_and_clear(ctx, &mut self.buffer);
    }

    fn set_other_tile_data(
        &self,
        buffers: &mut ShadowBuffers,
        index: usize,
        offset: Vec2,
        scale: f32,
        bias: f32,
    ) {
        let border = 1.0 / self.settings.other.atlas_size.pixels() as f32 * 0.5;
        buffers.other_tiles[index] = Vec4::new(
            offset.x * scale + border,
            offset.y * scale + border,
            scale - border - border,
            bias,
        );
    }

    fn render_spot_shadows(
        &mut self,
        ctx: &mut dyn RenderContext,
        culling: &dyn CullingResults,
        buffers: &mut ShadowBuffers,
        light: ShadowedOtherLight,
        layout: &AtlasLayout,
    ) {
        let Some(matrices) = culling.compute_spot_shadow_matrices(light.visible_light_index) else {
            log::debug!(
                "Shadows: no projection for spot light {}",
                light.visible_light_index
            );
            return;
        };
        let texel_size = 2.0 / (layout.tile_size as f32 * matrices.projection.element(0, 0));
        let filter_size = texel_size * self.settings.other.filter.texel_scale();
        let bias = light.normal_bias * filter_size * SQRT_2;
        let offset = layout.tile_offset(light.first_tile);
        let tile_scale = layout.tile_scale();

        self.buffer.set_viewport(layout.tile_viewport(offset));
        self.set_other_tile_data(buffers, light.first_tile, offset, tile_scale, bias);
        buffers.other_matrices[light.first_tile] = convert_to_atlas_matrix(
            matrices.projection * matrices.view,
            offset,
            tile_scale,
            self.reversed_z,
        );
        self.draw_tile(
            ctx,
            matrices.view,
            matrices.projection,
            light.slope_scale_bias,
            ShadowDrawingSettings {
                visible_light_index: light.visible_light_index,
                split_data: matrices.split_data,
                projection: ShadowProjection::Perspective,
            },
        );
    }

    fn render_point_shadows(
        &mut self,
        ctx: &mut dyn RenderContext,
        culling: &dyn CullingResults,
        buffers: &mut ShadowBuffers,
        light: ShadowedOtherLight,
        layout: &AtlasLayout,
    ) {
        let texel_size = 2.0 / layout.tile_size as f32;
        let filter_size = texel_size * self.settings.other.filter.texel_scale();
        let bias = light.normal_bias * filter_size * SQRT_2;
        let tile_scale = layout.tile_scale();
        let fov_bias = (1.0 + bias + filter_size).atan() * RAD_TO_DEG * 2.0 - 90.0;

        for (face_index, face) in CubemapFace::ALL.into_iter().enumerate() {
            let Some(matrices) =
                culling.compute_point_shadow_matrices(light.visible_light_index, face, fov_bias)
            else {
                log::debug!(
                    "Shadows: no projection for face {face:?} of point light {}",
                    light.visible_light_index
                );
                continue;
            };
            // Cube faces come back upside down; flip them so winding stays consistent.
            let mut view = matrices.view;
            let row1 = view.get_row(1);
            view.set_row(1, Vec4::new(row1.x, -row1.y, -row1.z, -row1.w));

            let tile_index = light.first_tile + face_index;
            let offset = layout.tile_offset(tile_index);
            self.buffer.set_viewport(layout.tile_viewport(offset));
            self.set_other_tile_data(buffers, tile_index, offset, tile_scale, bias);
            buffers.other_matrices[tile_index] = convert_to_atlas_matrix(
                matrices.projection * view,
                offset,
                tile_scale,
                self.reversed_z,
            );
            self.draw_tile(
                ctx,
                view,
                matrices.projection,
                light.slope_scale_bias,
                ShadowDrawingSettings {
                    visible_light_index: light.visible_light_index,
                    split_data: matrices.split_data,
                    projection: ShadowProjection::Perspective,
                },
            );
        }
    }

    /// Releases the atlases acquired by [`render`](Self::render).
    pub fn cleanup(&mut self, ctx: &mut dyn RenderContext) {
        if self.directional_atlas_acquired {
            self.buffer.release_temporary(DIRECTIONAL_SHADOW_ATLAS);
            self.directional_atlas_acquired = false;
        }
        if self.other_atlas_acquired {
            self.buffer.release_temporary(OTHER_SHADOW_ATLAS);
            self.other_atlas_acquired = false;
        }
        execute_and_clear(ctx, &mut self.buffer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use umbra_core::math::Vec3;
    use umbra_core::renderer::settings::{CascadeBlendMode, ShadowAtlasSize};
    use umbra_core::renderer::{
        Bounds, CullingParameters, LightBakeType, LightBakingOutput, LightShadowSettings,
        LightShadows, MixedLightingMode,
    };
    use umbra_infra::{HeadlessContext, HeadlessCulling, HeadlessScene};

    fn parameters() -> CullingParameters {
        CullingParameters {
            position: Vec3::ZERO,
            forward: Vec3::new(0.0, 0.0, -1.0),
            up: Vec3::Y,
            field_of_view: 60.0,
            aspect: 1.0,
            near_clip: 0.3,
            far_clip: 200.0,
            shadow_distance: 100.0,
            culling_mask: u32::MAX,
        }
    }

    fn caster() -> Option<Bounds> {
        Some(Bounds {
            center: Vec3::new(0.0, 0.0, -4.0),
            extents: Vec3::ONE,
        })
    }

    fn soft(light: VisibleLight, strength: f32) -> VisibleLight {
        light.with_shadows(LightShadowSettings {
            mode: LightShadows::Soft,
            strength,
            ..Default::default()
        })
    }

    fn sun() -> VisibleLight {
        soft(
            VisibleLight::directional(LinearRgba::WHITE, Mat4::from_rotation_x(-0.9)),
            1.0,
        )
    }

    fn lamp() -> VisibleLight {
        soft(
            VisibleLight::point(LinearRgba::WHITE, Vec3::new(0.0, 2.0, -3.0), 8.0),
            1.0,
        )
    }

    fn spot() -> VisibleLight {
        soft(
            VisibleLight::spot(
                LinearRgba::WHITE,
                Mat4::from_translation(Vec3::new(1.0, 3.0, 0.0)) * Mat4::from_rotation_x(-1.2),
                10.0,
                45.0,
                30.0,
            ),
            1.0,
        )
    }

    fn shadows_with(settings: ShadowSettings) -> Shadows {
        let mut shadows = Shadows::new();
        shadows.setup(&settings, DeviceCapabilities::default());
        shadows
    }

    #[test]
    fn test_fifth_directional_light_gets_no_slot() {
        let culling = HeadlessCulling::from_lights(vec![(sun(), caster()); 5], parameters());
        let mut shadows = shadows_with(ShadowSettings::default());
        let data: Vec<_> = (0..5)
            .map(|i| shadows.reserve_directional_shadow(&sun(), i, &culling))
            .collect();
        assert_eq!(shadows.directional_count(), 4);
        for (slot, d) in data.iter().take(4).enumerate() {
            assert!(d.has_shadow_map);
            assert_eq!(d.tile_index, 4 * slot as u32);
        }
        assert_eq!(data[4], DirectionalShadowData::NONE);
        assert_eq!(data[4].to_vec4(), Vec4::new(0.0, 0.0, 0.0, -1.0));
    }

    #[test]
    fn test_light_without_casters_is_baked_only() {
        let light = soft(
            VisibleLight::directional(LinearRgba::WHITE, Mat4::IDENTITY),
            0.6,
        );
        let culling = HeadlessCulling::from_lights(vec![(light, None)], parameters());
        let mut shadows = shadows_with(ShadowSettings::default());
        let data = shadows.reserve_directional_shadow(&light, 0, &culling);
        assert!(!data.has_shadow_map);
        assert_eq!(shadows.directional_count(), 0);
        assert_relative_eq!(data.to_vec4().x, -0.6);
    }

    #[test]
    fn test_light_without_shadows_reserves_nothing() {
        let light = VisibleLight::point(LinearRgba::WHITE, Vec3::ZERO, 4.0);
        let culling = HeadlessCulling::from_lights(vec![(light, caster())], parameters());
        let mut shadows = shadows_with(ShadowSettings::default());
        assert_eq!(
            shadows.reserve_other_shadows(&light, 0, &culling),
            OtherShadowData::NONE
        );
        assert_eq!(shadows.other_tile_count(), 0);
        assert!(!shadows.shadow_mask_in_use());
    }

    #[test]
    fn test_point_light_is_rejected_whole_when_tiles_run_out() {
        let mut lights = vec![(spot(), caster()); 11];
        lights.push((lamp(), caster()));
        let culling = HeadlessCulling::from_lights(lights, parameters());
        let mut shadows = shadows_with(ShadowSettings::default());
        for i in 0..11 {
            assert!(shadows.reserve_other_shadows(&spot(), i, &culling).has_shadow_map);
        }
        let point = shadows.reserve_other_shadows(&lamp(), 11, &culling);
        assert!(!point.has_shadow_map);
        assert_eq!(shadows.other_tile_count(), 11);
        assert_relative_eq!(point.to_vec4().x, -1.0);
    }

    #[test]
    fn test_point_light_owns_six_tiles() {
        let culling = HeadlessCulling::from_lights(
            vec![(spot(), caster()), (lamp(), caster())],
            parameters(),
        );
        let mut shadows = shadows_with(ShadowSettings::default());
        let s = shadows.reserve_other_shadows(&spot(), 0, &culling);
        let p = shadows.reserve_other_shadows(&lamp(), 1, &culling);
        assert_eq!(s.tile_index, 0);
        assert_eq!(p.tile_index, 1);
        assert_eq!(p.to_vec4().z, 1.0);
        assert_eq!(shadows.other_tile_count(), 7);
    }

    #[test]
    fn test_shadow_mask_usage_is_tracked() {
        let light = sun().with_baking(LightBakingOutput {
            bake_type: LightBakeType::Mixed,
            mixed_lighting_mode: MixedLightingMode::Shadowmask,
            occlusion_mask_channel: 1,
        });
        let culling = HeadlessCulling::from_lights(vec![(light, None)], parameters());
        let mut shadows = shadows_with(ShadowSettings::default());
        let data = shadows.reserve_directional_shadow(&light, 0, &culling);
        assert_eq!(data.mask_channel, 1);
        assert!(shadows.shadow_mask_in_use());

        let mut ctx = HeadlessContext::new(HeadlessScene::new());
        shadows.render(&mut ctx, &culling, &mut ShadowBuffers::default());
        assert_eq!(ctx.keyword_state("_SHADOW_MASK_DISTANCE"), Some(true));
        assert_eq!(ctx.keyword_state("_SHADOW_MASK_ALWAYS"), Some(false));
    }

    #[test]
    fn test_empty_frame_binds_placeholder_and_releases_it() {
        let culling = HeadlessCulling::from_lights(Vec::new(), parameters());
        let mut shadows = shadows_with(ShadowSettings::default());
        let mut ctx = HeadlessContext::new(HeadlessScene::new());
        shadows.render(&mut ctx, &culling, &mut ShadowBuffers::default());

        let placeholder = ctx.pool().get(DIRECTIONAL_SHADOW_ATLAS).copied();
        assert_eq!(placeholder.map(|d| (d.width, d.height)), Some((1, 1)));
        assert_eq!(ctx.last_int(CASCADE_COUNT), Some(0));
        assert!(ctx.shadow_draws().is_empty());

        shadows.cleanup(&mut ctx);
        assert_eq!(ctx.pool().outstanding(), 0);
        assert!(ctx.pool().violations().is_empty());
    }

    #[test]
    fn test_distance_fade_and_atlas_size_globals() {
        let mut settings = ShadowSettings::default();
        settings.max_distance = 50.0;
        settings.distance_fade = 0.2;
        settings.directional.cascade_fade = 0.5;
        settings.other.atlas_size = ShadowAtlasSize::Size512;
        let culling = HeadlessCulling::from_lights(Vec::new(), parameters());
        let mut shadows = shadows_with(settings);
        let mut ctx = HeadlessContext::new(HeadlessScene::new());
        shadows.render(&mut ctx, &culling, &mut ShadowBuffers::default());

        let fade = ctx.last_vector(SHADOW_DISTANCE_FADE).unwrap();
        assert_relative_eq!(fade.x, 0.02);
        assert_relative_eq!(fade.y, 5.0);
        assert_relative_eq!(fade.z, 1.0 / 0.75);
        let size = ctx.last_vector(SHADOW_ATLAS_SIZE).unwrap();
        assert_eq!(size, Vec4::new(1024.0, 1.0 / 1024.0, 512.0, 1.0 / 512.0));
    }

    #[test]
    fn test_two_cascades_split_atlas_in_half() {
        let mut settings = ShadowSettings::default();
        settings.directional.cascade_count = 2;
        settings.directional.cascade_ratio_1 = 0.3;
        settings.directional.filter = ShadowFilter::Pcf5x5;
        settings.directional.cascade_blend = CascadeBlendMode::Dither;
        let culling = HeadlessCulling::from_lights(vec![(sun(), caster())], parameters());
        let mut shadows = shadows_with(settings);
        let data = shadows.reserve_directional_shadow(&sun(), 0, &culling);
        assert!(data.has_shadow_map);

        let mut ctx = HeadlessContext::new(HeadlessScene::new());
        let mut buffers = ShadowBuffers::default();
        shadows.render(&mut ctx, &culling, &mut buffers);

        let draws = ctx.shadow_draws();
        assert_eq!(draws.len(), 2);
        assert!(draws
            .iter()
            .all(|d| d.projection == ShadowProjection::Orthographic));
        assert_relative_eq!(draws[0].split_data.shadow_cascade_blend_culling_factor, 0.7);

        let r0 = buffers.cascade_culling_spheres[0].w;
        let r1 = buffers.cascade_culling_spheres[1].w;
        assert!(r0 > 0.0 && r0 <= r1);
        assert_relative_eq!(buffers.cascade_data[0].x, 1.0 / r0);

        assert_eq!(ctx.last_int(CASCADE_COUNT), Some(2));
        assert_eq!(ctx.last_float(SHADOW_PANCAKING), Some(1.0));
        assert_eq!(ctx.keyword_state("_DIRECTIONAL_PCF5"), Some(true));
        assert_eq!(ctx.keyword_state("_DIRECTIONAL_PCF3"), Some(false));
        assert_eq!(ctx.keyword_state("_CASCADE_BLEND_DITHER"), Some(true));
        assert_eq!(
            ctx.last_matrix_array(DIRECTIONAL_SHADOW_MATRICES).map(|m| m.len()),
            Some(16)
        );

        shadows.cleanup(&mut ctx);
        assert_eq!(ctx.pool().outstanding(), 0);
    }

    #[test]
    fn test_cascade_count_is_clamped_to_the_cascade_arrays() {
        let mut settings = ShadowSettings::default();
        settings.directional.cascade_count = 5;
        let culling = HeadlessCulling::from_lights(vec![(sun(), caster())], parameters());
        let mut shadows = shadows_with(settings);
        let data = shadows.reserve_directional_shadow(&sun(), 0, &culling);
        assert!(data.has_shadow_map);

        let mut ctx = HeadlessContext::new(HeadlessScene::new());
        shadows.render(&mut ctx, &culling, &mut ShadowBuffers::default());
        assert_eq!(ctx.shadow_draws().len(), MAX_CASCADE_COUNT);
        assert_eq!(ctx.last_int(CASCADE_COUNT), Some(MAX_CASCADE_COUNT as i32));

        settings.directional.cascade_count = 0;
        let mut shadows = shadows_with(settings);
        shadows.reserve_directional_shadow(&sun(), 0, &culling);
        let mut ctx = HeadlessContext::new(HeadlessScene::new());
        shadows.render(&mut ctx, &culling, &mut ShadowBuffers::default());
        assert_eq!(ctx.shadow_draws().len(), 1);
        shadows.cleanup(&mut ctx);
        assert_eq!(ctx.pool().outstanding(), 0);
    }

    #[test]
    fn test_spot_and_point_fill_a_four_way_split() {
        let culling = HeadlessCulling::from_lights(
            vec![(spot(), caster()), (lamp(), caster())],
            parameters(),
        );
        let mut shadows = shadows_with(ShadowSettings::default());
        shadows.reserve_other_shadows(&spot(), 0, &culling);
        shadows.reserve_other_shadows(&lamp(), 1, &culling);

        let mut ctx = HeadlessContext::new(HeadlessScene::new());
        let mut buffers = ShadowBuffers::default();
        shadows.render(&mut ctx, &culling, &mut buffers);

        let draws = ctx.shadow_draws();
        assert_eq!(draws.len(), 7);
        assert!(draws
            .iter()
            .all(|d| d.projection == ShadowProjection::Perspective));
        assert_eq!(ctx.last_float(SHADOW_PANCAKING), Some(0.0));

        // 1024 atlas split four ways: 256 px tiles, scale 0.25.
        let border = 0.5 / 1024.0;
        let second = buffers.other_tiles[1];
        assert_relative_eq!(second.x, 0.25 + border);
        assert_relative_eq!(second.y, border);
        assert_relative_eq!(second.z, 0.25 - 2.0 * border);
        assert!(second.w > 0.0);
        assert_eq!(ctx.keyword_state("_OTHER_PCF3"), Some(false));

        shadows.cleanup(&mut ctx);
        assert_eq!(ctx.pool().outstanding(), 0);
        assert!(ctx.pool().violations().is_empty());
    }

    #[test]
    fn test_cascade_data_shrinks_sphere_by_filter() {
        let (sphere, data) =
            cascade_data(Vec4::new(1.0, 2.0, 3.0, 10.0), 512.0, ShadowFilter::Pcf3x3);
        let filter = 2.0 * 10.0 / 512.0 * 2.0;
        assert_relative_eq!(sphere.w, (10.0 - filter) * (10.0 - filter));
        assert_relative_eq!(data.x, 1.0 / sphere.w);
        assert_relative_eq!(data.y, filter * SQRT_2);
        assert_eq!(sphere.truncate(), Vec3::new(1.0, 2.0, 3.0));
    }
}
