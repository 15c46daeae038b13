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

//! The light collector.

use super::ids::*;
use super::{LightBuffers, LightingArena, LIGHTS_PER_OBJECT_KEYWORD};
use super::{MAX_DIRECTIONAL_LIGHT_COUNT, MAX_OTHER_LIGHT_COUNT};
use crate::shadow_lane::Shadows;
use umbra_core::lane::{Lane, LaneKind};
use umbra_core::math::{degrees_to_radians, reinterpret_as_float, Vec4};
use umbra_core::renderer::settings::ShadowSettings;
use umbra_core::renderer::{
    execute_and_clear, CommandBuffer, CullingResults, DeviceCapabilities, LightKind,
    RenderContext, VisibleLight,
};

/// Per-camera options of the light collector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightingOptions {
    /// Whether objects receive their own light index lists.
    pub use_lights_per_object: bool,
    /// Lights whose layer mask shares no bit with this are skipped.
    pub rendering_layer_mask: u32,
}

impl Default for LightingOptions {
    fn default() -> Self {
        Self {
            use_lights_per_object: true,
            rendering_layer_mask: u32::MAX,
        }
    }
}

/// Cone attenuation factors `(a, b)` so that `saturate(dot * a + b)` falls
/// from one at the inner angle to zero at the outer angle (both in degrees).
pub fn spot_angle_factors(inner_spot_angle: f32, outer_spot_angle: f32) -> (f32, f32) {
    let inner_cos = degrees_to_radians(0.5 * inner_spot_angle).cos();
    let outer_cos = degrees_to_radians(0.5 * outer_spot_angle).cos();
    let angle_range_inv = 1.0 / (inner_cos - outer_cos).max(0.001);
    (angle_range_inv, -outer_cos * angle_range_inv)
}

/// Position with the inverse squared range packed into `w`.
fn position_and_range(light: &VisibleLight) -> Vec4 {
    light
        .position()
        .with_w(1.0 / (light.range * light.range).max(0.00001))
}

/// Collects visible lights into [`LightBuffers`] and drives the [`Shadows`] lane.
#[derive(Debug)]
pub struct Lighting {
    buffer: CommandBuffer,
    shadows: Shadows,
}

impl Default for Lighting {
    fn default() -> Self {
        Self::new()
    }
}

impl Lane for Lighting {
    fn strategy_name(&self) -> &'static str {
        "Lighting"
    }

    fn lane_kind(&self) -> LaneKind {
        LaneKind::Lighting
    }
}

impl Lighting {
    /// Creates a collector with its own shadow allocator.
    pub fn new() -> Self {
        Self {
            buffer: CommandBuffer::new("Lighting"),
            shadows: Shadows::new(),
        }
    }

    /// The shadow allocator driven by this collector.
    pub fn shadows(&self) -> &Shadows {
        &self.shadows
    }

    /// Collects the camera's lights, reserves and renders their shadows and
    /// uploads the light tables.
    pub fn setup(
        &mut self,
        ctx: &mut dyn RenderContext,
        culling: &mut dyn CullingResults,
        shadow_settings: &ShadowSettings,
        capabilities: DeviceCapabilities,
        options: LightingOptions,
        arena: &mut LightingArena,
    ) {
        self.buffer.begin_sample();
        execute_and_clear(ctx, &mut self.buffer);

        self.shadows.setup(shadow_settings, capabilities);
        let LightingArena { lights, shadows } = arena;
        self.collect_lights(culling, options, lights);
        self.shadows.render(ctx, &*culling, shadows);
        self.upload_lights(lights);

        self.buffer.end_sample();
        execute_and_clear(ctx, &mut self.buffer);
    }

    fn collect_lights(
        &mut self,
        culling: &mut dyn CullingResults,
        options: LightingOptions,
        lights: &mut LightBuffers,
    ) {
        lights.reset();
        let visible: &dyn CullingResults = &*culling;
        let visible_count = visible.visible_lights().len();
        let mut index_map = if options.use_lights_per_object {
            visible.light_index_map()
        } else {
            Vec::new()
        };

        for (i, light) in visible.visible_lights().iter().enumerate() {
            let mut new_index = -1;
            if light.rendering_layer_mask & options.rendering_layer_mask != 0 {
                match light.kind {
                    LightKind::Directional => {
                        if (lights.directional_count as usize) < MAX_DIRECTIONAL_LIGHT_COUNT {
                            self.setup_directional_light(lights, i, light, visible);
                        }
                    }
                    LightKind::Point | LightKind::Spot => {
                        if (lights.other_count as usize) < MAX_OTHER_LIGHT_COUNT {
                            new_index = lights.other_count as i32;
                            self.setup_other_light(lights, i, light, visible);
                        }
                    }
                    LightKind::Area => {}
                }
            }
            if let Some(slot) = index_map.get_mut(i) {
                *slot = new_index;
            }
        }

        if options.use_lights_per_object {
            for slot in index_map.iter_mut().skip(visible_count) {
                *slot = -1;
            }
            culling.set_light_index_map(index_map);
            self.buffer.enable_keyword(LIGHTS_PER_OBJECT_KEYWORD);
        } else {
            self.buffer.disable_keyword(LIGHTS_PER_OBJECT_KEYWORD);
        }

        log::trace!(
            "Lighting: {} directional and {} other lights of {} visible",
            lights.directional_count,
            lights.other_count,
            visible_count
        );
    }

    fn setup_directional_light(
        &mut self,
        lights: &mut LightBuffers,
        visible_index: usize,
        light: &VisibleLight,
        culling: &dyn CullingResults,
    ) {
        let slot = lights.directional_count as usize;
        lights.directional_colors[slot] = light.final_color.to_vec4();
        lights.directional_directions_and_masks[slot] = light
            .direction()
            .with_w(reinterpret_as_float(light.rendering_layer_mask));
        lights.directional_shadow_data[slot] = self
            .shadows
            .reserve_directional_shadow(light, visible_index, culling)
            .to_vec4();
        lights.directional_count += 1;
    }

    fn setup_other_light(
        &mut self,
        lights: &mut LightBuffers,
        visible_index: usize,
        light: &VisibleLight,
        culling: &dyn CullingResults,
    ) {
        let slot = lights.other_count as usize;
        let mask = reinterpret_as_float(light.rendering_layer_mask);
        lights.other_colors[slot] = light.final_color.to_vec4();
        lights.other_positions[slot] = position_and_range(light);
        if light.kind == LightKind::Spot {
            let (a, b) = spot_angle_factors(light.inner_spot_angle, light.spot_angle);
            lights.other_directions_and_masks[slot] = light.direction().with_w(mask);
            lights.other_spot_angles[slot] = Vec4::new(a, b, 0.0, 0.0);
        } else {
            lights.other_directions_and_masks[slot] = Vec4::new(0.0, 0.0, 0.0, mask);
            lights.other_spot_angles[slot] = Vec4::new(0.0, 1.0, 0.0, 0.0);
        }
        lights.other_shadow_data[slot] = self
            .shadows
            .reserve_other_shadows(light, visible_index, culling)
            .to_vec4();
        lights.other_count += 1;
    }

    fn upload_lights(&mut self, lights: &LightBuffers) {
        self.buffer
            .set_global_int(DIRECTIONAL_LIGHT_COUNT, lights.directional_count as i32);
        if lights.directional_count > 0 {
            self.buffer
                .set_global_vector_array(DIRECTIONAL_LIGHT_COLORS, &lights.directional_colors);
            self.buffer.set_global_vector_array(
                DIRECTIONAL_LIGHT_DIRECTIONS_AND_MASKS,
                &lights.directional_directions_and_masks,
            );
            self.buffer.set_global_vector_array(
                DIRECTIONAL_LIGHT_SHADOW_DATA,
                &lights.directional_shadow_data,
            );
        }

        self.buffer
            .set_global_int(OTHER_LIGHT_COUNT, lights.other_count as i32);
        if lights.other_count > 0 {
            self.buffer
                .set_global_vector_array(OTHER_LIGHT_COLORS, &lights.other_colors);
            self.buffer
                .set_global_vector_array(OTHER_LIGHT_POSITIONS, &lights.other_positions);
            self.buffer.set_global_vector_array(
                OTHER_LIGHT_DIRECTIONS_AND_MASKS,
                &lights.other_directions_and_masks,
            );
            self.buffer
                .set_global_vector_array(OTHER_LIGHT_SPOT_ANGLES, &lights.other_spot_angles);
            self.buffer
                .set_global_vector_array(OTHER_LIGHT_SHADOW_DATA, &lights.other_shadow_data);
        }
    }

    /// Releases everything acquired during [`setup`](Self::setup).
    pub fn cleanup(&mut self, ctx: &mut dyn RenderContext) {
        self.shadows.cleanup(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shadow_lane::ids::CASCADE_COUNT;
    use approx::assert_relative_eq;
    use umbra_core::math::{LinearRgba, Mat4, Vec3};
    use umbra_core::renderer::{Bounds, CullingParameters, LightShadowSettings, LightShadows};
    use umbra_infra::{HeadlessContext, HeadlessCulling, HeadlessScene};

    fn parameters() -> CullingParameters {
        CullingParameters {
            position: Vec3::ZERO,
            forward: Vec3::new(0.0, 0.0, -1.0),
            up: Vec3::Y,
            field_of_view: 60.0,
            aspect: 1.0,
            near_clip: 0.3,
            far_clip: 100.0,
            shadow_distance: 50.0,
            culling_mask: u32::MAX,
        }
    }

    fn run(
        lights: Vec<(VisibleLight, Option<Bounds>)>,
        options: LightingOptions,
    ) -> (Lighting, HeadlessContext, HeadlessCulling, LightingArena) {
        let mut culling = HeadlessCulling::from_lights(lights, parameters());
        let mut ctx = HeadlessContext::new(HeadlessScene::new());
        let mut lighting = Lighting::new();
        let mut arena = LightingArena::default();
        lighting.setup(
            &mut ctx,
            &mut culling,
            &ShadowSettings::default(),
            DeviceCapabilities::default(),
            options,
            &mut arena,
        );
        (lighting, ctx, culling, arena)
    }

    #[test]
    fn test_spot_angle_factors() {
        let (a, b) = spot_angle_factors(30.0, 60.0);
        let inner = 15.0_f32.to_radians().cos();
        let outer = 30.0_f32.to_radians().cos();
        assert_relative_eq!(a, 1.0 / (inner - outer));
        assert_relative_eq!(b, -outer / (inner - outer));
        // Fully attenuated at the outer edge, full strength at the inner one.
        assert_relative_eq!(outer * a + b, 0.0, epsilon = 1e-5);
        assert_relative_eq!(inner * a + b, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_degenerate_cone_is_clamped() {
        let (a, _) = spot_angle_factors(40.0, 40.0);
        assert_relative_eq!(a, 1000.0);
    }

    #[test]
    fn test_other_light_encoding() {
        let point = VisibleLight::point(LinearRgba::rgb(2.0, 1.0, 0.5), Vec3::new(1.0, 2.0, 3.0), 4.0);
        let spot = VisibleLight::spot(LinearRgba::WHITE, Mat4::IDENTITY, 0.0, 60.0, 30.0)
            .with_rendering_layer_mask(0b101);
        let (_, ctx, _, arena) = run(
            vec![(point, None), (spot, None)],
            LightingOptions::default(),
        );
        let lights = &arena.lights;
        assert_eq!(lights.other_count, 2);
        assert_eq!(lights.other_positions[0], Vec4::new(1.0, 2.0, 3.0, 1.0 / 16.0));
        assert_eq!(lights.other_spot_angles[0], Vec4::new(0.0, 1.0, 0.0, 0.0));
        assert_eq!(lights.other_colors[0], Vec4::new(2.0, 1.0, 0.5, 1.0));
        // A zero range must not divide by zero.
        assert_relative_eq!(lights.other_positions[1].w, 1e5, max_relative = 1e-3);

        let direction = lights.other_directions_and_masks[1];
        assert_eq!(direction.truncate(), Vec3::new(0.0, 0.0, -1.0));
        assert_eq!(direction.w.to_bits(), 0b101);

        assert_eq!(ctx.last_int(OTHER_LIGHT_COUNT), Some(2));
        assert_eq!(ctx.last_int(DIRECTIONAL_LIGHT_COUNT), Some(0));
        assert!(ctx.last_vector_array(DIRECTIONAL_LIGHT_COLORS).is_none());
        assert_eq!(
            ctx.last_vector_array(OTHER_LIGHT_COLORS).map(|a| a.len()),
            Some(MAX_OTHER_LIGHT_COUNT)
        );
    }

    #[test]
    fn test_light_index_map_is_remapped() {
        let sun = VisibleLight::directional(LinearRgba::WHITE, Mat4::IDENTITY);
        let lamp = VisibleLight::point(LinearRgba::WHITE, Vec3::ZERO, 3.0);
        let area = VisibleLight {
            kind: LightKind::Area,
            ..lamp
        };
        let mut culling = HeadlessCulling::from_lights(
            vec![(sun, None), (lamp, None), (area, None), (lamp, None)],
            parameters(),
        )
        .with_index_map_len(6);
        let mut ctx = HeadlessContext::new(HeadlessScene::new());
        let mut lighting = Lighting::new();
        let mut arena = LightingArena::default();
        lighting.setup(
            &mut ctx,
            &mut culling,
            &ShadowSettings::default(),
            DeviceCapabilities::default(),
            LightingOptions::default(),
            &mut arena,
        );
        assert_eq!(culling.light_index_map(), vec![-1, 0, -1, 1, -1, -1]);
        assert_eq!(ctx.keyword_state(LIGHTS_PER_OBJECT_KEYWORD), Some(true));
    }

    #[test]
    fn test_index_map_untouched_without_lights_per_object() {
        let lamp = VisibleLight::point(LinearRgba::WHITE, Vec3::ZERO, 3.0);
        let options = LightingOptions {
            use_lights_per_object: false,
            ..Default::default()
        };
        let (_, ctx, culling, arena) = run(vec![(lamp, None), (lamp, None)], options);
        assert_eq!(culling.light_index_map(), vec![0, 1]);
        assert_eq!(arena.lights.other_count, 2);
        assert_eq!(ctx.keyword_state(LIGHTS_PER_OBJECT_KEYWORD), Some(false));
    }

    #[test]
    fn test_masked_lights_are_skipped() {
        let sun = VisibleLight::directional(LinearRgba::WHITE, Mat4::IDENTITY);
        let lamp = VisibleLight::point(LinearRgba::WHITE, Vec3::ZERO, 3.0);
        let options = LightingOptions {
            rendering_layer_mask: 0b10,
            ..Default::default()
        };
        let (_, _, culling, arena) = run(
            vec![
                (sun.with_rendering_layer_mask(0b01), None),
                (sun.with_rendering_layer_mask(0b11), None),
                (lamp.with_rendering_layer_mask(0b01), None),
            ],
            options,
        );
        assert_eq!(arena.lights.directional_count, 1);
        assert_eq!(arena.lights.other_count, 0);
        assert_eq!(culling.light_index_map(), vec![-1, -1, -1]);
    }

    #[test]
    fn test_directional_capacity() {
        let sun = VisibleLight::directional(LinearRgba::WHITE, Mat4::from_rotation_y(0.3));
        let (_, ctx, _, arena) = run(vec![(sun, None); 6], LightingOptions::default());
        assert_eq!(arena.lights.directional_count, 4);
        assert_eq!(ctx.last_int(DIRECTIONAL_LIGHT_COUNT), Some(4));
        let direction = arena.lights.directional_directions_and_masks[0];
        assert_eq!(direction.w.to_bits(), 1);
        assert_relative_eq!(direction.truncate().length(), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_shadow_data_flows_into_light_tables() {
        let sun = VisibleLight::directional(LinearRgba::WHITE, Mat4::from_rotation_x(-0.9))
            .with_shadows(LightShadowSettings {
                mode: LightShadows::Hard,
                strength: 0.8,
                ..Default::default()
            });
        let caster = Some(Bounds {
            center: Vec3::new(0.0, 0.0, -5.0),
            extents: Vec3::ONE,
        });
        let (mut lighting, mut ctx, _, arena) =
            run(vec![(sun, caster), (sun, None)], LightingOptions::default());
        assert_eq!(lighting.shadows().directional_count(), 1);
        assert_eq!(arena.lights.directional_shadow_data[0], Vec4::new(0.8, 0.0, 0.4, -1.0));
        assert_relative_eq!(arena.lights.directional_shadow_data[1].x, -0.8);
        assert_eq!(ctx.last_int(CASCADE_COUNT), Some(4));

        lighting.cleanup(&mut ctx);
        assert_eq!(ctx.pool().outstanding(), 0);
    }

    #[test]
    fn test_setup_and_cleanup_with_nothing_leaves_no_temporaries() {
        let (mut lighting, mut ctx, _, arena) = run(Vec::new(), LightingOptions::default());
        assert_eq!(arena.lights.directional_count, 0);
        assert_eq!(arena.lights.other_count, 0);
        lighting.cleanup(&mut ctx);
        assert_eq!(ctx.pool().outstanding(), 0);
        assert!(ctx.pool().violations().is_empty());
    }
}
