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

//! Math-based culling for the headless backend.

use umbra_core::math::{degrees_to_radians, Mat4, Vec3, Vec4};
use umbra_core::renderer::{
    Bounds, CubemapFace, CullingParameters, CullingResults, LightKind, ShadowMatrices,
    ShadowSplitData, VisibleLight,
};

/// The lights of a headless scene and the shadow casters each one sees.
#[derive(Debug, Clone, Default)]
pub struct HeadlessScene {
    lights: Vec<VisibleLight>,
    caster_bounds: Vec<Option<Bounds>>,
}

impl HeadlessScene {
    /// Creates an empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a light. `casters` are the bounds of the shadow casters it sees.
    pub fn with_light(mut self, light: VisibleLight, casters: Option<Bounds>) -> Self {
        self.push_light(light, casters);
        self
    }

    /// Adds a light in place.
    pub fn push_light(&mut self, light: VisibleLight, casters: Option<Bounds>) {
        self.lights.push(light);
        self.caster_bounds.push(casters);
    }

    /// Number of lights in the scene, visible or not.
    pub fn light_count(&self) -> usize {
        self.lights.len()
    }

    pub(crate) fn cull(&self, parameters: &CullingParameters) -> HeadlessCulling {
        let mut lights = Vec::new();
        let mut caster_bounds = Vec::new();
        for (light, casters) in self.lights.iter().zip(&self.caster_bounds) {
            if !is_light_visible(light, parameters) {
                continue;
            }
            lights.push(*light);
            caster_bounds.push(casters.filter(|b| within_shadow_distance(b, parameters)));
        }
        log::trace!(
            "HeadlessScene: {} of {} lights visible",
            lights.len(),
            self.lights.len()
        );
        HeadlessCulling {
            index_map: (0..self.lights.len() as i32).collect(),
            lights,
            caster_bounds,
            parameters: *parameters,
        }
    }
}

fn is_light_visible(light: &VisibleLight, parameters: &CullingParameters) -> bool {
    match light.kind {
        LightKind::Directional => true,
        _ => {
            let distance = light.position().truncate().distance(parameters.position);
            distance <= parameters.far_clip + light.range
        }
    }
}

fn within_shadow_distance(bounds: &Bounds, parameters: &CullingParameters) -> bool {
    let distance = bounds.center.distance(parameters.position) - bounds.extents.length();
    distance <= parameters.shadow_distance
}

/// Culling results produced by [`HeadlessScene`].
#[derive(Debug, Clone)]
pub struct HeadlessCulling {
    lights: Vec<VisibleLight>,
    caster_bounds: Vec<Option<Bounds>>,
    parameters: CullingParameters,
    index_map: Vec<i32>,
}

impl HeadlessCulling {
    /// Builds results directly from visible lights, bypassing scene culling.
    pub fn from_lights(
        lights: Vec<(VisibleLight, Option<Bounds>)>,
        parameters: CullingParameters,
    ) -> Self {
        let (lights, caster_bounds): (Vec<_>, Vec<_>) = lights.into_iter().unzip();
        Self {
            index_map: (0..lights.len() as i32).collect(),
            lights,
            caster_bounds,
            parameters,
        }
    }

    /// Extends the engine light index map past the visible lights, as engines
    /// do when they track more lights than the camera sees.
    pub fn with_index_map_len(mut self, len: usize) -> Self {
        self.index_map = (0..len as i32).collect();
        self
    }

    /// The camera the results were produced for.
    pub fn parameters(&self) -> &CullingParameters {
        &self.parameters
    }

    /// Bounding sphere around the slice `[start, end]` of the camera frustum.
    fn frustum_slice_sphere(&self, start: f32, end: f32) -> Vec4 {
        let p = &self.parameters;
        let right = p.forward.cross(p.up).normalize();
        let up = right.cross(p.forward);
        let tan_y = (degrees_to_radians(p.field_of_view) * 0.5).tan();
        let tan_x = tan_y * p.aspect;

        let center = p.position + p.forward * ((start + end) * 0.5);
        let mut radius: f32 = 0.0;
        for distance in [start, end] {
            let plane_center = p.position + p.forward * distance;
            for (sx, sy) in [(-1.0, -1.0), (1.0, -1.0), (-1.0, 1.0), (1.0, 1.0)] {
                let corner = plane_center
                    + right * (sx * tan_x * distance)
                    + up * (sy * tan_y * distance);
                radius = radius.max(corner.distance(center));
            }
        }
        Vec4::from_vec3(center, radius)
    }
}

fn up_for(direction: Vec3) -> Vec3 {
    if direction.cross(Vec3::Y).length_squared() < 1e-6 {
        Vec3::Z
    } else {
        Vec3::Y
    }
}

fn cube_face_up(face: CubemapFace) -> Vec3 {
    match face {
        CubemapFace::PositiveY => Vec3::Z,
        CubemapFace::NegativeY => -Vec3::Z,
        _ => -Vec3::Y,
    }
}

impl CullingResults for HeadlessCulling {
    fn visible_lights(&self) -> &[VisibleLight] {
        &self.lights
    }

    fn shadow_caster_bounds(&self, visible_light_index: usize) -> Option<Bounds> {
        self.caster_bounds.get(visible_light_index).copied().flatten()
    }

    fn compute_directional_shadow_matrices(
        &self,
        visible_light_index: usize,
        cascade_index: usize,
        cascade_count: usize,
        cascade_ratios: Vec3,
        _tile_resolution: u32,
        near_plane_offset: f32,
    ) -> Option<ShadowMatrices> {
        let light = self.lights.get(visible_light_index)?;
        if light.kind != LightKind::Directional || cascade_index >= cascade_count {
            return None;
        }
        let direction = light.direction().truncate().normalize();
        if direction == Vec3::ZERO {
            return None;
        }

        let p = &self.parameters;
        let ratios = [cascade_ratios.x, cascade_ratios.y, cascade_ratios.z];
        let split_end = |c: usize| {
            if c + 1 >= cascade_count {
                p.shadow_distance
            } else {
                ratios[c] * p.shadow_distance
            }
        };
        let start = if cascade_index == 0 {
            p.near_clip
        } else {
            split_end(cascade_index - 1)
        };
        let end = split_end(cascade_index).max(start);
        let sphere = self.frustum_slice_sphere(start, end);
        let center = sphere.truncate();
        let radius = sphere.w;

        let eye = center - direction * (radius + near_plane_offset);
        let view = Mat4::look_at_rh(eye, center, up_for(direction))?;
        let projection =
            Mat4::orthographic_rh_zo(-radius, radius, -radius, radius, 0.0, 2.0 * radius + near_plane_offset);

        Some(ShadowMatrices {
            view,
            projection,
            split_data: ShadowSplitData {
                culling_sphere: sphere,
                shadow_cascade_blend_culling_factor: 0.0,
            },
        })
    }

    fn compute_spot_shadow_matrices(&self, visible_light_index: usize) -> Option<ShadowMatrices> {
        let light = self.lights.get(visible_light_index)?;
        if light.kind != LightKind::Spot {
            return None;
        }
        let position = light.position().truncate();
        let direction = light.direction().truncate().normalize();
        let view = Mat4::look_at_rh(position, position + direction, up_for(direction))?;
        let near = light.shadows.near_plane.max(0.01);
        let far = light.range.max(near * 2.0);
        let projection =
            Mat4::perspective_rh_zo(degrees_to_radians(light.spot_angle), 1.0, near, far);
        Some(ShadowMatrices {
            view,
            projection,
            split_data: ShadowSplitData {
                culling_sphere: Vec4::from_vec3(position, light.range),
                shadow_cascade_blend_culling_factor: 0.0,
            },
        })
    }

    fn compute_point_shadow_matrices(
        &self,
        visible_light_index: usize,
        face: CubemapFace,
        fov_bias: f32,
    ) -> Option<ShadowMatrices> {
        let light = self.lights.get(visible_light_index)?;
        if light.kind != LightKind::Point {
            return None;
        }
        let position = light.position().truncate();
        let view = Mat4::look_at_rh(position, position + face.direction(), cube_face_up(face))?;
        let near = light.shadows.near_plane.max(0.01);
        let far = light.range.max(near * 2.0);
        let projection =
            Mat4::perspective_rh_zo(degrees_to_radians(90.0 + fov_bias), 1.0, near, far);
        Some(ShadowMatrices {
            view,
            projection,
            split_data: ShadowSplitData {
                culling_sphere: Vec4::from_vec3(position, light.range),
                shadow_cascade_blend_culling_factor: 0.0,
            },
        })
    }

    fn light_index_map(&self) -> Vec<i32> {
        self.index_map.clone()
    }

    fn set_light_index_map(&mut self, map: Vec<i32>) {
        self.index_map = map;
    }
}
