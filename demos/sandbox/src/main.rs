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


// Umbra sandbox
// Renders a small scene through the headless context and logs what happened.

use anyhow::{Context, Result};
use std::path::PathBuf;
use umbra_agents::render_agent::{EditorDiagnostics, RenderPipeline};
use umbra_core::math::{LinearRgba, Mat4, Vec3};
use umbra_core::renderer::settings::PipelineSettings;
use umbra_core::renderer::{
    Bounds, Camera, CameraType, LightBakeType, LightBakingOutput, LightShadowSettings,
    LightShadows, MixedLightingMode, Viewport, VisibleLight,
};
use umbra_infra::{HeadlessContext, HeadlessScene};

const FRAME_COUNT: usize = 3;

fn shadowed(light: VisibleLight, mode: LightShadows) -> VisibleLight {
    light.with_shadows(LightShadowSettings {
        mode,
        ..Default::default()
    })
}

fn build_scene() -> HeadlessScene {
    let casters = Some(Bounds {
        center: Vec3::new(0.0, 1.0, -8.0),
        extents: Vec3::new(4.0, 1.0, 4.0),
    });
    let sun = shadowed(
        VisibleLight::directional(LinearRgba::rgb(1.0, 0.95, 0.85), Mat4::from_rotation_x(-0.8)),
        LightShadows::Soft,
    )
    .with_baking(LightBakingOutput {
        bake_type: LightBakeType::Mixed,
        mixed_lighting_mode: MixedLightingMode::Shadowmask,
        occlusion_mask_channel: 0,
    });
    let spot = shadowed(
        VisibleLight::spot(
            LinearRgba::rgb(4.0, 3.5, 3.0),
            Mat4::from_translation(Vec3::new(2.0, 4.0, -6.0)) * Mat4::from_rotation_x(-1.2),
            12.0,
            50.0,
            35.0,
        ),
        LightShadows::Hard,
    );
    let lamp = shadowed(
        VisibleLight::point(LinearRgba::rgb(2.0, 1.2, 0.6), Vec3::new(-3.0, 2.0, -7.0), 6.0),
        LightShadows::Soft,
    );

    HeadlessScene::new()
        .with_light(sun, casters)
        .with_light(spot, casters)
        .with_light(lamp, casters)
}

fn build_cameras() -> Vec<Camera> {
    let main = Camera::new("Main Camera", CameraType::Game, 1280, 720);

    let mut scene_view = Camera::new("Scene View", CameraType::SceneView, 1280, 720);
    scene_view.local_to_world = Mat4::from_translation(Vec3::new(0.0, 6.0, 4.0));

    let mut minimap = Camera::new("Minimap", CameraType::Game, 1280, 720);
    minimap.viewport_rect = Viewport::new(0.75, 0.75, 0.25, 0.25);
    minimap.settings.copy_depth = false;

    vec![main, scene_view, minimap]
}

fn settings_path() -> PathBuf {
    std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("pipeline.ron"))
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();

    let path = settings_path();
    let settings = PipelineSettings::load(&path)
        .with_context(|| format!("loading pipeline settings from '{}'", path.display()))?;

    let mut ctx = HeadlessContext::new(build_scene());
    let mut pipeline =
        RenderPipeline::with_diagnostics(settings, Box::new(EditorDiagnostics::default()))
            .context("creating the render pipeline")?;
    let cameras = build_cameras();

    for _ in 0..FRAME_COUNT {
        ctx.clear_events();
        pipeline.render(&mut ctx, &cameras);
        let stats = pipeline.stats();
        log::info!(
            "Frame {}: {} camera(s) rendered, {} skipped, {} events, {} shadow draws in {:?}",
            stats.frame_count,
            stats.cameras_rendered,
            stats.cameras_skipped,
            ctx.events().len(),
            ctx.shadow_draws().len(),
            stats.last_frame_time
        );
    }

    let pool = ctx.pool();
    log::info!(
        "Temporary textures: {} acquired, {} released, peak {}",
        pool.acquired_total(),
        pool.released_total(),
        pool.peak()
    );
    anyhow::ensure!(
        pool.outstanding() == 0 && pool.violations().is_empty(),
        "temporary texture bookkeeping is unbalanced: {:?}",
        pool.violations()
    );
    Ok(())
}
