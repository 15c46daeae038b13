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


use approx::assert_relative_eq;
use umbra_agents::render_agent::ids::{
    CAMERA_BUFFER_SIZE, CAMERA_COLOR_ATTACHMENT, CAMERA_DST_BLEND, CAMERA_SRC_BLEND,
};
use umbra_agents::render_agent::{CameraRenderer, EditorDiagnostics};
use umbra_core::math::{LinearRgba, Mat4, Vec3, Vec4};
use umbra_core::renderer::settings::{
    BatchingFlags, BlendMode, CameraBufferSettings, ColorLutResolution, FinalBlendMode,
    PostFxSettings, ShadowSettings,
};
use umbra_core::renderer::{
    BlitMaterial, Bounds, Camera, CameraType, ClearFlags, Command, DeviceCapabilities,
    GizmoSubset, LightShadowSettings, LightShadows, LoadAction, PerObjectData, RenderTarget,
    VisibleLight, LIT_SHADER_TAG, UNLIT_SHADER_TAG,
};
use umbra_infra::{FrameEvent, HeadlessContext, HeadlessScene};
use umbra_lanes::lighting_lane::ids::DIRECTIONAL_LIGHT_SHADOW_DATA;
use umbra_lanes::post_fx_lane::Pass;

const BATCHING: BatchingFlags = BatchingFlags {
    dynamic_batching: false,
    gpu_instancing: true,
    lights_per_object: true,
};

fn sun() -> VisibleLight {
    VisibleLight::directional(LinearRgba::WHITE, Mat4::from_rotation_x(-0.9)).with_shadows(
        LightShadowSettings {
            mode: LightShadows::Soft,
            ..Default::default()
        },
    )
}

fn caster() -> Option<Bounds> {
    Some(Bounds {
        center: Vec3::new(0.0, 0.0, -5.0),
        extents: Vec3::ONE,
    })
}

fn render(
    ctx: &mut HeadlessContext,
    renderer: &mut CameraRenderer,
    camera: &Camera,
    buffer: &CameraBufferSettings,
    post_fx: Option<&PostFxSettings>,
) -> bool {
    renderer.render(
        ctx,
        camera,
        buffer,
        BATCHING,
        &ShadowSettings::default(),
        post_fx,
        ColorLutResolution::Lut32,
    )
}

fn temporaries(ctx: &HeadlessContext) -> Vec<(RenderTarget, u32, u32)> {
    ctx.commands()
        .filter_map(|c| match c {
            Command::GetTemporary { id, desc } => {
                Some((RenderTarget::Temporary(*id), desc.width, desc.height))
            }
            _ => None,
        })
        .collect()
}

#[test]
fn test_camera_that_cannot_be_culled_records_nothing() {
    let mut ctx = HeadlessContext::new(HeadlessScene::new().with_light(sun(), caster()));
    let mut renderer = CameraRenderer::new();
    let camera = Camera::new("Broken", CameraType::Game, 800, 0);

    let drawn = render(
        &mut ctx,
        &mut renderer,
        &camera,
        &CameraBufferSettings::default(),
        None,
    );

    assert!(!drawn);
    assert!(ctx.events().is_empty());
    assert_eq!(ctx.submit_count(), 0);
}

#[test]
fn test_direct_rendering_without_intermediate_buffer() {
    let mut ctx = HeadlessContext::new(HeadlessScene::new().with_light(sun(), caster()));
    let mut renderer = CameraRenderer::new();
    let camera = Camera::new("Main", CameraType::Game, 800, 600);

    assert!(render(
        &mut ctx,
        &mut renderer,
        &camera,
        &CameraBufferSettings::default(),
        None,
    ));

    assert!(!renderer.state().use_intermediate_buffer);
    assert!(!temporaries(&ctx)
        .iter()
        .any(|(t, _, _)| *t == RenderTarget::Temporary(CAMERA_COLOR_ATTACHMENT)));
    assert!(ctx.commands().any(|c| matches!(
        c,
        Command::ClearRenderTarget {
            clear_depth: true,
            clear_color: true,
            color,
        } if *color == LinearRgba::TRANSPARENT
    )));
    assert!(ctx.events().contains(&FrameEvent::DrawSkybox));
    assert!(ctx.procedural_passes(BlitMaterial::CameraCopy).is_empty());

    let size = ctx.last_vector(CAMERA_BUFFER_SIZE).unwrap();
    assert_relative_eq!(size.x, 1.0 / 800.0);
    assert_relative_eq!(size.w, 600.0);

    assert_eq!(ctx.submit_count(), 1);
    assert_eq!(ctx.events().last(), Some(&FrameEvent::Submit));
    assert_eq!(ctx.pool().outstanding(), 0);
    assert!(ctx.pool().violations().is_empty());
}

#[test]
fn test_two_cascades_share_the_directional_atlas() {
    let mut ctx = HeadlessContext::new(HeadlessScene::new().with_light(sun(), caster()));
    let mut renderer = CameraRenderer::new();
    let camera = Camera::new("Main", CameraType::Game, 800, 600);
    let mut shadows = ShadowSettings::default();
    shadows.directional.cascade_count = 2;
    shadows.directional.cascade_ratio_1 = 0.3;

    assert!(renderer.render(
        &mut ctx,
        &camera,
        &CameraBufferSettings::default(),
        BATCHING,
        &shadows,
        None,
        ColorLutResolution::Lut32,
    ));

    assert_eq!(ctx.shadow_draws().len(), 2);
    let atlas = shadows.directional.atlas_size.pixels() as f32;
    let tile_viewports: Vec<_> = ctx
        .commands()
        .filter_map(|c| match c {
            Command::SetViewport(v) => Some(*v),
            _ => None,
        })
        .collect();
    assert_eq!(tile_viewports.len(), 2);
    assert!(tile_viewports.iter().all(|v| v.width == atlas / 2.0));
    assert_eq!(tile_viewports[1].x, atlas / 2.0);

    let data = ctx.last_vector_array(DIRECTIONAL_LIGHT_SHADOW_DATA).unwrap();
    assert_eq!(data[0], Vec4::new(1.0, 0.0, 0.4, -1.0));
    assert_eq!(renderer.arena().lights.directional_count, 1);

    assert_eq!(ctx.pool().outstanding(), 0);
    assert!(ctx.pool().violations().is_empty());
}

#[test]
fn test_lights_per_object_index_map_reaches_the_draws() {
    let far_lamp = VisibleLight::point(LinearRgba::WHITE, Vec3::new(0.0, 0.0, -5000.0), 1.0);
    let lamp = VisibleLight::point(LinearRgba::WHITE, Vec3::new(0.0, 2.0, -3.0), 8.0);
    let scene = HeadlessScene::new()
        .with_light(sun(), caster())
        .with_light(lamp, None)
        .with_light(far_lamp, None);
    let mut ctx = HeadlessContext::new(scene);
    let mut renderer = CameraRenderer::new();
    let camera = Camera::new("Main", CameraType::Game, 800, 600);

    render(
        &mut ctx,
        &mut renderer,
        &camera,
        &CameraBufferSettings::default(),
        None,
    );

    let draws: Vec<_> = ctx
        .events()
        .iter()
        .filter_map(|e| match e {
            FrameEvent::DrawRenderers {
                drawing,
                light_index_map,
                ..
            } => Some((drawing.clone(), light_index_map.clone())),
            _ => None,
        })
        .collect();
    assert_eq!(draws.len(), 2);
    for (drawing, map) in &draws {
        assert!(drawing.per_object_data.contains(PerObjectData::LIGHT_INDICES));
        assert!(drawing.per_object_data.contains(PerObjectData::LIGHTMAPS));
        assert_eq!(drawing.shader_passes, vec![UNLIT_SHADER_TAG, LIT_SHADER_TAG]);
        assert_eq!(map, &vec![-1, 0, -1]);
    }
}

#[test]
fn test_attachment_copies_fall_back_to_draws() {
    let buffer = CameraBufferSettings {
        copy_color: true,
        copy_depth: true,
        ..Default::default()
    };
    let camera = Camera::new("Main", CameraType::Game, 640, 360);

    let mut native = HeadlessContext::new(HeadlessScene::new());
    let mut renderer = CameraRenderer::new();
    render(&mut native, &mut renderer, &camera, &buffer, None);
    assert!(renderer.state().use_intermediate_buffer);
    assert_eq!(
        native
            .commands()
            .filter(|c| matches!(c, Command::CopyTexture { .. }))
            .count(),
        2
    );
    assert_eq!(native.procedural_passes(BlitMaterial::CameraCopy), vec![0]);

    let mut fallback = HeadlessContext::new(HeadlessScene::new()).with_capabilities(
        DeviceCapabilities {
            copy_texture_support: false,
            ..Default::default()
        },
    );
    render(&mut fallback, &mut renderer, &camera, &buffer, None);
    assert!(!fallback
        .commands()
        .any(|c| matches!(c, Command::CopyTexture { .. })));
    assert_eq!(
        fallback.procedural_passes(BlitMaterial::CameraCopy),
        vec![0, 1, 0]
    );
    assert_eq!(fallback.pool().outstanding(), 0);
    assert!(fallback.pool().violations().is_empty());
}

#[test]
fn test_reflection_cameras_use_reflection_copy_flags() {
    let buffer = CameraBufferSettings {
        copy_color: true,
        copy_depth: true,
        ..Default::default()
    };
    let mut ctx = HeadlessContext::new(HeadlessScene::new());
    let mut renderer = CameraRenderer::new();
    let camera = Camera::new("Probe", CameraType::Reflection, 128, 128);

    render(&mut ctx, &mut renderer, &camera, &buffer, None);

    let state = renderer.state();
    assert!(!state.use_color_texture);
    assert!(!state.use_depth_texture);
    assert!(!state.use_intermediate_buffer);
}

#[test]
fn test_render_scale_shrinks_the_buffers() {
    let buffer = CameraBufferSettings {
        render_scale: 0.5,
        ..Default::default()
    };
    let mut ctx = HeadlessContext::new(HeadlessScene::new());
    let mut renderer = CameraRenderer::new();
    let mut camera = Camera::new("Main", CameraType::Game, 800, 600);
    camera.clear_flags = ClearFlags::Skybox;

    render(&mut ctx, &mut renderer, &camera, &buffer, None);

    let state = *renderer.state();
    assert!(state.use_scaled_rendering);
    assert!(state.use_intermediate_buffer);
    assert_eq!(state.buffer_size, (400, 300));
    assert!(temporaries(&ctx).contains(&(
        RenderTarget::Temporary(CAMERA_COLOR_ATTACHMENT),
        400,
        300
    )));
    assert_eq!(
        ctx.last_vector(CAMERA_BUFFER_SIZE),
        Some(Vec4::new(1.0 / 400.0, 1.0 / 300.0, 400.0, 300.0))
    );
    // Intermediate buffers are always cleared to at least color.
    assert!(ctx.commands().any(|c| matches!(
        c,
        Command::ClearRenderTarget {
            clear_color: true,
            ..
        }
    )));
    assert_eq!(ctx.procedural_passes(BlitMaterial::CameraCopy), vec![0]);
    assert_eq!(ctx.pool().outstanding(), 0);
}

#[test]
fn test_scene_window_never_renders_scaled() {
    let buffer = CameraBufferSettings {
        render_scale: 0.5,
        ..Default::default()
    };
    let mut ctx = HeadlessContext::new(HeadlessScene::new());
    let mut renderer = CameraRenderer::with_diagnostics(Box::new(EditorDiagnostics::default()));
    let camera = Camera::new("Scene", CameraType::SceneView, 800, 600);

    render(&mut ctx, &mut renderer, &camera, &buffer, None);

    assert!(!renderer.state().use_scaled_rendering);
    assert_eq!(renderer.state().buffer_size, (800, 600));
}

#[test]
fn test_final_copy_blends_into_camera_target() {
    let buffer = CameraBufferSettings {
        copy_depth: true,
        ..Default::default()
    };
    let mut ctx = HeadlessContext::new(HeadlessScene::new());
    let mut renderer = CameraRenderer::new();
    let mut camera = Camera::new("Overlay", CameraType::Game, 800, 600);
    camera.settings.final_blend_mode = FinalBlendMode {
        source: BlendMode::SrcAlpha,
        destination: BlendMode::OneMinusSrcAlpha,
    };

    render(&mut ctx, &mut renderer, &camera, &buffer, None);

    let floats: Vec<f32> = ctx
        .commands()
        .filter_map(|c| match c {
            Command::SetGlobalFloat(id, v) if *id == CAMERA_DST_BLEND => Some(*v),
            _ => None,
        })
        .collect();
    assert_eq!(floats, vec![10.0, 0.0]);
    assert_eq!(ctx.last_float(CAMERA_SRC_BLEND), Some(1.0));
    assert!(ctx.commands().any(|c| matches!(
        c,
        Command::SetRenderTarget {
            color: RenderTarget::CameraTarget,
            color_load: LoadAction::Load,
            ..
        }
    )));
}

#[test]
fn test_post_fx_replaces_the_final_copy() {
    let mut ctx = HeadlessContext::new(HeadlessScene::new());
    let mut renderer = CameraRenderer::new();
    let camera = Camera::new("Main", CameraType::Game, 800, 600);
    let post_fx = PostFxSettings::default();

    render(
        &mut ctx,
        &mut renderer,
        &camera,
        &CameraBufferSettings::default(),
        Some(&post_fx),
    );

    assert!(renderer.state().use_intermediate_buffer);
    assert!(renderer.state().use_hdr);
    let passes = ctx.procedural_passes(BlitMaterial::PostFx);
    assert!(passes.contains(&Pass::BloomPrefilterFireflies.index()));
    assert_eq!(passes.last(), Some(&Pass::ApplyColorGrading.index()));
    assert!(ctx.procedural_passes(BlitMaterial::CameraCopy).is_empty());
    assert_eq!(ctx.pool().outstanding(), 0);
    assert!(ctx.pool().violations().is_empty());
}

#[test]
fn test_preview_cameras_skip_post_fx() {
    let mut ctx = HeadlessContext::new(HeadlessScene::new());
    let mut renderer = CameraRenderer::new();
    let camera = Camera::new("Preview", CameraType::Preview, 64, 64);

    render(
        &mut ctx,
        &mut renderer,
        &camera,
        &CameraBufferSettings::default(),
        Some(&PostFxSettings::default()),
    );

    assert!(!renderer.state().use_intermediate_buffer);
    assert!(ctx.procedural_passes(BlitMaterial::PostFx).is_empty());
}

#[test]
fn test_editor_gizmos_wrap_post_fx() {
    let mut ctx = HeadlessContext::new(HeadlessScene::new());
    let mut renderer = CameraRenderer::with_diagnostics(Box::new(EditorDiagnostics::default()));
    let camera = Camera::new("Scene", CameraType::SceneView, 320, 240);

    render(
        &mut ctx,
        &mut renderer,
        &camera,
        &CameraBufferSettings::default(),
        Some(&PostFxSettings::default()),
    );

    let gizmos: Vec<_> = ctx
        .events()
        .iter()
        .filter_map(|e| match e {
            FrameEvent::DrawGizmos(subset) => Some(*subset),
            _ => None,
        })
        .collect();
    assert_eq!(
        gizmos,
        vec![GizmoSubset::PreImageEffects, GizmoSubset::PostImageEffects]
    );
    // Depth is copied to the camera target before each gizmo subset.
    assert_eq!(ctx.procedural_passes(BlitMaterial::CameraCopy), vec![1, 1]);
}
