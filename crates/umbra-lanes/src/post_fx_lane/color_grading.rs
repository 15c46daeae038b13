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

//! Color grading LUT bake, tone mapping and the final composite.

use super::ids::*;
use super::stack::PostFxStack;
use super::Pass;
use umbra_core::math::{Vec3, Vec4};
use umbra_core::renderer::settings::{BicubicRescalingMode, PostFxSettings, ToneMappingMode};
use umbra_core::renderer::{RenderTarget, ShaderPropertyId, TemporaryTextureDesc, TextureFormat};

/// Standard illuminant chromaticity curve.
fn standard_illuminant_y(x: f32) -> f32 {
    2.87 * x - 3.0 * x * x - 0.275_095_07
}

/// CIE xy chromaticity to LMS cone response.
fn cie_xy_to_lms(x: f32, y: f32) -> Vec3 {
    let big_y = 1.0;
    let big_x = big_y * x / y;
    let big_z = big_y * (1.0 - x - y) / y;
    Vec3::new(
        0.7328 * big_x + 0.4296 * big_y - 0.1624 * big_z,
        -0.7036 * big_x + 1.6975 * big_y + 0.0061 * big_z,
        0.0030 * big_x + 0.0136 * big_y + 0.9834 * big_z,
    )
}

/// LMS multipliers shifting the white point by `temperature` and `tint`
/// (both in -100..100). Neutral settings give roughly one.
pub fn white_balance_lms_coefficients(temperature: f32, tint: f32) -> Vec3 {
    let t1 = temperature / 65.0;
    let t2 = tint / 65.0;
    let x = 0.31271 - t1 * if t1 < 0.0 { 0.1 } else { 0.05 };
    let y = standard_illuminant_y(x) + t2 * 0.05;
    let w1 = Vec3::new(0.949_237, 1.035_42, 1.087_28);
    let w2 = cie_xy_to_lms(x, y);
    Vec3::new(w1.x / w2.x, w1.y / w2.y, w1.z / w2.z)
}

impl PostFxStack {
    fn configure_color_adjustments(&mut self, settings: &PostFxSettings) {
        let adjustments = &settings.color_adjustments;
        self.buffer.set_global_vector(
            COLOR_ADJUSTMENTS,
            Vec4::new(
                adjustments.post_exposure.exp2(),
                adjustments.contrast * 0.01 + 1.0,
                adjustments.hue_shift * (1.0 / 360.0),
                adjustments.saturation * 0.01 + 1.0,
            ),
        );
        self.buffer
            .set_global_vector(COLOR_FILTER, adjustments.color_filter.to_vec4());
    }

    fn configure_white_balance(&mut self, settings: &PostFxSettings) {
        let balance = &settings.white_balance;
        let lms = white_balance_lms_coefficients(balance.temperature, balance.tint);
        self.buffer
            .set_global_vector(WHITE_BALANCE, Vec4::from_vec3(lms, 0.0));
    }

    fn configure_split_toning(&mut self, settings: &PostFxSettings) {
        let toning = &settings.split_toning;
        let shadows = toning.shadows.to_vec4().with_w(toning.balance * 0.01);
        self.buffer.set_global_vector(SPLIT_TONING_SHADOWS, shadows);
        self.buffer
            .set_global_vector(SPLIT_TONING_HIGHLIGHTS, toning.highlights.to_vec4());
    }

    fn configure_channel_mixer(&mut self, settings: &PostFxSettings) {
        let mixer = &settings.channel_mixer;
        self.buffer
            .set_global_vector(CHANNEL_MIXER_RED, Vec4::from_vec3(mixer.red, 0.0));
        self.buffer
            .set_global_vector(CHANNEL_MIXER_GREEN, Vec4::from_vec3(mixer.green, 0.0));
        self.buffer
            .set_global_vector(CHANNEL_MIXER_BLUE, Vec4::from_vec3(mixer.blue, 0.0));
    }

    fn configure_shadows_midtones_highlights(&mut self, settings: &PostFxSettings) {
        let smh = &settings.shadows_midtones_highlights;
        self.buffer.set_global_vector(SMH_SHADOWS, smh.shadows.to_vec4());
        self.buffer.set_global_vector(SMH_MIDTONES, smh.midtones.to_vec4());
        self.buffer
            .set_global_vector(SMH_HIGHLIGHTS, smh.highlights.to_vec4());
        self.buffer.set_global_vector(
            SMH_RANGE,
            Vec4::new(
                smh.shadows_start,
                smh.shadows_end,
                smh.highlights_start,
                smh.highlights_end,
            ),
        );
    }

    /// Whether the final rescale should sample bicubically.
    pub(super) fn use_bicubic_rescale(&self) -> bool {
        match self.frame.bicubic_rescaling {
            BicubicRescalingMode::Off => false,
            BicubicRescalingMode::UpOnly => self.frame.buffer_size.0 < self.camera_size.0,
            BicubicRescalingMode::UpAndDown => true,
        }
    }

    /// Bakes the grading LUT from the settings, applies it to `source` and
    /// writes the result to the camera target, rescaling when needed.
    pub(super) fn do_color_grading_and_tone_mapping(
        &mut self,
        settings: &PostFxSettings,
        source: ShaderPropertyId,
    ) {
        self.configure_color_adjustments(settings);
        self.configure_white_balance(settings);
        self.configure_split_toning(settings);
        self.configure_channel_mixer(settings);
        self.configure_shadows_midtones_highlights(settings);

        let lut_height = self.frame.lut_resolution.size();
        let lut_width = lut_height * lut_height;
        let (h, w) = (lut_height as f32, lut_width as f32);
        self.buffer.get_temporary(
            COLOR_GRADING_LUT,
            TemporaryTextureDesc::color(lut_width, lut_height, TextureFormat::DefaultHdr),
        );
        self.buffer.set_global_vector(
            COLOR_GRADING_LUT_PARAMETERS,
            Vec4::new(h, 0.5 / w, 0.5 / h, h / (h - 1.0)),
        );
        let in_log_c = self.frame.use_hdr && settings.tone_mapping != ToneMappingMode::None;
        self.buffer
            .set_global_float(COLOR_GRADING_LUT_IN_LOG_C, if in_log_c { 1.0 } else { 0.0 });
        self.draw(
            source,
            RenderTarget::Temporary(COLOR_GRADING_LUT),
            Pass::color_grading(settings.tone_mapping),
        );
        self.buffer.set_global_vector(
            COLOR_GRADING_LUT_PARAMETERS,
            Vec4::new(1.0 / w, 1.0 / h, h - 1.0, 0.0),
        );

        if self.frame.buffer_size.0 == self.camera_size.0 {
            self.draw_final(source, Pass::ApplyColorGrading);
        } else {
            let (width, height) = self.frame.buffer_size;
            self.buffer.set_global_float(FINAL_SRC_BLEND, 1.0);
            self.buffer.set_global_float(FINAL_DST_BLEND, 0.0);
            self.buffer.get_temporary(
                FINAL_RESULT,
                TemporaryTextureDesc::color(width, height, TextureFormat::Default),
            );
            self.draw(source, RenderTarget::Temporary(FINAL_RESULT), Pass::ApplyColorGrading);
            let bicubic = self.use_bicubic_rescale();
            self.buffer
                .set_global_float(COPY_BICUBIC, if bicubic { 1.0 } else { 0.0 });
            self.draw_final(FINAL_RESULT, Pass::FinalRescale);
            self.buffer.release_temporary(FINAL_RESULT);
        }
        self.buffer.release_temporary(COLOR_GRADING_LUT);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::post_fx_lane::PostFxFrame;
    use approx::assert_relative_eq;
    use umbra_core::renderer::settings::ColorLutResolution;
    use umbra_core::renderer::{execute_and_clear, BlitMaterial, Camera, CameraType};
    use umbra_infra::{HeadlessContext, HeadlessScene};

    const SOURCE: ShaderPropertyId = ShaderPropertyId::from_name("_CameraColorAttachment");

    fn graded(
        camera_width: u32,
        buffer_width: u32,
        bicubic_rescaling: BicubicRescalingMode,
        settings: PostFxSettings,
    ) -> (PostFxStack, HeadlessContext) {
        let camera = Camera::new("Main", CameraType::Game, camera_width, 100);
        let frame = PostFxFrame {
            buffer_size: (buffer_width, 100),
            use_hdr: false,
            lut_resolution: ColorLutResolution::Lut16,
            bicubic_rescaling,
            ..Default::default()
        };
        let mut stack = PostFxStack::new();
        stack.setup(&camera, Some(&settings), frame, true);
        let mut ctx = HeadlessContext::new(HeadlessScene::new());
        stack.do_color_grading_and_tone_mapping(&settings, SOURCE);
        execute_and_clear(&mut ctx, &mut stack.buffer);
        (stack, ctx)
    }

    #[test]
    fn test_neutral_white_balance_is_identity() {
        let lms = white_balance_lms_coefficients(0.0, 0.0);
        assert_relative_eq!(lms.x, 1.0, epsilon = 0.01);
        assert_relative_eq!(lms.y, 1.0, epsilon = 0.01);
        assert_relative_eq!(lms.z, 1.0, epsilon = 0.01);
    }

    #[test]
    fn test_warm_white_balance_boosts_long_wavelengths() {
        let warm = white_balance_lms_coefficients(50.0, 0.0);
        let cold = white_balance_lms_coefficients(-50.0, 0.0);
        assert!(warm.x / warm.z > cold.x / cold.z);
    }

    #[test]
    fn test_lut_parameters_and_log_c() {
        let mut settings = PostFxSettings::default();
        settings.tone_mapping = ToneMappingMode::Aces;
        settings.color_adjustments.post_exposure = 1.0;
        settings.split_toning.balance = 50.0;
        let (_, ctx) = graded(100, 100, BicubicRescalingMode::Off, settings);

        // The last upload is the sampling variant.
        let params = ctx.last_vector(COLOR_GRADING_LUT_PARAMETERS).unwrap();
        assert_relative_eq!(params.x, 1.0 / 256.0);
        assert_relative_eq!(params.y, 1.0 / 16.0);
        assert_relative_eq!(params.z, 15.0);
        assert_eq!(ctx.last_float(COLOR_GRADING_LUT_IN_LOG_C), Some(0.0));
        assert_eq!(ctx.pool().get(COLOR_GRADING_LUT), None);
        assert_relative_eq!(ctx.last_vector(COLOR_ADJUSTMENTS).unwrap().x, 2.0);
        assert_relative_eq!(ctx.last_vector(SPLIT_TONING_SHADOWS).unwrap().w, 0.5);
        assert_eq!(
            ctx.procedural_passes(BlitMaterial::PostFx),
            vec![Pass::ColorGradingAces.index(), Pass::ApplyColorGrading.index()]
        );
    }

    #[test]
    fn test_scaled_buffer_goes_through_final_rescale() {
        let (_, ctx) = graded(
            100,
            50,
            BicubicRescalingMode::UpOnly,
            PostFxSettings::default(),
        );
        assert_eq!(
            ctx.procedural_passes(BlitMaterial::PostFx),
            vec![
                Pass::ColorGradingNone.index(),
                Pass::ApplyColorGrading.index(),
                Pass::FinalRescale.index()
            ]
        );
        assert_eq!(ctx.last_float(COPY_BICUBIC), Some(1.0));
        assert_eq!(ctx.pool().outstanding(), 0);
    }

    #[test]
    fn test_bicubic_rescale_policy() {
        let cases = [
            (BicubicRescalingMode::Off, 50, false),
            (BicubicRescalingMode::Off, 150, false),
            (BicubicRescalingMode::UpOnly, 50, true),
            (BicubicRescalingMode::UpOnly, 150, false),
            (BicubicRescalingMode::UpAndDown, 50, true),
            (BicubicRescalingMode::UpAndDown, 150, true),
        ];
        for (mode, buffer_width, expected) in cases {
            let (stack, ctx) = graded(100, buffer_width, mode, PostFxSettings::default());
            assert_eq!(stack.use_bicubic_rescale(), expected, "{mode:?} at {buffer_width}");
            let uploaded = if expected { 1.0 } else { 0.0 };
            assert_eq!(ctx.last_float(COPY_BICUBIC), Some(uploaded));
        }
    }
}
