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

//! Post-processing lane: bloom, color grading, tone mapping and final rescale.
//!
//! Every effect is a full-screen procedural draw with the post-processing
//! material; [`Pass`] selects the shader pass.

mod bloom;
mod color_grading;
mod stack;

pub use self::bloom::threshold_curve;
pub use self::color_grading::white_balance_lms_coefficients;
pub use self::stack::{PostFxFrame, PostFxStack};

use umbra_core::renderer::settings::ToneMappingMode;

/// Levels in the bloom pyramid; each level owns a horizontal and a vertical target.
pub const MAX_BLOOM_PYRAMID_LEVELS: usize = 16;

/// Shader passes of the post-processing material, in material order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Pass {
    /// Additive bloom combine.
    BloomAdd,
    /// Horizontal Gaussian blur with downsampling.
    BloomHorizontal,
    /// Threshold and half-resolution downsample.
    BloomPrefilter,
    /// Prefilter that also suppresses fireflies.
    BloomPrefilterFireflies,
    /// Scattering bloom combine.
    BloomScatter,
    /// Final scattering combine, restoring lost energy.
    BloomScatterFinal,
    /// Vertical Gaussian blur.
    BloomVertical,
    /// Plain copy.
    Copy,
    /// LUT bake without tone mapping.
    ColorGradingNone,
    /// LUT bake with ACES tone mapping.
    ColorGradingAces,
    /// LUT bake with neutral tone mapping.
    ColorGradingNeutral,
    /// LUT bake with Reinhard tone mapping.
    ColorGradingReinhard,
    /// Applies the baked LUT.
    ApplyColorGrading,
    /// Rescales the graded image to the camera size.
    FinalRescale,
}

impl Pass {
    /// The pass index within the material.
    pub fn index(self) -> u32 {
        self as u32
    }

    /// The LUT bake passes, offset by [`ToneMappingMode`] discriminant.
    const COLOR_GRADING: [Pass; 4] = [
        Pass::ColorGradingNone,
        Pass::ColorGradingAces,
        Pass::ColorGradingNeutral,
        Pass::ColorGradingReinhard,
    ];

    /// The LUT bake pass for a tone-mapping operator: `ColorGradingNone`
    /// offset by the operator.
    pub fn color_grading(mode: ToneMappingMode) -> Self {
        Self::COLOR_GRADING[mode as usize]
    }
}

/// Shader property handles written by the post-processing lane.
pub mod ids {
    use umbra_core::renderer::ShaderPropertyId;

    /// Primary input of a post-processing pass.
    pub const POST_FX_SOURCE: ShaderPropertyId = ShaderPropertyId::from_name("_PostFXSource");
    /// Secondary input of combine passes.
    pub const POST_FX_SOURCE2: ShaderPropertyId = ShaderPropertyId::from_name("_PostFXSource2");
    /// 1 when bloom upsampling is bicubic.
    pub const BLOOM_BICUBIC_UPSAMPLING: ShaderPropertyId =
        ShaderPropertyId::from_name("_BloomBicubicUpsampling");
    /// Half-resolution prefiltered source.
    pub const BLOOM_PREFILTER: ShaderPropertyId = ShaderPropertyId::from_name("_BloomPrefilter");
    /// Soft threshold curve.
    pub const BLOOM_THRESHOLD: ShaderPropertyId = ShaderPropertyId::from_name("_BloomThreshold");
    /// Combine intensity or scatter factor.
    pub const BLOOM_INTENSITY: ShaderPropertyId = ShaderPropertyId::from_name("_BloomIntensity");
    /// Source with bloom applied, at buffer size.
    pub const BLOOM_RESULT: ShaderPropertyId = ShaderPropertyId::from_name("_BloomResult");
    /// Exposure, contrast, hue shift and saturation.
    pub const COLOR_ADJUSTMENTS: ShaderPropertyId =
        ShaderPropertyId::from_name("_ColorAdjustments");
    /// Linear color filter.
    pub const COLOR_FILTER: ShaderPropertyId = ShaderPropertyId::from_name("_ColorFilter");
    /// LMS white balance coefficients.
    pub const WHITE_BALANCE: ShaderPropertyId = ShaderPropertyId::from_name("_WhiteBalance");
    /// Split-toning shadow tint, balance in alpha.
    pub const SPLIT_TONING_SHADOWS: ShaderPropertyId =
        ShaderPropertyId::from_name("_SplitToningShadows");
    /// Split-toning highlight tint.
    pub const SPLIT_TONING_HIGHLIGHTS: ShaderPropertyId =
        ShaderPropertyId::from_name("_SplitToningHighlights");
    /// Channel mixer red output row.
    pub const CHANNEL_MIXER_RED: ShaderPropertyId = ShaderPropertyId::from_name("_ChannelMixerRed");
    /// Channel mixer green output row.
    pub const CHANNEL_MIXER_GREEN: ShaderPropertyId =
        ShaderPropertyId::from_name("_ChannelMixerGreen");
    /// Channel mixer blue output row.
    pub const CHANNEL_MIXER_BLUE: ShaderPropertyId =
        ShaderPropertyId::from_name("_ChannelMixerBlue");
    /// Shadows tint.
    pub const SMH_SHADOWS: ShaderPropertyId = ShaderPropertyId::from_name("_SMHShadows");
    /// Midtones tint.
    pub const SMH_MIDTONES: ShaderPropertyId = ShaderPropertyId::from_name("_SMHMidtones");
    /// Highlights tint.
    pub const SMH_HIGHLIGHTS: ShaderPropertyId = ShaderPropertyId::from_name("_SMHHighlights");
    /// Shadow and highlight ranges.
    pub const SMH_RANGE: ShaderPropertyId = ShaderPropertyId::from_name("_SMHRange");
    /// The baked grading LUT.
    pub const COLOR_GRADING_LUT: ShaderPropertyId = ShaderPropertyId::from_name("_ColorGradingLUT");
    /// LUT bake, then LUT sampling, parameters.
    pub const COLOR_GRADING_LUT_PARAMETERS: ShaderPropertyId =
        ShaderPropertyId::from_name("_ColorGradingLUTParameters");
    /// 1 when the LUT is baked in Log C space.
    pub const COLOR_GRADING_LUT_IN_LOG_C: ShaderPropertyId =
        ShaderPropertyId::from_name("_ColorGradingLUTInLogC");
    /// 1 when the final rescale samples bicubically.
    pub const COPY_BICUBIC: ShaderPropertyId = ShaderPropertyId::from_name("_CopyBicubic");
    /// Graded image before rescaling.
    pub const FINAL_RESULT: ShaderPropertyId = ShaderPropertyId::from_name("_FinalResult");
    /// Source blend factor of the final draw.
    pub const FINAL_SRC_BLEND: ShaderPropertyId = ShaderPropertyId::from_name("_FinalSrcBlend");
    /// Destination blend factor of the final draw.
    pub const FINAL_DST_BLEND: ShaderPropertyId = ShaderPropertyId::from_name("_FinalDstBlend");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grading_passes_follow_tone_mapping_order() {
        let base = Pass::ColorGradingNone.index();
        for (offset, mode) in [
            ToneMappingMode::None,
            ToneMappingMode::Aces,
            ToneMappingMode::Neutral,
            ToneMappingMode::Reinhard,
        ]
        .into_iter()
        .enumerate()
        {
            assert_eq!(mode as u32, offset as u32);
            assert_eq!(Pass::color_grading(mode).index(), base + mode as u32);
        }
        assert_eq!(Pass::ApplyColorGrading.index(), base + 4);
    }
}
