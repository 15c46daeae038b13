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

//! Bloom: threshold, blur pyramid and recombination.

use super::ids::*;
use super::stack::PostFxStack;
use super::{Pass, MAX_BLOOM_PYRAMID_LEVELS};
use umbra_core::math::color::gamma_to_linear;
use umbra_core::math::Vec4;
use umbra_core::renderer::settings::{BloomMode, BloomSettings};
use umbra_core::renderer::{RenderTarget, ShaderPropertyId, TemporaryTextureDesc};

/// Soft-knee threshold curve.
///
/// `threshold` is given in gamma space; the curve works on linear brightness.
pub fn threshold_curve(threshold: f32, knee: f32) -> Vec4 {
    let t = gamma_to_linear(threshold);
    let tk = t * knee;
    Vec4::new(t, tk - t, 2.0 * tk, 0.25 / (tk + 0.00001))
}

impl PostFxStack {
    /// Renders bloom of `source` into `_BloomResult`.
    ///
    /// Returns `false`, having acquired nothing, when the configuration or the
    /// buffer size leaves nothing to blur.
    pub(super) fn do_bloom(&mut self, bloom: &BloomSettings, source: ShaderPropertyId) -> bool {
        let (mut width, mut height) = if bloom.ignore_render_scale {
            (self.camera_size.0 / 2, self.camera_size.1 / 2)
        } else {
            (self.frame.buffer_size.0 / 2, self.frame.buffer_size.1 / 2)
        };
        let limit = bloom.downscale_limit;
        if bloom.max_iterations == 0
            || bloom.intensity <= 0.0
            || height < limit * 2
            || width < limit * 2
        {
            log::trace!("PostFxStack: bloom skipped at {width}x{height}");
            return false;
        }

        self.buffer.begin_named_sample("Bloom");
        self.buffer.set_global_vector(
            BLOOM_THRESHOLD,
            threshold_curve(bloom.threshold, bloom.threshold_knee),
        );
        let format = self.color_format();
        self.buffer.get_temporary(
            BLOOM_PREFILTER,
            TemporaryTextureDesc::color(width, height, format),
        );
        let prefilter = if bloom.fade_fireflies {
            Pass::BloomPrefilterFireflies
        } else {
            Pass::BloomPrefilter
        };
        self.draw(source, RenderTarget::Temporary(BLOOM_PREFILTER), prefilter);
        width /= 2;
        height /= 2;

        let max_levels = (bloom.max_iterations as usize).min(MAX_BLOOM_PYRAMID_LEVELS);
        let mut from = BLOOM_PREFILTER;
        let mut levels = 0;
        while levels < max_levels && height >= limit && width >= limit {
            let mid = self.bloom_pyramid[2 * levels];
            let to = self.bloom_pyramid[2 * levels + 1];
            self.buffer
                .get_temporary(mid, TemporaryTextureDesc::color(width, height, format));
            self.buffer
                .get_temporary(to, TemporaryTextureDesc::color(width, height, format));
            self.draw(from, RenderTarget::Temporary(mid), Pass::BloomHorizontal);
            self.draw(mid, RenderTarget::Temporary(to), Pass::BloomVertical);
            from = to;
            levels += 1;
            width /= 2;
            height /= 2;
        }
        self.buffer.release_temporary(BLOOM_PREFILTER);
        self.buffer.set_global_float(
            BLOOM_BICUBIC_UPSAMPLING,
            if bloom.bicubic_upsampling { 1.0 } else { 0.0 },
        );

        let (combine, final_pass, final_intensity) = match bloom.mode {
            BloomMode::Additive => {
                self.buffer.set_global_float(BLOOM_INTENSITY, 1.0);
                (Pass::BloomAdd, Pass::BloomAdd, bloom.intensity)
            }
            BloomMode::Scattering => {
                self.buffer.set_global_float(BLOOM_INTENSITY, bloom.scatter);
                (
                    Pass::BloomScatter,
                    Pass::BloomScatterFinal,
                    bloom.intensity.min(0.95),
                )
            }
        };

        if levels > 1 {
            self.buffer
                .release_temporary(self.bloom_pyramid[2 * (levels - 1)]);
            for level in (0..levels - 1).rev() {
                let to = self.bloom_pyramid[2 * level];
                let partner = self.bloom_pyramid[2 * level + 1];
                self.buffer
                    .set_global_texture(POST_FX_SOURCE2, RenderTarget::Temporary(partner));
                self.draw(from, RenderTarget::Temporary(to), combine);
                self.buffer.release_temporary(from);
                self.buffer.release_temporary(partner);
                from = to;
            }
        } else {
            self.buffer.release_temporary(self.bloom_pyramid[0]);
        }

        self.buffer.set_global_float(BLOOM_INTENSITY, final_intensity);
        self.buffer
            .set_global_texture(POST_FX_SOURCE2, RenderTarget::Temporary(source));
        let (buffer_width, buffer_height) = self.frame.buffer_size;
        self.buffer.get_temporary(
            BLOOM_RESULT,
            TemporaryTextureDesc::color(buffer_width, buffer_height, format),
        );
        self.draw(from, RenderTarget::Temporary(BLOOM_RESULT), final_pass);
        self.buffer.release_temporary(from);
        self.buffer.end_named_sample("Bloom");
        log::trace!("PostFxStack: bloom with {levels} pyramid levels");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_threshold_curve() {
        let curve = threshold_curve(1.0, 0.5);
        assert_relative_eq!(curve.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(curve.y, -0.5, epsilon = 1e-5);
        assert_relative_eq!(curve.z, 1.0, epsilon = 1e-5);
        assert_relative_eq!(curve.w, 0.25 / 0.50001, epsilon = 1e-5);
    }

    #[test]
    fn test_threshold_is_linearized() {
        let curve = threshold_curve(0.5, 0.0);
        assert!(curve.x < 0.5);
        assert_relative_eq!(curve.x, gamma_to_linear(0.5));
        assert_relative_eq!(curve.y, -curve.x);
        assert_eq!(curve.z, 0.0);
    }
}
