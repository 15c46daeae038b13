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

//! Defines the `LinearRgba` color type and the gamma conversions the
//! post-processing parameters rely on.

use crate::math::vector::Vec4;
use serde::{Deserialize, Serialize};
use std::ops::Mul;

/// Linear-space RGBA color. Light colors and clear colors are stored in this form.
///
/// Component values may exceed `1.0` (light colors are premultiplied by
/// intensity). `#[repr(C)]` keeps the layout identical to a [`Vec4`].
#[derive(
    Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable, Serialize, Deserialize,
)]
#[repr(C)]
pub struct LinearRgba {
    /// Red.
    pub r: f32,
    /// Green.
    pub g: f32,
    /// Blue.
    pub b: f32,
    /// The alpha (opacity) component.
    pub a: f32,
}

impl LinearRgba {
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    /// Opaque mid gray (`[0.5, 0.5, 0.5, 1.0]`).
    pub const GRAY: Self = Self::rgb(0.5, 0.5, 0.5);
    /// All channels zero, the default clear color for overlays.
    pub const TRANSPARENT: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    /// Creates a color from all four channels.
    #[inline]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Creates an opaque color.
    #[inline]
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Creates a `LinearRgba` from sRGB-encoded components. Alpha is kept as is.
    #[inline]
    pub fn from_srgb(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self::new(gamma_to_linear(r), gamma_to_linear(g), gamma_to_linear(b), a)
    }

    /// Returns a copy with the alpha replaced.
    #[inline]
    pub fn with_alpha(&self, a: f32) -> Self {
        Self { a, ..*self }
    }

    /// Packs the channels as `(r, g, b, a)`.
    #[inline]
    pub fn to_vec4(&self) -> Vec4 {
        Vec4::new(self.r, self.g, self.b, self.a)
    }
}

impl Default for LinearRgba {
    /// Returns opaque white.
    fn default() -> Self {
        Self::WHITE
    }
}

impl Mul<f32> for LinearRgba {
    type Output = Self;
    /// Scales the RGB channels; alpha is left untouched.
    #[inline]
    fn mul(self, scalar: f32) -> Self::Output {
        Self::new(self.r * scalar, self.g * scalar, self.b * scalar, self.a)
    }
}

/// Converts an sRGB-encoded value to linear space.
#[inline]
pub fn gamma_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// Converts a linear value to sRGB encoding.
#[inline]
pub fn linear_to_gamma(c: f32) -> f32 {
    if c <= 0.0031308 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_gamma_round_trip_and_fixed_points() {
        assert_eq!(gamma_to_linear(0.0), 0.0);
        assert_relative_eq!(gamma_to_linear(1.0), 1.0, epsilon = 1e-6);
        assert_relative_eq!(gamma_to_linear(0.5), 0.214_041_14, epsilon = 1e-5);
        assert_relative_eq!(linear_to_gamma(gamma_to_linear(0.73)), 0.73, epsilon = 1e-5);
    }

    #[test]
    fn test_scalar_mul_keeps_alpha() {
        let c = LinearRgba::new(0.5, 1.0, 2.0, 0.25) * 2.0;
        assert_eq!(c, LinearRgba::new(1.0, 2.0, 4.0, 0.25));
    }

    #[test]
    fn test_from_srgb_linearizes_rgb_only() {
        let c = LinearRgba::from_srgb(0.5, 0.5, 0.5, 0.5);
        assert_relative_eq!(c.r, gamma_to_linear(0.5));
        assert_eq!(c.a, 0.5);
        assert_eq!(c.to_vec4().w, 0.5);
    }
}
