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

//! Deferred command recording.
//!
//! Lanes never talk to the GPU directly. They record [`Command`]s into a
//! [`CommandBuffer`] and hand the buffer to
//! [`RenderContext::execute_command_buffer`](super::RenderContext::execute_command_buffer);
//! nothing takes effect before that call.

use super::ids::ShaderPropertyId;
use crate::math::{LinearRgba, Mat4, Vec4};
use std::borrow::Cow;

/// A texture a command can read from or render into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderTarget {
    /// The camera's final output (back buffer or its render texture).
    CameraTarget,
    /// A temporary texture acquired with [`Command::GetTemporary`].
    Temporary(ShaderPropertyId),
    /// The engine's placeholder texture for unbound samplers.
    MissingTexture,
}

/// What happens to existing target contents when it is bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadAction {
    /// Existing contents are preserved.
    Load,
    /// Existing contents are undefined; every pixel will be overwritten.
    DontCare,
}

/// What happens to rendered contents when the target is unbound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreAction {
    /// Contents are kept for later reads.
    Store,
    /// Contents may be discarded.
    DontCare,
}

/// Format class of a temporary texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFormat {
    /// The platform's default LDR color format.
    Default,
    /// The platform's default HDR color format.
    DefaultHdr,
    /// A depth-only format.
    Depth,
    /// A depth format usable for hardware shadow comparisons.
    Shadowmap,
}

/// Sampling filter of a temporary texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    /// Nearest texel.
    Point,
    /// Bilinear interpolation.
    Bilinear,
}

/// Describes a temporary texture request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemporaryTextureDesc {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Depth-buffer bits, 0 for pure color textures.
    pub depth_bits: u32,
    /// Sampling filter.
    pub filter: FilterMode,
    /// Format class.
    pub format: TextureFormat,
}

impl TemporaryTextureDesc {
    /// A bilinear color texture without depth.
    pub fn color(width: u32, height: u32, format: TextureFormat) -> Self {
        Self {
            width,
            height,
            depth_bits: 0,
            filter: FilterMode::Bilinear,
            format,
        }
    }

    /// A 32-bit shadow-map texture.
    pub fn shadow_map(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            depth_bits: 32,
            filter: FilterMode::Bilinear,
            format: TextureFormat::Shadowmap,
        }
    }

    /// A 32-bit point-filtered depth texture.
    pub fn depth(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            depth_bits: 32,
            filter: FilterMode::Point,
            format: TextureFormat::Depth,
        }
    }
}

/// A pixel-space viewport rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    /// Left edge in pixels.
    pub x: f32,
    /// Bottom edge in pixels.
    pub y: f32,
    /// Width in pixels.
    pub width: f32,
    /// Height in pixels.
    pub height: f32,
}

impl Viewport {
    /// Creates a new viewport.
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// The material a full-screen procedural draw uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlitMaterial {
    /// The post-processing material (bloom, grading, final passes).
    PostFx,
    /// The camera copy material (color/depth copies and the final copy).
    CameraCopy,
}

/// A single recorded command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Opens a named profiling sample.
    BeginSample(String),
    /// Closes a named profiling sample.
    EndSample(String),
    /// Acquires a temporary texture under `id`.
    GetTemporary {
        /// The handle the texture is bound to.
        id: ShaderPropertyId,
        /// The requested texture.
        desc: TemporaryTextureDesc,
    },
    /// Returns a temporary texture to the pool.
    ReleaseTemporary(ShaderPropertyId),
    /// Binds color and optional depth attachments.
    SetRenderTarget {
        /// The color attachment.
        color: RenderTarget,
        /// Load action for the color attachment.
        color_load: LoadAction,
        /// Store action for the color attachment.
        color_store: StoreAction,
        /// A separate depth attachment, if any.
        depth: Option<(RenderTarget, LoadAction, StoreAction)>,
    },
    /// Clears the bound target.
    ClearRenderTarget {
        /// Whether depth is cleared.
        clear_depth: bool,
        /// Whether color is cleared.
        clear_color: bool,
        /// The color used when `clear_color` is set.
        color: LinearRgba,
    },
    /// Sets the rasterization viewport.
    SetViewport(Viewport),
    /// Sets the view and projection matrices.
    SetViewProjection {
        /// World to view.
        view: Mat4,
        /// View to clip.
        projection: Mat4,
    },
    /// Sets the global depth bias used by subsequent draws.
    SetGlobalDepthBias {
        /// Constant bias.
        bias: f32,
        /// Slope-scaled bias.
        slope_bias: f32,
    },
    /// Enables a global shader keyword.
    EnableKeyword(&'static str),
    /// Disables a global shader keyword.
    DisableKeyword(&'static str),
    /// Sets a global integer.
    SetGlobalInt(ShaderPropertyId, i32),
    /// Sets a global float.
    SetGlobalFloat(ShaderPropertyId, f32),
    /// Sets a global vector.
    SetGlobalVector(ShaderPropertyId, Vec4),
    /// Sets a global vector array.
    SetGlobalVectorArray(ShaderPropertyId, Vec<Vec4>),
    /// Sets a global matrix array.
    SetGlobalMatrixArray(ShaderPropertyId, Vec<Mat4>),
    /// Binds a texture to a global sampler.
    SetGlobalTexture(ShaderPropertyId, RenderTarget),
    /// Draws a full-screen triangle with the given material pass.
    DrawProcedural {
        /// The material.
        material: BlitMaterial,
        /// The material pass index.
        pass: u32,
    },
    /// Copies a whole texture with a native GPU copy.
    CopyTexture {
        /// The texture read from.
        source: RenderTarget,
        /// The texture written to.
        destination: RenderTarget,
    },
}

/// An ordered list of commands waiting to be executed.
#[derive(Debug, Clone, Default)]
pub struct CommandBuffer {
    name: Cow<'static, str>,
    commands: Vec<Command>,
}

impl CommandBuffer {
    /// Creates an empty buffer.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            commands: Vec::new(),
        }
    }

    /// The buffer's name, used for profiling samples.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Renames the buffer.
    pub fn set_name(&mut self, name: impl Into<Cow<'static, str>>) {
        self.name = name.into();
    }

    /// The recorded commands, in order.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Number of recorded commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Drops all recorded commands, keeping the allocation.
    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Appends a raw command.
    pub fn push(&mut self, command: Command) {
        self.commands.push(command);
    }

    /// Opens a profiling sample named after the buffer.
    pub fn begin_sample(&mut self) {
        self.commands.push(Command::BeginSample(self.name.to_string()));
    }

    /// Closes the profiling sample named after the buffer.
    pub fn end_sample(&mut self) {
        self.commands.push(Command::EndSample(self.name.to_string()));
    }

    /// Opens a profiling sample with an explicit name.
    pub fn begin_named_sample(&mut self, name: &str) {
        self.commands.push(Command::BeginSample(name.to_owned()));
    }

    /// Closes a profiling sample with an explicit name.
    pub fn end_named_sample(&mut self, name: &str) {
        self.commands.push(Command::EndSample(name.to_owned()));
    }

    /// Acquires a temporary texture.
    pub fn get_temporary(&mut self, id: ShaderPropertyId, desc: TemporaryTextureDesc) {
        self.commands.push(Command::GetTemporary { id, desc });
    }

    /// Releases a temporary texture.
    pub fn release_temporary(&mut self, id: ShaderPropertyId) {
        self.commands.push(Command::ReleaseTemporary(id));
    }

    /// Binds a single color target.
    pub fn set_render_target(&mut self, target: RenderTarget, load: LoadAction, store: StoreAction) {
        self.commands.push(Command::SetRenderTarget {
            color: target,
            color_load: load,
            color_store: store,
            depth: None,
        });
    }

    /// Binds separate color and depth targets.
    pub fn set_render_targets(
        &mut self,
        color: (RenderTarget, LoadAction, StoreAction),
        depth: (RenderTarget, LoadAction, StoreAction),
    ) {
        self.commands.push(Command::SetRenderTarget {
            color: color.0,
            color_load: color.1,
            color_store: color.2,
            depth: Some(depth),
        });
    }

    /// Clears the bound target.
    pub fn clear_render_target(&mut self, clear_depth: bool, clear_color: bool, color: LinearRgba) {
        self.commands.push(Command::ClearRenderTarget {
            clear_depth,
            clear_color,
            color,
        });
    }

    /// Sets the viewport.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.commands.push(Command::SetViewport(viewport));
    }

    /// Sets view and projection matrices.
    pub fn set_view_projection(&mut self, view: Mat4, projection: Mat4) {
        self.commands
            .push(Command::SetViewProjection { view, projection });
    }

    /// Sets the global depth bias.
    pub fn set_global_depth_bias(&mut self, bias: f32, slope_bias: f32) {
        self.commands
            .push(Command::SetGlobalDepthBias { bias, slope_bias });
    }

    /// Enables a keyword.
    pub fn enable_keyword(&mut self, keyword: &'static str) {
        self.commands.push(Command::EnableKeyword(keyword));
    }

    /// Disables a keyword.
    pub fn disable_keyword(&mut self, keyword: &'static str) {
        self.commands.push(Command::DisableKeyword(keyword));
    }

    /// Enables or disables a keyword.
    pub fn set_keyword(&mut self, keyword: &'static str, enabled: bool) {
        if enabled {
            self.enable_keyword(keyword);
        } else {
            self.disable_keyword(keyword);
        }
    }

    /// Toggles a whole keyword family so that only `keywords[enabled]` is on.
    ///
    /// `None`, or an index past the end, disables every keyword of the family,
    /// which selects the keyword-less shader variant.
    pub fn set_keyword_family(&mut self, keywords: &[&'static str], enabled: Option<usize>) {
        for (i, keyword) in keywords.iter().enumerate() {
            self.set_keyword(keyword, enabled == Some(i));
        }
    }

    /// Sets a global integer.
    pub fn set_global_int(&mut self, id: ShaderPropertyId, value: i32) {
        self.commands.push(Command::SetGlobalInt(id, value));
    }

    /// Sets a global float.
    pub fn set_global_float(&mut self, id: ShaderPropertyId, value: f32) {
        self.commands.push(Command::SetGlobalFloat(id, value));
    }

    /// Sets a global vector.
    pub fn set_global_vector(&mut self, id: ShaderPropertyId, value: Vec4) {
        self.commands.push(Command::SetGlobalVector(id, value));
    }

    /// Uploads a global vector array.
    pub fn set_global_vector_array(&mut self, id: ShaderPropertyId, values: &[Vec4]) {
        self.commands
            .push(Command::SetGlobalVectorArray(id, values.to_vec()));
    }

    /// Uploads a global matrix array.
    pub fn set_global_matrix_array(&mut self, id: ShaderPropertyId, values: &[Mat4]) {
        self.commands
            .push(Command::SetGlobalMatrixArray(id, values.to_vec()));
    }

    /// Binds a texture to a global sampler.
    pub fn set_global_texture(&mut self, id: ShaderPropertyId, texture: RenderTarget) {
        self.commands.push(Command::SetGlobalTexture(id, texture));
    }

    /// Draws a full-screen triangle.
    pub fn draw_procedural(&mut self, material: BlitMaterial, pass: u32) {
        self.commands
            .push(Command::DrawProcedural { material, pass });
    }

    /// Copies a texture with a native GPU copy.
    pub fn copy_texture(&mut self, source: RenderTarget, destination: RenderTarget) {
        self.commands.push(Command::CopyTexture {
            source,
            destination,
        });
    }
}
