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

//! The contracts and data model of the forward pipeline.
//!
//! The host engine implements [`RenderContext`] and [`CullingResults`]; the
//! pipeline records [`CommandBuffer`]s against them.

pub mod camera;
pub mod command;
pub mod context;
pub mod culling;
pub mod draw;
pub mod error;
pub mod ids;
pub mod light;
pub mod settings;

pub use self::camera::{Camera, CameraType, ClearFlags};
pub use self::command::{
    BlitMaterial, Command, CommandBuffer, FilterMode, LoadAction, RenderTarget, StoreAction,
    TemporaryTextureDesc, TextureFormat, Viewport,
};
pub use self::context::{execute_and_clear, GizmoSubset, RenderContext};
pub use self::culling::{
    Bounds, CubemapFace, CullingParameters, CullingResults, ShadowDrawingSettings,
    ShadowMatrices, ShadowProjection, ShadowSplitData,
};
pub use self::draw::{
    DeviceCapabilities, DrawingSettings, FilteringSettings, PerObjectData, RenderQueueRange,
    SortingCriteria, LIT_SHADER_TAG, UNLIT_SHADER_TAG,
};
pub use self::error::SettingsError;
pub use self::ids::ShaderPropertyId;
pub use self::light::{
    LightBakeType, LightBakingOutput, LightKind, LightShadowSettings, LightShadows,
    MixedLightingMode, VisibleLight,
};
