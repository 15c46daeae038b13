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

//! Acts as the **[A]gent** of the forward pipeline.
//!
//! [`RenderPipeline`] owns the global switches and renders every camera of a
//! frame through one [`CameraRenderer`]. The renderer sequences the lighting,
//! shadow and post-processing lanes and owns the light tables they fill.
//! Editor-only behavior is injected through [`RenderDiagnostics`].

mod camera_renderer;
mod diagnostics;
mod pipeline;

pub use self::camera_renderer::*;
pub use self::diagnostics::*;
pub use self::pipeline::*;
