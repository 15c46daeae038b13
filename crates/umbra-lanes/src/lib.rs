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

//! Hot-path strategies of the Umbra forward pipeline.
//!
//! - [`shadow_lane`]: shadow-slot allocation, atlas layout and shadow-map rendering.
//! - [`lighting_lane`]: visible-light collection into fixed-size GPU tables.
//! - [`post_fx_lane`]: bloom, color grading, tone mapping and final rescaling.

pub mod lighting_lane;
pub mod post_fx_lane;
pub mod shadow_lane;
