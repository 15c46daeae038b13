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

//! Concrete implementations of the Umbra host-engine contracts.
//!
//! The [`headless`] backend records everything the pipeline asks of the engine
//! instead of talking to a GPU. It still does real work where the pipeline's
//! behaviour depends on it: light culling, shadow projections, and bookkeeping
//! of temporary textures so leaks and double releases are caught.

#![warn(missing_docs)]

pub mod headless;

pub use headless::{FrameEvent, HeadlessContext, HeadlessCulling, HeadlessScene, PoolViolation};
