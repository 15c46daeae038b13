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

//! # Lane Abstraction
//!
//! A **Lane** is one processing strategy the camera orchestrator drives during a
//! frame: the shadow allocator, the light collector and the post-processing stack.
//! Each lane records into its own [`CommandBuffer`](crate::renderer::CommandBuffer),
//! named after [`Lane::strategy_name`], so profiler samples and backend logs can be
//! traced back to the lane that produced them.
//!
//! Domain-specific execution methods live on the concrete lane types; this trait
//! only carries identity and classification.

use std::fmt;

/// Classification of a lane's role in the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LaneKind {
    /// Shadow-map allocation and atlas rendering.
    Shadow,
    /// Visible-light collection and GPU light tables.
    Lighting,
    /// Full-screen post-processing.
    PostProcess,
    /// Per-camera geometry passes.
    Camera,
}

impl fmt::Display for LaneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LaneKind::Shadow => write!(f, "Shadow"),
            LaneKind::Lighting => write!(f, "Lighting"),
            LaneKind::PostProcess => write!(f, "PostProcess"),
            LaneKind::Camera => write!(f, "Camera"),
        }
    }
}

/// The base trait shared by every lane.
pub trait Lane {
    /// Human-readable strategy name, also used as the command-buffer and
    /// profiling-sample name.
    fn strategy_name(&self) -> &'static str;

    /// The role this lane plays in the frame.
    fn lane_kind(&self) -> LaneKind;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Dummy;

    impl Lane for Dummy {
        fn strategy_name(&self) -> &'static str {
            "Dummy"
        }

        fn lane_kind(&self) -> LaneKind {
            LaneKind::Shadow
        }
    }

    #[test]
    fn test_lane_kind_display() {
        assert_eq!(LaneKind::PostProcess.to_string(), "PostProcess");
        let lane: &dyn Lane = &Dummy;
        assert_eq!(format!("{}:{}", lane.lane_kind(), lane.strategy_name()), "Shadow:Dummy");
    }
}
