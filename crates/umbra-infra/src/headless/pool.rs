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

//! Temporary texture bookkeeping.

use std::collections::HashMap;
use umbra_core::renderer::{ShaderPropertyId, TemporaryTextureDesc};

/// A misuse of the temporary texture pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolViolation {
    /// An id was acquired while already holding a texture.
    DoubleAcquire(ShaderPropertyId),
    /// An id was released without holding a texture.
    UnknownRelease(ShaderPropertyId),
}

/// Tracks temporary textures between acquisition and release.
#[derive(Debug, Default)]
pub struct TexturePool {
    outstanding: HashMap<ShaderPropertyId, TemporaryTextureDesc>,
    acquired_total: usize,
    released_total: usize,
    peak: usize,
    violations: Vec<PoolViolation>,
}

impl TexturePool {
    pub(crate) fn acquire(&mut self, id: ShaderPropertyId, desc: TemporaryTextureDesc) {
        if self.outstanding.insert(id, desc).is_some() {
            log::warn!("TexturePool: {id:?} acquired twice without release");
            self.violations.push(PoolViolation::DoubleAcquire(id));
        }
        self.acquired_total += 1;
        self.peak = self.peak.max(self.outstanding.len());
    }

    pub(crate) fn release(&mut self, id: ShaderPropertyId) {
        if self.outstanding.remove(&id).is_none() {
            log::warn!("TexturePool: release of {id:?} which is not held");
            self.violations.push(PoolViolation::UnknownRelease(id));
        }
        self.released_total += 1;
    }

    /// Number of textures currently held.
    pub fn outstanding(&self) -> usize {
        self.outstanding.len()
    }

    /// The descriptor of a held texture.
    pub fn get(&self, id: ShaderPropertyId) -> Option<&TemporaryTextureDesc> {
        self.outstanding.get(&id)
    }

    /// Total acquisitions so far.
    pub fn acquired_total(&self) -> usize {
        self.acquired_total
    }

    /// Total releases so far.
    pub fn released_total(&self) -> usize {
        self.released_total
    }

    /// Largest number of textures held at once.
    pub fn peak(&self) -> usize {
        self.peak
    }

    /// Every misuse recorded so far.
    pub fn violations(&self) -> &[PoolViolation] {
        &self.violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use umbra_core::renderer::TextureFormat;

    const A: ShaderPropertyId = ShaderPropertyId::from_name("_A");
    const B: ShaderPropertyId = ShaderPropertyId::from_name("_B");

    #[test]
    fn test_balanced_use_has_no_violations() {
        let mut pool = TexturePool::default();
        let desc = TemporaryTextureDesc::color(4, 4, TextureFormat::Default);
        pool.acquire(A, desc);
        pool.acquire(B, desc);
        assert_eq!(pool.get(A), Some(&desc));
        pool.release(B);
        pool.release(A);
        assert_eq!(pool.outstanding(), 0);
        assert_eq!(pool.peak(), 2);
        assert_eq!(pool.acquired_total(), pool.released_total());
        assert!(pool.violations().is_empty());
    }

    #[test]
    fn test_misuse_is_recorded() {
        let mut pool = TexturePool::default();
        let desc = TemporaryTextureDesc::depth(4, 4);
        pool.acquire(A, desc);
        pool.acquire(A, desc);
        pool.release(B);
        assert_eq!(
            pool.violations(),
            &[PoolViolation::DoubleAcquire(A), PoolViolation::UnknownRelease(B)]
        );
    }
}
