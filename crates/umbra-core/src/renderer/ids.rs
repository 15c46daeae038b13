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

//! Name-derived shader property handles.

use std::fmt;

/// An integer handle naming a global shader property, keyword-free texture slot
/// or temporary render target.
///
/// Handles are derived from the property name with a 32-bit FNV-1a hash, so the
/// same name always maps to the same id and ids can be built in `const` context.
///
/// ```
/// use umbra_core::renderer::ShaderPropertyId;
/// const ATLAS: ShaderPropertyId = ShaderPropertyId::from_name("_DirectionalShadowAtlas");
/// assert_eq!(ATLAS, ShaderPropertyId::from_name("_DirectionalShadowAtlas"));
/// assert_ne!(ATLAS, ShaderPropertyId::from_name("_OtherShadowAtlas"));
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShaderPropertyId(u32);

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

impl ShaderPropertyId {
    /// Derives the handle for `name`.
    pub const fn from_name(name: &str) -> Self {
        let bytes = name.as_bytes();
        let mut hash = FNV_OFFSET_BASIS;
        let mut i = 0;
        while i < bytes.len() {
            hash ^= bytes[i] as u32;
            hash = hash.wrapping_mul(FNV_PRIME);
            i += 1;
        }
        Self(hash)
    }

    /// The raw hash value.
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for ShaderPropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ShaderPropertyId({:#010x})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fnv1a_reference_values() {
        assert_eq!(ShaderPropertyId::from_name("").raw(), 0x811c_9dc5);
        assert_eq!(ShaderPropertyId::from_name("a").raw(), 0xe40c_292c);
    }

    #[test]
    fn test_pyramid_level_names_are_distinct() {
        let ids: Vec<_> = (0..32)
            .map(|i| ShaderPropertyId::from_name(&format!("_BloomPyramid{i}")))
            .collect();
        let mut sorted = ids.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), ids.len());
    }
}
