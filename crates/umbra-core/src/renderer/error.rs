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

//! Error types of the rendering configuration surface.
//!
//! Frame rendering itself is infallible: rejected shadow reservations are
//! reported through sentinel data and invalid cameras are skipped. The only
//! fallible operations are loading and validating settings.

use std::fmt;

/// An error raised while loading or validating pipeline settings.
#[derive(Debug)]
pub enum SettingsError {
    /// The settings file could not be read.
    Io {
        /// The path of the file that failed to load.
        path: String,
        /// The underlying I/O error.
        source_error: String,
    },
    /// The settings text is not valid RON for the settings schema.
    Parse(String),
    /// The settings could not be serialized.
    Serialize(String),
    /// A field holds a value outside its accepted range.
    InvalidValue {
        /// Dotted path of the offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::Io { path, source_error } => {
                write!(f, "Failed to read pipeline settings from '{path}': {source_error}")
            }
            SettingsError::Parse(details) => {
                write!(f, "Failed to parse pipeline settings: {details}")
            }
            SettingsError::Serialize(details) => {
                write!(f, "Failed to serialize pipeline settings: {details}")
            }
            SettingsError::InvalidValue { field, reason } => {
                write!(f, "Invalid value for '{field}': {reason}")
            }
        }
    }
}

impl std::error::Error for SettingsError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_the_field() {
        let err = SettingsError::InvalidValue {
            field: "shadows.directional.cascade_count",
            reason: "must be between 1 and 4, got 6".into(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid value for 'shadows.directional.cascade_count': must be between 1 and 4, got 6"
        );
    }
}
