// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Application settings.
//!
//! Every field has a default, so an empty or partial settings file is valid.

use super::stroke::StrokeStyle;
use serde::{Deserialize, Serialize};

/// Limits applied to a photo before it is previewed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionSettings {
    pub max_width: u32,
    pub max_height: u32,
    /// JPEG quality in `(0, 1]`.
    pub quality: f32,
}

impl Default for CompressionSettings {
    fn default() -> Self {
        Self {
            max_width: 1200,
            max_height: 800,
            quality: 0.6,
        }
    }
}

/// Complete settings document.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub stroke: StrokeStyle,
    /// JPEG quality of the merged upload, in `(0, 1]`.
    pub output_quality: f32,
    pub compression: CompressionSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            stroke: StrokeStyle::default(),
            output_quality: 0.9,
            compression: CompressionSettings::default(),
        }
    }
}

impl Settings {
    /// Pull out-of-range values back into something usable.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        self.output_quality = clamp_quality(self.output_quality, defaults.output_quality);
        self.compression.quality =
            clamp_quality(self.compression.quality, defaults.compression.quality);
        if !(self.stroke.width.is_finite() && self.stroke.width > 0.0) {
            self.stroke.width = defaults.stroke.width;
        }
        self.compression.max_width = self.compression.max_width.max(1);
        self.compression.max_height = self.compression.max_height.max(1);
        self
    }
}

fn clamp_quality(value: f32, fallback: f32) -> f32 {
    if value.is_finite() && value > 0.0 {
        value.min(1.0)
    } else {
        fallback
    }
}

/// Map a `(0, 1]` quality onto the 1-100 scale JPEG encoders take.
pub fn jpeg_quality(quality: f32) -> u8 {
    (quality * 100.0).round().clamp(1.0, 100.0) as u8
}
