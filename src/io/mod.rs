// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! I/O operations for photos, merged uploads, and settings files.

pub mod compositor;
pub mod media;
pub mod serialization;
pub mod submission;
