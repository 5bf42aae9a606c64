// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Data model for the annotation engine.

pub mod display;
pub mod settings;
pub mod stroke;
pub mod surface;
