// SPDX-License-Identifier: GPL-3.0-or-later
// src/domain/mod.rs
//
// Domain layer: images, crop geometry and progress. No UI or threading concerns.

pub mod crop;
pub mod image;
pub mod progress;
