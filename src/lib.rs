// SPDX-License-Identifier: GPL-3.0-or-later
// src/lib.rs
//
// Pictor: front-end for a two-stage (base + refiner) image diffusion pipeline.

pub mod app;
pub mod config;
pub mod constant;
pub mod domain;
pub mod error;
pub mod ui;

pub use error::{Error, GenerationError, Result};
