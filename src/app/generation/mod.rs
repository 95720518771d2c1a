// SPDX-License-Identifier: GPL-3.0-or-later
// src/app/generation/mod.rs
//
// Generation backends and the background worker that runs them.

mod placeholder;
mod service;
mod worker;

pub use placeholder::PlaceholderGenerator;
pub use service::{GenerationRequest, ImageGenerator};
pub use worker::{ChannelSink, GenerationHandle, GenerationWorker, WorkerUpdate};
