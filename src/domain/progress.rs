// SPDX-License-Identifier: GPL-3.0-or-later
// src/domain/progress.rs
//
// Two-stage generation progress: per-step callbacks to one monotonic percentage.

use crate::constant::PROGRESS_MAX;
use crate::error::{Error, Result};

/// The two sequential stages of a generation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Base,
    Refiner,
}

impl Stage {
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Base => "Base",
            Stage::Refiner => "Refiner",
        }
    }
}

/// `Idle -> Running(Base) -> Running(Refiner) -> Complete -> Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProgressPhase {
    #[default]
    Idle,
    Running(Stage),
    Complete,
}

/// Step count per stage and the share of progress given to the base stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressConfig {
    total_steps: u32,
    split_fraction: f32,
}

impl ProgressConfig {
    pub fn new(total_steps: u32, split_fraction: f32) -> Result<Self> {
        if total_steps == 0 {
            return Err(Error::InvalidConfig("total steps must be positive".into()));
        }
        if !(split_fraction > 0.0 && split_fraction < 1.0) {
            return Err(Error::InvalidConfig(format!(
                "split fraction must be in (0, 1), got {split_fraction}"
            )));
        }
        Ok(Self {
            total_steps,
            split_fraction,
        })
    }

    pub fn total_steps(&self) -> u32 {
        self.total_steps
    }

    pub fn split_fraction(&self) -> f32 {
        self.split_fraction
    }
}

/// One emitted progress value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressUpdate {
    pub percent: f32,
    pub phase: ProgressPhase,
}

impl ProgressUpdate {
    /// Text shown next to the progress bar.
    pub fn label(&self) -> Option<&'static str> {
        match self.phase {
            ProgressPhase::Idle => None,
            ProgressPhase::Running(stage) => Some(stage.label()),
            ProgressPhase::Complete => Some("Done"),
        }
    }
}

/// Receives progress emissions. Implementations must not block.
pub trait ProgressSink {
    fn emit(&mut self, update: ProgressUpdate);
}

impl ProgressSink for Vec<ProgressUpdate> {
    fn emit(&mut self, update: ProgressUpdate) {
        self.push(update);
    }
}

/// Blends base and refiner step callbacks into a single 0..=100 value.
///
/// Emissions never decrease within a run: a step that would report less
/// than the previous value re-emits the previous value.
pub struct GenerationProgressTracker<S: ProgressSink> {
    config: ProgressConfig,
    phase: ProgressPhase,
    last: f32,
    sink: S,
}

impl<S: ProgressSink> GenerationProgressTracker<S> {
    pub fn new(config: ProgressConfig, sink: S) -> Self {
        Self {
            config,
            phase: ProgressPhase::Idle,
            last: 0.0,
            sink,
        }
    }

    pub fn phase(&self) -> ProgressPhase {
        self.phase
    }

    pub fn percent(&self) -> f32 {
        self.last
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Start a run: progress drops back to 0.
    pub fn begin(&mut self) {
        self.phase = ProgressPhase::Running(Stage::Base);
        self.last = 0.0;
        self.sink.emit(ProgressUpdate {
            percent: 0.0,
            phase: self.phase,
        });
    }

    /// Base stage reached `step`.
    pub fn on_stage_a_step(&mut self, step: u32) -> f32 {
        self.ensure_running();
        if self.phase != ProgressPhase::Running(Stage::Refiner) {
            self.phase = ProgressPhase::Running(Stage::Base);
        }
        let raw = self.stage_fraction(step) * PROGRESS_MAX * self.config.split_fraction;
        self.report(raw)
    }

    /// Refiner stage reached `step`.
    pub fn on_stage_b_step(&mut self, step: u32) -> f32 {
        self.ensure_running();
        self.phase = ProgressPhase::Running(Stage::Refiner);
        let split = self.config.split_fraction;
        let raw = PROGRESS_MAX * split + self.stage_fraction(step) * PROGRESS_MAX * (1.0 - split);
        self.report(raw)
    }

    /// Terminal emission of a run; always exactly 100.
    pub fn on_complete(&mut self) -> f32 {
        self.phase = ProgressPhase::Complete;
        self.last = PROGRESS_MAX;
        self.sink.emit(ProgressUpdate {
            percent: PROGRESS_MAX,
            phase: self.phase,
        });
        PROGRESS_MAX
    }

    /// Return to `Idle` after a completed run.
    pub fn reset(&mut self) {
        self.phase = ProgressPhase::Idle;
        self.last = 0.0;
    }

    fn ensure_running(&mut self) {
        if matches!(self.phase, ProgressPhase::Idle | ProgressPhase::Complete) {
            self.begin();
        }
    }

    fn stage_fraction(&self, step: u32) -> f32 {
        step.min(self.config.total_steps) as f32 / self.config.total_steps as f32
    }

    fn report(&mut self, raw: f32) -> f32 {
        if raw < self.last {
            log::debug!("Progress {raw:.2} below {:.2}, holding", self.last);
        }
        let percent = raw.max(self.last).min(PROGRESS_MAX);
        self.last = percent;
        self.sink.emit(ProgressUpdate {
            percent,
            phase: self.phase,
        });
        percent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker(steps: u32, split: f32) -> GenerationProgressTracker<Vec<ProgressUpdate>> {
        GenerationProgressTracker::new(ProgressConfig::new(steps, split).unwrap(), Vec::new())
    }

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn weights_both_stages() {
        let mut t = tracker(40, 0.8);
        t.begin();
        assert!(close(t.on_stage_a_step(20), 40.0));
        assert!(close(t.on_stage_a_step(40), 80.0));
        assert!(close(t.on_stage_b_step(20), 90.0));
        assert!(close(t.on_stage_b_step(39), 97.5));
        assert_eq!(t.on_complete(), 100.0);
    }

    #[test]
    fn complete_is_idempotent() {
        let mut t = tracker(40, 0.8);
        t.begin();
        t.on_stage_b_step(39);
        assert_eq!(t.on_complete(), 100.0);
        assert_eq!(t.on_complete(), 100.0);

        let emitted: Vec<f32> = t.sink().iter().map(|u| u.percent).collect();
        assert_eq!(&emitted[emitted.len() - 2..], &[100.0, 100.0]);
    }

    #[test]
    fn never_regresses() {
        let mut t = tracker(10, 0.5);
        t.begin();
        t.on_stage_a_step(8);
        assert!(close(t.on_stage_a_step(3), 40.0));
        t.on_stage_b_step(5);
        assert!(close(t.on_stage_a_step(10), 75.0));
        assert_eq!(t.phase(), ProgressPhase::Running(Stage::Refiner));

        let emitted: Vec<f32> = t.sink().iter().map(|u| u.percent).collect();
        assert!(emitted.windows(2).all(|w| w[1] >= w[0]), "{emitted:?}");
    }

    #[test]
    fn steps_past_total_are_capped() {
        let mut t = tracker(4, 0.25);
        assert!(close(t.on_stage_a_step(9), 25.0));
        assert!(close(t.on_stage_b_step(100), 100.0));
    }

    #[test]
    fn walks_the_state_machine() {
        let mut t = tracker(2, 0.5);
        assert_eq!(t.phase(), ProgressPhase::Idle);
        t.begin();
        assert_eq!(t.phase(), ProgressPhase::Running(Stage::Base));
        t.on_stage_a_step(1);
        t.on_stage_b_step(1);
        assert_eq!(t.phase(), ProgressPhase::Running(Stage::Refiner));
        t.on_complete();
        assert_eq!(t.phase(), ProgressPhase::Complete);
        t.reset();
        assert_eq!(t.phase(), ProgressPhase::Idle);
        assert_eq!(t.percent(), 0.0);
    }

    #[test]
    fn new_run_starts_from_zero() {
        let mut t = tracker(10, 0.8);
        t.begin();
        t.on_stage_b_step(10);
        t.on_complete();

        // A callback after completion opens the next run.
        assert!(close(t.on_stage_a_step(5), 40.0));
        assert_eq!(t.phase(), ProgressPhase::Running(Stage::Base));
        let resets = t.sink().iter().filter(|u| u.percent == 0.0).count();
        assert_eq!(resets, 2);
    }

    #[test]
    fn rejects_bad_configuration() {
        assert!(ProgressConfig::new(0, 0.5).is_err());
        assert!(ProgressConfig::new(10, 0.0).is_err());
        assert!(ProgressConfig::new(10, 1.0).is_err());
        assert!(ProgressConfig::new(10, f32::NAN).is_err());
    }

    #[test]
    fn labels_follow_phase() {
        let update = |phase| ProgressUpdate { percent: 0.0, phase };
        assert_eq!(update(ProgressPhase::Idle).label(), None);
        assert_eq!(
            update(ProgressPhase::Running(Stage::Refiner)).label(),
            Some("Refiner")
        );
        assert_eq!(update(ProgressPhase::Complete).label(), Some("Done"));
    }
}
