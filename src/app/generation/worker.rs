// SPDX-License-Identifier: GPL-3.0-or-later
// src/app/generation/worker.rs
//
// Runs one generation on a blocking thread and queues its updates for the display tick.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::oneshot::{self, error::TryRecvError};

use super::service::{GenerationRequest, ImageGenerator};
use crate::domain::image::DisplayableImage;
use crate::domain::progress::{
    GenerationProgressTracker, ProgressConfig, ProgressSink, ProgressUpdate, Stage,
};
use crate::error::{Error, GenerationError, Result};

/// Something the display context learns from a running generation.
#[derive(Debug)]
pub enum WorkerUpdate {
    Progress(ProgressUpdate),
    Finished(std::result::Result<DisplayableImage, GenerationError>),
}

/// Progress sink that never waits on the receiver.
///
/// A full queue drops the update; the next one supersedes it and the
/// terminal result always arrives on its own channel.
pub struct ChannelSink {
    tx: mpsc::Sender<ProgressUpdate>,
    dropped: u64,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<ProgressUpdate>) -> Self {
        Self { tx, dropped: 0 }
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl ProgressSink for ChannelSink {
    fn emit(&mut self, update: ProgressUpdate) {
        match self.tx.try_send(update) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => self.dropped += 1,
            // Display went away; keep generating.
            Err(TrySendError::Closed(_)) => {}
        }
    }
}

/// Dispatches generation requests to the injected backend.
pub struct GenerationWorker {
    generator: Arc<dyn ImageGenerator>,
    runtime: Handle,
    queue_capacity: usize,
}

impl GenerationWorker {
    pub fn new(generator: Arc<dyn ImageGenerator>, runtime: Handle, queue_capacity: usize) -> Self {
        Self {
            generator,
            runtime,
            queue_capacity: queue_capacity.max(1),
        }
    }

    /// Start `request` on a blocking thread and return the display-side handle.
    pub fn spawn(&self, request: GenerationRequest) -> Result<GenerationHandle> {
        let config = ProgressConfig::new(request.total_steps, request.split_fraction)?;
        request.validate().map_err(Error::from)?;

        let (progress_tx, progress_rx) = mpsc::channel(self.queue_capacity);
        let (result_tx, result_rx) = oneshot::channel();
        let generator = Arc::clone(&self.generator);

        log::info!(
            "Generating with {} ({} steps, split {:.2})",
            generator.name(),
            request.total_steps,
            request.split_fraction
        );

        self.runtime.spawn_blocking(move || {
            let mut tracker = GenerationProgressTracker::new(config, ChannelSink::new(progress_tx));
            tracker.begin();

            let result = {
                let mut report = |stage: Stage, step: u32| match stage {
                    Stage::Base => {
                        tracker.on_stage_a_step(step);
                    }
                    Stage::Refiner => {
                        tracker.on_stage_b_step(step);
                    }
                };
                generator.generate(&request, &mut report)
            };

            match &result {
                Ok(_) => {
                    tracker.on_complete();
                }
                Err(e) => log::error!("Generation failed: {e}"),
            }

            let dropped = tracker.sink().dropped();
            if dropped > 0 {
                log::debug!("Dropped {dropped} progress updates on a full queue");
            }

            // The receiver is gone only if the session was torn down.
            let _ = result_tx.send(result);
        });

        Ok(GenerationHandle {
            progress_rx,
            result_rx,
            finished: false,
        })
    }
}

/// Display-side end of one generation run.
pub struct GenerationHandle {
    progress_rx: mpsc::Receiver<ProgressUpdate>,
    result_rx: oneshot::Receiver<std::result::Result<DisplayableImage, GenerationError>>,
    finished: bool,
}

impl GenerationHandle {
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Collect everything queued since the last tick. Never blocks.
    pub fn drain(&mut self) -> Vec<WorkerUpdate> {
        let mut updates = Vec::new();
        if self.finished {
            return updates;
        }

        self.drain_progress(&mut updates);

        let finished = match self.result_rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => Some(Err(GenerationError::WorkerLost)),
        };

        if let Some(result) = finished {
            self.drain_progress(&mut updates);
            updates.push(WorkerUpdate::Finished(result));
            self.finished = true;
        }
        updates
    }

    fn drain_progress(&mut self, updates: &mut Vec<WorkerUpdate>) {
        while let Ok(update) = self.progress_rx.try_recv() {
            updates.push(WorkerUpdate::Progress(update));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::progress::ProgressPhase;
    use image::{DynamicImage, RgbImage};
    use std::time::Duration;

    struct FlatGenerator;

    impl ImageGenerator for FlatGenerator {
        fn name(&self) -> &str {
            "flat"
        }

        fn generate(
            &self,
            request: &GenerationRequest,
            progress: &mut dyn FnMut(Stage, u32),
        ) -> std::result::Result<DisplayableImage, GenerationError> {
            for step in 1..=request.total_steps {
                progress(Stage::Base, step);
            }
            // Off by one: the refiner never reports its last step.
            for step in 1..request.total_steps {
                progress(Stage::Refiner, step);
            }
            Ok(DynamicImage::ImageRgb8(RgbImage::new(request.width, request.height)).into())
        }
    }

    struct BrokenGenerator;

    impl ImageGenerator for BrokenGenerator {
        fn name(&self) -> &str {
            "broken"
        }

        fn generate(
            &self,
            _request: &GenerationRequest,
            progress: &mut dyn FnMut(Stage, u32),
        ) -> std::result::Result<DisplayableImage, GenerationError> {
            progress(Stage::Base, 1);
            Err(GenerationError::Backend("out of memory".into()))
        }
    }

    struct PanickingGenerator;

    impl ImageGenerator for PanickingGenerator {
        fn name(&self) -> &str {
            "panicking"
        }

        fn generate(
            &self,
            _request: &GenerationRequest,
            _progress: &mut dyn FnMut(Stage, u32),
        ) -> std::result::Result<DisplayableImage, GenerationError> {
            panic!("backend crashed");
        }
    }

    fn request() -> GenerationRequest {
        GenerationRequest {
            prompt: "still life".into(),
            reference: None,
            total_steps: 40,
            split_fraction: 0.8,
            reference_strength: None,
            guidance_scale: 7.5,
            width: 16,
            height: 8,
        }
    }

    async fn finish(handle: &mut GenerationHandle) -> Vec<WorkerUpdate> {
        let mut all = Vec::new();
        for _ in 0..500 {
            all.extend(handle.drain());
            if handle.is_finished() {
                return all;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("generation did not finish");
    }

    fn percents(updates: &[WorkerUpdate]) -> Vec<f32> {
        updates
            .iter()
            .filter_map(|u| match u {
                WorkerUpdate::Progress(p) => Some(p.percent),
                WorkerUpdate::Finished(_) => None,
            })
            .collect()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn completion_reaches_one_hundred() {
        let worker = GenerationWorker::new(Arc::new(FlatGenerator), Handle::current(), 256);
        let mut handle = worker.spawn(request()).unwrap();
        let updates = finish(&mut handle).await;

        let percents = percents(&updates);
        assert!(percents.windows(2).all(|w| w[1] >= w[0]), "{percents:?}");
        assert!(percents.iter().any(|p| (p - 97.5).abs() < 1e-3));
        assert_eq!(percents.last(), Some(&100.0));

        match updates.last() {
            Some(WorkerUpdate::Finished(Ok(img))) => assert_eq!(img.dimensions(), (16, 8)),
            other => panic!("unexpected {other:?}"),
        }
        assert!(handle.drain().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn small_queue_never_blocks_the_producer() {
        let worker = GenerationWorker::new(Arc::new(FlatGenerator), Handle::current(), 1);
        let mut handle = worker.spawn(request()).unwrap();

        // Nobody drains while the run goes on; it must still finish.
        tokio::time::sleep(Duration::from_millis(50)).await;
        let updates = finish(&mut handle).await;
        assert!(matches!(updates.last(), Some(WorkerUpdate::Finished(Ok(_)))));
        assert!(percents(&updates).len() <= 2);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn failure_is_reported_without_completion() {
        let worker = GenerationWorker::new(Arc::new(BrokenGenerator), Handle::current(), 16);
        let mut handle = worker.spawn(request()).unwrap();
        let updates = finish(&mut handle).await;

        assert!(!percents(&updates).contains(&100.0));
        assert!(matches!(
            updates.last(),
            Some(WorkerUpdate::Finished(Err(GenerationError::Backend(_))))
        ));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn panicking_backend_is_reported_as_lost() {
        let worker = GenerationWorker::new(Arc::new(PanickingGenerator), Handle::current(), 16);
        let mut handle = worker.spawn(request()).unwrap();
        let updates = finish(&mut handle).await;

        assert!(matches!(
            updates.last(),
            Some(WorkerUpdate::Finished(Err(GenerationError::WorkerLost)))
        ));
    }

    #[tokio::test]
    async fn invalid_request_is_rejected_up_front() {
        let worker = GenerationWorker::new(Arc::new(FlatGenerator), Handle::current(), 16);
        let mut bad = request();
        bad.split_fraction = 0.0;
        assert!(matches!(worker.spawn(bad), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn channel_sink_drops_when_full() {
        let (tx, mut rx) = mpsc::channel(1);
        let mut sink = ChannelSink::new(tx);
        let update = |percent| ProgressUpdate {
            percent,
            phase: ProgressPhase::Running(Stage::Base),
        };
        sink.emit(update(1.0));
        sink.emit(update(2.0));
        sink.emit(update(3.0));

        assert_eq!(sink.dropped(), 2);
        assert_eq!(rx.try_recv().map(|u| u.percent), Ok(1.0));
    }
}
