//! The composable pass chain a dungeon is built through. Each [`Pass`]
//! takes the working [`DungeonState`] and returns an updated one (or an
//! error); [`Pipeline`] runs passes in order, optionally snapshotting the
//! grid after each one and recording a decision trace, and can be
//! cancelled mid-run from another thread via [`CancellationToken`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::artifact::DungeonState;
use crate::error::DungeonError;
use crate::trace::DecisionTrace;

/// One step of the generation pipeline. `id` must be stable and unique
/// within a single [`Pipeline`] run — it's used to label snapshots and
/// trace entries.
pub trait Pass: Send + Sync {
    fn id(&self) -> &'static str;
    fn run(&self, state: DungeonState, ctx: &mut PassContext) -> Result<DungeonState, DungeonError>;
}

/// Per-run context threaded through every pass: a shared decision trace
/// and a cancellation flag checked at each pass boundary.
pub struct PassContext {
    pub trace: DecisionTrace,
    pub cancellation: CancellationToken,
}

impl PassContext {
    pub fn new(cancellation: CancellationToken) -> Self {
        Self {
            trace: DecisionTrace::new(),
            cancellation,
        }
    }
}

/// A cooperative cancel flag, cheaply cloneable and safe to flip from
/// another thread while a pipeline runs.
#[derive(Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// A snapshot of the grid immediately after one pass completed, kept for
/// step-through debugging and visual diffing between passes.
#[derive(Clone, Debug)]
pub struct DungeonSnapshot {
    pub pass_id: &'static str,
    pub terrain: crate::grid::Grid,
}

#[derive(Copy, Clone, Debug, Default)]
pub struct PipelineOptions {
    pub capture_snapshots: bool,
    pub trace: bool,
}

pub struct PipelineReport {
    pub success: bool,
    pub error: Option<DungeonError>,
    pub trace: DecisionTrace,
    pub snapshots: Vec<DungeonSnapshot>,
    pub duration_ms: u128,
}

#[derive(Default)]
pub struct Pipeline {
    passes: Vec<Box<dyn Pass>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_pass(mut self, pass: Box<dyn Pass>) -> Self {
        self.passes.push(pass);
        self
    }

    /// Run every pass in order. Stops immediately on the first pass error
    /// or cancellation request, returning a report that always reflects
    /// whatever work completed (snapshots and trace included) even on
    /// failure.
    pub fn run(
        &self,
        mut state: DungeonState,
        options: PipelineOptions,
        cancellation: CancellationToken,
    ) -> (Option<DungeonState>, PipelineReport) {
        let started = Instant::now();
        let mut ctx = PassContext::new(cancellation);
        let mut snapshots = Vec::new();

        for pass in &self.passes {
            if ctx.cancellation.is_cancelled() {
                tracing::info!(pass = pass.id(), "pipeline cancelled before pass");
                return (
                    None,
                    PipelineReport {
                        success: false,
                        error: Some(DungeonError::GenerationFailed("cancelled".to_string())),
                        trace: ctx.trace,
                        snapshots,
                        duration_ms: started.elapsed().as_millis(),
                    },
                );
            }

            state = match pass.run(state, &mut ctx) {
                Ok(next) => next,
                Err(err) => {
                    tracing::warn!(pass = pass.id(), error = %err, "pass failed");
                    return (
                        None,
                        PipelineReport {
                            success: false,
                            error: Some(err),
                            trace: ctx.trace,
                            snapshots,
                            duration_ms: started.elapsed().as_millis(),
                        },
                    );
                }
            };

            if options.capture_snapshots {
                snapshots.push(DungeonSnapshot {
                    pass_id: pass.id(),
                    terrain: state.terrain.clone(),
                });
            }
        }

        (
            Some(state),
            PipelineReport {
                success: true,
                error: None,
                trace: ctx.trace,
                snapshots,
                duration_ms: started.elapsed().as_millis(),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::DungeonSeed;

    struct AddFloorPass;
    impl Pass for AddFloorPass {
        fn id(&self) -> &'static str {
            "add_floor"
        }
        fn run(&self, mut state: DungeonState, ctx: &mut PassContext) -> Result<DungeonState, DungeonError> {
            state.terrain.set(0, 0, crate::grid::FLOOR);
            ctx.trace.record(crate::trace::DecisionEvent::new(
                "add_floor",
                "carve origin?",
                "yes",
                "test pass",
            ));
            Ok(state)
        }
    }

    struct FailingPass;
    impl Pass for FailingPass {
        fn id(&self) -> &'static str {
            "failing"
        }
        fn run(&self, _state: DungeonState, _ctx: &mut PassContext) -> Result<DungeonState, DungeonError> {
            Err(DungeonError::GenerationFailed("boom".to_string()))
        }
    }

    fn state() -> DungeonState {
        DungeonState::new(20, 20, DungeonSeed::from_primary(1))
    }

    #[test]
    fn successful_pipeline_runs_every_pass() {
        let pipeline = Pipeline::new().add_pass(Box::new(AddFloorPass));
        let (result, report) = pipeline.run(state(), PipelineOptions::default(), CancellationToken::new());
        assert!(report.success);
        assert!(result.unwrap().terrain.is_floor(0, 0));
    }

    #[test]
    fn failing_pass_stops_pipeline() {
        let pipeline = Pipeline::new().add_pass(Box::new(AddFloorPass)).add_pass(Box::new(FailingPass));
        let (result, report) = pipeline.run(state(), PipelineOptions::default(), CancellationToken::new());
        assert!(result.is_none());
        assert!(!report.success);
        assert!(report.error.is_some());
    }

    #[test]
    fn snapshots_captured_when_requested() {
        let pipeline = Pipeline::new().add_pass(Box::new(AddFloorPass));
        let options = PipelineOptions {
            capture_snapshots: true,
            trace: true,
        };
        let (_, report) = pipeline.run(state(), options, CancellationToken::new());
        assert_eq!(report.snapshots.len(), 1);
        assert_eq!(report.trace.events().len(), 1);
    }

    #[test]
    fn cancellation_halts_before_next_pass() {
        let token = CancellationToken::new();
        token.cancel();
        let pipeline = Pipeline::new().add_pass(Box::new(AddFloorPass));
        let (result, report) = pipeline.run(state(), PipelineOptions::default(), token);
        assert!(result.is_none());
        assert!(!report.success);
    }
}
