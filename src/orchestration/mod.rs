/*!
 * Bounded retry orchestration.
 *
 * - `state`: Stages, phases and the per-pair retry record
 * - `store`: The claim/report protocol over shared retry state
 * - `policy`: Attempt parameters chosen from the attempt number
 * - `orchestrator`: Runs translate and align attempts for a chapter
 * - `worker`: Concurrent processing of chapter jobs
 * - `stats`: Explicit, mergeable usage statistics
 * - `cancellation`: Cooperative cancellation between provider calls
 */

pub mod cancellation;
pub mod orchestrator;
pub mod policy;
pub mod state;
pub mod stats;
pub mod store;
pub mod worker;

pub use cancellation::CancellationFlag;
pub use orchestrator::{ChapterOrchestrator, RunOutcome, StageRun};
pub use policy::{AttemptParams, RetryConfig, RetryPolicy};
pub use state::{
    AlignmentShortfall, AttemptHandle, AttemptOutcome, AttemptPhase, ConservationFailure, FailureReason, RetryState, Stage,
    Transition,
};
pub use stats::UsageStats;
pub use store::RetryStore;
pub use worker::{Job, PoolReport, WorkerPool};
