//! Generation-and-reuse engine.
//!
//! Turns a `GenerationRequest` into a stored video, reusing an earlier
//! video for clinically identical cases and running at most one
//! generation per case key at a time.
//!
//! - `case_key`: deterministic reuse key
//! - `reuse`: cached-vs-generate decision
//! - `render_driver`: submit, bounded poll, download
//! - `lock`: per-key single-flight locks
//! - `coordinator`: ties the above to the collaborators in `traits`

pub mod case_key;
pub mod clock;
pub mod coordinator;
pub mod error;
pub mod lock;
pub mod render_driver;
pub mod reuse;
pub mod traits;

#[cfg(test)]
pub(crate) mod test_support;

pub use clock::{Clock, ManualClock, TokioClock};
pub use coordinator::{GenerationCoordinator, GenerationOutcome, OutcomeSource};
pub use error::{ContextError, GenerationError, RenderProviderError, StorageError, SynthesisError};
pub use lock::{GenerationGuard, GenerationLocks, InFlightGeneration};
pub use render_driver::{PollPolicy, RenderJobDriver};
pub use reuse::ReuseResolver;
pub use traits::{ArtifactStore, ContextProvider, RenderProvider, ScriptSynthesizer};
