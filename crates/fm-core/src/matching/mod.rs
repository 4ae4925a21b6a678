pub mod categories;
pub mod keywords;
pub mod pipeline;
pub mod rank;
pub mod requirement;
pub mod scoring;

pub use pipeline::{MatchConfig, MatchingPipeline, PipelineError};
pub use requirement::{CanonicalRequirement, RequirementHint, normalize};
pub use scoring::{GigCandidate, MatchPolicy, Scorer};
