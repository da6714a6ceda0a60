pub mod error;
pub mod ranker;
pub mod types;

pub use error::{RankError, Result};
pub use ranker::Ranker;
pub use types::{Candidate, RankedCandidate, ScoreBreakdown, Strategy};
