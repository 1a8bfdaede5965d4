//! Composite quality score (0-10) over seven weighted dimensions.
//!
//! Scoring is a pure function of the rubric and the wave table. A dimension
//! whose source agent is missing, failed, or refused its input contributes
//! zero: a degraded pipeline lowers the score and pushes tasks to review.

mod dimension;
mod rubric;

pub use dimension::{Dimension, DimensionSource};
pub use rubric::{CompositeScore, DimensionScore, MAX_SCORE, ScoringRubric};
