//! Maturity self-assessment core: rubric and catalog data, per-session answers, aggregation,
//! recommendations, charts, and report export.

pub mod aggregate;
pub mod catalog;
pub mod charts;
pub mod recommendation;
pub mod report;
pub mod responses;
pub mod rubric;
pub mod session;
pub mod state;
pub mod summary;

pub use aggregate::{average, domain_averages, format_score, overall_average, DomainAverage};
pub use catalog::{CriterionId, DomainDefinition, Sector};
pub use recommendation::{recommend, RecommendationBand};
pub use rubric::MaturityLevel;
pub use state::{AssessmentState, Completion, ScoreError};
pub use summary::{AssessmentSummary, IncompleteAssessment, RecommendationEntry};
