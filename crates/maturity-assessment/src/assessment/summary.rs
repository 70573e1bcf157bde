use super::aggregate::{domain_averages, format_score, overall_average, DomainAverage};
use super::catalog::Sector;
use super::recommendation::RecommendationBand;
use super::state::{AssessmentState, Completion};
use serde::Serialize;

/// Domain row shared by the summary view, the recommendations table, and the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationEntry {
    pub domain: &'static str,
    pub average: f64,
    pub average_display: String,
    pub band: RecommendationBand,
    pub band_label: &'static str,
    pub recommendation: &'static str,
}

impl From<&DomainAverage> for RecommendationEntry {
    fn from(value: &DomainAverage) -> Self {
        let band = value.band();
        Self {
            domain: value.domain,
            average: value.average,
            average_display: format_score(value.average),
            band,
            band_label: band.label(),
            recommendation: band.recommendation(),
        }
    }
}

impl RecommendationEntry {
    /// `Domain: Recommendation (x.xx)` as printed in the exported report.
    pub fn report_line(&self) -> String {
        format!(
            "{}: {} ({})",
            self.domain, self.recommendation, self.average_display
        )
    }
}

/// One heatmap row: the domain's ratings in criterion order, `None` where unrated.
#[derive(Debug, Clone, Serialize)]
pub struct HeatmapRow {
    pub domain: &'static str,
    pub scores: Vec<Option<u8>>,
}

pub fn heatmap_rows(state: &AssessmentState) -> Vec<HeatmapRow> {
    state
        .domains()
        .iter()
        .map(|scores| HeatmapRow {
            domain: scores.name(),
            scores: scores
                .slots()
                .iter()
                .map(|slot| slot.map(|level| level.value()))
                .collect(),
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct AssessmentSummary {
    pub sector: Sector,
    pub sector_label: &'static str,
    pub overall_average: f64,
    pub overall_display: String,
    pub completion: Completion,
    pub domains: Vec<RecommendationEntry>,
    pub heatmap: Vec<HeatmapRow>,
}

impl AssessmentSummary {
    /// Summarizes a state once every domain has at least one rating.
    pub fn from_state(state: &AssessmentState) -> Result<Self, IncompleteAssessment> {
        Self::from_aggregates(state, &domain_averages(state), overall_average(state))
    }

    /// Builds the view from averages computed by the caller, so an export can reuse them.
    pub fn from_aggregates(
        state: &AssessmentState,
        averages: &[DomainAverage],
        overall: f64,
    ) -> Result<Self, IncompleteAssessment> {
        let completion = state.completion();
        if !completion.is_reportable() {
            return Err(IncompleteAssessment {
                unscored_domains: completion.unscored_domains,
            });
        }

        Ok(Self {
            sector: state.sector(),
            sector_label: state.sector().label(),
            overall_average: overall,
            overall_display: format_score(overall),
            completion,
            domains: averages.iter().map(RecommendationEntry::from).collect(),
            heatmap: heatmap_rows(state),
        })
    }
}

/// Raised when a summary or report is requested before every domain has been rated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("complete the assessment first: {}", describe_unscored(.unscored_domains))]
pub struct IncompleteAssessment {
    pub unscored_domains: Vec<&'static str>,
}

fn describe_unscored(domains: &[&'static str]) -> String {
    if domains.is_empty() {
        "no scores recorded".to_string()
    } else {
        format!("no scores for {}", domains.join(", "))
    }
}
