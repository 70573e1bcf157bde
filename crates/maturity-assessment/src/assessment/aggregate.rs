use super::recommendation::RecommendationBand;
use super::state::AssessmentState;
use serde::Serialize;

/// Mean of a possibly-empty set of ratings. Empty input has no average.
pub fn average(scores: &[u8]) -> Option<f64> {
    if scores.is_empty() {
        return None;
    }
    let total: u32 = scores.iter().map(|&score| u32::from(score)).sum();
    Some(f64::from(total) / scores.len() as f64)
}

/// Average for one domain, carried verbatim into summaries and reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainAverage {
    pub domain: &'static str,
    pub average: f64,
    pub rated: usize,
}

impl DomainAverage {
    pub fn band(&self) -> RecommendationBand {
        RecommendationBand::for_score(self.average)
    }

    pub fn recommendation(&self) -> &'static str {
        self.band().recommendation()
    }
}

/// Per-domain averages in catalog order. Domains without any rating are omitted.
pub fn domain_averages(state: &AssessmentState) -> Vec<DomainAverage> {
    state
        .domains()
        .iter()
        .filter_map(|scores| {
            let recorded = scores.recorded();
            average(&recorded).map(|average| DomainAverage {
                domain: scores.name(),
                average,
                rated: recorded.len(),
            })
        })
        .collect()
}

/// Mean over every recorded rating across domains; 0 when nothing has been rated.
pub fn overall_average(state: &AssessmentState) -> f64 {
    let all: Vec<u8> = state
        .domains()
        .iter()
        .flat_map(|scores| scores.recorded())
        .collect();
    average(&all).unwrap_or(0.0)
}

/// Two-decimal rendering shared by the summary view and the exported report.
pub fn format_score(score: f64) -> String {
    format!("{score:.2}")
}
