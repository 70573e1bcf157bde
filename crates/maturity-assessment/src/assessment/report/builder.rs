use super::super::aggregate::{format_score, DomainAverage};
use super::super::charts::ChartImage;
use super::super::summary::{IncompleteAssessment, RecommendationEntry};
use super::branding::Logo;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const REPORT_TITLE: &str = "Cybersecurity Maturity Report";

/// User-supplied header fields. Unrelated to scoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub organization: String,
    pub assessor: String,
    pub date: NaiveDate,
}

/// Everything the renderer needs, assembled once per export.
#[derive(Debug, Clone)]
pub struct Report {
    pub title: &'static str,
    pub metadata: ReportMetadata,
    pub overall_average: f64,
    pub recommendations: Vec<RecommendationEntry>,
    pub charts: Vec<ChartImage>,
    pub logo: Option<Logo>,
}

impl Report {
    pub fn with_logo(mut self, logo: Option<Logo>) -> Self {
        self.logo = logo;
        self
    }

    pub fn header_lines(&self) -> [String; 3] {
        [
            format!("Organization: {}", self.metadata.organization),
            format!("Assessor: {}", self.metadata.assessor),
            format!("Date: {}", self.metadata.date.format("%Y-%m-%d")),
        ]
    }

    pub fn overall_line(&self) -> String {
        format!(
            "Overall Maturity Score: {} / 5",
            format_score(self.overall_average)
        )
    }

    pub fn recommendation_lines(&self) -> Vec<String> {
        self.recommendations
            .iter()
            .map(RecommendationEntry::report_line)
            .collect()
    }
}

/// Packages aggregator output for export without recomputing any average.
pub fn build_report(
    metadata: ReportMetadata,
    averages: &[DomainAverage],
    overall_average: f64,
    charts: Vec<ChartImage>,
) -> Result<Report, ReportError> {
    if averages.is_empty() {
        return Err(ReportError::Incomplete(IncompleteAssessment {
            unscored_domains: Vec::new(),
        }));
    }

    Ok(Report {
        title: REPORT_TITLE,
        metadata,
        overall_average,
        recommendations: averages.iter().map(RecommendationEntry::from).collect(),
        charts,
        logo: None,
    })
}

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error(transparent)]
    Incomplete(#[from] IncompleteAssessment),
    #[error(transparent)]
    Render(#[from] super::pdf::RenderError),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> ReportMetadata {
        ReportMetadata {
            organization: "Tools of Tech P.C.".to_string(),
            assessor: "R. Analyst".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 3, 14).expect("valid date"),
        }
    }

    #[test]
    fn refuses_to_build_without_averages() {
        let err = build_report(metadata(), &[], 0.0, Vec::new()).expect_err("no data");
        assert!(matches!(err, ReportError::Incomplete(_)));
    }

    #[test]
    fn carries_averages_through_unchanged() {
        let averages = vec![DomainAverage {
            domain: "Risk Management",
            average: 2.0 / 3.0 + 2.0,
            rated: 3,
        }];
        let report = build_report(metadata(), &averages, 2.25, Vec::new()).expect("report");

        assert_eq!(report.recommendations[0].average, averages[0].average);
        assert_eq!(
            report.recommendation_lines(),
            vec!["Risk Management: Moderate risk. Document and formalize processes. (2.67)"]
        );
        assert_eq!(report.overall_line(), "Overall Maturity Score: 2.25 / 5");
        assert_eq!(report.header_lines()[2], "Date: 2025-03-14");
    }
}
