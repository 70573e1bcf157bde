use crate::infra::{parse_date, parse_sector, InMemorySessionStore};
use chrono::NaiveDate;
use clap::Args;
use maturity_assessment::assessment::catalog::domains_for;
use maturity_assessment::assessment::report::PdfRenderer;
use maturity_assessment::assessment::session::{AssessmentService, ReportRequest};
use maturity_assessment::assessment::{AssessmentSummary, MaturityLevel, Sector};
use maturity_assessment::config::{AppConfig, ReportConfig};
use maturity_assessment::error::AppError;
use maturity_assessment::telemetry;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Args, Debug)]
pub(crate) struct AssessArgs {
    /// Sector under assessment, by label or snake_case name (e.g. "Drinking Water")
    #[arg(long, value_parser = parse_sector)]
    pub(crate) sector: Sector,
    /// CSV of ratings with a `Domain,Criterion,Level` header; criteria are numbered from 1
    #[arg(long)]
    pub(crate) responses: PathBuf,
    /// Organization printed in the report header (defaults to APP_REPORT_ORGANIZATION)
    #[arg(long)]
    pub(crate) organization: Option<String>,
    /// Assessor printed in the report header
    #[arg(long)]
    pub(crate) assessor: Option<String>,
    /// Assessment date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) date: Option<NaiveDate>,
    /// Where to write the PDF report
    #[arg(long, default_value = "maturity_report.pdf")]
    pub(crate) output: PathBuf,
    /// JPEG logo for the report header (defaults to APP_REPORT_LOGO)
    #[arg(long)]
    pub(crate) logo: Option<PathBuf>,
}

pub(crate) fn print_catalog() {
    println!("Maturity scale");
    for level in MaturityLevel::ordered() {
        println!("  {level}");
    }

    println!("\nSectors");
    for sector in Sector::ordered() {
        println!("  - {}", sector.label());
    }

    // Every sector shares the same domain set.
    println!("\nDomains");
    for domain in domains_for(Sector::Energy) {
        println!("  {}", domain.name);
        for (index, criterion) in domain.criteria.iter().enumerate() {
            println!("    {}. {}", index + 1, criterion);
        }
    }
}

pub(crate) fn run_assessment(args: AssessArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let output = args.output.clone();
    let summary = assess_to_file(args, config.report)?;
    for line in summary_lines(&summary) {
        println!("{line}");
    }
    println!("\nReport written to {}", output.display());
    Ok(())
}

/// Scores the responses file in a throwaway session and writes the rendered report.
pub(crate) fn assess_to_file(
    args: AssessArgs,
    mut report_config: ReportConfig,
) -> Result<AssessmentSummary, AppError> {
    let AssessArgs {
        sector,
        responses,
        organization,
        assessor,
        date,
        output,
        logo,
    } = args;

    if logo.is_some() {
        report_config.logo_path = logo;
    }

    let service = AssessmentService::new(
        Arc::new(InMemorySessionStore::default()),
        Arc::new(PdfRenderer),
        report_config,
    );
    let session = service.start(sector)?;
    let session_id = session.session_id;

    let reader = BufReader::new(File::open(&responses)?);
    let view = service.import_responses(&session_id, reader)?;
    info!(
        path = %responses.display(),
        rated = view.completion.rated,
        total = view.completion.total,
        "responses loaded"
    );

    let summary = service.summary(&session_id)?;
    let rendered = service.export(
        &session_id,
        ReportRequest {
            organization,
            assessor,
            date,
        },
    )?;
    fs::write(&output, &rendered.bytes)?;
    service.end(&session_id)?;

    Ok(summary)
}

pub(crate) fn summary_lines(summary: &AssessmentSummary) -> Vec<String> {
    let mut lines = vec![
        format!("Cybersecurity maturity assessment: {}", summary.sector_label),
        format!(
            "Criteria rated: {}/{}",
            summary.completion.rated, summary.completion.total
        ),
        format!("Overall Maturity Score: {} / 5", summary.overall_display),
        String::new(),
        "Domain Recommendations".to_string(),
    ];
    lines.extend(
        summary
            .domains
            .iter()
            .map(|entry| format!("- {}", entry.report_line())),
    );
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn args(responses: &Path, output: &Path) -> AssessArgs {
        AssessArgs {
            sector: Sector::Transport,
            responses: responses.to_path_buf(),
            organization: Some("Harbor Authority".to_string()),
            assessor: Some("J. Rivera".to_string()),
            date: NaiveDate::from_ymd_opt(2025, 4, 30),
            output: output.to_path_buf(),
            logo: None,
        }
    }

    const COMPLETE_RESPONSES: &str = "\
Domain,Criterion,Level
Governance,1,0
Governance,2,1
Governance,3,2
Governance,4,3
Risk Management,1,4
Operational Security,1,3
Operational Security,2,4
Incident Management,1,5
Incident Management,2,
";

    #[test]
    fn writes_the_report_and_returns_the_summary() {
        let dir = tempfile::tempdir().expect("scratch dir");
        let responses = dir.path().join("responses.csv");
        let output = dir.path().join("report.pdf");
        fs::write(&responses, COMPLETE_RESPONSES).unwrap();

        let summary =
            assess_to_file(args(&responses, &output), ReportConfig::default()).expect("assessed");

        assert_eq!(summary.completion.rated, 8);
        assert_eq!(summary.domains[0].average_display, "1.50");
        assert_eq!(
            summary.domains[0].recommendation,
            "High priority for corrective action. Establish basic controls."
        );
        let pdf = fs::read(&output).unwrap();
        assert!(pdf.starts_with(b"%PDF-1.4"));

        let lines = summary_lines(&summary);
        assert_eq!(lines[0], "Cybersecurity maturity assessment: Transport");
        assert_eq!(lines[1], "Criteria rated: 8/16");
        assert_eq!(lines[2], "Overall Maturity Score: 2.75 / 5");
        assert!(lines
            .iter()
            .any(|line| line == "- Incident Management: Maintain and share best practices. (5.00)"));
    }

    #[test]
    fn incomplete_responses_do_not_produce_a_report() {
        let dir = tempfile::tempdir().expect("scratch dir");
        let responses = dir.path().join("responses.csv");
        let output = dir.path().join("report.pdf");
        fs::write(&responses, "Domain,Criterion,Level\nGovernance,1,3\n").unwrap();

        let err = assess_to_file(args(&responses, &output), ReportConfig::default())
            .expect_err("incomplete");
        assert!(err.to_string().contains("complete the assessment first"));
        assert!(!output.exists());
    }

    #[test]
    fn invalid_levels_are_reported_with_their_line() {
        let dir = tempfile::tempdir().expect("scratch dir");
        let responses = dir.path().join("responses.csv");
        let output = dir.path().join("report.pdf");
        fs::write(&responses, "Domain,Criterion,Level\nGovernance,1,3\nGovernance,2,7\n").unwrap();

        let err = assess_to_file(args(&responses, &output), ReportConfig::default())
            .expect_err("rejected");
        assert!(err.to_string().contains("line 3"), "{err}");
    }

    #[test]
    fn missing_responses_file_is_an_io_error() {
        let dir = tempfile::tempdir().expect("scratch dir");
        let err = assess_to_file(
            args(&dir.path().join("absent.csv"), &dir.path().join("report.pdf")),
            ReportConfig::default(),
        )
        .expect_err("missing file");
        assert!(matches!(err, AppError::Io(_)));
    }
}
