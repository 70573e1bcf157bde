use super::super::summary::RecommendationEntry;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct RecommendationRow<'a> {
    #[serde(rename = "Domain")]
    domain: &'a str,
    #[serde(rename = "Avg Score")]
    average: &'a str,
    #[serde(rename = "Recommendation")]
    recommendation: &'a str,
}

/// Writes the recommendations table as CSV using the same two-decimal averages as the report.
pub fn write_recommendations_csv<W: Write>(
    entries: &[RecommendationEntry],
    writer: W,
) -> Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for entry in entries {
        csv_writer.serialize(RecommendationRow {
            domain: entry.domain,
            average: &entry.average_display,
            recommendation: entry.recommendation,
        })?;
    }
    csv_writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::super::aggregate::DomainAverage;
    use super::*;

    #[test]
    fn writes_header_and_rows() {
        let entries: Vec<RecommendationEntry> = [("Governance", 3.25), ("Risk Management", 5.0)]
            .into_iter()
            .map(|(domain, average)| {
                RecommendationEntry::from(&DomainAverage {
                    domain,
                    average,
                    rated: 4,
                })
            })
            .collect();

        let mut buffer = Vec::new();
        write_recommendations_csv(&entries, &mut buffer).expect("csv written");
        let text = String::from_utf8(buffer).expect("utf8");

        assert_eq!(
            text,
            "Domain,Avg Score,Recommendation\n\
             Governance,3.25,Develop structured monitoring and review.\n\
             Risk Management,5.00,Maintain and share best practices.\n"
        );
    }
}
