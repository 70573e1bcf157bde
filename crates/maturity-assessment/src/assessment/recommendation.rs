use serde::Serialize;

/// Score ranges mapped to fixed advisory text, most urgent first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationBand {
    CorrectiveAction,
    Formalize,
    Monitor,
    Optimize,
    Sustain,
}

impl RecommendationBand {
    /// First band whose upper bound exceeds the score. NaN lands in the most urgent band.
    pub fn for_score(score: f64) -> Self {
        if score.is_nan() || score < 2.0 {
            Self::CorrectiveAction
        } else if score < 3.0 {
            Self::Formalize
        } else if score < 4.0 {
            Self::Monitor
        } else if score < 5.0 {
            Self::Optimize
        } else {
            Self::Sustain
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::CorrectiveAction => "Corrective Action",
            Self::Formalize => "Formalize",
            Self::Monitor => "Monitor",
            Self::Optimize => "Optimize",
            Self::Sustain => "Sustain",
        }
    }

    pub const fn recommendation(self) -> &'static str {
        match self {
            Self::CorrectiveAction => {
                "High priority for corrective action. Establish basic controls."
            }
            Self::Formalize => "Moderate risk. Document and formalize processes.",
            Self::Monitor => "Develop structured monitoring and review.",
            Self::Optimize => "Consider optimization and automation.",
            Self::Sustain => "Maintain and share best practices.",
        }
    }
}

pub fn recommend(score: f64) -> &'static str {
    RecommendationBand::for_score(score).recommendation()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_boundaries_are_exclusive_upper_bounds() {
        assert_eq!(
            recommend(1.9),
            "High priority for corrective action. Establish basic controls."
        );
        assert_eq!(recommend(2.0), "Moderate risk. Document and formalize processes.");
        assert_eq!(recommend(3.0), "Develop structured monitoring and review.");
        assert_eq!(recommend(4.0), "Consider optimization and automation.");
        assert_eq!(recommend(5.0), "Maintain and share best practices.");
    }

    #[test]
    fn out_of_range_scores_fall_into_the_nearest_band() {
        assert_eq!(RecommendationBand::for_score(-3.0), RecommendationBand::CorrectiveAction);
        assert_eq!(RecommendationBand::for_score(9.5), RecommendationBand::Sustain);
        assert_eq!(
            RecommendationBand::for_score(f64::NAN),
            RecommendationBand::CorrectiveAction
        );
    }

    #[test]
    fn urgency_never_increases_with_score() {
        let mut previous = RecommendationBand::for_score(0.0);
        for step in 0..=60 {
            let band = RecommendationBand::for_score(step as f64 / 10.0);
            assert!(band >= previous, "band regressed at {}", step as f64 / 10.0);
            previous = band;
        }
    }
}
