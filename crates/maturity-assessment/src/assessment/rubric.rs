use serde::{Deserialize, Serialize};
use std::fmt;

/// Capability-maturity rating applied to every criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub enum MaturityLevel {
    NonExistent = 0,
    AdHoc = 1,
    Repeatable = 2,
    Defined = 3,
    Managed = 4,
    Optimized = 5,
}

impl MaturityLevel {
    pub const MIN: u8 = 0;
    pub const MAX: u8 = 5;

    pub const fn ordered() -> [Self; 6] {
        [
            Self::NonExistent,
            Self::AdHoc,
            Self::Repeatable,
            Self::Defined,
            Self::Managed,
            Self::Optimized,
        ]
    }

    pub const fn value(self) -> u8 {
        self as u8
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::NonExistent => "Non-existent",
            Self::AdHoc => "Ad hoc",
            Self::Repeatable => "Repeatable",
            Self::Defined => "Defined",
            Self::Managed => "Managed",
            Self::Optimized => "Optimized",
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::NonExistent => "No recognized practices.",
            Self::AdHoc => "Processes are informal and undocumented.",
            Self::Repeatable => "Some practices are established but inconsistently applied.",
            Self::Defined => "Practices are documented and communicated.",
            Self::Managed => "Practices are monitored, measured and improved.",
            Self::Optimized => "Best practices are followed and continuously improved.",
        }
    }
}

impl TryFrom<i64> for MaturityLevel {
    type Error = LevelOutOfRange;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::NonExistent),
            1 => Ok(Self::AdHoc),
            2 => Ok(Self::Repeatable),
            3 => Ok(Self::Defined),
            4 => Ok(Self::Managed),
            5 => Ok(Self::Optimized),
            other => Err(LevelOutOfRange(other)),
        }
    }
}

impl From<MaturityLevel> for u8 {
    fn from(level: MaturityLevel) -> Self {
        level.value()
    }
}

impl fmt::Display for MaturityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}: {}", self.value(), self.label(), self.description())
    }
}

/// Raised when a rating falls outside the 0-5 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("maturity level {0} is outside the 0-5 scale")]
pub struct LevelOutOfRange(pub i64);

/// Serializable row describing one rung of the scale.
#[derive(Debug, Clone, Serialize)]
pub struct MaturityLevelView {
    pub level: u8,
    pub label: &'static str,
    pub description: &'static str,
}

impl From<MaturityLevel> for MaturityLevelView {
    fn from(level: MaturityLevel) -> Self {
        Self {
            level: level.value(),
            label: level.label(),
            description: level.description(),
        }
    }
}

pub fn scale() -> Vec<MaturityLevelView> {
    MaturityLevel::ordered()
        .into_iter()
        .map(MaturityLevelView::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_every_level_on_the_scale() {
        for (expected, level) in MaturityLevel::ordered().into_iter().enumerate() {
            let parsed = MaturityLevel::try_from(expected as i64).expect("level on scale");
            assert_eq!(parsed, level);
            assert_eq!(level.value() as usize, expected);
        }
    }

    #[test]
    fn rejects_levels_off_the_scale() {
        assert_eq!(MaturityLevel::try_from(6), Err(LevelOutOfRange(6)));
        assert_eq!(MaturityLevel::try_from(-1), Err(LevelOutOfRange(-1)));
    }

    #[test]
    fn deserializes_from_plain_integers() {
        let level: MaturityLevel = serde_json::from_str("3").expect("valid level");
        assert_eq!(level, MaturityLevel::Defined);
        assert!(serde_json::from_str::<MaturityLevel>("7").is_err());
        assert_eq!(serde_json::to_string(&MaturityLevel::Managed).unwrap(), "4");
    }

    #[test]
    fn display_matches_selector_format() {
        assert_eq!(
            MaturityLevel::AdHoc.to_string(),
            "1 - Ad hoc: Processes are informal and undocumented."
        );
    }
}
