use super::catalog::{domains_for, CriterionId, DomainDefinition, Sector};
use super::rubric::{LevelOutOfRange, MaturityLevel};
use serde::Serialize;

/// Ratings recorded for one domain, one slot per criterion in catalog order.
#[derive(Debug, Clone)]
pub struct DomainScores {
    pub definition: &'static DomainDefinition,
    slots: Vec<Option<MaturityLevel>>,
}

impl DomainScores {
    fn empty(definition: &'static DomainDefinition) -> Self {
        Self {
            definition,
            slots: vec![None; definition.criteria.len()],
        }
    }

    pub fn name(&self) -> &'static str {
        self.definition.name
    }

    pub fn slots(&self) -> &[Option<MaturityLevel>] {
        &self.slots
    }

    /// Recorded ratings in criterion order, skipping unrated criteria.
    pub fn recorded(&self) -> Vec<u8> {
        self.slots
            .iter()
            .flatten()
            .map(|level| level.value())
            .collect()
    }

    pub fn rated_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }
}

/// In-memory answers for one session and one sector.
#[derive(Debug, Clone)]
pub struct AssessmentState {
    sector: Sector,
    domains: Vec<DomainScores>,
}

impl AssessmentState {
    pub fn new(sector: Sector) -> Self {
        Self {
            sector,
            domains: domains_for(sector)
                .iter()
                .map(DomainScores::empty)
                .collect(),
        }
    }

    pub fn sector(&self) -> Sector {
        self.sector
    }

    pub fn domains(&self) -> &[DomainScores] {
        &self.domains
    }

    pub fn domain(&self, name: &str) -> Option<&DomainScores> {
        self.domains
            .iter()
            .find(|scores| scores.name().eq_ignore_ascii_case(name.trim()))
    }

    /// Switching sector discards every rating recorded so far.
    pub fn reset_for_sector(&mut self, sector: Sector) {
        *self = Self::new(sector);
    }

    /// Records a rating after validating the level and the criterion key.
    ///
    /// A rejected call leaves the state untouched.
    pub fn set_score(
        &mut self,
        domain: &str,
        criterion_index: usize,
        level: i64,
    ) -> Result<CriterionId, ScoreError> {
        let level = MaturityLevel::try_from(level)?;
        let slot = self.slot_mut(domain, criterion_index)?;
        *slot.1 = Some(level);
        Ok(slot.0)
    }

    pub fn clear_score(
        &mut self,
        domain: &str,
        criterion_index: usize,
    ) -> Result<CriterionId, ScoreError> {
        let slot = self.slot_mut(domain, criterion_index)?;
        *slot.1 = None;
        Ok(slot.0)
    }

    pub fn score(&self, id: &CriterionId) -> Option<MaturityLevel> {
        self.domain(&id.domain)
            .and_then(|scores| scores.slots.get(id.index).copied().flatten())
    }

    pub fn has_scores(&self) -> bool {
        self.domains.iter().any(|scores| scores.rated_count() > 0)
    }

    pub fn completion(&self) -> Completion {
        let total = self
            .domains
            .iter()
            .map(|scores| scores.slots.len())
            .sum();
        let rated = self.domains.iter().map(DomainScores::rated_count).sum();
        let unscored_domains = self
            .domains
            .iter()
            .filter(|scores| scores.rated_count() == 0)
            .map(DomainScores::name)
            .collect();

        Completion {
            rated,
            total,
            unscored_domains,
        }
    }

    fn slot_mut(
        &mut self,
        domain: &str,
        criterion_index: usize,
    ) -> Result<(CriterionId, &mut Option<MaturityLevel>), ScoreError> {
        let scores = self
            .domains
            .iter_mut()
            .find(|scores| scores.name().eq_ignore_ascii_case(domain.trim()))
            .ok_or_else(|| ScoreError::UnknownDomain(domain.trim().to_string()))?;

        let criteria = scores.slots.len();
        let name = scores.name();
        let slot = scores
            .slots
            .get_mut(criterion_index)
            .ok_or_else(|| ScoreError::CriterionOutOfRange {
                domain: name.to_string(),
                index: criterion_index,
                criteria,
            })?;

        Ok((CriterionId::new(name, criterion_index), slot))
    }
}

/// Progress through the questionnaire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Completion {
    pub rated: usize,
    pub total: usize,
    pub unscored_domains: Vec<&'static str>,
}

impl Completion {
    pub fn is_complete(&self) -> bool {
        self.rated == self.total
    }

    /// Every domain carries at least one rating, which is what aggregation requires.
    pub fn is_reportable(&self) -> bool {
        self.unscored_domains.is_empty()
    }
}

/// Validation failure while recording a rating.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScoreError {
    #[error(transparent)]
    Level(#[from] LevelOutOfRange),
    #[error("unknown domain '{0}'")]
    UnknownDomain(String),
    #[error("criterion {index} is out of range for '{domain}' ({criteria} criteria)")]
    CriterionOutOfRange {
        domain: String,
        index: usize,
        criteria: usize,
    },
}
