use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Industry category an assessment is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sector {
    Energy,
    Transport,
    Banking,
    FinancialMarketInfrastructure,
    Health,
    DrinkingWater,
    WasteWater,
    DigitalInfrastructure,
    IctServiceManagement,
    PublicAdministration,
    Space,
}

impl Sector {
    pub const fn ordered() -> [Self; 11] {
        [
            Self::Energy,
            Self::Transport,
            Self::Banking,
            Self::FinancialMarketInfrastructure,
            Self::Health,
            Self::DrinkingWater,
            Self::WasteWater,
            Self::DigitalInfrastructure,
            Self::IctServiceManagement,
            Self::PublicAdministration,
            Self::Space,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Energy => "Energy",
            Self::Transport => "Transport",
            Self::Banking => "Banking",
            Self::FinancialMarketInfrastructure => "Financial Market Infrastructure",
            Self::Health => "Health",
            Self::DrinkingWater => "Drinking Water",
            Self::WasteWater => "Waste Water",
            Self::DigitalInfrastructure => "Digital Infrastructure",
            Self::IctServiceManagement => "ICT Service Management",
            Self::PublicAdministration => "Public Administration",
            Self::Space => "Space",
        }
    }
}

impl fmt::Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Sector {
    type Err = UnknownSector;

    /// Accepts either the display label or the snake_case identifier, case-insensitively.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let wanted = normalize(raw);
        Self::ordered()
            .into_iter()
            .find(|sector| normalize(sector.label()) == wanted)
            .ok_or_else(|| UnknownSector(raw.trim().to_string()))
    }
}

fn normalize(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown sector '{0}'")]
pub struct UnknownSector(pub String);

/// Named group of ordered criterion statements.
#[derive(Debug)]
pub struct DomainDefinition {
    pub name: &'static str,
    pub criteria: &'static [&'static str],
}

impl DomainDefinition {
    pub fn criterion(&self, index: usize) -> Option<&'static str> {
        self.criteria.get(index).copied()
    }
}

/// Stable key for one criterion: the domain name plus its position within the domain.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CriterionId {
    pub domain: String,
    pub index: usize,
}

impl CriterionId {
    pub fn new(domain: impl Into<String>, index: usize) -> Self {
        Self {
            domain: domain.into(),
            index,
        }
    }
}

impl fmt::Display for CriterionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} #{}", self.domain, self.index + 1)
    }
}

static NIS2_DOMAINS: [DomainDefinition; 4] = [
    DomainDefinition {
        name: "Governance",
        criteria: &[
            "Cybersecurity strategy aligned with organizational goals.",
            "Cyber roles and responsibilities assigned and reviewed.",
            "Executive oversight of cybersecurity established.",
            "Cybersecurity integrated into governance and compliance.",
        ],
    },
    DomainDefinition {
        name: "Risk Management",
        criteria: &[
            "Risk management framework implemented and maintained.",
            "Cyber risk assessments conducted and updated periodically.",
            "Third-party risks integrated into risk management.",
            "Risk treatment plans reviewed and acted upon.",
        ],
    },
    DomainDefinition {
        name: "Operational Security",
        criteria: &[
            "IT assets inventoried and classified.",
            "Access control policies enforced and reviewed.",
            "System vulnerabilities are patched promptly.",
            "Network segmentation and monitoring deployed.",
        ],
    },
    DomainDefinition {
        name: "Incident Management",
        criteria: &[
            "Incident response plan documented, tested, and updated.",
            "Reporting channels and detection tools established.",
            "Coordination with national CSIRTs or sector CSIRTs ensured.",
            "Post-incident review and continuous improvement cycle in place.",
        ],
    },
];

/// Domains and criteria presented for a sector.
///
/// Every sector shares one NIS2 domain set. Sector-specific catalogs would branch here.
pub fn domains_for(sector: Sector) -> &'static [DomainDefinition] {
    match sector {
        Sector::Energy
        | Sector::Transport
        | Sector::Banking
        | Sector::FinancialMarketInfrastructure
        | Sector::Health
        | Sector::DrinkingWater
        | Sector::WasteWater
        | Sector::DigitalInfrastructure
        | Sector::IctServiceManagement
        | Sector::PublicAdministration
        | Sector::Space => &NIS2_DOMAINS,
    }
}

pub fn find_domain(sector: Sector, name: &str) -> Option<&'static DomainDefinition> {
    domains_for(sector)
        .iter()
        .find(|domain| domain.name.eq_ignore_ascii_case(name.trim()))
}

#[derive(Debug, Clone, Serialize)]
pub struct SectorView {
    pub sector: Sector,
    pub label: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct CriterionView {
    pub index: usize,
    pub statement: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct DomainView {
    pub name: &'static str,
    pub criteria: Vec<CriterionView>,
}

impl From<&DomainDefinition> for DomainView {
    fn from(domain: &DomainDefinition) -> Self {
        Self {
            name: domain.name,
            criteria: domain
                .criteria
                .iter()
                .enumerate()
                .map(|(index, statement)| CriterionView { index, statement })
                .collect(),
        }
    }
}

pub fn sector_views() -> Vec<SectorView> {
    Sector::ordered()
        .into_iter()
        .map(|sector| SectorView {
            sector,
            label: sector.label(),
        })
        .collect()
}

pub fn domain_views(sector: Sector) -> Vec<DomainView> {
    domains_for(sector).iter().map(DomainView::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_sector_references_the_shared_domain_set() {
        let reference = domains_for(Sector::Energy);
        for sector in Sector::ordered() {
            assert!(std::ptr::eq(domains_for(sector), reference), "{sector}");
        }
    }

    #[test]
    fn catalog_keeps_domain_order_and_criteria_counts() {
        let names: Vec<_> = domains_for(Sector::Health)
            .iter()
            .map(|domain| domain.name)
            .collect();
        assert_eq!(
            names,
            [
                "Governance",
                "Risk Management",
                "Operational Security",
                "Incident Management"
            ]
        );
        assert!(domains_for(Sector::Health)
            .iter()
            .all(|domain| domain.criteria.len() == 4));
    }

    #[test]
    fn parses_sector_labels_and_identifiers() {
        assert_eq!("Drinking Water".parse::<Sector>(), Ok(Sector::DrinkingWater));
        assert_eq!(
            "ict_service_management".parse::<Sector>(),
            Ok(Sector::IctServiceManagement)
        );
        assert_eq!(
            "Atlantis".parse::<Sector>(),
            Err(UnknownSector("Atlantis".to_string()))
        );
    }

    #[test]
    fn finds_domains_case_insensitively() {
        let domain = find_domain(Sector::Space, "risk management").expect("domain exists");
        assert_eq!(domain.name, "Risk Management");
        assert_eq!(
            domain.criterion(2),
            Some("Third-party risks integrated into risk management.")
        );
        assert!(find_domain(Sector::Space, "Physical Security").is_none());
    }
}
