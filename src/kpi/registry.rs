//! KPI registry: presentation metadata decoupled from the sheet schema.
//!
//! The registry is an ordered list of `KpiDefinition`s plus the summary cards
//! shown above the charts. It is built once at startup (either the standard
//! table below or a JSON file) and never mutated afterwards.

use std::collections::HashSet;
use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::{CardAggregation, KpiDefinition, SummaryCard};
use crate::error::AppError;

pub const OVERVIEW_ID: &str = "overview";
pub const AGREEMENTS_MEMBERS_ID: &str = "agreements_members";
pub const AGREEMENTS_POTENTIAL_ID: &str = "agreements_potential";

/// `(id, title, unit, tooltip, source_field)`
type KpiRow = (&'static str, &'static str, &'static str, &'static str, Option<&'static str>);

const STANDARD_KPIS: [KpiRow; 8] = [
    (
        "membership_reach",
        "Membership Reach",
        "Member / Million Inhabitants",
        "How many members you have per million inhabitants in the target region.",
        Some("Membership Reach"),
    ),
    (
        "certification_reach",
        "Certification Scheme Reach",
        "Certified / Million Inhabitants",
        "Number of individuals or organizations certified per million inhabitants.",
        Some("Certification Scheme Reach"),
    ),
    (
        "financial_health",
        "Financial Health",
        "$ Annualized Revenue / Member",
        "Average annual revenue generated per member (USD / member).",
        Some("Financial Health"),
    ),
    (
        "project_involvement",
        "Involvement in GFMAM Projects",
        "Representative / 10 Projects",
        "Number of representatives you have participating in each of the last 10 GFMAM projects.",
        Some("Involvement in GFMAM Projects"),
    ),
    (
        AGREEMENTS_MEMBERS_ID,
        "Bilateral Agreements (Members)",
        "Agreements",
        "Total count of formal bilateral agreements signed with existing GFMAM member organizations.",
        Some("# Bilateral Agreement with GFMAM Members"),
    ),
    (
        AGREEMENTS_POTENTIAL_ID,
        "Bilateral Agreements (Potential)",
        "Agreements",
        "Total count of formal bilateral agreements signed with organizations that are prospective GFMAM members.",
        Some("# Bilateral Agreement with GFMAM Potential Members"),
    ),
    (
        "member_presentations",
        "Presentations from GFMAM Members",
        "Presentations / Event",
        "Number of presentations delivered by GFMAM member entities at your events.",
        Some("Presentations from GFMAM Members"),
    ),
    (
        OVERVIEW_ID,
        "Organization Radar",
        "1-10 Scale",
        "Performance across all KPIs, scaled from 1 (lowest) to 10 (highest) relative to every other organization.",
        None,
    ),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KpiRegistry {
    kpis: Vec<KpiDefinition>,
    #[serde(default)]
    cards: Vec<SummaryCard>,
}

impl KpiRegistry {
    /// The built-in registry for the GFMAM society sheet.
    pub fn standard() -> Self {
        let kpis = STANDARD_KPIS
            .iter()
            .map(|(id, title, unit, tooltip, source)| KpiDefinition {
                id: id.to_string(),
                title: title.to_string(),
                unit: unit.to_string(),
                tooltip: tooltip.to_string(),
                source_field: source.map(str::to_string),
            })
            .collect();

        let card = |id: &str, title: &str, aggregation: CardAggregation| SummaryCard {
            id: id.to_string(),
            title: title.to_string(),
            aggregation,
            value_prefix: None,
        };

        let cards = vec![
            card("total_orgs", "Total Organizations", CardAggregation::EntityCount),
            card(
                "avg_membership",
                "Avg. Membership Reach",
                CardAggregation::Mean { kpi: "membership_reach".into() },
            ),
            card(
                "avg_certification",
                "Avg. Certification Reach",
                CardAggregation::Mean { kpi: "certification_reach".into() },
            ),
            SummaryCard {
                value_prefix: Some("$ ".into()),
                ..card(
                    "total_financial",
                    "Total Financial Health",
                    CardAggregation::Total { kpi: "financial_health".into() },
                )
            },
            card(
                "avg_projects",
                "Avg. Project Involvement",
                CardAggregation::Mean { kpi: "project_involvement".into() },
            ),
            card(
                "total_agreements",
                "Total Agreements",
                CardAggregation::CompoundTotal {
                    kpis: vec![AGREEMENTS_MEMBERS_ID.into(), AGREEMENTS_POTENTIAL_ID.into()],
                },
            ),
            card(
                "avg_presentations",
                "Avg. Presentations",
                CardAggregation::Mean { kpi: "member_presentations".into() },
            ),
        ];

        Self { kpis, cards }
    }

    /// Build a registry from explicit parts, validating it.
    pub fn new(kpis: Vec<KpiDefinition>, cards: Vec<SummaryCard>) -> Result<Self, AppError> {
        let registry = Self { kpis, cards };
        registry.validate()?;
        Ok(registry)
    }

    /// Load a registry from a JSON file (`{"kpis": [...], "cards": [...]}`).
    pub fn from_json_file(path: &Path) -> Result<Self, AppError> {
        let file = File::open(path).map_err(|e| {
            AppError::config(format!("Failed to open registry '{}': {e}", path.display()))
        })?;
        let registry: KpiRegistry = serde_json::from_reader(file).map_err(|e| {
            AppError::config(format!("Failed to parse registry '{}': {e}", path.display()))
        })?;
        registry.validate()?;
        Ok(registry)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.kpis.is_empty() {
            return Err(AppError::config("KPI registry is empty."));
        }

        let mut seen = HashSet::new();
        for kpi in &self.kpis {
            if kpi.id.trim().is_empty() {
                return Err(AppError::config("KPI registry contains an empty id."));
            }
            if !seen.insert(kpi.id.as_str()) {
                return Err(AppError::config(format!("Duplicate KPI id in registry: `{}`", kpi.id)));
            }
            if let Some(field) = &kpi.source_field {
                if field.trim().is_empty() {
                    return Err(AppError::config(format!(
                        "KPI `{}` has a blank source field (use null for the overview).",
                        kpi.id
                    )));
                }
            }
        }

        for card in &self.cards {
            for kpi in card_kpis(&card.aggregation) {
                let Some(def) = self.get(kpi) else {
                    return Err(AppError::config(format!(
                        "Card `{}` references unknown KPI `{kpi}`.",
                        card.id
                    )));
                };
                if def.is_overview() {
                    return Err(AppError::config(format!(
                        "Card `{}` references KPI `{kpi}`, which has no source field.",
                        card.id
                    )));
                }
            }
        }
        Ok(())
    }

    /// All definitions in registry order (overview included).
    pub fn kpis(&self) -> &[KpiDefinition] {
        &self.kpis
    }

    pub fn cards(&self) -> &[SummaryCard] {
        &self.cards
    }

    pub fn get(&self, id: &str) -> Option<&KpiDefinition> {
        self.kpis.iter().find(|k| k.id == id)
    }

    /// KPIs that read a column, in registry order (overview excluded).
    pub fn chart_kpis(&self) -> impl Iterator<Item = &KpiDefinition> {
        self.kpis.iter().filter(|k| !k.is_overview())
    }

    pub fn overview(&self) -> Option<&KpiDefinition> {
        self.kpis.iter().find(|k| k.is_overview())
    }

    /// Every column the registry reads.
    pub fn source_fields(&self) -> impl Iterator<Item = &str> {
        self.chart_kpis().filter_map(|k| k.source_field.as_deref())
    }

    /// Tooltip text for a summary card: unit line, blank line, description.
    ///
    /// Compound cards list every component description instead.
    pub fn card_tooltip(&self, card: &SummaryCard) -> String {
        match &card.aggregation {
            CardAggregation::EntityCount => {
                "Number of organizations in the published sheet.".to_string()
            }
            CardAggregation::Mean { kpi } | CardAggregation::Total { kpi } => match self.get(kpi) {
                Some(def) => format!("Unit: {}\n\n{}", def.unit, def.tooltip),
                None => String::new(),
            },
            CardAggregation::CompoundTotal { kpis } => {
                let defs: Vec<&KpiDefinition> = kpis.iter().filter_map(|id| self.get(id)).collect();
                let unit = defs.first().map(|d| d.unit.as_str()).unwrap_or_default();
                let mut out = format!("Unit: {unit}\n\nThis is the sum of:");
                for (idx, def) in defs.iter().enumerate() {
                    out.push_str(&format!("\n{}. {}", idx + 1, def.tooltip));
                }
                out
            }
        }
    }
}

impl Default for KpiRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

/// KPI ids a card aggregation reads.
pub fn card_kpis(aggregation: &CardAggregation) -> Vec<&str> {
    match aggregation {
        CardAggregation::EntityCount => Vec::new(),
        CardAggregation::Mean { kpi } | CardAggregation::Total { kpi } => vec![kpi.as_str()],
        CardAggregation::CompoundTotal { kpis } => kpis.iter().map(String::as_str).collect(),
    }
}
