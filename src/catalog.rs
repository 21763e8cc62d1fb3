//! Series and group catalog.
//!
//! Defines which FRED series are crawled, the friendly column name each one
//! is published under, how daily/weekly series collapse to monthly, and which
//! columns are grouped together into one sheet / JSON file.
//!
//! The built-in registry is the single source of truth unless a TOML catalog
//! is supplied at startup; all other modules look series up through a
//! `Catalog` rather than hardcoding identifiers.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::model::{AggregationPolicy, PipelineError};

// ---------------------------------------------------------------------------
// Static registry
// ---------------------------------------------------------------------------

/// A single series in the built-in registry.
pub struct SeriesSpec {
    /// Column label used in every output.
    pub friendly_name: &'static str,
    /// FRED series identifier.
    pub series_id: &'static str,
    /// Monthly aggregation for non-monthly series; `None` for monthly-native.
    pub aggregation: Option<AggregationPolicy>,
}

pub struct GroupSpec {
    pub name: &'static str,
    pub columns: &'static [&'static str],
}

/// All series crawled by default.
///
/// Sources: FRED (fred.stlouisfed.org). Treasury yields and the effective
/// fed funds rate are daily; the NFCI/ANFCI indices are weekly. Everything
/// else is published monthly.
pub static SERIES_REGISTRY: &[SeriesSpec] = &[
    // Inflation
    SeriesSpec { friendly_name: "CPI_headline", series_id: "CPIAUCSL", aggregation: None },
    SeriesSpec { friendly_name: "CPI_core", series_id: "CPILFESL", aggregation: None },
    SeriesSpec { friendly_name: "PCE_headline", series_id: "PCEPI", aggregation: None },
    SeriesSpec { friendly_name: "PCE_core", series_id: "PCEPILFE", aggregation: None },
    SeriesSpec { friendly_name: "PPI_headline", series_id: "PPIACO", aggregation: None },
    // Labor
    SeriesSpec { friendly_name: "NFP_payrolls", series_id: "PAYEMS", aggregation: None },
    SeriesSpec { friendly_name: "Unemployment_rate", series_id: "UNRATE", aggregation: None },
    // Rates
    SeriesSpec {
        friendly_name: "Treasury_10Y",
        series_id: "DGS10",
        aggregation: Some(AggregationPolicy::Mean),
    },
    SeriesSpec {
        friendly_name: "Treasury_2Y",
        series_id: "DGS2",
        aggregation: Some(AggregationPolicy::Mean),
    },
    // Policy
    SeriesSpec {
        friendly_name: "Fed_funds_rate",
        series_id: "DFF",
        aggregation: Some(AggregationPolicy::Mean),
    },
    // Financial conditions
    SeriesSpec {
        friendly_name: "FCI_NFCI",
        series_id: "NFCI",
        aggregation: Some(AggregationPolicy::Mean),
    },
    SeriesSpec {
        friendly_name: "FCI_ANFCI",
        series_id: "ANFCI",
        aggregation: Some(AggregationPolicy::Mean),
    },
];

/// Sheet / JSON file layout, in output order.
pub static GROUP_REGISTRY: &[GroupSpec] = &[
    GroupSpec {
        name: "Inflation",
        columns: &["CPI_headline", "CPI_core", "PCE_headline", "PCE_core", "PPI_headline"],
    },
    GroupSpec { name: "Labor", columns: &["NFP_payrolls", "Unemployment_rate"] },
    GroupSpec { name: "Rates", columns: &["Treasury_2Y", "Treasury_10Y"] },
    GroupSpec { name: "Policy", columns: &["Fed_funds_rate"] },
    GroupSpec { name: "Financial_Conditions", columns: &["FCI_NFCI", "FCI_ANFCI"] },
];

// ---------------------------------------------------------------------------
// Owned catalog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SeriesEntry {
    #[serde(rename = "name")]
    pub friendly_name: String,
    #[serde(rename = "id")]
    pub series_id: String,
    #[serde(default)]
    pub aggregation: Option<AggregationPolicy>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Group {
    pub name: String,
    pub columns: Vec<String>,
}

/// The run's configuration data: series, groups and aggregation policies.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Catalog {
    pub series: Vec<SeriesEntry>,
    pub groups: Vec<Group>,
}

impl Catalog {
    /// The built-in registry as an owned catalog.
    pub fn builtin() -> Self {
        Self {
            series: SERIES_REGISTRY
                .iter()
                .map(|s| SeriesEntry {
                    friendly_name: s.friendly_name.to_string(),
                    series_id: s.series_id.to_string(),
                    aggregation: s.aggregation,
                })
                .collect(),
            groups: GROUP_REGISTRY
                .iter()
                .map(|g| Group {
                    name: g.name.to_string(),
                    columns: g.columns.iter().map(|c| c.to_string()).collect(),
                })
                .collect(),
        }
    }

    /// Parses and validates a TOML catalog.
    pub fn from_toml_str(text: &str) -> Result<Self, PipelineError> {
        let catalog: Catalog = toml::from_str(text)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Looks up a series by friendly name. Returns `None` if not found.
    pub fn find_series(&self, friendly_name: &str) -> Option<&SeriesEntry> {
        self.series.iter().find(|s| s.friendly_name == friendly_name)
    }

    pub fn find_by_series_id(&self, series_id: &str) -> Option<&SeriesEntry> {
        self.series.iter().find(|s| s.series_id == series_id)
    }

    pub fn policy_for(&self, friendly_name: &str) -> Option<AggregationPolicy> {
        self.find_series(friendly_name).and_then(|s| s.aggregation)
    }

    pub fn find_group(&self, name: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.name == name)
    }

    /// Checks the catalog is internally consistent before any fetch.
    pub fn validate(&self) -> Result<(), PipelineError> {
        let invalid = |msg: String| -> Result<(), PipelineError> {
            Err(PipelineError::InvalidCatalog(msg))
        };

        let mut names = HashSet::new();
        let mut ids = HashSet::new();
        for entry in &self.series {
            if entry.friendly_name.trim().is_empty() || entry.series_id.trim().is_empty() {
                return invalid(format!(
                    "series entries need a name and an id (got name '{}', id '{}')",
                    entry.friendly_name, entry.series_id
                ));
            }
            if !names.insert(entry.friendly_name.as_str()) {
                return invalid(format!("duplicate series name '{}'", entry.friendly_name));
            }
            if !ids.insert(entry.series_id.as_str()) {
                return invalid(format!("duplicate series id '{}'", entry.series_id));
            }
        }

        let mut group_names = HashSet::new();
        for group in &self.groups {
            if group.name.trim().is_empty() {
                return invalid("group with empty name".to_string());
            }
            if let Some(problem) = sheet_name_problem(&group.name) {
                return invalid(format!("group '{}' {}", group.name, problem));
            }
            // Excel compares sheet names case-insensitively.
            if !group_names.insert(group.name.to_lowercase()) {
                return invalid(format!("duplicate group '{}'", group.name));
            }
            if group.columns.is_empty() {
                return invalid(format!("group '{}' has no columns", group.name));
            }
            let mut seen = HashSet::new();
            for column in &group.columns {
                if !names.contains(column.as_str()) {
                    return invalid(format!(
                        "group '{}' references unknown series '{}'",
                        group.name, column
                    ));
                }
                if !seen.insert(column.as_str()) {
                    return invalid(format!(
                        "group '{}' lists '{}' more than once",
                        group.name, column
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Longest sheet name Excel accepts.
const MAX_SHEET_NAME_CHARS: usize = 31;

/// Characters Excel forbids in sheet names. Also covers path separators,
/// since the group name becomes the JSON file name.
const FORBIDDEN_SHEET_CHARS: &[char] = &['[', ']', ':', '*', '?', '/', '\\'];

/// Why `name` cannot be used as a sheet and file name, if it cannot.
fn sheet_name_problem(name: &str) -> Option<String> {
    if name.chars().count() > MAX_SHEET_NAME_CHARS {
        return Some(format!("is longer than {} characters", MAX_SHEET_NAME_CHARS));
    }
    if let Some(c) = name.chars().find(|c| FORBIDDEN_SHEET_CHARS.contains(c)) {
        return Some(format!("contains '{}'", c));
    }
    if name.starts_with('\'') || name.ends_with('\'') {
        return Some("starts or ends with an apostrophe".to_string());
    }
    if name.eq_ignore_ascii_case("history") {
        return Some("is reserved by Excel".to_string());
    }
    None
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_is_valid() {
        Catalog::builtin().validate().expect("built-in catalog must validate");
    }

    #[test]
    fn test_series_ids_are_uppercase_fred_format() {
        // FRED ids are upper-case alphanumerics; a typo here surfaces as a
        // 400 from the API only at run time.
        for series in SERIES_REGISTRY {
            assert!(
                series.series_id
                    .chars()
                    .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()),
                "series id for '{}' should be upper-case alphanumeric, got '{}'",
                series.friendly_name,
                series.series_id
            );
        }
    }

    #[test]
    fn test_every_series_belongs_to_a_group() {
        for series in SERIES_REGISTRY {
            assert!(
                GROUP_REGISTRY.iter().any(|g| g.columns.contains(&series.friendly_name)),
                "series '{}' is crawled but never published",
                series.friendly_name
            );
        }
    }

    #[test]
    fn test_daily_and_weekly_series_have_mean_policy() {
        let catalog = Catalog::builtin();
        for name in ["Fed_funds_rate", "Treasury_10Y", "Treasury_2Y", "FCI_NFCI", "FCI_ANFCI"] {
            assert_eq!(catalog.policy_for(name), Some(AggregationPolicy::Mean), "{}", name);
        }
        assert_eq!(catalog.policy_for("CPI_headline"), None);
        assert_eq!(catalog.policy_for("does_not_exist"), None);
    }

    #[test]
    fn test_rates_group_lists_2y_before_10y() {
        let catalog = Catalog::builtin();
        let rates = catalog.find_group("Rates").expect("Rates group should exist");
        assert_eq!(rates.columns, vec!["Treasury_2Y", "Treasury_10Y"]);
    }

    #[test]
    fn test_lookup_helpers() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.find_series("Unemployment_rate").unwrap().series_id, "UNRATE");
        assert_eq!(catalog.find_by_series_id("DFF").unwrap().friendly_name, "Fed_funds_rate");
        assert!(catalog.find_group("Nope").is_none());
    }

    #[test]
    fn test_toml_catalog_parses() {
        let text = r#"
            [[series]]
            name = "Oil"
            id = "DCOILWTICO"
            aggregation = "last"

            [[series]]
            name = "Housing"
            id = "HOUST"

            [[groups]]
            name = "Misc"
            columns = ["Housing", "Oil"]
        "#;
        let catalog = Catalog::from_toml_str(text).unwrap();
        assert_eq!(catalog.series.len(), 2);
        assert_eq!(catalog.policy_for("Oil"), Some(AggregationPolicy::Last));
        assert_eq!(catalog.policy_for("Housing"), None);
        assert_eq!(catalog.groups[0].columns, vec!["Housing", "Oil"]);
    }

    #[test]
    fn test_toml_unknown_policy_is_rejected() {
        let text = r#"
            [[series]]
            name = "Oil"
            id = "DCOILWTICO"
            aggregation = "median"

            [[groups]]
            name = "Misc"
            columns = ["Oil"]
        "#;
        assert!(matches!(
            Catalog::from_toml_str(text),
            Err(PipelineError::CatalogParse(_))
        ));
    }

    fn entry(name: &str, id: &str) -> SeriesEntry {
        SeriesEntry {
            friendly_name: name.to_string(),
            series_id: id.to_string(),
            aggregation: None,
        }
    }

    fn group(name: &str, columns: &[&str]) -> Group {
        Group {
            name: name.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
        }
    }

    #[test]
    fn test_validate_rejects_inconsistent_catalogs() {
        let cases = vec![
            (
                "duplicate name",
                Catalog { series: vec![entry("A", "X"), entry("A", "Y")], groups: vec![] },
            ),
            (
                "duplicate id",
                Catalog { series: vec![entry("A", "X"), entry("B", "X")], groups: vec![] },
            ),
            (
                "empty id",
                Catalog { series: vec![entry("A", " ")], groups: vec![] },
            ),
            (
                "unknown column",
                Catalog { series: vec![entry("A", "X")], groups: vec![group("G", &["B"])] },
            ),
            (
                "empty group",
                Catalog { series: vec![entry("A", "X")], groups: vec![group("G", &[])] },
            ),
            (
                "repeated column",
                Catalog { series: vec![entry("A", "X")], groups: vec![group("G", &["A", "A"])] },
            ),
            (
                "duplicate group",
                Catalog {
                    series: vec![entry("A", "X")],
                    groups: vec![group("G", &["A"]), group("G", &["A"])],
                },
            ),
        ];
        for (label, catalog) in cases {
            assert!(
                matches!(catalog.validate(), Err(PipelineError::InvalidCatalog(_))),
                "case '{}' should be rejected",
                label
            );
        }
    }

    #[test]
    fn test_validate_rejects_illegal_sheet_names() {
        let names = [
            "Rates/Daily",
            "Rates[1]",
            "Rates: 2Y",
            "Why?",
            "'Quoted'",
            "history",
            "Financial_Conditions_And_Credit_Spreads",
        ];
        for name in names {
            let catalog = Catalog {
                series: vec![entry("A", "X")],
                groups: vec![group(name, &["A"])],
            };
            assert!(
                matches!(catalog.validate(), Err(PipelineError::InvalidCatalog(_))),
                "group name {:?} should be rejected",
                name
            );
        }

        let longest = "A".repeat(MAX_SHEET_NAME_CHARS);
        let catalog = Catalog {
            series: vec![entry("A", "X")],
            groups: vec![group(&longest, &["A"])],
        };
        assert!(catalog.validate().is_ok());
    }

    #[test]
    fn test_group_names_differing_only_in_case_are_duplicates() {
        let catalog = Catalog {
            series: vec![entry("A", "X")],
            groups: vec![group("Rates", &["A"]), group("RATES", &["A"])],
        };
        assert!(matches!(catalog.validate(), Err(PipelineError::InvalidCatalog(_))));
    }

    #[test]
    fn test_toml_catalog_with_bad_sheet_name_is_rejected_on_load() {
        let text = r#"
            [[series]]
            name = "CPI_headline"
            id = "CPIAUCSL"

            [[groups]]
            name = "Prices/Inflation"
            columns = ["CPI_headline"]
        "#;
        assert!(matches!(
            Catalog::from_toml_str(text),
            Err(PipelineError::InvalidCatalog(_))
        ));
    }

    #[test]
    fn test_groups_may_share_columns() {
        let catalog = Catalog {
            series: vec![entry("A", "X")],
            groups: vec![group("G1", &["A"]), group("G2", &["A"])],
        };
        assert!(catalog.validate().is_ok());
    }
}
