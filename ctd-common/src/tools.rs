//! Assessment tool registry
//!
//! The six clinical assessment instruments are an explicit enum, resolved
//! once from sheet titles at sync/config time. Per-tool metadata (sheet
//! title, destination table, chartable score columns, severity bands) lives
//! here so nothing downstream ever re-derives a tool from a display string.

use serde::{Deserialize, Serialize};

/// The six fixed clinical assessment instruments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    Epds,
    Bdi,
    Bai,
    AceQ,
    Sads,
    Asrs,
}

/// A named score range used to annotate chart regions for one tool
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeverityBand {
    pub label: &'static str,
    pub lower: f64,
    pub upper: f64,
    pub color: &'static str,
}

const fn band(label: &'static str, lower: f64, upper: f64, color: &'static str) -> SeverityBand {
    SeverityBand { label, lower, upper, color }
}

/// Sheets excluded from the "available tools" listing (still registered
/// in sheet_config, never loaded as responses)
pub const EXCLUDED_SHEETS: [&str; 3] = ["Assessment Tools", "Generated Links", "Clients"];

/// Source tab carrying the client roster
pub const CLIENTS_SHEET: &str = "Clients";

impl Tool {
    pub const ALL: [Tool; 6] = [
        Tool::Epds,
        Tool::Bdi,
        Tool::Bai,
        Tool::AceQ,
        Tool::Sads,
        Tool::Asrs,
    ];

    /// Short display label
    pub fn label(&self) -> &'static str {
        match self {
            Tool::Epds => "EPDS",
            Tool::Bdi => "BDI",
            Tool::Bai => "BAI",
            Tool::AceQ => "ACE-Q",
            Tool::Sads => "SADS",
            Tool::Asrs => "ASRS",
        }
    }

    /// URL-safe identifier used in API paths
    pub fn slug(&self) -> &'static str {
        match self {
            Tool::Epds => "epds",
            Tool::Bdi => "bdi",
            Tool::Bai => "bai",
            Tool::AceQ => "aceq",
            Tool::Sads => "sads",
            Tool::Asrs => "asrs",
        }
    }

    /// Source worksheet title, verbatim from the workbook
    pub fn sheet_name(&self) -> &'static str {
        match self {
            Tool::Epds => {
                "Edinburgh Postnatal Depression Scale (EPDS) (Responses) - EPDS Scoring"
            }
            Tool::Bdi => "Beck's Depression Inventory (BDI) (Responses) - BDI Scoring",
            Tool::Bai => "Beck Anxiety Inventory (BAI) (Responses) - BAI Scoring",
            Tool::AceQ => "ACE-Q Responses - ACE-Q Scoring",
            Tool::Sads => "SADS Responses - SADS Scoring",
            Tool::Asrs => "ASRS Responses - ASRS Scoring",
        }
    }

    /// Destination table in the store
    pub fn table_name(&self) -> &'static str {
        match self {
            Tool::Epds => "epds_responses",
            Tool::Bdi => "bdi_responses",
            Tool::Bai => "bai_responses",
            Tool::AceQ => "aceq_responses",
            Tool::Sads => "sads_responses",
            Tool::Asrs => "asrs_responses",
        }
    }

    /// All columns of the response table, in schema order
    pub fn response_columns(&self) -> &'static [&'static str] {
        match self {
            Tool::Epds => &[
                "timestamp",
                "client_code",
                "total_score",
                "severity_descriptor",
                "item_10_raw_score",
                "suicidality_flag",
                "notes",
            ],
            Tool::Bdi => &[
                "timestamp",
                "client_code",
                "total_score",
                "severity_level",
                "clinical_interpretation",
            ],
            Tool::Bai => &[
                "timestamp",
                "client_code",
                "total_score",
                "severity",
                "clinical_conclusion",
            ],
            Tool::AceQ => &["timestamp", "client_code", "total_score"],
            Tool::Sads => &[
                "timestamp",
                "client_code",
                "social_avoidance_score",
                "social_avoidance_level",
                "social_distress_score",
                "social_distress_level",
                "total_score",
                "overall_level",
            ],
            Tool::Asrs => &[
                "timestamp",
                "client_code",
                "part_a_score",
                "part_a_descriptor",
                "part_b_score",
                "part_b_descriptor",
                "total_score",
                "total_descriptor",
                "inattentive_raw",
                "inattentive_percent",
                "hyperactivity_motor_raw",
                "hyperactivity_motor_percent",
                "hyperactivity_verbal_raw",
                "hyperactivity_verbal_percent",
            ],
        }
    }

    /// Numeric columns selectable for charting
    pub fn score_columns(&self) -> &'static [&'static str] {
        match self {
            Tool::Epds => &["total_score", "item_10_raw_score"],
            Tool::Bdi => &["total_score"],
            Tool::Bai => &["total_score"],
            Tool::AceQ => &["total_score"],
            Tool::Sads => &["social_avoidance_score", "social_distress_score", "total_score"],
            Tool::Asrs => &[
                "part_a_score",
                "part_b_score",
                "total_score",
                "inattentive_raw",
                "inattentive_percent",
                "hyperactivity_motor_raw",
                "hyperactivity_motor_percent",
                "hyperactivity_verbal_raw",
                "hyperactivity_verbal_percent",
            ],
        }
    }

    /// Default score column for trajectory charts
    pub fn primary_score_column(&self) -> &'static str {
        "total_score"
    }

    /// Ordered severity bands for chart background annotation
    pub fn severity_bands(&self) -> &'static [SeverityBand] {
        const EPDS: &[SeverityBand] = &[
            band("Minimal", 0.0, 9.0, "lightgreen"),
            band("Mild", 10.0, 12.0, "yellow"),
            band("Moderate", 13.0, 21.0, "orange"),
            band("Severe", 22.0, 30.0, "red"),
        ];
        const BDI: &[SeverityBand] = &[
            band("Minimal", 0.0, 13.0, "lightgreen"),
            band("Mild", 14.0, 19.0, "yellow"),
            band("Moderate", 20.0, 28.0, "orange"),
            band("Severe", 29.0, 63.0, "red"),
        ];
        const BAI: &[SeverityBand] = &[
            band("Minimal", 0.0, 7.0, "lightgreen"),
            band("Mild", 8.0, 15.0, "yellow"),
            band("Moderate", 16.0, 25.0, "orange"),
            band("Severe", 26.0, 63.0, "red"),
        ];
        const ACEQ: &[SeverityBand] = &[
            band("Low Risk", 0.0, 3.0, "lightgreen"),
            band("Moderate Risk", 4.0, 6.0, "orange"),
            band("High Risk", 7.0, 10.0, "red"),
        ];
        const SADS: &[SeverityBand] = &[
            band("Low", 0.0, 30.0, "lightgreen"),
            band("Moderate", 31.0, 60.0, "orange"),
            band("High", 61.0, 100.0, "red"),
        ];
        const ASRS: &[SeverityBand] = &[
            band("Low", 0.0, 40.0, "lightgreen"),
            band("Moderate", 41.0, 60.0, "orange"),
            band("High", 61.0, 100.0, "red"),
        ];
        match self {
            Tool::Epds => EPDS,
            Tool::Bdi => BDI,
            Tool::Bai => BAI,
            Tool::AceQ => ACEQ,
            Tool::Sads => SADS,
            Tool::Asrs => ASRS,
        }
    }

    /// Resolve a tool from its URL slug
    pub fn from_slug(slug: &str) -> Option<Tool> {
        Tool::ALL.iter().copied().find(|t| t.slug() == slug)
    }

    /// Resolve a tool from its source worksheet title
    pub fn from_sheet_name(sheet: &str) -> Option<Tool> {
        Tool::ALL.iter().copied().find(|t| t.sheet_name() == sheet)
    }
}

impl std::fmt::Display for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Destination table for a source sheet title; `None` for unrecognized tabs
pub fn table_for_sheet(sheet: &str) -> Option<&'static str> {
    if sheet == CLIENTS_SHEET {
        return Some("clients");
    }
    Tool::from_sheet_name(sheet).map(|t| t.table_name())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_round_trip() {
        for tool in Tool::ALL {
            assert_eq!(Tool::from_slug(tool.slug()), Some(tool));
        }
        assert_eq!(Tool::from_slug("unknown"), None);
    }

    #[test]
    fn test_sheet_name_round_trip() {
        for tool in Tool::ALL {
            assert_eq!(Tool::from_sheet_name(tool.sheet_name()), Some(tool));
        }
        assert_eq!(Tool::from_sheet_name("Generated Links"), None);
    }

    #[test]
    fn test_table_for_sheet() {
        assert_eq!(table_for_sheet("Clients"), Some("clients"));
        assert_eq!(
            table_for_sheet("SADS Responses - SADS Scoring"),
            Some("sads_responses")
        );
        assert_eq!(table_for_sheet("Assessment Tools"), None);
    }

    #[test]
    fn test_score_columns_are_response_columns() {
        for tool in Tool::ALL {
            for col in tool.score_columns() {
                assert!(
                    tool.response_columns().contains(col),
                    "{col} missing from {tool} response columns"
                );
            }
            assert!(tool.score_columns().contains(&tool.primary_score_column()));
        }
    }

    #[test]
    fn test_severity_bands_ordered_and_contiguous() {
        for tool in Tool::ALL {
            let bands = tool.severity_bands();
            assert!(!bands.is_empty());
            for pair in bands.windows(2) {
                assert!(pair[0].upper < pair[1].lower, "{tool} bands overlap");
            }
        }
    }
}
