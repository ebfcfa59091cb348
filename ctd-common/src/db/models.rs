//! Store row models
//!
//! Every record is replaced wholesale on each sync; none of these carry
//! state beyond what the source sheets say. Response structs keep every
//! field optional except the client code, matching how the coercers degrade
//! malformed cells to absence.

use crate::tools::Tool;
use serde::Serialize;
use uuid::Uuid;

/// One row of the client roster
#[derive(Debug, Clone)]
pub struct Client {
    pub id: String,
    pub therapist: String,
    pub age: Option<i64>,
    pub gender: String,
    pub client_type: String,
    pub region: String,
}

/// Edinburgh Postnatal Depression Scale observation
#[derive(Debug, Clone)]
pub struct EpdsResponse {
    pub timestamp: Option<String>,
    pub client_code: String,
    pub total_score: Option<i64>,
    pub severity_descriptor: String,
    pub item_10_raw_score: Option<i64>,
    pub suicidality_flag: String,
    pub notes: String,
}

/// Beck's Depression Inventory observation
#[derive(Debug, Clone)]
pub struct BdiResponse {
    pub timestamp: Option<String>,
    pub client_code: String,
    pub total_score: Option<i64>,
    pub severity_level: String,
    pub clinical_interpretation: String,
}

/// Beck Anxiety Inventory observation
#[derive(Debug, Clone)]
pub struct BaiResponse {
    pub timestamp: Option<String>,
    pub client_code: String,
    pub total_score: Option<i64>,
    pub severity: String,
    pub clinical_conclusion: String,
}

/// ACE-Q observation
#[derive(Debug, Clone)]
pub struct AceqResponse {
    pub timestamp: Option<String>,
    pub client_code: String,
    pub total_score: Option<i64>,
}

/// Social Avoidance and Distress Scale observation
#[derive(Debug, Clone)]
pub struct SadsResponse {
    pub timestamp: Option<String>,
    pub client_code: String,
    pub social_avoidance_score: Option<i64>,
    pub social_avoidance_level: String,
    pub social_distress_score: Option<i64>,
    pub social_distress_level: String,
    pub total_score: Option<i64>,
    pub overall_level: String,
}

/// Adult ADHD Self-Report Scale observation
#[derive(Debug, Clone)]
pub struct AsrsResponse {
    pub timestamp: Option<String>,
    pub client_code: String,
    pub part_a_score: Option<i64>,
    pub part_a_descriptor: String,
    pub part_b_score: Option<i64>,
    pub part_b_descriptor: String,
    pub total_score: Option<i64>,
    pub total_descriptor: String,
    pub inattentive_raw: Option<i64>,
    pub inattentive_percent: Option<f64>,
    pub hyperactivity_motor_raw: Option<i64>,
    pub hyperactivity_motor_percent: Option<f64>,
    pub hyperactivity_verbal_raw: Option<i64>,
    pub hyperactivity_verbal_percent: Option<f64>,
}

/// One row of the sheet registry
#[derive(Debug, Clone, Serialize)]
pub struct SheetConfigEntry {
    pub sheet_name: String,
    pub table_name: String,
    pub is_excluded: bool,
}

/// Per-tool load counters from one sync run
#[derive(Debug, Clone, Serialize)]
pub struct ToolLoadStats {
    pub tool: Tool,
    pub inserted: u64,
    pub orphans_dropped: u64,
}

/// Result of one full sync run
#[derive(Debug, Clone, Serialize)]
pub struct SyncSummary {
    pub run_id: Uuid,
    pub sheets_registered: usize,
    pub clients_inserted: u64,
    /// Roster rows skipped for a missing id or therapist assignment
    pub clients_skipped: u64,
    pub tools: Vec<ToolLoadStats>,
    pub elapsed_ms: u64,
}

impl SyncSummary {
    /// Total response rows inserted across all tools
    pub fn responses_inserted(&self) -> u64 {
        self.tools.iter().map(|t| t.inserted).sum()
    }

    /// Total response rows dropped for an unknown client
    pub fn orphans_dropped(&self) -> u64 {
        self.tools.iter().map(|t| t.orphans_dropped).sum()
    }
}
