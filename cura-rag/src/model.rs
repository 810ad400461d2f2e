//! Request and result types for interaction analysis.
//!
//! Field names serialise in camelCase to match the public JSON contract.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// A medication the patient currently takes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MedicationRef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dosage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<String>,
}

impl MedicationRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), dosage: None, frequency: None }
    }
}

/// Whether the candidate is a medication or a food.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CandidateKind {
    Medication,
    Food,
}

/// When a food is taken relative to medication.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FoodTiming {
    BeforeMedication,
    WithMedication,
    AfterMedication,
}

/// The medication or food being evaluated against current medications.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CandidateItem {
    #[serde(rename = "type")]
    pub kind: CandidateKind,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dosage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timing: Option<FoodTiming>,
}

impl CandidateItem {
    /// A medication candidate with no dosage details.
    pub fn medication(name: impl Into<String>) -> Self {
        Self {
            kind: CandidateKind::Medication,
            name: name.into(),
            dosage: None,
            frequency: None,
            quantity: None,
            timing: None,
        }
    }

    /// A food candidate with no quantity or timing.
    pub fn food(name: impl Into<String>) -> Self {
        Self { kind: CandidateKind::Food, ..Self::medication(name) }
    }
}

/// Interaction severity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Unknown,
    Minor,
    Moderate,
    Severe,
    Contraindicated,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Unknown => "unknown",
            Severity::Minor => "minor",
            Severity::Moderate => "moderate",
            Severity::Severe => "severe",
            Severity::Contraindicated => "contraindicated",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The retrieved passage backing a finding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Evidence {
    /// Corpus label, e.g. `BNF 82`.
    pub source: String,
    pub page: u32,
    /// The raw similarity score of the match. Never recalibrated.
    pub confidence: f64,
}

/// One interaction derived from the top match of one medication query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InteractionFinding {
    pub severity: Severity,
    pub description: String,
    pub recommendation: String,
    pub evidence: Evidence,
}

/// A suggested substitute for the candidate item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Alternative {
    pub name: String,
    pub reason: String,
    pub safety_score: f64,
}

/// Outcome of an analysis request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    Success,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisData {
    pub safety_score: f64,
    pub interactions: Vec<InteractionFinding>,
    pub alternatives: Vec<Alternative>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisMetadata {
    /// ISO-8601 UTC timestamp of when the analysis ran.
    pub analysis_timestamp: String,
    /// Edition of the reference corpus.
    pub data_version: String,
}

impl AnalysisMetadata {
    pub fn stamped(at: DateTime<Utc>, data_version: impl Into<String>) -> Self {
        Self {
            analysis_timestamp: at.to_rfc3339_opts(SecondsFormat::Millis, true),
            data_version: data_version.into(),
        }
    }
}

/// The full, freshly built response to one analysis request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisResult {
    pub status: AnalysisStatus,
    pub data: AnalysisData,
    pub metadata: AnalysisMetadata,
}
