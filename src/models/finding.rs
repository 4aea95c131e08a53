use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ImageType, RiskLevel, RouteDecision};

/// Classification label carried by the error sentinel.
pub const ERROR_CLASSIFICATION: &str = "error";
/// Classification label recorded when the router rejects an image.
pub const UNIDENTIFIED_CLASSIFICATION: &str = "unidentified";
const UNIDENTIFIED_RECOMMENDATION: &str = "Re-upload a clearer image.";

/// What a modality classifier returns for one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierOutput {
    pub classification: String,
    pub confidence: f32,
    pub risk_level: RiskLevel,
    pub recommendation: String,
    /// Canonical label → aggregated probability.
    pub all_scores: BTreeMap<String, f32>,
    /// Fundus only: DR grade 0–4.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade: Option<u8>,
    /// Fundus only: Σ grade·p.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity_score: Option<f32>,
    /// Set on the error sentinel only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ClassifierOutput {
    pub fn is_error(&self) -> bool {
        self.classification == ERROR_CLASSIFICATION
    }

    /// Placeholder result for an image the router could not place.
    pub fn unidentified() -> Self {
        Self {
            classification: UNIDENTIFIED_CLASSIFICATION.to_string(),
            confidence: 0.0,
            risk_level: RiskLevel::Low,
            recommendation: UNIDENTIFIED_RECOMMENDATION.to_string(),
            all_scores: BTreeMap::new(),
            grade: None,
            severity_score: None,
            error: None,
        }
    }
}

/// A finding not yet attached to a session.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingFinding {
    pub image_type: ImageType,
    pub route: Option<RouteDecision>,
    pub result: ClassifierOutput,
}

impl PendingFinding {
    pub fn new(image_type: ImageType, route: Option<RouteDecision>, result: ClassifierOutput) -> Self {
        Self {
            image_type,
            route,
            result,
        }
    }

    pub fn into_finding(self, index: usize, timestamp: DateTime<Utc>) -> Finding {
        Finding {
            index,
            timestamp,
            image_type: self.image_type,
            route: self.route,
            result: self.result,
        }
    }
}

/// One classifier result recorded in a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// 0-based append order within the session.
    pub index: usize,
    pub timestamp: DateTime<Utc>,
    pub image_type: ImageType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<RouteDecision>,
    #[serde(flatten)]
    pub result: ClassifierOutput,
}

impl Finding {
    pub fn classification(&self) -> &str {
        &self.result.classification
    }

    pub fn risk_level(&self) -> RiskLevel {
        self.result.risk_level
    }
}
