use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{Finding, ImageType, RiskLevel};

/// A patient screening session: an append-only list of findings plus the latest report.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub findings: Vec<Finding>,
    pub report: Option<String>,
    #[serde(skip)]
    pub last_activity: Instant,
}

impl Session {
    pub fn new(id: String) -> Self {
        Self {
            id,
            created_at: Utc::now(),
            findings: Vec::new(),
            report: None,
            last_activity: Instant::now(),
        }
    }

    /// Known modalities present in the session, deduplicated in first-appearance order.
    pub fn modalities(&self) -> Vec<ImageType> {
        let mut seen = Vec::new();
        for finding in &self.findings {
            if finding.image_type != ImageType::Unknown && !seen.contains(&finding.image_type) {
                seen.push(finding.image_type);
            }
        }
        seen
    }

    /// Worst risk tier across all findings.
    pub fn worst_risk(&self) -> Option<RiskLevel> {
        self.findings.iter().map(Finding::risk_level).max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClassifierOutput, PendingFinding};

    fn finding(image_type: ImageType, risk: RiskLevel, index: usize) -> Finding {
        let mut result = ClassifierOutput::unidentified();
        result.classification = "x".into();
        result.risk_level = risk;
        PendingFinding::new(image_type, None, result).into_finding(index, Utc::now())
    }

    #[test]
    fn new_session_is_empty() {
        let s = Session::new("abcd1234".into());
        assert!(s.findings.is_empty());
        assert!(s.report.is_none());
        assert!(s.worst_risk().is_none());
    }

    #[test]
    fn modalities_unique_in_first_appearance_order() {
        let mut s = Session::new("abcd1234".into());
        s.findings = vec![
            finding(ImageType::Fundus, RiskLevel::Low, 0),
            finding(ImageType::Unknown, RiskLevel::Low, 1),
            finding(ImageType::SkinLesion, RiskLevel::High, 2),
            finding(ImageType::Fundus, RiskLevel::Moderate, 3),
        ];
        assert_eq!(
            s.modalities(),
            vec![ImageType::Fundus, ImageType::SkinLesion]
        );
        assert_eq!(s.worst_risk(), Some(RiskLevel::High));
    }

    #[test]
    fn last_activity_not_serialized() {
        let json = serde_json::to_value(Session::new("abcd1234".into())).unwrap();
        assert!(json.get("last_activity").is_none());
        assert_eq!(json["id"], "abcd1234");
    }
}
