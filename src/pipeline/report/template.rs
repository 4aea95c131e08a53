//! Deterministic report layout used when generation is unavailable.

use chrono::{DateTime, Utc};

use super::correlation::cross_modality_notes;
use super::referrals::render_referrals;
use crate::models::{Finding, ImageType, Session, TriageLevel};

pub const RULE: &str = "═══════════════════════════════════════════════";
pub const TITLE: &str = "MEDIVAN AI — PATIENT SCREENING REPORT";

/// Section headings every report carries, in order.
pub const SECTIONS: [&str; 4] = [
    "SCREENING SUMMARY",
    "FINDINGS",
    "HOLISTIC ASSESSMENT",
    "PRIORITY REFERRALS",
];

pub const DISCLAIMER: &str = "DISCLAIMER: MediVan AI is an AI-assisted screening tool for research/demonstration purposes. This does NOT constitute a medical diagnosis. All findings require confirmation by a licensed physician. Clinical management decisions must be based on comprehensive evaluation by qualified healthcare providers.";

/// One triage level per session: the worst finding risk, `LOW` when empty.
pub fn session_triage(session: &Session) -> TriageLevel {
    session
        .worst_risk()
        .map(TriageLevel::from_risk)
        .unwrap_or(TriageLevel::Low)
}

pub fn disclaimer_block() -> String {
    format!("{RULE}\n{DISCLAIMER}\n{RULE}")
}

/// "skin_lesion" → "Skin Lesion"
fn title_case(image_type: ImageType) -> String {
    image_type
        .as_str()
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn render_finding(number: usize, finding: &Finding) -> String {
    format!(
        "  {number}. {heading}\n    Classification: {classification}\n    Confidence: {confidence:.1}%\n    Risk Level: {risk}\n    Recommendation: {recommendation}",
        heading = finding.image_type.heading(),
        classification = finding.classification(),
        confidence = finding.result.confidence * 100.0,
        risk = finding.risk_level().as_str().to_uppercase(),
        recommendation = finding.result.recommendation,
    )
}

pub fn render(session: &Session, triage: TriageLevel, now: DateTime<Utc>) -> String {
    let modalities = session.modalities();
    let modalities = if modalities.is_empty() {
        "None".to_string()
    } else {
        modalities
            .into_iter()
            .map(title_case)
            .collect::<Vec<_>>()
            .join(", ")
    };

    let findings = if session.findings.is_empty() {
        "  No findings recorded.".to_string()
    } else {
        session
            .findings
            .iter()
            .enumerate()
            .map(|(i, f)| render_finding(i + 1, f))
            .collect::<Vec<_>>()
            .join("\n\n")
    };

    let notes = cross_modality_notes(&session.findings).join(" ");

    format!(
        "{RULE}\n  {TITLE}\n  Mobile Health Unit | {date}\n  Session: {id}\n{RULE}\n\n\
         SCREENING SUMMARY\n  Modalities: {modalities}\n  Analyses performed: {count}\n  Overall Triage: {triage}\n\n\
         FINDINGS\n{findings}\n\n\
         HOLISTIC ASSESSMENT\n  {notes}\n\n\
         PRIORITY REFERRALS\n{referrals}\n\n\
         {disclaimer}",
        date = now.format("%B %d, %Y %H:%M UTC"),
        id = session.id,
        count = session.findings.len(),
        triage = triage.summary(),
        referrals = render_referrals(&session.findings),
        disclaimer = disclaimer_block(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClassifierOutput, PendingFinding, RiskLevel};
    use chrono::TimeZone;

    fn session_with(findings: &[(ImageType, &str, RiskLevel, f32)]) -> Session {
        let mut session = Session::new("abcd1234".into());
        for (i, (ty, cls, risk, conf)) in findings.iter().enumerate() {
            let mut result = ClassifierOutput::unidentified();
            result.classification = cls.to_string();
            result.risk_level = *risk;
            result.confidence = *conf;
            result.recommendation = "Follow up.".into();
            session
                .findings
                .push(PendingFinding::new(*ty, None, result).into_finding(i, Utc::now()));
        }
        session
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 4, 9, 30, 0).unwrap()
    }

    #[test]
    fn triage_levels() {
        let low = session_with(&[(ImageType::Fundus, "No_DR", RiskLevel::Low, 0.9)]);
        let moderate = session_with(&[
            (ImageType::Fundus, "No_DR", RiskLevel::Low, 0.9),
            (ImageType::ChestXray, "cardiomegaly", RiskLevel::Moderate, 0.8),
        ]);
        let high = session_with(&[
            (ImageType::ChestXray, "cardiomegaly", RiskLevel::Moderate, 0.8),
            (ImageType::SkinLesion, "melanoma", RiskLevel::High, 0.7),
        ]);
        assert_eq!(session_triage(&low), TriageLevel::Low);
        assert_eq!(session_triage(&moderate), TriageLevel::Moderate);
        assert_eq!(session_triage(&high), TriageLevel::High);
        assert_eq!(session_triage(&Session::new("empty000".into())), TriageLevel::Low);
    }

    #[test]
    fn layout_has_all_sections_in_order() {
        let session = session_with(&[(ImageType::SkinLesion, "melanoma", RiskLevel::High, 0.8734)]);
        let text = render(&session, session_triage(&session), fixed_now());

        let mut cursor = 0;
        for heading in SECTIONS {
            let at = text[cursor..].find(heading).unwrap();
            cursor += at + heading.len();
        }
        assert!(text.contains("Mobile Health Unit | March 04, 2025 09:30 UTC"));
        assert!(text.contains("Session: abcd1234"));
        assert!(text.contains("Modalities: Skin Lesion"));
        assert!(text.contains("Overall Triage: HIGH — Immediate referral recommended"));
        assert!(text.contains("  1. SKIN LESION"));
        assert!(text.contains("Confidence: 87.3%"));
        assert!(text.contains("Risk Level: HIGH"));
        assert!(text.ends_with(&disclaimer_block()));
    }

    #[test]
    fn empty_session_renders_placeholders() {
        let session = Session::new("empty000".into());
        let text = render(&session, TriageLevel::Low, fixed_now());
        assert!(text.contains("Modalities: None"));
        assert!(text.contains("No findings recorded."));
        assert!(text.contains("No urgent referrals indicated."));
        assert!(text.contains(DISCLAIMER));
    }

    #[test]
    fn title_case_modality() {
        assert_eq!(title_case(ImageType::ChestXray), "Chest Xray");
    }
}
