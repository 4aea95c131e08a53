use crate::models::{ClassifierOutput, Finding, ImageType, Session, TriageLevel};

pub const SYSTEM_PROMPT: &str = "You are a clinical decision support AI for MediVan AI, a mobile health screening platform. Generate professional, evidence-based clinical reports. Be specific, cite findings data, and always include appropriate disclaimers.";

/// One line per finding, fed to the report prompt.
pub fn format_findings(findings: &[Finding]) -> String {
    if findings.is_empty() {
        return "No findings recorded.".to_string();
    }
    findings
        .iter()
        .enumerate()
        .map(|(i, f)| {
            let mut line = format!(
                "[{}] Type: {} | Classification: {} | Confidence: {:.1}% | Risk: {} | Rec: {}",
                i + 1,
                f.image_type,
                f.classification(),
                f.result.confidence * 100.0,
                f.risk_level(),
                f.result.recommendation,
            );
            if let Some(grade) = f.result.grade {
                line.push_str(&format!(" | DR Grade: {grade}"));
            }
            if let Some(severity) = f.result.severity_score {
                line.push_str(&format!(" | Severity: {severity:.2}"));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn report_prompt(session: &Session, triage: TriageLevel) -> String {
    format!(
        r#"Generate a comprehensive patient screening report for a mobile health unit visit.

SESSION DATA:
- Session ID: {id}
- Date: {date}
- Total analyses: {count}
- Overall triage level (computed): {triage}

FINDINGS:
{findings}

REPORT FORMAT (follow exactly):
═══════════════════════════════════════════════
  MEDIVAN AI — PATIENT SCREENING REPORT
  Mobile Health Unit | [Date] | Session: [ID]
═══════════════════════════════════════════════

SCREENING SUMMARY
  - Modalities analyzed and count
  - Overall triage level: {triage}

FINDINGS (for each modality):
  [Number]. [SPECIALTY] — [Body Part/Image Type]
    Classification: [result]
    Confidence: [X]%
    Risk Level: [level]
    Recommendation: [specific clinical action]

HOLISTIC ASSESSMENT
  - Cross-modality pattern synthesis
  - Systemic disease indicators (e.g., DR + hypertension suggesting metabolic syndrome)
  - Notable correlations between findings

PRIORITY REFERRALS
  - Numbered list ordered by urgency
  - Include timeframe for each referral

Use medical terminology appropriately. Be specific about the actual findings — don't generate generic text. Do not write a disclaimer; one is appended automatically."#,
        id = session.id,
        date = session.created_at.to_rfc3339(),
        count = session.findings.len(),
        triage = triage,
        findings = format_findings(&session.findings),
    )
}

pub fn explanation_prompt(image_type: ImageType, result: &ClassifierOutput) -> String {
    format!(
        "In 2-3 clinical sentences, explain this {} finding for a clinician:\n\
         - Classification: {}\n\
         - Confidence: {:.1}%\n\
         - Risk Level: {}\n\
         Include what this means clinically and immediate next steps.",
        image_type.as_str().replace('_', " "),
        result.classification,
        result.confidence * 100.0,
        result.risk_level,
    )
}
