use std::sync::LazyLock;

use chrono::Utc;
use regex::Regex;
use serde::Serialize;

use super::generation::{
    ChatCompletionClient, GenerationError, GenerationRequest, TextGenerator, EXPLANATION_MAX_TOKENS,
    REPORT_MAX_TOKENS,
};
use super::prompt::{explanation_prompt, report_prompt, SYSTEM_PROMPT};
use super::template::{self, disclaimer_block, session_triage, SECTIONS};
use super::ReportError;
use crate::config::AppConfig;
use crate::models::{ClassifierOutput, ImageType, ReportMode, Session, TriageLevel};

/// One heading pattern per required section, matched at line start.
static SECTION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    SECTIONS
        .iter()
        .map(|heading| Regex::new(&format!(r"(?m)^[\s#*]*{}\b", regex::escape(heading))).unwrap())
        .collect()
});

/// A synthesized session report.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    #[serde(rename = "report")]
    pub text: String,
    pub triage: TriageLevel,
    pub mode: ReportMode,
}

/// Builds session reports and per-finding explanations.
///
/// With a generator configured, output is requested from it first and any
/// failure falls back to the deterministic template. Without one, only the
/// template is used.
pub struct ReportSynthesizer {
    generator: Option<Box<dyn TextGenerator>>,
}

impl ReportSynthesizer {
    pub fn new(generator: Box<dyn TextGenerator>) -> Self {
        Self {
            generator: Some(generator),
        }
    }

    pub fn template_only() -> Self {
        Self { generator: None }
    }

    /// Mock mode is template-only. Otherwise reports go through the configured chat endpoint.
    pub fn from_config(config: &AppConfig) -> Result<Self, GenerationError> {
        if config.mock_mode {
            return Ok(Self::template_only());
        }
        let client = ChatCompletionClient::new(&config.generation)?;
        tracing::info!(
            endpoint = client.base_url(),
            model = client.model(),
            "Report generation enabled"
        );
        Ok(Self::new(Box::new(client)))
    }

    pub fn is_generative(&self) -> bool {
        self.generator.is_some()
    }

    pub fn synthesize(&self, session: &Session) -> Result<Report, ReportError> {
        if session.findings.is_empty() {
            return Err(ReportError::EmptySession(session.id.clone()));
        }

        let triage = session_triage(session);

        if let Some(generator) = &self.generator {
            match self.generate(generator.as_ref(), session, triage) {
                Ok(text) => {
                    tracing::info!(
                        session_id = %session.id,
                        findings = session.findings.len(),
                        triage = %triage,
                        "Generative report produced"
                    );
                    return Ok(Report {
                        text,
                        triage,
                        mode: ReportMode::Generative,
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        session_id = %session.id,
                        error = %e,
                        "Report generation failed, using template"
                    );
                }
            }
        }

        Ok(Report {
            text: template::render(session, triage, Utc::now()),
            triage,
            mode: ReportMode::Template,
        })
    }

    fn generate(
        &self,
        generator: &dyn TextGenerator,
        session: &Session,
        triage: TriageLevel,
    ) -> Result<String, ReportError> {
        let prompt = report_prompt(session, triage);
        let text = generator.generate(&GenerationRequest::new(SYSTEM_PROMPT, &prompt, REPORT_MAX_TOKENS))?;
        let text = text.trim();

        if let Some(missing) = missing_section(text) {
            return Err(ReportError::MissingSection(missing));
        }
        Ok(format!("{text}\n\n{}", disclaimer_block()))
    }

    /// Short clinical explanation of one finding. Falls back to its recommendation.
    pub fn explain(&self, image_type: ImageType, result: &ClassifierOutput) -> String {
        let Some(generator) = &self.generator else {
            return result.recommendation.clone();
        };

        let prompt = explanation_prompt(image_type, result);
        match generator.generate(&GenerationRequest::new(SYSTEM_PROMPT, &prompt, EXPLANATION_MAX_TOKENS)) {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                tracing::warn!(image_type = %image_type, error = %e, "Explanation generation failed");
                result.recommendation.clone()
            }
        }
    }
}

fn missing_section(text: &str) -> Option<&'static str> {
    SECTIONS
        .iter()
        .zip(SECTION_PATTERNS.iter())
        .find(|(_, pattern)| !pattern.is_match(text))
        .map(|(heading, _)| *heading)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::models::{PendingFinding, RiskLevel};
    use crate::pipeline::report::generation::MockTextGenerator;
    use crate::pipeline::report::template::DISCLAIMER;

    const GOOD_REPORT: &str = "MEDIVAN AI — PATIENT SCREENING REPORT\n\nSCREENING SUMMARY\n  1 modality\n\nFINDINGS\n  1. SKIN LESION\n\nHOLISTIC ASSESSMENT\n  Nothing systemic.\n\nPRIORITY REFERRALS\n  1. Dermatology";

    fn session() -> Session {
        let mut session = Session::new("abcd1234".into());
        let mut result = ClassifierOutput::unidentified();
        result.classification = "melanoma".into();
        result.risk_level = RiskLevel::High;
        result.confidence = 0.9;
        session
            .findings
            .push(PendingFinding::new(ImageType::SkinLesion, None, result).into_finding(0, Utc::now()));
        session
    }

    #[test]
    fn empty_session_is_precondition_error() {
        let synth = ReportSynthesizer::template_only();
        let err = synth.synthesize(&Session::new("empty000".into())).unwrap_err();
        assert!(matches!(err, ReportError::EmptySession(id) if id == "empty000"));
    }

    #[test]
    fn template_only_report() {
        let report = ReportSynthesizer::template_only().synthesize(&session()).unwrap();
        assert_eq!(report.mode, ReportMode::Template);
        assert_eq!(report.triage, TriageLevel::High);
        assert!(report.text.contains(DISCLAIMER));
    }

    #[test]
    fn generative_report_gets_disclaimer_appended() {
        let synth = ReportSynthesizer::new(Box::new(MockTextGenerator::new(GOOD_REPORT)));
        let report = synth.synthesize(&session()).unwrap();
        assert_eq!(report.mode, ReportMode::Generative);
        assert_eq!(report.triage, TriageLevel::High);
        assert!(report.text.starts_with("MEDIVAN AI"));
        assert!(report.text.ends_with(&disclaimer_block()));
    }

    #[test]
    fn generation_timeout_falls_back_to_template() {
        let synth = ReportSynthesizer::new(Box::new(MockTextGenerator::failing(
            GenerationError::Timeout(Duration::from_secs(60)),
        )));
        let report = synth.synthesize(&session()).unwrap();
        assert_eq!(report.mode, ReportMode::Template);
        assert_eq!(report.triage, TriageLevel::High);
        for heading in SECTIONS {
            assert!(report.text.contains(heading));
        }
        assert!(report.text.contains(DISCLAIMER));
    }

    #[test]
    fn response_missing_section_falls_back() {
        let synth = ReportSynthesizer::new(Box::new(MockTextGenerator::new(
            "SCREENING SUMMARY\nFINDINGS\nAll fine.",
        )));
        let report = synth.synthesize(&session()).unwrap();
        assert_eq!(report.mode, ReportMode::Template);
    }

    #[test]
    fn markdown_headings_accepted() {
        let text = "## SCREENING SUMMARY\n**FINDINGS**\n### HOLISTIC ASSESSMENT\n## PRIORITY REFERRALS";
        assert_eq!(missing_section(text), None);
        assert_eq!(missing_section("SCREENING SUMMARY only"), Some("FINDINGS"));
    }

    struct Shared(std::sync::Arc<MockTextGenerator>);

    impl TextGenerator for Shared {
        fn generate(&self, request: &GenerationRequest<'_>) -> Result<String, GenerationError> {
            self.0.generate(request)
        }
    }

    #[test]
    fn prompt_carries_triage_and_findings() {
        let mock = std::sync::Arc::new(MockTextGenerator::new(GOOD_REPORT));
        let synth = ReportSynthesizer::new(Box::new(Shared(mock.clone())));
        synth.synthesize(&session()).unwrap();

        let prompts = mock.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Classification: melanoma"));
        assert!(prompts[0].contains("Overall triage level (computed): HIGH"));
    }

    #[test]
    fn explanation_uses_generator_then_recommendation() {
        let result = session().findings[0].result.clone();

        let synth = ReportSynthesizer::new(Box::new(MockTextGenerator::new("  Suspicious lesion.  ")));
        assert_eq!(synth.explain(ImageType::SkinLesion, &result), "Suspicious lesion.");

        let synth = ReportSynthesizer::new(Box::new(MockTextGenerator::disabled()));
        assert_eq!(synth.explain(ImageType::SkinLesion, &result), result.recommendation);

        let synth = ReportSynthesizer::template_only();
        assert_eq!(synth.explain(ImageType::SkinLesion, &result), result.recommendation);
    }
}
