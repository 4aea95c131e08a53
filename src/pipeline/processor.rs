//! Screening orchestrator.
//!
//! Drives one image through route → classify → (retrieve + explain), and a
//! session through analyze → append → report. Every stage below is total
//! except session lookup and the empty-session report precondition.

use image::DynamicImage;
use serde::Serialize;

use crate::core_state::CoreState;
use crate::models::{ClassifierOutput, Finding, ImageType, PendingFinding, RouteDecision};
use crate::pipeline::classify::ClassifierRegistry;
use crate::pipeline::report::{Report, ReportError, ReportSynthesizer};
use crate::pipeline::retrieval::{RetrievalEngine, DEFAULT_TOP_K};
use crate::pipeline::routing::ModalityRouter;
use crate::session_store::{SessionError, SessionStore};

pub const UNKNOWN_EXPLANATION: &str =
    "Could not identify image type. Please upload a skin lesion, chest X-ray, or fundus photo.";

#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Report(#[from] ReportError),
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Single-image analysis, not tied to a session.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub image_type: ImageType,
    pub route: RouteDecision,
    /// `None` when the router rejected the image.
    pub result: Option<ClassifierOutput>,
    pub explanation: String,
    pub guidelines: Vec<String>,
}

/// Outcome of analyzing one image inside a session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionAnalysis {
    /// False when the classifier failed and nothing was appended.
    pub recorded: bool,
    pub image_type: ImageType,
    pub route: RouteDecision,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finding: Option<Finding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ---------------------------------------------------------------------------
// Processor
// ---------------------------------------------------------------------------

/// Borrowed view over the pipeline components.
pub struct ScreeningProcessor<'a> {
    router: &'a ModalityRouter,
    classifiers: &'a ClassifierRegistry,
    retrieval: &'a RetrievalEngine,
    synthesizer: &'a ReportSynthesizer,
    sessions: &'a SessionStore,
}

impl<'a> ScreeningProcessor<'a> {
    pub fn new(state: &'a CoreState) -> Self {
        Self {
            router: &state.router,
            classifiers: &state.classifiers,
            retrieval: &state.retrieval,
            synthesizer: &state.synthesizer,
            sessions: &state.sessions,
        }
    }

    /// Route and classify, returning the route and the classifier output when routed.
    fn route_and_classify(
        &self,
        image: &DynamicImage,
        filename: &str,
    ) -> (RouteDecision, Option<ClassifierOutput>) {
        let route = self.router.route(image, filename);
        let result = self
            .classifiers
            .get(route.image_type)
            .map(|classifier| classifier.classify(image));
        (route, result)
    }

    /// Full single-image analysis with explanation and guideline chunks.
    pub fn analyze(&self, image: &DynamicImage, filename: &str) -> Analysis {
        let (route, result) = self.route_and_classify(image, filename);
        let image_type = route.image_type;

        let Some(result) = result else {
            tracing::info!(filename, confidence = route.confidence, "Image not identified");
            return Analysis {
                image_type,
                route,
                result: None,
                explanation: UNKNOWN_EXPLANATION.to_string(),
                guidelines: Vec::new(),
            };
        };

        let explanation = self.synthesizer.explain(image_type, &result);
        let guidelines = self
            .retrieval
            .retrieve(&format!("{} {}", image_type, result.classification), DEFAULT_TOP_K);

        tracing::info!(
            image_type = %image_type,
            classification = %result.classification,
            risk = %result.risk_level,
            guidelines = guidelines.len(),
            "Image analyzed"
        );

        Analysis {
            image_type,
            route,
            result: Some(result),
            explanation,
            guidelines,
        }
    }

    /// Analyze an image and append the finding to `session_id`.
    ///
    /// A rejected image is recorded as an unidentified finding. A classifier
    /// failure is reported back without touching the session.
    pub fn analyze_for_session(
        &self,
        session_id: &str,
        image: &DynamicImage,
        filename: &str,
    ) -> Result<SessionAnalysis, ProcessingError> {
        // Fail on an unknown id before spending inference time.
        self.sessions.get(session_id)?;

        let (route, result) = self.route_and_classify(image, filename);
        let image_type = route.image_type;
        let result = result.unwrap_or_else(ClassifierOutput::unidentified);

        if result.is_error() {
            tracing::warn!(
                session_id,
                image_type = %image_type,
                "Classifier failed, finding not recorded"
            );
            return Ok(SessionAnalysis {
                recorded: false,
                image_type,
                route,
                finding: None,
                error: Some(result.recommendation),
            });
        }

        let finding = self.sessions.append_finding(
            session_id,
            PendingFinding::new(image_type, Some(route.clone()), result),
        )?;

        Ok(SessionAnalysis {
            recorded: true,
            image_type,
            route,
            finding: Some(finding),
            error: None,
        })
    }

    /// Synthesize the session report and store it on the session.
    pub fn report(&self, session_id: &str) -> Result<Report, ProcessingError> {
        let session = self.sessions.get(session_id)?;
        let report = self.synthesizer.synthesize(&session)?;
        self.sessions.set_report(session_id, report.text.clone())?;
        Ok(report)
    }
}
