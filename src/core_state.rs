//! Process-wide application state shared by every request handler.
//!
//! Built once at startup (outside the async runtime, since the generation
//! client is blocking) and wrapped in `Arc`. Models load lazily on first use
//! unless `warm_up` is called.

use serde::Serialize;
use thiserror::Error;

use crate::config::AppConfig;
use crate::pipeline::classify::ClassifierRegistry;
use crate::pipeline::lifecycle::ResourceReport;
use crate::pipeline::report::{GenerationError, ReportSynthesizer};
use crate::pipeline::retrieval::engine::RetrievalStatus;
use crate::pipeline::retrieval::RetrievalEngine;
use crate::pipeline::routing::ModalityRouter;
use crate::session_store::SessionStore;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Generation client: {0}")]
    Generation(#[from] GenerationError),
}

/// Load status of every model the pipeline depends on.
#[derive(Debug, Clone, Serialize)]
pub struct ModelStatuses {
    pub router: ResourceReport,
    pub classifiers: Vec<ResourceReport>,
    pub retrieval: RetrievalStatus,
    pub generation: &'static str,
}

pub struct CoreState {
    pub config: AppConfig,
    pub router: ModalityRouter,
    pub classifiers: ClassifierRegistry,
    pub retrieval: RetrievalEngine,
    pub synthesizer: ReportSynthesizer,
    pub sessions: SessionStore,
}

impl CoreState {
    pub fn new(
        config: AppConfig,
        router: ModalityRouter,
        classifiers: ClassifierRegistry,
        retrieval: RetrievalEngine,
        synthesizer: ReportSynthesizer,
    ) -> Self {
        Self {
            config,
            router,
            classifiers,
            retrieval,
            synthesizer,
            sessions: SessionStore::new(),
        }
    }

    /// Wire every component from configuration.
    ///
    /// Mock mode swaps in heuristic routing, weighted-random classifiers,
    /// keyword retrieval and template-only reports.
    pub fn from_config(config: AppConfig) -> Result<Self, CoreError> {
        let (router, classifiers) = if config.mock_mode {
            (
                ModalityRouter::mock(config.thresholds),
                ClassifierRegistry::mock(),
            )
        } else {
            (
                ModalityRouter::from_models_dir(&config.models_dir, config.thresholds),
                ClassifierRegistry::from_models_dir(&config.models_dir),
            )
        };
        let retrieval = RetrievalEngine::from_dir(&config.knowledge_dir, &config.models_dir, config.mock_mode);
        let synthesizer = ReportSynthesizer::from_config(&config)?;

        tracing::info!(
            mock_mode = config.mock_mode,
            models_dir = %config.models_dir.display(),
            knowledge_chunks = retrieval.chunk_count(),
            "Core state initialized"
        );

        Ok(Self::new(config, router, classifiers, retrieval, synthesizer))
    }

    /// Load every model now. Failures are recorded in the statuses, never raised.
    pub fn warm_up(&self) {
        self.router.warm_up();
        self.classifiers.warm_up();
        self.retrieval.warm_up();
    }

    pub fn model_statuses(&self) -> ModelStatuses {
        ModelStatuses {
            router: self.router.status(),
            classifiers: self.classifiers.statuses(),
            retrieval: self.retrieval.status(),
            generation: if self.synthesizer.is_generative() {
                "enabled"
            } else {
                "template_only"
            },
        }
    }
}
