//! Caller-facing pipelines: raw model text in, typed result out.
//!
//! `process` never fails. Unparseable output becomes a degraded result with
//! `error` set, so callers can show a retry prompt without special control
//! flow. Only the generator call made by `generate` / `analyze` can return
//! an error.

use gxpaudit_core::{AnalysisResult, RequirementsResult};
use tracing::{info, warn};

use crate::error::GenerationError;
use crate::generator::{ImagePayload, TextGenerator};
use crate::normalize::{normalize_analysis, normalize_requirements};
use crate::orchestrate::{PipelineConfig, orchestrate};

/// Token budget for a requirements list.
pub const REQUIREMENTS_MAX_TOKENS: u32 = 40_000;
/// Token budget for a text-only observation analysis.
pub const ANALYSIS_MAX_TOKENS: u32 = 2_000;
/// Token budget for an observation analysis over images.
pub const VISION_ANALYSIS_MAX_TOKENS: u32 = 4_000;

const REQUIREMENTS_PARSE_ERROR: &str = "Failed to parse LLM response";
const ANALYSIS_PARSE_ERROR: &str = "Failed to parse AI response";

#[derive(Debug, Clone, Default)]
pub struct RequirementsPipeline {
    config: PipelineConfig,
}

impl RequirementsPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Recover and group a requirements list from raw model text.
    pub fn process(&self, raw: &str) -> RequirementsResult {
        match orchestrate(raw, &self.config) {
            Ok(parsed) => normalize_requirements(parsed.value),
            Err(failure) => {
                warn!(
                    kind = ?failure.kind,
                    cause = failure.cause.as_deref().unwrap_or(""),
                    preview = %failure.preview,
                    "requirements response could not be parsed"
                );
                RequirementsResult::degraded(format!("{REQUIREMENTS_PARSE_ERROR}: {failure}"))
            }
        }
    }

    /// Ask `generator` for requirements and process its answer.
    pub async fn generate<G>(
        &self,
        generator: &G,
        prompt: &str,
    ) -> Result<RequirementsResult, GenerationError>
    where
        G: TextGenerator + ?Sized,
    {
        let raw = generator.complete(prompt, REQUIREMENTS_MAX_TOKENS).await?;
        let result = self.process(&raw);
        if !result.is_degraded() {
            info!(
                total = result.total_requirements,
                categories = result.categories.len(),
                "generated requirements"
            );
        }
        Ok(result)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ObservationAnalysisPipeline {
    config: PipelineConfig,
}

impl ObservationAnalysisPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Recover and default an observation analysis from raw model text.
    pub fn process(&self, raw: &str) -> AnalysisResult {
        match orchestrate(raw, &self.config) {
            Ok(parsed) => normalize_analysis(parsed.value),
            Err(failure) => {
                warn!(
                    kind = ?failure.kind,
                    cause = failure.cause.as_deref().unwrap_or(""),
                    preview = %failure.preview,
                    "analysis response could not be parsed"
                );
                AnalysisResult::degraded(format!("{ANALYSIS_PARSE_ERROR}: {failure}"))
            }
        }
    }

    /// Ask `generator` to analyze an observation and process its answer.
    ///
    /// `images` are base64 strings or `data:` URIs; blank entries are
    /// ignored. With at least one image the vision call is used.
    pub async fn analyze<G>(
        &self,
        generator: &G,
        prompt: &str,
        images: &[String],
    ) -> Result<AnalysisResult, GenerationError>
    where
        G: TextGenerator + ?Sized,
    {
        let images: Vec<ImagePayload> = images
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(ImagePayload::parse)
            .collect();

        let raw = if images.is_empty() {
            generator.complete(prompt, ANALYSIS_MAX_TOKENS).await?
        } else {
            info!(images = images.len(), "analyzing observation with images");
            generator
                .complete_with_images(prompt, &images, VISION_ANALYSIS_MAX_TOKENS)
                .await?
        };

        Ok(self.process(&raw))
    }
}
