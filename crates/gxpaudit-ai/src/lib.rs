//! Recovery of structured JSON from free-form LLM output.
//!
//! Raw model text goes through [`extract`], [`sanitize`] and a strict parse
//! with one repair retry ([`orchestrate`]), then is reshaped by the
//! [`normalize`] functions. The [`pipeline`] types tie those steps to a
//! [`TextGenerator`]. HTTP clients live behind the `http` feature.

pub mod error;
pub mod extract;
pub mod generator;
#[cfg(feature = "http")]
pub mod http;
pub mod normalize;
pub mod orchestrate;
pub mod pipeline;
pub mod sanitize;

pub use error::GenerationError;
pub use extract::{Candidate, ExtractionMethod, extract};
pub use generator::{ImagePayload, TextGenerator, Transcriber, transcribe_handwritten};
#[cfg(feature = "http")]
pub use http::{ChatClient, WhisperClient};
pub use normalize::{normalize_analysis, normalize_requirements};
pub use orchestrate::{
    FailureKind, ParseAttempt, ParseFailure, Parsed, PipelineConfig, PipelineResult, orchestrate,
};
pub use pipeline::{ObservationAnalysisPipeline, RequirementsPipeline};
pub use sanitize::{repair, sanitize};
