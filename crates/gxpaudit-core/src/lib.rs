pub mod analysis;
pub mod observation;
pub mod requirements;
pub mod value;

pub use analysis::{AnalysisResult, ComplianceStatus, MatchedRequirement, Severity};
pub use observation::{
    NewObservation, Observation, ObservationMetadata, ObservationStats, ObservationUpdate,
    SeverityCounts, StatusCounts,
};
pub use requirements::{CategoryGroup, RequirementRecord, RequirementsResult};
