use chrono::Utc;
use gxpaudit_core::observation::DEFAULT_AUDITOR;
use gxpaudit_core::{
    ComplianceStatus, NewObservation, Observation, ObservationMetadata, ObservationStats,
    ObservationUpdate, Severity,
};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::StoreError;
use crate::ids::{IdAllocator, SequentialIds};

/// Observations held in insertion order.
///
/// Mutating calls take `&mut self`; share a repository across tasks by
/// wrapping it in a lock.
pub struct ObservationRepository {
    observations: Vec<Observation>,
    ids: Box<dyn IdAllocator>,
}

impl ObservationRepository {
    pub fn new(ids: impl IdAllocator + 'static) -> Self {
        Self {
            observations: Vec::new(),
            ids: Box::new(ids),
        }
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Store a new observation, filling defaults for anything not given.
    pub fn create(&mut self, new: NewObservation) -> Observation {
        let NewObservation {
            mut linked_requirements,
            linked_requirement,
            observation_text,
            compliance_status,
            severity,
            category,
            evidence,
            location,
            auditor,
            interviewed,
            image_description,
            audio_transcription,
            handwritten_transcription,
            ai_analysis,
            follow_up,
            tags,
        } = new;

        if linked_requirements.is_empty()
            && let Some(single) = linked_requirement.filter(|v| !v.is_null())
        {
            linked_requirements.push(single);
        }

        let now = Utc::now();
        let observation = Observation {
            id: self.ids.next_id(),
            linked_requirement: linked_requirements.first().cloned(),
            linked_requirements,
            observation_text: observation_text.unwrap_or_default(),
            compliance_status: compliance_status.unwrap_or_default(),
            severity: severity.unwrap_or_default(),
            category: category.unwrap_or_default(),
            evidence,
            metadata: ObservationMetadata {
                location: location.unwrap_or_default(),
                auditor: auditor.unwrap_or_else(|| DEFAULT_AUDITOR.to_string()),
                interviewed: interviewed.unwrap_or_default(),
                image_description: image_description.unwrap_or_default(),
                audio_transcription: audio_transcription.unwrap_or_default(),
                handwritten_transcription: handwritten_transcription.unwrap_or_default(),
                timestamp: now,
                last_updated: now,
            },
            ai_analysis: ai_analysis.unwrap_or_else(|| Value::Object(Map::new())),
            follow_up,
            tags,
        };

        info!(id = %observation.id, "created observation");
        self.observations.push(observation.clone());
        observation
    }

    /// All observations, or only those whose primary linked requirement has
    /// the given id.
    pub fn list(&self, requirement_id: Option<&str>) -> Vec<&Observation> {
        self.observations
            .iter()
            .filter(|o| match requirement_id {
                Some(id) => o.primary_requirement_id() == Some(id),
                None => true,
            })
            .collect()
    }

    pub fn get(&self, id: &str) -> Result<&Observation, StoreError> {
        self.observations
            .iter()
            .find(|o| o.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    /// Apply the fields present in `update` and refresh `last_updated`.
    pub fn update(
        &mut self,
        id: &str,
        update: ObservationUpdate,
    ) -> Result<&Observation, StoreError> {
        let observation = self
            .observations
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        if let Some(text) = update.observation_text {
            observation.observation_text = text;
        }
        if let Some(status) = update.compliance_status {
            observation.compliance_status = status;
        }
        if let Some(severity) = update.severity {
            observation.severity = severity;
        }
        if let Some(evidence) = update.evidence {
            observation.evidence = evidence;
        }
        if let Some(follow_up) = update.follow_up {
            observation.follow_up = follow_up;
        }
        observation.metadata.last_updated = Utc::now();

        debug!(id, "updated observation");
        Ok(observation)
    }

    pub fn delete(&mut self, id: &str) -> Result<Observation, StoreError> {
        let pos = self
            .observations
            .iter()
            .position(|o| o.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        info!(id, "deleted observation");
        Ok(self.observations.remove(pos))
    }

    /// Counts by status and severity. Statuses and severities outside the
    /// known set count toward `total` only.
    pub fn stats(&self) -> ObservationStats {
        let mut stats = ObservationStats {
            total: self.observations.len(),
            ..ObservationStats::default()
        };

        for o in &self.observations {
            match o.compliance_status {
                ComplianceStatus::Compliant => stats.by_status.compliant += 1,
                ComplianceStatus::Gap => stats.by_status.gap += 1,
                ComplianceStatus::NonCompliant => stats.by_status.non_compliant += 1,
                ComplianceStatus::Other(_) => {}
            }
            match o.severity {
                Severity::Critical => stats.by_severity.critical += 1,
                Severity::Major => stats.by_severity.major += 1,
                Severity::Minor => stats.by_severity.minor += 1,
                Severity::Medium | Severity::Other(_) => {}
            }
            stats.total_evidence += o.evidence.len();
        }

        stats
    }
}

impl Default for ObservationRepository {
    fn default() -> Self {
        Self::new(SequentialIds::new())
    }
}
