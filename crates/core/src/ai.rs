//! Client for the hosted AI assistant function.
//!
//! The assistant receives a JSON context assembled from the data already
//! loaded in the workspace (a client-side projection, not a fresh fetch) and
//! returns proposed diagnoses and order recommendations. All clinical
//! reasoning happens on the hosted side; this module only ships the context
//! over and validates the shape of what comes back.

use crate::config::CoreConfig;
use crate::constants::REQUEST_TIMEOUT_SECS;
use crate::error::{WorkstationError, WsResult};
use crate::services::encounters::EncounterData;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Context object sent to the assistant: a projection of the currently
/// loaded notes, orders, results and differential.
#[derive(Debug, Clone, Serialize)]
pub struct AssessmentContext {
    pub notes: Vec<NoteSnapshot>,
    pub orders: Vec<OrderSnapshot>,
    pub observations: Vec<ObservationSnapshot>,
    pub ddx: Vec<DdxSnapshot>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NoteSnapshot {
    pub kind: String,
    pub title: String,
    pub content: String,
    pub occurred_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderSnapshot {
    pub code: Option<String>,
    pub name: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ObservationSnapshot {
    pub category: String,
    pub name: String,
    pub value: String,
    pub unit: Option<String>,
    pub flag: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DdxSnapshot {
    pub source: String,
    pub name: String,
    pub probability: Option<f64>,
    pub reason: Option<String>,
}

impl AssessmentContext {
    /// Builds the context from whatever the workspace has loaded.
    pub fn from_loaded(data: &EncounterData) -> Self {
        Self {
            notes: data
                .notes
                .iter()
                .map(|n| NoteSnapshot {
                    kind: n.kind.clone(),
                    title: n.title.clone(),
                    content: n.content.clone(),
                    occurred_at: n.occurred_at.to_rfc3339(),
                })
                .collect(),
            orders: data
                .orders
                .iter()
                .map(|o| OrderSnapshot {
                    code: o.code.clone(),
                    name: o.name.clone(),
                    status: o.status.clone(),
                })
                .collect(),
            observations: data
                .observations
                .iter()
                .map(|o| ObservationSnapshot {
                    category: o.category.clone(),
                    name: o.name.clone(),
                    value: o.value.clone(),
                    unit: o.unit.clone(),
                    flag: o.flag.clone(),
                })
                .collect(),
            ddx: data
                .ddx
                .iter()
                .map(|d| DdxSnapshot {
                    source: match d.source {
                        crate::records::DdxSource::Human => "human".to_string(),
                        crate::records::DdxSource::Ai => "ai".to_string(),
                    },
                    name: d.name.clone(),
                    probability: d.probability,
                    reason: d.reason.clone(),
                })
                .collect(),
        }
    }
}

/// Parsed assistant output.
///
/// Unknown fields are ignored; missing arrays default to empty so a terse
/// response still parses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AiAssessment {
    #[serde(default)]
    pub diagnoses: Vec<AiDiagnosis>,
    #[serde(default)]
    pub recommendations: Vec<AiRecommendation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiDiagnosis {
    pub name: String,
    #[serde(default)]
    pub prob: Option<f64>,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiRecommendation {
    #[serde(default)]
    pub code: Option<String>,
    pub name: String,
    #[serde(default)]
    pub reason: Option<String>,
}

/// One completed exchange with the assistant, kept for persistence.
#[derive(Debug, Clone)]
pub struct AiExchange {
    /// The full request payload that was sent.
    pub prompt: serde_json::Value,
    /// The raw response body, unmodified.
    pub raw: serde_json::Value,
    /// The response parsed into the expected shape.
    pub assessment: AiAssessment,
}

/// HTTP client for the assistant endpoint.
#[derive(Debug, Clone)]
pub struct AiClient {
    http: reqwest::Client,
    endpoint: String,
    provider: String,
    model: String,
}

impl AiClient {
    pub fn new(cfg: &CoreConfig) -> WsResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(WorkstationError::HttpClient)?;

        Ok(Self {
            http,
            endpoint: cfg.ai_url().to_string(),
            provider: cfg.ai_provider().to_string(),
            model: cfg.ai_model().to_string(),
        })
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Sends the context to the assistant and parses the response.
    ///
    /// Nothing is persisted here; the caller decides what to do with the
    /// exchange. Transport errors, non-2xx statuses and malformed JSON all
    /// surface as errors and the caller must treat the run as having never
    /// happened.
    pub async fn assess(&self, context: &AssessmentContext) -> WsResult<AiExchange> {
        let context_value =
            serde_json::to_value(context).map_err(|e| WorkstationError::Serialization {
                what: "assessment context",
                source: e,
            })?;
        let prompt = serde_json::json!({
            "provider": self.provider,
            "model": self.model,
            "context": context_value,
        });

        let response = self
            .http
            .post(&self.endpoint)
            .json(&prompt)
            .send()
            .await
            .map_err(WorkstationError::AiRequest)?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(WorkstationError::AiRequest)?;

        if !status.is_success() {
            return Err(WorkstationError::AiStatus {
                status: status.as_u16(),
                body,
            });
        }

        let raw: serde_json::Value =
            serde_json::from_str(&body).map_err(WorkstationError::AiMalformed)?;
        let assessment: AiAssessment =
            serde_json::from_value(raw.clone()).map_err(WorkstationError::AiMalformed)?;

        Ok(AiExchange {
            prompt,
            raw,
            assessment,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assessment_parses_full_response() {
        let body = serde_json::json!({
            "diagnoses": [
                {"name": "Acute appendicitis", "prob": 0.6, "reason": "RLQ pain, fever"},
                {"name": "Mesenteric adenitis"}
            ],
            "recommendations": [
                {"code": "CT01", "name": "CT abdomen with contrast", "reason": "confirm"},
                {"name": "Surgical consult"}
            ]
        });

        let assessment: AiAssessment = serde_json::from_value(body).expect("should parse");
        assert_eq!(assessment.diagnoses.len(), 2);
        assert_eq!(assessment.diagnoses[0].prob, Some(0.6));
        assert_eq!(assessment.diagnoses[1].prob, None);
        assert_eq!(assessment.recommendations.len(), 2);
        assert_eq!(assessment.recommendations[0].code.as_deref(), Some("CT01"));
        assert_eq!(assessment.recommendations[1].code, None);
    }

    #[test]
    fn assessment_tolerates_missing_sections() {
        let assessment: AiAssessment =
            serde_json::from_value(serde_json::json!({})).expect("empty object should parse");
        assert!(assessment.diagnoses.is_empty());
        assert!(assessment.recommendations.is_empty());
    }

    #[test]
    fn assessment_rejects_wrong_shapes() {
        let err = serde_json::from_value::<AiAssessment>(serde_json::json!({
            "diagnoses": [{"prob": 0.5}]
        }));
        assert!(err.is_err(), "diagnosis without a name should fail to parse");
    }

    #[test]
    fn context_projects_loaded_data() {
        use crate::records::{DdxEntry, DdxSource, Note};
        use chrono::Utc;
        use uuid::Uuid;

        let now = Utc::now();
        let encounter_id = Uuid::new_v4();
        let data = EncounterData {
            notes: vec![Note {
                id: Uuid::new_v4(),
                encounter_id,
                kind: "triage".into(),
                title: "Arrival".into(),
                content: "Chest pain, 2h".into(),
                occurred_at: now,
                created_at: now,
                updated_at: now,
            }],
            orders: vec![],
            observations: vec![],
            ddx: vec![DdxEntry {
                id: Uuid::new_v4(),
                encounter_id,
                source: DdxSource::Human,
                name: "ACS".into(),
                probability: Some(0.4),
                reason: None,
                created_at: now,
                updated_at: now,
            }],
        };

        let ctx = AssessmentContext::from_loaded(&data);
        assert_eq!(ctx.notes.len(), 1);
        assert_eq!(ctx.notes[0].title, "Arrival");
        assert_eq!(ctx.ddx[0].source, "human");
        assert!(ctx.orders.is_empty());
    }
}
