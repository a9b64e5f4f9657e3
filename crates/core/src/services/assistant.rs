//! The AI assistant round trip and suggestion application.

use crate::ai::{AiAssessment, AiClient, AssessmentContext};
use crate::audit::AuditLog;
use crate::constants::{tables, ORDER_STATUS_SENT};
use crate::error::WsResult;
use crate::records::{
    ActorKind, AiRun, AiSuggestion, DdxEntry, DdxSource, EventKind, NewAiRun, NewAiSuggestion,
    NewDdxEntry, NewOrder, NewPatientEvent, Order, SuggestionKind,
};
use crate::store::StoreClient;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

/// A persisted AI run together with its extracted suggestions.
#[derive(Debug, Clone)]
pub struct AiOutcome {
    pub run: AiRun,
    pub suggestions: Vec<AiSuggestion>,
}

#[derive(Debug, Clone)]
pub struct AssistantService {
    store: Arc<StoreClient>,
    audit: AuditLog,
    client: AiClient,
}

impl AssistantService {
    pub fn new(store: Arc<StoreClient>, audit: AuditLog, client: AiClient) -> Self {
        Self {
            store,
            audit,
            client,
        }
    }

    /// Runs the assistant against the supplied context and persists the
    /// outcome.
    ///
    /// The sequence is deliberate:
    ///
    /// 1. Invoke the assistant. Any failure here aborts with nothing
    ///    persisted.
    /// 2. Insert one `ai_runs` row snapshotting prompt and raw response.
    ///    Failure aborts.
    /// 3. Bulk-insert the typed `ai_suggestions`. Failure aborts.
    /// 4. Bulk-insert the proposed diagnoses into `ddx_entries` with source
    ///    `ai`. Failure here is tolerated - the suggestions are already
    ///    saved - and only logged.
    ///
    /// The caller reloads encounter data afterwards to resynchronise.
    pub async fn run_assessment(
        &self,
        encounter_id: Uuid,
        context: &AssessmentContext,
    ) -> WsResult<AiOutcome> {
        let exchange = self.client.assess(context).await?;

        let run: AiRun = self
            .store
            .insert_one(
                tables::AI_RUNS,
                &NewAiRun {
                    encounter_id,
                    provider: self.client.provider().to_string(),
                    model: self.client.model().to_string(),
                    prompt: exchange.prompt,
                    response: exchange.raw,
                },
            )
            .await?;

        let suggestion_rows = suggestion_rows(run.id, encounter_id, &exchange.assessment);
        let suggestions: Vec<AiSuggestion> = if suggestion_rows.is_empty() {
            Vec::new()
        } else {
            self.store
                .insert(tables::AI_SUGGESTIONS, &suggestion_rows)
                .await?
        };

        let ddx_rows = ddx_rows(encounter_id, &exchange.assessment);
        if !ddx_rows.is_empty() {
            if let Err(e) = self
                .store
                .insert::<_, DdxEntry>(tables::DDX_ENTRIES, &ddx_rows)
                .await
            {
                // Suggestions are already saved; losing the ddx mirror is
                // acceptable and the run itself still counts as completed.
                tracing::warn!("ddx fan-out failed for run {}: {}", run.id, e);
            }
        }

        self.audit
            .record(
                NewPatientEvent::new(encounter_id, ActorKind::Ai, EventKind::AiRunCompleted)
                    .with_entity("ai_run", run.id)
                    .with_payload(serde_json::json!({
                        "diagnoses": exchange.assessment.diagnoses.len(),
                        "recommendations": exchange.assessment.recommendations.len(),
                    })),
            )
            .await;

        Ok(AiOutcome { run, suggestions })
    }

    /// Fetches the most recent run for an encounter with its suggestions.
    pub async fn latest(&self, encounter_id: Uuid) -> WsResult<Option<AiOutcome>> {
        let mut runs: Vec<AiRun> = self
            .store
            .select(tables::AI_RUNS, &[("encounter_id", encounter_id.to_string())])
            .await?;
        if runs.is_empty() {
            return Ok(None);
        }
        let run = runs.remove(0);

        let suggestions: Vec<AiSuggestion> = self
            .store
            .select(tables::AI_SUGGESTIONS, &[("ai_run_id", run.id.to_string())])
            .await?;

        Ok(Some(AiOutcome { run, suggestions }))
    }

    /// Turns the selected order-type suggestions into orders.
    ///
    /// Selections pointing at diagnosis suggestions are ignored. With no
    /// order-type selection this is a no-op: no insert, no audit event, and
    /// the caller skips its reload. Each created order is mirrored into the
    /// audit log sequentially, best-effort, with a backlink to the
    /// originating run and suggestion.
    pub async fn apply_order_suggestions(
        &self,
        encounter_id: Uuid,
        suggestions: &[AiSuggestion],
        selected: &HashSet<Uuid>,
    ) -> WsResult<Vec<Order>> {
        let chosen: Vec<&AiSuggestion> = suggestions
            .iter()
            .filter(|s| s.kind == SuggestionKind::Order && selected.contains(&s.id))
            .collect();

        if chosen.is_empty() {
            return Ok(Vec::new());
        }

        let rows: Vec<NewOrder> = chosen
            .iter()
            .map(|s| NewOrder {
                encounter_id,
                code: s.code.clone(),
                name: s.name.clone(),
                status: ORDER_STATUS_SENT.to_string(),
            })
            .collect();

        let orders: Vec<Order> = self.store.insert(tables::ORDERS, &rows).await?;

        for (order, suggestion) in orders.iter().zip(chosen.iter()) {
            self.audit
                .record(
                    NewPatientEvent::new(encounter_id, ActorKind::Clinician, EventKind::AiOrderApplied)
                        .with_entity("order", order.id)
                        .with_payload(serde_json::json!({
                            "ai_run_id": suggestion.ai_run_id,
                            "suggestion_id": suggestion.id,
                        })),
                )
                .await;
        }

        Ok(orders)
    }
}

/// Flattens an assessment into typed suggestion rows: diagnoses first, then
/// order recommendations.
fn suggestion_rows(
    run_id: Uuid,
    encounter_id: Uuid,
    assessment: &AiAssessment,
) -> Vec<NewAiSuggestion> {
    let diagnoses = assessment.diagnoses.iter().map(|d| NewAiSuggestion {
        ai_run_id: run_id,
        encounter_id,
        kind: SuggestionKind::Diagnosis,
        code: None,
        name: d.name.clone(),
        probability: d.prob,
        reason: d.reason.clone(),
    });

    let orders = assessment.recommendations.iter().map(|r| NewAiSuggestion {
        ai_run_id: run_id,
        encounter_id,
        kind: SuggestionKind::Order,
        code: r.code.clone(),
        name: r.name.clone(),
        probability: None,
        reason: r.reason.clone(),
    });

    diagnoses.chain(orders).collect()
}

/// Mirrors the proposed diagnoses into the differential with source `ai`.
fn ddx_rows(encounter_id: Uuid, assessment: &AiAssessment) -> Vec<NewDdxEntry> {
    assessment
        .diagnoses
        .iter()
        .map(|d| NewDdxEntry {
            encounter_id,
            source: DdxSource::Ai,
            name: d.name.clone(),
            probability: d.prob,
            reason: d.reason.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{AiDiagnosis, AiRecommendation};

    fn sample_assessment() -> AiAssessment {
        AiAssessment {
            diagnoses: vec![
                AiDiagnosis {
                    name: "Pulmonary embolism".into(),
                    prob: Some(0.3),
                    reason: Some("pleuritic pain, tachycardia".into()),
                },
                AiDiagnosis {
                    name: "Pneumothorax".into(),
                    prob: None,
                    reason: None,
                },
            ],
            recommendations: vec![AiRecommendation {
                code: Some("CTPA".into()),
                name: "CT pulmonary angiogram".into(),
                reason: Some("rule out PE".into()),
            }],
        }
    }

    #[test]
    fn suggestion_rows_type_diagnoses_and_orders() {
        let run_id = Uuid::new_v4();
        let encounter_id = Uuid::new_v4();
        let rows = suggestion_rows(run_id, encounter_id, &sample_assessment());

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].kind, SuggestionKind::Diagnosis);
        assert_eq!(rows[0].name, "Pulmonary embolism");
        assert_eq!(rows[0].probability, Some(0.3));
        assert_eq!(rows[1].kind, SuggestionKind::Diagnosis);
        assert_eq!(rows[2].kind, SuggestionKind::Order);
        assert_eq!(rows[2].code.as_deref(), Some("CTPA"));
        assert!(rows.iter().all(|r| r.ai_run_id == run_id));
    }

    #[test]
    fn ddx_rows_cover_only_diagnoses_with_ai_source() {
        let encounter_id = Uuid::new_v4();
        let rows = ddx_rows(encounter_id, &sample_assessment());

        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.source == DdxSource::Ai));
        assert!(rows.iter().all(|r| r.encounter_id == encounter_id));
    }

    #[test]
    fn empty_assessment_produces_no_rows() {
        let rows = suggestion_rows(Uuid::new_v4(), Uuid::new_v4(), &AiAssessment::default());
        assert!(rows.is_empty());
        assert!(ddx_rows(Uuid::new_v4(), &AiAssessment::default()).is_empty());
    }
}
