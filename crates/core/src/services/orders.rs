//! Order entry from free text.

use crate::audit::AuditLog;
use crate::constants::{tables, DEFAULT_ORDER_NAME, ORDER_STATUS_SENT};
use crate::error::WsResult;
use crate::records::{ActorKind, EventKind, NewOrder, NewPatientEvent, Order};
use crate::store::StoreClient;
use std::sync::Arc;
use uuid::Uuid;

/// The result of parsing a free-text order line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedOrder {
    pub code: Option<String>,
    pub name: String,
}

/// Parses a free-text order line into a code and a name.
///
/// The text splits on the first whitespace run: the first token, uppercased,
/// becomes the order code; the remainder becomes the name, defaulting to
/// `"General Order"` when there is nothing after the code. Blank input parses
/// to `None` and no order is created. Codes are not validated against any
/// registry.
pub fn parse_order_text(text: &str) -> Option<ParsedOrder> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    match trimmed.find(char::is_whitespace) {
        Some(split) => {
            let code = trimmed[..split].to_uppercase();
            let remainder = trimmed[split..].trim_start();
            let name = if remainder.is_empty() {
                DEFAULT_ORDER_NAME.to_string()
            } else {
                remainder.to_string()
            };
            Some(ParsedOrder {
                code: Some(code),
                name,
            })
        }
        None => Some(ParsedOrder {
            code: Some(trimmed.to_uppercase()),
            name: DEFAULT_ORDER_NAME.to_string(),
        }),
    }
}

#[derive(Debug, Clone)]
pub struct OrderService {
    store: Arc<StoreClient>,
    audit: AuditLog,
}

impl OrderService {
    pub fn new(store: Arc<StoreClient>, audit: AuditLog) -> Self {
        Self { store, audit }
    }

    /// Places an order parsed from free text.
    ///
    /// Returns `Ok(None)` without touching the store when the text is blank.
    /// Every placed order carries the fixed status
    /// [`ORDER_STATUS_SENT`](crate::constants::ORDER_STATUS_SENT).
    pub async fn place_from_text(&self, encounter_id: Uuid, text: &str) -> WsResult<Option<Order>> {
        let Some(parsed) = parse_order_text(text) else {
            return Ok(None);
        };

        let row = NewOrder {
            encounter_id,
            code: parsed.code,
            name: parsed.name,
            status: ORDER_STATUS_SENT.to_string(),
        };
        let order: Order = self.store.insert_one(tables::ORDERS, &row).await?;

        self.audit
            .record(
                NewPatientEvent::new(encounter_id, ActorKind::Clinician, EventKind::OrderPlaced)
                    .with_entity("order", order.id)
                    .with_payload(serde_json::json!({
                        "code": order.code,
                        "name": order.name,
                    })),
            )
            .await;

        Ok(Some(order))
    }

    /// Lists an encounter's orders, newest first.
    pub async fn list(&self, encounter_id: Uuid) -> WsResult<Vec<Order>> {
        self.store
            .select(tables::ORDERS, &[("encounter_id", encounter_id.to_string())])
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_and_name_split_on_first_whitespace() {
        let parsed = parse_order_text("IV001 N/S 500ml").expect("should parse");
        assert_eq!(parsed.code.as_deref(), Some("IV001"));
        assert_eq!(parsed.name, "N/S 500ml");
    }

    #[test]
    fn code_is_uppercased() {
        let parsed = parse_order_text("cbc with differential").expect("should parse");
        assert_eq!(parsed.code.as_deref(), Some("CBC"));
        assert_eq!(parsed.name, "with differential");
    }

    #[test]
    fn lone_token_gets_default_name() {
        let parsed = parse_order_text("CBC").expect("should parse");
        assert_eq!(parsed.code.as_deref(), Some("CBC"));
        assert_eq!(parsed.name, "General Order");
    }

    #[test]
    fn blank_input_creates_nothing() {
        assert_eq!(parse_order_text("  "), None);
        assert_eq!(parse_order_text(""), None);
    }

    #[test]
    fn trailing_whitespace_after_code_gets_default_name() {
        let parsed = parse_order_text("XR2   ").expect("should parse");
        assert_eq!(parsed.code.as_deref(), Some("XR2"));
        assert_eq!(parsed.name, "General Order");
    }

    #[test]
    fn remainder_keeps_internal_spacing() {
        let parsed = parse_order_text("IV001  N/S  500ml").expect("should parse");
        assert_eq!(parsed.name, "N/S  500ml");
    }
}
