//! HTTP client for the remote relational store.
//!
//! The store exposes a PostgREST-style interface: one resource path per
//! table, equality filters in the query string, `Prefer: return=representation`
//! on writes. The workstation only ever needs three shapes of call:
//!
//! - select rows filtered by a foreign key, newest first
//! - insert one or many rows
//! - update a single row by id (note editing only)
//!
//! There is no retry or backoff; a failed call is terminal for the user
//! action that triggered it and the caller surfaces the error.

use crate::config::CoreConfig;
use crate::constants::{CREATED_AT_COLUMN, REQUEST_TIMEOUT_SECS};
use crate::error::{WorkstationError, WsResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;

/// Client for the remote relational store.
#[derive(Debug, Clone)]
pub struct StoreClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl StoreClient {
    /// Build a store client from the resolved configuration.
    ///
    /// # Errors
    ///
    /// Returns `WorkstationError::HttpClient` if the underlying HTTP client
    /// cannot be constructed.
    pub fn new(cfg: &CoreConfig) -> WsResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(WorkstationError::HttpClient)?;

        Ok(Self {
            http,
            base_url: cfg.store_url().to_string(),
            api_key: cfg.store_api_key().to_string(),
        })
    }

    /// Select rows from `table`, equality-filtered and ordered by
    /// `created_at` descending.
    ///
    /// `filters` pairs are column name and raw value; the value is wrapped in
    /// the store's `eq.` operator.
    pub async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        filters: &[(&str, String)],
    ) -> WsResult<Vec<T>> {
        let params = select_params(filters);
        let response = self
            .http
            .get(self.table_url(table))
            .query(&params)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| WorkstationError::StoreRequest {
                table: table.to_string(),
                source: e,
            })?;

        self.decode_rows(table, response).await
    }

    /// Insert `body` (a single row object or an array of rows) into `table`
    /// and return the created rows.
    pub async fn insert<B, R>(&self, table: &str, body: &B) -> WsResult<Vec<R>>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .http
            .post(self.table_url(table))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await
            .map_err(|e| WorkstationError::StoreRequest {
                table: table.to_string(),
                source: e,
            })?;

        self.decode_rows(table, response).await
    }

    /// Insert a single row and return its created representation.
    ///
    /// # Errors
    ///
    /// Returns `WorkstationError::StoreNoRows` if the store accepted the
    /// insert but returned an empty representation.
    pub async fn insert_one<B, R>(&self, table: &str, row: &B) -> WsResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let mut rows: Vec<R> = self.insert(table, row).await?;
        if rows.is_empty() {
            return Err(WorkstationError::StoreNoRows {
                table: table.to_string(),
            });
        }
        Ok(rows.remove(0))
    }

    /// Patch the row with the given `id` in `table` and return the updated
    /// representation.
    pub async fn update_one<B, R>(&self, table: &str, id: Uuid, patch: &B) -> WsResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .http
            .patch(self.table_url(table))
            .query(&[("id", format!("eq.{id}"))])
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "return=representation")
            .json(patch)
            .send()
            .await
            .map_err(|e| WorkstationError::StoreRequest {
                table: table.to_string(),
                source: e,
            })?;

        let mut rows: Vec<R> = self.decode_rows(table, response).await?;
        if rows.is_empty() {
            return Err(WorkstationError::StoreNoRows {
                table: table.to_string(),
            });
        }
        Ok(rows.remove(0))
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{}", self.base_url, table)
    }

    async fn decode_rows<T: DeserializeOwned>(
        &self,
        table: &str,
        response: reqwest::Response,
    ) -> WsResult<Vec<T>> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| WorkstationError::StoreRequest {
                table: table.to_string(),
                source: e,
            })?;

        if !status.is_success() {
            return Err(WorkstationError::StoreStatus {
                table: table.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| WorkstationError::StoreDecode {
            table: table.to_string(),
            source: e,
        })
    }
}

/// Build the query parameters for a filtered, newest-first select.
fn select_params(filters: &[(&str, String)]) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = filters
        .iter()
        .map(|(column, value)| ((*column).to_string(), format!("eq.{value}")))
        .collect();
    params.push(("order".to_string(), format!("{CREATED_AT_COLUMN}.desc")));
    params
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_params_wraps_filters_and_appends_order() {
        let id = "0a1b2c".to_string();
        let params = select_params(&[("encounter_id", id)]);
        assert_eq!(
            params,
            vec![
                ("encounter_id".to_string(), "eq.0a1b2c".to_string()),
                ("order".to_string(), "created_at.desc".to_string()),
            ]
        );
    }

    #[test]
    fn select_params_without_filters_still_orders() {
        let params = select_params(&[]);
        assert_eq!(
            params,
            vec![("order".to_string(), "created_at.desc".to_string())]
        );
    }
}
