//! Patient registration and browsing.

use crate::constants::tables;
use crate::error::WsResult;
use crate::records::{NewPatient, Patient, Sex};
use crate::store::StoreClient;
use edw_types::NonEmptyText;
use std::sync::Arc;

/// Pure patient data operations - no API concerns.
#[derive(Debug, Clone)]
pub struct PatientService {
    store: Arc<StoreClient>,
}

impl PatientService {
    pub fn new(store: Arc<StoreClient>) -> Self {
        Self { store }
    }

    /// Registers a new patient.
    ///
    /// Patients exist independently of encounters, so no audit event is
    /// appended here; the trail starts with the first encounter.
    ///
    /// # Errors
    ///
    /// Returns a `WorkstationError` if the store insert fails.
    pub async fn create(
        &self,
        name: NonEmptyText,
        identifier: NonEmptyText,
        sex: Sex,
    ) -> WsResult<Patient> {
        let row = NewPatient {
            name: name.into_inner(),
            identifier: identifier.into_inner(),
            sex,
        };
        self.store.insert_one(tables::PATIENTS, &row).await
    }

    /// Lists all patients, newest first.
    pub async fn list(&self) -> WsResult<Vec<Patient>> {
        self.store.select(tables::PATIENTS, &[]).await
    }
}
