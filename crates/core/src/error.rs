#[derive(Debug, thiserror::Error)]
pub enum WorkstationError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error("store request failed for table {table}: {source}")]
    StoreRequest {
        table: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("store returned {status} for table {table}: {body}")]
    StoreStatus {
        table: String,
        status: u16,
        body: String,
    },
    #[error("failed to decode store response for table {table}: {source}")]
    StoreDecode {
        table: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("store returned no rows for write to table {table}")]
    StoreNoRows { table: String },

    #[error("assistant request failed: {0}")]
    AiRequest(#[source] reqwest::Error),
    #[error("assistant returned {status}: {body}")]
    AiStatus { status: u16, body: String },
    #[error("assistant response was not valid JSON: {0}")]
    AiMalformed(#[source] serde_json::Error),

    #[error("no encounter selected")]
    NoEncounterSelected,
    #[error("no patient selected")]
    NoPatientSelected,
    #[error("encounter {0} not found")]
    EncounterNotFound(uuid::Uuid),

    #[error("failed to write scratchpad file: {0}")]
    ScratchpadWrite(std::io::Error),

    #[error("failed to serialize {what}: {source}")]
    Serialization {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Text(#[from] edw_types::TextError),
}

pub type WsResult<T> = std::result::Result<T, WorkstationError>;
