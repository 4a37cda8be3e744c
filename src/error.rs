use crate::models::Chain;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("`{0}` is not a valid movie theater name")]
    UnknownChain(String),

    #[error("`{location}` is not a valid {chain} location")]
    LocationNotFound { chain: Chain, location: String },

    #[error("invalid date `{0}`, expected a day of month between 1 and 31")]
    InvalidDate(u8),

    #[error("the timetable for day `{0:02}` is not available at this moment")]
    DateUnavailable(u8),

    #[error("cannot fetch {chain} schedule: {reason}")]
    SourceUnavailable { chain: Chain, reason: String },

    #[error("malformed showtime: {0}")]
    MalformedRecord(String),

    #[error("film registry unavailable: {0}")]
    RegistryUnavailable(String),

    #[error("no registry entry for `{0}`")]
    NotFound(String),

    #[error("invalid code table: {0}")]
    CodeTable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn source_unavailable(chain: Chain, reason: impl std::fmt::Display) -> Self {
        Self::SourceUnavailable { chain, reason: reason.to_string() }
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedRecord(reason.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
