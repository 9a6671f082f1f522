use crate::engine::EngineError;
use crate::srs::InitType;

/// The result returned by many methods within the crate
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unrecognized spatial reference initializer `{0}`")]
    UnrecognizedInitializer(String),
    #[error("Unable to create spatial reference from {kind}: {text}")]
    InvalidInitializer {
        kind: InitType,
        text: String,
        #[source]
        source: EngineError,
    },
    #[error("SRS transform not possible from `{from}` to `{to}`")]
    TransformUnavailable { from: String, to: String },
    #[error("Failed to transform a point from `{from}` to `{to}`")]
    TransformFailed {
        from: String,
        to: String,
        #[source]
        source: EngineError,
    },
    #[error("Error when accessing the SQLite database")]
    SQLiteError(#[from] rusqlite::Error),
    #[error("No spatial reference system with srs_id {0}")]
    UnknownSrsId(i64),
    #[error("Spatial reference system {0} has no usable definition")]
    UndefinedSrs(i64),
}
