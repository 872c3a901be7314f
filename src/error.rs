use thiserror::Error;

/// Main error type for the schema export pipeline
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Catalog error: {message}")]
    Catalog { message: String },

    #[error("Database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    #[error("Database error while running `{query}`: {source}")]
    DatabaseQuery {
        query: String,
        #[source]
        source: tokio_postgres::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("SQL parse error: {0}")]
    SqlParse(#[from] sqlparser::parser::ParserError),
}

pub type ExportResult<T> = Result<T, ExportError>;

impl ExportError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration { message: message.into() }
    }

    pub fn catalog(message: impl Into<String>) -> Self {
        Self::Catalog { message: message.into() }
    }

    pub fn query(query: &str, source: tokio_postgres::Error) -> Self {
        Self::DatabaseQuery {
            query: query.trim().to_string(),
            source,
        }
    }
}

impl From<tempfile::PersistError> for ExportError {
    fn from(err: tempfile::PersistError) -> Self {
        Self::Io(err.error)
    }
}
