/// Schema parsing and payload codec errors.
///
/// All of these are raised locally, before anything is submitted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("schema syntax error: {0}")]
    SchemaSyntax(String),

    #[error("type mismatch for field '{field}': {reason}")]
    TypeMismatch { field: String, reason: String },

    #[error("missing payload entry for field '{0}'")]
    MissingField(String),

    #[error("payload entry '{0}' has no matching schema field")]
    UnexpectedField(String),

    #[error("malformed encoding: {0}")]
    MalformedEncoding(String),
}
