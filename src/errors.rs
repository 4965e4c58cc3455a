use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParameterError {
    #[error("Cannot coerce parameter '{key}': {value} is not a base-10 integer")]
    TypeCoercion { key: String, value: String },

    #[error("Malformed parameter spec at '{key}': {reason}")]
    MalformedSpec { key: String, reason: String },

    #[error("Failed to parse parameter document: {0}")]
    DocumentParse(#[from] serde_json::Error),

    #[error("Failed to parse parameter document: {0}")]
    TomlParse(#[from] toml::de::Error),
}

pub type ParameterResult<T> = Result<T, ParameterError>;
