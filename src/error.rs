use crate::{lexer, parser};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("lex error at {0}")]
    Lex(#[from] lexer::Error),

    #[error("parse error at {0}")]
    Parse(#[from] parser::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid convention for {fields:?}: {message}")]
    Convention { fields: Vec<String>, message: String },

    #[error("samples were keyed by `{sampled}`, but the pipeline keys lists by `{configured}`")]
    KeyFieldMismatch { configured: String, sampled: String },
}
