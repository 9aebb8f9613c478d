#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// Unbalanced grouping. The only failure the parser reports.
    #[error("could not parse this search: {message} (near byte {position})")]
    Syntax { message: String, position: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corpus error: {0}")]
    Corpus(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),
}

impl SearchError {
    pub fn syntax(message: impl Into<String>, position: usize) -> Self {
        SearchError::Syntax {
            message: message.into(),
            position,
        }
    }

    pub fn is_syntax(&self) -> bool {
        matches!(self, SearchError::Syntax { .. })
    }
}

pub type Result<T> = std::result::Result<T, SearchError>;
