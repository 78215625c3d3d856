// Template storage port
use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum TemplateStoreError {
    #[error("invalid template name '{0}'")]
    InvalidName(String),
    #[error("template '{0}' not found")]
    NotFound(String),
    #[error("failed to read template '{name}': {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// Raw template text with `{{placeholder}}` tokens, loaded fresh per call
    async fn load_template(&self, name: &str) -> Result<String, TemplateStoreError>;
}
