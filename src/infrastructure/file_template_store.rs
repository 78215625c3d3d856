// Template store backed by a directory of SVG/HTML files
use crate::application::template_store::{TemplateStore, TemplateStoreError};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;

const EXTENSIONS: [&str; 2] = ["svg", "html"];

#[derive(Debug, Clone)]
pub struct FileTemplateStore {
    dir: PathBuf,
}

impl FileTemplateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn is_valid_name(name: &str) -> bool {
        !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    }
}

#[async_trait]
impl TemplateStore for FileTemplateStore {
    async fn load_template(&self, name: &str) -> Result<String, TemplateStoreError> {
        if !Self::is_valid_name(name) {
            return Err(TemplateStoreError::InvalidName(name.to_string()));
        }

        for extension in EXTENSIONS {
            let path = self.dir.join(format!("{}.{}", name, extension));
            match tokio::fs::read_to_string(&path).await {
                Ok(text) => {
                    tracing::debug!("Loaded template {}", path.display());
                    return Ok(text);
                }
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(source) => {
                    return Err(TemplateStoreError::Io {
                        name: name.to_string(),
                        source,
                    });
                }
            }
        }

        Err(TemplateStoreError::NotFound(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_loads_svg_before_html() {
        let dir = tempfile::tempdir().unwrap();
        let svg = "<svg>{{comfort_percentage}}</svg>";
        std::fs::write(dir.path().join("comfort.svg"), svg).unwrap();
        std::fs::write(dir.path().join("comfort.html"), "<html></html>").unwrap();
        std::fs::write(dir.path().join("trend.html"), "<html>{{trend_dataset}}</html>").unwrap();

        let store = FileTemplateStore::new(dir.path());
        assert_eq!(
            store.load_template("comfort").await.unwrap(),
            "<svg>{{comfort_percentage}}</svg>"
        );
        assert_eq!(
            store.load_template("trend").await.unwrap(),
            "<html>{{trend_dataset}}</html>"
        );
    }

    #[tokio::test]
    async fn test_missing_and_invalid_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTemplateStore::new(dir.path());

        assert!(matches!(
            store.load_template("nope").await,
            Err(TemplateStoreError::NotFound(_))
        ));
        assert!(matches!(
            store.load_template("../etc/passwd").await,
            Err(TemplateStoreError::InvalidName(_))
        ));
    }
}
