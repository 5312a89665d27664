use anyhow::Result;
use odisea_game::{
    CardCatalog, CatalogData, CatalogLoader, GameEngine, RulesConfig, StaticCatalogLoader,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Reads a catalog document from disk.
#[derive(Debug, Clone)]
pub struct FileCatalogLoader {
    path: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum FileCatalogError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl FileCatalogLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CatalogLoader for FileCatalogLoader {
    type Error = FileCatalogError;

    fn load_catalog(&self) -> Result<CatalogData, Self::Error> {
        let path = self.path.display().to_string();
        let raw = std::fs::read_to_string(&self.path).map_err(|source| FileCatalogError::Io {
            path: path.clone(),
            source,
        })?;
        CatalogData::from_json(&raw).map_err(|source| FileCatalogError::Parse { path, source })
    }
}

/// Shared card data for every scenario run.
#[derive(Debug, Clone)]
pub struct TesterAssets {
    pub catalog: Arc<CardCatalog>,
}

impl TesterAssets {
    /// Load the bundled catalog, or the one at `path` when given.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be read or indexed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let catalog = match path {
            Some(path) => {
                GameEngine::new(FileCatalogLoader::new(path), RulesConfig::default())
                    .load_catalog()?
            }
            None => GameEngine::new(StaticCatalogLoader, RulesConfig::default()).load_catalog()?,
        };
        log::debug!("tester catalog holds {} cards", catalog.len());
        Ok(Self {
            catalog: Arc::new(catalog),
        })
    }
}

pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}
