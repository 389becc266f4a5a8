use std::sync::Arc;

use tracing::info;

use crate::addons::{ComponentCatalog, PropertyEncoder, SchemaPropertyEncoder};
use crate::{model::Error, synth_config::SynthConfig};

/// Context injected into every build: the component catalog and the property encoder
#[derive(Clone)]
pub struct ContextData {
    pub catalog: ComponentCatalog,
    pub encoder: Arc<dyn PropertyEncoder + Send + Sync>,
}

impl ContextData {
    pub fn new(catalog: ComponentCatalog) -> Self {
        ContextData {
            catalog,
            encoder: Arc::new(SchemaPropertyEncoder),
        }
    }

    pub fn with_encoder(catalog: ComponentCatalog, encoder: Arc<dyn PropertyEncoder + Send + Sync>) -> Self {
        ContextData { catalog, encoder }
    }

    /// Loads the component catalog referenced by the configuration
    pub fn load(config: &SynthConfig) -> Result<Self, Error> {
        let catalog_file = std::fs::File::open(&config.catalog_path)?;
        let catalog: ComponentCatalog = serde_yaml::from_reader(catalog_file)?;
        info!("Loaded {} catalog components from {}", catalog.components.len(), config.catalog_path);
        Ok(ContextData::new(catalog))
    }
}
