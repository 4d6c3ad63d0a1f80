//! Biome registry: maps [`BiomeId`] to [`BiomeFeatures`] with name-based lookup.

use std::fmt;
use std::sync::Arc;

use hashbrown::HashMap;
use meander_layout::LayoutConfigError;

use crate::features::BiomeFeatures;

/// Unique identifier for a registered biome type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BiomeId(pub u16);

impl fmt::Display for BiomeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "biome#{}", self.0)
    }
}

/// Errors raised while registering biomes or building a window from them.
#[derive(Debug, thiserror::Error)]
pub enum BiomeRegistryError {
    /// A biome with this name is already registered.
    #[error("duplicate biome name: {0}")]
    DuplicateName(String),
    /// The biome's layout config references unknown patterns or has bad ranges.
    #[error("biome {name} has an invalid layout: {source}")]
    InvalidLayout {
        name: String,
        #[source]
        source: LayoutConfigError,
    },
    /// The requested filler biome is not registered.
    #[error("filler biome {0} is not registered")]
    UnknownFiller(BiomeId),
    /// The registry has no biomes.
    #[error("biome registry is empty")]
    Empty,
}

/// Stores all registered biome types with O(1) lookup by ID.
#[derive(Default)]
pub struct BiomeRegistry {
    biomes: Vec<Arc<BiomeFeatures>>,
    name_to_id: HashMap<String, BiomeId>,
}

impl BiomeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a biome type, returning its assigned [`BiomeId`].
    ///
    /// # Errors
    ///
    /// Returns [`BiomeRegistryError::DuplicateName`] if a biome with the same name exists,
    /// or [`BiomeRegistryError::InvalidLayout`] if its layout config fails validation.
    pub fn register(&mut self, features: BiomeFeatures) -> Result<BiomeId, BiomeRegistryError> {
        if self.name_to_id.contains_key(features.name()) {
            return Err(BiomeRegistryError::DuplicateName(
                features.name().to_string(),
            ));
        }
        features
            .layout_config()
            .validate()
            .map_err(|source| BiomeRegistryError::InvalidLayout {
                name: features.name().to_string(),
                source,
            })?;
        let id = BiomeId(self.biomes.len() as u16);
        self.name_to_id.insert(features.name().to_string(), id);
        self.biomes.push(Arc::new(features));
        Ok(id)
    }

    /// Returns the features for the given biome ID.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not issued by this registry.
    pub fn get(&self, id: BiomeId) -> &Arc<BiomeFeatures> {
        &self.biomes[id.0 as usize]
    }

    pub fn try_get(&self, id: BiomeId) -> Option<&Arc<BiomeFeatures>> {
        self.biomes.get(id.0 as usize)
    }

    /// Looks up a biome ID by name.
    pub fn lookup_by_name(&self, name: &str) -> Option<BiomeId> {
        self.name_to_id.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.biomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.biomes.is_empty()
    }

    /// All registered IDs in registration order.
    pub fn ids(&self) -> impl Iterator<Item = BiomeId> + '_ {
        (0..self.biomes.len()).map(|i| BiomeId(i as u16))
    }
}

impl fmt::Debug for BiomeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.biomes.iter().map(|b| b.name()))
            .finish()
    }
}
