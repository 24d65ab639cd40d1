//! Lazy localization for structured catalog packs.
//!
//! Packloc replaces eager full-catalog translation loading with a two-tier
//! scheme: a cheap, pre-baked index of display labels and item/folder titles
//! is applied at boot, and the full per-document translation for a pack is
//! fetched, merged, and cached the first time that pack is actually opened.
//!
//! # Features
//!
//! - **Lazy loading** - fragments are fetched on first access, cached for the
//!   process lifetime
//! - **Single-flight** - concurrent requests for one pack coalesce into one
//!   fetch
//! - **Multi-fragment merge** - translations split across install locations
//!   merge deterministically
//! - **Light indexes** - labels and titles render without loading any pack
//! - **Selective rebuild** - packs waiting on a converter are rebuilt when it
//!   registers, nothing else is touched
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use packloc_core::*;
//! use std::sync::Arc;
//!
//! let config = LoaderConfig::new("fr")
//!     .with_module(TranslationModule::new("pf2e-fr", "fr", "translations"));
//! let catalog = Arc::new(StaticCatalog::new(vec![
//!     PackMetadata::new("pf2e", "spells-srd", "Item"),
//! ]));
//!
//! let loader = PackLoader::new(
//!     config,
//!     Arc::new(LocalTransport::new("data")),
//!     Arc::new(MemorySettings::new()),
//!     catalog,
//! );
//!
//! loader.init().await;
//! loader.ensure_loaded("pf2e.spells-srd").await;
//! assert!(loader.is_translated("pf2e.spells-srd"));
//! ```

pub mod config;
pub mod converters;
pub mod directory;
pub mod error;
pub mod fragments;
pub mod host;
pub mod light;
pub mod loader;
pub mod npc;
pub mod pack;
pub mod record;
pub mod settings;
pub mod transport;

pub use config::{LoaderConfig, TranslationModule};
pub use converters::{ConverterRegistry, mapping_uses_converters};
pub use directory::DirectoryIndex;
pub use error::{PackLocError, Result};
pub use host::{HostCatalog, StaticCatalog};
pub use light::{
    CatalogFolder, IndexEntry, LabelIndex, LightIndexApplier, TitleIndex, TitleIndexEntry,
};
pub use loader::PackLoader;
pub use npc::{NPC_DEPENDENCY_PACKS, NPC_TRANSLATOR_CONVERTERS};
pub use pack::{PackMetadata, TranslatedPack};
pub use record::{Entries, TranslationRecord};
pub use settings::{
    MemorySettings, SETTING_LABELS, SETTING_MAPPING_FILES, SETTING_TITLE_INDEX,
    SETTING_TRANSLATION_FILES, SETTINGS_NAMESPACE, SettingsStore,
};
pub use transport::{FileTransport, LocalTransport, MemoryTransport};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{LoaderConfig, TranslationModule};
    pub use crate::error::{PackLocError, Result};
    pub use crate::host::{HostCatalog, StaticCatalog};
    pub use crate::light::{IndexEntry, LabelIndex, LightIndexApplier, TitleIndex};
    pub use crate::loader::PackLoader;
    pub use crate::pack::{PackMetadata, TranslatedPack};
    pub use crate::record::{Entries, TranslationRecord};
    pub use crate::settings::{MemorySettings, SettingsStore};
    pub use crate::transport::{FileTransport, LocalTransport, MemoryTransport};
}
