//! Lazy pack-translation loading and caching.
//!
//! [`PackLoader`] owns every piece of shared mutable state: the installed
//! pack map, the flat translations list, the missing-converter map, and the
//! in-flight markers. Other components read through its accessors; nothing
//! mutates the cache directly.
//!
//! Concurrency rests on the single-flight pattern: the in-flight marker for
//! a pack is registered synchronously, with no suspension point between the
//! cache check and the insert, so two near-simultaneous callers can never
//! both start a fetch for the same pack.

use futures::future::BoxFuture;
use parking_lot::{Mutex, RwLock};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{OnceCell, broadcast};
use tracing::{debug, info};

use crate::config::LoaderConfig;
use crate::converters::{ConverterRegistry, mapping_uses_converters};
use crate::directory::DirectoryIndex;
use crate::error::Result;
use crate::fragments;
use crate::host::HostCatalog;
use crate::light::{
    CatalogFolder, IndexEntry, LabelIndex, LightIndexApplier, TitleIndex, merge_label_overlay,
    merge_title_overlay,
};
use crate::npc::{NPC_DEPENDENCY_PACKS, NPC_TRANSLATOR_CONVERTERS};
use crate::pack::{PackMetadata, TranslatedPack};
use crate::record::{Entries, TranslationRecord};
use crate::settings::{SETTING_LABELS, SETTING_TITLE_INDEX, SETTINGS_NAMESPACE, SettingsStore};
use crate::transport::FileTransport;

/// File-name suffix of fragments that translate compendium folder trees
/// rather than a single pack.
const PACK_FOLDER_SUFFIX: &str = "_packs-folders";

/// The lazy pack-translation coordinator.
///
/// Cheap to clone; clones share all state.
#[derive(Clone)]
pub struct PackLoader {
    inner: Arc<Inner>,
}

struct Inner {
    config: LoaderConfig,
    transport: Arc<dyn FileTransport>,
    settings: Arc<dyn SettingsStore>,
    catalog: Arc<dyn HostCatalog>,
    registry: ConverterRegistry,
    directory: DirectoryIndex,
    /// Pack id to fragment URLs, built lazily from the directory index.
    pack_urls: OnceCell<HashMap<String, Vec<String>>>,
    global_mappings: OnceCell<()>,
    state: RwLock<LoaderState>,
    /// In-flight markers. Must only be locked synchronously.
    loading: Mutex<HashMap<String, broadcast::Sender<()>>>,
    npc: Mutex<NpcPreload>,
}

#[derive(Default)]
struct LoaderState {
    packs: HashMap<String, TranslatedPack>,
    translations: Vec<(String, Arc<TranslationRecord>)>,
    missing_converters: HashMap<String, HashSet<String>>,
    light: LightIndexApplier,
}

enum NpcPreload {
    Idle,
    Loading(broadcast::Sender<()>),
    Done,
}

impl PackLoader {
    /// Create a loader over the given seams.
    pub fn new(
        config: LoaderConfig,
        transport: Arc<dyn FileTransport>,
        settings: Arc<dyn SettingsStore>,
        catalog: Arc<dyn HostCatalog>,
    ) -> Self {
        let directory = DirectoryIndex::new(config.clone(), transport.clone(), settings.clone());
        Self {
            inner: Arc::new(Inner {
                config,
                transport,
                settings,
                catalog,
                registry: ConverterRegistry::new(),
                directory,
                pack_urls: OnceCell::new(),
                global_mappings: OnceCell::new(),
                state: RwLock::new(LoaderState::default()),
                loading: Mutex::new(HashMap::new()),
                npc: Mutex::new(NpcPreload::Idle),
            }),
        }
    }

    /// Boot sequence: register discovered global mappings, build the fragment
    /// URL index, load folder-translation packs, then load the light label
    /// and title indexes.
    ///
    /// Re-running refreshes the light indexes wholesale.
    pub async fn init(&self) {
        self.load_global_mappings().await;
        self.pack_url_index().await;
        self.load_folder_packs().await;

        let labels = self.load_labels().await;
        let titles = self.load_title_index().await;
        let mut state = self.inner.state.write();
        state.light = LightIndexApplier::new(labels, titles);
        info!(
            labels = state.light.labels().len(),
            packs = state.light.titles().len(),
            "light indexes loaded"
        );
    }

    /// Load and install the translation for one pack, if any exists.
    ///
    /// Idempotent and infallible: a pack that still is not translated after
    /// this resolves is a normal outcome, not an error. Concurrent calls for
    /// the same pack coalesce into a single fragment fetch.
    pub async fn ensure_loaded(&self, pack_id: &str) {
        let mut visited = HashSet::new();
        self.ensure_loaded_guarded(pack_id.to_string(), &mut visited)
            .await;
    }

    /// Whether a translation record has been installed for this pack.
    pub fn is_translated(&self, pack_id: &str) -> bool {
        self.inner.state.read().packs.contains_key(pack_id)
    }

    /// The installed artifact for a pack.
    pub fn pack(&self, pack_id: &str) -> Option<TranslatedPack> {
        self.inner.state.read().packs.get(pack_id).cloned()
    }

    /// The installed translation record for a pack.
    pub fn record(&self, pack_id: &str) -> Option<Arc<TranslationRecord>> {
        self.inner
            .state
            .read()
            .packs
            .get(pack_id)
            .map(|pack| pack.record.clone())
    }

    /// The flat translations list, keyed by collection id.
    pub fn translations(&self) -> Vec<(String, Arc<TranslationRecord>)> {
        self.inner.state.read().translations.clone()
    }

    /// Converter names a pack's effective mapping needs but that were not
    /// registered when it was installed.
    pub fn missing_converters(&self, pack_id: &str) -> Option<HashSet<String>> {
        self.inner
            .state
            .read()
            .missing_converters
            .get(pack_id)
            .cloned()
    }

    /// Snapshot of the loaded light indexes.
    pub fn light_index(&self) -> LightIndexApplier {
        self.inner.state.read().light.clone()
    }

    /// Rewrite catalog labels from the loaded label index.
    pub fn apply_labels(&self, packs: &mut [PackMetadata]) {
        self.inner.state.read().light.apply_labels(packs);
    }

    /// Translate a catalog's lightweight index rows from the title index.
    pub fn translate_index(&self, pack_id: &str, entries: &mut [IndexEntry]) {
        self.inner.state.read().light.translate_index(pack_id, entries);
    }

    /// Translate keyed index rows from the title index.
    pub fn translate_keyed_index(&self, pack_id: &str, entries: &mut [(String, IndexEntry)]) {
        self.inner
            .state
            .read()
            .light
            .translate_keyed_index(pack_id, entries);
    }

    /// Rewrite catalog folder names from the title index.
    pub fn translate_folders(&self, pack_id: &str, folders: &mut [CatalogFolder]) {
        self.inner
            .state
            .read()
            .light
            .translate_folders(pack_id, folders);
    }

    /// Record converter names as available and rebuild the packs whose
    /// missing set intersects them.
    ///
    /// The rebuild runs on a spawned task; registration itself never blocks
    /// on it and rebuild failures cannot reach this call site.
    pub fn register_converters<I, S>(&self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            return;
        }
        self.inner.registry.register_converters(names.iter().cloned());

        let loader = self.clone();
        tokio::spawn(async move { loader.rebuild_for_converters(&names) });
    }

    /// Register default mappings keyed by document kind and rebuild the
    /// loaded packs of those kinds. Same task-submission shape as
    /// [`PackLoader::register_converters`].
    pub fn register_mapping(&self, mappings: Map<String, Value>) {
        let kinds = self.inner.registry.register_mapping(mappings);
        if kinds.is_empty() {
            return;
        }

        let loader = self.clone();
        tokio::spawn(async move { loader.rebuild_for_mapping(&kinds) });
    }

    /// Rebuild the cached packs whose recorded missing-converter set
    /// intersects `names`, from their already-fetched records. No re-fetch.
    pub fn rebuild_for_converters(&self, names: &[String]) {
        if names.is_empty() {
            return;
        }
        let targets: Vec<(String, PackMetadata, Arc<TranslationRecord>)> = {
            let state = self.inner.state.read();
            state
                .missing_converters
                .iter()
                .filter(|(_, missing)| missing.iter().any(|name| names.contains(name)))
                .filter_map(|(pack_id, _)| self.rebuild_target(&state, pack_id))
                .collect()
        };

        for (pack_id, metadata, record) in targets {
            debug!(pack = %pack_id, "rebuilding pack after converter registration");
            self.install_pack(metadata, record);
        }
    }

    /// Rebuild the loaded packs whose document kind is among `kinds`, from
    /// their already-fetched records.
    pub fn rebuild_for_mapping(&self, kinds: &[String]) {
        if kinds.is_empty() {
            return;
        }
        let targets: Vec<(String, PackMetadata, Arc<TranslationRecord>)> = {
            let state = self.inner.state.read();
            state
                .packs
                .keys()
                .filter_map(|pack_id| {
                    let target = self.rebuild_target(&state, pack_id)?;
                    kinds.contains(&target.1.kind).then_some(target)
                })
                .collect()
        };

        for (pack_id, metadata, record) in targets {
            debug!(pack = %pack_id, "rebuilding pack after mapping registration");
            self.install_pack(metadata, record);
        }
    }

    /// Persist the loaded label index through the settings store.
    pub async fn share_labels(&self) -> Result<()> {
        let labels = self.load_labels().await;
        self.inner
            .settings
            .set(SETTINGS_NAMESPACE, SETTING_LABELS, serde_json::to_value(&labels)?)
            .await?;
        self.inner.state.write().light.set_labels(labels);
        Ok(())
    }

    /// Persist the loaded title index through the settings store.
    pub async fn share_title_index(&self) -> Result<()> {
        let titles = self.load_title_index().await;
        self.inner
            .settings
            .set(
                SETTINGS_NAMESPACE,
                SETTING_TITLE_INDEX,
                serde_json::to_value(&titles)?,
            )
            .await?;
        self.inner.state.write().light.set_titles(titles);
        Ok(())
    }

    fn ensure_loaded_guarded<'a>(
        &'a self,
        pack_id: String,
        visited: &'a mut HashSet<String>,
    ) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            if pack_id.is_empty() {
                return;
            }
            if self.is_translated(&pack_id) {
                return;
            }
            // Cycle guard: one walk never re-enters a pack it already
            // touched, even through reference chains.
            if !visited.insert(pack_id.clone()) {
                debug!(pack = %pack_id, "reference cycle short-circuited");
                return;
            }

            // Single flight: the cache re-check and the marker registration
            // share one synchronous lock, so there is no window in which two
            // callers both observe "not loading".
            let waiter = {
                let mut loading = self.inner.loading.lock();
                if self.is_translated(&pack_id) {
                    return;
                }
                match loading.get(&pack_id) {
                    Some(flight) => Some(flight.subscribe()),
                    None => {
                        let (flight, _) = broadcast::channel(1);
                        loading.insert(pack_id.clone(), flight);
                        None
                    }
                }
            };
            if let Some(mut waiting) = waiter {
                // Woken when the owning flight drops its sender.
                let _ = waiting.recv().await;
                return;
            }

            self.load_pack(&pack_id, visited).await;
            self.inner.loading.lock().remove(&pack_id);
        })
    }

    async fn load_pack(&self, pack_id: &str, visited: &mut HashSet<String>) {
        let urls = self.fragment_urls(pack_id).await;
        if urls.is_empty() {
            debug!(pack = %pack_id, "no translation fragments for pack");
            return;
        }

        let Some(record) =
            fragments::load_and_merge(self.inner.transport.as_ref(), &urls).await
        else {
            debug!(pack = %pack_id, "no fragment parsed for pack");
            return;
        };

        let Some(metadata) = self.pack_metadata(pack_id) else {
            debug!(pack = %pack_id, "no catalog metadata for pack");
            return;
        };

        let needs_npc_deps = record
            .mapping
            .as_ref()
            .is_some_and(|mapping| mapping_uses_converters(mapping, &NPC_TRANSLATOR_CONVERTERS));
        if needs_npc_deps && self.npc_preload_pending() {
            self.ensure_npc_dependencies(pack_id, visited).await;
        }

        let record = Arc::new(record);
        self.install_pack(metadata, record.clone());
        info!(pack = %pack_id, entries = record.entries.as_ref().map_or(0, Entries::len), "pack translation installed");

        for reference in record.reference.clone() {
            self.ensure_loaded_guarded(reference, visited).await;
        }
    }

    /// Install (or replace) the artifact for a pack: track missing
    /// converters against the effective mapping, update the pack map and the
    /// flat translations list, and materialize derived item packs for
    /// adventure bundles.
    fn install_pack(&self, metadata: PackMetadata, record: Arc<TranslationRecord>) {
        let effective = self.inner.registry.effective_mapping(&metadata.kind, &record);
        let missing = self.inner.registry.collect_missing(&effective);
        let collection = metadata.collection();

        let mut state = self.inner.state.write();
        if missing.is_empty() {
            state.missing_converters.remove(&collection);
        } else {
            debug!(pack = %collection, ?missing, "pack installed with unregistered converters");
            state
                .missing_converters
                .insert(collection.clone(), missing);
        }

        state
            .packs
            .insert(collection.clone(), TranslatedPack::new(metadata.clone(), record.clone()));

        match state
            .translations
            .iter_mut()
            .find(|(existing, _)| existing == &collection)
        {
            Some(slot) => slot.1 = record.clone(),
            None => state.translations.push((collection.clone(), record.clone())),
        }

        if metadata.kind == "Adventure" {
            if let Some(entries) = record.entries.as_ref() {
                let adventures: Vec<&Value> = match entries {
                    Entries::List(rows) => rows.iter().collect(),
                    Entries::Map(map) => map.values().collect(),
                };
                let items_mapping = record
                    .mapping
                    .as_ref()
                    .and_then(|mapping| mapping.get("items"))
                    .and_then(Value::as_object)
                    .cloned()
                    .unwrap_or_default();

                for adventure in adventures {
                    let items = adventure
                        .get("items")
                        .cloned()
                        .unwrap_or_else(|| Value::Object(Map::new()));
                    let derived = TranslationRecord {
                        mapping: Some(items_mapping.clone()),
                        entries: serde_json::from_value(items).ok(),
                        ..Default::default()
                    };
                    let derived_metadata = PackMetadata::new(
                        metadata.namespace.clone(),
                        format!("{}-items", metadata.name),
                        "Item",
                    )
                    .with_label(metadata.label.clone());
                    state.packs.insert(
                        format!("{collection}-items"),
                        TranslatedPack::new(derived_metadata, Arc::new(derived)),
                    );
                }
            }
        }
    }

    fn npc_preload_pending(&self) -> bool {
        matches!(*self.inner.npc.lock(), NpcPreload::Idle)
    }

    /// Preload the foundational packs, once per process. Same flight pattern
    /// as per-pack loading, keyed globally.
    async fn ensure_npc_dependencies(&self, current_pack: &str, visited: &mut HashSet<String>) {
        let waiter = {
            let mut npc = self.inner.npc.lock();
            match &*npc {
                NpcPreload::Done => return,
                NpcPreload::Loading(flight) => Some(flight.subscribe()),
                NpcPreload::Idle => {
                    let (flight, _) = broadcast::channel(1);
                    *npc = NpcPreload::Loading(flight);
                    None
                }
            }
        };
        if let Some(mut waiting) = waiter {
            let _ = waiting.recv().await;
            return;
        }

        debug!(pack = current_pack, "preloading foundational packs for actor-translation converters");
        for dependency in NPC_DEPENDENCY_PACKS {
            if dependency == current_pack {
                continue;
            }
            self.ensure_loaded_guarded(dependency.to_string(), visited)
                .await;
        }
        // Dropping the Loading sender wakes every waiter.
        *self.inner.npc.lock() = NpcPreload::Done;
    }

    async fn pack_url_index(&self) -> &HashMap<String, Vec<String>> {
        self.inner
            .pack_urls
            .get_or_init(|| async {
                let files = self.inner.directory.translation_files().await;
                let mut index: HashMap<String, Vec<String>> = HashMap::new();
                for metadata in self.inner.catalog.packs() {
                    if !self.inner.catalog.supported(&metadata) {
                        continue;
                    }
                    let collection = self.inner.catalog.collection(&metadata);
                    let file_name = format!("{collection}.json");
                    let urls: Vec<String> = files
                        .iter()
                        .filter(|file| file_base_name(file) == file_name)
                        .cloned()
                        .collect();
                    if !urls.is_empty() {
                        index.insert(collection, urls);
                    }
                }
                debug!(packs = index.len(), "fragment URL index built");
                index
            })
            .await
    }

    async fn fragment_urls(&self, pack_id: &str) -> Vec<String> {
        self.pack_url_index()
            .await
            .get(pack_id)
            .cloned()
            .unwrap_or_default()
    }

    fn pack_metadata(&self, pack_id: &str) -> Option<PackMetadata> {
        self.inner
            .catalog
            .packs()
            .into_iter()
            .find(|metadata| self.inner.catalog.collection(metadata) == pack_id)
    }

    fn rebuild_target(
        &self,
        state: &LoaderState,
        pack_id: &str,
    ) -> Option<(String, PackMetadata, Arc<TranslationRecord>)> {
        let record = state
            .translations
            .iter()
            .find(|(collection, _)| collection == pack_id)
            .map(|(_, record)| record.clone())?;
        let metadata = self.pack_metadata(pack_id)?;
        Some((pack_id.to_string(), metadata, record))
    }

    async fn load_global_mappings(&self) {
        self.inner
            .global_mappings
            .get_or_init(|| async {
                let files: Vec<String> = self.inner.directory.mapping_files().await.to_vec();
                for file in files {
                    match self.inner.transport.fetch_json(&file).await {
                        Ok(Value::Object(mappings)) => {
                            let kinds = self.inner.registry.register_mapping(mappings);
                            debug!(file, ?kinds, "global mapping registered");
                        }
                        Ok(_) => debug!(file, "mapping file is not an object"),
                        Err(e) => debug!(file, error = %e, "mapping file unavailable"),
                    }
                }
            })
            .await;
    }

    /// Load fragments that translate compendium folder trees. They have no
    /// catalog metadata of their own, so they are installed directly under a
    /// synthetic `Folder` pack.
    async fn load_folder_packs(&self) {
        let suffix = format!("{PACK_FOLDER_SUFFIX}.json");
        let files: Vec<String> = self
            .inner
            .directory
            .translation_files()
            .await
            .iter()
            .filter(|file| file.ends_with(&suffix))
            .cloned()
            .collect();

        for file in files {
            let stem = file_stem(&file);
            let Some((namespace, name)) = stem.split_once('.') else {
                continue;
            };
            let collection = stem.to_string();
            if self.is_translated(&collection) {
                continue;
            }

            let Some(record) =
                fragments::load_and_merge(self.inner.transport.as_ref(), std::slice::from_ref(&file))
                    .await
            else {
                continue;
            };

            let metadata = PackMetadata::new(namespace, name, "Folder");
            let mut state = self.inner.state.write();
            state
                .packs
                .insert(collection, TranslatedPack::new(metadata, Arc::new(record)));
        }
    }

    async fn load_labels(&self) -> LabelIndex {
        let mut labels = LabelIndex::new();
        match self
            .inner
            .settings
            .get(SETTINGS_NAMESPACE, SETTING_LABELS)
            .await
        {
            Ok(Some(shared)) => merge_label_overlay(&mut labels, shared),
            Ok(None) => {}
            Err(e) => debug!(error = %e, "shared label index unavailable"),
        }

        if !self.inner.transport.can_browse() && !labels.is_empty() {
            return labels;
        }

        for dir in self.inner.config.translation_directories() {
            let url = format!("{}/labels.json", dir.trim_end_matches('/'));
            match self.inner.transport.fetch_json(&url).await {
                Ok(overlay) => merge_label_overlay(&mut labels, overlay),
                Err(e) => debug!(url, error = %e, "no label index in directory"),
            }
        }
        labels
    }

    async fn load_title_index(&self) -> TitleIndex {
        let mut titles = TitleIndex::new();
        match self
            .inner
            .settings
            .get(SETTINGS_NAMESPACE, SETTING_TITLE_INDEX)
            .await
        {
            Ok(Some(shared)) => merge_title_overlay(&mut titles, shared),
            Ok(None) => {}
            Err(e) => debug!(error = %e, "shared title index unavailable"),
        }

        if !self.inner.transport.can_browse() && !titles.is_empty() {
            return titles;
        }

        for dir in self.inner.config.translation_directories() {
            let url = format!("{}/titles.json", dir.trim_end_matches('/'));
            match self.inner.transport.fetch_json(&url).await {
                Ok(overlay) => merge_title_overlay(&mut titles, overlay),
                Err(e) => debug!(url, error = %e, "no title index in directory"),
            }
        }
        titles
    }
}

fn file_base_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

fn file_stem(path: &str) -> &str {
    let base = file_base_name(path);
    base.strip_suffix(".json").unwrap_or(base)
}
