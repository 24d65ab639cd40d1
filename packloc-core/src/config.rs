//! Loader configuration and directory resolution.

use serde::{Deserialize, Serialize};

/// A registered translation module contributing a directory of fragments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationModule {
    /// Package id of the module.
    pub module: String,
    /// Language the module's fragments are written in.
    pub lang: String,
    /// Directory inside the module holding the fragments.
    pub dir: String,
}

impl TranslationModule {
    /// Create a new module registration.
    pub fn new(
        module: impl Into<String>,
        lang: impl Into<String>,
        dir: impl Into<String>,
    ) -> Self {
        Self {
            module: module.into(),
            lang: lang.into(),
            dir: dir.into(),
        }
    }
}

/// Configuration for the pack loader.
///
/// Drives which directories are searched for translation fragments and
/// mapping files. Translation directories are scoped to the active language;
/// mapping directories are not.
#[derive(Debug, Clone, Default)]
pub struct LoaderConfig {
    /// Active display language (e.g. `"fr"`).
    pub language: String,
    /// User-configured base translation directory, if any.
    pub base_directory: Option<String>,
    /// Host system package id, for system-shipped translations.
    pub system_id: Option<String>,
    /// Directory under the system package holding translations.
    pub system_translations_dir: Option<String>,
    /// Registered translation modules.
    pub modules: Vec<TranslationModule>,
}

impl LoaderConfig {
    /// Create a configuration for the given language.
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            ..Default::default()
        }
    }

    /// Set the base translation directory.
    pub fn with_base_directory(mut self, dir: impl Into<String>) -> Self {
        self.base_directory = Some(dir.into());
        self
    }

    /// Set the system package and its translations directory.
    pub fn with_system(mut self, id: impl Into<String>, dir: impl Into<String>) -> Self {
        self.system_id = Some(id.into());
        self.system_translations_dir = Some(dir.into());
        self
    }

    /// Register a translation module.
    pub fn with_module(mut self, module: TranslationModule) -> Self {
        self.modules.push(module);
        self
    }

    /// Directories that may hold translation fragments for the active language.
    pub fn translation_directories(&self) -> Vec<String> {
        let mut dirs: Vec<String> = self
            .modules
            .iter()
            .filter(|m| m.lang == self.language)
            .map(|m| format!("modules/{}/{}", m.module, m.dir))
            .collect();

        if let Some(base) = self.base_directory.as_deref() {
            if !base.trim().is_empty() {
                dirs.push(format!("{}/{}", base, self.language));
            }
        }
        if let (Some(system), Some(dir)) =
            (self.system_id.as_deref(), self.system_translations_dir.as_deref())
        {
            dirs.push(format!("systems/{}/{}/{}", system, dir, self.language));
        }
        dirs
    }

    /// Directories that may hold mapping files. Not language-scoped.
    pub fn mapping_directories(&self) -> Vec<String> {
        let mut dirs: Vec<String> = self
            .modules
            .iter()
            .map(|m| format!("modules/{}/{}", m.module, m.dir))
            .collect();

        if let Some(base) = self.base_directory.as_deref() {
            if !base.trim().is_empty() {
                dirs.push(base.to_string());
            }
        }
        if let (Some(system), Some(dir)) =
            (self.system_id.as_deref(), self.system_translations_dir.as_deref())
        {
            dirs.push(format!("systems/{}/{}", system, dir));
        }
        dirs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> LoaderConfig {
        LoaderConfig::new("fr")
            .with_module(TranslationModule::new("pack-fr", "fr", "translations"))
            .with_module(TranslationModule::new("pack-de", "de", "uebersetzungen"))
            .with_base_directory("custom")
            .with_system("pf2e", "lang")
    }

    #[test]
    fn translation_directories_are_language_scoped() {
        let dirs = config().translation_directories();
        assert_eq!(
            dirs,
            vec![
                "modules/pack-fr/translations".to_string(),
                "custom/fr".to_string(),
                "systems/pf2e/lang/fr".to_string(),
            ]
        );
    }

    #[test]
    fn mapping_directories_cover_all_modules() {
        let dirs = config().mapping_directories();
        assert_eq!(
            dirs,
            vec![
                "modules/pack-fr/translations".to_string(),
                "modules/pack-de/uebersetzungen".to_string(),
                "custom".to_string(),
                "systems/pf2e/lang".to_string(),
            ]
        );
    }

    #[test]
    fn blank_base_directory_is_ignored() {
        let config = LoaderConfig::new("fr").with_base_directory("  ");
        assert!(config.translation_directories().is_empty());
        assert!(config.mapping_directories().is_empty());
    }
}
