use anyhow::{Context, Result};
use fluent_bundle::{concurrent::FluentBundle, FluentResource};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::i18n::language::SupportedLanguage;

pub type Bundle = FluentBundle<FluentResource>;

/// Loads and manages Fluent translation resources
pub struct FluentLoader {
    bundles: HashMap<SupportedLanguage, Bundle>,
}

impl FluentLoader {
    pub fn new() -> Self {
        Self {
            bundles: HashMap::new(),
        }
    }

    /// Load the resources compiled into the binary.
    pub fn load_embedded(&mut self, language: SupportedLanguage) -> Result<()> {
        let source = match language {
            SupportedLanguage::French => include_str!("../../locales/fr/feedback.ftl"),
            SupportedLanguage::English => include_str!("../../locales/en/feedback.ftl"),
        };
        let bundle = build_bundle(language, [(format!("{}/feedback.ftl", language), source.to_string())])?;
        self.bundles.insert(language, bundle);
        Ok(())
    }

    /// Load every `.ftl` file of `<dir>/<code>/`, replacing the embedded bundle.
    pub fn load_dir(&mut self, dir: &Path, language: SupportedLanguage) -> Result<()> {
        let locale_dir = dir.join(language.code());
        let paths = fs::read_dir(&locale_dir)
            .with_context(|| format!("Failed to read locale directory: {:?}", locale_dir))?;

        let mut sources = Vec::new();
        for path in paths {
            let path = path?.path();
            if path.extension().and_then(|s| s.to_str()) == Some("ftl") {
                let content = fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read file: {:?}", path))?;
                sources.push((path.display().to_string(), content));
            }
        }
        anyhow::ensure!(!sources.is_empty(), "No FTL files in {:?}", locale_dir);

        tracing::info!("Loaded {} FTL files for locale {}", sources.len(), language.code());
        let bundle = build_bundle(language, sources)?;
        self.bundles.insert(language, bundle);
        Ok(())
    }

    /// Get a bundle for a specific language
    pub fn get_bundle(&self, language: &SupportedLanguage) -> Option<&Bundle> {
        self.bundles.get(language)
    }
}

fn build_bundle(
    language: SupportedLanguage,
    sources: impl IntoIterator<Item = (String, String)>,
) -> Result<Bundle> {
    let mut bundle = FluentBundle::new_concurrent(vec![language.lang_id()]);
    // No Unicode isolation marks in messages.
    bundle.set_use_isolating(false);

    for (name, content) in sources {
        let resource = FluentResource::try_new(content)
            .map_err(|(_, errors)| anyhow::anyhow!("Failed to parse FTL file {}: {:?}", name, errors))?;
        bundle
            .add_resource(resource)
            .map_err(|errors| anyhow::anyhow!("Failed to add resource to bundle: {:?}", errors))?;
    }
    Ok(bundle)
}

impl Default for FluentLoader {
    fn default() -> Self {
        Self::new()
    }
}
