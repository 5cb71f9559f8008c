//! Framework adapter.
//!
//! The single seam that keeps the extractors, transformers, and restorers
//! library-agnostic: construction picks a UI framework and, orthogonally,
//! a translation-library variant, and hands out a coherent set of strategy
//! objects all sharing one capability descriptor.

use std::path::Path;

use anyhow::Result;
use enum_dispatch::enum_dispatch;
use rayon::prelude::*;
use tracing::warn;

use crate::config::Config;
use crate::core::ExtractedString;
use crate::extract::react::ReactExtractor;
use crate::extract::vue::VueExtractor;
use crate::extract::Extract;
use crate::library::{Framework, LibraryCapabilityDescriptor, LibraryKind};
use crate::locale::LocaleMap;
use crate::restore::Restore;
use crate::restore::react::ReactRestorer;
use crate::restore::vue::VueRestorer;
use crate::transform::Transform;
use crate::transform::imports::ImportManager;
use crate::transform::inject::ComponentInjector;
use crate::transform::react::ReactTransformer;
use crate::transform::vue::VueTransformer;

/// Framework-dispatched extractor.
#[enum_dispatch(Extract)]
pub enum TextExtractor {
    React(ReactExtractor),
    Vue(VueExtractor),
}

/// Framework-dispatched forward transformer.
#[enum_dispatch(Transform)]
pub enum Transformer {
    React(ReactTransformer),
    Vue(VueTransformer),
}

/// Framework-dispatched restore transformer.
#[enum_dispatch(Restore)]
pub enum RestoreTransformer {
    React(ReactRestorer),
    Vue(VueRestorer),
}

pub struct FrameworkAdapter {
    framework: Framework,
    descriptor: LibraryCapabilityDescriptor,
    technical_attributes: Vec<String>,
}

impl FrameworkAdapter {
    pub fn new(
        framework: Framework,
        library: LibraryKind,
        global_import: impl Into<String>,
        namespace: Option<String>,
        technical_attributes: Vec<String>,
    ) -> Result<Self> {
        if library.framework() != framework {
            anyhow::bail!("Library '{}' does not belong to framework '{}'", library, framework);
        }
        Ok(Self {
            framework,
            descriptor: LibraryCapabilityDescriptor::new(library, global_import, namespace),
            technical_attributes,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.framework,
            config.library,
            config.global_import.clone(),
            config.namespace.clone(),
            config.technical_attributes.clone(),
        )
    }

    pub fn framework(&self) -> Framework {
        self.framework
    }

    pub fn descriptor(&self) -> &LibraryCapabilityDescriptor {
        &self.descriptor
    }

    pub fn text_extractor(&self) -> TextExtractor {
        match self.framework {
            Framework::React => TextExtractor::React(ReactExtractor::new(
                self.descriptor.clone(),
                &self.technical_attributes,
            )),
            Framework::Vue => TextExtractor::Vue(VueExtractor::new(
                self.descriptor.clone(),
                &self.technical_attributes,
            )),
        }
    }

    pub fn transformer(&self) -> Transformer {
        match self.framework {
            Framework::React => Transformer::React(ReactTransformer::new(self.descriptor.clone())),
            Framework::Vue => Transformer::Vue(VueTransformer::new(self.descriptor.clone())),
        }
    }

    pub fn restore_transformer(&self) -> RestoreTransformer {
        match self.framework {
            Framework::React => RestoreTransformer::React(ReactRestorer::new(self.descriptor.clone())),
            Framework::Vue => RestoreTransformer::Vue(VueRestorer::new(self.descriptor.clone())),
        }
    }

    pub fn component_injector(&self) -> ComponentInjector {
        ComponentInjector::new(self.descriptor.clone())
    }

    pub fn import_manager(&self) -> ImportManager {
        ImportManager::new(self.descriptor.clone())
    }
}

/// Extract from many files: order-preserving concatenation, with per-file
/// parse errors logged and skipped while other files continue.
pub fn extract_from_files(
    extractor: &TextExtractor,
    root: &Path,
    files: &[String],
) -> Vec<ExtractedString> {
    let per_file: Vec<Result<Vec<ExtractedString>>> = files
        .par_iter()
        .map(|file| extractor.extract_from_file(root, file))
        .collect();

    let mut all = Vec::new();
    for (file, result) in files.iter().zip(per_file) {
        match result {
            Ok(records) => all.extend(records),
            Err(error) => {
                warn!(file = %file, error = %error, "extraction failed; skipping file");
            }
        }
    }
    all
}

/// Restore many files, returning `(file, new_text)` for the ones that
/// changed. Per-file failures are logged and skipped.
pub fn restore_files(
    restorer: &RestoreTransformer,
    root: &Path,
    files: &[String],
    locale_map: &LocaleMap,
) -> Vec<(String, String)> {
    let mut changed = Vec::new();
    for file in files {
        match restorer.restore_file(root, file, locale_map) {
            Ok(Some(new_text)) => changed.push((file.clone(), new_text)),
            Ok(None) => {}
            Err(error) => {
                warn!(file = %file, error = %error, "restore failed; skipping file");
            }
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_adapter_construction_validates_pairing() {
        assert!(
            FrameworkAdapter::new(Framework::React, LibraryKind::ReactIntl, "@/i18n", None, vec![])
                .is_ok()
        );
        assert!(
            FrameworkAdapter::new(Framework::Vue, LibraryKind::ReactIntl, "@/i18n", None, vec![])
                .is_err()
        );
    }

    #[test]
    fn test_adapter_dispatch_react() {
        let adapter = FrameworkAdapter::new(
            Framework::React,
            LibraryKind::ReactI18next,
            "@/i18n",
            None,
            vec![],
        )
        .unwrap();
        assert!(matches!(adapter.text_extractor(), TextExtractor::React(_)));
        assert!(matches!(adapter.transformer(), Transformer::React(_)));
        assert!(matches!(adapter.restore_transformer(), RestoreTransformer::React(_)));
    }

    #[test]
    fn test_extract_from_files_skips_broken_file() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(
            dir.path().join("src/Good.tsx"),
            "export const Good = () => <p>确认</p>;\n",
        )
        .unwrap();
        fs::write(dir.path().join("src/Bad.tsx"), "const = broken <<<\n").unwrap();
        fs::write(
            dir.path().join("src/Tail.tsx"),
            "export const Tail = () => <p>取消</p>;\n",
        )
        .unwrap();

        let adapter = FrameworkAdapter::from_config(&Config::default()).unwrap();
        let extractor = adapter.text_extractor();
        let files = vec![
            "src/Good.tsx".to_string(),
            "src/Bad.tsx".to_string(),
            "src/Tail.tsx".to_string(),
        ];
        let records = extract_from_files(&extractor, dir.path(), &files);

        // Order-preserving concatenation with the broken file skipped.
        let originals: Vec<&str> = records.iter().map(|r| r.original.as_str()).collect();
        assert_eq!(originals, vec!["确认", "取消"]);
    }
}
