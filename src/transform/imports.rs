//! Import bookkeeping.
//!
//! Adds hook/HOC/global-accessor imports to a file, merging specifiers
//! into an existing import from the same package when one is present and
//! inserting a new import statement after the last existing import
//! otherwise.

use anyhow::Result;
use swc_ecma_ast::{ImportDecl, ImportSpecifier, Module, ModuleDecl, ModuleItem};

use crate::core::EditArena;
use crate::core::parsers::{ParsedTsx, parse_tsx_source};
use crate::library::LibraryCapabilityDescriptor;

/// Import requirements computed by the injection pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportNeeds {
    pub hook: bool,
    pub hoc: bool,
    pub global: bool,
}

impl ImportNeeds {
    pub fn any(&self) -> bool {
        self.hook || self.hoc || self.global
    }
}

pub struct ImportManager {
    descriptor: LibraryCapabilityDescriptor,
}

impl ImportManager {
    pub fn new(descriptor: LibraryCapabilityDescriptor) -> Self {
        Self { descriptor }
    }

    /// Add the translation-library imports a file needs.
    ///
    /// Returns the new source text; unchanged input comes back as-is.
    pub fn add_i18n_imports(&self, source: &str, file_path: &str, needs: &ImportNeeds) -> Result<String> {
        if !needs.any() {
            return Ok(source.to_string());
        }
        let parsed = parse_tsx_source(source.to_string(), file_path)?;
        let mut arena = EditArena::new();

        let mut specifiers: Vec<&str> = Vec::new();
        if needs.hook {
            specifiers.push(self.descriptor.hook);
        }
        if needs.hoc
            && let Some(hoc) = self.descriptor.hoc
        {
            specifiers.push(hoc);
            if let Some(props) = self.descriptor.wrapper_props {
                specifiers.push(props);
            }
        }
        if !specifiers.is_empty() {
            self.ensure_named_import(&parsed, self.descriptor.package, &specifiers, &mut arena);
        }

        if needs.global {
            self.handle_global_imports(&parsed, &mut arena);
        }

        Ok(arena.apply(source))
    }

    /// Ensure the module-level accessor import is present.
    pub fn handle_global_imports(&self, parsed: &ParsedTsx, arena: &mut EditArena) {
        self.ensure_named_import(
            parsed,
            &self.descriptor.global_import.clone(),
            &[self.descriptor.global_object],
            arena,
        );
    }

    fn ensure_named_import(
        &self,
        parsed: &ParsedTsx,
        package: &str,
        specifiers: &[&str],
        arena: &mut EditArena,
    ) {
        match find_import(&parsed.module, package) {
            Some(import) => {
                let missing: Vec<&str> = specifiers
                    .iter()
                    .filter(|s| !has_named_specifier(import, s))
                    .copied()
                    .collect();
                if missing.is_empty() {
                    return;
                }
                // Merge into the existing specifier list when one exists;
                // otherwise fall back to a separate import statement.
                match last_named_specifier(import) {
                    Some(last) => {
                        let at = parsed.offset_of(last.span.hi);
                        arena.insert(at, format!(", {}", missing.join(", ")));
                    }
                    None => {
                        let at = parsed.offset_of(import.span.hi);
                        arena.insert(
                            at,
                            format!("\nimport {{ {} }} from '{}';", missing.join(", "), package),
                        );
                    }
                }
            }
            None => {
                let stmt = format!("import {{ {} }} from '{}';", specifiers.join(", "), package);
                let at = insert_offset(parsed);
                if at == 0 {
                    arena.insert(0, format!("{}\n", stmt));
                } else {
                    arena.insert(at, format!("\n{}", stmt));
                }
            }
        }
    }
}

fn find_import<'a>(module: &'a Module, package: &str) -> Option<&'a ImportDecl> {
    module.body.iter().find_map(|item| match item {
        ModuleItem::ModuleDecl(ModuleDecl::Import(import))
            if import.src.value.as_str() == Some(package) =>
        {
            Some(import)
        }
        _ => None,
    })
}

fn has_named_specifier(import: &ImportDecl, name: &str) -> bool {
    import.specifiers.iter().any(|spec| match spec {
        ImportSpecifier::Named(named) => named.local.sym.as_str() == name,
        ImportSpecifier::Default(default) => default.local.sym.as_str() == name,
        ImportSpecifier::Namespace(ns) => ns.local.sym.as_str() == name,
    })
}

fn last_named_specifier(import: &ImportDecl) -> Option<&swc_ecma_ast::ImportNamedSpecifier> {
    import.specifiers.iter().rev().find_map(|spec| match spec {
        ImportSpecifier::Named(named) => Some(named),
        _ => None,
    })
}

/// Offset right after the last import statement, or 0 for files without
/// imports.
fn insert_offset(parsed: &ParsedTsx) -> usize {
    parsed
        .module
        .body
        .iter()
        .filter_map(|item| match item {
            ModuleItem::ModuleDecl(ModuleDecl::Import(import)) => {
                Some(parsed.offset_of(import.span.hi))
            }
            _ => None,
        })
        .next_back()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::LibraryKind;
    use pretty_assertions::assert_eq;

    fn manager() -> ImportManager {
        ImportManager::new(LibraryCapabilityDescriptor::new(
            LibraryKind::ReactI18next,
            "@/i18n",
            None,
        ))
    }

    #[test]
    fn test_new_import_after_existing_imports() {
        let source = "import React from 'react';\n\nexport function C() {\n  return null;\n}\n";
        let needs = ImportNeeds { hook: true, ..Default::default() };
        let out = manager().add_i18n_imports(source, "C.tsx", &needs).unwrap();
        assert_eq!(
            out,
            "import React from 'react';\nimport { useTranslation } from 'react-i18next';\n\nexport function C() {\n  return null;\n}\n"
        );
    }

    #[test]
    fn test_import_at_top_when_no_imports() {
        let source = "export const x = 1;\n";
        let needs = ImportNeeds { hook: true, ..Default::default() };
        let out = manager().add_i18n_imports(source, "x.ts", &needs).unwrap();
        assert!(out.starts_with("import { useTranslation } from 'react-i18next';\n"));
    }

    #[test]
    fn test_merge_into_existing_package_import() {
        let source = "import { Trans } from 'react-i18next';\n";
        let needs = ImportNeeds { hook: true, ..Default::default() };
        let out = manager().add_i18n_imports(source, "x.ts", &needs).unwrap();
        assert_eq!(out, "import { Trans, useTranslation } from 'react-i18next';\n");
    }

    #[test]
    fn test_already_imported_is_noop() {
        let source = "import { useTranslation } from 'react-i18next';\n";
        let needs = ImportNeeds { hook: true, ..Default::default() };
        let out = manager().add_i18n_imports(source, "x.ts", &needs).unwrap();
        assert_eq!(out, source);
    }

    #[test]
    fn test_hoc_import_includes_props_type() {
        let source = "const x = 1;\n";
        let needs = ImportNeeds { hoc: true, ..Default::default() };
        let out = manager().add_i18n_imports(source, "x.ts", &needs).unwrap();
        assert!(out.contains("import { withTranslation, WithTranslation } from 'react-i18next';"));
    }

    #[test]
    fn test_global_import() {
        let source = "const x = 1;\n";
        let needs = ImportNeeds { global: true, ..Default::default() };
        let out = manager().add_i18n_imports(source, "x.ts", &needs).unwrap();
        assert!(out.starts_with("import { i18next } from '@/i18n';\n"));
    }

    #[test]
    fn test_no_needs_is_identity() {
        let source = "const x = 1;\n";
        let out = manager()
            .add_i18n_imports(source, "x.ts", &ImportNeeds::default())
            .unwrap();
        assert_eq!(out, source);
    }
}
