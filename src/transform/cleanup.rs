//! Post-restore cleanup passes.
//!
//! Restoring literals leaves machinery behind: hook bindings nothing reads,
//! translation-library imports nothing references, and hook dependency
//! arrays still listing the translation binding. Each cleanup is its own
//! tree-rewrite pass over the current text.

use anyhow::Result;
use swc_common::{Span, Spanned};
use swc_ecma_ast::{
    ArrayLit, CallExpr, Callee, Decl, Expr, Ident, ImportDecl, ImportSpecifier, MemberProp,
    ModuleDecl, ModuleItem, ObjectPatProp, Pat, Stmt, VarDecl,
};
use swc_ecma_visit::{Visit, VisitWith};

use crate::core::EditArena;
use crate::core::parsers::{ParsedTsx, parse_tsx_source};
use crate::library::LibraryCapabilityDescriptor;

/// Run every cleanup pass in order.
pub fn cleanup_source(
    source: &str,
    file_path: &str,
    descriptor: &LibraryCapabilityDescriptor,
) -> Result<String> {
    let step1 = remove_unused_bindings(source, file_path, descriptor)?;
    let step2 = remove_unused_hook_deps(&step1, file_path, descriptor)?;
    remove_unused_imports(&step2, file_path, descriptor)
}

/// Remove `const { t } = useTranslation();` / `const intl = useIntl();` /
/// `const { t } = this.props;` statements whose binding is no longer read
/// anywhere else in the file.
pub fn remove_unused_bindings(
    source: &str,
    file_path: &str,
    descriptor: &LibraryCapabilityDescriptor,
) -> Result<String> {
    let parsed = parse_tsx_source(source.to_string(), file_path)?;

    let mut collector = BindingCollector {
        descriptor,
        candidates: Vec::new(),
        scope_stack: vec![parsed.module.span],
    };
    parsed.module.visit_with(&mut collector);
    if collector.candidates.is_empty() {
        return Ok(source.to_string());
    }

    let ident_spans = ident_spans(&parsed, descriptor.binding);
    let mut arena = EditArena::new();
    for (stmt_span, scope_span) in collector.candidates {
        // The binding is per-scope: only uses inside the enclosing body,
        // outside the declaration itself, keep it alive.
        let used_in_scope = ident_spans.iter().any(|span| {
            span_contains(scope_span, *span) && !span_contains(stmt_span, *span)
        });
        if !used_in_scope {
            remove_statement_line(&parsed, stmt_span, &mut arena);
        }
    }
    Ok(arena.apply(source))
}

/// Remove translation-binding entries from hook dependency arrays once the
/// file no longer binds the hook at all.
pub fn remove_unused_hook_deps(
    source: &str,
    file_path: &str,
    descriptor: &LibraryCapabilityDescriptor,
) -> Result<String> {
    let parsed = parse_tsx_source(source.to_string(), file_path)?;

    let mut hook_check = HookBindingCheck {
        descriptor,
        found: false,
    };
    parsed.module.visit_with(&mut hook_check);
    if hook_check.found {
        return Ok(source.to_string());
    }

    let mut collector = DepArrayCollector {
        binding: descriptor.binding,
        edits: Vec::new(),
        parsed: &parsed,
    };
    parsed.module.visit_with(&mut collector);

    let mut arena = EditArena::new();
    for (start, end) in collector.edits {
        arena.push(start, end, "");
    }
    Ok(arena.apply(source))
}

/// Remove i18n import specifiers (and whole import statements) that
/// nothing references anymore.
pub fn remove_unused_imports(
    source: &str,
    file_path: &str,
    descriptor: &LibraryCapabilityDescriptor,
) -> Result<String> {
    let parsed = parse_tsx_source(source.to_string(), file_path)?;
    let mut arena = EditArena::new();

    for item in &parsed.module.body {
        let ModuleItem::ModuleDecl(ModuleDecl::Import(import)) = item else {
            continue;
        };
        let Some(src) = import.src.value.as_str() else {
            continue;
        };
        if src != descriptor.package && src != descriptor.global_import {
            continue;
        }

        let locals: Vec<(String, Span)> = import
            .specifiers
            .iter()
            .map(|spec| match spec {
                ImportSpecifier::Named(named) => (named.local.sym.to_string(), named.span),
                ImportSpecifier::Default(default) => (default.local.sym.to_string(), default.span),
                ImportSpecifier::Namespace(ns) => (ns.local.sym.to_string(), ns.span),
            })
            .collect();

        let used: Vec<bool> = locals
            .iter()
            .map(|(name, _)| {
                ident_spans(&parsed, name)
                    .iter()
                    .any(|span| !span_contains(import.span, *span))
            })
            .collect();

        if used.iter().all(|u| !u) {
            remove_statement_line(&parsed, import.span, &mut arena);
        } else {
            remove_unused_specifiers(&parsed, import, &locals, &used, &mut arena);
        }
    }

    Ok(arena.apply(source))
}

fn remove_unused_specifiers(
    parsed: &ParsedTsx,
    import: &ImportDecl,
    locals: &[(String, Span)],
    used: &[bool],
    arena: &mut EditArena,
) {
    for (index, ((_, span), keep)) in locals.iter().zip(used.iter()).enumerate() {
        if *keep {
            continue;
        }
        let start = parsed.offset_of(span.lo);
        let end = parsed.offset_of(span.hi);
        // Swallow the separating comma: the following one if another
        // specifier comes after, the preceding one otherwise.
        if index + 1 < locals.len() {
            let next_start = parsed.offset_of(locals[index + 1].1.lo);
            arena.push(start, next_start, "");
        } else if index > 0 {
            let prev_end = parsed.offset_of(locals[index - 1].1.hi);
            arena.push(prev_end, end, "");
        } else {
            arena.push(start, end, "");
        }
    }
}

struct BindingCollector<'a> {
    descriptor: &'a LibraryCapabilityDescriptor,
    /// `(statement span, enclosing body span)` per candidate.
    candidates: Vec<(Span, Span)>,
    scope_stack: Vec<Span>,
}

impl<'a> BindingCollector<'a> {
    fn is_candidate(&self, var: &VarDecl) -> bool {
        let [declarator] = var.decls.as_slice() else {
            return false;
        };
        let binds_translation = match &declarator.name {
            Pat::Object(obj) => obj.props.iter().any(|prop| match prop {
                ObjectPatProp::Assign(assign) => {
                    assign.key.sym.as_str() == self.descriptor.binding
                }
                ObjectPatProp::KeyValue(kv) => match &kv.key {
                    swc_ecma_ast::PropName::Ident(ident) => {
                        ident.sym.as_str() == self.descriptor.binding
                    }
                    _ => false,
                },
                ObjectPatProp::Rest(_) => false,
            }),
            Pat::Ident(ident) => ident.id.sym.as_str() == self.descriptor.binding,
            _ => false,
        };
        if !binds_translation {
            return false;
        }

        match declarator.init.as_deref() {
            // const { t } = useTranslation(); / const intl = useIntl();
            Some(Expr::Call(call)) => match &call.callee {
                Callee::Expr(callee) => match &**callee {
                    Expr::Ident(ident) => self.descriptor.is_hook(ident.sym.as_str()),
                    _ => false,
                },
                _ => false,
            },
            // const { t } = this.props;
            Some(Expr::Member(member)) => {
                matches!(&*member.obj, Expr::This(_))
                    && matches!(&member.prop, MemberProp::Ident(prop) if prop.sym.as_str() == "props")
            }
            _ => false,
        }
    }
}

impl<'a> Visit for BindingCollector<'a> {
    fn visit_block_stmt(&mut self, node: &swc_ecma_ast::BlockStmt) {
        self.scope_stack.push(node.span);
        node.visit_children_with(self);
        self.scope_stack.pop();
    }

    fn visit_stmt(&mut self, node: &Stmt) {
        if let Stmt::Decl(Decl::Var(var)) = node
            && self.is_candidate(var)
            && let Some(scope) = self.scope_stack.last()
        {
            self.candidates.push((node.span(), *scope));
        }
        node.visit_children_with(self);
    }
}

struct HookBindingCheck<'a> {
    descriptor: &'a LibraryCapabilityDescriptor,
    found: bool,
}

impl<'a> Visit for HookBindingCheck<'a> {
    fn visit_call_expr(&mut self, node: &CallExpr) {
        if let Callee::Expr(callee) = &node.callee
            && let Expr::Ident(ident) = &**callee
            && self.descriptor.is_hook(ident.sym.as_str())
        {
            self.found = true;
        }
        node.visit_children_with(self);
    }
}

struct DepArrayCollector<'a> {
    binding: &'a str,
    edits: Vec<(usize, usize)>,
    parsed: &'a ParsedTsx,
}

impl<'a> DepArrayCollector<'a> {
    fn collect_from_array(&mut self, array: &ArrayLit) {
        let elements: Vec<_> = array.elems.iter().flatten().collect();
        for (index, element) in elements.iter().enumerate() {
            let Expr::Ident(ident) = &*element.expr else {
                continue;
            };
            if ident.sym.as_str() != self.binding {
                continue;
            }
            let start = self.parsed.offset_of(element.expr.span().lo);
            let end = self.parsed.offset_of(element.expr.span().hi);
            if index + 1 < elements.len() {
                let next_start = self.parsed.offset_of(elements[index + 1].expr.span().lo);
                self.edits.push((start, next_start));
            } else if index > 0 {
                let prev_end = self.parsed.offset_of(elements[index - 1].expr.span().hi);
                self.edits.push((prev_end, end));
            } else {
                self.edits.push((start, end));
            }
        }
    }
}

impl<'a> Visit for DepArrayCollector<'a> {
    fn visit_call_expr(&mut self, node: &CallExpr) {
        if let Callee::Expr(callee) = &node.callee
            && let Expr::Ident(ident) = &**callee
            && matches!(
                ident.sym.as_str(),
                "useEffect" | "useMemo" | "useCallback" | "useLayoutEffect"
            )
            && let Some(second) = node.args.get(1)
            && let Expr::Array(array) = &*second.expr
        {
            self.collect_from_array(array);
        }
        node.visit_children_with(self);
    }
}

/// All spans of identifiers named `name` in the file.
fn ident_spans(parsed: &ParsedTsx, name: &str) -> Vec<Span> {
    struct IdentCollector<'a> {
        name: &'a str,
        spans: Vec<Span>,
    }
    impl<'a> Visit for IdentCollector<'a> {
        fn visit_ident(&mut self, node: &Ident) {
            if node.sym.as_str() == self.name {
                self.spans.push(node.span);
            }
        }
    }
    let mut collector = IdentCollector {
        name,
        spans: Vec::new(),
    };
    parsed.module.visit_with(&mut collector);
    collector.spans
}

fn span_contains(outer: Span, inner: Span) -> bool {
    outer.lo <= inner.lo && inner.hi <= outer.hi
}

/// Remove a whole statement line: leading indentation, the statement, and
/// the trailing newline.
fn remove_statement_line(parsed: &ParsedTsx, span: Span, arena: &mut EditArena) {
    let mut start = parsed.offset_of(span.lo);
    let mut end = parsed.offset_of(span.hi);
    let bytes = parsed.source.as_bytes();
    while start > 0 && (bytes[start - 1] == b' ' || bytes[start - 1] == b'\t') {
        start -= 1;
    }
    if end < bytes.len() && bytes[end] == b'\n' {
        end += 1;
    }
    arena.push(start, end, "");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::LibraryKind;
    use pretty_assertions::assert_eq;

    fn descriptor() -> LibraryCapabilityDescriptor {
        LibraryCapabilityDescriptor::new(LibraryKind::ReactI18next, "@/i18n", None)
    }

    #[test]
    fn test_unused_hook_binding_removed() {
        let source = "import { useTranslation } from 'react-i18next';\nexport function Login() {\n  const { t } = useTranslation();\n  return <p>确认</p>;\n}\n";
        let out = cleanup_source(source, "Login.tsx", &descriptor()).unwrap();
        assert_eq!(
            out,
            "export function Login() {\n  return <p>确认</p>;\n}\n"
        );
    }

    #[test]
    fn test_used_hook_binding_kept() {
        let source = "import { useTranslation } from 'react-i18next';\nexport function Login() {\n  const { t } = useTranslation();\n  return <p>{t('a__b')}</p>;\n}\n";
        let out = cleanup_source(source, "Login.tsx", &descriptor()).unwrap();
        assert_eq!(out, source);
    }

    #[test]
    fn test_bindings_scoped_per_component() {
        let source = "function Alpha() {\n  const { t } = useTranslation();\n  return <p>{t('x')}</p>;\n}\nfunction Beta() {\n  const { t } = useTranslation();\n  return <p>static</p>;\n}\n";
        let out = remove_unused_bindings(source, "x.tsx", &descriptor()).unwrap();
        // Alpha keeps its binding; Beta's is dead and goes away.
        assert_eq!(out.matches("const { t } = useTranslation();").count(), 1);
        assert!(out.contains("{t('x')}"));
    }

    #[test]
    fn test_props_destructure_removed_when_unused() {
        let source = "class _S {\n  render() {\n    const { t } = this.props;\n    return <p>设置</p>;\n  }\n}\n";
        let out = remove_unused_bindings(source, "S.tsx", &descriptor()).unwrap();
        assert!(!out.contains("this.props"));
        assert!(out.contains("return <p>设置</p>;"));
    }

    #[test]
    fn test_unused_specifier_removed_others_kept() {
        let source = "import { Trans, useTranslation } from 'react-i18next';\nexport const C = () => <Trans i18nKey=\"k\" />;\n";
        let out = remove_unused_imports(source, "C.tsx", &descriptor()).unwrap();
        assert_eq!(
            out,
            "import { Trans } from 'react-i18next';\nexport const C = () => <Trans i18nKey=\"k\" />;\n"
        );
    }

    #[test]
    fn test_whole_import_removed_when_unused() {
        let source = "import { useTranslation } from 'react-i18next';\nconst x = 1;\n";
        let out = remove_unused_imports(source, "x.ts", &descriptor()).unwrap();
        assert_eq!(out, "const x = 1;\n");
    }

    #[test]
    fn test_unrelated_import_untouched() {
        let source = "import React from 'react';\nconst x = 1;\n";
        let out = remove_unused_imports(source, "x.ts", &descriptor()).unwrap();
        assert_eq!(out, source);
    }

    #[test]
    fn test_dep_entry_removed_when_hook_gone() {
        let source = "export function C() {\n  useEffect(() => {}, [count, t]);\n  return null;\n}\n";
        let out = remove_unused_hook_deps(source, "C.tsx", &descriptor()).unwrap();
        assert_eq!(
            out,
            "export function C() {\n  useEffect(() => {}, [count]);\n  return null;\n}\n"
        );
    }

    #[test]
    fn test_dep_entry_kept_while_hook_bound() {
        let source = "export function C() {\n  const { t } = useTranslation();\n  useEffect(() => {}, [t]);\n  return <p>{t('x')}</p>;\n}\n";
        let out = remove_unused_hook_deps(source, "C.tsx", &descriptor()).unwrap();
        assert_eq!(out, source);
    }

    #[test]
    fn test_sole_dep_entry_leaves_empty_array() {
        let source = "export function C() {\n  useEffect(() => {}, [t]);\n  return null;\n}\n";
        let out = remove_unused_hook_deps(source, "C.tsx", &descriptor()).unwrap();
        assert!(out.contains("useEffect(() => {}, [])"));
    }
}
