//! TSX call-site rewriting.
//!
//! The rewrite pass mirrors the extractor's traversal exactly: every site
//! the extractor would report is located again, matched to its assigned
//! identifier by original text, and replaced with a generated translation
//! call. Edits are collected into an arena and applied in one batch; a
//! second pass (see [`super::inject`]) then binds translation capability
//! into components that newly need it.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use swc_common::Spanned;
use swc_ecma_ast::{
    CallExpr, Callee, ClassDecl, Expr, FnDecl, JSXAttr, JSXAttrValue, JSXElement,
    JSXElementChild, JSXElementName, JSXExpr, JSXText, Lit, MemberProp, Pat, Str, Tpl,
    VarDeclarator,
};
use swc_ecma_visit::{Visit, VisitWith};

use crate::core::parsers::{ParsedTsx, parse_tsx_source};
use crate::core::{ComponentKind, EditArena, ExtractedString};
use crate::extract::placeholder_name;
use crate::library::LibraryCapabilityDescriptor;
use crate::transform::Transform;
use crate::transform::inject::ComponentInjector;
use crate::utils::{collapse_markup_whitespace, contains_ideographic};

/// Forward transformer for React/TSX sources.
pub struct ReactTransformer {
    descriptor: LibraryCapabilityDescriptor,
}

/// Identifier/message pair looked up by a site's original text.
struct SiteTarget {
    id: String,
    message: String,
}

impl ReactTransformer {
    pub fn new(descriptor: LibraryCapabilityDescriptor) -> Self {
        Self { descriptor }
    }

    /// Full transform: rewrite call sites, then inject imports/bindings.
    pub fn transform_source(
        &self,
        source: &str,
        file_path: &str,
        extracted: &[ExtractedString],
        include_default: bool,
    ) -> Result<Option<String>> {
        let rewritten = self.rewrite_source(source, file_path, extracted, include_default)?;
        let injector = ComponentInjector::new(self.descriptor.clone());
        let injected = injector.inject(&rewritten, file_path)?;
        if injected == source {
            Ok(None)
        } else {
            Ok(Some(injected))
        }
    }

    /// Call-site rewriting only.
    pub fn rewrite_source(
        &self,
        source: &str,
        file_path: &str,
        extracted: &[ExtractedString],
        include_default: bool,
    ) -> Result<String> {
        self.rewrite_source_with_kind(
            source,
            file_path,
            extracted,
            include_default,
            ComponentKind::Other,
        )
    }

    /// Call-site rewriting with a base component kind for code outside any
    /// recognizable component. Vue script blocks set `Setup` or `Options`
    /// here so the right accessor is generated.
    pub fn rewrite_source_with_kind(
        &self,
        source: &str,
        file_path: &str,
        extracted: &[ExtractedString],
        include_default: bool,
        base_kind: ComponentKind,
    ) -> Result<String> {
        let targets: HashMap<String, SiteTarget> = extracted
            .iter()
            .filter(|record| record.has_id())
            .map(|record| {
                (
                    record.original.clone(),
                    SiteTarget {
                        id: record.semantic_id.clone(),
                        message: record.message().to_string(),
                    },
                )
            })
            .collect();
        if targets.is_empty() {
            return Ok(source.to_string());
        }

        let parsed = parse_tsx_source(source.to_string(), file_path)?;
        let base_stack = match base_kind {
            ComponentKind::Other => Vec::new(),
            kind => vec![kind],
        };
        let mut visitor = RewriteVisitor {
            parsed: &parsed,
            descriptor: &self.descriptor,
            targets: &targets,
            include_default,
            component_stack: base_stack,
            skip_depth: 0,
            arena: EditArena::new(),
        };
        visitor.visit_module(&parsed.module);
        Ok(visitor.arena.apply(source))
    }
}

impl Transform for ReactTransformer {
    fn transform_file(
        &self,
        root: &Path,
        file: &str,
        extracted: &[ExtractedString],
        include_default: bool,
    ) -> Result<Option<String>> {
        let full = root.join(file);
        let source = fs::read_to_string(&full)
            .with_context(|| format!("Failed to read source file: {}", full.display()))?;
        self.transform_source(&source, file, extracted, include_default)
    }
}

struct RewriteVisitor<'a> {
    parsed: &'a ParsedTsx,
    descriptor: &'a LibraryCapabilityDescriptor,
    targets: &'a HashMap<String, SiteTarget>,
    include_default: bool,
    component_stack: Vec<ComponentKind>,
    skip_depth: usize,
    arena: EditArena,
}

impl<'a> RewriteVisitor<'a> {
    fn component_kind(&self) -> ComponentKind {
        self.component_stack.last().copied().unwrap_or_default()
    }

    /// Accessor for plain-code rewrites at the current position.
    fn code_accessor(&self) -> String {
        match self.component_kind() {
            ComponentKind::Function | ComponentKind::Class | ComponentKind::Setup => {
                self.descriptor.code_accessor(true)
            }
            ComponentKind::Options => match self.descriptor.kind.framework() {
                crate::library::Framework::Vue => "this.$t".to_string(),
                crate::library::Framework::React => self.descriptor.code_accessor(true),
            },
            ComponentKind::Other => self.descriptor.code_accessor(false),
        }
    }

    fn default_for(&self, target: &SiteTarget) -> Option<String> {
        self.include_default.then(|| target.message.clone())
    }

    fn span_range(&self, span: swc_common::Span) -> (usize, usize) {
        (self.parsed.offset_of(span.lo), self.parsed.offset_of(span.hi))
    }

    fn enter_component<F>(&mut self, kind: ComponentKind, f: F)
    where
        F: FnOnce(&mut Self),
    {
        self.component_stack.push(kind);
        f(self);
        self.component_stack.pop();
    }

    fn with_skip<F>(&mut self, f: F)
    where
        F: FnOnce(&mut Self),
    {
        self.skip_depth += 1;
        f(self);
        self.skip_depth -= 1;
    }

    fn rewrite_code_str(&mut self, node: &Str) {
        if self.skip_depth > 0 {
            return;
        }
        let Some(value) = node.value.as_str() else {
            return;
        };
        let Some(target) = self.targets.get(value) else {
            return;
        };
        let accessor = self.code_accessor();
        let default = self.default_for(target);
        let call = self
            .descriptor
            .code_call(&accessor, &target.id, default.as_deref(), &[]);
        let (start, end) = self.span_range(node.span);
        self.arena.push(start, end, call);
    }

    fn rewrite_template(&mut self, node: &Tpl) -> bool {
        if self.skip_depth > 0 {
            return true;
        }
        let (start, end) = self.span_range(node.span);
        let original = &self.parsed.source[start..end];
        let Some(target) = self.targets.get(original) else {
            return false;
        };

        // Recompute placeholder values the same way the extractor named them.
        let mut values: Vec<(String, String)> = Vec::new();
        let mut names: Vec<String> = Vec::new();
        for (i, expr) in node.exprs.iter().enumerate() {
            if is_inline_literal(expr) {
                continue;
            }
            let (expr_start, expr_end) = self.span_range(expr.span());
            let src = self.parsed.source[expr_start..expr_end].to_string();
            let name = placeholder_name(&src, i, &names);
            names.push(name.clone());
            values.push((name, src));
        }

        let accessor = self.code_accessor();
        let default = self.default_for(target);
        let call = self
            .descriptor
            .code_call(&accessor, &target.id, default.as_deref(), &values);
        self.arena.push(start, end, call);
        true
    }

    /// Mirror of the extractor's mixed-children combination. Returns true
    /// when the whole child run was rewritten as one template call.
    fn try_rewrite_combined(&mut self, node: &JSXElement) -> bool {
        if self.skip_depth > 0 {
            return false;
        }
        let mut has_expr = false;
        let mut has_ideographic_text = false;
        for child in &node.children {
            match child {
                JSXElementChild::JSXText(text) => {
                    if contains_ideographic(&text.value) {
                        has_ideographic_text = true;
                    }
                }
                JSXElementChild::JSXExprContainer(container) => match &container.expr {
                    JSXExpr::JSXEmptyExpr(_) => {}
                    JSXExpr::Expr(_) => has_expr = true,
                },
                _ => return false,
            }
        }
        if !has_expr || !has_ideographic_text {
            return false;
        }

        let mut values: Vec<(String, String)> = Vec::new();
        let mut names: Vec<String> = Vec::new();
        let mut span_lo: Option<swc_common::BytePos> = None;
        let mut span_hi = swc_common::BytePos(0);
        let mut expr_index = 0usize;
        for child in &node.children {
            match child {
                JSXElementChild::JSXText(text) => {
                    if !text.value.trim().is_empty() {
                        let trim_start = text.value.len() - text.value.trim_start().len();
                        let lo = text.span.lo + swc_common::BytePos(trim_start as u32);
                        span_lo.get_or_insert(lo);
                        let trim_end = text.value.len() - text.value.trim_end().len();
                        span_hi = text.span.hi - swc_common::BytePos(trim_end as u32);
                    }
                }
                JSXElementChild::JSXExprContainer(container) => {
                    if let JSXExpr::Expr(expr) = &container.expr {
                        let (expr_start, expr_end) = self.span_range(expr.span());
                        let src = self.parsed.source[expr_start..expr_end].to_string();
                        let name = placeholder_name(&src, expr_index, &names);
                        names.push(name.clone());
                        values.push((name, src));
                        expr_index += 1;
                        span_lo.get_or_insert(container.span.lo);
                        span_hi = container.span.hi;
                    }
                }
                _ => unreachable!("checked above"),
            }
        }

        let Some(lo) = span_lo else { return false };
        let start = self.parsed.offset_of(lo);
        let end = self.parsed.offset_of(span_hi);
        let original = &self.parsed.source[start..end];
        let Some(target) = self.targets.get(original) else {
            return false;
        };

        let default = self.default_for(target);
        let call = self
            .descriptor
            .jsx_call(&target.id, default.as_deref(), &values);
        self.arena.push(start, end, call);
        true
    }
}

fn is_inline_literal(expr: &Expr) -> bool {
    matches!(
        expr,
        Expr::Lit(Lit::Str(_)) | Expr::Lit(Lit::Num(_)) | Expr::Lit(Lit::Bool(_))
    )
}

fn starts_uppercase(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_uppercase())
}

impl<'a> Visit for RewriteVisitor<'a> {
    fn visit_import_decl(&mut self, _node: &swc_ecma_ast::ImportDecl) {}

    fn visit_export_all(&mut self, _node: &swc_ecma_ast::ExportAll) {}

    fn visit_named_export(&mut self, _node: &swc_ecma_ast::NamedExport) {}

    fn visit_ts_lit_type(&mut self, _node: &swc_ecma_ast::TsLitType) {}

    fn visit_prop_name(&mut self, _node: &swc_ecma_ast::PropName) {}

    fn visit_fn_decl(&mut self, node: &FnDecl) {
        let kind = if starts_uppercase(node.ident.sym.as_str()) {
            ComponentKind::Function
        } else {
            ComponentKind::Other
        };
        self.enter_component(kind, |this| node.visit_children_with(this));
    }

    fn visit_class_decl(&mut self, node: &ClassDecl) {
        let kind = if starts_uppercase(node.ident.sym.as_str()) {
            ComponentKind::Class
        } else {
            ComponentKind::Other
        };
        self.enter_component(kind, |this| node.visit_children_with(this));
    }

    fn visit_var_declarator(&mut self, node: &VarDeclarator) {
        let arrow_component = match (&node.name, node.init.as_deref()) {
            (Pat::Ident(ident), Some(Expr::Arrow(_))) if starts_uppercase(ident.id.sym.as_str()) => {
                true
            }
            _ => false,
        };
        if arrow_component {
            self.enter_component(ComponentKind::Function, |this| {
                node.visit_children_with(this)
            });
        } else {
            node.visit_children_with(self);
        }
    }

    fn visit_call_expr(&mut self, node: &CallExpr) {
        let skip = match &node.callee {
            Callee::Expr(callee) => match &**callee {
                Expr::Ident(ident) => {
                    let name = ident.sym.as_str();
                    self.descriptor.is_translation_callee(name)
                        || self.descriptor.is_hook(name)
                        || self.descriptor.is_define_messages(name)
                }
                Expr::Member(member) => {
                    let obj = match &*member.obj {
                        Expr::Ident(obj) => obj.sym.as_str(),
                        Expr::This(_) => "this",
                        _ => "",
                    };
                    let method = match &member.prop {
                        MemberProp::Ident(prop) => prop.sym.as_str(),
                        _ => "",
                    };
                    obj == "console" || self.descriptor.is_translation_member(obj, method)
                }
                _ => false,
            },
            _ => false,
        };

        if skip {
            self.with_skip(|this| node.visit_children_with(this));
        } else {
            node.visit_children_with(self);
        }
    }

    fn visit_jsx_element(&mut self, node: &JSXElement) {
        if let JSXElementName::Ident(ident) = &node.opening.name
            && self.descriptor.is_message_component(ident.sym.as_str())
        {
            self.with_skip(|this| node.visit_children_with(this));
            return;
        }

        node.opening.visit_with(self);

        if self.try_rewrite_combined(node) {
            return;
        }
        for child in &node.children {
            child.visit_with(self);
        }
    }

    fn visit_jsx_text(&mut self, node: &JSXText) {
        if self.skip_depth > 0 {
            return;
        }
        let raw_value = &node.value;
        let trimmed = raw_value.trim();
        if trimmed.is_empty() {
            return;
        }
        let key = collapse_markup_whitespace(trimmed);
        let Some(target) = self.targets.get(&key) else {
            return;
        };

        let trim_start = raw_value.len() - raw_value.trim_start().len();
        let trim_end = raw_value.len() - raw_value.trim_end().len();
        let start = self.parsed.offset_of(node.span.lo) + trim_start;
        let end = self.parsed.offset_of(node.span.hi) - trim_end;
        let default = self.default_for(target);
        let call = self.descriptor.jsx_call(&target.id, default.as_deref(), &[]);
        self.arena.push(start, end, call);
    }

    fn visit_jsx_attr(&mut self, node: &JSXAttr) {
        match &node.value {
            Some(JSXAttrValue::Str(s)) => {
                if self.skip_depth > 0 {
                    return;
                }
                let Some(value) = s.value.as_str() else {
                    return;
                };
                let Some(target) = self.targets.get(value) else {
                    return;
                };
                let default = self.default_for(target);
                let call = self.descriptor.jsx_call(&target.id, default.as_deref(), &[]);
                let (start, end) = self.span_range(s.span);
                self.arena.push(start, end, call);
            }
            Some(other) => other.visit_children_with(self),
            None => {}
        }
    }

    fn visit_str(&mut self, node: &Str) {
        self.rewrite_code_str(node);
    }

    fn visit_tpl(&mut self, node: &Tpl) {
        if !self.rewrite_template(node) {
            node.visit_children_with(self);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::react::ReactExtractor;
    use crate::library::LibraryKind;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    fn descriptor() -> LibraryCapabilityDescriptor {
        LibraryCapabilityDescriptor::new(LibraryKind::ReactI18next, "@/i18n", None)
    }

    /// Extract + assign + rewrite an in-memory source.
    fn rewrite(source: &str, include_default: bool) -> String {
        let desc = descriptor();
        let extractor =
            ReactExtractor::new(desc.clone(), &crate::config::Config::default().technical_attributes);
        let mut extracted = extractor.extract_source(source, "src/forms/Login.tsx").unwrap();
        let assigner =
            crate::assign::IdentifierAssigner::from_config(&crate::config::Config::default());
        let mut existing = HashSet::new();
        assigner.assign_all(&mut extracted, &mut existing, None);
        ReactTransformer::new(desc)
            .rewrite_source(source, "src/forms/Login.tsx", &extracted, include_default)
            .unwrap()
    }

    #[test]
    fn test_jsx_text_rewrite() {
        let out = rewrite("export function Login() {\n  return <button>确认</button>;\n}\n", false);
        assert_eq!(
            out,
            "export function Login() {\n  return <button>{t('forms__Login__confirm')}</button>;\n}\n"
        );
    }

    #[test]
    fn test_jsx_text_rewrite_with_default() {
        let out = rewrite("const Login = () => <button>确认</button>;\n", true);
        assert!(out.contains("{t('forms__Login__confirm', '确认')}"));
    }

    #[test]
    fn test_attribute_rewrite() {
        let out = rewrite(r#"const Login = () => <input placeholder="请输入用户名" />;"#, false);
        assert!(out.contains(r#"placeholder={t("#));
        assert!(!out.contains("请输入用户名"));
    }

    #[test]
    fn test_code_string_in_component_uses_binding() {
        let out = rewrite(
            "export function Login() {\n  const message = '保存';\n  return null;\n}\n",
            false,
        );
        assert!(out.contains("const message = t('forms__Login__save');"));
    }

    #[test]
    fn test_code_string_at_module_level_uses_global() {
        let out = rewrite("const label = '保存';\n", false);
        assert_eq!(out, "const label = i18next.t('forms__Login__save');\n");
    }

    #[test]
    fn test_template_literal_rewrite() {
        let out = rewrite(
            "export function Login() {\n  const m = `共 ${count} 条记录`;\n  return null;\n}\n",
            false,
        );
        assert!(out.contains("const m = t('"), "got: {}", out);
        assert!(out.contains(", { count })"), "got: {}", out);
        assert!(!out.contains('`'));
    }

    #[test]
    fn test_mixed_children_rewrite() {
        let out = rewrite(
            "export function Login() {\n  return <p>你好 {user.name}，共 {count} 条</p>;\n}\n",
            false,
        );
        assert!(
            out.contains("{t('"),
            "combined children should become one call, got: {}",
            out
        );
        assert!(out.contains("{ name: user.name, count }"), "got: {}", out);
    }

    #[test]
    fn test_already_translated_site_untouched() {
        let source = "export function Login() {\n  return <p>{t('existing__id')}</p>;\n}\n";
        assert_eq!(rewrite(source, false), source);
    }

    #[test]
    fn test_console_untouched() {
        let source = "console.log('调试');\n";
        assert_eq!(rewrite(source, false), source);
    }

    #[test]
    fn test_unmatched_file_returns_source() {
        let source = "const x = 1;\n";
        assert_eq!(rewrite(source, false), source);
    }

    #[test]
    fn test_intl_variant_generates_format_message() {
        let desc = LibraryCapabilityDescriptor::new(LibraryKind::ReactIntl, "@/i18n", None);
        let extractor = ReactExtractor::new(desc.clone(), &[]);
        let source = "export function Login() {\n  return <button>确认</button>;\n}\n";
        let mut extracted = extractor.extract_source(source, "src/forms/Login.tsx").unwrap();
        let assigner =
            crate::assign::IdentifierAssigner::from_config(&crate::config::Config::default());
        let mut existing = HashSet::new();
        assigner.assign_all(&mut extracted, &mut existing, None);
        let out = ReactTransformer::new(desc)
            .rewrite_source(source, "src/forms/Login.tsx", &extracted, true)
            .unwrap();
        assert!(out.contains(
            "{intl.formatMessage({ id: 'forms__Login__confirm', defaultMessage: '确认' })}"
        ));
    }
}
