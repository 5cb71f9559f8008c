//! TSX text extraction.
//!
//! A single AST traversal collects every extractable string in a file:
//! JSX text nodes, checked attribute values, plain-code string literals,
//! template literals, and mixed text+expression children combined into one
//! template record. Sites already internationalized (recognized translation
//! calls and message components) and console-call arguments are skipped.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use swc_common::Spanned;
use swc_ecma_ast::{
    CallExpr, Callee, ClassDecl, Expr, FnDecl, JSXAttr, JSXAttrName, JSXAttrValue, JSXElement,
    JSXElementChild, JSXElementName, JSXExpr, JSXText, Lit, MemberProp, Pat, Str, Tpl,
    VarDeclarator,
};
use swc_ecma_visit::{Visit, VisitWith};

use crate::core::parsers::{ParsedTsx, parse_tsx_source};
use crate::core::{ComponentKind, ExtractedString, StringContext};
use crate::extract::{Extract, placeholder_name};
use crate::library::LibraryCapabilityDescriptor;
use crate::utils::{collapse_markup_whitespace, contains_ideographic, contains_latin};

/// Extractor for React/TSX sources.
pub struct ReactExtractor {
    descriptor: LibraryCapabilityDescriptor,
    technical_attributes: HashSet<String>,
}

impl ReactExtractor {
    pub fn new(
        descriptor: LibraryCapabilityDescriptor,
        technical_attributes: &[String],
    ) -> Self {
        Self {
            descriptor,
            technical_attributes: technical_attributes.iter().cloned().collect(),
        }
    }

    /// Extract from an in-memory source string.
    pub fn extract_source(&self, source: &str, file_path: &str) -> Result<Vec<ExtractedString>> {
        let parsed = parse_tsx_source(source.to_string(), file_path)?;
        let mut visitor = ExtractVisitor {
            file_path,
            parsed: &parsed,
            descriptor: &self.descriptor,
            technical_attributes: &self.technical_attributes,
            component_stack: Vec::new(),
            skip_depth: 0,
            results: Vec::new(),
        };
        visitor.visit_module(&parsed.module);
        Ok(visitor.results)
    }
}

impl Extract for ReactExtractor {
    fn extract_from_file(&self, root: &Path, file: &str) -> Result<Vec<ExtractedString>> {
        let full = root.join(file);
        let source = fs::read_to_string(&full)
            .with_context(|| format!("Failed to read source file: {}", full.display()))?;
        self.extract_source(&source, file)
    }
}

struct ExtractVisitor<'a> {
    file_path: &'a str,
    parsed: &'a ParsedTsx,
    descriptor: &'a LibraryCapabilityDescriptor,
    technical_attributes: &'a HashSet<String>,
    /// Innermost enclosing component kind.
    component_stack: Vec<ComponentKind>,
    /// Non-zero while inside a recognized translation call, a message
    /// component, or a console call, where nothing is extracted.
    skip_depth: usize,
    results: Vec<ExtractedString>,
}

impl<'a> ExtractVisitor<'a> {
    fn component_kind(&self) -> ComponentKind {
        self.component_stack.last().copied().unwrap_or_default()
    }

    fn location(&self, pos: swc_common::BytePos) -> (usize, usize) {
        let loc = self.parsed.source_map.lookup_char_pos(pos);
        (loc.line, loc.col_display + 1)
    }

    fn slice(&self, span: swc_common::Span) -> &str {
        let start = self.parsed.offset_of(span.lo);
        let end = self.parsed.offset_of(span.hi);
        &self.parsed.source[start..end]
    }

    fn push_result(
        &mut self,
        original: String,
        processed: Option<String>,
        pos: swc_common::BytePos,
        context: StringContext,
        is_template: bool,
        variables: Vec<String>,
    ) {
        let (line, column) = self.location(pos);
        self.results.push(ExtractedString {
            original,
            processed_message: processed,
            semantic_id: String::new(),
            file_path: self.file_path.to_string(),
            line,
            column,
            context,
            component_kind: self.component_kind(),
            is_template_literal: is_template,
            template_variables: variables,
        });
    }

    /// Plain-code string literals require ideographic text; the Latin
    /// heuristic applies only to markup text.
    fn check_code_str(&mut self, node: &Str) {
        if self.skip_depth > 0 {
            return;
        }
        let Some(value) = node.value.as_str() else {
            return;
        };
        if value.trim().is_empty() || !contains_ideographic(value) {
            return;
        }
        self.push_result(
            value.to_string(),
            None,
            node.span.lo,
            StringContext::Code,
            false,
            Vec::new(),
        );
    }

    fn check_template_literal(&mut self, node: &Tpl) -> bool {
        if self.skip_depth > 0 {
            return true;
        }
        // Extract whole only if at least one static segment is ideographic.
        let has_ideographic = node.quasis.iter().any(|q| {
            q.cooked
                .as_ref()
                .and_then(|c| c.as_str())
                .is_some_and(contains_ideographic)
        });
        if !has_ideographic {
            return false;
        }

        let mut message = String::new();
        let mut variables = Vec::new();
        for (i, quasi) in node.quasis.iter().enumerate() {
            if let Some(cooked) = quasi.cooked.as_ref().and_then(|c| c.as_str()) {
                message.push_str(cooked);
            }
            if i < node.exprs.len() {
                let expr = &node.exprs[i];
                match literal_text(expr) {
                    // Compile-time literals are inlined into the message.
                    Some(lit) => message.push_str(&lit),
                    None => {
                        let src = self.slice(expr.span()).to_string();
                        let name = placeholder_name(&src, i, &variables);
                        message.push_str(&self.descriptor.placeholder(&name));
                        variables.push(name);
                    }
                }
            }
        }

        let original = self.slice(node.span).to_string();
        self.push_result(
            original,
            Some(message),
            node.span.lo,
            StringContext::Template,
            true,
            variables,
        );
        true
    }

    /// Combined extraction for mixed text+expression children.
    ///
    /// Fires only when every child is a text or expression node, at least
    /// one text fragment is ideographic, and at least one expression child
    /// exists. The whole child run becomes a single template record.
    fn try_combine_children(&mut self, node: &JSXElement) -> bool {
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
                JSXElementChild::JSXExprContainer(container) => {
                    match &container.expr {
                        JSXExpr::JSXEmptyExpr(_) => {}
                        JSXExpr::Expr(_) => has_expr = true,
                    }
                }
                _ => return false,
            }
        }
        if !has_expr || !has_ideographic_text {
            return false;
        }

        let mut raw = String::new();
        let mut variables: Vec<String> = Vec::new();
        let mut span_lo: Option<swc_common::BytePos> = None;
        let mut span_hi = swc_common::BytePos(0);
        let mut expr_index = 0usize;
        for child in &node.children {
            match child {
                JSXElementChild::JSXText(text) => {
                    raw.push_str(&text.value);
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
                        let src = self.slice(expr.span()).to_string();
                        let name = placeholder_name(&src, expr_index, &variables);
                        raw.push_str(&self.descriptor.placeholder(&name));
                        variables.push(name);
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
        let original = self.parsed.source[start..end].to_string();
        let message = collapse_markup_whitespace(&raw);
        self.push_result(
            original,
            Some(message),
            lo,
            StringContext::Template,
            false,
            variables,
        );
        true
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
}

/// Compile-time literal text for template-literal inlining.
fn literal_text(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Lit(Lit::Str(s)) => s.value.as_str().map(|v| v.to_string()),
        Expr::Lit(Lit::Num(n)) => Some(n.value.to_string()),
        Expr::Lit(Lit::Bool(b)) => Some(b.value.to_string()),
        _ => None,
    }
}

fn starts_uppercase(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_uppercase())
}

impl<'a> Visit for ExtractVisitor<'a> {
    fn visit_import_decl(&mut self, _node: &swc_ecma_ast::ImportDecl) {
        // Module specifiers are never natural language.
    }

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
            // Already internationalized; don't extract from it at all.
            self.with_skip(|this| node.visit_children_with(this));
            return;
        }

        node.opening.visit_with(self);

        if self.try_combine_children(node) {
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
        // Markup text: ideographic always, Latin by the framework heuristic.
        if !contains_ideographic(trimmed) && !contains_latin(trimmed) {
            return;
        }

        let trim_start_offset = raw_value.len() - raw_value.trim_start().len();
        let actual_pos = node.span.lo + swc_common::BytePos(trim_start_offset as u32);
        let text = collapse_markup_whitespace(trimmed);
        self.push_result(
            text,
            None,
            actual_pos,
            StringContext::TextNode,
            false,
            Vec::new(),
        );
    }

    fn visit_jsx_attr(&mut self, node: &JSXAttr) {
        let attr_name = match &node.name {
            JSXAttrName::Ident(ident) => ident.sym.to_string(),
            JSXAttrName::JSXNamespacedName(ns) => {
                format!("{}-{}", ns.ns.sym, ns.name.sym)
            }
        };

        match &node.value {
            Some(JSXAttrValue::Str(s)) => {
                if self.skip_depth > 0 {
                    return;
                }
                let Some(value) = s.value.as_str() else {
                    return;
                };
                if value.trim().is_empty() {
                    return;
                }
                let ideographic = contains_ideographic(value);
                // Technical attributes only pass with ideographic values.
                if self.technical_attributes.contains(&attr_name) && !ideographic {
                    return;
                }
                if !ideographic && !contains_latin(value) {
                    return;
                }
                self.push_result(
                    value.to_string(),
                    None,
                    s.span.lo,
                    StringContext::Attribute,
                    false,
                    Vec::new(),
                );
            }
            Some(other) => other.visit_children_with(self),
            None => {}
        }
    }

    fn visit_str(&mut self, node: &Str) {
        self.check_code_str(node);
    }

    fn visit_tpl(&mut self, node: &Tpl) {
        // When the template was not extracted whole, interpolated
        // expressions may still contain extractable literals of their own.
        if !self.check_template_literal(node) {
            node.visit_children_with(self);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::LibraryKind;
    use pretty_assertions::assert_eq;

    fn extractor() -> ReactExtractor {
        ReactExtractor::new(
            LibraryCapabilityDescriptor::new(LibraryKind::ReactI18next, "@/i18n", None),
            &crate::config::Config::default().technical_attributes,
        )
    }

    fn extract(source: &str) -> Vec<ExtractedString> {
        extractor().extract_source(source, "src/forms/Login.tsx").unwrap()
    }

    #[test]
    fn test_jsx_text_extraction() {
        let results = extract(
            r#"
export function Login() {
  return <button>确认</button>;
}
"#,
        );
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].original, "确认");
        assert_eq!(results[0].context, StringContext::TextNode);
        assert_eq!(results[0].component_kind, ComponentKind::Function);
        assert_eq!(results[0].line, 3);
    }

    #[test]
    fn test_latin_jsx_text_extracted() {
        let results = extract("export const C = () => <p>Submit now</p>;");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].original, "Submit now");
    }

    #[test]
    fn test_numeric_jsx_text_skipped() {
        let results = extract("export const C = () => <p>12345</p>;");
        assert!(results.is_empty());
    }

    #[test]
    fn test_code_string_requires_ideographic() {
        let results = extract(
            r#"
const zh = '保存失败';
const en = 'plain english';
"#,
        );
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].original, "保存失败");
        assert_eq!(results[0].context, StringContext::Code);
    }

    #[test]
    fn test_already_translated_call_skipped() {
        let results = extract(
            r#"
export function C() {
  const { t } = useTranslation();
  return <p>{t('forms__Login__confirm')}</p>;
}
"#,
        );
        assert!(results.is_empty());
    }

    #[test]
    fn test_global_accessor_call_skipped() {
        let results = extract("const msg = i18next.t('a__b', '确认');");
        assert!(results.is_empty());
    }

    #[test]
    fn test_console_arguments_skipped() {
        let results = extract(r#"console.log('调试信息');"#);
        assert!(results.is_empty());
    }

    #[test]
    fn test_message_component_skipped() {
        let extractor = ReactExtractor::new(
            LibraryCapabilityDescriptor::new(LibraryKind::ReactIntl, "@/i18n", None),
            &[],
        );
        let results = extractor
            .extract_source(
                r#"const C = () => <FormattedMessage id="x" defaultMessage="确认" />;"#,
                "src/C.tsx",
            )
            .unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_technical_attribute_denied() {
        let results = extract(r#"const C = () => <div className="btn primary" title="请输入" />;"#);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].original, "请输入");
        assert_eq!(results[0].context, StringContext::Attribute);
    }

    #[test]
    fn test_technical_attribute_with_ideographic_kept() {
        let results = extract(r#"const C = () => <div data-testid="确认按钮" />;"#);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].original, "确认按钮");
    }

    #[test]
    fn test_template_literal_whole_extraction() {
        let results = extract("const msg = `共 ${count} 条记录`;");
        assert_eq!(results.len(), 1);
        let record = &results[0];
        assert!(record.is_template_literal);
        assert_eq!(record.context, StringContext::Template);
        assert_eq!(record.processed_message.as_deref(), Some("共 {{count}} 条记录"));
        assert_eq!(record.template_variables, vec!["count"]);
        assert!(record.original.starts_with('`'));
    }

    #[test]
    fn test_template_literal_without_ideographic_skipped() {
        let results = extract("const msg = `hello ${name}`;");
        assert!(results.is_empty());
    }

    #[test]
    fn test_template_literal_inlines_literals() {
        let results = extract("const msg = `共 ${3} 条`;");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].processed_message.as_deref(), Some("共 3 条"));
        assert!(results[0].template_variables.is_empty());
    }

    #[test]
    fn test_mixed_children_combined() {
        let results = extract(
            r#"
export function Rows() {
  return <p>你好 {user.name}，共 {count} 条</p>;
}
"#,
        );
        assert_eq!(results.len(), 1);
        let record = &results[0];
        assert_eq!(record.context, StringContext::Template);
        assert_eq!(
            record.processed_message.as_deref(),
            Some("你好 {{name}}，共 {{count}} 条")
        );
        assert_eq!(record.template_variables, vec!["name", "count"]);
        assert!(record.original.contains("user.name"));
    }

    #[test]
    fn test_mixed_children_without_ideographic_not_combined() {
        let results = extract("const C = () => <p>hello {name} world</p>;");
        // Falls back to per-fragment extraction of the Latin text nodes.
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].original, "hello");
        assert_eq!(results[1].original, "world");
    }

    #[test]
    fn test_class_component_kind() {
        let results = extract(
            r#"
class Settings extends React.Component {
  render() {
    return <h1>设置</h1>;
  }
}
"#,
        );
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].component_kind, ComponentKind::Class);
    }

    #[test]
    fn test_import_specifiers_ignored() {
        let results = extract("import x from '某个模块';");
        assert!(results.is_empty());
    }

    #[test]
    fn test_parse_error_is_err() {
        let result = extractor().extract_source("const = <<<", "bad.tsx");
        assert!(result.is_err());
    }
}
