//! TSX restore transformation.
//!
//! Recognized translation calls are rewritten back to string literals or
//! reconstructed template literals, with interpolations recovered in
//! original order from the call's values argument. Wrapper machinery left
//! by HOC injection is unwound syntactically, and cleanup passes then
//! remove bindings and imports nothing uses anymore.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use swc_common::{Span, Spanned};
use swc_ecma_ast::{
    CallExpr, Callee, Decl, Expr, JSXAttr, JSXAttrValue, JSXElement, JSXElementChild, JSXExpr,
    Lit, MemberProp, ModuleDecl, ModuleItem, ObjectLit, Pat, Prop, PropName, PropOrSpread, Stmt,
};
use swc_ecma_visit::{Visit, VisitWith};

use crate::core::parsers::{ParsedTsx, parse_tsx_source};
use crate::core::{EditArena, TransformContext};
use crate::library::LibraryCapabilityDescriptor;
use crate::locale::LocaleMap;
use crate::restore::registry::{message_info_from_object, scan_defined_messages};
use crate::restore::{Restore, split_message};
use crate::transform::cleanup::cleanup_source;

/// Restore transformer for React/TSX sources.
pub struct ReactRestorer {
    descriptor: LibraryCapabilityDescriptor,
}

impl ReactRestorer {
    pub fn new(descriptor: LibraryCapabilityDescriptor) -> Self {
        Self { descriptor }
    }

    /// Restore one source string; `None` when no rewrite fired.
    pub fn restore_source(
        &self,
        source: &str,
        file_path: &str,
        locale_map: &LocaleMap,
    ) -> Result<Option<String>> {
        let parsed = parse_tsx_source(source.to_string(), file_path)?;

        let mut ctx = TransformContext::new(locale_map);
        ctx.defined_messages = scan_defined_messages(&parsed, &self.descriptor);

        let mut visitor = RestoreVisitor {
            parsed: &parsed,
            descriptor: &self.descriptor,
            ctx,
            arena: EditArena::new(),
        };
        visitor.visit_module(&parsed.module);

        let mut arena = visitor.arena;
        let unwrapped = unwrap_hocs(&parsed, &self.descriptor, &mut arena);

        if arena.is_empty() && !unwrapped {
            return Ok(None);
        }

        let restored = arena.apply(source);
        let cleaned = cleanup_source(&restored, file_path, &self.descriptor)?;
        if cleaned == source {
            Ok(None)
        } else {
            Ok(Some(cleaned))
        }
    }
}

impl Restore for ReactRestorer {
    fn restore_file(
        &self,
        root: &Path,
        file: &str,
        locale_map: &LocaleMap,
    ) -> Result<Option<String>> {
        let full = root.join(file);
        let source = fs::read_to_string(&full)
            .with_context(|| format!("Failed to read source file: {}", full.display()))?;
        self.restore_source(&source, file, locale_map)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Surface {
    Code,
    JsxChildren,
    JsxAttr,
}

struct RestoreVisitor<'a, 'm> {
    parsed: &'a ParsedTsx,
    descriptor: &'a LibraryCapabilityDescriptor,
    ctx: TransformContext<'m>,
    arena: EditArena,
}

impl<'a, 'm> RestoreVisitor<'a, 'm> {
    fn span_range(&self, span: Span) -> (usize, usize) {
        (self.parsed.offset_of(span.lo), self.parsed.offset_of(span.hi))
    }

    fn slice(&self, span: Span) -> &str {
        let (start, end) = self.span_range(span);
        &self.parsed.source[start..end]
    }

    /// Decode a recognized translation call into (id, values).
    fn decode_call(&self, call: &CallExpr) -> Option<(String, Vec<(String, String)>)> {
        let Callee::Expr(callee) = &call.callee else {
            return None;
        };

        match &**callee {
            Expr::Ident(ident) if self.descriptor.is_translation_callee(ident.sym.as_str()) => {
                let id = first_string_arg(call)?;
                Some((id, self.values_from_args(call)))
            }
            Expr::Member(member) => {
                let obj = match &*member.obj {
                    Expr::Ident(obj) => obj.sym.as_str(),
                    Expr::This(_) => "this",
                    _ => return None,
                };
                let MemberProp::Ident(prop) = &member.prop else {
                    return None;
                };
                let method = prop.sym.as_str();
                if !self.descriptor.is_translation_member(obj, method) {
                    return None;
                }

                if method == "formatMessage" {
                    let first = call.args.first()?;
                    let info = match &*first.expr {
                        Expr::Object(object) => message_info_from_object(object)?,
                        // A defined-messages reference: messages.key or CONST.
                        other => {
                            let path = reference_path(other)?;
                            self.ctx.defined_messages.get(&path)?.clone()
                        }
                    };
                    let id = info.id?;
                    let values = call
                        .args
                        .get(1)
                        .and_then(|arg| match &*arg.expr {
                            Expr::Object(object) => Some(self.decode_values(object)),
                            _ => None,
                        })
                        .unwrap_or_default();
                    Some((id, values))
                } else {
                    let id = first_string_arg(call)?;
                    Some((id, self.values_from_args(call)))
                }
            }
            _ => None,
        }
    }

    /// Values object from any trailing argument of a `t(...)`-style call.
    fn values_from_args(&self, call: &CallExpr) -> Vec<(String, String)> {
        call.args
            .iter()
            .skip(1)
            .find_map(|arg| match &*arg.expr {
                Expr::Object(object) => Some(self.decode_values(object)),
                _ => None,
            })
            .unwrap_or_default()
    }

    fn decode_values(&self, object: &ObjectLit) -> Vec<(String, String)> {
        let mut values = Vec::new();
        for prop in &object.props {
            let PropOrSpread::Prop(prop) = prop else {
                continue;
            };
            match &**prop {
                Prop::Shorthand(ident) => {
                    values.push((ident.sym.to_string(), ident.sym.to_string()));
                }
                Prop::KeyValue(kv) => {
                    let name = match &kv.key {
                        PropName::Ident(ident) => ident.sym.to_string(),
                        PropName::Str(s) => match s.value.as_str() {
                            Some(v) => v.to_string(),
                            None => continue,
                        },
                        _ => continue,
                    };
                    values.push((name, self.slice(kv.value.span()).to_string()));
                }
                _ => {}
            }
        }
        values
    }

    /// Rewrite one recognized call site. Fails open on unknown ids and
    /// unresolvable placeholders.
    fn restore_call(
        &mut self,
        call: &CallExpr,
        surface: Surface,
        container_span: Option<Span>,
    ) -> bool {
        let Some((id, values)) = self.decode_call(call) else {
            return false;
        };
        let Some(text) = self.ctx.lookup(&id).map(|t| t.to_string()) else {
            return false;
        };

        let names = self.descriptor.parse_placeholders(&text);
        let replacement_span = match surface {
            Surface::Code => call.span,
            Surface::JsxChildren | Surface::JsxAttr => container_span.unwrap_or(call.span),
        };

        let replacement = if names.is_empty() {
            match surface {
                Surface::Code => quote_single(&text),
                Surface::JsxChildren => text.clone(),
                Surface::JsxAttr => {
                    if text.contains('"') {
                        format!("{{{}}}", quote_single(&text))
                    } else {
                        format!("\"{}\"", text)
                    }
                }
            }
        } else {
            let Some(exprs) = resolve_placeholder_exprs(&names, &values) else {
                return false;
            };
            let Some(segments) = split_message(
                &text,
                &names,
                self.descriptor.placeholder_open,
                self.descriptor.placeholder_close,
            ) else {
                return false;
            };
            match surface {
                Surface::Code => build_template_literal(&segments, &exprs),
                Surface::JsxChildren => build_jsx_run(&segments, &exprs),
                Surface::JsxAttr => {
                    format!("{{{}}}", build_template_literal(&segments, &exprs))
                }
            }
        };

        let (start, end) = self.span_range(replacement_span);
        self.arena.push(start, end, replacement);
        self.ctx.mark_dirty();
        true
    }
}

fn first_string_arg(call: &CallExpr) -> Option<String> {
    let first = call.args.first()?;
    match &*first.expr {
        Expr::Lit(Lit::Str(s)) => s.value.as_str().map(|v| v.to_string()),
        _ => None,
    }
}

/// `messages.key` / `CONST` reference path text.
fn reference_path(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Ident(ident) => Some(ident.sym.to_string()),
        Expr::Member(member) => {
            let obj = reference_path(&member.obj)?;
            let MemberProp::Ident(prop) = &member.prop else {
                return None;
            };
            Some(format!("{}.{}", obj, prop.sym))
        }
        _ => None,
    }
}

/// Match placeholder names to their value expressions, preserving
/// placeholder order.
fn resolve_placeholder_exprs(names: &[String], values: &[(String, String)]) -> Option<Vec<String>> {
    names
        .iter()
        .map(|name| {
            values
                .iter()
                .find(|(value_name, _)| value_name == name)
                .map(|(_, expr)| expr.clone())
        })
        .collect()
}

fn quote_single(text: &str) -> String {
    format!("'{}'", text.replace('\\', "\\\\").replace('\'', "\\'"))
}

fn build_template_literal(segments: &[&str], exprs: &[String]) -> String {
    let mut out = String::from("`");
    for (i, segment) in segments.iter().enumerate() {
        out.push_str(&segment.replace('`', "\\`").replace("${", "\\${"));
        if i < exprs.len() {
            out.push_str("${");
            out.push_str(&exprs[i]);
            out.push('}');
        }
    }
    out.push('`');
    out
}

fn build_jsx_run(segments: &[&str], exprs: &[String]) -> String {
    let mut out = String::new();
    for (i, segment) in segments.iter().enumerate() {
        out.push_str(segment);
        if i < exprs.len() {
            out.push('{');
            out.push_str(&exprs[i]);
            out.push('}');
        }
    }
    out
}

impl<'a, 'm> Visit for RestoreVisitor<'a, 'm> {
    fn visit_jsx_element(&mut self, node: &JSXElement) {
        node.opening.visit_with(self);
        for child in &node.children {
            if let JSXElementChild::JSXExprContainer(container) = child
                && let JSXExpr::Expr(expr) = &container.expr
                && let Expr::Call(call) = &**expr
                && self.restore_call(call, Surface::JsxChildren, Some(container.span))
            {
                continue;
            }
            child.visit_with(self);
        }
        if let Some(closing) = &node.closing {
            closing.visit_with(self);
        }
    }

    fn visit_jsx_attr(&mut self, node: &JSXAttr) {
        if let Some(JSXAttrValue::JSXExprContainer(container)) = &node.value
            && let JSXExpr::Expr(expr) = &container.expr
            && let Expr::Call(call) = &**expr
            && self.restore_call(call, Surface::JsxAttr, Some(container.span))
        {
            return;
        }
        node.visit_children_with(self);
    }

    fn visit_call_expr(&mut self, node: &CallExpr) {
        if self.restore_call(node, Surface::Code, None) {
            return;
        }
        node.visit_children_with(self);
    }
}

// ============================================================
// HOC unwrapping
// ============================================================

/// Unwind `const Foo = withTranslation()(_Foo);`-style wrapper machinery.
///
/// Detection is a naming-convention heuristic, not a structural
/// guarantee: only wrapper arguments whose name carries a leading
/// underscore are treated as generated wrappers. Hand-written classes
/// that merely look similar are left alone.
fn unwrap_hocs(
    parsed: &ParsedTsx,
    descriptor: &LibraryCapabilityDescriptor,
    arena: &mut EditArena,
) -> bool {
    let mut renames: Vec<(String, String)> = Vec::new();

    for item in &parsed.module.body {
        match item {
            ModuleItem::Stmt(Stmt::Decl(Decl::Var(var))) => {
                if let Some((public, inner)) = wrapper_binding(var, descriptor) {
                    remove_item_line(parsed, item.span(), arena);
                    renames.push((inner, public));
                }
            }
            ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(export)) => {
                if let Decl::Var(var) = &export.decl
                    && let Some((public, inner)) = wrapper_binding(var, descriptor)
                {
                    remove_item_line(parsed, export.span, arena);
                    renames.push((inner.clone(), public));
                    // The class takes the wrapper's export position back.
                    if let Some(class_span) = class_decl_span(parsed, &inner) {
                        let at = parsed.offset_of(class_span.lo);
                        arena.insert(at, "export ".to_string());
                    }
                }
            }
            ModuleItem::ModuleDecl(ModuleDecl::ExportDefaultExpr(export)) => {
                if let Expr::Call(call) = &*export.expr
                    && let Some(inner) = wrapped_ident(call, descriptor)
                {
                    let public = inner.trim_start_matches('_').to_string();
                    let (start, end) = (
                        parsed.offset_of(export.expr.span().lo),
                        parsed.offset_of(export.expr.span().hi),
                    );
                    arena.push(start, end, public.clone());
                    renames.push((inner, public));
                }
            }
            _ => {}
        }
    }

    if renames.is_empty() {
        return false;
    }

    for item in &parsed.module.body {
        let class_decl = match item {
            ModuleItem::Stmt(Stmt::Decl(Decl::Class(class_decl))) => class_decl,
            ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(export)) => match &export.decl {
                Decl::Class(class_decl) => class_decl,
                _ => continue,
            },
            _ => continue,
        };
        let name = class_decl.ident.sym.to_string();
        let Some((_, public)) = renames.iter().find(|(inner, _)| *inner == name) else {
            continue;
        };

        let (start, end) = (
            parsed.offset_of(class_decl.ident.span.lo),
            parsed.offset_of(class_decl.ident.span.hi),
        );
        arena.push(start, end, public.clone());

        // Narrow the widened props type back down.
        if let Some(props) = descriptor.wrapper_props
            && let Some(type_params) = &class_decl.class.super_type_params
            && let Some(first) = type_params.params.first()
        {
            let param_start = parsed.offset_of(first.span().lo);
            let param_end = parsed.offset_of(first.span().hi);
            let param_text = &parsed.source[param_start..param_end];
            let widened = format!(" & {}", props);
            if let Some(at) = param_text.find(&widened) {
                arena.push(param_start + at, param_start + at + widened.len(), "");
            }
        }
    }

    true
}

/// `const Foo = withTranslation()(_Foo);` → `("Foo", "_Foo")`.
fn wrapper_binding(
    var: &swc_ecma_ast::VarDecl,
    descriptor: &LibraryCapabilityDescriptor,
) -> Option<(String, String)> {
    let [declarator] = var.decls.as_slice() else {
        return None;
    };
    let Pat::Ident(name) = &declarator.name else {
        return None;
    };
    let Some(Expr::Call(call)) = declarator.init.as_deref() else {
        return None;
    };
    let inner = wrapped_ident(call, descriptor)?;
    Some((name.id.sym.to_string(), inner))
}

/// The leading-underscore argument of a direct or curried HOC call.
fn wrapped_ident(call: &CallExpr, descriptor: &LibraryCapabilityDescriptor) -> Option<String> {
    let callee_is_hoc = match &call.callee {
        Callee::Expr(callee) => match &**callee {
            Expr::Ident(ident) => descriptor.is_hoc(ident.sym.as_str()),
            Expr::Call(inner) => match &inner.callee {
                Callee::Expr(inner_callee) => match &**inner_callee {
                    Expr::Ident(ident) => descriptor.is_hoc(ident.sym.as_str()),
                    _ => false,
                },
                _ => false,
            },
            _ => false,
        },
        _ => false,
    };
    if !callee_is_hoc {
        return None;
    }
    let arg = call.args.first()?;
    let Expr::Ident(ident) = &*arg.expr else {
        return None;
    };
    let name = ident.sym.as_str();
    name.starts_with('_').then(|| name.to_string())
}

fn class_decl_span(parsed: &ParsedTsx, class_name: &str) -> Option<Span> {
    for item in &parsed.module.body {
        if let ModuleItem::Stmt(Stmt::Decl(Decl::Class(class_decl))) = item
            && class_decl.ident.sym.as_str() == class_name
        {
            return Some(class_decl.class.span);
        }
    }
    None
}

fn remove_item_line(parsed: &ParsedTsx, span: Span, arena: &mut EditArena) {
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

    fn restorer() -> ReactRestorer {
        ReactRestorer::new(LibraryCapabilityDescriptor::new(
            LibraryKind::ReactI18next,
            "@/i18n",
            None,
        ))
    }

    fn locale_map(entries: &[(&str, &str)]) -> LocaleMap {
        let mut map = LocaleMap::empty("zh.json");
        for (id, text) in entries {
            map.insert(*id, *text);
        }
        map
    }

    #[test]
    fn test_restore_jsx_text_call() {
        let map = locale_map(&[("forms__Login__confirm", "确认")]);
        let source = "export function Login() {\n  const { t } = useTranslation();\n  return <button>{t('forms__Login__confirm')}</button>;\n}\n";
        let out = restorer().restore_source(source, "Login.tsx", &map).unwrap().unwrap();
        assert_eq!(out, "export function Login() {\n  return <button>确认</button>;\n}\n");
    }

    #[test]
    fn test_restore_code_call() {
        let map = locale_map(&[("forms__Login__save", "保存")]);
        let source = "const label = i18next.t('forms__Login__save');\n";
        let out = restorer().restore_source(source, "x.ts", &map).unwrap().unwrap();
        assert_eq!(out, "const label = '保存';\n");
    }

    #[test]
    fn test_restore_attr_call() {
        let map = locale_map(&[("a__b", "请输入")]);
        let source = "const C = () => <input placeholder={t('a__b')} />;\n";
        let out = restorer().restore_source(source, "C.tsx", &map).unwrap().unwrap();
        assert!(out.contains(r#"placeholder="请输入""#));
    }

    #[test]
    fn test_restore_template_with_values() {
        let map = locale_map(&[("a__b", "共 {{count}} 条记录")]);
        let source = "export function C() {\n  const { t } = useTranslation();\n  const m = t('a__b', { count });\n  return m;\n}\n";
        let out = restorer().restore_source(source, "C.tsx", &map).unwrap().unwrap();
        assert!(out.contains("const m = `共 ${count} 条记录`;"), "got: {}", out);
    }

    #[test]
    fn test_restore_jsx_children_with_values() {
        let map = locale_map(&[("a__b", "你好 {{name}}，共 {{count}} 条")]);
        let source = "const C = () => {\n  const { t } = useTranslation();\n  return <p>{t('a__b', { name: user.name, count })}</p>;\n};\n";
        let out = restorer().restore_source(source, "C.tsx", &map).unwrap().unwrap();
        assert!(out.contains("<p>你好 {user.name}，共 {count} 条</p>"), "got: {}", out);
    }

    #[test]
    fn test_unknown_id_fails_open() {
        let map = locale_map(&[]);
        let source = "const label = t('unknown__id');\n";
        let out = restorer().restore_source(source, "x.ts", &map).unwrap();
        assert!(out.is_none());
    }

    #[test]
    fn test_missing_placeholder_value_fails_open() {
        let map = locale_map(&[("a__b", "共 {{count}} 条")]);
        // Values object lacks `count`.
        let source = "const m = t('a__b', { total });\n";
        let out = restorer().restore_source(source, "x.ts", &map).unwrap();
        assert!(out.is_none());
    }

    #[test]
    fn test_defined_messages_reference() {
        let descriptor = LibraryCapabilityDescriptor::new(LibraryKind::ReactIntl, "@/i18n", None);
        let restorer = ReactRestorer::new(descriptor);
        let map = locale_map(&[("views__Home__greeting", "你好")]);
        let source = r#"const messages = defineMessages({
  greeting: { id: 'views__Home__greeting', defaultMessage: '你好' },
});

export function Home() {
  const intl = useIntl();
  return <p>{intl.formatMessage(messages.greeting)}</p>;
}
"#;
        let out = restorer.restore_source(source, "Home.tsx", &map).unwrap().unwrap();
        assert!(out.contains("<p>你好</p>"), "got: {}", out);
    }

    #[test]
    fn test_hoc_unwrap() {
        let map = locale_map(&[("views__Settings__title", "设置")]);
        let source = r#"import { withTranslation, WithTranslation } from 'react-i18next';

class _Settings extends React.Component<Props & WithTranslation> {
  render() {
    const { t } = this.props;
    return <h1>{t('views__Settings__title')}</h1>;
  }
}

export const Settings = withTranslation()(_Settings);
"#;
        let out = restorer().restore_source(source, "Settings.tsx", &map).unwrap().unwrap();
        assert!(out.contains("export class Settings extends React.Component<Props>"), "got: {}", out);
        assert!(out.contains("<h1>设置</h1>"));
        assert!(!out.contains("withTranslation"));
        assert!(!out.contains("this.props"));
        assert!(!out.contains("_Settings"));
    }

    #[test]
    fn test_underscore_class_without_wrapper_untouched() {
        let map = locale_map(&[]);
        let source = "class _Internal {\n  helper() {\n    return 1;\n  }\n}\n";
        let out = restorer().restore_source(source, "x.ts", &map).unwrap();
        assert!(out.is_none());
    }

    #[test]
    fn test_wrapper_without_underscore_arg_untouched() {
        // Adversarial: looks like a wrapper but the argument does not carry
        // the generated-name marker.
        let map = locale_map(&[]);
        let source = "const Settings = withTranslation()(Settings2);\n";
        let out = restorer().restore_source(source, "x.ts", &map).unwrap();
        assert!(out.is_none());
    }

    #[test]
    fn test_default_export_unwrap() {
        let map = locale_map(&[]);
        let source = r#"class _Page extends React.Component {
  render() {
    return <div>static</div>;
  }
}

export default withTranslation()(_Page);
"#;
        let out = restorer().restore_source(source, "Page.tsx", &map).unwrap().unwrap();
        assert!(out.contains("class Page extends React.Component"));
        assert!(out.contains("export default Page;"));
    }
}
