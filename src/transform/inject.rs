//! Capability injection.
//!
//! After call-site rewriting, components that use a translation call
//! without a binding in scope get one injected. The operation is two-pass:
//! pass 1 walks the rewritten tree and decides, per component, whether it
//! needs a hook statement (function components) or a HOC wrap (class
//! components), plus which imports are required. The imports are applied
//! first, the file is re-parsed, and pass 2 computes body edits against
//! the final text so every offset is valid when applied.

use std::collections::HashSet;

use anyhow::Result;
use swc_common::Spanned;
use swc_ecma_ast::{
    BlockStmtOrExpr, CallExpr, Callee, Class, ClassDecl, ClassMember, Decl, DefaultDecl, Expr,
    Module, ModuleDecl, ModuleItem, Pat, Stmt,
};
use swc_ecma_visit::{Visit, VisitWith};

use crate::core::EditArena;
use crate::core::parsers::{ParsedTsx, parse_tsx_source};
use crate::library::LibraryCapabilityDescriptor;
use crate::transform::imports::{ImportManager, ImportNeeds};

pub struct ComponentInjector {
    descriptor: LibraryCapabilityDescriptor,
}

/// Pass-1 decisions, keyed by component name so pass 2 can relocate the
/// components after the import edit shifts every offset.
#[derive(Debug, Default)]
struct InjectPlan {
    hook_components: HashSet<String>,
    hoc_classes: HashSet<String>,
    needs: ImportNeeds,
}

impl ComponentInjector {
    pub fn new(descriptor: LibraryCapabilityDescriptor) -> Self {
        Self { descriptor }
    }

    /// Inject translation capability where components newly need it.
    pub fn inject(&self, source: &str, file_path: &str) -> Result<String> {
        let parsed = parse_tsx_source(source.to_string(), file_path)?;
        let plan = self.scan(&parsed.module);
        if !plan.needs.any() {
            return Ok(source.to_string());
        }

        // Imports first; body edits are computed against the re-parsed
        // result so every offset is valid in the final text.
        let manager = ImportManager::new(self.descriptor.clone());
        let with_imports = manager.add_i18n_imports(source, file_path, &plan.needs)?;

        let parsed = parse_tsx_source(with_imports.clone(), file_path)?;
        let mut arena = EditArena::new();
        self.apply_bindings(&parsed, &plan, &mut arena);
        Ok(arena.apply(&with_imports))
    }

    // ============================================================
    // Pass 1: decisions
    // ============================================================

    fn scan(&self, module: &Module) -> InjectPlan {
        let mut plan = InjectPlan::default();
        let wrapped = wrapped_class_names(module, &self.descriptor);

        for_each_component(module, |component| match component {
            ComponentDecl::Function { name, body } => {
                let (uses, has_hook) = scan_body(body, &self.descriptor);
                if uses && !has_hook {
                    plan.hook_components.insert(name.to_string());
                    plan.needs.hook = true;
                }
            }
            ComponentDecl::Class { name, class } => {
                if wrapped.contains(name) {
                    return;
                }
                let any_method_uses =
                    class_methods(class).any(|body| scan_body(body, &self.descriptor).0);
                if any_method_uses && self.descriptor.hoc.is_some() {
                    plan.hoc_classes.insert(name.to_string());
                    plan.needs.hoc = true;
                }
            }
        });

        if module_uses_global(module, &self.descriptor) {
            plan.needs.global = true;
        }
        plan
    }

    // ============================================================
    // Pass 2: edits against the re-parsed text
    // ============================================================

    fn apply_bindings(&self, parsed: &ParsedTsx, plan: &InjectPlan, arena: &mut EditArena) {
        for_each_component(&parsed.module, |component| match component {
            ComponentDecl::Function { name, body } => {
                if plan.hook_components.contains(name) {
                    self.insert_hook(parsed, body, arena);
                }
            }
            ComponentDecl::Class { name, class } => {
                if plan.hoc_classes.contains(name) {
                    self.annotate_class(parsed, class, arena);
                }
            }
        });

        if !plan.hoc_classes.is_empty() {
            self.rebind_class_exports(parsed, plan, arena);
        }
    }

    fn insert_hook(&self, parsed: &ParsedTsx, body: FunctionBody<'_>, arena: &mut EditArena) {
        let stmt = self.descriptor.hook_stmt();
        match body {
            FunctionBody::Block(block) => {
                let at = parsed.offset_of(block.span.lo) + 1;
                arena.insert(at, format!("\n  {}", stmt));
            }
            FunctionBody::Expr(expr) => {
                // Expression-bodied arrow: convert to a block so the
                // declaration has somewhere to live.
                let start = parsed.offset_of(expr.span().lo);
                let end = parsed.offset_of(expr.span().hi);
                arena.insert(start, format!("{{\n  {}\n  return ", stmt));
                arena.insert(end, ";\n}".to_string());
            }
        }
    }

    /// Widen the props type and destructure the translation object in
    /// every method that uses it.
    fn annotate_class(&self, parsed: &ParsedTsx, class: &Class, arena: &mut EditArena) {
        if let Some(props) = self.descriptor.wrapper_props
            && let Some(type_params) = &class.super_type_params
            && let Some(first) = type_params.params.first()
        {
            let at = parsed.offset_of(first.span().hi);
            arena.insert(at, format!(" & {}", props));
        }

        for body in class_methods(class) {
            if scan_body(body, &self.descriptor).0
                && let FunctionBody::Block(block) = body
            {
                let at = parsed.offset_of(block.span.lo) + 1;
                arena.insert(
                    at,
                    format!("\n    {}", self.descriptor.method_props_binding()),
                );
            }
        }
    }

    /// Rename wrapped classes and re-bind their public export names.
    fn rebind_class_exports(&self, parsed: &ParsedTsx, plan: &InjectPlan, arena: &mut EditArena) {
        for item in &parsed.module.body {
            match item {
                ModuleItem::Stmt(Stmt::Decl(Decl::Class(class_decl))) => {
                    let name = class_decl.ident.sym.to_string();
                    if !plan.hoc_classes.contains(&name) {
                        continue;
                    }
                    self.rename_class_ident(parsed, class_decl, arena);
                    if let Some(wrapped) = self.descriptor.wrap_class_expr(&format!("_{}", name)) {
                        let at = parsed.offset_of(class_decl.class.span.hi);
                        arena.insert(at, format!("\n\nconst {} = {};", name, wrapped));
                    }
                }
                ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(export)) => {
                    let Decl::Class(class_decl) = &export.decl else {
                        continue;
                    };
                    let name = class_decl.ident.sym.to_string();
                    if !plan.hoc_classes.contains(&name) {
                        continue;
                    }
                    // Drop the `export ` prefix; the wrapper re-exports.
                    let export_start = parsed.offset_of(export.span.lo);
                    let class_start = parsed.offset_of(class_decl.class.span.lo);
                    arena.push(export_start, class_start, "");
                    self.rename_class_ident(parsed, class_decl, arena);
                    if let Some(wrapped) = self.descriptor.wrap_class_expr(&format!("_{}", name)) {
                        let at = parsed.offset_of(class_decl.class.span.hi);
                        arena.insert(at, format!("\n\nexport const {} = {};", name, wrapped));
                    }
                }
                ModuleItem::ModuleDecl(ModuleDecl::ExportDefaultDecl(export)) => {
                    let DefaultDecl::Class(class_expr) = &export.decl else {
                        continue;
                    };
                    let Some(ident) = &class_expr.ident else {
                        continue;
                    };
                    let name = ident.sym.to_string();
                    if !plan.hoc_classes.contains(&name) {
                        continue;
                    }
                    let export_start = parsed.offset_of(export.span.lo);
                    let class_start = parsed.offset_of(class_expr.class.span.lo);
                    arena.push(export_start, class_start, "");
                    let ident_start = parsed.offset_of(ident.span.lo);
                    let ident_end = parsed.offset_of(ident.span.hi);
                    arena.push(ident_start, ident_end, format!("_{}", name));
                    if let Some(wrapped) = self.descriptor.wrap_class_expr(&format!("_{}", name)) {
                        let at = parsed.offset_of(class_expr.class.span.hi);
                        arena.insert(at, format!("\n\nexport default {};", wrapped));
                    }
                }
                _ => {}
            }
        }
    }

    fn rename_class_ident(
        &self,
        parsed: &ParsedTsx,
        class_decl: &ClassDecl,
        arena: &mut EditArena,
    ) {
        let start = parsed.offset_of(class_decl.ident.span.lo);
        let end = parsed.offset_of(class_decl.ident.span.hi);
        arena.push(start, end, format!("_{}", class_decl.ident.sym));
    }
}

// ============================================================
// Component enumeration and usage scanning
// ============================================================

#[derive(Clone, Copy)]
enum FunctionBody<'a> {
    Block(&'a swc_ecma_ast::BlockStmt),
    Expr(&'a Expr),
}

enum ComponentDecl<'a> {
    Function {
        name: &'a str,
        body: FunctionBody<'a>,
    },
    Class {
        name: &'a str,
        class: &'a Class,
    },
}

fn starts_uppercase(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_uppercase())
}

/// Walk top-level component declarations (plain, exported, default).
fn for_each_component<'a, F>(module: &'a Module, mut f: F)
where
    F: FnMut(ComponentDecl<'a>),
{
    fn visit_decl<'a, F>(decl: &'a Decl, f: &mut F)
    where
        F: FnMut(ComponentDecl<'a>),
    {
        match decl {
            Decl::Fn(fn_decl) => {
                if starts_uppercase(fn_decl.ident.sym.as_str())
                    && let Some(block) = &fn_decl.function.body
                {
                    f(ComponentDecl::Function {
                        name: fn_decl.ident.sym.as_str(),
                        body: FunctionBody::Block(block),
                    });
                }
            }
            Decl::Class(class_decl) => {
                if starts_uppercase(class_decl.ident.sym.as_str()) {
                    f(ComponentDecl::Class {
                        name: class_decl.ident.sym.as_str(),
                        class: &class_decl.class,
                    });
                }
            }
            Decl::Var(var_decl) => {
                for declarator in &var_decl.decls {
                    if let (Pat::Ident(ident), Some(Expr::Arrow(arrow))) =
                        (&declarator.name, declarator.init.as_deref())
                        && starts_uppercase(ident.id.sym.as_str())
                    {
                        let body = match &*arrow.body {
                            BlockStmtOrExpr::BlockStmt(block) => FunctionBody::Block(block),
                            BlockStmtOrExpr::Expr(expr) => FunctionBody::Expr(expr),
                        };
                        f(ComponentDecl::Function {
                            name: ident.id.sym.as_str(),
                            body,
                        });
                    }
                }
            }
            _ => {}
        }
    }

    for item in &module.body {
        match item {
            ModuleItem::Stmt(Stmt::Decl(decl)) => visit_decl(decl, &mut f),
            ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(export)) => {
                visit_decl(&export.decl, &mut f)
            }
            ModuleItem::ModuleDecl(ModuleDecl::ExportDefaultDecl(export)) => match &export.decl {
                DefaultDecl::Fn(fn_expr) => {
                    if let Some(block) = &fn_expr.function.body {
                        let name = fn_expr
                            .ident
                            .as_ref()
                            .map(|i| i.sym.as_str())
                            .unwrap_or("default");
                        f(ComponentDecl::Function {
                            name,
                            body: FunctionBody::Block(block),
                        });
                    }
                }
                DefaultDecl::Class(class_expr) => {
                    if let Some(ident) = &class_expr.ident {
                        f(ComponentDecl::Class {
                            name: ident.sym.as_str(),
                            class: &class_expr.class,
                        });
                    }
                }
                DefaultDecl::TsInterfaceDecl(_) => {}
            },
            _ => {}
        }
    }
}

/// Block bodies of a class's methods.
fn class_methods(class: &Class) -> impl Iterator<Item = FunctionBody<'_>> {
    class.body.iter().filter_map(|member| match member {
        ClassMember::Method(method) => method.function.body.as_ref().map(FunctionBody::Block),
        _ => None,
    })
}

struct UsageScan<'a> {
    descriptor: &'a LibraryCapabilityDescriptor,
    uses: bool,
    has_hook: bool,
}

impl<'a> Visit for UsageScan<'a> {
    fn visit_call_expr(&mut self, node: &CallExpr) {
        if let Callee::Expr(callee) = &node.callee {
            match &**callee {
                Expr::Ident(ident) => {
                    let name = ident.sym.as_str();
                    if name == self.descriptor.binding
                        || self.descriptor.is_translation_callee(name)
                    {
                        self.uses = true;
                    }
                    if self.descriptor.is_hook(name) {
                        self.has_hook = true;
                    }
                }
                Expr::Member(member) => {
                    if let (Expr::Ident(obj), swc_ecma_ast::MemberProp::Ident(prop)) =
                        (&*member.obj, &member.prop)
                        && obj.sym.as_str() == self.descriptor.binding
                        && self
                            .descriptor
                            .is_translation_member(obj.sym.as_str(), prop.sym.as_str())
                    {
                        self.uses = true;
                    }
                }
                _ => {}
            }
        }
        node.visit_children_with(self);
    }
}

/// (uses translation, has hook binding) for one function body.
fn scan_body(body: FunctionBody<'_>, descriptor: &LibraryCapabilityDescriptor) -> (bool, bool) {
    let mut scan = UsageScan {
        descriptor,
        uses: false,
        has_hook: false,
    };
    match body {
        FunctionBody::Block(block) => block.visit_with(&mut scan),
        FunctionBody::Expr(expr) => expr.visit_with(&mut scan),
    }
    (scan.uses, scan.has_hook)
}

/// Module-level translation calls through the global accessor.
fn module_uses_global(module: &Module, descriptor: &LibraryCapabilityDescriptor) -> bool {
    struct GlobalScan<'a> {
        descriptor: &'a LibraryCapabilityDescriptor,
        found: bool,
    }
    impl<'a> Visit for GlobalScan<'a> {
        fn visit_call_expr(&mut self, node: &CallExpr) {
            if let Callee::Expr(callee) = &node.callee
                && let Expr::Member(member) = &**callee
                && let Expr::Ident(obj) = &*member.obj
                && obj.sym.as_str() == self.descriptor.global_object
            {
                self.found = true;
            }
            node.visit_children_with(self);
        }
    }
    let mut scan = GlobalScan {
        descriptor,
        found: false,
    };
    module.visit_with(&mut scan);
    scan.found
}

/// Class names already wrapped by the HOC somewhere in the module.
fn wrapped_class_names(
    module: &Module,
    descriptor: &LibraryCapabilityDescriptor,
) -> HashSet<String> {
    struct WrapScan<'a> {
        descriptor: &'a LibraryCapabilityDescriptor,
        wrapped: HashSet<String>,
    }
    impl<'a> Visit for WrapScan<'a> {
        fn visit_call_expr(&mut self, node: &CallExpr) {
            let callee_is_hoc = match &node.callee {
                Callee::Expr(callee) => match &**callee {
                    Expr::Ident(ident) => self.descriptor.is_hoc(ident.sym.as_str()),
                    // Curried form: withTranslation()(Component)
                    Expr::Call(inner) => match &inner.callee {
                        Callee::Expr(inner_callee) => match &**inner_callee {
                            Expr::Ident(ident) => self.descriptor.is_hoc(ident.sym.as_str()),
                            _ => false,
                        },
                        _ => false,
                    },
                    _ => false,
                },
                _ => false,
            };
            if callee_is_hoc
                && let Some(arg) = node.args.first()
                && let Expr::Ident(ident) = &*arg.expr
            {
                let name = ident.sym.as_str();
                self.wrapped.insert(name.trim_start_matches('_').to_string());
                self.wrapped.insert(name.to_string());
            }
            node.visit_children_with(self);
        }
    }
    let mut scan = WrapScan {
        descriptor,
        wrapped: HashSet::new(),
    };
    module.visit_with(&mut scan);
    scan.wrapped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::LibraryKind;
    use pretty_assertions::assert_eq;

    fn injector() -> ComponentInjector {
        ComponentInjector::new(LibraryCapabilityDescriptor::new(
            LibraryKind::ReactI18next,
            "@/i18n",
            None,
        ))
    }

    #[test]
    fn test_hook_injected_into_function_component() {
        let source = "export function Login() {\n  return <button>{t('forms__Login__confirm')}</button>;\n}\n";
        let out = injector().inject(source, "Login.tsx").unwrap();
        assert_eq!(
            out,
            "import { useTranslation } from 'react-i18next';\nexport function Login() {\n  const { t } = useTranslation();\n  return <button>{t('forms__Login__confirm')}</button>;\n}\n"
        );
    }

    #[test]
    fn test_expression_arrow_converted_to_block() {
        let source = "const Login = () => <p>{t('a__b')}</p>;\n";
        let out = injector().inject(source, "Login.tsx").unwrap();
        assert!(out.contains("const Login = () => {"));
        assert!(out.contains("const { t } = useTranslation();"));
        assert!(out.contains("return <p>{t('a__b')}</p>;"));
        assert!(out.contains("import { useTranslation } from 'react-i18next';"));
    }

    #[test]
    fn test_component_with_existing_hook_untouched() {
        let source = "export function Login() {\n  const { t } = useTranslation();\n  return <p>{t('a__b')}</p>;\n}\n";
        let out = injector().inject(source, "Login.tsx").unwrap();
        // The hook import is still missing, but no second binding appears.
        assert_eq!(out.matches("useTranslation()").count(), 1);
    }

    #[test]
    fn test_component_without_translation_untouched() {
        let source = "export function Plain() {\n  return <p>static</p>;\n}\n";
        let out = injector().inject(source, "Plain.tsx").unwrap();
        assert_eq!(out, source);
    }

    #[test]
    fn test_class_component_hoc_wrap() {
        let source = r#"export class Settings extends React.Component<Props> {
  render() {
    return <h1>{t('views__Settings__title')}</h1>;
  }
}
"#;
        let out = injector().inject(source, "Settings.tsx").unwrap();
        assert!(out.contains("import { withTranslation, WithTranslation } from 'react-i18next';"));
        assert!(out.contains("class _Settings extends React.Component<Props & WithTranslation>"));
        assert!(out.contains("const { t } = this.props;"));
        assert!(out.contains("export const Settings = withTranslation()(_Settings);"));
        assert!(!out.contains("export class"));
    }

    #[test]
    fn test_default_export_class() {
        let source = r#"export default class Page extends React.Component {
  render() {
    return <div>{t('a__b')}</div>;
  }
}
"#;
        let out = injector().inject(source, "Page.tsx").unwrap();
        assert!(out.contains("class _Page extends React.Component"));
        assert!(out.contains("export default withTranslation()(_Page);"));
    }

    #[test]
    fn test_already_wrapped_class_untouched() {
        let source = r#"class _Settings extends React.Component {
  render() {
    return <h1>{t('a__b')}</h1>;
  }
}

const Settings = withTranslation()(_Settings);
"#;
        let out = injector().inject(source, "Settings.tsx").unwrap();
        assert_eq!(out, source);
    }

    #[test]
    fn test_global_usage_adds_global_import() {
        let source = "const label = i18next.t('a__b');\n";
        let out = injector().inject(source, "x.ts").unwrap();
        assert!(out.starts_with("import { i18next } from '@/i18n';\n"));
    }

    #[test]
    fn test_module_level_t_not_treated_as_component_use() {
        // Lowercase helpers never receive hook bindings.
        let source = "function helper() {\n  return t('a__b');\n}\n";
        let out = injector().inject(source, "x.ts").unwrap();
        assert_eq!(out, source);
    }
}
