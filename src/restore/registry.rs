//! Defined-messages registry prescan.
//!
//! Message constants declared once and referenced from multiple call sites
//! (`defineMessages({...})`, or a single message-descriptor object const)
//! are collected before the main rewrite pass so that
//! `formatMessage(messages.greeting)` resolves to its identifier.

use std::collections::HashMap;

use swc_ecma_ast::{
    Callee, Expr, Lit, ObjectLit, Pat, Prop, PropName, PropOrSpread, VarDeclarator,
};
use swc_ecma_visit::{Visit, VisitWith};

use crate::core::MessageInfo;
use crate::core::parsers::ParsedTsx;
use crate::library::LibraryCapabilityDescriptor;

/// Scan a parsed module for statically defined message constants.
///
/// Keys are reference paths: `messages.greeting` for registry objects,
/// `TITLE_MESSAGE` for single-descriptor constants.
pub fn scan_defined_messages(
    parsed: &ParsedTsx,
    descriptor: &LibraryCapabilityDescriptor,
) -> HashMap<String, MessageInfo> {
    let mut scan = RegistryScan {
        descriptor,
        defined: HashMap::new(),
    };
    parsed.module.visit_with(&mut scan);
    scan.defined
}

struct RegistryScan<'a> {
    descriptor: &'a LibraryCapabilityDescriptor,
    defined: HashMap<String, MessageInfo>,
}

impl<'a> Visit for RegistryScan<'a> {
    fn visit_var_declarator(&mut self, node: &VarDeclarator) {
        if let Pat::Ident(name) = &node.name {
            let binding = name.id.sym.as_str();
            match node.init.as_deref() {
                // const messages = defineMessages({ key: {...}, ... })
                Some(Expr::Call(call)) => {
                    let is_define = matches!(
                        &call.callee,
                        Callee::Expr(callee)
                            if matches!(&**callee, Expr::Ident(ident)
                                if self.descriptor.is_define_messages(ident.sym.as_str()))
                    );
                    if is_define
                        && let Some(arg) = call.args.first()
                        && let Expr::Object(object) = &*arg.expr
                    {
                        for prop in &object.props {
                            if let PropOrSpread::Prop(prop) = prop
                                && let Prop::KeyValue(kv) = &**prop
                                && let Some(key) = prop_name_text(&kv.key)
                                && let Expr::Object(descriptor_obj) = &*kv.value
                                && let Some(info) = message_info_from_object(descriptor_obj)
                            {
                                self.defined.insert(format!("{}.{}", binding, key), info);
                            }
                        }
                    }
                }
                // const TITLE_MESSAGE = { id: '...', defaultMessage: '...' };
                Some(Expr::Object(object)) => {
                    if let Some(info) = message_info_from_object(object)
                        && info.is_valid()
                    {
                        self.defined.insert(binding.to_string(), info);
                    }
                }
                _ => {}
            }
        }
        node.visit_children_with(self);
    }
}

fn prop_name_text(name: &PropName) -> Option<String> {
    match name {
        PropName::Ident(ident) => Some(ident.sym.to_string()),
        PropName::Str(s) => s.value.as_str().map(|v| v.to_string()),
        _ => None,
    }
}

/// Decode a `{ id, defaultMessage }` object literal.
pub fn message_info_from_object(object: &ObjectLit) -> Option<MessageInfo> {
    let mut info = MessageInfo::default();
    for prop in &object.props {
        let PropOrSpread::Prop(prop) = prop else {
            continue;
        };
        let Prop::KeyValue(kv) = &**prop else {
            continue;
        };
        let Some(key) = prop_name_text(&kv.key) else {
            continue;
        };
        if let Expr::Lit(Lit::Str(s)) = &*kv.value
            && let Some(value) = s.value.as_str()
        {
            match key.as_str() {
                "id" => info.id = Some(value.to_string()),
                "defaultMessage" => info.default_message = Some(value.to_string()),
                _ => {}
            }
        }
    }
    info.is_valid().then_some(info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::parsers::parse_tsx_source;
    use crate::library::LibraryKind;

    fn scan(source: &str) -> HashMap<String, MessageInfo> {
        let parsed = parse_tsx_source(source.to_string(), "m.tsx").unwrap();
        let descriptor = LibraryCapabilityDescriptor::new(LibraryKind::ReactIntl, "@/i18n", None);
        scan_defined_messages(&parsed, &descriptor)
    }

    #[test]
    fn test_define_messages_registry() {
        let defined = scan(
            r#"
const messages = defineMessages({
  greeting: { id: 'views__Home__greeting', defaultMessage: '你好' },
  farewell: { id: 'views__Home__farewell', defaultMessage: '再见' },
});
"#,
        );
        assert_eq!(defined.len(), 2);
        assert_eq!(
            defined["messages.greeting"].id.as_deref(),
            Some("views__Home__greeting")
        );
        assert_eq!(defined["messages.farewell"].default_message.as_deref(), Some("再见"));
    }

    #[test]
    fn test_single_descriptor_constant() {
        let defined = scan("const TITLE = { id: 'a__b', defaultMessage: '标题' };");
        assert_eq!(defined["TITLE"].id.as_deref(), Some("a__b"));
    }

    #[test]
    fn test_unrelated_objects_ignored() {
        let defined = scan("const style = { width: '10px', color: 'red' };");
        assert!(defined.is_empty());
    }

    #[test]
    fn test_invalid_descriptor_without_id_or_message_ignored() {
        let defined = scan("const x = { values: 'nope' };");
        assert!(defined.is_empty());
    }
}
