//! Translation-library capability descriptors.
//!
//! Each supported translation library is described by a
//! [`LibraryCapabilityDescriptor`]: a plain data-plus-functions value that
//! tells the extractors which call sites are already internationalized, and
//! tells the transformers what rewritten call sites, imports, and bindings
//! must look like. Exactly one descriptor is active per adapter instance;
//! every recognizer and generator is a pure function of source text and the
//! descriptor itself.

use std::fmt;

use serde::{Deserialize, Serialize};

/// UI framework whose sources are being rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Framework {
    React,
    Vue,
}

impl fmt::Display for Framework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Framework::React => write!(f, "react"),
            Framework::Vue => write!(f, "vue"),
        }
    }
}

/// Translation-library variant, two per framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LibraryKind {
    ReactI18next,
    ReactIntl,
    VueI18n,
    VueI18next,
}

impl LibraryKind {
    pub fn framework(&self) -> Framework {
        match self {
            LibraryKind::ReactI18next | LibraryKind::ReactIntl => Framework::React,
            LibraryKind::VueI18n | LibraryKind::VueI18next => Framework::Vue,
        }
    }
}

impl fmt::Display for LibraryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LibraryKind::ReactI18next => "react-i18next",
            LibraryKind::ReactIntl => "react-intl",
            LibraryKind::VueI18n => "vue-i18n",
            LibraryKind::VueI18next => "vue-i18next",
        };
        write!(f, "{}", name)
    }
}

/// Describes one translation-library variant's calling conventions.
///
/// Immutable after construction. The static parts come from the library
/// variant; `global_import` and `namespace` are configured per adapter.
#[derive(Debug, Clone)]
pub struct LibraryCapabilityDescriptor {
    pub kind: LibraryKind,
    /// npm package the hook/HOC are imported from.
    pub package: &'static str,
    /// Hook identifier bound inside function/setup components.
    pub hook: &'static str,
    /// HOC identifier wrapped around class components, if the library has one.
    pub hoc: Option<&'static str>,
    /// Message component recognized (never generated) in JSX.
    pub component: Option<&'static str>,
    /// Props type a HOC-wrapped component's props must be widened with.
    pub wrapper_props: Option<&'static str>,
    /// Identifier the hook binds (`t` or `intl`).
    pub binding: &'static str,
    /// Module-level accessor used outside components (`i18next.t`, `i18n.t`).
    pub global_object: &'static str,
    /// Whether the hook accepts a namespace argument.
    pub supports_namespace: bool,
    /// Interpolation delimiters in stored messages.
    pub placeholder_open: &'static str,
    pub placeholder_close: &'static str,
    /// Import path for the non-hook global accessor (configured).
    pub global_import: String,
    /// Namespace passed to hook bindings (configured).
    pub namespace: Option<String>,
}

impl LibraryCapabilityDescriptor {
    pub fn new(kind: LibraryKind, global_import: impl Into<String>, namespace: Option<String>) -> Self {
        let global_import = global_import.into();
        match kind {
            LibraryKind::ReactI18next => Self {
                kind,
                package: "react-i18next",
                hook: "useTranslation",
                hoc: Some("withTranslation"),
                component: Some("Trans"),
                wrapper_props: Some("WithTranslation"),
                binding: "t",
                global_object: "i18next",
                supports_namespace: true,
                placeholder_open: "{{",
                placeholder_close: "}}",
                global_import,
                namespace,
            },
            LibraryKind::ReactIntl => Self {
                kind,
                package: "react-intl",
                hook: "useIntl",
                hoc: Some("injectIntl"),
                component: Some("FormattedMessage"),
                wrapper_props: Some("WrappedComponentProps"),
                binding: "intl",
                global_object: "intl",
                supports_namespace: false,
                placeholder_open: "{",
                placeholder_close: "}",
                global_import,
                namespace,
            },
            LibraryKind::VueI18n => Self {
                kind,
                package: "vue-i18n",
                hook: "useI18n",
                hoc: None,
                component: Some("i18n-t"),
                wrapper_props: None,
                binding: "t",
                global_object: "i18n",
                supports_namespace: false,
                placeholder_open: "{",
                placeholder_close: "}",
                global_import,
                namespace,
            },
            LibraryKind::VueI18next => Self {
                kind,
                package: "i18next-vue",
                hook: "useTranslation",
                hoc: None,
                component: None,
                wrapper_props: None,
                binding: "t",
                global_object: "i18next",
                supports_namespace: true,
                placeholder_open: "{{",
                placeholder_close: "}}",
                global_import,
                namespace,
            },
        }
    }

    // ============================================================
    // Recognizers
    // ============================================================

    /// Is a bare identifier call (`t("key")`) a translation call?
    pub fn is_translation_callee(&self, name: &str) -> bool {
        name == self.binding || name == "$t"
    }

    /// Is a member call (`obj.method("key")`) a translation call?
    ///
    /// Covers `i18next.t`, `i18n.t`, `intl.formatMessage`, `this.$t`.
    pub fn is_translation_member(&self, obj: &str, method: &str) -> bool {
        match self.kind {
            LibraryKind::ReactIntl => {
                (obj == "intl" || obj == "this") && method == "formatMessage"
            }
            _ => {
                (obj == self.global_object && method == "t")
                    || (obj == "this" && method == "$t")
                    || (obj == self.binding && matches!(method, "t" | "rich" | "raw"))
            }
        }
    }

    pub fn is_hook(&self, name: &str) -> bool {
        name == self.hook
    }

    pub fn is_hoc(&self, name: &str) -> bool {
        self.hoc == Some(name)
    }

    pub fn is_message_component(&self, name: &str) -> bool {
        self.component == Some(name)
    }

    /// `defineMessages({...})` style statically-defined message registries.
    pub fn is_define_messages(&self, name: &str) -> bool {
        self.kind == LibraryKind::ReactIntl && name == "defineMessages"
    }

    // ============================================================
    // Generators
    // ============================================================

    /// Interpolation placeholder as stored in the message text.
    pub fn placeholder(&self, name: &str) -> String {
        format!("{}{}{}", self.placeholder_open, name, self.placeholder_close)
    }

    /// Parse `{name}` / `{{name}}` placeholders out of a stored message, in order.
    pub fn parse_placeholders(&self, message: &str) -> Vec<String> {
        let mut names = Vec::new();
        let open = self.placeholder_open;
        let close = self.placeholder_close;
        let mut rest = message;
        while let Some(start) = rest.find(open) {
            let after = &rest[start + open.len()..];
            let Some(end) = after.find(close) else { break };
            let name = after[..end].trim();
            if !name.is_empty()
                && name
                    .chars()
                    .all(|c| c.is_alphanumeric() || c == '_' || c == '$')
            {
                names.push(name.to_string());
            }
            rest = &after[end + close.len()..];
        }
        names
    }

    /// Statement binding the hook inside a function/setup component body.
    pub fn hook_stmt(&self) -> String {
        match self.kind {
            LibraryKind::ReactIntl => format!("const {} = {}();", self.binding, self.hook),
            _ => match (&self.namespace, self.supports_namespace) {
                (Some(ns), true) => format!("const {{ t }} = {}('{}');", self.hook, ns),
                _ => format!("const {{ t }} = {}();", self.hook),
            },
        }
    }

    /// Import statement for the hook.
    pub fn hook_import(&self) -> String {
        format!("import {{ {} }} from '{}';", self.hook, self.package)
    }

    /// Import statement for the HOC (and its props type where it exists).
    pub fn hoc_import(&self) -> Option<String> {
        let hoc = self.hoc?;
        match self.wrapper_props {
            Some(props) => Some(format!(
                "import {{ {}, {} }} from '{}';",
                hoc, props, self.package
            )),
            None => Some(format!("import {{ {} }} from '{}';", hoc, self.package)),
        }
    }

    /// Import statement for the module-level accessor used outside components.
    pub fn global_import_stmt(&self) -> String {
        format!(
            "import {{ {} }} from '{}';",
            self.global_object, self.global_import
        )
    }

    /// Destructuring statement injected into class methods under a HOC wrap.
    pub fn method_props_binding(&self) -> String {
        format!("const {{ {} }} = this.props;", self.binding)
    }

    /// Expression wrapping a renamed class with the HOC.
    pub fn wrap_class_expr(&self, inner: &str) -> Option<String> {
        let hoc = self.hoc?;
        match self.kind {
            LibraryKind::ReactI18next => match (&self.namespace, self.supports_namespace) {
                (Some(ns), true) => Some(format!("{}('{}')({})", hoc, ns, inner)),
                _ => Some(format!("{}()({})", hoc, inner)),
            },
            _ => Some(format!("{}({})", hoc, inner)),
        }
    }

    /// A translation call in plain code position.
    ///
    /// `values` are `(placeholder, expression)` pairs in original order.
    pub fn code_call(
        &self,
        accessor: &str,
        id: &str,
        default_message: Option<&str>,
        values: &[(String, String)],
    ) -> String {
        match self.kind {
            LibraryKind::ReactIntl => {
                let mut descriptor = format!("{{ id: '{}'", escape_single(id));
                if let Some(msg) = default_message {
                    descriptor.push_str(&format!(", defaultMessage: '{}'", escape_single(msg)));
                }
                descriptor.push_str(" }");
                if values.is_empty() {
                    format!("{}.formatMessage({})", accessor, descriptor)
                } else {
                    format!(
                        "{}.formatMessage({}, {})",
                        accessor,
                        descriptor,
                        values_object(values)
                    )
                }
            }
            _ => {
                let mut call = format!("{}('{}'", accessor, escape_single(id));
                if let Some(msg) = default_message {
                    call.push_str(&format!(", '{}'", escape_single(msg)));
                }
                if !values.is_empty() {
                    call.push_str(&format!(", {}", values_object(values)));
                }
                call.push(')');
                call
            }
        }
    }

    /// Accessor to use in plain code: the hook binding inside a component,
    /// the global object at module level.
    pub fn code_accessor(&self, inside_component: bool) -> String {
        if inside_component {
            self.binding.to_string()
        } else if self.kind == LibraryKind::ReactIntl {
            self.global_object.to_string()
        } else {
            format!("{}.t", self.global_object)
        }
    }

    /// Replacement text for a JSX text node or attribute value.
    pub fn jsx_call(
        &self,
        id: &str,
        default_message: Option<&str>,
        values: &[(String, String)],
    ) -> String {
        let call = match self.kind {
            LibraryKind::ReactIntl => {
                self.code_call("intl", id, default_message, values)
            }
            _ => self.code_call("t", id, default_message, values),
        };
        format!("{{{}}}", call)
    }

    /// Replacement for plain text in a Vue template.
    pub fn template_text_call(&self, id: &str, values: &[(String, String)]) -> String {
        if values.is_empty() {
            format!("{{{{ $t('{}') }}}}", escape_single(id))
        } else {
            format!(
                "{{{{ $t('{}', {}) }}}}",
                escape_single(id),
                values_object(values)
            )
        }
    }

    /// Replacement for a static attribute in a Vue template:
    /// `title="文本"` becomes `:title="$t('id')"`.
    pub fn template_attr_call(&self, attr: &str, id: &str) -> String {
        format!(":{}=\"$t('{}')\"", attr, escape_single(id))
    }
}

/// `{ name: expr, other: other }` object literal text for values arguments.
fn values_object(values: &[(String, String)]) -> String {
    let fields: Vec<String> = values
        .iter()
        .map(|(name, expr)| {
            if name == expr {
                name.clone()
            } else {
                format!("{}: {}", name, expr)
            }
        })
        .collect();
    format!("{{ {} }}", fields.join(", "))
}

fn escape_single(text: &str) -> String {
    text.replace('\\', "\\\\").replace('\'', "\\'")
}
