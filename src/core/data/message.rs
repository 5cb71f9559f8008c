/// Decoded shape of a translation call site or message-component attributes.
///
/// `values` holds `(placeholder, expression)` pairs in source order; the
/// expression is raw source text, never re-parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageInfo {
    pub id: Option<String>,
    pub default_message: Option<String>,
    pub values: Option<Vec<(String, String)>>,
}

impl MessageInfo {
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Default::default()
        }
    }

    /// A call site is only meaningful if it names an id or carries a
    /// default message.
    pub fn is_valid(&self) -> bool {
        self.id.is_some() || self.default_message.is_some()
    }

    pub fn values(&self) -> &[(String, String)] {
        self.values.as_deref().unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validity() {
        assert!(!MessageInfo::default().is_valid());
        assert!(MessageInfo::with_id("a__b").is_valid());
        let msg_only = MessageInfo {
            default_message: Some("确认".to_string()),
            ..Default::default()
        };
        assert!(msg_only.is_valid());
    }

    #[test]
    fn test_values_default_empty() {
        assert!(MessageInfo::default().values().is_empty());
        let with_values = MessageInfo {
            values: Some(vec![("name".to_string(), "user.name".to_string())]),
            ..MessageInfo::with_id("x")
        };
        assert_eq!(with_values.values().len(), 1);
    }
}
