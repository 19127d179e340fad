//! XML namespace handling
//!
//! This module provides the namespace URIs QTI content lives in, qualified
//! names, and the prefix scope used when writing documents.

use std::collections::HashMap;

/// XML Namespace URI
pub type NamespaceUri = String;

/// Namespace prefix
pub type Prefix = String;

/// QTI 2.0 namespace
pub const QTI_V2P0_NAMESPACE: &str = "http://www.imsglobal.org/xsd/imsqti_v2p0";

/// QTI 2.1 namespace (2.1.0 and 2.1.1)
pub const QTI_V2P1_NAMESPACE: &str = "http://www.imsglobal.org/xsd/imsqti_v2p1";

/// QTI 2.2 namespace (2.2.0 to 2.2.2)
pub const QTI_V2P2_NAMESPACE: &str = "http://www.imsglobal.org/xsd/imsqti_v2p2";

/// QTI 2.2 HTML5 extension namespace (figure, media elements)
pub const QTI_HTML5_NAMESPACE: &str = "http://www.imsglobal.org/xsd/imsqtiv2p2_html5_v1p0";

/// Prefix used when writing elements of the HTML5 extension namespace
pub const QTI_HTML5_PREFIX: &str = "qh5";

/// MathML namespace
pub const MATHML_NAMESPACE: &str = "http://www.w3.org/1998/Math/MathML";

/// Conventional MathML prefix
pub const MATHML_PREFIX: &str = "m";

/// XInclude namespace
pub const XINCLUDE_NAMESPACE: &str = "http://www.w3.org/2001/XInclude";

/// Conventional XInclude prefix
pub const XINCLUDE_PREFIX: &str = "xi";

/// XML Schema instance namespace
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// XML namespace (bound to the `xml` prefix by definition)
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Whether a namespace URI is one of the QTI namespaces
pub fn is_qti_namespace(uri: &str) -> bool {
    matches!(
        uri,
        QTI_V2P0_NAMESPACE | QTI_V2P1_NAMESPACE | QTI_V2P2_NAMESPACE | QTI_HTML5_NAMESPACE
    )
}

/// Qualified name (QName) - combination of namespace and local name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QName {
    /// Namespace URI (None for no namespace)
    pub namespace: Option<NamespaceUri>,
    /// Local name
    pub local_name: String,
}

impl QName {
    /// Create a new QName
    pub fn new(namespace: Option<impl Into<String>>, local_name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.map(|s| s.into()),
            local_name: local_name.into(),
        }
    }

    /// Create a QName without a namespace
    pub fn local(local_name: impl Into<String>) -> Self {
        Self {
            namespace: None,
            local_name: local_name.into(),
        }
    }

    /// Create a QName with a namespace
    pub fn namespaced(namespace: impl Into<String>, local_name: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            local_name: local_name.into(),
        }
    }

    /// Clark notation, `{namespace}local`
    pub fn clark(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{{{}}}{}", ns, self.local_name),
            None => self.local_name.clone(),
        }
    }
}

/// Prefix bindings in scope while writing a document
///
/// The empty prefix stands for the default namespace.
#[derive(Debug, Clone, Default)]
pub struct NamespaceScope {
    bindings: HashMap<Prefix, NamespaceUri>,
}

impl NamespaceScope {
    /// Create an empty scope
    pub fn new() -> Self {
        Self::default()
    }

    /// Namespace bound to `prefix` (None for the default namespace)
    pub fn lookup(&self, prefix: Option<&str>) -> Option<&str> {
        self.bindings
            .get(prefix.unwrap_or(""))
            .map(|s| s.as_str())
    }

    /// Whether `prefix` is already bound to `uri`
    pub fn is_bound(&self, prefix: Option<&str>, uri: &str) -> bool {
        self.lookup(prefix) == Some(uri)
    }

    /// Bind a prefix
    pub fn bind(&mut self, prefix: Option<&str>, uri: impl Into<String>) {
        self.bindings
            .insert(prefix.unwrap_or("").to_string(), uri.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qname_creation() {
        let qname = QName::namespaced(QTI_V2P1_NAMESPACE, "baseValue");
        assert_eq!(qname.namespace.as_deref(), Some(QTI_V2P1_NAMESPACE));
        assert_eq!(qname.local_name, "baseValue");
    }

    #[test]
    fn test_qname_clark() {
        let qname = QName::namespaced("http://example.com", "element");
        assert_eq!(qname.clark(), "{http://example.com}element");
        assert_eq!(QName::local("element").clark(), "element");
    }

    #[test]
    fn test_scope_binding() {
        let mut scope = NamespaceScope::new();
        assert!(scope.lookup(None).is_none());

        scope.bind(None, QTI_V2P1_NAMESPACE);
        scope.bind(Some("m"), MATHML_NAMESPACE);

        assert!(scope.is_bound(None, QTI_V2P1_NAMESPACE));
        assert!(scope.is_bound(Some("m"), MATHML_NAMESPACE));
        assert!(!scope.is_bound(Some("m"), XINCLUDE_NAMESPACE));
    }

    #[test]
    fn test_is_qti_namespace() {
        assert!(is_qti_namespace(QTI_V2P2_NAMESPACE));
        assert!(is_qti_namespace(QTI_HTML5_NAMESPACE));
        assert!(!is_qti_namespace(MATHML_NAMESPACE));
    }
}
