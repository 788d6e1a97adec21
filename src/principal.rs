//! Resolution of the acting principal.
//!
//! Authentication happens upstream. The dispatcher only needs an opaque
//! owner identity to stamp onto items it creates.

use crate::request::Request;

/// Supplies the owner identity for a request.
pub trait OwnerResolver: Send + Sync + 'static {
    fn resolve(&self, req: &Request) -> String;
}

/// Every request is owned by the same identity.
#[derive(Clone, Debug)]
pub struct FixedOwner(pub String);

impl OwnerResolver for FixedOwner {
    fn resolve(&self, _req: &Request) -> String {
        self.0.clone()
    }
}

/// Reads the identity from a header set by the authenticating proxy.
///
/// Falls back to `default` when the header is absent or blank.
#[derive(Clone, Debug)]
pub struct HeaderOwner {
    header: String,
    default: String,
}

impl HeaderOwner {
    pub fn new(header: impl Into<String>, default: impl Into<String>) -> Self {
        Self { header: header.into(), default: default.into() }
    }
}

impl OwnerResolver for HeaderOwner {
    fn resolve(&self, req: &Request) -> String {
        req.header(&self.header)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(&self.default)
            .to_owned()
    }
}
