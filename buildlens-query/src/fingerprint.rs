//! Identity of "the current query".

use crate::codec::QueryStateCodec;
use crate::filter::FilterState;
use crate::sort::SortState;
use buildlens_core::Scope;
use sha2::{Digest, Sha256};
use std::fmt;
use url::form_urlencoded;

/// SHA-256 over the canonical encoding of scope, filters and sort.
///
/// View-state parameters are not part of it: switching the detail sub-tab
/// must not restart the list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn new(
        codec: &QueryStateCodec,
        scope: &Scope,
        filters: &FilterState,
        sort: &SortState,
    ) -> Self {
        let canonical = canonical_form(codec, scope, filters, sort);
        let digest = Sha256::digest(canonical.as_bytes());
        Self(hex::encode(digest))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex digits, for log lines.
    pub fn short(&self) -> &str {
        &self.0[..12]
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short())
    }
}

fn canonical_form(
    codec: &QueryStateCodec,
    scope: &Scope,
    filters: &FilterState,
    sort: &SortState,
) -> String {
    let scope_part = form_urlencoded::Serializer::new(String::new())
        .append_pair("org", &scope.organization)
        .append_pair("repo", &scope.repository)
        .finish();
    format!("{}|{}", scope_part, codec.encode_filters(filters, sort))
}
