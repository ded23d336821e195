//! Best-effort client address resolution from proxy headers.

use std::collections::HashMap;

use axum::http::HeaderMap;

/// Returned when no header identifies the client.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Headers consulted, most client-proximate first.
const X_FORWARDED_FOR: &str = "x-forwarded-for";
const CF_CONNECTING_IP: &str = "cf-connecting-ip";
const X_REAL_IP: &str = "x-real-ip";

/// Read-only, case-insensitive access to request headers.
pub trait HeaderSource {
    fn header(&self, name: &str) -> Option<&str>;
}

impl HeaderSource for HeaderMap {
    fn header(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|v| v.to_str().ok())
    }
}

impl HeaderSource for HashMap<String, String> {
    fn header(&self, name: &str) -> Option<&str> {
        self.iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Resolve the originating client address. Never fails.
///
/// `x-forwarded-for` wins and only its leftmost hop is used; then
/// `cf-connecting-ip`, then `x-real-ip`. Blank values are skipped.
pub fn resolve_client_ip<H: HeaderSource + ?Sized>(headers: &H) -> String {
    let forwarded = headers
        .header(X_FORWARDED_FOR)
        .and_then(|chain| chain.split(',').next());

    [forwarded, headers.header(CF_CONNECTING_IP), headers.header(X_REAL_IP)]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|value| !value.is_empty())
        .unwrap_or(UNKNOWN_CLIENT)
        .to_string()
}
