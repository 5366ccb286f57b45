//! HTTP session: fixed mobile-client headers plus a cookie jar.
//!
//! The vendor API only accepts requests that look like they come from the
//! Android app, so every request carries the same header set. Cookies are
//! kept as a flat name → value map because that is exactly what the state
//! file stores.

use std::collections::BTreeMap;

use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Headers sent by version 5.0 of the Android app. Must be reproduced
/// verbatim or the API rejects the request.
pub const DEFAULT_HEADERS: &[(&str, &str)] = &[
    ("Accept", "application/json"),
    ("Accept-Encoding", "gzip"),
    ("Connection", "Keep-Alive"),
    ("User-Agent", "okhttp/3.12.3"),
    ("X-NP-API-Version", "1.5"),
    ("X-NP-App-Version", "5.0"),
    (
        "X-NP-User-Agent",
        "clientType=MOBILE_DEVICE; \
         devicePlatform=ANDROID; \
         deviceUid=; \
         applicationName=The Gym Group; \
         applicationVersion=5.0; \
         applicationVersionCode=38",
    ),
];

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

#[derive(Debug, Clone, Default)]
pub struct Session {
    cookies: BTreeMap<String, String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cookies(&self) -> &BTreeMap<String, String> {
        &self.cookies
    }

    /// Merge cookies into the jar, replacing any with the same name.
    pub fn extend_cookies(&mut self, cookies: impl IntoIterator<Item = (String, String)>) {
        self.cookies.extend(cookies);
    }

    /// Build a request carrying the default headers and the current cookies.
    /// A form body is URL-encoded in the order given.
    pub fn build_request(
        &self,
        method: HttpMethod,
        url: String,
        form: Option<&[(&str, &str)]>,
    ) -> HttpRequest {
        let mut headers: Vec<(String, String)> = DEFAULT_HEADERS
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        if let Some(cookie) = self.cookie_header() {
            headers.push(("Cookie".to_string(), cookie));
        }

        let body = form.map(|fields| {
            headers.push(("Content-Type".to_string(), FORM_CONTENT_TYPE.to_string()));
            encode_form(fields)
        });

        HttpRequest {
            method,
            url,
            headers,
            body,
        }
    }

    /// Absorb every `Set-Cookie` header of `response` into the jar.
    pub fn store_cookies(&mut self, response: &HttpResponse) {
        for raw in response.header_values("set-cookie") {
            match parse_set_cookie(raw) {
                Some(SetCookie::Set(name, value)) => {
                    self.cookies.insert(name, value);
                }
                Some(SetCookie::Remove(name)) => {
                    self.cookies.remove(&name);
                }
                None => tracing::debug!("ignoring malformed Set-Cookie header {raw:?}"),
            }
        }
    }

    fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        let pairs: Vec<String> = self
            .cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect();
        Some(pairs.join("; "))
    }
}

#[derive(Debug, PartialEq, Eq)]
enum SetCookie {
    Set(String, String),
    Remove(String),
}

fn parse_set_cookie(raw: &str) -> Option<SetCookie> {
    let mut parts = raw.split(';');
    let (name, value) = parts.next()?.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }

    let expired = parts.any(|attr| {
        attr.split_once('=')
            .map(|(k, v)| k.trim().eq_ignore_ascii_case("max-age") && v.trim() == "0")
            .unwrap_or(false)
    });
    if expired {
        return Some(SetCookie::Remove(name.to_string()));
    }

    Some(SetCookie::Set(
        name.to_string(),
        value.trim().trim_matches('"').to_string(),
    ))
}

fn encode_form(fields: &[(&str, &str)]) -> String {
    fields
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}
