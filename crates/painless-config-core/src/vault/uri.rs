//! `keyvault://` reference parsing

use url::Url;

use crate::graph::{has_prefix_ignore_case, Recognized};

/// Scheme prefix for vault placeholders (case-insensitive)
pub const KEYVAULT_PREFIX: &str = "keyvault://";

const SECRETS_SEGMENT: &str = "/secrets/";

/// Parsed `keyvault://[tag@]host[:port]/secrets/<name>[/<version>]` value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyVaultReference {
    /// `https://host[:port]`, host lowercased
    pub vault_base_url: String,
    pub name: String,
    /// `None` means the latest version
    pub version: Option<String>,
    /// Tag to extract instead of the secret value
    pub tag: Option<String>,
    canonical: String,
}

impl KeyVaultReference {
    /// Canonical secret identifier: `https`, no tag, no query or fragment
    ///
    /// Two references with the same canonical URI name the same secret
    /// version, whatever tag they select.
    pub fn canonical_uri(&self) -> &str {
        &self.canonical
    }
}

/// Canonical identifier for a secret in a vault
pub fn canonical_secret_uri(vault_base_url: &str, name: &str, version: Option<&str>) -> String {
    let base = vault_base_url.trim_end_matches('/');
    match version {
        Some(version) => format!("{}/secrets/{}/{}", base, name, version),
        None => format!("{}/secrets/{}", base, name),
    }
}

/// Percent-decode the userinfo of a reference
///
/// `+`, `&` and `=` are literal in userinfo, so they are escaped before
/// going through the form decoder.
fn decode_userinfo(raw: &str) -> String {
    let escaped = raw.replace('+', "%2B").replace('&', "%26").replace('=', "%3D");
    url::form_urlencoded::parse(escaped.as_bytes())
        .map(|(key, _)| key.into_owned())
        .next()
        .unwrap_or_default()
}

/// Parse a string value as a `keyvault://` reference
pub fn parse_secret_uri(value: &str) -> Recognized<KeyVaultReference> {
    if !has_prefix_ignore_case(value, KEYVAULT_PREFIX) {
        return Recognized::NotPlaceholder;
    }

    let url = match Url::parse(value) {
        Ok(url) => url,
        Err(e) => return Recognized::Malformed(e.to_string()),
    };

    let host = match url.host_str() {
        Some(host) if !host.is_empty() => host.to_ascii_lowercase(),
        _ => return Recognized::Malformed("missing vault host".to_string()),
    };

    let rest = match url.path().strip_prefix(SECRETS_SEGMENT) {
        Some(rest) => rest.trim_end_matches('/'),
        None => return Recognized::Malformed("path must start with /secrets/".to_string()),
    };
    let (name, version) = match rest.split_once('/') {
        Some((name, version)) => (name, Some(version).filter(|v| !v.is_empty())),
        None => (rest, None),
    };
    if name.is_empty() {
        return Recognized::Malformed("missing secret name".to_string());
    }

    let vault_base_url = match url.port() {
        Some(port) => format!("https://{}:{}", host, port),
        None => format!("https://{}", host),
    };
    let userinfo = match url.password() {
        Some(password) => format!("{}:{}", url.username(), password),
        None => url.username().to_string(),
    };
    let tag = Some(decode_userinfo(&userinfo)).filter(|t| !t.is_empty());
    let canonical = canonical_secret_uri(&vault_base_url, name, version);

    Recognized::Match(KeyVaultReference {
        vault_base_url,
        name: name.to_string(),
        version: version.map(str::to_string),
        tag,
        canonical,
    })
}
