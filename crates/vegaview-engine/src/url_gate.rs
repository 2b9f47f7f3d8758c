//! External URL policy for the engine's resource loader.
//!
//! Every URI the engine wants to load passes through [`UrlAccessGate::sanitize`].
//! Specs are plain JSON, so they can only ever produce [`UriInput::Url`];
//! a [`UriInput::Trusted`] value can only come from
//! [`bypass_external_url_check`], and the gate still checks that its token is
//! the process token by identity.

use once_cell::sync::Lazy;
use std::fmt;
use std::sync::Arc;
use vegaview_types::{Error, Result};

/// Marker tying a trusted URL to the host-side helper that created it.
///
/// Not `Clone`, not serializable, and constructible only inside this module.
pub struct BypassToken {
    _sealed: (),
}

impl fmt::Debug for BypassToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BypassToken")
    }
}

static BYPASS_TOKEN: Lazy<Arc<BypassToken>> = Lazy::new(|| Arc::new(BypassToken { _sealed: () }));

/// A URL the host has vouched for
#[derive(Debug, Clone)]
pub struct TrustedUrl {
    url: String,
    token: Arc<BypassToken>,
}

impl TrustedUrl {
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[derive(Debug, Clone)]
pub enum UriInput {
    /// URL as written in the spec
    Url(String),
    /// URL wrapped by [`bypass_external_url_check`]
    Trusted(TrustedUrl),
}

impl From<&str> for UriInput {
    fn from(url: &str) -> Self {
        UriInput::Url(url.to_string())
    }
}

impl From<String> for UriInput {
    fn from(url: String) -> Self {
        UriInput::Url(url)
    }
}

/// Wrap a host-generated URL so the gate lets it through even when
/// external URLs are disabled.
pub fn bypass_external_url_check(url: impl Into<String>) -> UriInput {
    UriInput::Trusted(TrustedUrl {
        url: url.into(),
        token: Arc::clone(&BYPASS_TOKEN),
    })
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadOptions {
    pub base_url: Option<String>,
    pub default_protocol: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedUri {
    pub href: String,
}

/// The pluggable sanitize step of the engine's loader
pub trait ResourceLoader: Send + Sync {
    fn sanitize(&self, uri: &str, options: &LoadOptions) -> Result<SanitizedUri>;
}

/// Loader behaviour used when the engine does not supply its own:
/// resolves relative paths against `base_url` and gives protocol-relative
/// URLs a default protocol.
#[derive(Debug, Clone, Default)]
pub struct StandardLoader;

impl ResourceLoader for StandardLoader {
    fn sanitize(&self, uri: &str, options: &LoadOptions) -> Result<SanitizedUri> {
        let uri = uri.trim();
        if uri.is_empty() {
            return Err(Error::InvalidArgument("Sanitize failure, empty URI".to_string()));
        }

        let lower = uri.to_ascii_lowercase();
        if lower.starts_with("javascript:") {
            return Err(Error::InvalidArgument(format!(
                "Sanitize failure, unsupported scheme: {}",
                uri
            )));
        }

        let href = if let Some(rest) = uri.strip_prefix("//") {
            let protocol = options.default_protocol.as_deref().unwrap_or("https");
            format!("{}://{}", protocol, rest)
        } else if lower.contains("://") || lower.starts_with("data:") {
            uri.to_string()
        } else if let Some(base) = options.base_url.as_deref() {
            format!(
                "{}/{}",
                base.trim_end_matches('/'),
                uri.trim_start_matches('/')
            )
        } else {
            uri.to_string()
        };

        Ok(SanitizedUri { href })
    }
}

/// Sanitize step that enforces the external URL policy before delegating
pub struct UrlAccessGate {
    inner: Arc<dyn ResourceLoader>,
    enable_external_urls: bool,
}

impl UrlAccessGate {
    pub fn new(inner: Arc<dyn ResourceLoader>, enable_external_urls: bool) -> Self {
        Self {
            inner,
            enable_external_urls,
        }
    }

    pub fn external_urls_enabled(&self) -> bool {
        self.enable_external_urls
    }

    pub fn sanitize(&self, uri: &UriInput, options: &LoadOptions) -> Result<SanitizedUri> {
        let url = match uri {
            UriInput::Trusted(trusted) if Arc::ptr_eq(&trusted.token, &BYPASS_TOKEN) => {
                trusted.url.as_str()
            }
            UriInput::Trusted(trusted) => {
                tracing::warn!(url = %trusted.url, "rejected URL carrying an unknown bypass token");
                return Err(Error::ExternalUrlDenied(trusted.url.clone()));
            }
            UriInput::Url(url) if !self.enable_external_urls => {
                tracing::debug!(%url, "external URL blocked by policy");
                return Err(Error::ExternalUrlDenied(url.clone()));
            }
            UriInput::Url(url) => url.as_str(),
        };

        self.inner.sanitize(url, options)
    }
}

impl fmt::Debug for UrlAccessGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UrlAccessGate")
            .field("enable_external_urls", &self.enable_external_urls)
            .finish_non_exhaustive()
    }
}
