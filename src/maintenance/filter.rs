//! Host filters deciding which requests are subject to maintenance.
//!
//! # Responsibilities
//! - Parse raw filter patterns into host predicates
//! - Match a request's host against a filter (exact or subdomain)
//! - Combine filters with OR semantics
//!
//! # Design Decisions
//! - Host matching is case-insensitive, port is ignored
//! - `example.com` matches `sub.example.com` but not `someexample.com`
//! - Path clauses and host wildcards are recognized but not implemented:
//!   they are logged, path clauses add no constraint, wildcards match literally
//! - Empty filter set = every request is in scope

use axum::http::{header, uri::Authority, Request};

/// Matches a request host against one domain and its subdomains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostFilter {
    host: String,
    wildcard: bool,
}

impl HostFilter {
    /// Create a filter. The host is normalized to lowercase.
    pub fn new(host: impl Into<String>) -> Self {
        let host = host.into().to_ascii_lowercase();
        let wildcard = host.contains('*');
        Self { host, wildcard }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// True if the host contains `*`. Wildcards are not expanded.
    pub fn is_wildcard(&self) -> bool {
        self.wildcard
    }

    /// Match an already port-stripped host.
    pub fn matches_host(&self, host: &str) -> bool {
        let host = host.to_ascii_lowercase();
        host == self.host
            || host
                .strip_suffix(self.host.as_str())
                .is_some_and(|prefix| prefix.ends_with('.'))
    }

    pub fn matches<B>(&self, req: &Request<B>) -> bool {
        request_host(req).is_some_and(|host| self.matches_host(&host))
    }
}

/// A raw filter pattern split into its host and path clauses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterPattern {
    pub host: Option<HostFilter>,
    pub path: Option<String>,
}

impl FilterPattern {
    /// Parse `[scheme://]host[/path]` or `/path`.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.starts_with('/') {
            return Self {
                host: None,
                path: Some(raw.to_string()),
            };
        }

        let rest = strip_scheme(raw);
        let (host, path) = match rest.find('/') {
            Some(idx) => (&rest[..idx], Some(rest[idx..].to_string())),
            None => (rest, None),
        };

        Self {
            host: (!host.is_empty()).then(|| HostFilter::new(host)),
            path,
        }
    }
}

fn strip_scheme(pattern: &str) -> &str {
    for scheme in ["http://", "https://"] {
        if pattern
            .get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
        {
            return &pattern[scheme.len()..];
        }
    }
    pattern
}

/// The active host filters plus the clauses that were recognized but ignored.
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    filters: Vec<HostFilter>,
    inert: Vec<String>,
}

impl FilterSet {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Self {
        let mut set = Self::default();

        for raw in patterns {
            let raw = raw.as_ref();
            let pattern = FilterPattern::parse(raw);

            let mut inert = false;
            if let Some(path) = &pattern.path {
                tracing::warn!(pattern = %raw, path = %path, "Path filter is not implemented, ignoring path clause");
                inert = true;
            }

            match pattern.host {
                Some(host) => {
                    if host.is_wildcard() {
                        tracing::warn!(pattern = %raw, "Wildcard in host filter is not implemented, matching literally");
                        inert = true;
                    }
                    set.filters.push(host);
                }
                None => tracing::debug!(pattern = %raw, "Filter has no host clause, dropping"),
            }
            if inert {
                set.inert.push(raw.to_string());
            }
        }

        set
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn filters(&self) -> &[HostFilter] {
        &self.filters
    }

    /// Raw patterns with a path clause or a host wildcard, kept for auditing.
    pub fn inert_patterns(&self) -> &[String] {
        &self.inert
    }

    /// True if no filters are configured or at least one matches.
    pub fn in_scope<B>(&self, req: &Request<B>) -> bool {
        if self.filters.is_empty() {
            return true;
        }
        match request_host(req) {
            Some(host) => self.filters.iter().any(|f| f.matches_host(&host)),
            None => false,
        }
    }
}

/// The request's host without port: `Host` header first, then the URI authority.
pub fn request_host<B>(req: &Request<B>) -> Option<String> {
    let raw = req
        .headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or_else(|| req.uri().authority().map(|a| a.as_str().to_string()))?;

    let host = match raw.parse::<Authority>() {
        Ok(authority) => authority.host().to_string(),
        Err(_) => raw.split(':').next().unwrap_or_default().to_string(),
    };
    (!host.is_empty()).then(|| host.to_ascii_lowercase())
}
