//! Request Fingerprints
//!
//! Builds cache keys from a request's method, URL and query parameters.
//! Parameters are sorted, so the same request always maps to the same key
//! regardless of the order its parameters were given in.

use std::fmt;

/// Cache key for one request: `[namespace|]METHOD url[?k=v&...]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestKey {
    namespace: Option<String>,
    method: String,
    url: String,
    params: Vec<(String, String)>,
}

impl RequestKey {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            namespace: None,
            method: method.into().to_ascii_uppercase(),
            url: url.into(),
            params: Vec::new(),
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new("GET", url)
    }

    /// Prefixes the key so related requests can be invalidated together.
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    pub fn params<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.params
            .extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(namespace) = &self.namespace {
            write!(f, "{namespace}|")?;
        }
        write!(f, "{} {}", self.method, self.url)?;

        let mut params: Vec<&(String, String)> = self.params.iter().collect();
        params.sort();
        for (i, (name, value)) in params.into_iter().enumerate() {
            let sep = if i == 0 { '?' } else { '&' };
            write!(f, "{sep}{}={}", escape(name), escape(value))?;
        }
        Ok(())
    }
}

impl From<RequestKey> for String {
    fn from(key: RequestKey) -> Self {
        key.to_string()
    }
}

// Keeps `&` and `=` inside names and values from colliding with separators.
fn escape(raw: &str) -> String {
    raw.replace('%', "%25")
        .replace('&', "%26")
        .replace('=', "%3D")
}
