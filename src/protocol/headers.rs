use axum::http::{request::Parts, HeaderMap};

pub const JSON_MEDIA_TYPE: &str = "application/json";

/// Read access to request headers. Names are matched case-insensitively.
pub trait HeaderAccess {
    /// First value of the header, if present and valid UTF-8
    fn header(&self, name: &str) -> Option<&str>;

    /// Every value of the header, in arrival order
    fn headers(&self, name: &str) -> Vec<&str>;
}

impl HeaderAccess for HeaderMap {
    fn header(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|v| v.to_str().ok())
    }

    fn headers(&self, name: &str) -> Vec<&str> {
        self.get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect()
    }
}

/// Whether a request came from client-side navigation or a full browser load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestClassification {
    Protocol,
    FullPage,
}

impl RequestClassification {
    pub fn is_protocol(self) -> bool {
        matches!(self, RequestClassification::Protocol)
    }
}

/// Only the literal value `true` selects protocol mode
pub fn classify<H: HeaderAccess + ?Sized>(headers: &H, marker: &str) -> RequestClassification {
    match headers.header(marker) {
        Some("true") => RequestClassification::Protocol,
        _ => RequestClassification::FullPage,
    }
}

/// Header view that answers every `Accept` read with `application/json` on
/// protocol requests and delegates everything else to the wrapped headers.
pub struct NormalizedHeaders<'a, H: HeaderAccess + ?Sized> {
    inner: &'a H,
    force_json: bool,
}

impl<'a, H: HeaderAccess + ?Sized> NormalizedHeaders<'a, H> {
    pub fn new(inner: &'a H, marker: &str) -> Self {
        Self {
            force_json: classify(inner, marker).is_protocol(),
            inner,
        }
    }

    pub fn with_classification(inner: &'a H, classification: RequestClassification) -> Self {
        Self {
            inner,
            force_json: classification.is_protocol(),
        }
    }

    fn overrides(&self, name: &str) -> bool {
        self.force_json && name.eq_ignore_ascii_case("accept")
    }
}

impl<H: HeaderAccess + ?Sized> HeaderAccess for NormalizedHeaders<'_, H> {
    fn header(&self, name: &str) -> Option<&str> {
        if self.overrides(name) {
            return Some(JSON_MEDIA_TYPE);
        }
        self.inner.header(name)
    }

    fn headers(&self, name: &str) -> Vec<&str> {
        if self.overrides(name) {
            return vec![JSON_MEDIA_TYPE];
        }
        self.inner.headers(name)
    }
}

/// Representation chosen by content negotiation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Negotiated {
    Json,
    Html,
}

/// Picks the first recognised media range of the `Accept` header; HTML otherwise
pub fn negotiate<H: HeaderAccess + ?Sized>(headers: &H) -> Negotiated {
    let ranges = headers
        .headers("accept")
        .into_iter()
        .flat_map(|value| value.split(','))
        .map(|range| range.split(';').next().unwrap_or("").trim().to_ascii_lowercase());

    for range in ranges {
        if range == JSON_MEDIA_TYPE || range.ends_with("+json") {
            return Negotiated::Json;
        }
        if range == "text/html" || range == "application/xhtml+xml" || range == "*/*" {
            return Negotiated::Html;
        }
    }
    Negotiated::Html
}

/// Owned, read-only snapshot of the request as the rest of the app sees it
#[derive(Debug, Clone)]
pub struct RequestView {
    headers: HeaderMap,
    path: String,
    classification: RequestClassification,
}

impl RequestView {
    pub fn new(headers: HeaderMap, path: impl Into<String>, marker: &str) -> Self {
        let classification = classify(&headers, marker);
        Self {
            headers,
            path: path.into(),
            classification,
        }
    }

    pub fn from_parts(parts: &Parts, marker: &str) -> Self {
        Self::new(parts.headers.clone(), parts.uri.path(), marker)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn classification(&self) -> RequestClassification {
        self.classification
    }

    pub fn is_protocol(&self) -> bool {
        self.classification.is_protocol()
    }

    /// Headers with the protocol's `Accept` normalization applied
    pub fn headers(&self) -> NormalizedHeaders<'_, HeaderMap> {
        NormalizedHeaders::with_classification(&self.headers, self.classification)
    }

    /// Headers exactly as the client sent them
    pub fn raw_headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn negotiated(&self) -> Negotiated {
        negotiate(&self.headers())
    }
}
