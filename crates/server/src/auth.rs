//! Caller identity and request tracing middleware.

use crate::state::AppState;
use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use shelf_core::policy::Identity;
use tracing::Instrument;
use uuid::Uuid;

/// Maximum length for trace IDs.
/// Longer trace IDs are truncated to prevent log bloat and log injection.
const MAX_TRACE_ID_LEN: usize = 128;

/// Trace ID for request correlation.
#[derive(Clone, Debug)]
pub struct TraceId(pub String);

impl TraceId {
    /// Generate a new random trace ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create a trace ID from a client-provided value, truncated to
    /// MAX_TRACE_ID_LEN characters with non-printable characters removed.
    pub fn from_client(value: &str) -> Self {
        let sanitized: String = value
            .chars()
            .take(MAX_TRACE_ID_LEN)
            .filter(|c| c.is_ascii_graphic() || *c == ' ')
            .collect();

        if sanitized.is_empty() {
            Self::new()
        } else {
            Self(sanitized)
        }
    }

    /// Get the trace ID as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TraceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TraceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Resolved caller identity for the current request.
///
/// `None` means an unauthenticated caller; policy evaluation then falls back
/// to directory default flags.
#[derive(Clone, Debug, Default)]
pub struct CallerIdentity(pub Option<Identity>);

/// The only abstraction policy evaluation consumes for caller identity.
///
/// Implementations resolve whatever the deployment's authentication layer
/// left on the request; nothing else in the server touches sessions,
/// cookies, or tokens.
pub trait IdentityProvider: Send + Sync + 'static {
    /// The caller's identity, if the request carries one.
    fn current_identity(&self, headers: &HeaderMap) -> Option<Identity>;
}

/// Reads the identity from a trusted header set by an authenticating
/// reverse proxy.
pub struct HeaderIdentityProvider {
    header: String,
}

impl HeaderIdentityProvider {
    /// Create a provider reading `header`.
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
        }
    }
}

impl IdentityProvider for HeaderIdentityProvider {
    fn current_identity(&self, headers: &HeaderMap) -> Option<Identity> {
        headers
            .get(self.header.as_str())
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(Identity::new)
    }
}

/// Extract trace ID from the x-trace-id header or generate a new one.
fn extract_or_generate_trace_id(req: &Request) -> TraceId {
    req.headers()
        .get("x-trace-id")
        .and_then(|value| value.to_str().ok())
        .map(TraceId::from_client)
        .unwrap_or_default()
}

/// Middleware resolving the caller identity and wrapping the request in a
/// tracing span carrying the trace ID.
pub async fn identity_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let trace_id = extract_or_generate_trace_id(&req);
    let trace_id_str = trace_id.as_str().to_string();

    let identity = state.identity.current_identity(req.headers());
    req.extensions_mut().insert(CallerIdentity(identity));
    req.extensions_mut().insert(trace_id);

    next.run(req)
        .instrument(tracing::info_span!("request", trace_id = %trace_id_str))
        .await
}
