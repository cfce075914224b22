use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use duckdb::Connection;
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::store::visit::{insert_visit, Visit};

/// Request paths that belong to the application itself and never carry
/// attribution: the admin UI, the insights read API, the auth subsystem,
/// and the health check. Matched case-sensitively, before any parsing.
const IGNORED_PREFIXES: [&str; 4] = ["/admin", "/api", "/auth", "/health"];

/// Query parameters that mark a request as carrying attribution.
const UTM_PARAMS: [&str; 5] = ["source", "medium", "campaign", "term", "content"];

/// Shared application state.
pub struct AppState {
    pub conn: Arc<Mutex<Connection>>,
    pub capture_enabled: bool,
    pub dashboard_origin: Option<String>,
}

/// Visit-tracking middleware, layered over every route including the
/// fallback.
///
/// Capture is best-effort: a failed insert is logged and swallowed, and the
/// wrapped request always completes as if capture had never run.
pub async fn track_visits(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    if state.capture_enabled && !is_ignored_path(request.uri().path()) {
        if let Some(visit) = build_visit(&request) {
            let conn = Arc::clone(&state.conn);
            let result = tokio::task::spawn_blocking(move || {
                let conn = conn.lock();
                insert_visit(&conn, &visit)
            })
            .await;
            match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::error!(error = %e, "Visit tracker failed"),
                Err(e) => tracing::error!(error = %e, "Visit tracker task panicked"),
            }
        }
    }

    next.run(request).await
}

fn is_ignored_path(path: &str) -> bool {
    IGNORED_PREFIXES
        .iter()
        .any(|prefix| path.starts_with(prefix))
}

/// Build the visit record for a request, or None when no UTM parameter is
/// present.
fn build_visit(request: &Request) -> Option<Visit> {
    let query = parse_query(request.uri().query().unwrap_or(""));

    let has_attribution = UTM_PARAMS
        .iter()
        .any(|param| query.iter().any(|(key, _)| key == param));
    if !has_attribution {
        return None;
    }

    let param = |name: &str| {
        query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.clone())
    };

    Some(Visit {
        source: param("source"),
        medium: param("medium"),
        campaign: param("campaign"),
        term: param("term"),
        content: param("content"),
        path: request.uri().path().to_string(),
        ip: extract_client_ip(request),
        user_agent: request
            .headers()
            .get("user-agent")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        via: param("via").unwrap_or_else(|| "website".to_string()),
    })
}

/// Split a raw query string into key/value pairs, dropping parameters with
/// empty values. An empty `source=` therefore neither triggers capture nor
/// produces an empty-string field.
fn parse_query(raw: &str) -> Vec<(String, String)> {
    raw.split('&')
        .filter_map(|pair| {
            let mut parts = pair.splitn(2, '=');
            let key = parts.next().unwrap_or("");
            let value = parts.next().unwrap_or("");
            if key.is_empty() || value.is_empty() {
                None
            } else {
                Some((key.to_string(), value.to_string()))
            }
        })
        .collect()
}

/// Resolve the client IP, preferring the forwarded-for chain (first hop)
/// over the connection-level address.
fn extract_client_ip(request: &Request) -> String {
    let forwarded = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(str::trim)
        .filter(|s| !s.is_empty());

    if let Some(ip) = forwarded {
        return ip.to_string();
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map_or_else(|| "unknown".to_string(), |info| info.0.ip().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn make_request(uri: &str) -> Request {
        axum::http::Request::builder()
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_ignored_paths() {
        assert!(is_ignored_path("/admin"));
        assert!(is_ignored_path("/admin/settings"));
        assert!(is_ignored_path("/api/insights/stats"));
        assert!(is_ignored_path("/auth/login"));
        assert!(is_ignored_path("/health"));
        assert!(!is_ignored_path("/landing"));
        assert!(!is_ignored_path("/"));
        // Prefix match is case-sensitive
        assert!(!is_ignored_path("/Admin"));
    }

    #[test]
    fn test_parse_query_drops_empty_values() {
        let pairs = parse_query("source=google&medium=&via=qr");
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0], ("source".to_string(), "google".to_string()));
        assert_eq!(pairs[1], ("via".to_string(), "qr".to_string()));
    }

    #[test]
    fn test_build_visit_requires_utm_param() {
        assert!(build_visit(&make_request("/landing")).is_none());
        assert!(build_visit(&make_request("/landing?page=2&ref=abc")).is_none());
        assert!(build_visit(&make_request("/landing?source=")).is_none());
    }

    #[test]
    fn test_build_visit_any_single_utm_param() {
        for param in UTM_PARAMS {
            let request = make_request(&format!("/landing?{param}=x"));
            assert!(build_visit(&request).is_some(), "{param} should qualify");
        }
    }

    #[test]
    fn test_build_visit_fields() {
        let request = axum::http::Request::builder()
            .uri("/pricing?source=newsletter&medium=email&campaign=spring")
            .header("user-agent", "Mozilla/5.0")
            .header("x-forwarded-for", "1.2.3.4, 5.6.7.8")
            .body(Body::empty())
            .unwrap();

        let visit = build_visit(&request).unwrap();
        assert_eq!(visit.source.as_deref(), Some("newsletter"));
        assert_eq!(visit.medium.as_deref(), Some("email"));
        assert_eq!(visit.campaign.as_deref(), Some("spring"));
        assert_eq!(visit.term, None);
        assert_eq!(visit.content, None);
        assert_eq!(visit.path, "/pricing");
        assert_eq!(visit.ip, "1.2.3.4");
        assert_eq!(visit.user_agent.as_deref(), Some("Mozilla/5.0"));
        assert_eq!(visit.via, "website");
    }

    #[test]
    fn test_build_visit_path_excludes_query_string() {
        let visit = build_visit(&make_request("/landing?source=x&page=2")).unwrap();
        assert_eq!(visit.path, "/landing");
    }

    #[test]
    fn test_build_visit_via_parameter() {
        let visit = build_visit(&make_request("/landing?source=x&via=qr-code")).unwrap();
        assert_eq!(visit.via, "qr-code");

        let visit = build_visit(&make_request("/landing?source=x")).unwrap();
        assert_eq!(visit.via, "website");
    }

    #[test]
    fn test_extract_client_ip_forwarded_for_first_hop() {
        let request = axum::http::Request::builder()
            .uri("/")
            .header("x-forwarded-for", "1.2.3.4, 5.6.7.8")
            .body(Body::empty())
            .unwrap();
        assert_eq!(extract_client_ip(&request), "1.2.3.4");
    }

    #[test]
    fn test_extract_client_ip_connection_address() {
        let mut request = make_request("/");
        request.extensions_mut().insert(ConnectInfo(SocketAddr::from((
            [192, 168, 1, 10],
            4321,
        ))));
        assert_eq!(extract_client_ip(&request), "192.168.1.10");
    }

    #[test]
    fn test_extract_client_ip_unknown() {
        assert_eq!(extract_client_ip(&make_request("/")), "unknown");
    }
}
