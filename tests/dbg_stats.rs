use axum::body::Body;
use axum::http::Request;
use duckdb::Connection;
use http_body_util::BodyExt;
use parking_lot::Mutex;
use std::sync::Arc;
use tower::ServiceExt;
use utm_insights::capture::middleware::AppState;
use utm_insights::server::build_router;
use utm_insights::store::schema;

#[tokio::test]
async fn dbg_stats() {
    let conn = Connection::open_in_memory().unwrap();
    schema::init_schema(&conn).unwrap();
    let state = Arc::new(AppState {
        conn: Arc::new(Mutex::new(conn)),
        capture_enabled: true,
        dashboard_origin: None,
    });
    let app = build_router(Arc::clone(&state));

    for uri in [
        "/landing?source=newsletter",
        "/landing?source=newsletter",
        "/pricing?source=twitter&campaign=spring",
    ] {
        let resp = app.clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        println!("{} -> {}", uri, resp.status());
    }

    let count: i64 = {
        let conn = state.conn.lock();
        conn.prepare("SELECT COUNT(*) FROM visits").unwrap().query_row([], |r| r.get(0)).unwrap()
    };
    println!("direct count: {}", count);

    let response = app
        .oneshot(Request::builder().uri("/api/insights/stats").body(Body::empty()).unwrap())
        .await
        .unwrap();
    println!("stats status: {}", response.status());
    let body = response.into_body().collect().await.unwrap().to_bytes();
    println!("{}", String::from_utf8_lossy(&body));
}
