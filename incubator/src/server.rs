use anyhow::Result;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{Method, header},
};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

use crate::{app::AppResources, routes::Route};

pub const BODY_LIMIT: usize = 64 * 1024 * 1024;

pub fn build_router(resources: AppResources) -> Router {
    Route::ALL
        .iter()
        .fold(Router::new(), |router, route| {
            router.route(route.path(), route.handler())
        })
        .with_state(resources)
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([header::ORIGIN, header::CONTENT_TYPE, header::ACCEPT]),
        )
}

pub async fn serve_with_listener(listener: TcpListener, resources: AppResources) -> Result<()> {
    let router = build_router(resources);
    tracing::info!("HTTP server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::error!(?err, "failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
            tracing::info!("shutting down");
        })
        .await?;
    Ok(())
}
