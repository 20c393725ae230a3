use axum::{
    routing::{get, post},
    serve, Router,
};
use log::info;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::cache::TtlCache;
use crate::database::Database;
use crate::jobs::JobsManager;
use crate::routes;
use crate::segments::view::RemovalRange;

pub struct AppState {
    pub db: Arc<Database>,
    pub jobs: Arc<JobsManager>,
    pub removal_cache: Arc<TtlCache<Vec<RemovalRange>>>,
}

pub struct Server {
    state: Arc<AppState>,
    addr: SocketAddr,
}

impl Server {
    pub fn new(
        db: Arc<Database>,
        jobs: Arc<JobsManager>,
        addr: SocketAddr,
        cache_ttl: Duration,
    ) -> Self {
        let state = Arc::new(AppState {
            db,
            jobs,
            removal_cache: Arc::new(TtlCache::new(cache_ttl)),
        });
        Server { state, addr }
    }

    pub async fn start(self) -> Result<(), std::io::Error> {
        let app = router(self.state);

        info!("Starting server on {}", self.addr);

        serve(
            TcpListener::bind(self.addr).await?,
            app.into_make_service(),
        )
        .await
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(routes::posts::health))
        .route("/api/posts", get(routes::posts::list_posts))
        .route(
            "/api/posts/:post_guid/identified-segments",
            get(routes::segments::get_identified_segments),
        )
        .route(
            "/api/posts/:post_guid/approve-segments",
            post(routes::segments::approve_segments),
        )
        .route(
            "/api/posts/:post_guid/override-segments",
            post(routes::segments::override_segments),
        )
        .route(
            "/api/posts/:post_guid/removal-ranges",
            get(routes::segments::get_removal_ranges),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
