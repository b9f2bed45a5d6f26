use axum::{Router, middleware::from_fn};
use sqlx::SqlitePool;
use tokio::net::TcpListener;
use tracing::info;

use crate::{
    AppSettings, get_db, init_db, init_tracing, object_permissions, tracing_middleware,
};

#[derive(Clone)]
pub struct AppState {
    pub settings: AppSettings,
    pub db_pool: SqlitePool,
}

//---------------------------------------server---------------------------------------
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(object_permissions(state.clone()))
        .layer(from_fn(tracing_middleware))
        .with_state(state)
}

async fn start_app_server(router: Router, address: &str) -> anyhow::Result<()> {
    let listener = TcpListener::bind(address).await?;
    info!("listening on {}", address);
    axum::serve(listener, router).await?;
    Ok(())
}

pub async fn run() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let settings = AppSettings::load()?;
    init_tracing(&settings.app)?;
    init_db(&settings.database).await?;
    let address = settings.app.address();
    let state = AppState {
        settings,
        db_pool: get_db()?,
    };
    start_app_server(build_router(state), &address).await?;
    Ok(())
}
