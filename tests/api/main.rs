mod create;
mod utils;

use object_permissions::{
    AppConfig, AppSettings, AppState, Asset, DatabaseConfig, LogLevel, Secrets, User,
    build_router, connect_pool,
};
pub use utils::*;

// ============================================================================
// Shared Test Setup
// ============================================================================

/// Fresh app over its own in-memory database
pub async fn setup_test_env() -> anyhow::Result<AppTest> {
    let settings = AppSettings {
        app: AppConfig {
            name: "object_permissions".into(),
            host: "localhost".into(),
            port: 5050,
            log_level: LogLevel::Info,
            log_directory: "./logs".into(),
        },
        database: DatabaseConfig {
            url: "sqlite::memory:".into(),
            max_connections: 1,
        },
        secrets: Secrets {
            hmac: "OIodbFUiNK34xthjR0newczMC6HaAyksJS1GXfYZ".into(),
        },
    };
    let db_pool = connect_pool(&settings.database).await?;
    let state = AppState { settings, db_pool };
    AppTest::new(build_router(state.clone()), state)
}

/// Owner with a two-level asset tree, plus two other users
pub struct Scenario {
    pub app: AppTest,
    pub owner: User,
    pub alice: User,
    pub bob: User,
    pub root: Asset,
    pub child: Asset,
}

impl Scenario {
    pub fn jwt(&self, user: &User) -> String {
        self.app.token(user).expect("failed to sign test token")
    }
}

pub async fn setup_scenario() -> anyhow::Result<Scenario> {
    let app = setup_test_env().await?;
    let pool = &app.state.db_pool;
    let owner = TestDatabase::create_user(pool, "owner").await?;
    let alice = TestDatabase::create_user(pool, "alice").await?;
    let bob = TestDatabase::create_user(pool, "bob").await?;
    let root = TestDatabase::create_asset(pool, &owner, None, "survey").await?;
    let child = TestDatabase::create_asset(pool, &owner, Some(&root), "block").await?;
    Ok(Scenario {
        app,
        owner,
        alice,
        bob,
        root,
        child,
    })
}
