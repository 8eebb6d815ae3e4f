use axum::Router;
use axum_test::TestServer;
use chrono::Utc;
use ledger::DuePolicy;
use migration::{Migrator, MigratorTrait};
use model::entities::user;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Database, DatabaseConnection, Set};

use crate::router::create_router;
use crate::schemas::AppState;

/// Create an in-memory SQLite database for testing
pub async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory database");

    db.execute_unprepared("PRAGMA foreign_keys = ON;")
        .await
        .expect("Failed to enable foreign keys");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}

/// Create AppState for testing, with users `u1` and `u2`
pub async fn setup_test_app_state() -> AppState {
    let db = setup_test_db().await;

    for id in ["u1", "u2"] {
        user::ActiveModel {
            id: Set(id.to_string()),
            username: Set(format!("test_{id}")),
            created_at: Set(Utc::now()),
        }
        .insert(&db)
        .await
        .expect("Failed to create test user");
    }

    AppState {
        db,
        due_policy: DuePolicy::ExactDay,
    }
}

/// Create a test server over the full router, returning the state for direct inspection
pub async fn setup_test_server() -> (TestServer, AppState) {
    let state = setup_test_app_state().await;
    let app: Router = create_router(state.clone());
    let server = TestServer::new(app).expect("Failed to start test server");
    (server, state)
}
