#![allow(dead_code)]

use chrono::{Duration, NaiveDate, Utc};
use sea_orm::{ActiveModelTrait, Set};
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

use gearbook_api::config::AppConfig;
use gearbook_api::db::{establish_connection_with_config, run_migrations, DbConfig, DbPool};
use gearbook_api::entities::reservation::ReservationStatus;
use gearbook_api::entities::{booking_request, item, reservation};
use gearbook_api::events::{Event, EventSender};
use gearbook_api::services::AppServices;
use gearbook_api::AppState;

pub struct TestContext {
    pub db: Arc<DbPool>,
    pub services: AppServices,
    pub config: Arc<AppConfig>,
    // Keep the consumer alive so event sends do not log warnings.
    _events: mpsc::Receiver<Event>,
}

pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".into(),
        host: "127.0.0.1".into(),
        port: 8080,
        environment: "development".into(),
        log_level: "debug".into(),
        log_json: false,
        auto_migrate: true,
        cors_allowed_origins: None,
        cors_allow_any_origin: false,
        booking_horizon_days: 365,
        cart_capacity: 20,
        db_max_connections: 1,
        db_min_connections: 1,
        db_connect_timeout_secs: 30,
        db_acquire_timeout_secs: 8,
        db_idle_timeout_secs: 600,
    }
}

/// Fresh in-memory database with migrations applied and services wired.
pub async fn setup() -> TestContext {
    let config = test_config();

    // One connection max: each sqlite::memory: connection is its own
    // database, so the pool must not fan out.
    let db = establish_connection_with_config(&DbConfig {
        url: config.database_url.clone(),
        max_connections: 1,
        min_connections: 1,
        ..Default::default()
    })
    .await
    .expect("database connection");
    run_migrations(&db).await.expect("migrations");

    let db = Arc::new(db);
    let (tx, rx) = mpsc::channel(256);
    let services = AppServices::new(db.clone(), EventSender::new(tx), &config);

    TestContext {
        db,
        services,
        config: Arc::new(config),
        _events: rx,
    }
}

/// Full application state over a fresh database, for router-level tests.
pub async fn setup_state() -> (AppState, mpsc::Receiver<Event>) {
    let ctx = setup().await;
    let (tx, rx) = mpsc::channel(256);
    let state = AppState::new(ctx.db.clone(), ctx.config.clone(), EventSender::new(tx));
    (state, rx)
}

pub fn day(offset: i64) -> NaiveDate {
    Utc::now().date_naive() + Duration::days(offset)
}

pub async fn seed_item(db: &DbPool, name: &str, total_quantity: Option<i32>) -> item::Model {
    item::ActiveModel {
        name: Set(name.to_string()),
        category: Set("cameras".to_string()),
        total_quantity: Set(total_quantity),
        description: Set(None),
        image_url: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("seed item")
}

/// Inserts a reservation line (and its owning request row) directly,
/// bypassing admission, for shaping availability scenarios.
pub async fn seed_reservation(
    db: &DbPool,
    user_id: Uuid,
    item_id: Uuid,
    quantity: i32,
    start: NaiveDate,
    end: NaiveDate,
    status: ReservationStatus,
) -> reservation::Model {
    let request = booking_request::ActiveModel {
        user_id: Set(user_id),
        note: Set(None),
        status: Set(ReservationStatus::Pending.as_str().to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("seed request");

    reservation::ActiveModel {
        request_id: Set(request.id),
        user_id: Set(user_id),
        item_id: Set(item_id),
        quantity: Set(quantity),
        start_date: Set(start),
        start_time: Set(None),
        end_date: Set(end),
        end_time: Set(None),
        status: Set(status.as_str().to_string()),
        rejection_reason: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("seed reservation")
}
