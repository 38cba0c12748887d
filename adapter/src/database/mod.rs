use shared::{
    config::DatabaseConfig,
    error::{AppError, AppResult},
};
use sqlx::{postgres::PgConnectOptions, PgPool};

pub mod model;

fn make_pg_connect_options(cfg: &DatabaseConfig) -> PgConnectOptions {
    PgConnectOptions::new()
        .host(&cfg.host)
        .port(cfg.port)
        .username(&cfg.username)
        .password(&cfg.password)
        .database(&cfg.database)
}

#[derive(Clone)]
pub struct ConnectionPool(PgPool);

impl ConnectionPool {
    pub fn new(pool: PgPool) -> Self {
        Self(pool)
    }

    pub fn inner_ref(&self) -> &PgPool {
        &self.0
    }

    pub async fn begin(&self) -> AppResult<sqlx::Transaction<'_, sqlx::Postgres>> {
        self.0.begin().await.map_err(AppError::TransactionError)
    }

    // 空き確認と書き込みを同じトランザクションで行うために使う
    pub async fn begin_serializable(&self) -> AppResult<sqlx::Transaction<'_, sqlx::Postgres>> {
        let mut tx = self.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await
            .map_err(AppError::SpecificOperationError)?;
        Ok(tx)
    }

    pub async fn migrate(&self) -> AppResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.0)
            .await
            .map_err(|e| AppError::ExternalServiceError(format!("migration failed: {e}")))
    }
}

pub fn connect_database_with(cfg: &DatabaseConfig) -> ConnectionPool {
    ConnectionPool(PgPool::connect_lazy_with(make_pg_connect_options(cfg)))
}

/// Maps constraint violations onto the error taxonomy; everything else is a
/// plain database failure.
pub fn map_write_error(err: sqlx::Error) -> AppError {
    let Some(db_err) = err.as_database_error() else {
        return AppError::SpecificOperationError(err);
    };
    let message = match (db_err.code().as_deref(), db_err.constraint()) {
        (Some("23505"), Some("events_name_key")) => "An event with this name already exists",
        (Some("23505"), Some("events_slug_key")) => "An event with this slug already exists",
        (Some("23505"), Some("rooms_event_name_key")) => {
            "A room with this name already exists in the event"
        }
        (Some("23505"), Some("attendees_email_key")) => {
            "An attendee with this email already exists"
        }
        (Some("23505"), _) => "A record with the same key already exists",
        (Some("23P01"), _) => "The room is already booked at this time",
        (Some("40001"), _) => "The schedule changed while saving, please retry",
        _ => return AppError::SpecificOperationError(err),
    };
    AppError::Conflict(message.into())
}
