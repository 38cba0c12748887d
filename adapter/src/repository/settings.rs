use crate::database::{model::settings::SettingsRow, ConnectionPool};
use async_trait::async_trait;
use derive_new::new;
use kernel::model::settings::SystemSettings;
use kernel::repository::settings::SettingsRepository;
use shared::error::{AppError, AppResult};

#[derive(new)]
pub struct SettingsRepositoryImpl {
    db: ConnectionPool,
}

#[async_trait]
impl SettingsRepository for SettingsRepositoryImpl {
    async fn get_or_create_default(&self) -> AppResult<SystemSettings> {
        // 行は常に 1 件。初回アクセス時にデフォルト値で作る
        let defaults = SystemSettings::default();
        sqlx::query(
            r#"
                INSERT INTO system_settings (
                    settings_id, llm_api_key, llm_model, default_tags,
                    default_meeting_types, default_attendee_types
                )
                VALUES (1, $1, $2, $3, $4, $5)
                ON CONFLICT (settings_id) DO NOTHING
            "#,
        )
        .bind(&defaults.llm_api_key)
        .bind(&defaults.llm_model)
        .bind(&defaults.default_tags)
        .bind(&defaults.default_meeting_types)
        .bind(&defaults.default_attendee_types)
        .execute(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        let row: SettingsRow = sqlx::query_as(
            r#"
                SELECT llm_api_key, llm_model, default_tags,
                       default_meeting_types, default_attendee_types
                FROM system_settings
                WHERE settings_id = 1
            "#,
        )
        .fetch_one(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        Ok(row.into())
    }

    async fn update(&self, settings: SystemSettings) -> AppResult<()> {
        sqlx::query(
            r#"
                INSERT INTO system_settings (
                    settings_id, llm_api_key, llm_model, default_tags,
                    default_meeting_types, default_attendee_types
                )
                VALUES (1, $1, $2, $3, $4, $5)
                ON CONFLICT (settings_id) DO UPDATE SET
                    llm_api_key = EXCLUDED.llm_api_key,
                    llm_model = EXCLUDED.llm_model,
                    default_tags = EXCLUDED.default_tags,
                    default_meeting_types = EXCLUDED.default_meeting_types,
                    default_attendee_types = EXCLUDED.default_attendee_types
            "#,
        )
        .bind(&settings.llm_api_key)
        .bind(&settings.llm_model)
        .bind(&settings.default_tags)
        .bind(&settings.default_meeting_types)
        .bind(&settings.default_attendee_types)
        .execute(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        Ok(())
    }
}
