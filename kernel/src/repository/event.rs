use crate::model::{
    event::Event,
    id::{EventId, UserId},
};
use async_trait::async_trait;
use shared::error::AppResult;

#[async_trait]
pub trait EventRepository: Send + Sync {
    // 名前・スラッグの重複は Conflict で返す
    async fn create(&self, event: Event) -> AppResult<()>;
    async fn find_all(&self) -> AppResult<Vec<Event>>;
    async fn find_by_id(&self, event_id: EventId) -> AppResult<Option<Event>>;
    async fn find_by_name(&self, name: &str) -> AppResult<Option<Event>>;
    async fn update(&self, event: Event) -> AppResult<()>;
    // 子エンティティもまとめて削除する
    async fn delete(&self, event_id: EventId) -> AppResult<()>;
    // パスワード認証に成功したユーザーを恒久的に許可リストへ追加する
    async fn grant_access(&self, event_id: EventId, user_id: UserId) -> AppResult<()>;
}
