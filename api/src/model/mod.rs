use serde::{Deserialize, Deserializer, Serialize};

pub mod admin;
pub mod attendee;
pub mod event;
pub mod meeting;
pub mod room;
pub mod transfer;

// キーが存在すれば null でも Some(None) にする
pub(crate) fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}
