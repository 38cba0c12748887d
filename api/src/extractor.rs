use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts},
    http::request::Parts,
};
use kernel::model::{id::UserId, role::Role, user::Identity};
use registry::AppRegistry;
use shared::error::AppError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Caller identity taken from the headers set by the identity proxy.
pub struct AuthorizedUser {
    pub identity: Identity,
}

impl AuthorizedUser {
    pub fn id(&self) -> UserId {
        self.identity.user_id
    }

    pub fn role(&self) -> Role {
        self.identity.role
    }
}

#[async_trait]
impl FromRequestParts<AppRegistry> for AuthorizedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _registry: &AppRegistry,
    ) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        let user_id = header(USER_ID_HEADER)
            .and_then(|v| v.parse::<UserId>().ok())
            .ok_or(AppError::UnauthenticatedError)?;
        let role = header(USER_ROLE_HEADER)
            .and_then(|v| v.to_lowercase().parse::<Role>().ok())
            .ok_or(AppError::UnauthenticatedError)?;

        Ok(Self {
            identity: Identity::new(user_id, role),
        })
    }
}

/// JSON request body. Malformed or incomplete bodies are rejected with 400
/// and the usual `{"message"}` payload.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);
