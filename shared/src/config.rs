use anyhow::{Context, Result};
use std::str::FromStr;

pub struct AppConfig {
    pub database: DatabaseConfig,
    pub store: StoreBackend,
    pub server: ServerConfig,
    pub image: ImageConfig,
    pub mail: MailConfig,
    pub llm: LlmConfig,
    pub outbox: OutboxConfig,
}

impl AppConfig {
    pub fn new() -> Result<Self> {
        let database = DatabaseConfig {
            host: std::env::var("DATABASE_HOST").unwrap_or_else(|_| "localhost".into()),
            port: parse_or("DATABASE_PORT", 5432)?,
            username: std::env::var("DATABASE_USERNAME").unwrap_or_else(|_| "app".into()),
            password: std::env::var("DATABASE_PASSWORD").unwrap_or_else(|_| "passwd".into()),
            database: std::env::var("DATABASE_NAME").unwrap_or_else(|_| "app".into()),
        };
        let store = match std::env::var("STORE_BACKEND").as_deref() {
            Ok("memory") => StoreBackend::Memory,
            Ok("postgres") | Err(_) => StoreBackend::Postgres,
            Ok(other) => anyhow::bail!("unknown STORE_BACKEND: {other}"),
        };
        let server = ServerConfig {
            port: parse_or("SERVER_PORT", 8080)?,
        };
        let image = ImageConfig {
            directory: std::env::var("IMAGE_DIR").unwrap_or_else(|_| "./images".into()),
            public_base_url: std::env::var("IMAGE_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080/images".into()),
        };
        let mail = MailConfig {
            sender: std::env::var("MAIL_SENDER").ok(),
            service_account_key: std::env::var("GMAIL_SERVICE_ACCOUNT_KEY").ok(),
        };
        let llm = LlmConfig {
            api_base: std::env::var("LLM_API_BASE")
                .unwrap_or_else(|_| "https://api.openai.com/v1".into()),
            timeout_secs: parse_or("LLM_TIMEOUT_SECS", 20)?,
        };
        let outbox = OutboxConfig {
            retry_count: parse_or("OUTBOX_RETRY_COUNT", 3)?,
        };
        Ok(Self {
            database,
            store,
            server,
            image,
            mail,
            llm,
            outbox,
        })
    }

    // テストやローカル起動用。外部サービスはすべて無効
    pub fn for_memory() -> Self {
        Self {
            database: DatabaseConfig {
                host: "localhost".into(),
                port: 5432,
                username: "app".into(),
                password: "passwd".into(),
                database: "app".into(),
            },
            store: StoreBackend::Memory,
            server: ServerConfig { port: 8080 },
            image: ImageConfig {
                directory: std::env::temp_dir()
                    .join("event-planner-images")
                    .to_string_lossy()
                    .into_owned(),
                public_base_url: "http://localhost:8080/images".into(),
            },
            mail: MailConfig {
                sender: None,
                service_account_key: None,
            },
            llm: LlmConfig {
                api_base: "http://localhost:0".into(),
                timeout_secs: 1,
            },
            outbox: OutboxConfig { retry_count: 0 },
        }
    }
}

fn parse_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(v) => v.parse().with_context(|| format!("invalid value for {key}")),
        Err(_) => Ok(default),
    }
}

pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

pub struct ServerConfig {
    pub port: u16,
}

pub struct ImageConfig {
    pub directory: String,
    pub public_base_url: String,
}

pub struct MailConfig {
    pub sender: Option<String>,
    pub service_account_key: Option<String>,
}

pub struct LlmConfig {
    pub api_base: String,
    pub timeout_secs: u64,
}

pub struct OutboxConfig {
    pub retry_count: usize,
}
