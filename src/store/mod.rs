pub mod memory;
pub mod postgres;
pub mod tokens;

use async_trait::async_trait;

use crate::models::token::{NewToken, Token};

/// Result of trying to store a freshly generated token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// The token value already exists (unique constraint).
    Conflict,
}

/// Persistence for issued tokens.
/// Implementations: PgStore (Postgres), MemoryStore (tests).
#[async_trait]
pub trait TokenRepository: Send + Sync {
    /// Insert an active token. A duplicate value must come back as
    /// `InsertOutcome::Conflict`, every other failure as an error.
    async fn insert_token(&self, token: &NewToken) -> anyhow::Result<InsertOutcome>;

    async fn get_token(&self, value: &str) -> anyhow::Result<Option<Token>>;

    /// Mark an active token revoked. Returns false when nothing changed
    /// (unknown or already revoked).
    async fn revoke_token(&self, value: &str) -> anyhow::Result<bool>;
}

/// Operator-managed `(name, value)` settings, e.g. the endpoint allow-list.
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    async fn has_setting(&self, name: &str, value: &str) -> anyhow::Result<bool>;

    async fn list_settings(&self, name: &str) -> anyhow::Result<Vec<String>>;

    /// Returns false if the pair was already present.
    async fn add_setting(&self, name: &str, value: &str) -> anyhow::Result<bool>;

    /// Returns false if the pair was not present.
    async fn remove_setting(&self, name: &str, value: &str) -> anyhow::Result<bool>;
}
