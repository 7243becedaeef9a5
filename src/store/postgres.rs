use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::models::token::{NewToken, Token};
use crate::store::{InsertOutcome, SettingsRepository, TokenRepository};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run pending migrations from the migrations/ directory.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

// -- Token Operations --

#[async_trait]
impl TokenRepository for PgStore {
    async fn insert_token(&self, token: &NewToken) -> anyhow::Result<InsertOutcome> {
        let result = sqlx::query(
            "INSERT INTO tokens (token, me, client_id, scope) VALUES ($1, $2, $3, $4)",
        )
        .bind(&token.value)
        .bind(&token.me)
        .bind(&token.client_id)
        .bind(&token.scope)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(InsertOutcome::Inserted),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Ok(InsertOutcome::Conflict),
            Err(e) => Err(e.into()),
        }
    }

    async fn get_token(&self, value: &str) -> anyhow::Result<Option<Token>> {
        let row = sqlx::query_as::<_, TokenRow>(
            "SELECT token, me, client_id, scope, created_at, revoked FROM tokens WHERE token = $1",
        )
        .bind(value)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Token::from))
    }

    async fn revoke_token(&self, value: &str) -> anyhow::Result<bool> {
        let result =
            sqlx::query("UPDATE tokens SET revoked = NOW() WHERE token = $1 AND revoked IS NULL")
                .bind(value)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }
}

// -- Settings Operations --

#[async_trait]
impl SettingsRepository for PgStore {
    async fn has_setting(&self, name: &str, value: &str) -> anyhow::Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM settings WHERE name = $1 AND value = $2)",
        )
        .bind(name)
        .bind(value)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn list_settings(&self, name: &str) -> anyhow::Result<Vec<String>> {
        let rows = sqlx::query_scalar::<_, String>(
            "SELECT value FROM settings WHERE name = $1 ORDER BY value ASC",
        )
        .bind(name)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn add_setting(&self, name: &str, value: &str) -> anyhow::Result<bool> {
        let result = sqlx::query(
            "INSERT INTO settings (name, value) VALUES ($1, $2) ON CONFLICT (name, value) DO NOTHING",
        )
        .bind(name)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn remove_setting(&self, name: &str, value: &str) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM settings WHERE name = $1 AND value = $2")
            .bind(name)
            .bind(value)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[derive(Debug, sqlx::FromRow, Serialize, Deserialize)]
pub struct TokenRow {
    pub token: String,
    pub me: String,
    pub client_id: String,
    pub scope: String,
    pub created_at: DateTime<Utc>,
    pub revoked: Option<DateTime<Utc>>,
}

impl From<TokenRow> for Token {
    fn from(row: TokenRow) -> Self {
        Token {
            value: row.token,
            me: row.me,
            client_id: row.client_id,
            scope: row.scope,
            created_at: row.created_at,
            revoked_at: row.revoked,
        }
    }
}
