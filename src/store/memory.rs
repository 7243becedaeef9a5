//! In-process store used by tests and local experiments.
//!
//! `DashMap::entry` gives the same atomic insert-if-absent guarantee as the
//! unique index on `tokens.token`, so the collision path behaves like Postgres.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};
use std::sync::Arc;

use crate::models::token::{NewToken, Token};
use crate::store::{InsertOutcome, SettingsRepository, TokenRepository};

#[derive(Clone, Default)]
pub struct MemoryStore {
    tokens: Arc<DashMap<String, Token>>,
    settings: Arc<DashSet<(String, String)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }
}

#[async_trait]
impl TokenRepository for MemoryStore {
    async fn insert_token(&self, token: &NewToken) -> anyhow::Result<InsertOutcome> {
        match self.tokens.entry(token.value.clone()) {
            Entry::Occupied(_) => Ok(InsertOutcome::Conflict),
            Entry::Vacant(slot) => {
                slot.insert(Token {
                    value: token.value.clone(),
                    me: token.me.clone(),
                    client_id: token.client_id.clone(),
                    scope: token.scope.clone(),
                    created_at: Utc::now(),
                    revoked_at: None,
                });
                Ok(InsertOutcome::Inserted)
            }
        }
    }

    async fn get_token(&self, value: &str) -> anyhow::Result<Option<Token>> {
        Ok(self.tokens.get(value).map(|t| t.value().clone()))
    }

    async fn revoke_token(&self, value: &str) -> anyhow::Result<bool> {
        match self.tokens.get_mut(value) {
            Some(mut token) if token.revoked_at.is_none() => {
                token.revoked_at = Some(Utc::now());
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl SettingsRepository for MemoryStore {
    async fn has_setting(&self, name: &str, value: &str) -> anyhow::Result<bool> {
        Ok(self.settings.contains(&(name.to_string(), value.to_string())))
    }

    async fn list_settings(&self, name: &str) -> anyhow::Result<Vec<String>> {
        let mut values: Vec<String> = self
            .settings
            .iter()
            .filter(|entry| entry.key().0 == name)
            .map(|entry| entry.key().1.clone())
            .collect();
        values.sort();
        Ok(values)
    }

    async fn add_setting(&self, name: &str, value: &str) -> anyhow::Result<bool> {
        Ok(self.settings.insert((name.to_string(), value.to_string())))
    }

    async fn remove_setting(&self, name: &str, value: &str) -> anyhow::Result<bool> {
        Ok(self.settings.remove(&(name.to_string(), value.to_string())).is_some())
    }
}
