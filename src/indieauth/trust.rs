use crate::store::SettingsRepository;

/// Settings key under which trusted authorization endpoints are stored.
pub const TRUSTED_ENDPOINT_KEY: &str = "endpoint";

/// Is `endpoint` on the allow-list? Exact string comparison, no normalization.
pub async fn is_trusted(settings: &dyn SettingsRepository, endpoint: &str) -> anyhow::Result<bool> {
    let trusted = settings.has_setting(TRUSTED_ENDPOINT_KEY, endpoint).await?;
    if !trusted {
        tracing::info!(endpoint = %endpoint, "authorization endpoint is not on the allow-list");
    }
    Ok(trusted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    #[tokio::test]
    async fn test_exact_match_only() {
        let store = MemoryStore::new();
        store.add_setting(TRUSTED_ENDPOINT_KEY, "https://auth.example/auth").await.unwrap();

        assert!(is_trusted(&store, "https://auth.example/auth").await.unwrap());
        assert!(!is_trusted(&store, "https://auth.example/auth/").await.unwrap());
        assert!(!is_trusted(&store, "http://auth.example/auth").await.unwrap());
        assert!(!is_trusted(&store, "https://AUTH.example/auth").await.unwrap());
    }

    #[tokio::test]
    async fn test_other_setting_names_do_not_count() {
        let store = MemoryStore::new();
        store.add_setting("not-endpoint", "https://auth.example/auth").await.unwrap();

        assert!(!is_trusted(&store, "https://auth.example/auth").await.unwrap());
    }
}
