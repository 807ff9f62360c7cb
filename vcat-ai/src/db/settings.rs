//! Key/value settings
//!
//! Values are stored as text and parsed on read. Classifier API keys entered
//! through the settings API live here and take priority over the
//! environment and the TOML file.

use super::Store;
use crate::error::StorageError;
use std::fmt::Display;
use std::str::FromStr;

pub const GEMINI_API_KEY_SETTING: &str = "gemini_api_key";
pub const GROQ_API_KEY_SETTING: &str = "groq_api_key";

impl Store {
    /// Read a setting; `None` when unset
    pub async fn get_setting<T>(&self, key: &str) -> Result<Option<T>, StorageError>
    where
        T: FromStr,
        T::Err: Display,
    {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some((value,)) => value.parse::<T>().map(Some).map_err(|e| {
                StorageError::Corrupt(format!("setting {} = {:?}: {}", key, value, e))
            }),
            None => Ok(None),
        }
    }

    /// Write a setting, replacing any previous value
    pub async fn set_setting<T: Display>(&self, key: &str, value: T) -> Result<(), StorageError> {
        let value = value.to_string();
        sqlx::query(
            r#"
            INSERT INTO settings (key, value) VALUES (?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(key)
        .bind(&value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn delete_setting(&self, key: &str) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM settings WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn get_gemini_api_key(&self) -> Result<Option<String>, StorageError> {
        self.get_setting(GEMINI_API_KEY_SETTING).await
    }

    pub async fn set_gemini_api_key(&self, key: &str) -> Result<(), StorageError> {
        self.set_setting(GEMINI_API_KEY_SETTING, key).await
    }

    pub async fn get_groq_api_key(&self) -> Result<Option<String>, StorageError> {
        self.get_setting(GROQ_API_KEY_SETTING).await
    }

    pub async fn set_groq_api_key(&self, key: &str) -> Result<(), StorageError> {
        self.set_setting(GROQ_API_KEY_SETTING, key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_missing_setting() {
        let store = Store::in_memory().await.unwrap();
        let value: Option<String> = store.get_setting("missing").await.unwrap();
        assert_eq!(value, None);
    }

    #[tokio::test]
    async fn test_set_and_get_typed_values() {
        let store = Store::in_memory().await.unwrap();
        store.set_setting("call_interval_ms", 250u64).await.unwrap();
        assert_eq!(
            store.get_setting::<u64>("call_interval_ms").await.unwrap(),
            Some(250)
        );

        store.set_setting("call_interval_ms", 500u64).await.unwrap();
        assert_eq!(
            store.get_setting::<u64>("call_interval_ms").await.unwrap(),
            Some(500)
        );
    }

    #[tokio::test]
    async fn test_unparseable_value_is_corrupt() {
        let store = Store::in_memory().await.unwrap();
        store.set_setting("interval", "soon").await.unwrap();
        assert!(matches!(
            store.get_setting::<u64>("interval").await,
            Err(StorageError::Corrupt(_))
        ));
    }

    #[tokio::test]
    async fn test_api_key_accessors() {
        let store = Store::in_memory().await.unwrap();
        assert_eq!(store.get_groq_api_key().await.unwrap(), None);

        store.set_groq_api_key("gsk-123").await.unwrap();
        store.set_gemini_api_key("AIza-456").await.unwrap();
        assert_eq!(store.get_groq_api_key().await.unwrap().as_deref(), Some("gsk-123"));
        assert_eq!(store.get_gemini_api_key().await.unwrap().as_deref(), Some("AIza-456"));

        store.delete_setting(GROQ_API_KEY_SETTING).await.unwrap();
        assert_eq!(store.get_groq_api_key().await.unwrap(), None);
    }
}
