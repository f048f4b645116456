use crate::db::{self, Pool};
use crate::model::Locale;
use anyhow::{anyhow, Result};
use async_trait::async_trait;

/// Collaborator contract for resolving the locale of the current request.
/// Resolved once per grid render; immutable afterwards.
#[async_trait]
pub trait LocaleService: Send + Sync {
    async fn current_locale(&self) -> Result<Locale>;
}

/// Resolves the configured active locale name against the `locales` table.
#[derive(Debug, Clone)]
pub struct ConfiguredLocale {
    pool: Pool,
    locale_name: String,
}

impl ConfiguredLocale {
    pub fn new(pool: Pool, locale_name: impl Into<String>) -> Self {
        Self {
            pool,
            locale_name: locale_name.into(),
        }
    }
}

#[async_trait]
impl LocaleService for ConfiguredLocale {
    async fn current_locale(&self) -> Result<Locale> {
        db::locale_by_name(&self.pool, &self.locale_name)
            .await?
            .ok_or_else(|| anyhow!("locale {:?} is not present in the store", self.locale_name))
    }
}
