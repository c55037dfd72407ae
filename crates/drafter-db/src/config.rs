//! Database connection settings.

use std::env;

/// Connection settings for the document store.
///
/// The only required piece is a PostgreSQL URL whose final path segment is
/// the database name, e.g. `postgresql://localhost:5432/drafter`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    /// Full PostgreSQL connection URL.
    pub database_url: String,
}

impl DbConfig {
    /// URL used when nothing else is configured.
    pub const DEFAULT_URL: &str = "postgresql://localhost:5432/drafter";

    /// Environment variable holding the full connection URL.
    pub const URL_ENV: &str = "DRAFTER_DATABASE_URL";

    /// Environment variable that overrides just the database name, keeping
    /// the host and credentials from the URL.
    pub const NAME_ENV: &str = "DRAFTER_DATABASE_NAME";

    /// Build a config with an explicit URL.
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
        }
    }

    /// Read configuration from the environment.
    ///
    /// `DRAFTER_DATABASE_URL` wins over the built-in default; a non-empty
    /// `DRAFTER_DATABASE_NAME` then replaces the database name in whichever
    /// URL was chosen.
    pub fn from_env() -> Self {
        let url = env::var(Self::URL_ENV).unwrap_or_else(|_| Self::DEFAULT_URL.to_owned());
        Self::new(url).with_database_name_from_env()
    }

    /// The database name, i.e. everything after the last `/` in the URL.
    pub fn database_name(&self) -> &str {
        self.database_url.rsplit('/').next().unwrap_or_default()
    }

    /// A copy of this config pointing at `name` on the same server.
    pub fn with_database_name(&self, name: &str) -> Self {
        match self.database_url.rfind('/') {
            Some(idx) => Self::new(format!("{}/{name}", &self.database_url[..idx])),
            None => Self::new(format!("{}/{name}", self.database_url)),
        }
    }

    /// Apply the `DRAFTER_DATABASE_NAME` override to this config, if one is
    /// set. Empty values are ignored.
    ///
    /// Callers that pick a URL from somewhere other than the environment
    /// (a CLI flag, a config file) still honor the name override this way.
    pub fn with_database_name_from_env(self) -> Self {
        match env::var(Self::NAME_ENV) {
            Ok(name) if !name.is_empty() => self.with_database_name(&name),
            _ => self,
        }
    }

    /// URL for the `postgres` maintenance database on the same server.
    ///
    /// Connecting to the target database fails outright when it does not
    /// exist yet, so creation has to go through a database that always does.
    pub fn maintenance_url(&self) -> String {
        self.with_database_name("postgres").database_url
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::{Mutex, MutexGuard, OnceLock};

    use super::*;

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    /// Tests that touch `DRAFTER_DATABASE_*` share one process environment;
    /// serialize them.
    fn lock_env() -> MutexGuard<'static, ()> {
        ENV_LOCK
            .get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    #[test]
    fn default_url_names_the_drafter_database() {
        let config = DbConfig::new(DbConfig::DEFAULT_URL);
        assert_eq!(config.database_name(), "drafter");
    }

    #[test]
    fn database_name_is_the_last_path_segment() {
        let config = DbConfig::new("postgresql://user:pw@db.internal:5432/staging");
        assert_eq!(config.database_name(), "staging");
    }

    #[test]
    fn with_database_name_keeps_host_and_credentials() {
        let config = DbConfig::new("postgresql://user:pw@db.internal:5432/staging");
        let renamed = config.with_database_name("scratch");
        assert_eq!(
            renamed.database_url,
            "postgresql://user:pw@db.internal:5432/scratch"
        );
    }

    #[test]
    fn maintenance_url_targets_the_postgres_database() {
        let config = DbConfig::new("postgresql://localhost:5432/drafter");
        assert_eq!(
            config.maintenance_url(),
            "postgresql://localhost:5432/postgres"
        );
    }

    #[test]
    fn from_env_prefers_the_url_env_var() {
        let _lock = lock_env();

        unsafe { env::set_var(DbConfig::URL_ENV, "postgresql://env:5432/envdb") };
        unsafe { env::remove_var(DbConfig::NAME_ENV) };

        let config = DbConfig::from_env();

        unsafe { env::remove_var(DbConfig::URL_ENV) };

        assert_eq!(config.database_url, "postgresql://env:5432/envdb");
    }

    #[test]
    fn from_env_falls_back_to_the_default_url() {
        let _lock = lock_env();

        unsafe { env::remove_var(DbConfig::URL_ENV) };
        unsafe { env::remove_var(DbConfig::NAME_ENV) };

        let config = DbConfig::from_env();
        assert_eq!(config.database_url, DbConfig::DEFAULT_URL);
    }

    #[test]
    fn from_env_applies_the_name_override() {
        let _lock = lock_env();

        unsafe { env::set_var(DbConfig::URL_ENV, "postgresql://env:5432/envdb") };
        unsafe { env::set_var(DbConfig::NAME_ENV, "renamed") };

        let config = DbConfig::from_env();

        unsafe { env::remove_var(DbConfig::URL_ENV) };
        unsafe { env::remove_var(DbConfig::NAME_ENV) };

        assert_eq!(config.database_url, "postgresql://env:5432/renamed");
    }

    #[test]
    fn empty_name_override_is_ignored() {
        let _lock = lock_env();

        unsafe { env::remove_var(DbConfig::URL_ENV) };
        unsafe { env::set_var(DbConfig::NAME_ENV, "") };

        let config = DbConfig::from_env();

        unsafe { env::remove_var(DbConfig::NAME_ENV) };

        assert_eq!(config.database_name(), "drafter");
    }

    #[test]
    fn name_override_applies_to_explicit_urls() {
        let _lock = lock_env();

        unsafe { env::set_var(DbConfig::NAME_ENV, "scratch") };

        let config = DbConfig::new("postgresql://user:pw@db.internal:5432/staging")
            .with_database_name_from_env();

        unsafe { env::remove_var(DbConfig::NAME_ENV) };

        assert_eq!(
            config.database_url,
            "postgresql://user:pw@db.internal:5432/scratch"
        );
    }
}
