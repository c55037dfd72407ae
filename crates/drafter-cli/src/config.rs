//! Configuration file management for drafter.
//!
//! Provides a TOML-based config file at `~/.config/drafter/config.toml` and a
//! resolution chain: CLI flag > env var > config file > default.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use drafter_db::config::DbConfig;

/// Port the HTTP server listens on when nothing else is configured.
pub const DEFAULT_PORT: u16 = 8000;

/// Environment variable overriding the server port.
pub const PORT_ENV: &str = "DRAFTER_PORT";

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigFile {
    pub database: DatabaseSection,
    #[serde(default)]
    pub server: ServerSection,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseSection {
    pub url: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ServerSection {
    pub port: Option<u16>,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the drafter config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/drafter` or `~/.config/drafter`.
/// We intentionally ignore the platform-specific `dirs::config_dir()`
/// (which returns `~/Library/Application Support` on macOS).
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("drafter");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("drafter")
}

/// Return the path to the drafter config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. Returns an error if it does not exist.
pub fn load_config() -> Result<ConfigFile> {
    let path = config_path();
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents).context("failed to parse config file")?;
    Ok(config)
}

/// Serialize and write the config file, creating parent dirs as needed.
/// Sets file permissions to 0600 on Unix.
pub fn save_config(config: &ConfigFile) -> Result<()> {
    let path = config_path();
    let dir = config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config directory {}", dir.display()))?;

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(&path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    // Set permissions to 0600 (owner read/write only) on Unix.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct DrafterConfig {
    pub db_config: DbConfig,
    pub port: u16,
}

impl DrafterConfig {
    /// Resolve configuration using the chain: CLI flag > env var > config file > default.
    ///
    /// - DB URL: `cli_db_url` > `DRAFTER_DATABASE_URL` env > `config_file.database.url`
    ///   > `DbConfig::DEFAULT_URL`; a non-empty `DRAFTER_DATABASE_NAME` env var
    ///   then renames the database in whichever URL won.
    /// - Port: `cli_port` > `DRAFTER_PORT` env > `config_file.server.port` > 8000.
    pub fn resolve(cli_db_url: Option<&str>, cli_port: Option<u16>) -> Result<Self> {
        let file_config = load_config().ok();

        // DB URL resolution. `DbConfig::from_env` owns the environment
        // contract; this chain only decides which source wins.
        let db_config = if let Some(url) = cli_db_url {
            DbConfig::new(url).with_database_name_from_env()
        } else if std::env::var(DbConfig::URL_ENV).is_ok() {
            DbConfig::from_env()
        } else if let Some(ref cfg) = file_config {
            DbConfig::new(cfg.database.url.as_str()).with_database_name_from_env()
        } else {
            DbConfig::from_env()
        };

        // Port resolution.
        let port = if let Some(port) = cli_port {
            port
        } else if let Ok(raw) = std::env::var(PORT_ENV) {
            raw.parse()
                .with_context(|| format!("{PORT_ENV} is not a valid port: {raw:?}"))?
        } else if let Some(port) = file_config.as_ref().and_then(|cfg| cfg.server.port) {
            port
        } else {
            DEFAULT_PORT
        };

        Ok(Self { db_config, port })
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn lock_env() -> std::sync::MutexGuard<'static, ()> {
        crate::test_util::lock_env()
    }

    /// Point HOME and XDG_CONFIG_HOME at a temp dir so load_config() cannot
    /// find a real config file, returning the previous values for restore.
    fn isolate_home(tmp: &tempfile::TempDir) -> (Option<String>, Option<String>) {
        let orig_home = std::env::var("HOME").ok();
        let orig_xdg = std::env::var("XDG_CONFIG_HOME").ok();
        unsafe { std::env::set_var("HOME", tmp.path()) };
        unsafe { std::env::remove_var("XDG_CONFIG_HOME") };
        (orig_home, orig_xdg)
    }

    fn restore_home((orig_home, orig_xdg): (Option<String>, Option<String>)) {
        match orig_home {
            Some(h) => unsafe { std::env::set_var("HOME", h) },
            None => unsafe { std::env::remove_var("HOME") },
        }
        match orig_xdg {
            Some(x) => unsafe { std::env::set_var("XDG_CONFIG_HOME", x) },
            None => unsafe { std::env::remove_var("XDG_CONFIG_HOME") },
        }
    }

    #[test]
    fn config_file_roundtrip() {
        let original = ConfigFile {
            database: DatabaseSection {
                url: "postgresql://testhost:5432/testdb".to_string(),
            },
            server: ServerSection { port: Some(9000) },
        };

        let contents = toml::to_string_pretty(&original).unwrap();
        let loaded: ConfigFile = toml::from_str(&contents).unwrap();

        assert_eq!(loaded.database.url, original.database.url);
        assert_eq!(loaded.server.port, Some(9000));
    }

    #[test]
    fn server_section_is_optional() {
        let loaded: ConfigFile = toml::from_str(
            "[database]\nurl = \"postgresql://localhost:5432/drafter\"\n",
        )
        .unwrap();
        assert_eq!(loaded.server.port, None);
    }

    #[cfg(unix)]
    #[test]
    fn save_config_sets_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();
        let orig = isolate_home(&tmp);

        let cfg = ConfigFile {
            database: DatabaseSection {
                url: "postgresql://localhost:5432/drafter".to_string(),
            },
            server: ServerSection { port: None },
        };
        let result = save_config(&cfg);

        let mode = std::fs::metadata(config_path()).map(|m| m.permissions().mode() & 0o777);

        restore_home(orig);

        result.unwrap();
        assert_eq!(mode.unwrap(), 0o600);
    }

    #[test]
    fn resolve_with_cli_flag_overrides_all() {
        let _lock = lock_env();

        // Even if env var is set, CLI flag wins.
        unsafe { std::env::set_var(DbConfig::URL_ENV, "postgresql://env:5432/envdb") };
        unsafe { std::env::remove_var(DbConfig::NAME_ENV) };
        unsafe { std::env::remove_var(PORT_ENV) };

        let config = DrafterConfig::resolve(Some("postgresql://cli:5432/clidb"), None).unwrap();
        assert_eq!(config.db_config.database_url, "postgresql://cli:5432/clidb");

        unsafe { std::env::remove_var(DbConfig::URL_ENV) };
    }

    #[test]
    fn resolve_with_env_var_overrides_config_file() {
        let _lock = lock_env();

        unsafe { std::env::set_var(DbConfig::URL_ENV, "postgresql://env:5432/envdb") };
        unsafe { std::env::remove_var(DbConfig::NAME_ENV) };
        unsafe { std::env::remove_var(PORT_ENV) };

        let config = DrafterConfig::resolve(None, None).unwrap();
        assert_eq!(config.db_config.database_url, "postgresql://env:5432/envdb");

        unsafe { std::env::remove_var(DbConfig::URL_ENV) };
    }

    #[test]
    fn resolve_defaults_when_nothing_set() {
        let _lock = lock_env();

        unsafe { std::env::remove_var(DbConfig::URL_ENV) };
        unsafe { std::env::remove_var(DbConfig::NAME_ENV) };
        unsafe { std::env::remove_var(PORT_ENV) };
        let tmp = tempfile::TempDir::new().unwrap();
        let orig = isolate_home(&tmp);

        let result = DrafterConfig::resolve(None, None);

        restore_home(orig);

        let config = result.unwrap();
        assert_eq!(config.db_config.database_url, DbConfig::DEFAULT_URL);
        assert_eq!(config.port, DEFAULT_PORT);
    }

    #[test]
    fn resolve_applies_database_name_override() {
        let _lock = lock_env();

        unsafe { std::env::set_var(DbConfig::URL_ENV, "postgresql://env:5432/envdb") };
        unsafe { std::env::set_var(DbConfig::NAME_ENV, "renamed") };
        unsafe { std::env::remove_var(PORT_ENV) };

        let config = DrafterConfig::resolve(None, None).unwrap();
        assert_eq!(config.db_config.database_url, "postgresql://env:5432/renamed");

        unsafe { std::env::remove_var(DbConfig::URL_ENV) };
        unsafe { std::env::remove_var(DbConfig::NAME_ENV) };
    }

    #[test]
    fn resolve_applies_name_override_to_cli_url() {
        let _lock = lock_env();

        unsafe { std::env::remove_var(DbConfig::URL_ENV) };
        unsafe { std::env::set_var(DbConfig::NAME_ENV, "renamed") };
        unsafe { std::env::remove_var(PORT_ENV) };

        let config = DrafterConfig::resolve(Some("postgresql://cli:5432/clidb"), None).unwrap();

        unsafe { std::env::remove_var(DbConfig::NAME_ENV) };

        assert_eq!(config.db_config.database_url, "postgresql://cli:5432/renamed");
    }

    #[test]
    fn resolve_port_prefers_cli_over_env() {
        let _lock = lock_env();

        unsafe { std::env::set_var(PORT_ENV, "9100") };
        unsafe { std::env::remove_var(DbConfig::NAME_ENV) };

        let config = DrafterConfig::resolve(Some("postgresql://x:5432/db"), Some(9200)).unwrap();
        assert_eq!(config.port, 9200);

        let config = DrafterConfig::resolve(Some("postgresql://x:5432/db"), None).unwrap();
        assert_eq!(config.port, 9100);

        unsafe { std::env::remove_var(PORT_ENV) };
    }

    #[test]
    fn resolve_rejects_garbage_port_env() {
        let _lock = lock_env();

        unsafe { std::env::set_var(PORT_ENV, "not-a-port") };
        unsafe { std::env::remove_var(DbConfig::NAME_ENV) };

        let result = DrafterConfig::resolve(Some("postgresql://x:5432/db"), None);

        unsafe { std::env::remove_var(PORT_ENV) };

        let msg = result.unwrap_err().to_string();
        assert!(msg.contains("DRAFTER_PORT"), "unexpected error: {msg}");
    }

    #[test]
    fn resolve_reads_port_from_config_file() {
        let _lock = lock_env();

        unsafe { std::env::remove_var(DbConfig::URL_ENV) };
        unsafe { std::env::remove_var(DbConfig::NAME_ENV) };
        unsafe { std::env::remove_var(PORT_ENV) };
        let tmp = tempfile::TempDir::new().unwrap();
        let orig = isolate_home(&tmp);

        let cfg = ConfigFile {
            database: DatabaseSection {
                url: "postgresql://filehost:5432/filedb".to_string(),
            },
            server: ServerSection { port: Some(8123) },
        };
        let saved = save_config(&cfg);
        let result = DrafterConfig::resolve(None, None);

        restore_home(orig);

        saved.unwrap();
        let config = result.unwrap();
        assert_eq!(config.db_config.database_url, "postgresql://filehost:5432/filedb");
        assert_eq!(config.port, 8123);
    }

    #[test]
    fn config_path_ends_with_expected_filename() {
        let path = config_path();
        assert!(
            path.ends_with("drafter/config.toml"),
            "unexpected config path: {}",
            path.display()
        );
    }
}
