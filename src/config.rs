use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    File { dir: PathBuf },
    Postgres { url: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub store: StoreConfig,
    pub load_delay: Duration,
}

impl Config {
    /// Reads `DATABASE_URL` from the environment; everything else comes from flags.
    pub fn from_env(data_dir: PathBuf, load_delay_ms: u64) -> Self {
        Self::resolve(data_dir, std::env::var("DATABASE_URL").ok(), load_delay_ms)
    }

    pub fn resolve(data_dir: PathBuf, database_url: Option<String>, load_delay_ms: u64) -> Self {
        let store = match database_url.filter(|url| !url.trim().is_empty()) {
            Some(url) => StoreConfig::Postgres { url },
            None => StoreConfig::File { dir: data_dir },
        };
        Self {
            store,
            load_delay: Duration::from_millis(load_delay_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_store_without_database_url() {
        let config = Config::resolve(PathBuf::from("roster-data"), None, 800);
        assert_eq!(
            config.store,
            StoreConfig::File {
                dir: PathBuf::from("roster-data")
            }
        );
        assert_eq!(config.load_delay, Duration::from_millis(800));
    }

    #[test]
    fn database_url_selects_postgres() {
        let url = "postgres://localhost/gradebook".to_string();
        let config = Config::resolve(PathBuf::from("roster-data"), Some(url.clone()), 0);
        assert_eq!(config.store, StoreConfig::Postgres { url });

        let blank = Config::resolve(PathBuf::from("roster-data"), Some("  ".to_string()), 0);
        assert!(matches!(blank.store, StoreConfig::File { .. }));
    }
}
