//! Runtime configuration, read from the environment the way the teacher's
//! `db()` reads `DB_URL`: a handful of env vars with sane defaults, no
//! config file format.

use std::path::PathBuf;

const DEFAULT_DATA_DIR: &str = ".focusd";

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory the three JSON tables are persisted under.
    pub data_dir: PathBuf,
    /// Seed for the Thompson-Sampling RNG. `None` means seed from the OS,
    /// which is what production use wants; tests and demos pin it.
    pub rng_seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            rng_seed: None,
        }
    }
}

impl Config {
    /// Reads `FOCUSD_DATA_DIR` and `FOCUSD_RNG_SEED`, falling back to
    /// defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let data_dir = std::env::var("FOCUSD_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR));

        let rng_seed = std::env::var("FOCUSD_RNG_SEED")
            .ok()
            .and_then(|s| s.parse::<u64>().ok());

        Self { data_dir, rng_seed }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_local_data_dir_and_os_rng() {
        let config = Config::default();
        assert_eq!(config.data_dir, PathBuf::from(DEFAULT_DATA_DIR));
        assert_eq!(config.rng_seed, None);
    }
}
