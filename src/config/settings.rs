use crate::core::blockchain::GENESIS_SEED_PHRASE;
use crate::core::monetary::{Amount, DEFAULT_FEE_RATE};
use crate::error::{LedgerError, Result};
use log::{info, warn};
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard};
use std::time::Duration;

pub static GLOBAL_CONFIG: Lazy<Config> = Lazy::new(Config::new);

static DEFAULT_CONFIG_FILE: &str = "hunt.toml";
static DEFAULT_DATA_FILE: &str = "hunt-chain.json";
static DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:5000";
const DEFAULT_PEER_TIMEOUT_MS: u64 = 5000;

const CONFIG_FILE_KEY: &str = "HUNT_CONFIG";
const DATA_FILE_KEY: &str = "HUNT_DATA_FILE";
const FEE_RATE_KEY: &str = "HUNT_FEE_RATE";
const LISTEN_ADDR_KEY: &str = "HUNT_LISTEN_ADDR";
const PEERS_KEY: &str = "HUNT_PEERS";
const PEER_TIMEOUT_KEY: &str = "HUNT_PEER_TIMEOUT_MS";

/// Node settings as they appear in the TOML file
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Where the chain snapshot lives
    pub data_file: PathBuf,
    /// Flat fee per transaction, in units
    pub fee_rate: Amount,
    /// Phrase the genesis puzzle is derived from
    pub genesis_seed_phrase: String,
    /// Address the `/chain` endpoint binds to
    pub listen_addr: String,
    /// Peers registered at startup
    pub peers: Vec<String>,
    /// Connect and read timeout for peer requests
    pub peer_timeout_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            fee_rate: DEFAULT_FEE_RATE,
            genesis_seed_phrase: GENESIS_SEED_PHRASE.to_string(),
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            peers: Vec::new(),
            peer_timeout_ms: DEFAULT_PEER_TIMEOUT_MS,
        }
    }
}

pub struct Config {
    inner: RwLock<Settings>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            inner: RwLock::new(Settings::default()),
        }
    }
}

impl Config {
    /// Defaults, then the config file, then `HUNT_*` environment variables.
    ///
    /// A broken config file is reported and skipped rather than stopping the node.
    pub fn new() -> Config {
        let explicit = env::var(CONFIG_FILE_KEY).ok();
        let path = PathBuf::from(explicit.as_deref().unwrap_or(DEFAULT_CONFIG_FILE));

        let file = if path.exists() || explicit.is_some() {
            Some(path.as_path())
        } else {
            None
        };
        match Self::from_sources(file, |key| env::var(key).ok()) {
            Ok(config) => config,
            Err(e) => {
                warn!("Ignoring configuration: {e}");
                Config::default()
            }
        }
    }

    pub fn from_sources<F>(file: Option<&Path>, lookup: F) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = match file {
            Some(path) => {
                let text = fs::read_to_string(path).map_err(|e| {
                    LedgerError::Config(format!("Cannot read {}: {e}", path.display()))
                })?;
                info!("Loaded configuration from {}", path.display());
                toml::from_str::<Settings>(&text)?
            }
            None => Settings::default(),
        };

        if let Some(data_file) = lookup(DATA_FILE_KEY) {
            settings.data_file = PathBuf::from(data_file);
        }
        if let Some(fee_rate) = lookup(FEE_RATE_KEY) {
            settings.fee_rate = fee_rate.trim().parse().map_err(|_| {
                LedgerError::Config(format!("{FEE_RATE_KEY} must be a whole number of units"))
            })?;
        }
        if let Some(listen_addr) = lookup(LISTEN_ADDR_KEY) {
            settings.listen_addr = listen_addr;
        }
        if let Some(peers) = lookup(PEERS_KEY) {
            settings.peers = peers
                .split(',')
                .map(str::trim)
                .filter(|peer| !peer.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(timeout) = lookup(PEER_TIMEOUT_KEY) {
            settings.peer_timeout_ms = timeout.trim().parse().map_err(|_| {
                LedgerError::Config(format!("{PEER_TIMEOUT_KEY} must be milliseconds"))
            })?;
        }

        Ok(Config {
            inner: RwLock::new(settings),
        })
    }

    fn read(&self) -> RwLockReadGuard<'_, Settings> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get_data_file(&self) -> PathBuf {
        self.read().data_file.clone()
    }

    pub fn set_data_file(&self, data_file: PathBuf) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .data_file = data_file;
    }

    pub fn get_fee_rate(&self) -> Amount {
        self.read().fee_rate
    }

    pub fn get_genesis_seed_phrase(&self) -> String {
        self.read().genesis_seed_phrase.clone()
    }

    pub fn get_listen_addr(&self) -> String {
        self.read().listen_addr.clone()
    }

    pub fn get_peers(&self) -> Vec<String> {
        self.read().peers.clone()
    }

    pub fn get_peer_timeout(&self) -> Duration {
        Duration::from_millis(self.read().peer_timeout_ms)
    }
}
