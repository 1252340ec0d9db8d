use std::env;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use alloy::{primitives::Address, signers::local::PrivateKeySigner};
use dotenvy::dotenv;
use iroh::SecretKey;
use jax_deals::DealParams;
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use url::Url;

pub const DEFAULT_HOME_ENV: &str = "HOME";
pub const DEFAULT_XDG_CONFIG_DIR: &str = ".config";
pub const DEFAULT_XDG_CONFIG_DIR_NAME: &str = "jax";
pub const DEFAULT_CONFIG_NAME: &str = "jax.conf";
pub const CONFIG_PATH_ENV: &str = "JAX_CONFIG_PATH";

pub const DEFAULT_HTTP_PORT: u16 = 8080;
pub const DEFAULT_IROH_PORT: u16 = 3001;
pub const DEFAULT_EXCHANGE_TIMEOUT_SECS: u64 = 30;

fn default_exchange_timeout_secs() -> u64 {
    DEFAULT_EXCHANGE_TIMEOUT_SECS
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnDiskConfig {
    pub remote_listen_addr: SocketAddr,
    pub endpoint_listen_addr: SocketAddr,
    // paths below are relative to the config dir
    pub blobs_path: PathBuf,
    pub deals_db_path: PathBuf,
    pub iroh_key_file_path: PathBuf,
    pub eth_key_file_path: PathBuf,
    pub eth_ws_rpc_url: Url,
    // NOTE: no sensible defaults for deployed contracts
    pub market_contract_address: Option<Address>,
    pub payment_broker_address: Option<Address>,
    /// Wallet that funds deals
    pub default_wallet_address: Option<Address>,
    #[serde(default = "default_exchange_timeout_secs")]
    pub exchange_timeout_secs: u64,
    #[serde(default)]
    pub deal_params: DealParams,
}

impl Default for OnDiskConfig {
    fn default() -> Self {
        Self {
            remote_listen_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_HTTP_PORT)),
            endpoint_listen_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_IROH_PORT)),
            blobs_path: PathBuf::from("blobs"),
            deals_db_path: PathBuf::from("deals.redb"),
            iroh_key_file_path: PathBuf::from("iroh_key.bin"),
            eth_key_file_path: PathBuf::from("eth_key.bin"),
            eth_ws_rpc_url: Url::parse("ws://127.0.0.1:8545").expect("valid default rpc url"),
            market_contract_address: None,
            payment_broker_address: None,
            default_wallet_address: None,
            exchange_timeout_secs: DEFAULT_EXCHANGE_TIMEOUT_SECS,
            deal_params: DealParams::default(),
        }
    }
}

/// Arguments to [`OnDiskConfig::init`]
#[derive(Debug, Clone, Default)]
pub struct InitOptions {
    pub overwrite: bool,
    pub market_contract_address: Address,
    pub payment_broker_address: Address,
    pub eth_signer: Option<String>,
    pub eth_ws_rpc_url: Option<Url>,
    pub http_port: Option<u16>,
    pub iroh_port: Option<u16>,
}

impl OnDiskConfig {
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::find_config_dir()?.join(DEFAULT_CONFIG_NAME))
    }

    pub fn find_config_dir() -> Result<PathBuf, ConfigError> {
        match env::var(CONFIG_PATH_ENV) {
            Ok(path) => Ok(PathBuf::from(path)),
            Err(_) => {
                let home_dir = PathBuf::from(env::var(DEFAULT_HOME_ENV)?);
                Ok(home_dir
                    .join(DEFAULT_XDG_CONFIG_DIR)
                    .join(DEFAULT_XDG_CONFIG_DIR_NAME))
            }
        }
    }

    pub fn init(options: InitOptions) -> Result<Self, ConfigError> {
        Self::init_at(&Self::find_config_dir()?, options)
    }

    /// Write a fresh config, key files and data directories under `dir`
    pub fn init_at(dir: &Path, options: InitOptions) -> Result<Self, ConfigError> {
        if dir.exists() {
            if options.overwrite {
                std::fs::remove_dir_all(dir).map_err(|e| ConfigError::Io(e, dir.to_path_buf()))?;
            } else {
                return Err(ConfigError::ConfigAlreadyExists);
            }
        }
        std::fs::create_dir_all(dir).map_err(|e| ConfigError::Io(e, dir.to_path_buf()))?;

        let mut on_disk_config = OnDiskConfig::default();
        if let Some(port) = options.http_port {
            on_disk_config.remote_listen_addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
        }
        if let Some(port) = options.iroh_port {
            on_disk_config.endpoint_listen_addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
        }
        if let Some(url) = options.eth_ws_rpc_url {
            on_disk_config.eth_ws_rpc_url = url;
        }
        on_disk_config.market_contract_address = Some(options.market_contract_address);
        on_disk_config.payment_broker_address = Some(options.payment_broker_address);

        let eth_signer = match options.eth_signer {
            Some(signer) => PrivateKeySigner::from_str(&signer)
                .map_err(|e| ConfigError::InvalidSigner(e.to_string()))?,
            None => PrivateKeySigner::random(),
        };
        // the node's own key funds its deals
        on_disk_config.default_wallet_address = Some(eth_signer.address());

        let mut rng = OsRng;
        let iroh_secret_key = SecretKey::generate(&mut rng);

        let blobs_path = dir.join(&on_disk_config.blobs_path);
        std::fs::create_dir_all(&blobs_path).map_err(|e| ConfigError::Io(e, blobs_path))?;

        let iroh_key_path = dir.join(&on_disk_config.iroh_key_file_path);
        std::fs::write(&iroh_key_path, iroh_secret_key.to_bytes())
            .map_err(|e| ConfigError::Io(e, iroh_key_path))?;

        let eth_key_path = dir.join(&on_disk_config.eth_key_file_path);
        std::fs::write(&eth_key_path, eth_signer.to_bytes())
            .map_err(|e| ConfigError::Io(e, eth_key_path))?;

        let config_path = dir.join(DEFAULT_CONFIG_NAME);
        let config_json = serde_json::to_string_pretty(&on_disk_config)?;
        std::fs::write(&config_path, config_json).map_err(|e| ConfigError::Io(e, config_path))?;

        Ok(on_disk_config)
    }

    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::find_config_dir()?)
    }

    pub fn load_from(dir: &Path) -> Result<Self, ConfigError> {
        if !dir.exists() {
            return Err(ConfigError::MissingConfig);
        }

        let config_path = dir.join(DEFAULT_CONFIG_NAME);
        let config_str =
            std::fs::read_to_string(&config_path).map_err(|e| ConfigError::Io(e, config_path))?;
        let config: OnDiskConfig = serde_json::from_str(&config_str)?;

        Ok(config)
    }
}

#[derive(Debug)]
pub struct Config {
    remote_listen_addr: SocketAddr,
    endpoint_listen_addr: SocketAddr,
    iroh_key_file_path: PathBuf,
    blobs_path: PathBuf,
    deals_db_path: PathBuf,
    eth_key_file_path: PathBuf,
    eth_ws_rpc_url: Url,
    market_contract_address: Address,
    payment_broker_address: Address,
    default_wallet_address: Option<Address>,
    exchange_timeout: Duration,
    deal_params: DealParams,

    // Logging Level
    log_level: tracing::Level,
}

impl Config {
    pub fn from_env_or_disk() -> Result<Config, ConfigError> {
        if dotenv().is_err() {
            tracing::warn!("No .env file found");
        }

        let dir = OnDiskConfig::find_config_dir()?;
        let on_disk_config = OnDiskConfig::load_from(&dir)?;
        Self::from_on_disk(&dir, on_disk_config)
    }

    /// Resolve `on_disk_config` against `dir` and the process environment
    pub fn from_on_disk(dir: &Path, on_disk_config: OnDiskConfig) -> Result<Config, ConfigError> {
        let remote_listen_addr = match env::var("REMOTE_LISTEN_ADDR") {
            Ok(addr) => addr.parse()?,
            Err(_e) => on_disk_config.remote_listen_addr,
        };

        let endpoint_listen_addr = match env::var("ENDPOINT_LISTEN_ADDR") {
            Ok(addr) => addr.parse()?,
            Err(_e) => on_disk_config.endpoint_listen_addr,
        };

        let log_level_str = match env::var("LOG_LEVEL") {
            Ok(level) => level,
            Err(_e) => "info".to_string(),
        };
        let log_level = match tracing::Level::from_str(&log_level_str) {
            Ok(level) => level,
            Err(_e) => {
                tracing::warn!("Invalid LOG_LEVEL found in .env. Using default");
                tracing::Level::INFO
            }
        };

        Ok(Config {
            remote_listen_addr,
            endpoint_listen_addr,
            iroh_key_file_path: dir.join(&on_disk_config.iroh_key_file_path),
            eth_key_file_path: dir.join(&on_disk_config.eth_key_file_path),
            blobs_path: dir.join(&on_disk_config.blobs_path),
            deals_db_path: dir.join(&on_disk_config.deals_db_path),
            eth_ws_rpc_url: on_disk_config.eth_ws_rpc_url,
            market_contract_address: on_disk_config
                .market_contract_address
                .ok_or(ConfigError::MissingContractAddress("storage market"))?,
            payment_broker_address: on_disk_config
                .payment_broker_address
                .ok_or(ConfigError::MissingContractAddress("payment broker"))?,
            default_wallet_address: on_disk_config.default_wallet_address,
            exchange_timeout: Duration::from_secs(on_disk_config.exchange_timeout_secs),
            deal_params: on_disk_config.deal_params,
            log_level,
        })
    }

    pub fn log_level(&self) -> &tracing::Level {
        &self.log_level
    }

    pub fn remote_listen_addr(&self) -> &SocketAddr {
        &self.remote_listen_addr
    }

    pub fn remote_url(&self) -> Result<Url, ConfigError> {
        // NOTE (amiller68): for now this is local only http api
        let host = self.remote_listen_addr.ip().to_string();
        let port = self.remote_listen_addr.port();

        Ok(Url::parse(&format!("http://{}:{}", host, port))?)
    }

    pub fn endpoint_listen_addr(&self) -> &SocketAddr {
        &self.endpoint_listen_addr
    }

    pub fn iroh_secret_key(&self) -> Result<SecretKey, ConfigError> {
        let array = read_key_file(&self.iroh_key_file_path)?;
        Ok(SecretKey::from_bytes(&array))
    }

    pub fn blobs_path(&self) -> &PathBuf {
        &self.blobs_path
    }

    pub fn deals_db_path(&self) -> &PathBuf {
        &self.deals_db_path
    }

    pub fn eth_signer(&self) -> Result<PrivateKeySigner, ConfigError> {
        let array = read_key_file(&self.eth_key_file_path)?;
        PrivateKeySigner::from_bytes(&array.into())
            .map_err(|e| ConfigError::InvalidSigner(e.to_string()))
    }

    pub fn eth_ws_rpc_url(&self) -> &Url {
        &self.eth_ws_rpc_url
    }

    pub fn market_contract_address(&self) -> &Address {
        &self.market_contract_address
    }

    pub fn payment_broker_address(&self) -> &Address {
        &self.payment_broker_address
    }

    pub fn default_wallet_address(&self) -> Option<Address> {
        self.default_wallet_address
    }

    pub fn exchange_timeout(&self) -> Duration {
        self.exchange_timeout
    }

    pub fn deal_params(&self) -> &DealParams {
        &self.deal_params
    }
}

fn read_key_file(path: &Path) -> Result<[u8; 32], ConfigError> {
    let key_bytes = std::fs::read(path).map_err(|e| ConfigError::Io(e, path.to_path_buf()))?;
    key_bytes
        .as_slice()
        .try_into()
        .map_err(|_| ConfigError::InvalidKeyBytes)
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Default(#[from] anyhow::Error),
    #[error("io: {0:?} path: {1:?}")]
    Io(std::io::Error, PathBuf),
    #[error("invalid config: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Missing Env: {0}")]
    Env(#[from] env::VarError),
    #[error("Invalid Socket Address: {0}")]
    ListenAddr(#[from] std::net::AddrParseError),
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
    #[error("missing config")]
    MissingConfig,
    #[error("missing {0} contract address")]
    MissingContractAddress(&'static str),
    #[error("invalid key bytes")]
    InvalidKeyBytes,
    #[error("invalid eth signer: {0}")]
    InvalidSigner(String),
    #[error("config already exists")]
    ConfigAlreadyExists,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> InitOptions {
        InitOptions {
            market_contract_address: Address::repeat_byte(0x01),
            payment_broker_address: Address::repeat_byte(0x02),
            ..Default::default()
        }
    }

    #[test]
    fn defaults_carry_deal_constants() {
        let config = OnDiskConfig::default();
        assert_eq!(config.deal_params.voucher_interval, 1000);
        assert_eq!(config.deal_params.channel_expiry_buffer, 2000);
        assert_eq!(config.deal_params.create_channel_gas_limit, 300);
        assert!(config.deal_params.create_channel_gas_price.is_zero());
        assert_eq!(config.exchange_timeout_secs, DEFAULT_EXCHANGE_TIMEOUT_SECS);
        assert!(config.default_wallet_address.is_none());
    }

    #[test]
    fn missing_optional_fields_take_defaults() {
        let mut value = serde_json::to_value(OnDiskConfig::default()).unwrap();
        let object = value.as_object_mut().unwrap();
        object.remove("deal_params");
        object.remove("exchange_timeout_secs");

        let config: OnDiskConfig = serde_json::from_value(value).unwrap();
        assert_eq!(config.deal_params, DealParams::default());
        assert_eq!(config.exchange_timeout_secs, DEFAULT_EXCHANGE_TIMEOUT_SECS);
    }

    #[test]
    fn init_writes_loadable_config() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("jax");

        let written = OnDiskConfig::init_at(
            &root,
            InitOptions {
                http_port: Some(9090),
                ..options()
            },
        )
        .unwrap();
        let loaded = OnDiskConfig::load_from(&root).unwrap();
        assert_eq!(written, loaded);
        assert_eq!(loaded.remote_listen_addr.port(), 9090);
        assert!(root.join("blobs").is_dir());

        let config = Config::from_on_disk(&root, loaded).unwrap();
        let signer = config.eth_signer().unwrap();
        assert_eq!(config.default_wallet_address(), Some(signer.address()));
        assert!(config.iroh_secret_key().is_ok());
        assert_eq!(config.deals_db_path(), &root.join("deals.redb"));
    }

    #[test]
    fn init_refuses_to_clobber() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("jax");

        OnDiskConfig::init_at(&root, options()).unwrap();
        let err = OnDiskConfig::init_at(&root, options()).unwrap_err();
        assert!(matches!(err, ConfigError::ConfigAlreadyExists));

        OnDiskConfig::init_at(
            &root,
            InitOptions {
                overwrite: true,
                ..options()
            },
        )
        .unwrap();
    }

    #[test]
    fn contract_addresses_are_required() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::from_on_disk(dir.path(), OnDiskConfig::default()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingContractAddress(_)));
    }
}
