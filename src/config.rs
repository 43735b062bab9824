use std::env;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::path::{Path, PathBuf};

use crate::optimizer::{PackingConfig, PackingStrategy};

/// Complete application configuration, loaded from environment variables or default values.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub catalog: CatalogConfig,
    pub optimizer: OptimizerConfig,
}

impl AppConfig {
    /// Creates a configuration from the currently available environment variables.
    pub fn from_env() -> Self {
        Self {
            api: ApiConfig::from_env(),
            catalog: CatalogConfig::from_env(),
            optimizer: OptimizerConfig::from_env(),
        }
    }
}

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    bind_ip: IpAddr,
    display_host: String,
    port: u16,
}

impl ApiConfig {
    const DEFAULT_HOST: &'static str = "0.0.0.0";
    const DEFAULT_PORT: u16 = 8080;
    const HOST_VAR: &'static str = "IDOL_PLANNER_API_HOST";
    const PORT_VAR: &'static str = "IDOL_PLANNER_API_PORT";

    fn from_env() -> Self {
        let host_value =
            env_string(Self::HOST_VAR).unwrap_or_else(|| Self::DEFAULT_HOST.to_string());
        let (bind_ip, effective_host) = match host_value.parse::<IpAddr>() {
            Ok(ip) => (ip, host_value),
            Err(err) => {
                eprintln!(
                    "⚠️ Could not parse {} ('{}'): {}. Using {}.",
                    Self::HOST_VAR,
                    host_value,
                    err,
                    Self::DEFAULT_HOST
                );
                (
                    IpAddr::V4(Ipv4Addr::UNSPECIFIED),
                    Self::DEFAULT_HOST.to_string(),
                )
            }
        };

        let port = match env_string(Self::PORT_VAR) {
            Some(raw) => match raw.parse::<u16>() {
                Ok(value) if value != 0 => value,
                Ok(_) => {
                    eprintln!(
                        "⚠️ {} must not be 0. Using {}.",
                        Self::PORT_VAR,
                        Self::DEFAULT_PORT
                    );
                    Self::DEFAULT_PORT
                }
                Err(err) => {
                    eprintln!(
                        "⚠️ Could not parse {} ('{}'): {}. Using {}.",
                        Self::PORT_VAR,
                        raw,
                        err,
                        Self::DEFAULT_PORT
                    );
                    Self::DEFAULT_PORT
                }
            },
            None => Self::DEFAULT_PORT,
        };

        Self {
            bind_ip,
            display_host: effective_host,
            port,
        }
    }

    /// Socket address to bind the server to.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_ip, self.port)
    }

    /// Visible hostname for logging and hints.
    pub fn display_host(&self) -> &str {
        &self.display_host
    }

    /// Configured port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Indicates whether binding to all interfaces.
    pub fn binds_to_all_interfaces(&self) -> bool {
        match self.bind_ip {
            IpAddr::V4(addr) => addr == Ipv4Addr::UNSPECIFIED,
            IpAddr::V6(addr) => addr == Ipv6Addr::UNSPECIFIED,
        }
    }
}

/// Where the modifier database is read from.
#[derive(Clone, Debug, Default)]
pub struct CatalogConfig {
    path: Option<PathBuf>,
}

impl CatalogConfig {
    const PATH_VAR: &'static str = "IDOL_PLANNER_CATALOG_PATH";

    fn from_env() -> Self {
        Self {
            path: env_string(Self::PATH_VAR).map(PathBuf::from),
        }
    }

    /// Path of the JSON database; `None` means standard footprints and no modifiers.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

/// Configuration for the packing optimizer.
#[derive(Clone, Debug)]
pub struct OptimizerConfig {
    packing: PackingConfig,
}

impl OptimizerConfig {
    const RESTARTS_VAR: &'static str = "IDOL_PLANNER_RESTARTS";
    const SEED_VAR: &'static str = "IDOL_PLANNER_SEED";
    const STRATEGY_VAR: &'static str = "IDOL_PLANNER_STRATEGY";
    const BUDGET_VAR: &'static str = "IDOL_PLANNER_EXHAUSTIVE_BUDGET";
    const ITEM_LIMIT_VAR: &'static str = "IDOL_PLANNER_EXHAUSTIVE_ITEM_LIMIT";
    const PRESEED_VAR: &'static str = "IDOL_PLANNER_PRESEED";

    fn from_env() -> Self {
        let restarts = parse_usize_with_warning(
            Self::RESTARTS_VAR,
            env_string(Self::RESTARTS_VAR),
            PackingConfig::DEFAULT_RESTARTS,
            |value| value > 0,
            "must be greater than 0",
            "Warning: Fewer restarts may leave avoidable gaps on the board",
        );

        let exhaustive_budget = parse_usize_with_warning(
            Self::BUDGET_VAR,
            env_string(Self::BUDGET_VAR),
            PackingConfig::DEFAULT_EXHAUSTIVE_BUDGET,
            |value| value > 0,
            "must be greater than 0",
            "Warning: Adjusted search budget changes exhaustive packing run time",
        );

        let exhaustive_item_limit = parse_usize_with_warning(
            Self::ITEM_LIMIT_VAR,
            env_string(Self::ITEM_LIMIT_VAR),
            PackingConfig::DEFAULT_EXHAUSTIVE_ITEM_LIMIT,
            |value| value <= PackingConfig::MAX_EXHAUSTIVE_ITEMS,
            "must be at most 16",
            "Warning: Adjusted item limit changes when auto mode searches exhaustively",
        );

        let seed = env_string(Self::SEED_VAR).and_then(|raw| parse_seed(&raw, Self::SEED_VAR));

        let strategy = env_string(Self::STRATEGY_VAR)
            .and_then(|raw| parse_strategy(&raw, Self::STRATEGY_VAR))
            .unwrap_or(PackingConfig::DEFAULT_STRATEGY);

        let preseed = env_string(Self::PRESEED_VAR)
            .and_then(|raw| parse_bool(&raw, Self::PRESEED_VAR))
            .unwrap_or(PackingConfig::DEFAULT_PRESEED);

        let packing = PackingConfig::builder()
            .restarts(restarts)
            .seed(seed)
            .strategy(strategy)
            .preseed(preseed)
            .exhaustive_budget(exhaustive_budget)
            .exhaustive_item_limit(exhaustive_item_limit)
            .build();

        Self { packing }
    }

    /// Returns the configured PackingConfig.
    pub fn packing_config(&self) -> PackingConfig {
        self.packing
    }
}

fn env_string(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_owned())
            }
        }
        Err(env::VarError::NotPresent) => None,
        Err(err) => {
            eprintln!(
                "⚠️ Access to {} failed: {}. Using default value.",
                name, err
            );
            None
        }
    }
}

fn parse_bool(raw: &str, var_name: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        other => {
            eprintln!(
                "⚠️ Could not interpret {} ('{}') as boolean value. Using default value.",
                var_name, other
            );
            None
        }
    }
}

fn parse_strategy(raw: &str, var_name: &str) -> Option<PackingStrategy> {
    let parsed = PackingStrategy::parse(raw);
    if parsed.is_none() {
        eprintln!(
            "⚠️ Unknown packing strategy in {} ('{}'). Using {}.",
            var_name,
            raw,
            PackingConfig::DEFAULT_STRATEGY.code()
        );
    }
    parsed
}

fn parse_seed(raw: &str, var_name: &str) -> Option<u64> {
    match raw.trim().parse::<u64>() {
        Ok(seed) => Some(seed),
        Err(err) => {
            eprintln!(
                "⚠️ Could not parse {} ('{}') as seed: {}. Using a random seed.",
                var_name, raw, err
            );
            None
        }
    }
}

fn parse_usize_with_warning(
    var_name: &str,
    raw: Option<String>,
    default: usize,
    validator: impl Fn(usize) -> bool,
    invalid_hint: &str,
    warning: &str,
) -> usize {
    match raw {
        Some(raw) => match raw.parse::<usize>() {
            Ok(value) => {
                if !validator(value) {
                    eprintln!(
                        "⚠️ {} contains invalid value '{}': {}. Using {}.",
                        var_name, raw, invalid_hint, default
                    );
                    default
                } else {
                    if value != default {
                        println!("⚠️ {} ({} = {}).", warning, var_name, value);
                    }
                    value
                }
            }
            Err(err) => {
                eprintln!(
                    "⚠️ Could not parse {} ('{}') as number: {}. Using {}.",
                    var_name, raw, err, default
                );
                default
            }
        },
        None => default,
    }
}
