use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::bail;
use figment::{
    providers::{Env, Format, Json, Toml, Yaml},
    Figment,
};
use ocd_session::{ConnectionConfig, ServerConfig};
use serde::{Deserialize, Serialize};

use crate::util::logging::LevelFilter;

/// Prefix of the environment variables that override configuration values.
///
/// Nested keys are separated by a double underscore, e.g. `OCD_HARNESS_CONNECTION__PORT=4445`.
pub const ENV_PREFIX: &str = "OCD_HARNESS_";

/// A struct which holds all configs.
#[derive(Debug, Clone)]
pub struct Configs {
    figment: Figment,
}

/// The main struct holding all the possible config options.
#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub general: General,
    pub server: Server,
    pub connection: Connection,
}

/// The general config struct holding all the possible general options.
#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct General {
    pub log_level: Option<LevelFilter>,
}

/// How to launch OpenOCD.
#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Server {
    pub executable: String,
    pub interface_cfg: String,
    pub target_cfg: String,
    pub scripts_dir: Option<String>,
    pub extra_args: String,
    #[serde(rename = "startup_delay_ms", with = "duration_ms")]
    pub startup_delay: Duration,
}

/// Where to find the OpenOCD telnet port.
#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Connection {
    pub host: String,
    pub port: u16,
    #[serde(rename = "timeout_ms", with = "duration_ms")]
    pub timeout: Duration,
}

impl From<&Server> for ServerConfig {
    fn from(server: &Server) -> Self {
        Self {
            executable: server.executable.clone(),
            interface_cfg: server.interface_cfg.clone(),
            target_cfg: server.target_cfg.clone(),
            scripts_dir: server.scripts_dir.clone(),
            extra_args: server.extra_args.clone(),
            startup_delay: server.startup_delay,
        }
    }
}

impl From<&Connection> for ConnectionConfig {
    fn from(connection: &Connection) -> Self {
        Self {
            host: connection.host.clone(),
            port: connection.port,
            timeout: connection.timeout,
        }
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u128(duration.as_millis())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

impl Configs {
    pub fn new(conf_dir: &Path) -> Configs {
        // Start off by merging in the default configuration file.
        let mut figment = Figment::new().merge(Toml::string(include_str!("default.toml")));

        // Project settings first, then personal overrides which are not meant to be checked in.
        let config_files = ["OcdHarness", "OcdHarness.local"];

        for file in &config_files {
            figment = figment
                .merge(Toml::file(conf_dir.join(format!("{file}.toml"))))
                .merge(Json::file(conf_dir.join(format!("{file}.json"))))
                .merge(Yaml::file(conf_dir.join(format!("{file}.yaml"))))
                .merge(Yaml::file(conf_dir.join(format!("{file}.yml"))));
        }

        Configs { figment }
    }

    /// Merges a configuration file given on the command line on top of the discovered ones.
    pub fn merge(&mut self, conf_file: PathBuf) -> anyhow::Result<()> {
        if !conf_file.exists() {
            bail!("Configuration file {} does not exist", conf_file.display());
        }

        let original = self.figment.clone();
        self.figment = match conf_file.extension().and_then(|e| e.to_str()) {
            Some("toml") => original.merge(Toml::file(conf_file)),
            Some("json") => original.merge(Json::file(conf_file)),
            Some("yml" | "yaml") => original.merge(Yaml::file(conf_file)),
            _ => {
                bail!(
                    "File format not recognized from extension (supported: .toml, .json, .yaml / .yml)"
                )
            }
        };
        Ok(())
    }

    /// Extracts the final configuration. Environment variables take precedence over all files.
    pub fn extract(self) -> anyhow::Result<Config> {
        let figment = self
            .figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        match figment.extract::<Config>() {
            Ok(config) => Ok(config),
            Err(figerr) => {
                // Join all the figment errors into a multiline string.
                bail!(
                    "Failed to parse supplied configuration:\n{}",
                    figerr
                        .into_iter()
                        .map(|e| e.to_string())
                        .collect::<Vec<String>>()
                        .join("\n")
                );
            }
        }
    }
}
