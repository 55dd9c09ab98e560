// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! This module implements the 3-tier configuration loading system:
//! 1. TOML file (base defaults)
//! 2. Environment variables (runtime overrides)
//! 3. CLI arguments (explicit user overrides)

use crate::{ConfigError, ConfigResult, NmsConfig};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "nms_configuration.toml";

/// Find the NMS configuration file
///
/// Search order:
/// 1. `NMS_CONFIG_PATH` environment variable
/// 2. Current working directory: `./nms_configuration.toml`
/// 3. Parent directories, up to 5 levels
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var("NMS_CONFIG_PATH") {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::FileNotFound(format!(
            "Config file specified by NMS_CONFIG_PATH not found: {}",
            path.display()
        )));
    }

    let mut search_paths = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));
        let mut current = cwd.as_path();
        for _ in 0..5 {
            match current.parent() {
                Some(parent) => {
                    search_paths.push(parent.join(CONFIG_FILE_NAME));
                    current = parent;
                }
                None => break,
            }
        }
    }

    if let Some(found) = search_paths.iter().find(|path| path.exists()) {
        return Ok(found.clone());
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "NMS configuration file '{CONFIG_FILE_NAME}' not found in any of these locations:\n{search_list}\n\nSet NMS_CONFIG_PATH environment variable to specify custom location."
    )))
}

/// Load configuration from TOML file
///
/// * `config_path` - Optional path to config file. If `None`, will search for config file.
/// * `cli_args` - Optional CLI argument overrides
///
/// The result is not validated; call [`crate::validate_config`] before use.
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<NmsConfig> {
    let config_file = match config_path {
        Some(path) => path.to_path_buf(),
        None => find_config_file()?,
    };

    let content = fs::read_to_string(&config_file)?;
    let mut config: NmsConfig = toml::from_str(&content)?;

    apply_environment_overrides(&mut config);
    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli);
    }

    Ok(config)
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `NMS_CONTROLLER_PORT` -> `proxy.controller_port`
/// - `NMS_AGGREGATOR_PORT` -> `proxy.aggregator_port`
/// - `NMS_POLL_INTERVAL_MS` -> `proxy.poll_interval_ms`
/// - `NMS_LOG_LEVEL` -> `system.log_level`
///
/// Values that do not parse are ignored.
pub fn apply_environment_overrides(config: &mut NmsConfig) {
    if let Some(port) = parsed_env::<u16>("NMS_CONTROLLER_PORT") {
        config.proxy.controller_port = port;
    }
    if let Some(port) = parsed_env::<u16>("NMS_AGGREGATOR_PORT") {
        config.proxy.aggregator_port = port;
    }
    if let Some(interval) = parsed_env::<u64>("NMS_POLL_INTERVAL_MS") {
        config.proxy.poll_interval_ms = interval;
    }
    if let Ok(value) = env::var("NMS_LOG_LEVEL") {
        config.system.log_level = value;
    }
}

fn parsed_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok()?.parse().ok()
}

/// Apply CLI argument overrides to configuration
///
/// Keys: `controller_port`, `aggregator_port`, `poll_interval_ms`,
/// `log_level`, `log_format`.
pub fn apply_cli_overrides(config: &mut NmsConfig, cli_args: &HashMap<String, String>) {
    if let Some(port) = cli_args.get("controller_port").and_then(|v| v.parse().ok()) {
        config.proxy.controller_port = port;
    }
    if let Some(port) = cli_args.get("aggregator_port").and_then(|v| v.parse().ok()) {
        config.proxy.aggregator_port = port;
    }
    if let Some(interval) = cli_args.get("poll_interval_ms").and_then(|v| v.parse().ok()) {
        config.proxy.poll_interval_ms = interval;
    }
    if let Some(value) = cli_args.get("log_level") {
        config.system.log_level = value.clone();
    }
    if let Some(value) = cli_args.get("log_format") {
        config.system.log_format = value.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::tempdir;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_find_config_file_env_var() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("custom_config.toml");
        File::create(&config_path).unwrap();

        env::set_var("NMS_CONFIG_PATH", config_path.to_str().unwrap());
        let result = find_config_file();
        env::remove_var("NMS_CONFIG_PATH");

        assert_eq!(result.unwrap(), config_path);
    }

    #[test]
    fn test_find_config_file_env_var_missing_file() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        env::set_var("NMS_CONFIG_PATH", "/definitely/not/here.toml");
        let result = find_config_file();
        env::remove_var("NMS_CONFIG_PATH");

        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_config_with_topologies() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[proxy]").unwrap();
        writeln!(file, "poll_interval_ms = 2500").unwrap();
        writeln!(file, "[[topologies]]").unwrap();
        writeln!(file, "name = \"tower-a\"").unwrap();
        writeln!(file, "controller_ip = \"2001:db8::1\"").unwrap();
        writeln!(file, "aggregator_ip = \"2001:db8::2\"").unwrap();

        let config = load_config(Some(&config_path), None).unwrap();

        assert_eq!(config.proxy.poll_interval_ms, 2500);
        assert_eq!(config.topologies.len(), 1);
        assert_eq!(config.topologies[0].aggregator_ip, "2001:db8::2");
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&config_path, "[proxy\ncontroller_port = ").unwrap();

        assert!(matches!(
            load_config(Some(&config_path), None),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_environment_overrides() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let mut config = NmsConfig::default();

        env::set_var("NMS_CONTROLLER_PORT", "27077");
        env::set_var("NMS_AGGREGATOR_PORT", "not-a-port");
        env::set_var("NMS_LOG_LEVEL", "debug");

        apply_environment_overrides(&mut config);

        env::remove_var("NMS_CONTROLLER_PORT");
        env::remove_var("NMS_AGGREGATOR_PORT");
        env::remove_var("NMS_LOG_LEVEL");

        assert_eq!(config.proxy.controller_port, 27077);
        assert_eq!(config.proxy.aggregator_port, 18100);
        assert_eq!(config.system.log_level, "debug");
    }

    #[test]
    fn test_override_precedence() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(
            &config_path,
            "[proxy]\ncontroller_port = 10000\npoll_interval_ms = 1000\n",
        )
        .unwrap();

        env::set_var("NMS_CONTROLLER_PORT", "20000");
        env::set_var("NMS_POLL_INTERVAL_MS", "3000");

        let mut cli_args = HashMap::new();
        cli_args.insert("controller_port".to_string(), "30000".to_string());

        let config = load_config(Some(&config_path), Some(&cli_args)).unwrap();

        env::remove_var("NMS_CONTROLLER_PORT");
        env::remove_var("NMS_POLL_INTERVAL_MS");

        // CLI wins for the port, env wins for the interval (no CLI override)
        assert_eq!(config.proxy.controller_port, 30000);
        assert_eq!(config.proxy.poll_interval_ms, 3000);
    }
}
