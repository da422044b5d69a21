//! config-rs/lib.rs
//! Shared configuration utilities for the prompt optimization workspace
//! Provides `.env` loading and typed environment lookups with fallbacks

use std::env;
use std::str::FromStr;

/// Load variables from a `.env` file in the working directory (or a parent).
///
/// A missing file is not an error; variables already present in the process
/// environment are never overwritten.
pub fn load_env() {
    match dotenv::dotenv() {
        Ok(path) => log::debug!("Loaded environment from {}", path.display()),
        Err(err) if err.not_found() => log::debug!("No .env file found, using process environment"),
        Err(err) => log::warn!("Failed to load .env file: {}", err),
    }
}

/// Get an optional string value from the environment
///
/// # Arguments
/// * `name` - The variable name (e.g., "LLM_MODEL")
///
/// # Returns
/// The trimmed value, or `None` when the variable is unset or blank
pub fn env_opt(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Get a typed value from the environment with proper fallback
///
/// # Arguments
/// * `name` - The variable name (e.g., "OPTIMIZER_MAX_ITERATIONS")
/// * `default` - The value to use if the variable is unset or unparsable
///
/// # Returns
/// The parsed value or the default
pub fn env_or<T: FromStr>(name: &str, default: T) -> T {
    match env_opt(name) {
        Some(raw) => raw.parse::<T>().unwrap_or_else(|_| {
            log::warn!("Invalid value {:?} in {}, using default", raw, name);
            default
        }),
        None => default,
    }
}

/// Get an optional typed value from the environment
///
/// Unparsable values are logged and treated as unset.
pub fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    let raw = env_opt(name)?;
    match raw.parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("Invalid value {:?} in {}, ignoring", raw, name);
            None
        }
    }
}

/// Get a boolean flag from the environment
///
/// Truthy: "1", "true", "yes", "on". Falsy: "0", "false", "no", "off".
/// Anything else (or unset) yields `default`.
pub fn env_flag(name: &str, default: bool) -> bool {
    match env_opt(name).map(|v| v.to_ascii_lowercase()) {
        Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => true,
        Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => false,
        Some(v) => {
            log::warn!("Invalid boolean {:?} in {}, using default {}", v, name, default);
            default
        }
        None => default,
    }
}
