//! Process-wide Default Client
//!
//! Every [`Client`] built with default options replaces the process-wide
//! default (last writer wins). The free functions below delegate to it and
//! report [`AccessError::NoClientConfigured`] until one exists. Passing a
//! [`Client`] explicitly is preferred; this is a convenience for call sites
//! that cannot take one.

use crate::client::{Client, Lookup};
use crate::error::AccessError;
use arc_swap::ArcSwapOption;
use serde::de::DeserializeOwned;
use std::sync::Arc;

static DEFAULT_CLIENT: ArcSwapOption<Client> = ArcSwapOption::const_empty();

/// Install `client` as the default, returning the one it replaced
pub fn set_default(client: Client) -> Option<Client> {
    DEFAULT_CLIENT
        .swap(Some(Arc::new(client)))
        .map(|previous| (*previous).clone())
}

pub fn clear_default() -> Option<Client> {
    DEFAULT_CLIENT.swap(None).map(|previous| (*previous).clone())
}

/// The current default client, which may already be closed
pub fn default_client() -> Option<Client> {
    DEFAULT_CLIENT.load_full().map(|client| (*client).clone())
}

fn with_default<T>(default: T, f: impl FnOnce(&Client, T) -> Lookup<T>) -> Lookup<T> {
    let current = DEFAULT_CLIENT.load();
    match &*current {
        Some(client) => f(client, default),
        None => Lookup::fallback(default, AccessError::NoClientConfigured),
    }
}

pub fn get_config<T: DeserializeOwned>(name: &str, default: T) -> Lookup<T> {
    with_default(default, |client, default| client.get_config(name, default))
}

pub fn get_config_string(name: &str, default: impl Into<String>) -> Lookup<String> {
    with_default(default.into(), |client, default| {
        client.get_config_string(name, default)
    })
}

pub fn get_config_int(name: &str, default: i64) -> Lookup<i64> {
    with_default(default, |client, default| client.get_config_int(name, default))
}

pub fn get_config_float(name: &str, default: f64) -> Lookup<f64> {
    with_default(default, |client, default| client.get_config_float(name, default))
}

pub fn get_config_bool(name: &str, default: bool) -> Lookup<bool> {
    with_default(default, |client, default| client.get_config_bool(name, default))
}

pub fn get_config_array_of_strings(name: &str, default: Vec<String>) -> Lookup<Vec<String>> {
    with_default(default, |client, default| {
        client.get_config_array_of_strings(name, default)
    })
}
