//! Session identifiers and the long-lived device fingerprint.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

use crate::environment::EnvironmentSnapshot;
use crate::error::Result;

/// Namespace for name-based fingerprint UUIDs.
const FINGERPRINT_NAMESPACE: Uuid = Uuid::from_u128(0x6f1c_2a4e_93d7_4b0c_8e55_1d2f_a7c3_9b60);

/// Durable storage key for the fingerprint.
pub const FINGERPRINT_STORAGE_KEY: &str = "visitor_fingerprint";

/// Identifier scoping all visits and events of one page load.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fresh random session identifier. Held in memory only.
pub fn new_session_id() -> SessionId {
    SessionId(Uuid::new_v4().to_string())
}

/// Device signals combined into the fingerprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FingerprintInputs {
    pub user_agent: String,
    pub screen_width: u32,
    pub screen_height: u32,
    pub color_depth: u8,
    pub timezone: String,
}

impl FingerprintInputs {
    pub fn from_environment(env: &dyn EnvironmentSnapshot) -> Self {
        let screen = env.screen_metrics();
        Self {
            user_agent: env.user_agent(),
            screen_width: screen.width,
            screen_height: screen.height,
            color_depth: screen.color_depth,
            timezone: env.timezone(),
        }
    }
}

/// Stable, non-cryptographic device signature.
///
/// Identical inputs always produce the identical string; near-identical
/// devices may collide.
pub fn fingerprint(inputs: &FingerprintInputs) -> String {
    let material = format!(
        "{}|{}x{}|{}|{}",
        inputs.user_agent, inputs.screen_width, inputs.screen_height, inputs.color_depth, inputs.timezone
    );
    Uuid::new_v5(&FINGERPRINT_NAMESPACE, material.as_bytes())
        .simple()
        .to_string()
}

/// Durable key/value storage surviving reloads.
pub trait DurableStorage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// In-memory storage, for hosts without persistence and for tests.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DurableStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.values.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values.write().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Return the stored fingerprint, computing and storing it on first use.
///
/// A storage write failure still returns the computed value.
pub fn load_or_create_fingerprint(storage: &dyn DurableStorage, inputs: &FingerprintInputs) -> String {
    if let Some(existing) = storage.get(FINGERPRINT_STORAGE_KEY).filter(|v| !v.is_empty()) {
        return existing;
    }

    let value = fingerprint(inputs);
    if let Err(e) = storage.set(FINGERPRINT_STORAGE_KEY, &value) {
        tracing::debug!(error = %e, "Failed to persist fingerprint");
    }
    value
}
