//! Key-value storage adapter.
//!
//! Implements both [`ConfigPort`] and [`StoragePort`] over an in-memory
//! map.  The controller state blob lives under its own namespace and the
//! configuration is stored as a `postcard` blob.
//!
//! - Config validation: every field is range-checked before persistence.
//! - Namespace isolation: each subsystem uses its own namespace prefix.
//! - Atomic writes: a value is replaced as a whole or not at all.

use std::cell::RefCell;
use std::collections::HashMap;

use log::{info, warn};

use crate::app::ports::{ConfigError, ConfigPort, StorageError, StoragePort};
use crate::config::HoodConfig;

const CONFIG_NAMESPACE: &str = "hoodfan";
const CONFIG_KEY: &str = "cfg";

/// Largest value the store accepts.
const MAX_BLOB_SIZE: usize = 4000;

#[derive(Debug, Default)]
pub struct NvsAdapter {
    store: RefCell<HashMap<String, Vec<u8>>>,
}

impl NvsAdapter {
    pub fn new() -> Self {
        info!("NvsAdapter: in-memory backend");
        Self::default()
    }

    fn composite_key(namespace: &str, key: &str) -> String {
        format!("{}::{}", namespace, key)
    }
}

impl ConfigPort for NvsAdapter {
    fn load(&self) -> Result<HoodConfig, ConfigError> {
        let key = Self::composite_key(CONFIG_NAMESPACE, CONFIG_KEY);
        if let Some(bytes) = self.store.borrow().get(&key) {
            let cfg: HoodConfig =
                postcard::from_bytes(bytes).map_err(|_| ConfigError::Corrupted)?;
            cfg.validate()?;
            info!("NvsAdapter: loaded config from store");
            Ok(cfg)
        } else {
            info!("NvsAdapter: no stored config, using defaults");
            Ok(HoodConfig::default())
        }
    }

    fn save(&self, config: &HoodConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;
        if bytes.len() > MAX_BLOB_SIZE {
            return Err(ConfigError::StorageFull);
        }
        let key = Self::composite_key(CONFIG_NAMESPACE, CONFIG_KEY);
        info!("NvsAdapter: config saved ({} bytes)", bytes.len());
        self.store.borrow_mut().insert(key, bytes);
        Ok(())
    }
}

impl StoragePort for NvsAdapter {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        let composite = Self::composite_key(namespace, key);
        match self.store.borrow().get(&composite) {
            Some(data) => {
                if data.len() > buf.len() {
                    warn!("NvsAdapter: '{}' larger than read buffer", composite);
                    return Err(StorageError::IoError);
                }
                buf[..data.len()].copy_from_slice(data);
                Ok(data.len())
            }
            None => Err(StorageError::NotFound),
        }
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        if data.len() > MAX_BLOB_SIZE {
            return Err(StorageError::Full);
        }
        let composite = Self::composite_key(namespace, key);
        self.store.borrow_mut().insert(composite, data.to_vec());
        Ok(())
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        let composite = Self::composite_key(namespace, key);
        self.store.borrow_mut().remove(&composite);
        Ok(())
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        let composite = Self::composite_key(namespace, key);
        self.store.borrow().contains_key(&composite)
    }
}
