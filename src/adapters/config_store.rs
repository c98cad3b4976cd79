//! Persistent configuration store.
//!
//! Implements [`ConfigPort`] with the config serialised by postcard into a
//! single blob.  On ESP32 the blob lives in the `carphone` NVS namespace;
//! the host backend keeps it in memory (dev/test only).

use log::info;

use crate::app::ports::{ConfigError, ConfigPort};
use crate::config::BridgeConfig;

#[cfg(feature = "espidf")]
use esp_idf_sys::*;

#[cfg(feature = "espidf")]
const NAMESPACE: &[u8] = b"carphone\0";
#[cfg(feature = "espidf")]
const CONFIG_KEY: &[u8] = b"bridgecfg\0";

/// Upper bound for the stored blob.
const MAX_BLOB_SIZE: usize = 256;

#[derive(Default)]
pub struct ConfigStore {
    #[cfg(not(feature = "espidf"))]
    blob: Option<Vec<u8>>,
}

impl ConfigStore {
    /// Open the store, initialising NVS flash on ESP32.
    ///
    /// A full or outdated NVS partition is erased and re-initialised.
    pub fn new() -> Result<Self, ConfigError> {
        #[cfg(feature = "espidf")]
        {
            // SAFETY: called once from the main task before any NVS access.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
                log::warn!("config_store: erasing NVS partition");
                if unsafe { nvs_flash_erase() } != ESP_OK || unsafe { nvs_flash_init() } != ESP_OK {
                    return Err(ConfigError::Corrupted);
                }
            } else if ret != ESP_OK {
                return Err(ConfigError::Corrupted);
            }
            info!("config_store: NVS ready");
        }

        #[cfg(not(feature = "espidf"))]
        info!("config_store: in-memory backend");

        Ok(Self::default())
    }

    #[cfg(not(feature = "espidf"))]
    fn read_blob(&self) -> Result<Vec<u8>, ConfigError> {
        self.blob.clone().ok_or(ConfigError::NotFound)
    }

    #[cfg(not(feature = "espidf"))]
    fn write_blob(&mut self, bytes: &[u8]) -> Result<(), ConfigError> {
        self.blob = Some(bytes.to_vec());
        Ok(())
    }

    #[cfg(feature = "espidf")]
    fn with_handle<T>(
        write: bool,
        f: impl FnOnce(nvs_handle_t) -> Result<T, ConfigError>,
    ) -> Result<T, ConfigError> {
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };
        let mut handle: nvs_handle_t = 0;
        // SAFETY: NAMESPACE is NUL-terminated; handle is closed below.
        let ret = unsafe { nvs_open(NAMESPACE.as_ptr().cast(), mode, &mut handle) };
        if ret == ESP_ERR_NVS_NOT_FOUND {
            return Err(ConfigError::NotFound);
        }
        if ret != ESP_OK {
            return Err(ConfigError::Corrupted);
        }
        let result = f(handle);
        unsafe { nvs_close(handle) };
        result
    }

    #[cfg(feature = "espidf")]
    fn read_blob(&self) -> Result<Vec<u8>, ConfigError> {
        Self::with_handle(false, |handle| {
            let mut size: usize = 0;
            // SAFETY: size query with a null buffer.
            let ret = unsafe {
                nvs_get_blob(handle, CONFIG_KEY.as_ptr().cast(), core::ptr::null_mut(), &mut size)
            };
            if ret == ESP_ERR_NVS_NOT_FOUND {
                return Err(ConfigError::NotFound);
            }
            if ret != ESP_OK || size == 0 || size > MAX_BLOB_SIZE {
                return Err(ConfigError::Corrupted);
            }
            let mut buf = vec![0u8; size];
            // SAFETY: buf holds exactly `size` bytes.
            let ret = unsafe {
                nvs_get_blob(handle, CONFIG_KEY.as_ptr().cast(), buf.as_mut_ptr().cast(), &mut size)
            };
            if ret != ESP_OK {
                return Err(ConfigError::Corrupted);
            }
            buf.truncate(size);
            Ok(buf)
        })
    }

    #[cfg(feature = "espidf")]
    fn write_blob(&mut self, bytes: &[u8]) -> Result<(), ConfigError> {
        Self::with_handle(true, |handle| {
            // SAFETY: bytes outlives the call; commit is atomic.
            let ret = unsafe {
                nvs_set_blob(handle, CONFIG_KEY.as_ptr().cast(), bytes.as_ptr().cast(), bytes.len())
            };
            if ret != ESP_OK || unsafe { nvs_commit(handle) } != ESP_OK {
                return Err(ConfigError::Corrupted);
            }
            Ok(())
        })
    }
}

impl ConfigPort for ConfigStore {
    fn load(&self) -> Result<BridgeConfig, ConfigError> {
        let bytes = self.read_blob()?;
        let config = BridgeConfig::from_bytes(&bytes).map_err(|_| ConfigError::Corrupted)?;
        config.validate().map_err(ConfigError::ValidationFailed)?;
        info!("config_store: loaded {} bytes", bytes.len());
        Ok(config)
    }

    fn save(&mut self, config: &BridgeConfig) -> Result<(), ConfigError> {
        config.validate().map_err(ConfigError::ValidationFailed)?;
        let bytes = config.to_bytes().map_err(|_| ConfigError::Corrupted)?;
        if bytes.len() > MAX_BLOB_SIZE {
            return Err(ConfigError::ValidationFailed("config blob too large"));
        }
        self.write_blob(&bytes)?;
        info!("config_store: saved {} bytes", bytes.len());
        Ok(())
    }
}
