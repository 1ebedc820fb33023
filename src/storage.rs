//! Persistent settings storage on internal flash.
//!
//! Uses the nRF52840's internal flash via the `sequential-storage`
//! crate. The whole settings map is kept in an in-memory cache that
//! the core mutates synchronously through the `SettingsStore` trait;
//! the cache is flushed to flash from the async side whenever dirty.
//!
//! Storage layout:
//!   - One map key holds the whole settings blob:
//!     `[count][key u8, value i32 LE]*`.
//!   - `sequential-storage` manages the page range, wear levelling
//!     and GC.

use crate::config::{STORAGE_FLASH_PAGE_COUNT, STORAGE_FLASH_PAGE_START};
use crate::hal::SettingsStore;
use defmt::{debug, error, info};
use heapless::Vec;

/// Flash page size for nRF52840 (4 KB).
const FLASH_PAGE_SIZE: u32 = 4096;

/// Start address of our storage region.
const STORAGE_START: u32 = STORAGE_FLASH_PAGE_START * FLASH_PAGE_SIZE;

/// End address (exclusive) of our storage region.
const STORAGE_END: u32 = (STORAGE_FLASH_PAGE_START + STORAGE_FLASH_PAGE_COUNT) * FLASH_PAGE_SIZE;

/// Map key the settings blob lives under.
const KEY_SETTINGS: u8 = 0x01;

/// Maximum settings entries the cache holds.
const MAX_ENTRIES: usize = 16;

/// Serialized blob ceiling: 1 count byte + 5 bytes per entry.
const MAX_RECORD_SIZE: usize = 128;

/// In-memory settings cache, synced with flash.
pub struct SettingsFlash {
    entries: Vec<(u8, i32), MAX_ENTRIES>,
    /// True if cache differs from flash.
    dirty: bool,
}

impl SettingsFlash {
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            dirty: false,
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Async load from flash using sequential-storage.
    pub async fn load_from_flash(
        &mut self,
        flash: &mut impl embedded_storage_async::nor_flash::NorFlash,
    ) {
        let flash_range = STORAGE_START..STORAGE_END;
        let mut buf = [0u8; MAX_RECORD_SIZE];

        match sequential_storage::map::fetch_item::<u8, &[u8], _>(
            flash,
            flash_range,
            &mut sequential_storage::cache::NoCache::new(),
            &mut buf,
            &KEY_SETTINGS,
        )
        .await
        {
            Ok(Some(data)) => {
                self.entries.clear();
                self.deserialize_all(data);
                info!("Loaded {} settings from flash", self.entries.len());
            }
            Ok(None) => {
                info!("No settings in flash, using defaults");
                self.entries.clear();
            }
            Err(e) => {
                error!("Flash read error: {:?}", defmt::Debug2Format(&e));
                self.entries.clear();
            }
        }
        self.dirty = false;
    }

    /// Persist the cache to flash if anything changed.
    pub async fn save_to_flash(
        &mut self,
        flash: &mut impl embedded_storage_async::nor_flash::NorFlash,
    ) {
        if !self.dirty {
            debug!("SettingsFlash: no changes to save");
            return;
        }

        let flash_range = STORAGE_START..STORAGE_END;
        let mut buf = [0u8; MAX_RECORD_SIZE];
        let mut data_buf = [0u8; MAX_RECORD_SIZE];

        let len = self.serialize_all(&mut data_buf);
        let item = &data_buf[..len];

        match sequential_storage::map::store_item::<u8, &[u8], _>(
            flash,
            flash_range,
            &mut sequential_storage::cache::NoCache::new(),
            &mut buf,
            &KEY_SETTINGS,
            &item,
        )
        .await
        {
            Ok(_) => {
                info!("Saved {} settings to flash", self.entries.len());
                self.dirty = false;
            }
            Err(e) => {
                error!("Flash write error: {:?}", defmt::Debug2Format(&e));
            }
        }
    }

    fn serialize_all(&self, buf: &mut [u8]) -> usize {
        buf[0] = self.entries.len() as u8;
        let mut offset = 1;
        for (key, value) in &self.entries {
            buf[offset] = *key;
            buf[offset + 1..offset + 5].copy_from_slice(&value.to_le_bytes());
            offset += 5;
        }
        offset
    }

    fn deserialize_all(&mut self, data: &[u8]) {
        if data.is_empty() {
            return;
        }

        let count = data[0] as usize;
        let mut offset = 1;

        for _ in 0..count {
            if offset + 5 > data.len() {
                break;
            }
            let key = data[offset];
            let mut value_bytes = [0u8; 4];
            value_bytes.copy_from_slice(&data[offset + 1..offset + 5]);
            let value = i32::from_le_bytes(value_bytes);
            if !self.entries.is_full() {
                let _ = self.entries.push((key, value));
            }
            offset += 5;
        }
    }
}

impl Default for SettingsFlash {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsStore for SettingsFlash {
    fn get_i32(&mut self, key: u8, default: i32) -> i32 {
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| *v)
            .unwrap_or(default)
    }

    fn put_i32(&mut self, key: u8, value: i32) {
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            if entry.1 != value {
                entry.1 = value;
                self.dirty = true;
            }
            return;
        }
        if self.entries.push((key, value)).is_ok() {
            self.dirty = true;
        }
    }
}
