//! Persisted user-adjustable settings.
//!
//! Every setter validates by clamping or wrapping - out-of-range input
//! is never an error - and persists through the `SettingsStore`
//! capability immediately. "Adjust commits immediately, confirm is an
//! acknowledgment": there is no two-phase commit anywhere.

use crate::buzzer::BuzzerPattern;
use crate::config::{
    DEFAULT_BRIGHTNESS_PCT, DEFAULT_BUZZER_VOLUME_PCT, DEFAULT_MOTOR_SPEED_PCT,
};
use crate::hal::SettingsStore;
use crate::rgb::RgbMode;

/// Storage keys for the settings map.
#[derive(Clone, Copy)]
#[repr(u8)]
pub enum SettingKey {
    ActiveRgb = 0x01,
    InactiveRgb = 0x02,
    RgbBrightness = 0x03,
    ActiveBuzzer = 0x04,
    InactiveBuzzer = 0x05,
    BuzzerVolume = 0x06,
    MotorSpeed = 0x07,
}

/// Motor speed never wraps below this: the flipper must always move.
pub const MOTOR_SPEED_FLOOR_PCT: u8 = 10;

/// Owner of the persisted preset pairs and percentage settings.
pub struct Settings {
    pub active_rgb: RgbMode,
    pub inactive_rgb: RgbMode,
    pub brightness_pct: u8,
    pub active_buzzer: BuzzerPattern,
    pub inactive_buzzer: BuzzerPattern,
    pub buzzer_volume_pct: u8,
    pub motor_speed_pct: u8,
}

impl Settings {
    /// Read every field from storage, falling back to the compiled-in
    /// defaults where nothing is stored.
    pub fn load(store: &mut impl SettingsStore) -> Self {
        Self {
            active_rgb: RgbMode::from_i32(
                store.get_i32(SettingKey::ActiveRgb as u8, RgbMode::Rainbow as i32),
            ),
            inactive_rgb: RgbMode::from_i32(
                store.get_i32(SettingKey::InactiveRgb as u8, RgbMode::Off as i32),
            ),
            brightness_pct: clamp_pct(store.get_i32(
                SettingKey::RgbBrightness as u8,
                DEFAULT_BRIGHTNESS_PCT as i32,
            )),
            active_buzzer: BuzzerPattern::from_i32(
                store.get_i32(SettingKey::ActiveBuzzer as u8, BuzzerPattern::Sos as i32),
            ),
            inactive_buzzer: BuzzerPattern::from_i32(
                store.get_i32(SettingKey::InactiveBuzzer as u8, BuzzerPattern::Off as i32),
            ),
            buzzer_volume_pct: clamp_pct(store.get_i32(
                SettingKey::BuzzerVolume as u8,
                DEFAULT_BUZZER_VOLUME_PCT as i32,
            )),
            motor_speed_pct: clamp_pct(store.get_i32(
                SettingKey::MotorSpeed as u8,
                DEFAULT_MOTOR_SPEED_PCT as i32,
            )),
        }
    }

    pub fn set_active_rgb(&mut self, store: &mut impl SettingsStore, mode: RgbMode) {
        self.active_rgb = mode;
        store.put_i32(SettingKey::ActiveRgb as u8, mode as i32);
    }

    pub fn set_inactive_rgb(&mut self, store: &mut impl SettingsStore, mode: RgbMode) {
        self.inactive_rgb = mode;
        store.put_i32(SettingKey::InactiveRgb as u8, mode as i32);
    }

    pub fn set_brightness(&mut self, store: &mut impl SettingsStore, pct: i32) {
        self.brightness_pct = clamp_pct(pct);
        store.put_i32(SettingKey::RgbBrightness as u8, self.brightness_pct as i32);
    }

    pub fn set_active_buzzer(&mut self, store: &mut impl SettingsStore, pattern: BuzzerPattern) {
        self.active_buzzer = pattern;
        store.put_i32(SettingKey::ActiveBuzzer as u8, pattern as i32);
    }

    pub fn set_inactive_buzzer(&mut self, store: &mut impl SettingsStore, pattern: BuzzerPattern) {
        self.inactive_buzzer = pattern;
        store.put_i32(SettingKey::InactiveBuzzer as u8, pattern as i32);
    }

    pub fn set_buzzer_volume(&mut self, store: &mut impl SettingsStore, pct: i32) {
        self.buzzer_volume_pct = clamp_pct(pct);
        store.put_i32(SettingKey::BuzzerVolume as u8, self.buzzer_volume_pct as i32);
    }

    pub fn set_motor_speed(&mut self, store: &mut impl SettingsStore, pct: i32) {
        self.motor_speed_pct = clamp_pct(pct);
        store.put_i32(SettingKey::MotorSpeed as u8, self.motor_speed_pct as i32);
    }

    /// Step a percentage by +10, wrapping past 100 back to `floor`.
    pub fn stepped_pct(current: u8, floor: u8) -> i32 {
        let next = current as i32 + 10;
        if next > 100 {
            floor as i32
        } else {
            next
        }
    }
}

fn clamp_pct(value: i32) -> u8 {
    value.clamp(0, 100) as u8
}
