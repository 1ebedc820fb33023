//! Application-wide constants and compile-time configuration.
//!
//! All timing parameters, setting defaults, and the box identity live
//! here so they can be tuned in one place.

// Identity

/// Name this box claims over the cloud "active box" variable.
/// Each box in the ensemble gets its own compile-time name.
pub const BOX_NAME: &str = "MICHAEL";

/// Maximum length of a box identifier (cloud claim string).
pub const BOX_NAME_MAX: usize = 32;

// Settings button

/// Debounce window (ms). A raw level must hold this long to be accepted.
pub const DEBOUNCE_MS: u64 = 50;

/// Hold duration (ms) after which a press counts as a long press.
pub const LONG_PRESS_MS: u64 = 1000;

// Settings menu

/// Inactivity timeout (ms) before the menu snaps back to the top.
/// Set to 0 to disable the timeout entirely.
pub const MENU_TIMEOUT_MS: u64 = 30_000;

// Buzzer

/// On/off toggle interval for the looping pattern (ms).
pub const BUZZER_INTERVAL_MS: u64 = 250;

/// How long a previewed pattern plays before being force-stopped (ms).
pub const DEMO_WINDOW_MS: u64 = 5_000;

// RGB LED

/// Minimum time between animation frames (ms).
pub const RGB_UPDATE_MS: u64 = 20;

// Motor

/// How often the switch and limit inputs are re-read (ms).
pub const MOTOR_POLL_MS: u64 = 50;

/// Full-power burst length on a direction change, to break static
/// friction (ms).
pub const SOFT_START_MS: u64 = 150;

/// Software PWM period on the motor enable line (ms).
pub const PWM_PERIOD_MS: u64 = 100;

/// How often the PWM phase is recomputed (ms).
pub const PWM_TICK_MS: u64 = 5;

// Setting defaults (used when flash holds no stored value)

/// Default RGB brightness (percent).
pub const DEFAULT_BRIGHTNESS_PCT: u8 = 100;

/// Default buzzer volume (percent).
pub const DEFAULT_BUZZER_VOLUME_PCT: u8 = 100;

/// Default motor speed (percent of full duty, before the crawl curve).
pub const DEFAULT_MOTOR_SPEED_PCT: u8 = 100;

// GPIO pin assignments (documentation; the embedded binary selects the
// actual embassy_nrf peripherals in main.rs)
//
//   Motor enable   → P0.02   (digital, software-PWM'd)
//   Motor IN1      → P0.03
//   Motor IN2      → P0.04
//   RGB red        → P0.06   (common anode - write inverted duty)
//   RGB green      → P0.07
//   RGB blue       → P0.05
//   SPDT switch    → P0.08   (pull-up)
//   Limit switch   → P0.09   (pull-up)
//   Settings btn   → P0.10   (pull-up, active low)
//   Buzzer         → P0.11

// Persisted-settings flash region

/// Flash page index where settings storage starts (4 KB pages).
pub const STORAGE_FLASH_PAGE_START: u32 = 240;

/// Number of flash pages reserved for settings storage.
pub const STORAGE_FLASH_PAGE_COUNT: u32 = 4;
