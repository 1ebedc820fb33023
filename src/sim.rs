//! In-memory backends for the hardware and settings capabilities.
//!
//! Used by the unit and integration test-suites; also handy for poking
//! at the core logic from a host-side experiment. Outputs are recorded
//! so tests can assert on what the core drove.

use crate::hal::{Hardware, SettingsStore};
use heapless::{String, Vec};

/// Recorded tone event: `Some(freq)` for `tone`, `None` for `no_tone`.
pub type ToneEvent = Option<u16>;

/// Simulated hardware. Inputs are plain public fields the test sets;
/// outputs keep both the latest value and a short history.
pub struct SimHardware {
    pub switch_forward: bool,
    pub limit_pressed: bool,
    pub button_pressed: bool,

    /// Last raw duties written to the LED channels.
    pub rgb: (u8, u8, u8),
    /// Frequency currently sounding, if any.
    pub sounding: Option<u16>,
    /// Motor direction pins (IN1, IN2).
    pub in1: bool,
    pub in2: bool,
    /// Motor enable line level.
    pub enabled: bool,

    /// History of tone/no_tone calls (deduplicated no_tone).
    pub tone_events: Vec<ToneEvent, 64>,
    /// Rising edges seen on the enable line.
    pub enable_rises: u32,
    /// Total blocked milliseconds from `delay_ms`.
    pub delayed_ms: u64,
    /// Most recent claim pushed to the cloud variable.
    pub pushed_claim: Option<String<32>>,
    /// Number of claims pushed.
    pub pushes: u32,
    /// Console lines emitted.
    pub log: Vec<String<64>, 32>,
}

impl SimHardware {
    pub fn new() -> Self {
        Self {
            switch_forward: false,
            limit_pressed: true,
            button_pressed: false,
            rgb: (255, 255, 255),
            sounding: None,
            in1: false,
            in2: false,
            enabled: false,
            tone_events: Vec::new(),
            enable_rises: 0,
            delayed_ms: 0,
            pushed_claim: None,
            pushes: 0,
            log: Vec::new(),
        }
    }

    fn record_tone(&mut self, ev: ToneEvent) {
        // Collapse repeated silences so histories stay readable.
        if ev.is_none() && self.tone_events.last() == Some(&None) {
            return;
        }
        if self.tone_events.is_full() {
            self.tone_events.remove(0);
        }
        let _ = self.tone_events.push(ev);
    }
}

impl Default for SimHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl Hardware for SimHardware {
    fn switch_forward(&mut self) -> bool {
        self.switch_forward
    }

    fn limit_pressed(&mut self) -> bool {
        self.limit_pressed
    }

    fn button_pressed(&mut self) -> bool {
        self.button_pressed
    }

    fn rgb_duty(&mut self, r: u8, g: u8, b: u8) {
        self.rgb = (r, g, b);
    }

    fn tone(&mut self, freq_hz: u16) {
        self.sounding = Some(freq_hz);
        self.record_tone(Some(freq_hz));
    }

    fn no_tone(&mut self) {
        self.sounding = None;
        self.record_tone(None);
    }

    fn motor_pins(&mut self, in1: bool, in2: bool) {
        self.in1 = in1;
        self.in2 = in2;
    }

    fn motor_enable(&mut self, on: bool) {
        if on && !self.enabled {
            self.enable_rises += 1;
        }
        self.enabled = on;
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delayed_ms += ms as u64;
    }

    fn push_active_box(&mut self, name: &str) {
        let mut s: String<32> = String::new();
        for c in name.chars().take(32) {
            let _ = s.push(c);
        }
        self.pushed_claim = Some(s);
        self.pushes += 1;
    }

    fn log_line(&mut self, line: &str) {
        let mut s: String<64> = String::new();
        for c in line.chars().take(64) {
            let _ = s.push(c);
        }
        if self.log.is_full() {
            self.log.remove(0);
        }
        let _ = self.log.push(s);
    }
}

/// Simple in-memory key/value settings store.
pub struct MemStore {
    entries: Vec<(u8, i32), 16>,
}

impl MemStore {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Pre-seed a stored value, as if it had been persisted earlier.
    pub fn seed(&mut self, key: u8, value: i32) {
        self.put_i32(key, value);
    }
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsStore for MemStore {
    fn get_i32(&mut self, key: u8, default: i32) -> i32 {
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| *v)
            .unwrap_or(default)
    }

    fn put_i32(&mut self, key: u8, value: i32) {
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = value;
            return;
        }
        let _ = self.entries.push((key, value));
    }
}
