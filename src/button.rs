//! Debounced settings-button state machine.
//!
//! Turns the raw, bouncy button level into clean short-press and
//! long-press counters. Debounce is by elapsed stability: any raw
//! transition restarts the window, and a candidate level is accepted
//! only once it has held for the full debounce time.
//!
//! The counters are monotonic. Consumers (the menu engine) keep their
//! own last-observed snapshots, so each physical press is seen exactly
//! once, and a press either counts as short or as long - never both.

use crate::config::{DEBOUNCE_MS, LONG_PRESS_MS};

/// Owner of all button state. Poll once per scheduler tick.
pub struct ButtonDebouncer {
    /// Accepted (debounced) level; true while held.
    pressed: bool,
    /// Raw level seen on the previous poll.
    last_raw: bool,
    /// When the accepted level last became pressed.
    press_start: u64,
    /// When the raw level last changed.
    last_debounce: u64,
    /// Set once a hold crosses the long-press threshold; blocks the
    /// short-press count on the eventual release.
    long_press_armed: bool,

    /// Completed short presses. Never decreases.
    pub short_presses: u32,
    /// Long presses, counted the moment the threshold is crossed.
    pub long_presses: u32,

    debounce_ms: u64,
    long_press_ms: u64,
}

impl ButtonDebouncer {
    pub fn new() -> Self {
        Self::with_timing(DEBOUNCE_MS, LONG_PRESS_MS)
    }

    /// Product-tunable timing variant.
    pub fn with_timing(debounce_ms: u64, long_press_ms: u64) -> Self {
        Self {
            pressed: false,
            last_raw: false,
            press_start: 0,
            last_debounce: 0,
            long_press_armed: false,
            short_presses: 0,
            long_presses: 0,
            debounce_ms,
            long_press_ms,
        }
    }

    /// Feed the instantaneous button read (true = held down) and the
    /// current monotonic time in milliseconds.
    pub fn poll(&mut self, raw_pressed: bool, now: u64) {
        if raw_pressed != self.last_raw {
            self.last_debounce = now;
        }

        if now.saturating_sub(self.last_debounce) > self.debounce_ms && raw_pressed != self.pressed
        {
            self.pressed = raw_pressed;

            if self.pressed {
                // Just pressed
                self.press_start = now;
                self.long_press_armed = false;
            } else {
                // Just released
                let held = now.saturating_sub(self.press_start);
                if held < self.long_press_ms && !self.long_press_armed {
                    self.short_presses += 1;
                }
            }
        }

        // Long press fires while still held, without waiting for release.
        if self.pressed
            && !self.long_press_armed
            && now.saturating_sub(self.press_start) > self.long_press_ms
        {
            self.long_press_armed = true;
            self.long_presses += 1;
        }

        self.last_raw = raw_pressed;
    }

    /// Debounced level, for callers that care about the hold itself.
    pub fn is_pressed(&self) -> bool {
        self.pressed
    }
}

impl Default for ButtonDebouncer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Walk the debouncer through a stable level for `ms` milliseconds.
    fn hold(btn: &mut ButtonDebouncer, level: bool, from: u64, ms: u64) -> u64 {
        for t in from..from + ms {
            btn.poll(level, t);
        }
        from + ms
    }

    #[test]
    fn short_press_counts_once() {
        let mut btn = ButtonDebouncer::new();
        let t = hold(&mut btn, false, 0, 100);
        let t = hold(&mut btn, true, t, 300); // well under long-press
        hold(&mut btn, false, t, 100);
        assert_eq!(btn.short_presses, 1);
        assert_eq!(btn.long_presses, 0);
    }

    #[test]
    fn long_press_fires_at_threshold_without_release() {
        let mut btn = ButtonDebouncer::new();
        let t = hold(&mut btn, false, 0, 100);
        hold(&mut btn, true, t, LONG_PRESS_MS + 60);
        // Counted while still held.
        assert_eq!(btn.long_presses, 1);
        assert_eq!(btn.short_presses, 0);
    }

    #[test]
    fn long_press_never_also_counts_short_on_release() {
        let mut btn = ButtonDebouncer::new();
        let t = hold(&mut btn, false, 0, 100);
        let t = hold(&mut btn, true, t, LONG_PRESS_MS + 500);
        hold(&mut btn, false, t, 100);
        assert_eq!(btn.long_presses, 1);
        assert_eq!(btn.short_presses, 0);
    }

    #[test]
    fn press_just_under_threshold_is_short() {
        let mut btn = ButtonDebouncer::new();
        let t = hold(&mut btn, false, 0, 100);
        let t = hold(&mut btn, true, t, LONG_PRESS_MS - 1);
        hold(&mut btn, false, t, 100);
        assert_eq!(btn.short_presses, 1);
        assert_eq!(btn.long_presses, 0);
    }

    #[test]
    fn fast_oscillation_never_changes_debounced_level() {
        let mut btn = ButtonDebouncer::new();
        let mut t = hold(&mut btn, false, 0, 100);
        // Toggle every 10 ms - far inside the 50 ms debounce window.
        for i in 0..200u64 {
            for _ in 0..10 {
                btn.poll(i % 2 == 0, t);
                t += 1;
            }
        }
        assert!(!btn.is_pressed());
        assert_eq!(btn.short_presses, 0);
        assert_eq!(btn.long_presses, 0);
    }

    #[test]
    fn counters_are_monotonic_across_presses() {
        let mut btn = ButtonDebouncer::new();
        let mut t = hold(&mut btn, false, 0, 100);
        for _ in 0..3 {
            t = hold(&mut btn, true, t, 200);
            t = hold(&mut btn, false, t, 200);
        }
        assert_eq!(btn.short_presses, 3);
        t = hold(&mut btn, true, t, LONG_PRESS_MS + 100);
        hold(&mut btn, false, t, 200);
        assert_eq!(btn.short_presses, 3);
        assert_eq!(btn.long_presses, 1);
    }
}
