//! Buzzer pattern player.
//!
//! A non-blocking step sequencer driven from the main loop: `update`
//! performs at most one tone transition per call and never waits.
//! Retriggering or changing pattern resets the sequencer outright -
//! cancel-and-restart, nothing is queued.
//!
//! `beep` is the one deliberate exception: a short blocking helper used
//! only for human-paced menu-navigation feedback.

use crate::config::{BUZZER_INTERVAL_MS, DEMO_WINDOW_MS};
use crate::hal::Hardware;

/// Audible patterns. Discriminants are the persisted representation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BuzzerPattern {
    Off = 0,
    Single = 1,
    Chirp = 2,
    Loop = 3,
    Sos = 4,
}

impl BuzzerPattern {
    pub const COUNT: i32 = 5;

    /// Decode a persisted value, wrapping modulo the variant count so
    /// out-of-range input is never an error.
    pub fn from_i32(value: i32) -> Self {
        match value.rem_euclid(Self::COUNT) {
            1 => Self::Single,
            2 => Self::Chirp,
            3 => Self::Loop,
            4 => Self::Sos,
            _ => Self::Off,
        }
    }

    /// Next pattern in menu-cycling order.
    pub fn cycled(self) -> Self {
        Self::from_i32(self as i32 + 1)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Off => "OFF",
            Self::Single => "SINGLE",
            Self::Chirp => "CHIRP",
            Self::Loop => "LOOP",
            Self::Sos => "SOS",
        }
    }
}

/// Single-beep tone and hold time.
const SINGLE_FREQ_HZ: u16 = 1000;
const SINGLE_HOLD_MS: u64 = 120;

/// Chirp: three tones back to back, re-triggered with a 50 ms spacing.
const CHIRP_FREQS: [u16; 3] = [800, 1200, 800];
const CHIRP_HOLD_MS: u64 = 120;
const CHIRP_SPACING_MS: u64 = 50;

/// SOS step hold times. The leading zero-length step gives the pattern
/// its initial pacing gap; each step is gated by `hold + GAP` elapsed.
const SOS_STEPS: [u64; 10] = [0, 150, 150, 150, 400, 400, 400, 150, 150, 150];
const SOS_GAP_MS: u64 = 150;
const SOS_FREQ_HZ: u16 = 800;

const LOOP_FREQ_HZ: u16 = 1000;

/// Non-blocking pattern sequencer.
pub struct PatternPlayer {
    pattern: BuzzerPattern,
    /// Step index within the active pattern.
    step: usize,
    /// True while a tone is currently sounding.
    sounding: bool,
    /// Time of the last step transition.
    last_step: u64,
    /// When set, the pattern is force-stopped at this time (menu demo).
    demo_until: Option<u64>,
}

impl PatternPlayer {
    pub fn new() -> Self {
        Self {
            pattern: BuzzerPattern::Off,
            step: 0,
            sounding: false,
            last_step: 0,
            demo_until: None,
        }
    }

    pub fn pattern(&self) -> BuzzerPattern {
        self.pattern
    }

    /// Start a pattern from its first step, silencing whatever played.
    pub fn trigger(&mut self, hw: &mut impl Hardware, pattern: BuzzerPattern, now: u64) {
        hw.no_tone();
        self.pattern = pattern;
        self.step = 0;
        self.sounding = false;
        self.last_step = now;
        self.demo_until = None;
    }

    /// Start a pattern as a menu preview: auto-stops after the demo
    /// window even for patterns that would loop forever.
    pub fn trigger_demo(&mut self, hw: &mut impl Hardware, pattern: BuzzerPattern, now: u64) {
        self.trigger(hw, pattern, now);
        self.demo_until = Some(now + DEMO_WINDOW_MS);
    }

    /// Force the pattern to Off and silence the output.
    pub fn stop(&mut self, hw: &mut impl Hardware) {
        self.pattern = BuzzerPattern::Off;
        self.step = 0;
        self.sounding = false;
        self.demo_until = None;
        hw.no_tone();
    }

    /// Advance the sequencer. Call once per scheduler tick; performs at
    /// most one tone transition per call.
    pub fn update(&mut self, hw: &mut impl Hardware, now: u64) {
        if let Some(deadline) = self.demo_until {
            if now >= deadline {
                self.stop(hw);
                return;
            }
        }

        let elapsed = now.saturating_sub(self.last_step);

        match self.pattern {
            BuzzerPattern::Off => {}

            BuzzerPattern::Single => {
                if self.step == 0 {
                    hw.tone(SINGLE_FREQ_HZ);
                    self.sounding = true;
                    self.last_step = now;
                    self.step = 1;
                } else if elapsed >= SINGLE_HOLD_MS {
                    self.stop(hw);
                }
            }

            BuzzerPattern::Chirp => {
                if self.step < CHIRP_FREQS.len() {
                    if self.step == 0 || elapsed >= CHIRP_HOLD_MS + CHIRP_SPACING_MS {
                        hw.tone(CHIRP_FREQS[self.step]);
                        self.sounding = true;
                        self.last_step = now;
                        self.step += 1;
                    }
                } else if elapsed >= CHIRP_HOLD_MS {
                    self.stop(hw);
                }
            }

            BuzzerPattern::Loop => {
                if elapsed >= BUZZER_INTERVAL_MS {
                    self.last_step = now;
                    self.sounding = !self.sounding;
                    if self.sounding {
                        hw.tone(LOOP_FREQ_HZ);
                    } else {
                        hw.no_tone();
                    }
                }
            }

            BuzzerPattern::Sos => {
                // Silence the previous step's tone once its hold expires.
                if self.sounding && self.step > 0 && elapsed >= SOS_STEPS[self.step - 1] {
                    hw.no_tone();
                    self.sounding = false;
                    return;
                }

                if self.step < SOS_STEPS.len() {
                    let hold = SOS_STEPS[self.step];
                    if elapsed >= hold + SOS_GAP_MS {
                        if hold > 0 {
                            hw.tone(SOS_FREQ_HZ);
                            self.sounding = true;
                        }
                        self.last_step = now;
                        self.step += 1;
                    }
                } else if !self.sounding && elapsed >= SOS_GAP_MS {
                    // All ten steps done and the final hold has expired.
                    self.stop(hw);
                }
            }
        }
    }
}

impl Default for PatternPlayer {
    fn default() -> Self {
        Self::new()
    }
}

/// Blocking menu-feedback beeps: `quantity` tones of `on_ms` separated
/// by `off_ms` of silence.
///
/// Intentionally blocking; must only be called from human-paced menu
/// navigation, never from the motor or animation paths.
pub fn beep(hw: &mut impl Hardware, quantity: u8, on_ms: u32, off_ms: u32, freq_hz: u16) {
    for _ in 0..quantity {
        hw.tone(freq_hz);
        hw.delay_ms(on_ms);
        hw.no_tone();
        hw.delay_ms(off_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimHardware;

    /// Step time forward one millisecond at a time.
    fn run(player: &mut PatternPlayer, hw: &mut SimHardware, from: u64, to: u64) {
        for t in from..to {
            player.update(hw, t);
        }
    }

    #[test]
    fn single_beeps_once_then_reverts_to_off() {
        let mut hw = SimHardware::new();
        let mut player = PatternPlayer::new();
        player.trigger(&mut hw, BuzzerPattern::Single, 0);
        run(&mut player, &mut hw, 0, 200);
        assert_eq!(player.pattern(), BuzzerPattern::Off);
        assert_eq!(hw.sounding, None);
        let tones: u32 = hw.tone_events.iter().filter(|e| e.is_some()).count() as u32;
        assert_eq!(tones, 1);
    }

    #[test]
    fn chirp_plays_three_tones_in_order() {
        let mut hw = SimHardware::new();
        let mut player = PatternPlayer::new();
        player.trigger(&mut hw, BuzzerPattern::Chirp, 0);
        run(&mut player, &mut hw, 0, 1000);
        assert_eq!(player.pattern(), BuzzerPattern::Off);
        let tones: heapless::Vec<u16, 8> = hw.tone_events.iter().filter_map(|e| *e).collect();
        assert_eq!(&tones[..], &[800, 1200, 800]);
    }

    #[test]
    fn loop_toggles_until_stopped() {
        let mut hw = SimHardware::new();
        let mut player = PatternPlayer::new();
        player.trigger(&mut hw, BuzzerPattern::Loop, 0);
        run(&mut player, &mut hw, 0, 2000);
        // Still looping after 2 s.
        assert_eq!(player.pattern(), BuzzerPattern::Loop);
        let tones = hw.tone_events.iter().filter(|e| e.is_some()).count();
        assert!(tones >= 3);
        player.stop(&mut hw);
        assert_eq!(player.pattern(), BuzzerPattern::Off);
        assert_eq!(hw.sounding, None);
    }

    #[test]
    fn sos_completes_ten_steps_then_reverts() {
        let mut hw = SimHardware::new();
        let mut player = PatternPlayer::new();
        player.trigger(&mut hw, BuzzerPattern::Sos, 0);
        run(&mut player, &mut hw, 0, 10_000);
        assert_eq!(player.pattern(), BuzzerPattern::Off);
        // Nine audible steps: the leading table entry is silent pacing.
        let tones = hw.tone_events.iter().filter(|e| e.is_some()).count();
        assert_eq!(tones, 9);
        assert_eq!(hw.sounding, None);
    }

    #[test]
    fn sos_survives_caller_updates_but_not_stop() {
        let mut hw = SimHardware::new();
        let mut player = PatternPlayer::new();
        player.trigger(&mut hw, BuzzerPattern::Sos, 0);
        run(&mut player, &mut hw, 0, 500);
        assert_eq!(player.pattern(), BuzzerPattern::Sos);
        player.stop(&mut hw);
        assert_eq!(player.pattern(), BuzzerPattern::Off);
    }

    #[test]
    fn retrigger_restarts_the_sequence() {
        let mut hw = SimHardware::new();
        let mut player = PatternPlayer::new();
        player.trigger(&mut hw, BuzzerPattern::Sos, 0);
        run(&mut player, &mut hw, 0, 1000);
        let before = hw.tone_events.iter().filter(|e| e.is_some()).count();
        assert!(before < 9);
        // Cancel-and-restart mid-sequence.
        player.trigger(&mut hw, BuzzerPattern::Sos, 1000);
        run(&mut player, &mut hw, 1000, 11_000);
        let total = hw.tone_events.iter().filter(|e| e.is_some()).count();
        assert_eq!(total, before + 9);
        assert_eq!(player.pattern(), BuzzerPattern::Off);
    }

    #[test]
    fn demo_window_stops_an_endless_loop() {
        let mut hw = SimHardware::new();
        let mut player = PatternPlayer::new();
        player.trigger_demo(&mut hw, BuzzerPattern::Loop, 0);
        run(&mut player, &mut hw, 0, DEMO_WINDOW_MS + 100);
        assert_eq!(player.pattern(), BuzzerPattern::Off);
        assert_eq!(hw.sounding, None);
    }

    #[test]
    fn pattern_decode_wraps_out_of_range_values() {
        assert_eq!(BuzzerPattern::from_i32(0), BuzzerPattern::Off);
        assert_eq!(BuzzerPattern::from_i32(4), BuzzerPattern::Sos);
        assert_eq!(BuzzerPattern::from_i32(5), BuzzerPattern::Off);
        assert_eq!(BuzzerPattern::from_i32(-1), BuzzerPattern::Sos);
        assert_eq!(BuzzerPattern::Sos.cycled(), BuzzerPattern::Off);
    }

    #[test]
    fn beep_blocks_for_the_requested_duration() {
        let mut hw = SimHardware::new();
        beep(&mut hw, 3, 60, 40, 1500);
        assert_eq!(hw.delayed_ms, 3 * (60 + 40));
        let tones = hw.tone_events.iter().filter(|e| e.is_some()).count();
        assert_eq!(tones, 3);
        assert_eq!(hw.sounding, None);
    }
}
