//! RGB LED modes and animation.
//!
//! Static modes are written once on `apply`; the two dynamic modes
//! (rainbow, breathing) recompute their color in `update` on a 20 ms
//! cadence. Every write passes through the brightness scale and the
//! common-anode inversion, so a brightness change takes effect by
//! simply re-applying the mode.

use crate::config::RGB_UPDATE_MS;
use crate::hal::Hardware;
use num_traits::Float;

/// LED modes. Discriminants are the persisted representation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RgbMode {
    Off = 0,
    White = 1,
    Rainbow = 2,
    Breathing = 3,
    SolidRed = 4,
    SolidGreen = 5,
    SolidBlue = 6,
}

impl RgbMode {
    pub const COUNT: i32 = 7;

    /// Decode a persisted value, wrapping modulo the variant count.
    pub fn from_i32(value: i32) -> Self {
        match value.rem_euclid(Self::COUNT) {
            1 => Self::White,
            2 => Self::Rainbow,
            3 => Self::Breathing,
            4 => Self::SolidRed,
            5 => Self::SolidGreen,
            6 => Self::SolidBlue,
            _ => Self::Off,
        }
    }

    /// Next mode in menu-cycling order.
    pub fn cycled(self) -> Self {
        Self::from_i32(self as i32 + 1)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Off => "OFF",
            Self::White => "WHITE",
            Self::Rainbow => "RAINBOW",
            Self::Breathing => "BREATHING",
            Self::SolidRed => "RED",
            Self::SolidGreen => "GREEN",
            Self::SolidBlue => "BLUE",
        }
    }
}

/// Breathing ramp bounds and per-frame step.
const BREATH_MIN: i16 = 5;
const BREATH_MAX: i16 = 250;
const BREATH_STEP: i16 = 2;

/// Owner of the LED state: current mode, brightness, animation phase.
pub struct RgbAnimator {
    mode: RgbMode,
    brightness_pct: u8,
    last_frame: u64,
    rainbow_pos: u32,
    breath_value: i16,
    breath_dir: i16,
}

impl RgbAnimator {
    pub fn new(brightness_pct: u8) -> Self {
        Self {
            mode: RgbMode::Off,
            brightness_pct: brightness_pct.min(100),
            last_frame: 0,
            rainbow_pos: 0,
            breath_value: BREATH_MIN,
            breath_dir: 1,
        }
    }

    pub fn mode(&self) -> RgbMode {
        self.mode
    }

    pub fn brightness_pct(&self) -> u8 {
        self.brightness_pct
    }

    /// Switch modes and render immediately. Animation phase restarts.
    pub fn set_mode(&mut self, hw: &mut impl Hardware, mode: RgbMode) {
        self.mode = mode;
        self.rainbow_pos = 0;
        self.breath_value = BREATH_MIN;
        self.breath_dir = 1;
        self.apply(hw);
    }

    /// Re-render the current mode. Static modes get their color here;
    /// dynamic modes are painted by `update` on the next frame.
    pub fn apply(&mut self, hw: &mut impl Hardware) {
        match self.mode {
            RgbMode::Off => self.write(hw, 0, 0, 0),
            RgbMode::White => self.write(hw, 255, 255, 255),
            RgbMode::SolidRed => self.write(hw, 255, 0, 0),
            RgbMode::SolidGreen => self.write(hw, 0, 255, 0),
            RgbMode::SolidBlue => self.write(hw, 0, 0, 255),
            // Color computed per-frame in update().
            RgbMode::Rainbow | RgbMode::Breathing => {}
        }
    }

    /// Change brightness and re-render at the new level right away.
    pub fn set_brightness(&mut self, hw: &mut impl Hardware, pct: u8) {
        self.brightness_pct = pct.min(100);
        self.apply(hw);
    }

    /// Advance dynamic animations. Call once per scheduler tick.
    pub fn update(&mut self, hw: &mut impl Hardware, now: u64) {
        if now.saturating_sub(self.last_frame) <= RGB_UPDATE_MS {
            return;
        }

        match self.mode {
            RgbMode::Rainbow => {
                self.last_frame = now;
                let r = rainbow_channel(self.rainbow_pos, 1);
                let g = rainbow_channel(self.rainbow_pos, 2);
                let b = rainbow_channel(self.rainbow_pos, 3);
                self.write(hw, r, g, b);
                self.rainbow_pos = self.rainbow_pos.wrapping_add(1);
            }
            RgbMode::Breathing => {
                self.last_frame = now;
                self.breath_value += self.breath_dir * BREATH_STEP;
                if self.breath_value >= BREATH_MAX {
                    self.breath_dir = -1;
                }
                if self.breath_value <= BREATH_MIN {
                    self.breath_dir = 1;
                }
                let v = self.breath_value as u8;
                self.write(hw, v, v, v);
            }
            _ => {}
        }
    }

    /// Single write point: brightness scale, then common-anode
    /// inversion (hardware sinks current, so 255 - duty).
    fn write(&self, hw: &mut impl Hardware, r: u8, g: u8, b: u8) {
        let scale =
            |c: u8| -> u8 { 255 - ((c as u16 * self.brightness_pct as u16) / 100) as u8 };
        hw.rgb_duty(scale(r), scale(g), scale(b));
    }
}

/// Phase-shifted sine mapped from [-1, 1] to [0, 255].
fn rainbow_channel(pos: u32, mult: u32) -> u8 {
    let x = pos.wrapping_mul(mult) as f32 * 0.05;
    (x.sin() * 127.0 + 128.0) as u8
}
