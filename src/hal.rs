//! Capability traits the core logic is written against.
//!
//! The core never touches pins or flash directly - it consumes these
//! narrow traits. The embedded binary implements them over embassy-nrf;
//! the `sim` module implements them in memory for host tests.

/// Primitive hardware surface consumed by the core.
///
/// Digital inputs are reported with their meaning already decoded
/// (active-low wiring is the implementor's concern). RGB duties are raw
/// channel values; the animator hands them over pre-scaled and inverted
/// for the common-anode LED.
pub trait Hardware {
    /// Is the SPDT switch in the forward-requesting position?
    fn switch_forward(&mut self) -> bool;

    /// Is the limit switch pressed (flipper home)?
    fn limit_pressed(&mut self) -> bool;

    /// Is the settings button held down?
    fn button_pressed(&mut self) -> bool;

    /// Write raw duty values (0-255) to the three LED channels.
    fn rgb_duty(&mut self, r: u8, g: u8, b: u8);

    /// Start emitting a tone at the given frequency.
    fn tone(&mut self, freq_hz: u16);

    /// Silence the buzzer.
    fn no_tone(&mut self);

    /// Drive the motor direction pins (IN1, IN2).
    fn motor_pins(&mut self, in1: bool, in2: bool);

    /// Drive the motor enable line. Software PWM toggles this.
    fn motor_enable(&mut self, on: bool);

    /// Busy-wait. Only the menu feedback `beep` helper may call this.
    fn delay_ms(&mut self, ms: u32);

    /// Push a new active-box claim out through the cloud variable.
    fn push_active_box(&mut self, name: &str);

    /// One-way diagnostic/console line. Never parsed, never gates behavior.
    fn log_line(&mut self, line: &str);
}

/// Non-volatile key/value persistence for user-adjustable settings.
///
/// Reads that find no stored value fall back to the supplied default -
/// never an error.
pub trait SettingsStore {
    fn get_i32(&mut self, key: u8, default: i32) -> i32;
    fn put_i32(&mut self, key: u8, value: i32);
}
