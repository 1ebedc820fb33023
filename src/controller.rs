//! Top-level box controller and cooperative scheduler.
//!
//! Owns every component and the hardware/storage capabilities. One
//! `tick` per main-loop iteration polls each component in a fixed
//! order; everything is elapsed-time driven, nothing blocks except the
//! menu feedback beeps.
//!
//! The controller is also the hub the active-box claim fans out from:
//! switch transitions feed it locally, the cloud glue feeds it
//! remotely via `on_remote_active_box`, and every transition re-applies
//! the RGB/buzzer presets and re-runs the motor direction decision.

use core::fmt::Write as _;

use crate::button::ButtonDebouncer;
use crate::buzzer::{beep, PatternPlayer};
use crate::config::{MENU_TIMEOUT_MS, MOTOR_POLL_MS};
use crate::coordinator::{ActiveBoxCoordinator, ClaimOrigin, RoleChange};
use crate::hal::{Hardware, SettingsStore};
use crate::menu::{MenuEngine, MenuEntry, MenuEvent};
use crate::motor::{MotorController, MotorInputs};
use crate::rgb::RgbAnimator;
use crate::settings::{Settings, MOTOR_SPEED_FLOOR_PCT};

/// Menu feedback tones.
const NAV_BEEP_HZ: u16 = 1500;
const EDIT_BEEP_HZ: u16 = 1800;

/// The whole box. Construct once at startup, then `init` and `tick`.
pub struct UselessBox<H: Hardware, S: SettingsStore> {
    hw: H,
    store: S,
    settings: Settings,

    button: ButtonDebouncer,
    menu: MenuEngine,
    rgb: RgbAnimator,
    buzzer: PatternPlayer,
    motor: MotorController,
    coordinator: ActiveBoxCoordinator,

    /// Debounced view of the SPDT switch and limit switch.
    switch_forward: bool,
    limit_pressed: bool,
    last_input_poll: Option<u64>,

    /// Policy: audible notice when this box releases its own claim.
    notify_on_local_release: bool,

    /// Time of the current tick, for menu handlers.
    now: u64,
}

impl<H: Hardware, S: SettingsStore> UselessBox<H, S> {
    /// The settings menu. A fixed table: order here is display order
    /// is navigation order. The engine never branches on content.
    const MENU: [MenuEntry<Self>; 7] = [
        MenuEntry {
            label: "Active RGB",
            show: Self::show_active_rgb,
            adjust: Self::adjust_active_rgb,
            confirm: Self::show_active_rgb,
        },
        MenuEntry {
            label: "Inactive RGB",
            show: Self::show_inactive_rgb,
            adjust: Self::adjust_inactive_rgb,
            confirm: Self::show_inactive_rgb,
        },
        MenuEntry {
            label: "RGB Brightness",
            show: Self::show_brightness,
            adjust: Self::adjust_brightness,
            confirm: Self::show_brightness,
        },
        MenuEntry {
            label: "Active Buzzer",
            show: Self::show_active_buzzer,
            adjust: Self::adjust_active_buzzer,
            confirm: Self::show_active_buzzer,
        },
        MenuEntry {
            label: "Inactive Buzzer",
            show: Self::show_inactive_buzzer,
            adjust: Self::adjust_inactive_buzzer,
            confirm: Self::show_inactive_buzzer,
        },
        MenuEntry {
            label: "Buzzer Volume",
            show: Self::show_buzzer_volume,
            adjust: Self::adjust_buzzer_volume,
            confirm: Self::show_buzzer_volume,
        },
        MenuEntry {
            label: "Motor Speed",
            show: Self::show_motor_speed,
            adjust: Self::adjust_motor_speed,
            confirm: Self::show_motor_speed,
        },
    ];

    pub fn new(hw: H, mut store: S, this_box: &'static str) -> Self {
        let settings = Settings::load(&mut store);
        Self {
            hw,
            rgb: RgbAnimator::new(settings.brightness_pct),
            motor: MotorController::new(settings.motor_speed_pct),
            settings,
            store,
            button: ButtonDebouncer::new(),
            menu: MenuEngine::new(MENU_TIMEOUT_MS),
            buzzer: PatternPlayer::new(),
            coordinator: ActiveBoxCoordinator::new(this_box),
            switch_forward: false,
            limit_pressed: true,
            last_input_poll: None,
            notify_on_local_release: false,
            now: 0,
        }
    }

    /// Product policy flag: also play the inactive buzzer preset when
    /// the local operator turns this box's own switch off.
    pub fn set_notify_on_local_release(&mut self, notify: bool) {
        self.notify_on_local_release = notify;
    }

    /// Read the starting input state and reflect it. The box boots
    /// inactive, so the inactive RGB preset is the startup look.
    pub fn init(&mut self, now: u64) {
        self.now = now;
        self.switch_forward = self.hw.switch_forward();
        self.limit_pressed = self.hw.limit_pressed();
        self.rgb.set_mode(&mut self.hw, self.settings.inactive_rgb);
        self.reevaluate_motor(now);
        self.hw.log_line("System initialized");
        self.show_menu();
    }

    /// One scheduler pass. Call continuously with the monotonic
    /// millisecond clock; every component rate-limits itself.
    pub fn tick(&mut self, now: u64) {
        self.now = now;

        let raw = self.hw.button_pressed();
        self.button.poll(raw, now);
        self.handle_menu(now);

        if self.input_poll_due(now) {
            self.poll_inputs(now);
        }

        self.motor.update(&mut self.hw, now);
        self.rgb.update(&mut self.hw, now);
        self.buzzer.update(&mut self.hw, now);
    }

    /// Inbound setter for the cloud collaborator: the remote side wrote
    /// a new active-box name.
    pub fn on_remote_active_box(&mut self, name: &str, now: u64) {
        self.now = now;
        self.apply_claim(name, ClaimOrigin::Remote, now);
    }

    // Input polling and claim fan-out

    fn input_poll_due(&mut self, now: u64) -> bool {
        match self.last_input_poll {
            Some(last) if now.saturating_sub(last) < MOTOR_POLL_MS => false,
            _ => {
                self.last_input_poll = Some(now);
                true
            }
        }
    }

    fn poll_inputs(&mut self, now: u64) {
        let switch = self.hw.switch_forward();
        let limit = self.hw.limit_pressed();
        let mut changed = false;

        if switch != self.switch_forward {
            self.switch_forward = switch;
            changed = true;
            self.hw.log_line(if switch {
                "Switch changed: FORWARD"
            } else {
                "Switch changed: REVERSE"
            });

            if switch && !self.coordinator.is_active() {
                // A human flipped us on: claim the active role.
                let name = self.coordinator.this_box();
                self.hw.push_active_box(name);
                self.apply_claim(name, ClaimOrigin::Local, now);
            } else if !switch && self.coordinator.is_active() {
                // Flipped off while active: release the claim.
                self.hw.push_active_box("");
                self.apply_claim("", ClaimOrigin::Local, now);
            }
        }

        if limit != self.limit_pressed {
            self.limit_pressed = limit;
            changed = true;
            self.hw.log_line(if limit {
                "Limit changed: PRESSED"
            } else {
                "Limit changed: RELEASED"
            });
        }

        if changed {
            self.reevaluate_motor(now);
        }
    }

    fn apply_claim(&mut self, name: &str, origin: ClaimOrigin, now: u64) {
        let Some(change) = self.coordinator.set_claim(name, origin) else {
            return;
        };

        let mut line: heapless::String<64> = heapless::String::new();
        let _ = write!(line, "Active box changed to: {}", self.coordinator.active_box());
        self.hw.log_line(&line);

        match change {
            RoleChange::NowActive => {
                self.rgb.set_mode(&mut self.hw, self.settings.active_rgb);
                self.buzzer
                    .trigger(&mut self.hw, self.settings.active_buzzer, now);
            }
            RoleChange::NowInactive(origin) => {
                self.rgb.set_mode(&mut self.hw, self.settings.inactive_rgb);
                // A remote steal gets an audible notice while our switch
                // is still forward; a local release is quiet unless the
                // product policy says otherwise.
                let notify = match origin {
                    ClaimOrigin::Remote => self.switch_forward,
                    ClaimOrigin::Local => self.notify_on_local_release,
                };
                if notify {
                    self.buzzer
                        .trigger(&mut self.hw, self.settings.inactive_buzzer, now);
                } else {
                    self.buzzer.stop(&mut self.hw);
                }
            }
        }

        // "Am I active" is an input to the direction decision.
        self.reevaluate_motor(now);
    }

    fn reevaluate_motor(&mut self, now: u64) {
        let inputs = MotorInputs {
            switch_forward: self.switch_forward,
            limit_pressed: self.limit_pressed,
            box_active: self.coordinator.is_active(),
        };
        self.motor.evaluate(&mut self.hw, inputs, now);
    }

    // Menu dispatch

    fn handle_menu(&mut self, now: u64) {
        let event = self.menu.poll(
            Self::MENU.len(),
            self.button.short_presses,
            self.button.long_presses,
            now,
        );

        match event {
            Some(MenuEvent::Advanced(index)) => {
                self.show_menu();
                // Audible index: N short beeps for menu item N.
                beep(&mut self.hw, index as u8 + 1, 60, 60, NAV_BEEP_HZ);
            }
            Some(MenuEvent::Adjust(index)) => {
                (Self::MENU[index].adjust)(self);
            }
            Some(MenuEvent::Entered(index)) => {
                let mut line: heapless::String<64> = heapless::String::new();
                let _ = write!(line, "Editing {}", Self::MENU[index].label);
                self.hw.log_line(&line);
                (Self::MENU[index].show)(self);
                beep(&mut self.hw, 1, 250, 0, EDIT_BEEP_HZ);
            }
            Some(MenuEvent::Confirmed(index)) => {
                (Self::MENU[index].confirm)(self);
                self.hw.log_line("Saved");
                self.show_menu();
                beep(&mut self.hw, 2, 100, 60, EDIT_BEEP_HZ);
            }
            Some(MenuEvent::TimedOut) => {
                self.hw.log_line("Menu timed out");
                self.show_menu();
            }
            None => {}
        }
    }

    fn show_menu(&mut self) {
        let index = self.menu.index();
        let mut line: heapless::String<64> = heapless::String::new();
        let _ = write!(
            line,
            "> Setting {}: {}",
            index + 1,
            Self::MENU[index].label
        );
        self.hw.log_line(&line);
        (Self::MENU[index].show)(self);
    }

    // Menu entry handlers

    fn show_active_rgb(&mut self) {
        let mut line: heapless::String<64> = heapless::String::new();
        let _ = write!(line, "Active RGB: {}", self.settings.active_rgb.label());
        self.hw.log_line(&line);
    }

    fn adjust_active_rgb(&mut self) {
        let next = self.settings.active_rgb.cycled();
        self.settings.set_active_rgb(&mut self.store, next);
        self.show_active_rgb();
    }

    fn show_inactive_rgb(&mut self) {
        let mut line: heapless::String<64> = heapless::String::new();
        let _ = write!(line, "Inactive RGB: {}", self.settings.inactive_rgb.label());
        self.hw.log_line(&line);
    }

    fn adjust_inactive_rgb(&mut self) {
        let next = self.settings.inactive_rgb.cycled();
        self.settings.set_inactive_rgb(&mut self.store, next);
        self.show_inactive_rgb();
    }

    fn show_brightness(&mut self) {
        let mut line: heapless::String<64> = heapless::String::new();
        let _ = write!(line, "RGB Brightness: {}%", self.settings.brightness_pct);
        self.hw.log_line(&line);
    }

    fn adjust_brightness(&mut self) {
        let next = Settings::stepped_pct(self.settings.brightness_pct, 0);
        self.settings.set_brightness(&mut self.store, next);
        // Re-render right away so the operator sees the new level.
        self.rgb
            .set_brightness(&mut self.hw, self.settings.brightness_pct);
        self.show_brightness();
    }

    fn show_active_buzzer(&mut self) {
        let mut line: heapless::String<64> = heapless::String::new();
        let _ = write!(line, "Active Buzzer: {}", self.settings.active_buzzer.label());
        self.hw.log_line(&line);
    }

    fn adjust_active_buzzer(&mut self) {
        let next = self.settings.active_buzzer.cycled();
        self.settings.set_active_buzzer(&mut self.store, next);
        self.show_active_buzzer();
        let now = self.now;
        self.buzzer.trigger_demo(&mut self.hw, next, now);
    }

    fn show_inactive_buzzer(&mut self) {
        let mut line: heapless::String<64> = heapless::String::new();
        let _ = write!(
            line,
            "Inactive Buzzer: {}",
            self.settings.inactive_buzzer.label()
        );
        self.hw.log_line(&line);
    }

    fn adjust_inactive_buzzer(&mut self) {
        let next = self.settings.inactive_buzzer.cycled();
        self.settings.set_inactive_buzzer(&mut self.store, next);
        self.show_inactive_buzzer();
        let now = self.now;
        self.buzzer.trigger_demo(&mut self.hw, next, now);
    }

    fn show_buzzer_volume(&mut self) {
        let mut line: heapless::String<64> = heapless::String::new();
        let _ = write!(line, "Buzzer Volume: {}%", self.settings.buzzer_volume_pct);
        self.hw.log_line(&line);
    }

    fn adjust_buzzer_volume(&mut self) {
        let next = Settings::stepped_pct(self.settings.buzzer_volume_pct, 0);
        self.settings.set_buzzer_volume(&mut self.store, next);
        self.show_buzzer_volume();
    }

    fn show_motor_speed(&mut self) {
        let mut line: heapless::String<64> = heapless::String::new();
        let _ = write!(line, "Motor Speed: {}%", self.settings.motor_speed_pct);
        self.hw.log_line(&line);
    }

    fn adjust_motor_speed(&mut self) {
        let next = Settings::stepped_pct(self.settings.motor_speed_pct, MOTOR_SPEED_FLOOR_PCT);
        self.settings.set_motor_speed(&mut self.store, next);
        self.motor.set_speed_pct(self.settings.motor_speed_pct);
        self.show_motor_speed();
    }

    // Accessors (used by the glue layers and the test-suite)

    pub fn hw(&self) -> &H {
        &self.hw
    }

    pub fn hw_mut(&mut self) -> &mut H {
        &mut self.hw
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn rgb(&self) -> &RgbAnimator {
        &self.rgb
    }

    pub fn buzzer(&self) -> &PatternPlayer {
        &self.buzzer
    }

    pub fn motor(&self) -> &MotorController {
        &self.motor
    }

    pub fn coordinator(&self) -> &ActiveBoxCoordinator {
        &self.coordinator
    }

    pub fn menu(&self) -> &MenuEngine {
        &self.menu
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buzzer::BuzzerPattern;
    use crate::motor::Direction;
    use crate::rgb::RgbMode;
    use crate::sim::{MemStore, SimHardware};

    fn boxed() -> UselessBox<SimHardware, MemStore> {
        let mut ub = UselessBox::new(SimHardware::new(), MemStore::new(), "MICHAEL");
        ub.init(0);
        ub
    }

    fn run(ub: &mut UselessBox<SimHardware, MemStore>, from: u64, ms: u64) -> u64 {
        for t in from..from + ms {
            ub.tick(t);
        }
        from + ms
    }

    #[test]
    fn switch_on_claims_active_and_applies_presets() {
        let mut ub = boxed();
        ub.hw_mut().switch_forward = true;
        let _ = run(&mut ub, 1, 200);

        assert_eq!(ub.hw().pushed_claim.as_deref(), Some("MICHAEL"));
        assert!(ub.coordinator().is_active());
        assert_eq!(ub.rgb().mode(), RgbMode::Rainbow); // active preset
        assert_eq!(ub.buzzer().pattern(), BuzzerPattern::Sos); // active preset
        // Active box with the flipper already home: nothing to do.
        assert_eq!(ub.motor().direction(), Direction::Stopped);
    }

    #[test]
    fn remote_steal_notifies_and_reevaluates() {
        let mut ub = boxed();
        ub.hw_mut().switch_forward = true;
        let t = run(&mut ub, 1, 200);

        // Another box takes the claim while our switch is still forward.
        ub.on_remote_active_box("TREVOR", t);
        assert!(!ub.coordinator().is_active());
        assert_eq!(ub.rgb().mode(), RgbMode::Off); // inactive preset
        // Default inactive buzzer preset is Off, but it was triggered
        // (cancel-and-restart semantics leave it in Off immediately).
        assert_eq!(ub.buzzer().pattern(), BuzzerPattern::Off);
        // Switch forward but box not active and limit pressed: forward
        // again - the flipper must push the switch back.
        assert_eq!(ub.motor().direction(), Direction::Forward);
    }

    #[test]
    fn remote_steal_plays_the_inactive_preset() {
        let mut ub = boxed();
        // Give the inactive role an audible preset first.
        ub.settings
            .set_inactive_buzzer(&mut ub.store, BuzzerPattern::Chirp);
        ub.hw_mut().switch_forward = true;
        let t = run(&mut ub, 1, 200);

        ub.on_remote_active_box("TREVOR", t);
        assert_eq!(ub.buzzer().pattern(), BuzzerPattern::Chirp);
    }

    #[test]
    fn local_release_is_quiet_by_default() {
        let mut ub = boxed();
        ub.hw_mut().switch_forward = true;
        let t = run(&mut ub, 1, 200);
        assert!(ub.coordinator().is_active());

        ub.settings
            .set_inactive_buzzer(&mut ub.store, BuzzerPattern::Chirp);
        ub.hw_mut().switch_forward = false;
        let _ = run(&mut ub, t, 200);

        assert!(!ub.coordinator().is_active());
        assert_eq!(ub.hw().pushed_claim.as_deref(), Some(""));
        // Quiet: the operator did this themselves.
        assert_eq!(ub.buzzer().pattern(), BuzzerPattern::Off);
    }

    #[test]
    fn local_release_notifies_when_policy_enabled() {
        let mut ub = boxed();
        ub.set_notify_on_local_release(true);
        ub.settings
            .set_inactive_buzzer(&mut ub.store, BuzzerPattern::Chirp);
        ub.hw_mut().switch_forward = true;
        let t = run(&mut ub, 1, 200);

        ub.hw_mut().switch_forward = false;
        let _ = run(&mut ub, t, 100);
        assert_eq!(ub.buzzer().pattern(), BuzzerPattern::Chirp);
    }

    #[test]
    fn active_box_reverses_home_then_stops() {
        let mut ub = boxed();
        ub.hw_mut().switch_forward = true;
        ub.hw_mut().limit_pressed = false; // flipper away from home
        let t = run(&mut ub, 1, 200);
        // Active box with switch forward: reverse toward home.
        assert!(ub.coordinator().is_active());
        assert_eq!(ub.motor().direction(), Direction::Reverse);

        ub.hw_mut().limit_pressed = true;
        let _ = run(&mut ub, t, 200);
        assert_eq!(ub.motor().direction(), Direction::Stopped);
        assert!(!ub.hw().enabled);
    }

    #[test]
    fn menu_press_navigates_and_adjust_commits_immediately() {
        let mut ub = boxed();
        let mut t = 1;

        // One short press: cursor moves to entry 1 (Inactive RGB).
        ub.hw_mut().button_pressed = true;
        t = run(&mut ub, t, 200);
        ub.hw_mut().button_pressed = false;
        t = run(&mut ub, t, 200);
        assert_eq!(ub.menu().index(), 1);

        // Long press: enter edit mode.
        ub.hw_mut().button_pressed = true;
        t = run(&mut ub, t, 1200);
        ub.hw_mut().button_pressed = false;
        t = run(&mut ub, t, 200);
        assert!(ub.menu().in_submenu());

        // Short press: adjust - Off cycles to White, persisted at once.
        ub.hw_mut().button_pressed = true;
        t = run(&mut ub, t, 200);
        ub.hw_mut().button_pressed = false;
        t = run(&mut ub, t, 200);
        assert_eq!(ub.settings().inactive_rgb, RgbMode::White);
        let stored = ub
            .store_mut()
            .get_i32(crate::settings::SettingKey::InactiveRgb as u8, -1);
        assert_eq!(stored, RgbMode::White as i32);

        // Confirm with a long press; value still the adjusted one.
        ub.hw_mut().button_pressed = true;
        t = run(&mut ub, t, 1200);
        ub.hw_mut().button_pressed = false;
        let _ = run(&mut ub, t, 200);
        assert!(!ub.menu().in_submenu());
        assert_eq!(ub.settings().inactive_rgb, RgbMode::White);
    }

    #[test]
    fn menu_times_out_back_to_the_top() {
        let mut ub = boxed();
        let mut t = 1;
        ub.hw_mut().button_pressed = true;
        t = run(&mut ub, t, 200);
        ub.hw_mut().button_pressed = false;
        t = run(&mut ub, t, 200);
        assert_eq!(ub.menu().index(), 1);

        let _ = run(&mut ub, t, MENU_TIMEOUT_MS + 200);
        assert_eq!(ub.menu().index(), 0);
    }

    #[test]
    fn brightness_adjust_rerenders_immediately() {
        let mut ub = boxed();
        ub.adjust_brightness(); // 100 + 10 wraps to 0
        assert_eq!(ub.settings().brightness_pct, 0);
        assert_eq!(ub.rgb().brightness_pct(), 0);
        ub.adjust_brightness();
        assert_eq!(ub.settings().brightness_pct, 10);
    }

    #[test]
    fn motor_speed_adjust_feeds_the_pwm_loop() {
        let mut ub = boxed();
        ub.adjust_motor_speed(); // 100 + 10 wraps to the floor
        assert_eq!(ub.settings().motor_speed_pct, 10);
        assert_eq!(ub.motor().speed_pct(), 10);
    }

    #[test]
    fn buzzer_adjust_previews_the_new_pattern() {
        let mut ub = boxed();
        ub.now = 50;
        ub.adjust_active_buzzer(); // Sos cycles to Off
        assert_eq!(ub.settings().active_buzzer, BuzzerPattern::Off);
        ub.adjust_active_buzzer(); // Off cycles to Single, demoed
        assert_eq!(ub.buzzer().pattern(), BuzzerPattern::Single);
    }
}
