//! Motor controller: direction decision, soft-start, software PWM.
//!
//! Two loops at different rates. The direction decision runs whenever
//! a relevant input changes (switch, limit switch, active-box state),
//! not on a timer. The PWM loop runs on a fast fixed tick and emulates
//! duty cycling on the digital enable line, since the driver's enable
//! pin is not analog-capable on all board variants.
//!
//! Soft-start: any direction transition to a non-stopped direction
//! forces 100% duty for a short burst to break static friction.

use crate::config::{PWM_PERIOD_MS, PWM_TICK_MS, SOFT_START_MS};
use crate::hal::Hardware;

/// Commanded motor direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    Forward,
    Reverse,
    Stopped,
}

/// Inputs to the direction decision.
#[derive(Clone, Copy, Debug)]
pub struct MotorInputs {
    /// SPDT switch is in the forward-requesting position.
    pub switch_forward: bool,
    /// Limit switch reports the flipper is home.
    pub limit_pressed: bool,
    /// This box currently holds the active claim.
    pub box_active: bool,
}

/// Pure decision: forward beats everything while the box is unclaimed
/// (the limit switch is unreachable in that direction); otherwise
/// reverse until the flipper is home.
pub fn decide(inputs: MotorInputs) -> Direction {
    if inputs.switch_forward && !inputs.box_active {
        Direction::Forward
    } else if !inputs.limit_pressed {
        Direction::Reverse
    } else {
        Direction::Stopped
    }
}

/// Default speed compression curve: settings at or below 20% divide by
/// ten, so the low end of the knob is a barely-perceptible crawl
/// instead of an abrupt jump. Tuned on hardware, not derived.
pub fn crawl_curve(pct: u8) -> u8 {
    if pct <= 20 {
        pct / 10
    } else {
        pct
    }
}

/// Owner of direction, soft-start and PWM phase state.
pub struct MotorController {
    direction: Direction,
    /// True during the full-power burst after a direction change.
    starting: bool,
    start_time: u64,
    /// Target duty before the compression curve (0-100).
    speed_pct: u8,
    /// Replaceable compression curve.
    curve: fn(u8) -> u8,
    cycle_start: u64,
    duty_on: bool,
    last_pwm_update: Option<u64>,
}

impl MotorController {
    pub fn new(speed_pct: u8) -> Self {
        Self {
            direction: Direction::Stopped,
            starting: false,
            start_time: 0,
            speed_pct: speed_pct.min(100),
            curve: crawl_curve,
            cycle_start: 0,
            duty_on: false,
            last_pwm_update: None,
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn is_starting(&self) -> bool {
        self.starting
    }

    pub fn speed_pct(&self) -> u8 {
        self.speed_pct
    }

    pub fn set_speed_pct(&mut self, pct: u8) {
        self.speed_pct = pct.min(100);
    }

    /// Swap the low-end compression curve for a product-tuned one.
    pub fn set_curve(&mut self, curve: fn(u8) -> u8) {
        self.curve = curve;
    }

    /// Effective duty after soft-start override and compression.
    pub fn effective_duty_pct(&self) -> u8 {
        if self.starting {
            100
        } else {
            (self.curve)(self.speed_pct)
        }
    }

    /// Re-run the direction decision. Call on every relevant input
    /// change; drives the direction pins immediately and arms the
    /// soft-start burst on a transition.
    pub fn evaluate(&mut self, hw: &mut impl Hardware, inputs: MotorInputs, now: u64) {
        let next = decide(inputs);
        if next != self.direction {
            if next == Direction::Stopped {
                self.starting = false;
            } else {
                self.starting = true;
                self.start_time = now;
                self.cycle_start = now;
            }
            self.direction = next;
        }

        match self.direction {
            Direction::Forward => hw.motor_pins(true, false),
            Direction::Reverse => hw.motor_pins(false, true),
            Direction::Stopped => hw.motor_pins(false, false),
        }

        if self.direction == Direction::Stopped {
            hw.motor_enable(false);
            self.duty_on = false;
        }
    }

    /// Software-PWM tick. Call once per scheduler iteration; rate
    /// limits itself to the PWM tick interval.
    pub fn update(&mut self, hw: &mut impl Hardware, now: u64) {
        if let Some(last) = self.last_pwm_update {
            if now.saturating_sub(last) < PWM_TICK_MS {
                return;
            }
        }
        self.last_pwm_update = Some(now);

        if self.starting && now.saturating_sub(self.start_time) >= SOFT_START_MS {
            self.starting = false;
        }

        if self.direction == Direction::Stopped {
            // Forced low regardless of cycle phase.
            if self.duty_on {
                hw.motor_enable(false);
                self.duty_on = false;
            }
            return;
        }

        let duty = self.effective_duty_pct() as u64;
        let position = now.saturating_sub(self.cycle_start) % PWM_PERIOD_MS;
        let on_time = PWM_PERIOD_MS * duty / 100;
        let want_on = position < on_time;

        if want_on != self.duty_on {
            hw.motor_enable(want_on);
            self.duty_on = want_on;
        }
    }
}
