//! Embedded entry point for the useless box (nRF52840).
//!
//! Wires the pure core logic up to real peripherals: GPIO for the
//! switch/limit/button inputs and motor driver, hardware PWM for the
//! common-anode RGB LED and the buzzer, and internal flash for the
//! persisted settings. The cloud transport is delegated: local claims
//! are handed to the `cloud_link` task and remote claims arrive
//! through the `REMOTE_CLAIM` signal, so swapping in a real transport
//! touches only that task.
//!
//! Build: `cargo build --release --features embedded --target thumbv7em-none-eabihf`

#![no_std]
#![no_main]

use defmt::info;
use embassy_embedded_hal::adapter::BlockingAsync;
use embassy_executor::Spawner;
use embassy_nrf::gpio::{Input, Level, Output, OutputDrive, Pull};
use embassy_nrf::nvmc::Nvmc;
use embassy_nrf::peripherals::{PWM0, PWM1};
use embassy_nrf::pwm::SimplePwm;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{block_for, Duration, Instant, Timer};
use heapless::String;
use {defmt_rtt as _, panic_probe as _};

use useless_box::config::{BOX_NAME, BOX_NAME_MAX};
use useless_box::hal::Hardware;
use useless_box::storage::SettingsFlash;
use useless_box::UselessBox;

/// Claims this box pushes outward; consumed by the cloud transport.
static LOCAL_CLAIM: Signal<CriticalSectionRawMutex, String<BOX_NAME_MAX>> = Signal::new();

/// Claims arriving from the cloud; fed into the controller each tick.
static REMOTE_CLAIM: Signal<CriticalSectionRawMutex, String<BOX_NAME_MAX>> = Signal::new();

/// How often dirty settings are flushed to flash.
const FLASH_FLUSH_INTERVAL: Duration = Duration::from_secs(5);

/// Real pin and PWM bindings for the capability surface the core uses.
struct Board {
    switch: Input<'static>,
    limit: Input<'static>,
    button: Input<'static>,
    rgb: SimplePwm<'static, PWM0>,
    buzzer: SimplePwm<'static, PWM1>,
    in1: Output<'static>,
    in2: Output<'static>,
    enable: Output<'static>,
}

impl Hardware for Board {
    fn switch_forward(&mut self) -> bool {
        self.switch.is_high()
    }

    fn limit_pressed(&mut self) -> bool {
        // Active low: the flipper resting on the switch pulls it down.
        self.limit.is_low()
    }

    fn button_pressed(&mut self) -> bool {
        self.button.is_low()
    }

    fn rgb_duty(&mut self, r: u8, g: u8, b: u8) {
        // The core already applied brightness and common-anode
        // inversion; these are the raw channel duties.
        self.rgb.set_duty(0, r as u16);
        self.rgb.set_duty(1, g as u16);
        self.rgb.set_duty(2, b as u16);
    }

    fn tone(&mut self, freq_hz: u16) {
        self.buzzer.set_period(freq_hz as u32);
        let half = self.buzzer.max_duty() / 2;
        self.buzzer.set_duty(0, half);
    }

    fn no_tone(&mut self) {
        self.buzzer.set_duty(0, 0);
    }

    fn motor_pins(&mut self, in1: bool, in2: bool) {
        self.in1.set_level(in1.into());
        self.in2.set_level(in2.into());
    }

    fn motor_enable(&mut self, on: bool) {
        self.enable.set_level(on.into());
    }

    fn delay_ms(&mut self, ms: u32) {
        // Menu feedback beeps only; never called from the motor or
        // animation paths.
        block_for(Duration::from_millis(ms as u64));
    }

    fn push_active_box(&mut self, name: &str) {
        let mut claim: String<BOX_NAME_MAX> = String::new();
        for c in name.chars().take(BOX_NAME_MAX) {
            let _ = claim.push(c);
        }
        LOCAL_CLAIM.signal(claim);
    }

    fn log_line(&mut self, line: &str) {
        info!("{}", line);
    }
}

/// Cloud transport seam. A real deployment replaces the body of this
/// task with the IoT connection: forward `LOCAL_CLAIM` upstream and
/// signal `REMOTE_CLAIM` when the shared variable changes.
#[embassy_executor::task]
async fn cloud_link() {
    loop {
        let claim = LOCAL_CLAIM.wait().await;
        info!("cloud: pushing active box claim '{}'", claim.as_str());
    }
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_nrf::init(Default::default());
    info!("useless box '{}' starting", BOX_NAME);

    let mut rgb = SimplePwm::new_3ch(p.PWM0, p.P0_06, p.P0_07, p.P0_05);
    rgb.set_max_duty(255);

    let mut buzzer = SimplePwm::new_1ch(p.PWM1, p.P0_11);
    buzzer.set_duty(0, 0);

    let board = Board {
        switch: Input::new(p.P0_08, Pull::Up),
        limit: Input::new(p.P0_09, Pull::Up),
        button: Input::new(p.P0_10, Pull::Up),
        rgb,
        buzzer,
        in1: Output::new(p.P0_03, Level::Low, OutputDrive::Standard),
        in2: Output::new(p.P0_04, Level::Low, OutputDrive::Standard),
        enable: Output::new(p.P0_02, Level::Low, OutputDrive::Standard),
    };

    let mut flash = BlockingAsync::new(Nvmc::new(p.NVMC));
    let mut store = SettingsFlash::new();
    store.load_from_flash(&mut flash).await;

    let mut controller = UselessBox::new(board, store, BOX_NAME);
    controller.init(Instant::now().as_millis());

    spawner.must_spawn(cloud_link());

    let mut last_flush = Instant::now();
    loop {
        let now = Instant::now().as_millis();
        controller.tick(now);

        if let Some(claim) = REMOTE_CLAIM.try_take() {
            controller.on_remote_active_box(&claim, now);
        }

        if last_flush.elapsed() >= FLASH_FLUSH_INTERVAL {
            controller.store_mut().save_to_flash(&mut flash).await;
            last_flush = Instant::now();
        }

        Timer::after_millis(1).await;
    }
}
