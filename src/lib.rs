//! Core logic for the useless-box firmware.
//!
//! Everything here is pure state-machine code driven by a monotonic
//! millisecond clock and the capability traits in [`hal`], so the whole
//! crate tests on the host (`cargo test`) with the in-memory backends
//! in [`sim`]. The embedded binary (main.rs, behind the `embedded`
//! feature) supplies real nRF52 implementations of the same traits.

#![cfg_attr(not(test), no_std)]

pub mod button;
pub mod buzzer;
pub mod config;
pub mod controller;
pub mod coordinator;
pub mod hal;
pub mod menu;
pub mod motor;
pub mod rgb;
pub mod settings;
pub mod sim;

#[cfg(feature = "embedded")]
pub mod storage;

pub use controller::UselessBox;
pub use hal::{Hardware, SettingsStore};
