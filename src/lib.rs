//! Heat & Glo IntelliFire IPI relay controller library.
//!
//! The IPI module rejects static continuity across its sense terminals
//! and expects a qualified, time-shaped closure resembling a human
//! pressing the wall switch. This crate turns logical "ignite" / "probe"
//! requests into precisely sequenced relay open/close transitions under
//! fail-safe guarantees, abstracting relay polarity.
//!
//! All hardware access goes through the port traits in [`ports`]; real
//! Raspberry Pi GPIO lives behind the `rpi` cargo feature so the full
//! core is testable on any host.

#![deny(unused_must_use)]

pub mod adapters;
pub mod boot_guard;
pub mod call;
pub mod cancel;
pub mod command;
pub mod config;
pub mod driver;
pub mod error;
pub mod pins;
pub mod ports;
pub mod registry;
pub mod sequencer;
