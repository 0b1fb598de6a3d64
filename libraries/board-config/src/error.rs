// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

use crate::clocks::{ClockDomain, ClockNode, PllTap};
use crate::features::Dependency;
use crate::pins::{AltFunction, PinId, SignalId};

fn join<T: std::fmt::Display>(items: &[T], separator: &str) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(separator)
}

/// Errors that can occur while resolving a board configuration.
///
/// Every variant carries the offending identifiers and numeric values so it can be reported as
/// a build-time diagnostic, either through its `Display` implementation or serialized.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "error")]
pub enum ConfigError {
    #[error("Feature `{flag}` requires {requirement}.")]
    UnsatisfiedDependency {
        flag: String,
        requirement: Dependency,
    },
    #[error("Feature dependencies form a cycle: {}.", join(.flags, " -> "))]
    DependencyCycle { flags: Vec<String> },
    #[error("Signal {signal} has no pin assigned.")]
    MissingPinAssignment { signal: SignalId },
    #[error("Pin {pin} is claimed by {}.", join(.signals, ", "))]
    PinConflict { pin: PinId, signals: Vec<SignalId> },
    #[error("Pin {pin} does not exist on this package.")]
    PinUnavailable { pin: PinId },
    #[error("Pin {pin} cannot route {signal} as {alt_function}.")]
    UnsupportedAltFunction {
        signal: SignalId,
        pin: PinId,
        alt_function: AltFunction,
    },
    #[error("`{value}` is not a valid {kind}.")]
    InvalidIdentifier { kind: &'static str, value: String },
    #[error("Divider value {value} is not supported for {node}.")]
    InvalidDivider { node: ClockNode, value: u32 },
    #[error("PLL input frequency {f_in} Hz is outside the supported window.")]
    PllInputOutOfRange { f_in: u32 },
    #[error("VCO frequency {f_vco} Hz is outside the supported window.")]
    VcoOutOfRange { f_vco: u64 },
    #[error("PLL{tap} output frequency {f_out} Hz is outside the supported window.")]
    PllOutputOutOfRange { tap: PllTap, f_out: u32 },
    #[error("PLL{tap} output is used but no divider is configured for it.")]
    PllOutputNotConfigured { tap: PllTap },
    #[error("USB clock {usb_clock_hz} Hz is not within tolerance of 48MHz.")]
    UsbClockInaccurate { usb_clock_hz: u32 },
    #[error("{domain} frequency {frequency_hz} Hz exceeds the chip limit of {limit_hz} Hz.")]
    BusClockOutOfRange {
        domain: ClockDomain,
        frequency_hz: u32,
        limit_hz: u32,
    },
    #[error("No flash wait-state band covers a system clock of {system_clock_hz} Hz.")]
    NoValidWaitStateBand { system_clock_hz: u32 },
    #[error("Declared flash latency of {declared} wait states is below the required {required}.")]
    InsufficientFlashLatency { declared: u8, required: u8 },
    #[error("Feature `{feature}` conflicts with {conflicts_with}.")]
    FeatureConflict {
        feature: String,
        conflicts_with: String,
    },
    #[error("REPL transport `{transport}` is not an enabled peripheral.")]
    ReplTransportUnavailable { transport: String },
    #[error("Baud rate {baud} cannot be derived from the {clock_hz} Hz clock of {peripheral}.")]
    BaudRateUnreachable {
        peripheral: String,
        baud: u32,
        clock_hz: u32,
    },
    #[error("Peripheral `{peripheral}` is enabled but no clock is routed to it.")]
    ClockUnavailable { peripheral: String },
    #[error("MCU {mcu} is not supported.")]
    UnsupportedMcu { mcu: String },
}

/// Non-fatal diagnostics. They are carried in the resolved configuration and never block its
/// emission.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "warning")]
pub enum Warning {
    #[error("{node} is {dividend}/{divisor} Hz, truncated to {truncated_hz} Hz.")]
    ImpreciseClock {
        node: ClockNode,
        dividend: u32,
        divisor: u32,
        truncated_hz: u32,
    },
    #[error("Pin {pin} is assigned to {signal}, whose peripheral is disabled. Dropped.")]
    OrphanedPinAssignment { signal: SignalId, pin: PinId },
}

/// Errors of the whole load-and-resolve process.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Failed to read declarations: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed declarations: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
