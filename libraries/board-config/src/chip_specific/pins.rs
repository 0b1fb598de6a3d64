// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Package and pin-muxing data for a particular chip

use crate::clocks::ClockDomain;
use crate::pins::{AltFunction, PeripheralKind, PinId, SignalId};

/// One row of a chip's alternate-function table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AltFunctionEntry {
    pub pin: PinId,
    pub peripheral: &'static str,
    pub signal: &'static str,
    pub alt_function: AltFunction,
}

impl AltFunctionEntry {
    pub const fn new(
        pin: PinId,
        peripheral: &'static str,
        signal: &'static str,
        alt_function: AltFunction,
    ) -> Self {
        Self {
            pin,
            peripheral,
            signal,
            alt_function,
        }
    }
}

pub trait PinCapabilities {
    /// Pins bonded out on the package
    const PACKAGE_PINS: &'static [PinId];
    /// Alternate-function routing of peripheral signals
    const ALTERNATE_FUNCTIONS: &'static [AltFunctionEntry];
    /// Bus clocking each peripheral
    const BUS_DOMAINS: &'static [(&'static str, ClockDomain)];

    fn has_pin(pin: PinId) -> bool {
        Self::PACKAGE_PINS.contains(&pin)
    }

    /// Alternate function routing `signal` to `pin`, if the chip supports it at all.
    ///
    /// LEDs are driven as plain GPIOs and can use any package pin.
    fn alternate_function(pin: PinId, signal: &SignalId) -> Option<AltFunction> {
        if PeripheralKind::of(signal.peripheral()) == PeripheralKind::Led {
            return Self::has_pin(pin).then_some(AltFunction::Gpio);
        }
        Self::ALTERNATE_FUNCTIONS
            .iter()
            .find(|entry| {
                entry.pin == pin
                    && entry.peripheral == signal.peripheral()
                    && entry.signal == signal.signal()
            })
            .map(|entry| entry.alt_function)
    }

    fn bus_domain(peripheral: &str) -> Option<ClockDomain> {
        Self::BUS_DOMAINS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(peripheral))
            .map(|(_, domain)| *domain)
    }
}
