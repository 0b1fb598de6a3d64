// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Pin/peripheral mapping table.
//!
//! Pins are opaque identifiers (`PA9`, `PC14`), never addresses. The table maps every peripheral
//! signal (`UART1.TX`) to at most one pin and enforces, at resolution time, that
//!
//! + every required signal of an enabled peripheral has a pin,
//! + no pin is claimed by two active signals,
//! + the chip can route the signal to the pin with the declared alternate function.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::chip_specific::pins::PinCapabilities;
use crate::error::ConfigError;

/// Physical pin, identified by its GPIO port letter and its number within the port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PinId {
    port: char,
    number: u8,
}

impl PinId {
    pub const fn new(port: char, number: u8) -> Self {
        Self { port, number }
    }
}

impl fmt::Display for PinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}{}", self.port, self.number)
    }
}

impl FromStr for PinId {
    type Err = ConfigError;

    /// Accepts both `PA9` and the shorter `A9` spelling.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidIdentifier {
            kind: "pin",
            value: s.to_string(),
        };
        let upper = s.trim().to_ascii_uppercase();
        let mut name = upper.as_str();
        if name.len() > 2
            && name.starts_with('P')
            && name.as_bytes()[1].is_ascii_alphabetic()
        {
            name = &name[1..];
        }

        let mut chars = name.chars();
        let port = chars.next().ok_or_else(invalid)?;
        if !('A'..='K').contains(&port) {
            return Err(invalid());
        }
        let number: u8 = chars.as_str().parse().map_err(|_| invalid())?;
        if number > 15 {
            return Err(invalid());
        }
        Ok(PinId::new(port, number))
    }
}

impl TryFrom<String> for PinId {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PinId> for String {
    fn from(pin: PinId) -> String {
        pin.to_string()
    }
}

/// A peripheral signal such as `UART1.TX`.
///
/// The peripheral part also names the feature flag that enables the peripheral, lower-cased:
/// `UART1.TX` is gated by the `uart1` flag.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SignalId {
    peripheral: String,
    signal: String,
}

impl SignalId {
    pub fn new(peripheral: &str, signal: &str) -> Self {
        Self {
            peripheral: peripheral.to_ascii_uppercase(),
            signal: signal.to_ascii_uppercase(),
        }
    }

    pub fn peripheral(&self) -> &str {
        &self.peripheral
    }

    pub fn signal(&self) -> &str {
        &self.signal
    }

    /// Name of the feature flag gating this signal's peripheral.
    pub fn feature_name(&self) -> String {
        self.peripheral.to_ascii_lowercase()
    }
}

impl fmt::Display for SignalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.peripheral, self.signal)
    }
}

impl FromStr for SignalId {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let valid_part = |part: &str| {
            !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        };
        match s.trim().split_once('.') {
            Some((peripheral, signal)) if valid_part(peripheral) && valid_part(signal) => {
                Ok(SignalId::new(peripheral, signal))
            }
            _ => Err(ConfigError::InvalidIdentifier {
                kind: "peripheral signal",
                value: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for SignalId {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SignalId> for String {
    fn from(signal: SignalId) -> String {
        signal.to_string()
    }
}

/// Function a pin is muxed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AltFunction {
    /// Plain software-controlled GPIO.
    Gpio,
    /// Alternate function number 0-15.
    Af(u8),
}

impl fmt::Display for AltFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AltFunction::Gpio => write!(f, "GPIO"),
            AltFunction::Af(number) => write!(f, "AF{}", number),
        }
    }
}

impl FromStr for AltFunction {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        if upper == "GPIO" {
            return Ok(AltFunction::Gpio);
        }
        match upper.strip_prefix("AF").map(str::parse::<u8>) {
            Some(Ok(number)) if number <= 15 => Ok(AltFunction::Af(number)),
            _ => Err(ConfigError::InvalidIdentifier {
                kind: "alternate function",
                value: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for AltFunction {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AltFunction> for String {
    fn from(alt_function: AltFunction) -> String {
        alt_function.to_string()
    }
}

/// Kinds of peripherals whose pins are tracked by the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeripheralKind {
    Uart,
    I2c,
    Spi,
    Led,
    /// Anything without pin requirements (USB, ADC, RTC, software features...).
    Other,
}

impl PeripheralKind {
    /// Classify a peripheral (or feature flag) name such as `uart1` or `I2C1`.
    ///
    /// Only a known prefix followed by an instance number is a pin-carrying peripheral.
    pub fn of(peripheral: &str) -> Self {
        const PREFIXES: [(&str, PeripheralKind); 6] = [
            ("LPUART", PeripheralKind::Uart),
            ("USART", PeripheralKind::Uart),
            ("UART", PeripheralKind::Uart),
            ("I2C", PeripheralKind::I2c),
            ("SPI", PeripheralKind::Spi),
            ("LED", PeripheralKind::Led),
        ];

        let upper = peripheral.to_ascii_uppercase();
        for (prefix, kind) in PREFIXES {
            if let Some(instance) = upper.strip_prefix(prefix) {
                if !instance.is_empty() && instance.chars().all(|c| c.is_ascii_digit()) {
                    return kind;
                }
            }
        }
        PeripheralKind::Other
    }

    /// Signals that must be assigned to a pin when the peripheral is enabled.
    pub fn required_signals(self) -> &'static [&'static str] {
        match self {
            PeripheralKind::Uart => &["TX", "RX"],
            PeripheralKind::I2c => &["SCL", "SDA"],
            PeripheralKind::Spi => &["SCK", "MISO", "MOSI"],
            PeripheralKind::Led => &["PIN"],
            PeripheralKind::Other => &[],
        }
    }
}

/// Level at which a GPIO output is considered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    ActiveHigh,
    ActiveLow,
}

/// A resolved signal-to-pin mapping.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, serde::Serialize)]
pub struct PinAssignment {
    pub signal: SignalId,
    pub pin: PinId,
    pub alt_function: AltFunction,
    /// Always set for LEDs, active high unless declared otherwise.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub polarity: Option<Polarity>,
}

/// Result of [`PinTable::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPins {
    /// Assignments of enabled peripherals.
    pub assignments: BTreeSet<PinAssignment>,
    /// Assignments left inert because their peripheral is disabled.
    pub dropped: Vec<PinAssignment>,
}

/// Declared signal-to-pin mappings, keyed by signal.
#[derive(Debug, Default, Clone)]
pub struct PinTable {
    assignments: BTreeMap<SignalId, (PinId, AltFunction)>,
    polarities: BTreeMap<SignalId, Polarity>,
}

impl PinTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a pin to a signal, replacing any previous assignment of that signal.
    pub fn assign(&mut self, signal: SignalId, pin: PinId, alt_function: AltFunction) {
        self.assignments.insert(signal, (pin, alt_function));
    }

    /// Record the active level of a signal's pin.
    pub fn set_polarity(&mut self, signal: SignalId, polarity: Polarity) {
        self.polarities.insert(signal, polarity);
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Resolve the table against the set of enabled feature flags.
    ///
    /// # Errors
    ///
    /// + [`ConfigError::MissingPinAssignment`]: a required signal of an enabled peripheral has no
    /// pin
    /// + [`ConfigError::PinConflict`]: two active signals share a pin
    pub fn resolve(
        &self,
        enabled_peripherals: &BTreeSet<String>,
    ) -> Result<ResolvedPins, ConfigError> {
        let mut assignments = BTreeSet::new();
        let mut dropped = Vec::new();
        for (signal, (pin, alt_function)) in &self.assignments {
            let declared = self.polarities.get(signal).copied();
            let polarity = match PeripheralKind::of(signal.peripheral()) {
                PeripheralKind::Led => declared.or(Some(Polarity::ActiveHigh)),
                _ => declared,
            };
            let assignment = PinAssignment {
                signal: signal.clone(),
                pin: *pin,
                alt_function: *alt_function,
                polarity,
            };
            if enabled_peripherals.contains(&signal.feature_name()) {
                assignments.insert(assignment);
            } else {
                debug!("{} on {} belongs to a disabled peripheral", signal, pin);
                dropped.push(assignment);
            }
        }

        for peripheral in enabled_peripherals {
            for required in PeripheralKind::of(peripheral).required_signals() {
                let signal = SignalId::new(peripheral, required);
                if !self.assignments.contains_key(&signal) {
                    return Err(ConfigError::MissingPinAssignment { signal });
                }
            }
        }

        let mut claims: BTreeMap<PinId, Vec<SignalId>> = BTreeMap::new();
        for assignment in &assignments {
            claims
                .entry(assignment.pin)
                .or_default()
                .push(assignment.signal.clone());
        }
        if let Some((pin, signals)) = claims.into_iter().find(|(_, signals)| signals.len() > 1) {
            return Err(ConfigError::PinConflict { pin, signals });
        }

        Ok(ResolvedPins {
            assignments,
            dropped,
        })
    }
}

/// Check that the chip can actually route every assignment.
///
/// # Errors
///
/// + [`ConfigError::PinUnavailable`]: the pin is not bonded out on the package
/// + [`ConfigError::UnsupportedAltFunction`]: the pin cannot carry the signal, or not with the
/// declared alternate function
pub fn verify_capabilities<C: PinCapabilities>(
    assignments: &BTreeSet<PinAssignment>,
) -> Result<(), ConfigError> {
    for assignment in assignments {
        if !C::has_pin(assignment.pin) {
            return Err(ConfigError::PinUnavailable {
                pin: assignment.pin,
            });
        }
        let routed = C::alternate_function(assignment.pin, &assignment.signal);
        if routed != Some(assignment.alt_function) {
            return Err(ConfigError::UnsupportedAltFunction {
                signal: assignment.signal.clone(),
                pin: assignment.pin,
                alt_function: assignment.alt_function,
            });
        }
    }
    Ok(())
}
