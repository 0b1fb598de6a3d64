// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

use crate::chip_specific::clock_constants::SystemClockConstants;

/// Oscillator feeding the PLL
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OscillatorSource {
    /// High speed internal oscillator (HSI)
    InternalHf,
    /// Dedicated 48MHz internal oscillator (HSI48)
    InternalUsb48,
    /// External crystal or clock input (HSE)
    External { frequency_hz: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct OscillatorConfig {
    pub source: OscillatorSource,
}

impl OscillatorConfig {
    pub const fn new(source: OscillatorSource) -> Self {
        Self { source }
    }

    /// Frequency of the oscillator in Hz. Internal oscillators run at the chip's fixed rate.
    pub fn frequency_hz<C: SystemClockConstants>(&self) -> u32 {
        match self.source {
            OscillatorSource::InternalHf => C::HSI_FREQUENCY_HZ,
            OscillatorSource::InternalUsb48 => C::HSI48_FREQUENCY_HZ,
            OscillatorSource::External { frequency_hz } => frequency_hz,
        }
    }
}
