// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Clock-related constants for a particular chip

use core::ops::RangeInclusive;

use crate::clocks::PllTap;

/// PLL-related constants for a specific chip
pub trait PllConstants {
    /// Minimum PLL input frequency (after the input divider) in Hz
    const INPUT_MIN_HZ: u32;
    /// Maximum PLL input frequency (after the input divider) in Hz
    const INPUT_MAX_HZ: u32;
    /// Minimum VCO output frequency in Hz
    const VCO_MIN_HZ: u32;
    /// Maximum VCO output frequency in Hz
    const VCO_MAX_HZ: u32;
    /// Values accepted by the input divider register
    const INPUT_DIVIDER_RANGE: RangeInclusive<u32>;
    /// Values accepted by the multiplier register
    const MULTIPLIER_RANGE: RangeInclusive<u32>;
    /// Output tap driving the system clock
    const SYSTEM_CLOCK_TAP: PllTap;

    /// Frequency window of an output tap, in Hz
    fn output_window(tap: PllTap) -> RangeInclusive<u32>;

    /// Whether the output divider register of a tap accepts the given value
    fn is_valid_output_divider(tap: PllTap, divider: u32) -> bool;
}

/// Generic clock constants for a specific chip
pub trait SystemClockConstants {
    /// Frequency of the high speed internal oscillator in Hz
    const HSI_FREQUENCY_HZ: u32;
    /// Frequency of the dedicated 48MHz internal oscillator in Hz
    const HSI48_FREQUENCY_HZ: u32;
    /// Maximum allowed system clock frequency in Hz
    const SYS_CLOCK_FREQUENCY_LIMIT_HZ: u32;
    /// Maximum allowed AHB frequency in Hz
    const AHB_FREQUENCY_LIMIT_HZ: u32;
    /// Maximum allowed APB1 frequency in Hz
    const APB1_FREQUENCY_LIMIT_HZ: u32;
    /// Maximum allowed APB2 frequency in Hz
    const APB2_FREQUENCY_LIMIT_HZ: u32;
    /// Frequency required by the USB full-speed peripheral in Hz
    const USB_FREQUENCY_HZ: u32 = 48_000_000;
    /// Accepted deviation of the USB clock, in parts per million
    const USB_TOLERANCE_PPM: u32 = 2_500;
}

/// Clock constants for a specific chip
pub trait ClockConstants: SystemClockConstants + PllConstants {}

impl<T: SystemClockConstants + PllConstants> ClockConstants for T {}
