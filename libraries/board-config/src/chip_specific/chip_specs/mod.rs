// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! This module contains specifications for supported chips

pub mod stm32g431;

use super::clock_constants::ClockConstants;
use super::flash::FlashChipSpecific;
use super::pins::PinCapabilities;
use super::uart::UartConstants;

/// Everything the resolver needs to know about a chip.
pub trait ChipSpecs:
    ClockConstants + FlashChipSpecific + PinCapabilities + UartConstants
{
    /// Prefix of the MCU part numbers described by this type.
    const MCU_FAMILY: &'static str;
}
