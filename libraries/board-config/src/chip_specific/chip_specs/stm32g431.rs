// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! STM32G431 specifications
//!
//! Limits are those of voltage range 1 in boost mode, the only mode reaching 170MHz. The package
//! is the 32-pin UFQFPN of the STM32G431KB.

use core::ops::RangeInclusive;

use super::ChipSpecs;
use crate::chip_specific::clock_constants::{PllConstants, SystemClockConstants};
use crate::chip_specific::flash::{FlashChipSpecific, WaitStateBand};
use crate::chip_specific::pins::{AltFunctionEntry, PinCapabilities};
use crate::chip_specific::uart::UartConstants;
use crate::clocks::{ClockDomain, PllTap};
use crate::pins::{AltFunction, PinId};

pub enum Stm32g431Specs {}

impl ChipSpecs for Stm32g431Specs {
    const MCU_FAMILY: &'static str = "STM32G431";
}

impl PllConstants for Stm32g431Specs {
    const INPUT_MIN_HZ: u32 = 2_660_000;
    const INPUT_MAX_HZ: u32 = 16_000_000;
    const VCO_MIN_HZ: u32 = 96_000_000;
    const VCO_MAX_HZ: u32 = 344_000_000;
    const INPUT_DIVIDER_RANGE: RangeInclusive<u32> = 1..=16;
    const MULTIPLIER_RANGE: RangeInclusive<u32> = 8..=127;
    const SYSTEM_CLOCK_TAP: PllTap = PllTap::R;

    fn output_window(tap: PllTap) -> RangeInclusive<u32> {
        match tap {
            PllTap::P => 2_064_500..=170_000_000,
            PllTap::Q => 8_000_000..=170_000_000,
            PllTap::R => 8_000_000..=Self::SYS_CLOCK_FREQUENCY_LIMIT_HZ,
        }
    }

    fn is_valid_output_divider(tap: PllTap, divider: u32) -> bool {
        match tap {
            PllTap::P => (2..=31).contains(&divider),
            PllTap::Q | PllTap::R => matches!(divider, 2 | 4 | 6 | 8),
        }
    }
}

impl SystemClockConstants for Stm32g431Specs {
    const HSI_FREQUENCY_HZ: u32 = 16_000_000;
    const HSI48_FREQUENCY_HZ: u32 = 48_000_000;
    const SYS_CLOCK_FREQUENCY_LIMIT_HZ: u32 = 170_000_000;
    const AHB_FREQUENCY_LIMIT_HZ: u32 = 170_000_000;
    const APB1_FREQUENCY_LIMIT_HZ: u32 = 170_000_000;
    const APB2_FREQUENCY_LIMIT_HZ: u32 = 170_000_000;
}

impl FlashChipSpecific for Stm32g431Specs {
    const WAIT_STATE_BANDS: &'static [WaitStateBand] = &[
        WaitStateBand::new(34_000_000, 0),
        WaitStateBand::new(68_000_000, 1),
        WaitStateBand::new(102_000_000, 2),
        WaitStateBand::new(136_000_000, 3),
        WaitStateBand::new(170_000_000, 4),
    ];
}

impl UartConstants for Stm32g431Specs {
    const KERNEL_PRESCALERS: &'static [u32] = &[1, 2, 4, 6, 8, 10, 12, 16, 32, 64, 128, 256];
    const USART_BRR_RANGE: RangeInclusive<u32> = 16..=0xFFFF;
    const LPUART_BRR_RANGE: RangeInclusive<u32> = 0x300..=0xF_FFFF;
}

const fn pa(number: u8) -> PinId {
    PinId::new('A', number)
}

const fn pb(number: u8) -> PinId {
    PinId::new('B', number)
}

const fn af(
    pin: PinId,
    peripheral: &'static str,
    signal: &'static str,
    number: u8,
) -> AltFunctionEntry {
    AltFunctionEntry::new(pin, peripheral, signal, AltFunction::Af(number))
}

impl PinCapabilities for Stm32g431Specs {
    const PACKAGE_PINS: &'static [PinId] = &[
        pa(0),
        pa(1),
        pa(2),
        pa(3),
        pa(4),
        pa(5),
        pa(6),
        pa(7),
        pa(8),
        pa(9),
        pa(10),
        pa(11),
        pa(12),
        pa(13),
        pa(14),
        pa(15),
        pb(0),
        pb(3),
        pb(4),
        pb(5),
        pb(6),
        pb(7),
        pb(8),
        PinId::new('C', 14),
        PinId::new('C', 15),
        PinId::new('F', 0),
        PinId::new('F', 1),
        PinId::new('G', 10),
    ];

    const ALTERNATE_FUNCTIONS: &'static [AltFunctionEntry] = &[
        // USART1
        af(pa(9), "UART1", "TX", 7),
        af(pb(6), "UART1", "TX", 7),
        af(pa(10), "UART1", "RX", 7),
        af(pb(7), "UART1", "RX", 7),
        // USART2
        af(pa(2), "UART2", "TX", 7),
        af(pa(14), "UART2", "TX", 7),
        af(pb(3), "UART2", "TX", 7),
        af(pa(3), "UART2", "RX", 7),
        af(pa(15), "UART2", "RX", 7),
        af(pb(4), "UART2", "RX", 7),
        // LPUART1
        af(pa(2), "LPUART1", "TX", 12),
        af(pa(3), "LPUART1", "RX", 12),
        // I2C1
        af(pa(13), "I2C1", "SCL", 4),
        af(pa(15), "I2C1", "SCL", 4),
        af(pb(8), "I2C1", "SCL", 4),
        af(pa(14), "I2C1", "SDA", 4),
        af(pb(7), "I2C1", "SDA", 4),
        // I2C2
        af(pa(9), "I2C2", "SCL", 4),
        af(pa(8), "I2C2", "SDA", 4),
        // SPI1
        af(pa(5), "SPI1", "SCK", 5),
        af(pb(3), "SPI1", "SCK", 5),
        af(pa(6), "SPI1", "MISO", 5),
        af(pb(4), "SPI1", "MISO", 5),
        af(pa(7), "SPI1", "MOSI", 5),
        af(pb(5), "SPI1", "MOSI", 5),
    ];

    const BUS_DOMAINS: &'static [(&'static str, ClockDomain)] = &[
        ("UART1", ClockDomain::Apb2),
        ("UART2", ClockDomain::Apb1),
        ("LPUART1", ClockDomain::Apb1),
        ("I2C1", ClockDomain::Apb1),
        ("I2C2", ClockDomain::Apb1),
        ("SPI1", ClockDomain::Apb2),
    ];
}
