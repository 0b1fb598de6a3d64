// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Baud rate generator constants for a particular chip

use core::ops::RangeInclusive;

pub trait UartConstants {
    /// Division factors of the kernel clock prescaler shared by USARTs and LPUARTs (PRESC)
    const KERNEL_PRESCALERS: &'static [u32];
    /// Values accepted by the USART baud rate register, 16x oversampling: `f_ker / baud`
    const USART_BRR_RANGE: RangeInclusive<u32>;
    /// Values accepted by the LPUART baud rate register: `256 * f_ker / baud`
    const LPUART_BRR_RANGE: RangeInclusive<u32>;

    /// Baud rate register value for a UART instance, or `None` if out of range.
    fn baud_rate_register(peripheral: &str, kernel_hz: u32, baud: u32) -> Option<u32> {
        if baud == 0 {
            return None;
        }
        if peripheral.to_ascii_uppercase().starts_with("LPUART") {
            let brr = u64::from(kernel_hz) * 256 / u64::from(baud);
            u32::try_from(brr)
                .ok()
                .filter(|brr| Self::LPUART_BRR_RANGE.contains(brr))
        } else {
            Some(kernel_hz / baud).filter(|brr| Self::USART_BRR_RANGE.contains(brr))
        }
    }

    /// First kernel clock prescaler reaching `baud` from the bus clock `clock_hz`.
    fn baud_rate_prescaler(peripheral: &str, clock_hz: u32, baud: u32) -> Option<u32> {
        Self::KERNEL_PRESCALERS.iter().copied().find(|&prescaler| {
            Self::baud_rate_register(peripheral, clock_hz / prescaler, baud).is_some()
        })
    }
}
