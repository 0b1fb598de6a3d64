// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Flash timing constants for a particular chip

/// Highest system clock frequency (inclusive) a number of wait states supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitStateBand {
    pub max_frequency_hz: u32,
    pub wait_states: u8,
}

impl WaitStateBand {
    pub const fn new(max_frequency_hz: u32, wait_states: u8) -> Self {
        Self {
            max_frequency_hz,
            wait_states,
        }
    }
}

pub trait FlashChipSpecific {
    /// Wait-state bands, strictly increasing in both frequency and wait states.
    const WAIT_STATE_BANDS: &'static [WaitStateBand];
}
