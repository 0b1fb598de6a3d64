// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

use crate::chip_specific::flash::WaitStateBand;
use crate::error::ConfigError;

/// Number of flash wait states needed at the given system clock frequency.
///
/// The first band whose ceiling is at least `system_clock_hz` wins.
pub fn wait_states_for(bands: &[WaitStateBand], system_clock_hz: u32) -> Result<u8, ConfigError> {
    bands
        .iter()
        .find(|band| system_clock_hz <= band.max_frequency_hz)
        .map(|band| band.wait_states)
        .ok_or(ConfigError::NoValidWaitStateBand { system_clock_hz })
}
