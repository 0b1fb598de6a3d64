// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Main PLL divider chain
//!
//! ```text
//! f_in  = f_osc / M
//! f_vco = f_in * N
//! f_out = f_vco / {P, Q, R}
//! ```

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use super::{divide, ClockNode, PllTap};
use crate::chip_specific::clock_constants::PllConstants;
use crate::error::{ConfigError, Warning};

/// Output dividers of the PLL. A tap without a divider is disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OutputDividers {
    pub p: Option<u32>,
    pub q: Option<u32>,
    pub r: Option<u32>,
}

impl OutputDividers {
    pub fn get(&self, tap: PllTap) -> Option<u32> {
        match tap {
            PllTap::P => self.p,
            PllTap::Q => self.q,
            PllTap::R => self.r,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(from = "RawPllConfig", into = "RawPllConfig")]
pub struct PllConfig {
    /// M
    pub input_divider: u32,
    /// N
    pub multiplier: u32,
    pub output_dividers: OutputDividers,
}

/// PLL registers as written in the declarations.
#[derive(Clone, Copy, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPllConfig {
    m: u32,
    n: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    p: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    q: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    r: Option<u32>,
}

impl From<RawPllConfig> for PllConfig {
    fn from(raw: RawPllConfig) -> Self {
        PllConfig {
            input_divider: raw.m,
            multiplier: raw.n,
            output_dividers: OutputDividers {
                p: raw.p,
                q: raw.q,
                r: raw.r,
            },
        }
    }
}

impl From<PllConfig> for RawPllConfig {
    fn from(pll: PllConfig) -> Self {
        RawPllConfig {
            m: pll.input_divider,
            n: pll.multiplier,
            p: pll.output_dividers.p,
            q: pll.output_dividers.q,
            r: pll.output_dividers.r,
        }
    }
}

pub(super) struct PllOutputs {
    pub input_hz: u32,
    pub vco_hz: u32,
    pub taps: BTreeMap<PllTap, u32>,
}

/// Run the divider chain. Taps in `consumers` are validated against their windows; the others
/// are computed when their divider is usable and left unchecked.
pub(super) fn resolve<C: PllConstants>(
    oscillator_hz: u32,
    pll: &PllConfig,
    consumers: &BTreeSet<PllTap>,
    warnings: &mut Vec<Warning>,
) -> Result<PllOutputs, ConfigError> {
    let m = pll.input_divider;
    let n = pll.multiplier;

    let input_hz = divide(ClockNode::PllInput, oscillator_hz, m, warnings)?;
    if !(C::INPUT_MIN_HZ..=C::INPUT_MAX_HZ).contains(&input_hz) {
        return Err(ConfigError::PllInputOutOfRange { f_in: input_hz });
    }

    // Computed wide so an absurd multiplier can't wrap around into the window.
    let f_vco = u64::from(input_hz) * u64::from(n);
    if !(u64::from(C::VCO_MIN_HZ)..=u64::from(C::VCO_MAX_HZ)).contains(&f_vco) {
        return Err(ConfigError::VcoOutOfRange { f_vco });
    }
    let vco_hz = u32::try_from(f_vco).map_err(|_| ConfigError::VcoOutOfRange { f_vco })?;

    if !C::INPUT_DIVIDER_RANGE.contains(&m) {
        return Err(ConfigError::InvalidDivider {
            node: ClockNode::PllInput,
            value: m,
        });
    }
    if !C::MULTIPLIER_RANGE.contains(&n) {
        return Err(ConfigError::InvalidDivider {
            node: ClockNode::Vco,
            value: n,
        });
    }
    debug!("PLL: {} Hz in, {} Hz VCO", input_hz, vco_hz);

    let mut taps = BTreeMap::new();
    for tap in PllTap::ALL {
        let divider = pll.output_dividers.get(tap);
        if consumers.contains(&tap) {
            let divider = divider.ok_or(ConfigError::PllOutputNotConfigured { tap })?;
            if !C::is_valid_output_divider(tap, divider) {
                return Err(ConfigError::InvalidDivider {
                    node: tap.into(),
                    value: divider,
                });
            }
            let f_out = divide(tap.into(), vco_hz, divider, warnings)?;
            if !C::output_window(tap).contains(&f_out) {
                return Err(ConfigError::PllOutputOutOfRange { tap, f_out });
            }
            debug!("PLL{}: {} Hz", tap, f_out);
            taps.insert(tap, f_out);
        } else if let Some(divider) = divider.filter(|&divider| divider != 0) {
            debug!("PLL{}: {} Hz (unused)", tap, vco_hz / divider);
            taps.insert(tap, vco_hz / divider);
        }
    }

    Ok(PllOutputs {
        input_hz,
        vco_hz,
        taps,
    })
}
