// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Clock tree resolver
//!
//! Derives every clock frequency of the board from the oscillator and the PLL configuration:
//!
//! ```text
//! oscillator ──/M──> PLL input ──xN──> VCO ──/P──> PLLP
//!                                          ├─/Q──> PLLQ
//!                                          └─/R──> PLLR
//!
//! system clock ──/AHB──> AHB ──/APB1──> APB1
//!                            └─/APB2──> APB2
//! ```
//!
//! One of the PLL taps (a chip constant) drives the system clock. The USB and ADC domains are
//! routed either to a PLL tap or to a dedicated source. A tap is only validated against its
//! frequency window when something consumes it; the other taps are computed and reported as-is.
//!
//! All arithmetic is integer. A division that is not exact is truncated and recorded as a
//! [`Warning::ImpreciseClock`].

mod bus;
mod flash;
mod oscillator;
mod pll;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use tracing::{debug, warn};

use crate::chip_specific::clock_constants::{ClockConstants, SystemClockConstants};
use crate::chip_specific::flash::FlashChipSpecific;
use crate::error::{ConfigError, Warning};

pub use bus::{AhbPrescaler, ApbPrescaler, BusPrescalers};
pub use flash::wait_states_for;
pub use oscillator::{OscillatorConfig, OscillatorSource};
pub use pll::{OutputDividers, PllConfig};

/// PLL output taps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(serde::Serialize, serde::Deserialize)]
pub enum PllTap {
    P,
    Q,
    R,
}

impl PllTap {
    pub const ALL: [PllTap; 3] = [PllTap::P, PllTap::Q, PllTap::R];
}

impl fmt::Display for PllTap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PllTap::P => write!(f, "P"),
            PllTap::Q => write!(f, "Q"),
            PllTap::R => write!(f, "R"),
        }
    }
}

/// Every node of the clock tree produced by a division or multiplication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
pub enum ClockNode {
    PllInput,
    Vco,
    PllP,
    PllQ,
    PllR,
    Ahb,
    Apb1,
    Apb2,
}

impl From<PllTap> for ClockNode {
    fn from(tap: PllTap) -> Self {
        match tap {
            PllTap::P => ClockNode::PllP,
            PllTap::Q => ClockNode::PllQ,
            PllTap::R => ClockNode::PllR,
        }
    }
}

impl fmt::Display for ClockNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ClockNode::PllInput => "PLL input",
            ClockNode::Vco => "VCO",
            ClockNode::PllP => "PLLP",
            ClockNode::PllQ => "PLLQ",
            ClockNode::PllR => "PLLR",
            ClockNode::Ahb => "AHB",
            ClockNode::Apb1 => "APB1",
            ClockNode::Apb2 => "APB2",
        };
        write!(f, "{}", name)
    }
}

/// Peripheral clock domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ClockDomain {
    Ahb,
    Apb1,
    Apb2,
    /// Kernel clock fed to the ADC. The ADC's own prescaler (CKMODE/PRESC) divides it further and
    /// is programmed by the firmware, so this domain has no limit of its own.
    Adc,
}

impl fmt::Display for ClockDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ClockDomain::Ahb => "AHB",
            ClockDomain::Apb1 => "APB1",
            ClockDomain::Apb2 => "APB2",
            ClockDomain::Adc => "ADC",
        };
        write!(f, "{}", name)
    }
}

/// Source of the 48MHz USB clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsbClockSource {
    /// Dedicated 48MHz internal oscillator, independent of the PLL.
    Hsi48,
    /// A PLL output tap.
    Pll(PllTap),
}

/// Source of the ADC kernel clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdcClockSource {
    SystemClock,
    Pll(PllTap),
}

/// Which consumers are attached to which clock nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClockRouting {
    /// No USB clock when `None`.
    pub usb: Option<UsbClockSource>,
    /// The system clock when `None`.
    pub adc: Option<AdcClockSource>,
    pub buses: BusPrescalers,
    /// Flash latency imposed by the board, at least the one required by the system clock.
    pub flash_latency: Option<u8>,
}

impl ClockRouting {
    /// PLL taps that have a consumer and must therefore be validated.
    pub fn pll_consumers<C: ClockConstants>(&self) -> BTreeSet<PllTap> {
        let mut consumers = BTreeSet::from([C::SYSTEM_CLOCK_TAP]);
        if let Some(UsbClockSource::Pll(tap)) = self.usb {
            consumers.insert(tap);
        }
        if let Some(AdcClockSource::Pll(tap)) = self.adc {
            consumers.insert(tap);
        }
        consumers
    }
}

/// Frequencies of the whole clock tree. Immutable once computed.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ResolvedClockTree {
    pub oscillator_hz: u32,
    pub pll_input_hz: u32,
    pub vco_hz: u32,
    /// Every configured tap, validated or not.
    pub pll_outputs: BTreeMap<PllTap, u32>,
    pub system_clock_hz: u32,
    pub usb_clock_hz: Option<u32>,
    pub peripheral_clock_hz: BTreeMap<ClockDomain, u32>,
    pub flash_wait_states: u8,
    /// Also carried by the board artifact, which reports every warning in one place.
    #[serde(skip_serializing)]
    pub warnings: Vec<Warning>,
}

impl ResolvedClockTree {
    pub fn domain_hz(&self, domain: ClockDomain) -> Option<u32> {
        self.peripheral_clock_hz.get(&domain).copied()
    }
}

// Divide a frequency, recording a warning if the result had to be truncated.
fn divide(
    node: ClockNode,
    dividend: u32,
    divisor: u32,
    warnings: &mut Vec<Warning>,
) -> Result<u32, ConfigError> {
    if divisor == 0 {
        return Err(ConfigError::InvalidDivider { node, value: 0 });
    }
    let quotient = dividend / divisor;
    if dividend % divisor != 0 {
        let warning = Warning::ImpreciseClock {
            node,
            dividend,
            divisor,
            truncated_hz: quotient,
        };
        warn!("{}", warning);
        warnings.push(warning);
    }
    Ok(quotient)
}

fn check_limit(domain: ClockDomain, frequency_hz: u32, limit_hz: u32) -> Result<u32, ConfigError> {
    if frequency_hz > limit_hz {
        return Err(ConfigError::BusClockOutOfRange {
            domain,
            frequency_hz,
            limit_hz,
        });
    }
    debug!("{} clock: {} Hz", domain, frequency_hz);
    Ok(frequency_hz)
}

fn check_usb_accuracy<C: SystemClockConstants>(usb_clock_hz: u32) -> Result<u32, ConfigError> {
    let deviation = u64::from(usb_clock_hz.abs_diff(C::USB_FREQUENCY_HZ)) * 1_000_000;
    if deviation > u64::from(C::USB_TOLERANCE_PPM) * u64::from(C::USB_FREQUENCY_HZ) {
        return Err(ConfigError::UsbClockInaccurate { usb_clock_hz });
    }
    Ok(usb_clock_hz)
}

/// Resolve the clock tree of a chip.
///
/// # Errors
///
/// + [`ConfigError::InvalidDivider`]: a divider or multiplier the chip registers can't hold
/// + [`ConfigError::PllInputOutOfRange`], [`ConfigError::VcoOutOfRange`],
/// [`ConfigError::PllOutputOutOfRange`]: a PLL stage outside its documented window
/// + [`ConfigError::PllOutputNotConfigured`]: a consumed tap without a divider
/// + [`ConfigError::UsbClockInaccurate`]: a PLL-derived USB clock too far from 48MHz
/// + [`ConfigError::BusClockOutOfRange`]: AHB, APB1 or APB2 above the chip limit. The ADC kernel
/// clock is a system clock or a validated PLL tap and is not checked again.
/// + [`ConfigError::NoValidWaitStateBand`]: system clock above the flash timing table
/// + [`ConfigError::InsufficientFlashLatency`]: declared flash latency too low
pub fn resolve<C: ClockConstants + FlashChipSpecific>(
    osc: &OscillatorConfig,
    pll: &PllConfig,
    routing: &ClockRouting,
) -> Result<ResolvedClockTree, ConfigError> {
    let mut warnings = Vec::new();

    let oscillator_hz = osc.frequency_hz::<C>();
    debug!("{:?} oscillator: {} Hz", osc.source, oscillator_hz);

    let consumers = routing.pll_consumers::<C>();
    let outputs = pll::resolve::<C>(oscillator_hz, pll, &consumers, &mut warnings)?;
    let tap_hz = |tap: PllTap| {
        outputs
            .taps
            .get(&tap)
            .copied()
            .ok_or(ConfigError::PllOutputNotConfigured { tap })
    };

    let system_clock_hz = tap_hz(C::SYSTEM_CLOCK_TAP)?;
    debug!("System clock: {} Hz", system_clock_hz);

    let usb_clock_hz = match routing.usb {
        None => None,
        Some(UsbClockSource::Hsi48) => Some(C::HSI48_FREQUENCY_HZ),
        Some(UsbClockSource::Pll(tap)) => Some(check_usb_accuracy::<C>(tap_hz(tap)?)?),
    };
    if let Some(usb_clock_hz) = usb_clock_hz {
        debug!("USB clock: {} Hz", usb_clock_hz);
    }

    let buses = routing.buses;
    let ahb = divide(ClockNode::Ahb, system_clock_hz, buses.ahb.into(), &mut warnings)?;
    let ahb = check_limit(ClockDomain::Ahb, ahb, C::AHB_FREQUENCY_LIMIT_HZ)?;
    let apb1 = divide(ClockNode::Apb1, ahb, buses.apb1.into(), &mut warnings)?;
    let apb1 = check_limit(ClockDomain::Apb1, apb1, C::APB1_FREQUENCY_LIMIT_HZ)?;
    let apb2 = divide(ClockNode::Apb2, ahb, buses.apb2.into(), &mut warnings)?;
    let apb2 = check_limit(ClockDomain::Apb2, apb2, C::APB2_FREQUENCY_LIMIT_HZ)?;
    let adc = match routing.adc.unwrap_or(AdcClockSource::SystemClock) {
        AdcClockSource::SystemClock => system_clock_hz,
        AdcClockSource::Pll(tap) => tap_hz(tap)?,
    };
    debug!("ADC kernel clock: {} Hz", adc);

    let required = wait_states_for(C::WAIT_STATE_BANDS, system_clock_hz)?;
    let flash_wait_states = match routing.flash_latency {
        Some(declared) if declared < required => {
            return Err(ConfigError::InsufficientFlashLatency { declared, required });
        }
        Some(declared) => declared,
        None => required,
    };
    debug!(
        "Flash latency: {} wait states ({} required)",
        flash_wait_states, required
    );

    Ok(ResolvedClockTree {
        oscillator_hz,
        pll_input_hz: outputs.input_hz,
        vco_hz: outputs.vco_hz,
        pll_outputs: outputs.taps,
        system_clock_hz,
        usb_clock_hz,
        peripheral_clock_hz: BTreeMap::from([
            (ClockDomain::Ahb, ahb),
            (ClockDomain::Apb1, apb1),
            (ClockDomain::Apb2, apb2),
            (ClockDomain::Adc, adc),
        ]),
        flash_wait_states,
        warnings,
    })
}
