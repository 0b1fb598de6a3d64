// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! AHB and APB bus prescalers

use crate::clocks::ClockNode;
use crate::error::ConfigError;

/// Division factor of the system clock feeding the AHB bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum AhbPrescaler {
    #[default]
    DivideBy1,
    DivideBy2,
    DivideBy4,
    DivideBy8,
    DivideBy16,
    DivideBy64,
    DivideBy128,
    DivideBy256,
    DivideBy512,
}

impl From<AhbPrescaler> for u32 {
    fn from(item: AhbPrescaler) -> u32 {
        match item {
            AhbPrescaler::DivideBy1 => 1,
            AhbPrescaler::DivideBy2 => 2,
            AhbPrescaler::DivideBy4 => 4,
            AhbPrescaler::DivideBy8 => 8,
            AhbPrescaler::DivideBy16 => 16,
            AhbPrescaler::DivideBy64 => 64,
            AhbPrescaler::DivideBy128 => 128,
            AhbPrescaler::DivideBy256 => 256,
            AhbPrescaler::DivideBy512 => 512,
        }
    }
}

impl TryFrom<u32> for AhbPrescaler {
    type Error = ConfigError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(AhbPrescaler::DivideBy1),
            2 => Ok(AhbPrescaler::DivideBy2),
            4 => Ok(AhbPrescaler::DivideBy4),
            8 => Ok(AhbPrescaler::DivideBy8),
            16 => Ok(AhbPrescaler::DivideBy16),
            64 => Ok(AhbPrescaler::DivideBy64),
            128 => Ok(AhbPrescaler::DivideBy128),
            256 => Ok(AhbPrescaler::DivideBy256),
            512 => Ok(AhbPrescaler::DivideBy512),
            _ => Err(ConfigError::InvalidDivider {
                node: ClockNode::Ahb,
                value,
            }),
        }
    }
}

/// Division factor of the AHB clock feeding an APB bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
#[serde(into = "u32")]
pub enum ApbPrescaler {
    #[default]
    DivideBy1,
    DivideBy2,
    DivideBy4,
    DivideBy8,
    DivideBy16,
}

impl From<ApbPrescaler> for u32 {
    fn from(item: ApbPrescaler) -> u32 {
        match item {
            ApbPrescaler::DivideBy1 => 1,
            ApbPrescaler::DivideBy2 => 2,
            ApbPrescaler::DivideBy4 => 4,
            ApbPrescaler::DivideBy8 => 8,
            ApbPrescaler::DivideBy16 => 16,
        }
    }
}

impl ApbPrescaler {
    /// Converts a raw division factor, attributing a bad value to the given bus.
    pub fn from_divider(node: ClockNode, value: u32) -> Result<Self, ConfigError> {
        match value {
            1 => Ok(ApbPrescaler::DivideBy1),
            2 => Ok(ApbPrescaler::DivideBy2),
            4 => Ok(ApbPrescaler::DivideBy4),
            8 => Ok(ApbPrescaler::DivideBy8),
            16 => Ok(ApbPrescaler::DivideBy16),
            _ => Err(ConfigError::InvalidDivider { node, value }),
        }
    }
}

/// Prescalers of the three system buses. All default to no division.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct BusPrescalers {
    pub ahb: AhbPrescaler,
    pub apb1: ApbPrescaler,
    pub apb2: ApbPrescaler,
}

#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct RawBusPrescalers {
    #[serde(default = "no_division")]
    ahb: u32,
    #[serde(default = "no_division")]
    apb1: u32,
    #[serde(default = "no_division")]
    apb2: u32,
}

fn no_division() -> u32 {
    1
}

impl TryFrom<RawBusPrescalers> for BusPrescalers {
    type Error = ConfigError;

    fn try_from(raw: RawBusPrescalers) -> Result<Self, Self::Error> {
        Ok(BusPrescalers {
            ahb: AhbPrescaler::try_from(raw.ahb)?,
            apb1: ApbPrescaler::from_divider(ClockNode::Apb1, raw.apb1)?,
            apb2: ApbPrescaler::from_divider(ClockNode::Apb2, raw.apb2)?,
        })
    }
}

impl<'de> serde::Deserialize<'de> for BusPrescalers {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawBusPrescalers::deserialize(deserializer)?;
        BusPrescalers::try_from(raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ahb_round_trip() {
        for divider in [1, 2, 4, 8, 16, 64, 128, 256, 512] {
            let prescaler = AhbPrescaler::try_from(divider).unwrap();
            assert_eq!(divider, u32::from(prescaler));
        }
        assert_eq!(
            Err(ConfigError::InvalidDivider {
                node: ClockNode::Ahb,
                value: 32
            }),
            AhbPrescaler::try_from(32)
        );
    }

    #[test]
    fn deserialize_buses() {
        let buses: BusPrescalers = serde_json::from_str(r#"{ "apb1": 2 }"#).unwrap();
        assert_eq!(AhbPrescaler::DivideBy1, buses.ahb);
        assert_eq!(ApbPrescaler::DivideBy2, buses.apb1);
        assert_eq!(ApbPrescaler::DivideBy1, buses.apb2);

        let error = serde_json::from_str::<BusPrescalers>(r#"{ "apb2": 3 }"#).unwrap_err();
        assert!(error.to_string().contains("APB2"));
    }
}
