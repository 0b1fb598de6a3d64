// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Board declarations, as written by the board author.
//!
//! The declarations are a JSON document describing one board:
//!
//! ```json
//! {
//!     "board_name": "xiao_stm32g431",
//!     "mcu_name": "STM32G431CB",
//!     "clocks": {
//!         "oscillator": "internal_hf",
//!         "pll": { "m": 4, "n": 85, "p": 2, "q": 8, "r": 2 },
//!         "usb": "hsi48"
//!     },
//!     "features": { "uart1": true, "led1": true, "repl": "uart1" },
//!     "dependencies": [],
//!     "pins": [
//!         { "signal": "UART1.TX", "pin": "PA9", "alt_function": "AF7" },
//!         { "signal": "UART1.RX", "pin": "PA10", "alt_function": "AF7" },
//!         { "signal": "LED1.PIN", "pin": "PC14", "alt_function": "GPIO", "polarity": "active_low" }
//!     ]
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use tracing::debug;

use crate::chip_specific::{ChipSpecs, Stm32g431Specs};
use crate::clocks::{
    self, AdcClockSource, BusPrescalers, ClockRouting, OscillatorConfig, OscillatorSource,
    PllConfig, UsbClockSource,
};
use crate::error::{ConfigError, Error};
use crate::features::{Dependency, FeatureRegistry, FeatureValue, Requirement};
use crate::pins::{AltFunction, PinId, PinTable, Polarity, SignalId};
use crate::validator::{emit, BoardIdentity, ResolvedBoardConfig};

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClockDeclarations {
    pub oscillator: OscillatorSource,
    pub pll: PllConfig,
    #[serde(default)]
    pub usb: Option<UsbClockSource>,
    #[serde(default)]
    pub adc: Option<AdcClockSource>,
    #[serde(default)]
    pub buses: BusPrescalers,
    #[serde(default)]
    pub flash_latency: Option<u8>,
}

impl ClockDeclarations {
    pub fn routing(&self) -> ClockRouting {
        ClockRouting {
            usb: self.usb,
            adc: self.adc,
            buses: self.buses,
            flash_latency: self.flash_latency,
        }
    }
}

/// `feature` requires `requires` to hold `value` whenever `feature` is enabled.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DependencyDeclaration {
    pub feature: String,
    pub requires: String,
    pub value: Requirement,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PinDeclaration {
    pub signal: SignalId,
    pub pin: PinId,
    pub alt_function: AltFunction,
    #[serde(default)]
    pub polarity: Option<Polarity>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BoardDeclarations {
    pub board_name: String,
    pub mcu_name: String,
    pub clocks: ClockDeclarations,
    #[serde(default)]
    pub features: BTreeMap<String, FeatureValue>,
    #[serde(default)]
    pub dependencies: Vec<DependencyDeclaration>,
    #[serde(default)]
    pub pins: Vec<PinDeclaration>,
    /// Baud rate of the REPL transport, when it is a UART.
    #[serde(default)]
    pub repl_baud: Option<u32>,
}

impl BoardDeclarations {
    pub fn from_json(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        debug!("Loading declarations from {}", path.display());
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    pub fn identity(&self) -> BoardIdentity {
        BoardIdentity::new(&self.board_name, &self.mcu_name)
    }

    pub fn feature_registry(&self) -> FeatureRegistry {
        let mut registry = FeatureRegistry::new();
        for (name, value) in &self.features {
            registry.register(name, value.clone());
        }
        for dependency in &self.dependencies {
            registry.declare_dependency(
                &dependency.feature,
                Dependency::new(&dependency.requires, dependency.value.clone()),
            );
        }
        registry
    }

    pub fn pin_table(&self) -> PinTable {
        let mut table = PinTable::new();
        for declaration in &self.pins {
            table.assign(
                declaration.signal.clone(),
                declaration.pin,
                declaration.alt_function,
            );
            if let Some(polarity) = declaration.polarity {
                table.set_polarity(declaration.signal.clone(), polarity);
            }
        }
        table
    }

    /// Resolve the declarations for the chip named by `mcu_name`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnsupportedMcu`] if no supported chip family prefixes `mcu_name`, otherwise
    /// the first error of [`BoardDeclarations::resolve_for`].
    pub fn resolve(&self) -> Result<ResolvedBoardConfig, ConfigError> {
        let mcu = self.mcu_name.to_ascii_uppercase();
        if mcu.starts_with(Stm32g431Specs::MCU_FAMILY) {
            self.resolve_for::<Stm32g431Specs>()
        } else {
            Err(ConfigError::UnsupportedMcu {
                mcu: self.mcu_name.clone(),
            })
        }
    }

    /// Resolve the clock tree, then validate and emit the board configuration for chip `C`.
    pub fn resolve_for<C: ChipSpecs>(&self) -> Result<ResolvedBoardConfig, ConfigError> {
        debug!("Resolving {} as {}", self.board_name, C::MCU_FAMILY);
        let clock_tree = clocks::resolve::<C>(
            &OscillatorConfig::new(self.clocks.oscillator),
            &self.clocks.pll,
            &self.clocks.routing(),
        )?;
        emit::<C>(
            &self.identity(),
            &self.feature_registry(),
            &self.pin_table(),
            &clock_tree,
            self.repl_baud,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clocks::PllTap;

    const MINIMAL: &str = r#"{
        "board_name": "minimal",
        "mcu_name": "STM32G431KB",
        "clocks": {
            "oscillator": { "external": { "frequency_hz": 8000000 } },
            "pll": { "m": 2, "n": 40, "q": 4, "r": 2 },
            "usb": { "pll": "Q" },
            "buses": { "apb1": 2 }
        },
        "features": { "usb": true, "float": true, "float_impl": "single" },
        "dependencies": [
            { "feature": "float", "requires": "float_impl", "value": ["single", "double"] }
        ]
    }"#;

    #[test]
    fn parse_and_resolve() {
        let declarations = BoardDeclarations::from_json(MINIMAL).unwrap();
        assert_eq!(
            OscillatorSource::External {
                frequency_hz: 8_000_000
            },
            declarations.clocks.oscillator
        );
        assert_eq!(
            Some(UsbClockSource::Pll(PllTap::Q)),
            declarations.clocks.usb
        );

        // 8MHz / 2 * 40 = 160MHz VCO, and PLLQ = 40MHz can't clock USB.
        assert_eq!(
            Err(ConfigError::UsbClockInaccurate {
                usb_clock_hz: 40_000_000
            }),
            declarations.resolve()
        );
    }

    #[test]
    fn usb_from_pllq() {
        let json = MINIMAL.replace(r#""n": 40"#, r#""n": 48"#);
        let config = BoardDeclarations::from_json(&json)
            .unwrap()
            .resolve()
            .unwrap();
        assert_eq!(Some(48_000_000), config.clocks.usb_clock_hz);
        assert_eq!(96_000_000, config.clocks.system_clock_hz);
        assert!(config.features.is_enabled("float"));
    }

    #[test]
    fn led_polarity() {
        let json = MINIMAL
            .replace(r#""n": 40"#, r#""n": 48"#)
            .replace(r#""usb": true,"#, r#""usb": true, "led1": true,"#)
            .replace(
                r#""dependencies""#,
                r#""pins": [{ "signal": "LED1.PIN", "pin": "PC14", "alt_function": "GPIO", "polarity": "active_low" }],
        "dependencies""#,
            );
        let config = BoardDeclarations::from_json(&json)
            .unwrap()
            .resolve()
            .unwrap();
        assert_eq!(1, config.pins.len());
        assert!(config
            .pins
            .iter()
            .all(|assignment| assignment.polarity == Some(Polarity::ActiveLow)));
    }

    #[test]
    fn unsupported_mcu() {
        let json = MINIMAL.replace("STM32G431KB", "STM32F446RE");
        assert_eq!(
            Err(ConfigError::UnsupportedMcu {
                mcu: "STM32F446RE".to_string()
            }),
            BoardDeclarations::from_json(&json).unwrap().resolve()
        );
    }

    #[test]
    fn malformed_declarations() {
        let unknown_field = MINIMAL.replace(
            r#""board_name": "minimal","#,
            r#""board_name": "minimal", "colour": "blue","#,
        );
        assert!(matches!(
            BoardDeclarations::from_json(&unknown_field),
            Err(Error::Json(_))
        ));

        let bad_prescaler = MINIMAL.replace(r#""apb1": 2"#, r#""apb1": 3"#);
        assert!(matches!(
            BoardDeclarations::from_json(&bad_prescaler),
            Err(Error::Json(_))
        ));

        let bad_polarity = MINIMAL.replace(
            r#""dependencies""#,
            r#""pins": [{ "signal": "LED1.PIN", "pin": "PC14", "alt_function": "GPIO", "polarity": "inverted" }],
        "dependencies""#,
        );
        assert!(matches!(
            BoardDeclarations::from_json(&bad_polarity),
            Err(Error::Json(_))
        ));

        let misspelled_divider = MINIMAL.replace(r#""q": 4"#, r#""qq": 4"#);
        assert!(matches!(
            BoardDeclarations::from_json(&misspelled_divider),
            Err(Error::Json(_))
        ));

        assert!(matches!(
            BoardDeclarations::from_file("/nonexistent/board.json"),
            Err(Error::Io(_))
        ));
    }
}
