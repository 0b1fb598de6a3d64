// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Configuration validator and emitter.
//!
//! Cross-checks the feature flags, the pin table and the resolved clock tree against each other
//! and against the chip, then freezes the result into a [`ResolvedBoardConfig`]. The first
//! violation aborts the emission; warnings are collected into the artifact.

use std::collections::BTreeSet;
use std::fmt::Write as _;

use tracing::{debug, info, warn};

use crate::chip_specific::pins::PinCapabilities;
use crate::chip_specific::uart::UartConstants;
use crate::chip_specific::ChipSpecs;
use crate::clocks::ResolvedClockTree;
use crate::error::{ConfigError, Warning};
use crate::features::{FeatureRegistry, FeatureSet, FeatureValue, FLOAT, FLOAT_IMPL, REPL, USB};
use crate::pins::{verify_capabilities, PeripheralKind, PinAssignment, PinTable};

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BoardIdentity {
    pub board_name: String,
    pub mcu_name: String,
}

impl BoardIdentity {
    pub fn new(board_name: &str, mcu_name: &str) -> Self {
        Self {
            board_name: board_name.to_string(),
            mcu_name: mcu_name.to_string(),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let is_identifier = |name: &str| {
            !name.is_empty()
                && name
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        };
        if !is_identifier(&self.board_name) {
            return Err(ConfigError::InvalidIdentifier {
                kind: "board name",
                value: self.board_name.clone(),
            });
        }
        if !is_identifier(&self.mcu_name) {
            return Err(ConfigError::InvalidIdentifier {
                kind: "MCU name",
                value: self.mcu_name.clone(),
            });
        }
        Ok(())
    }
}

/// Console transport selected by the `repl` flag.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ReplConfig {
    pub transport: String,
    pub baud: Option<u32>,
    /// Kernel clock prescaler of the UART reaching `baud`.
    pub prescaler: Option<u32>,
}

/// The validated board configuration consumed by the firmware build.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ResolvedBoardConfig {
    pub board_name: String,
    pub mcu_name: String,
    pub clocks: ResolvedClockTree,
    pub features: FeatureSet,
    pub pins: BTreeSet<PinAssignment>,
    pub repl: Option<ReplConfig>,
    pub warnings: Vec<Warning>,
}

impl ResolvedBoardConfig {
    /// Render the configuration as build script output.
    pub fn cargo_directives(&self) -> String {
        let mut out = String::new();
        for flag in self.features.iter().filter(|flag| flag.value.is_enabled()) {
            // Writing into a String can't fail.
            let _ = match &flag.value {
                FeatureValue::Bool(_) => {
                    writeln!(out, "cargo:rustc-cfg=board_feature=\"{}\"", flag.name)
                }
                FeatureValue::Choice(choice) => {
                    writeln!(out, "cargo:rustc-cfg=board_{}=\"{}\"", flag.name, choice)
                }
            };
        }
        let _ = writeln!(out, "cargo:rustc-env=BOARD_NAME={}", self.board_name);
        let _ = writeln!(out, "cargo:rustc-env=BOARD_MCU={}", self.mcu_name);
        let _ = writeln!(
            out,
            "cargo:rustc-env=BOARD_SYSCLK_HZ={}",
            self.clocks.system_clock_hz
        );
        let _ = writeln!(
            out,
            "cargo:rustc-env=BOARD_FLASH_LATENCY={}",
            self.clocks.flash_wait_states
        );
        out
    }
}

fn check_float(features: &FeatureSet) -> Result<(), ConfigError> {
    if features.is_enabled(FLOAT) && !features.is_enabled(FLOAT_IMPL) {
        let backend = features
            .value(FLOAT_IMPL)
            .map_or_else(|| "absent".to_string(), ToString::to_string);
        return Err(ConfigError::FeatureConflict {
            feature: FLOAT.to_string(),
            conflicts_with: format!("`{}` = {}", FLOAT_IMPL, backend),
        });
    }
    Ok(())
}

fn check_repl<C: PinCapabilities + UartConstants>(
    features: &FeatureSet,
    clock_tree: &ResolvedClockTree,
    baud: Option<u32>,
) -> Result<Option<ReplConfig>, ConfigError> {
    let transport = match features.value(REPL) {
        None => return Ok(None),
        Some(value) if !value.is_enabled() && value.as_choice().is_some() => return Ok(None),
        Some(value) => match value.as_choice() {
            Some(transport) => transport.to_ascii_lowercase(),
            None => {
                return Err(ConfigError::ReplTransportUnavailable {
                    transport: value.to_string(),
                })
            }
        },
    };
    if !features.is_enabled(&transport) {
        return Err(ConfigError::ReplTransportUnavailable { transport });
    }

    let mut prescaler = None;
    if let (PeripheralKind::Uart, Some(baud)) = (PeripheralKind::of(&transport), baud) {
        let domain = C::bus_domain(&transport).ok_or_else(|| ConfigError::ClockUnavailable {
            peripheral: transport.clone(),
        })?;
        let clock_hz = clock_tree
            .domain_hz(domain)
            .ok_or_else(|| ConfigError::ClockUnavailable {
                peripheral: transport.clone(),
            })?;
        let Some(found) = C::baud_rate_prescaler(&transport, clock_hz, baud) else {
            return Err(ConfigError::BaudRateUnreachable {
                peripheral: transport,
                baud,
                clock_hz,
            });
        };
        debug!(
            "REPL on {}: {} baud from {} Hz {} / {}",
            transport, baud, clock_hz, domain, found
        );
        prescaler = Some(found);
    }

    Ok(Some(ReplConfig {
        transport,
        baud,
        prescaler,
    }))
}

/// Validate everything against everything and produce the immutable board configuration.
///
/// Pure: identical inputs always produce an identical artifact or an identical error.
///
/// # Errors
///
/// The first of
///
/// + any error of [`FeatureRegistry::resolve`]
/// + [`ConfigError::FeatureConflict`]: `float` enabled without a `float_impl` backend
/// + any error of [`PinTable::resolve`] and [`verify_capabilities`]
/// + [`ConfigError::ReplTransportUnavailable`]: `repl` names a disabled transport
/// + [`ConfigError::BaudRateUnreachable`]: the REPL UART can't derive `repl_baud`
/// + [`ConfigError::ClockUnavailable`]: `usb` enabled without a USB clock
pub fn emit<C: ChipSpecs>(
    identity: &BoardIdentity,
    flags: &FeatureRegistry,
    pins: &PinTable,
    clock_tree: &ResolvedClockTree,
    repl_baud: Option<u32>,
) -> Result<ResolvedBoardConfig, ConfigError> {
    identity.validate()?;

    let features = flags.resolve()?;
    check_float(&features)?;

    let resolved_pins = pins.resolve(&features.enabled())?;
    verify_capabilities::<C>(&resolved_pins.assignments)?;

    let repl = check_repl::<C>(&features, clock_tree, repl_baud)?;

    if features.is_enabled(USB) && clock_tree.usb_clock_hz.is_none() {
        return Err(ConfigError::ClockUnavailable {
            peripheral: USB.to_string(),
        });
    }

    let mut warnings = clock_tree.warnings.clone();
    for dropped in resolved_pins.dropped {
        let warning = Warning::OrphanedPinAssignment {
            signal: dropped.signal,
            pin: dropped.pin,
        };
        warn!("{}", warning);
        warnings.push(warning);
    }

    info!(
        "{} ({}): {} Hz system clock, {} features, {} pins",
        identity.board_name,
        identity.mcu_name,
        clock_tree.system_clock_hz,
        features.len(),
        resolved_pins.assignments.len()
    );

    Ok(ResolvedBoardConfig {
        board_name: identity.board_name.clone(),
        mcu_name: identity.mcu_name.clone(),
        clocks: clock_tree.clone(),
        features,
        pins: resolved_pins.assignments,
        repl,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chip_specific::Stm32g431Specs;
    use crate::clocks::{
        self, ApbPrescaler, BusPrescalers, ClockRouting, OscillatorConfig, OscillatorSource,
        OutputDividers, PllConfig, UsbClockSource,
    };
    use crate::pins::{AltFunction, PinId, SignalId};

    fn identity() -> BoardIdentity {
        BoardIdentity::new("xiao_stm32g431", "STM32G431CB")
    }

    fn clock_tree(routing: &ClockRouting) -> ResolvedClockTree {
        let pll = PllConfig {
            input_divider: 4,
            multiplier: 85,
            output_dividers: OutputDividers {
                p: Some(2),
                q: Some(8),
                r: Some(2),
            },
        };
        clocks::resolve::<Stm32g431Specs>(
            &OscillatorConfig::new(OscillatorSource::InternalHf),
            &pll,
            routing,
        )
        .unwrap()
    }

    fn xiao_clocks() -> ResolvedClockTree {
        clock_tree(&ClockRouting {
            usb: Some(UsbClockSource::Hsi48),
            ..ClockRouting::default()
        })
    }

    fn registry() -> FeatureRegistry {
        let mut registry = FeatureRegistry::new();
        registry.register(USB, true);
        registry.register(FLOAT, false);
        registry.register(FLOAT_IMPL, "none");
        registry.register("uart1", true);
        registry.register("i2c1", false);
        registry.register(REPL, "uart1");
        registry
    }

    fn pin_table() -> PinTable {
        let mut table = PinTable::new();
        table.assign(
            SignalId::new("UART1", "TX"),
            PinId::new('A', 9),
            AltFunction::Af(7),
        );
        table.assign(
            SignalId::new("UART1", "RX"),
            PinId::new('A', 10),
            AltFunction::Af(7),
        );
        table.assign(
            SignalId::new("I2C1", "SCL"),
            PinId::new('A', 15),
            AltFunction::Af(4),
        );
        table
    }

    #[test]
    fn emit_is_idempotent() {
        let first = emit::<Stm32g431Specs>(
            &identity(),
            &registry(),
            &pin_table(),
            &xiao_clocks(),
            Some(115_200),
        )
        .unwrap();
        let second = emit::<Stm32g431Specs>(
            &identity(),
            &registry(),
            &pin_table(),
            &xiao_clocks(),
            Some(115_200),
        )
        .unwrap();
        assert_eq!(first, second);
        assert_eq!(
            Some(ReplConfig {
                transport: "uart1".to_string(),
                baud: Some(115_200),
                prescaler: Some(1),
            }),
            first.repl
        );
    }

    #[test]
    fn orphaned_assignment_is_dropped() {
        let config = emit::<Stm32g431Specs>(
            &identity(),
            &registry(),
            &pin_table(),
            &xiao_clocks(),
            None,
        )
        .unwrap();
        assert_eq!(2, config.pins.len());
        assert!(config
            .pins
            .iter()
            .all(|assignment| assignment.signal.peripheral() == "UART1"));
        assert_eq!(
            vec![Warning::OrphanedPinAssignment {
                signal: SignalId::new("I2C1", "SCL"),
                pin: PinId::new('A', 15),
            }],
            config.warnings
        );
    }

    #[test]
    fn float_without_backend() {
        let mut flags = registry();
        flags.register(FLOAT, true);
        assert_eq!(
            Err(ConfigError::FeatureConflict {
                feature: "float".to_string(),
                conflicts_with: "`float_impl` = none".to_string(),
            }),
            emit::<Stm32g431Specs>(&identity(), &flags, &pin_table(), &xiao_clocks(), None)
        );

        flags.register(FLOAT_IMPL, "single");
        assert!(
            emit::<Stm32g431Specs>(&identity(), &flags, &pin_table(), &xiao_clocks(), None)
                .is_ok()
        );
    }

    #[test]
    fn repl_transport() {
        let mut flags = registry();
        flags.register(REPL, "i2c1");
        assert_eq!(
            Err(ConfigError::ReplTransportUnavailable {
                transport: "i2c1".to_string()
            }),
            emit::<Stm32g431Specs>(&identity(), &flags, &pin_table(), &xiao_clocks(), None)
        );

        flags.register(REPL, true);
        assert_eq!(
            Err(ConfigError::ReplTransportUnavailable {
                transport: "true".to_string()
            }),
            emit::<Stm32g431Specs>(&identity(), &flags, &pin_table(), &xiao_clocks(), None)
        );

        flags.register(REPL, "none");
        let config =
            emit::<Stm32g431Specs>(&identity(), &flags, &pin_table(), &xiao_clocks(), None)
                .unwrap();
        assert_eq!(None, config.repl);
    }

    fn repl_prescaler(config: &ResolvedBoardConfig) -> Option<u32> {
        config.repl.as_ref().and_then(|repl| repl.prescaler)
    }

    #[test]
    fn baud_rate_reachability() {
        // 170MHz / 9600 = 17708 fits the USART baud rate register.
        let config = emit::<Stm32g431Specs>(
            &identity(),
            &registry(),
            &pin_table(),
            &xiao_clocks(),
            Some(9_600),
        )
        .unwrap();
        assert_eq!(Some(1), repl_prescaler(&config));

        // 170MHz / 1200 overflows the register, the kernel clock prescaler brings it back.
        let config = emit::<Stm32g431Specs>(
            &identity(),
            &registry(),
            &pin_table(),
            &xiao_clocks(),
            Some(1_200),
        )
        .unwrap();
        assert_eq!(Some(4), repl_prescaler(&config));

        // UART1 is clocked by APB2.
        let slow = clock_tree(&ClockRouting {
            usb: Some(UsbClockSource::Hsi48),
            buses: BusPrescalers {
                apb2: ApbPrescaler::DivideBy4,
                ..BusPrescalers::default()
            },
            ..ClockRouting::default()
        });
        let config =
            emit::<Stm32g431Specs>(&identity(), &registry(), &pin_table(), &slow, Some(1_200))
                .unwrap();
        assert_eq!(Some(1), repl_prescaler(&config));

        // Too slow even from 170MHz / 256.
        assert_eq!(
            Err(ConfigError::BaudRateUnreachable {
                peripheral: "uart1".to_string(),
                baud: 10,
                clock_hz: 170_000_000,
            }),
            emit::<Stm32g431Specs>(
                &identity(),
                &registry(),
                &pin_table(),
                &xiao_clocks(),
                Some(10)
            )
        );

        assert_eq!(
            Err(ConfigError::BaudRateUnreachable {
                peripheral: "uart1".to_string(),
                baud: 12_000_000,
                clock_hz: 170_000_000,
            }),
            emit::<Stm32g431Specs>(
                &identity(),
                &registry(),
                &pin_table(),
                &xiao_clocks(),
                Some(12_000_000)
            )
        );
    }

    #[test]
    fn lpuart_baud_rate() {
        let mut flags = registry();
        flags.register("lpuart1", true);
        flags.register(REPL, "lpuart1");
        let mut table = pin_table();
        table.assign(
            SignalId::new("LPUART1", "TX"),
            PinId::new('A', 2),
            AltFunction::Af(12),
        );
        table.assign(
            SignalId::new("LPUART1", "RX"),
            PinId::new('A', 3),
            AltFunction::Af(12),
        );

        // 256 * 170MHz / 6 / 9600 = 755555 fits the 20-bit LPUART register.
        let config =
            emit::<Stm32g431Specs>(&identity(), &flags, &table, &xiao_clocks(), Some(9_600))
                .unwrap();
        assert_eq!(Some(6), repl_prescaler(&config));

        // A USART reaches 100 baud, the LPUART register overflows even at /256.
        assert_eq!(
            Err(ConfigError::BaudRateUnreachable {
                peripheral: "lpuart1".to_string(),
                baud: 100,
                clock_hz: 170_000_000,
            }),
            emit::<Stm32g431Specs>(&identity(), &flags, &table, &xiao_clocks(), Some(100))
        );
    }

    #[test]
    fn repl_uart_without_bus_domain() {
        let mut flags = FeatureRegistry::new();
        flags.register("uart3", true);
        flags.register(REPL, "uart3");
        let features = flags.resolve().unwrap();
        assert_eq!(
            Err(ConfigError::ClockUnavailable {
                peripheral: "uart3".to_string()
            }),
            check_repl::<Stm32g431Specs>(&features, &xiao_clocks(), Some(115_200))
        );

        // Without a baud rate there is nothing to derive.
        assert!(check_repl::<Stm32g431Specs>(&features, &xiao_clocks(), None).is_ok());
    }

    #[test]
    fn usb_needs_a_clock() {
        let no_usb = clock_tree(&ClockRouting::default());
        assert_eq!(
            Err(ConfigError::ClockUnavailable {
                peripheral: "usb".to_string()
            }),
            emit::<Stm32g431Specs>(&identity(), &registry(), &pin_table(), &no_usb, None)
        );
    }

    #[test]
    fn invalid_board_name() {
        let identity = BoardIdentity::new("xiao stm32g431", "STM32G431CB");
        assert!(matches!(
            emit::<Stm32g431Specs>(&identity, &registry(), &pin_table(), &xiao_clocks(), None),
            Err(ConfigError::InvalidIdentifier { .. })
        ));
    }

    #[test]
    fn cargo_directives() {
        let config = emit::<Stm32g431Specs>(
            &identity(),
            &registry(),
            &pin_table(),
            &xiao_clocks(),
            None,
        )
        .unwrap();
        let directives = config.cargo_directives();
        assert!(directives.contains("cargo:rustc-cfg=board_feature=\"usb\"\n"));
        assert!(directives.contains("cargo:rustc-cfg=board_repl=\"uart1\"\n"));
        assert!(!directives.contains("float"));
        assert!(directives.contains("cargo:rustc-env=BOARD_SYSCLK_HZ=170000000\n"));
        assert!(directives.contains("cargo:rustc-env=BOARD_FLASH_LATENCY=4\n"));
    }
}
