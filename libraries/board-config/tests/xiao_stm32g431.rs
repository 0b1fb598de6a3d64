// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Resolves the shipped XIAO STM32G431 declarations end to end.

use board_config::chip_specific::Stm32g431Specs;
use board_config::clocks::{ClockDomain, PllTap};
use board_config::pins::{AltFunction, PinId, Polarity, SignalId};
use board_config::{BoardDeclarations, ConfigError, Warning};

const XIAO: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../../boards/xiao_stm32g431/board.json"
));

fn declarations() -> BoardDeclarations {
    BoardDeclarations::from_json(XIAO).unwrap()
}

#[test]
fn clock_tree() {
    let config = declarations().resolve().unwrap();
    let clocks = &config.clocks;
    assert_eq!(16_000_000, clocks.oscillator_hz);
    assert_eq!(4_000_000, clocks.pll_input_hz);
    assert_eq!(340_000_000, clocks.vco_hz);
    assert_eq!(170_000_000, clocks.system_clock_hz);
    assert_eq!(Some(&42_500_000), clocks.pll_outputs.get(&PllTap::Q));
    assert_eq!(Some(48_000_000), clocks.usb_clock_hz);
    assert_eq!(Some(170_000_000), clocks.domain_hz(ClockDomain::Apb2));
    assert_eq!(Some(170_000_000), clocks.domain_hz(ClockDomain::Adc));
    // The board keeps a more conservative latency than the 4 wait states the chip needs.
    assert_eq!(8, clocks.flash_wait_states);
    assert!(config.warnings.is_empty());
}

#[test]
fn board_capabilities() {
    let config = declarations().resolve().unwrap();
    assert_eq!("xiao_stm32g431", config.board_name);
    assert_eq!(8, config.pins.len());
    assert!(config.pins.iter().any(|assignment| {
        assignment.signal == SignalId::new("LED1", "PIN")
            && assignment.pin == PinId::new('C', 14)
            && assignment.alt_function == AltFunction::Gpio
            && assignment.polarity == Some(Polarity::ActiveHigh)
    }));
    assert!(config.features.is_enabled("usb"));
    assert!(!config.features.is_enabled("float"));
    assert_eq!(
        Some("uart1"),
        config.repl.as_ref().map(|repl| repl.transport.as_str())
    );
}

#[test]
fn resolution_is_deterministic() {
    let first = declarations().resolve().unwrap();
    let second = declarations().resolve().unwrap();
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
    assert_eq!(
        first,
        declarations().resolve_for::<Stm32g431Specs>().unwrap()
    );
}

#[test]
fn disabled_spi_leaves_its_pins_inert() {
    let mut declarations = declarations();
    declarations
        .features
        .insert("spi1".to_string(), false.into());
    let config = declarations.resolve().unwrap();
    assert_eq!(5, config.pins.len());
    assert_eq!(3, config.warnings.len());
    assert!(config
        .warnings
        .iter()
        .all(|warning| matches!(warning, Warning::OrphanedPinAssignment { .. })));
}

#[test]
fn enabling_float_without_backend() {
    let mut declarations = declarations();
    declarations.features.insert("float".to_string(), true.into());
    assert!(matches!(
        declarations.resolve(),
        Err(ConfigError::FeatureConflict { .. })
    ));
}

#[test]
fn complex_requires_float() {
    let mut declarations = declarations();
    declarations
        .features
        .insert("complex".to_string(), true.into());
    assert!(matches!(
        declarations.resolve(),
        Err(ConfigError::UnsatisfiedDependency { .. })
    ));
}

#[test]
fn latency_below_requirement() {
    let mut declarations = declarations();
    declarations.clocks.flash_latency = Some(2);
    assert_eq!(
        Err(ConfigError::InsufficientFlashLatency {
            declared: 2,
            required: 4
        }),
        declarations.resolve()
    );
}

#[test]
fn artifact_json() {
    let config = declarations().resolve().unwrap();
    let json = serde_json::to_value(&config).unwrap();
    assert_eq!(170_000_000, json["clocks"]["system_clock_hz"]);
    assert_eq!(42_500_000, json["clocks"]["pll_outputs"]["Q"]);
    assert_eq!(true, json["features"]["usb"]["value"]);
    assert_eq!("PA9", json["pins"][7]["pin"]);
    assert!(json["pins"][7].get("polarity").is_none());
    assert_eq!("LED1.PIN", json["pins"][2]["signal"]);
    assert_eq!("active_high", json["pins"][2]["polarity"]);
}
