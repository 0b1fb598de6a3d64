// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! This module contains all chip-specific data.
//!
//! Chips of the same family share the PLL topology, but differ in frequency windows, flash
//! timings, package pins and alternate-function routing. This module provides the traits that
//! describe those differences and the types implementing them for supported chips.

pub mod chip_specs;
pub mod clock_constants;
pub mod flash;
pub mod pins;
pub mod uart;

pub use chip_specs::stm32g431::Stm32g431Specs;
pub use chip_specs::ChipSpecs;
