// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Clock-tree and board-capability resolution for microcontroller boards.
//!
//! A board is described by a small set of declarations: the oscillator feeding the PLL, the PLL
//! divider chain, the enabled features and the pins claimed by each peripheral. This crate turns
//! those declarations into a single [`ResolvedBoardConfig`], checking on the way that
//!
//! + every PLL stage stays inside the chip's documented frequency windows,
//! + the flash is configured with enough wait states for the resulting system clock,
//! + feature dependencies are satisfied and no two peripherals claim the same pin.
//!
//! Resolution is pure: identical declarations always produce an identical artifact or an
//! identical [`ConfigError`].
//!
//! ## Example
//! ```rust,ignore
//! use board_config::BoardDeclarations;
//!
//! let declarations = BoardDeclarations::from_file("boards/xiao_stm32g431/board.json")?;
//! let resolved = declarations.resolve()?;
//! assert_eq!(resolved.clocks.system_clock_hz, 170_000_000);
//! ```

pub mod chip_specific;
pub mod clocks;
pub mod declarations;
pub mod error;
pub mod features;
pub mod pins;
pub mod validator;

pub use declarations::BoardDeclarations;
pub use error::{ConfigError, Error, Warning};
pub use validator::{emit, BoardIdentity, ResolvedBoardConfig};
