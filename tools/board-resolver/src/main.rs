// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Resolve a board declaration file into its validated configuration.
//!
//! ```text
//! board-resolver boards/xiao_stm32g431/board.json --format cargo
//! ```

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing::{error, info, Level};

use board_config::{BoardDeclarations, Error};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Pretty-printed JSON artifact
    Json,
    /// `cargo:` directives for a build script
    Cargo,
}

#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Board declarations (JSON)
    declarations: PathBuf,

    /// Write the artifact to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Format::Json)]
    format: Format,

    /// Log every computed frequency
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .init();

    let declarations = BoardDeclarations::from_file(&cli.declarations)
        .with_context(|| format!("Failed to load {}", cli.declarations.display()))?;

    let config = match declarations.resolve() {
        Ok(config) => config,
        Err(config_error) => {
            error!("{}", config_error);
            return Err(Error::from(config_error))
                .with_context(|| format!("{} is not a valid board", declarations.board_name));
        }
    };

    let rendered = match cli.format {
        Format::Json => serde_json::to_string_pretty(&config)? + "\n",
        Format::Cargo => config.cargo_directives(),
    };

    match &cli.output {
        Some(path) => {
            fs::write(path, rendered)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote {}", path.display());
        }
        None => print!("{}", rendered),
    }
    Ok(())
}
