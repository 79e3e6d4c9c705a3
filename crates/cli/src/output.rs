// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Output formatting shared by every subcommand: `--format text|json`.

use clap::ValueEnum;
use serde::Serialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Render a value either as pretty JSON or via its `Display`-like text
/// renderer, depending on the selected [`OutputFormat`].
pub fn print_value<T: Serialize>(format: OutputFormat, value: &T, text: impl FnOnce(&T) -> String) {
    match format {
        OutputFormat::Json => match serde_json::to_string_pretty(value) {
            Ok(rendered) => println!("{rendered}"),
            Err(err) => eprintln!("failed to encode output as JSON: {err}"),
        },
        OutputFormat::Text => println!("{}", text(value)),
    }
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
