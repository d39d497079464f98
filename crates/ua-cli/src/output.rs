//! Output formatting utilities.

use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};
use ua_model::AttributeRecord;

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON format.
    Json,
}

/// Prints a success message.
pub fn success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Prints an error message.
pub fn error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Prints a warning message.
pub fn warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow().bold(), message);
}

/// Prints an info message.
pub fn info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// One attribute of a record, as a table row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Tabled)]
pub struct AttributeRow {
    /// Attribute key.
    #[tabled(rename = "Attribute")]
    pub attribute: String,
    /// Values, comma separated.
    #[tabled(rename = "Value")]
    pub value: String,
}

/// Table rows for `record`. Credential values are masked.
#[must_use]
pub fn attribute_rows(record: &AttributeRecord) -> Vec<AttributeRow> {
    record
        .iter()
        .map(|(key, values)| AttributeRow {
            attribute: key.to_string(),
            value: if is_secret(key) {
                "********".to_string()
            } else {
                values
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(",")
            },
        })
        .collect()
}

fn is_secret(key: &str) -> bool {
    key == ua_model::keys::USER_PASSWORD || key == ua_model::keys::SHADOW_PASSWORD
}

/// Outputs a list in the given format.
pub fn output<T: Tabled + Serialize>(data: &[T], format: OutputFormat) -> crate::CliResult<()> {
    match format {
        OutputFormat::Table => {
            if data.is_empty() {
                info("No results found.");
            } else {
                let table = Table::new(data).with(Style::rounded()).to_string();
                println!("{table}");
            }
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(data)?;
            println!("{json}");
        }
    }
    Ok(())
}

/// Outputs one record.
pub fn output_record(record: &AttributeRecord, format: OutputFormat) -> crate::CliResult<()> {
    match format {
        OutputFormat::Table => {
            let table = Table::new(attribute_rows(record))
                .with(Style::rounded())
                .to_string();
            println!("{table}");
        }
        OutputFormat::Json => {
            let mut masked = record.clone();
            for key in [ua_model::keys::USER_PASSWORD, ua_model::keys::SHADOW_PASSWORD] {
                if masked.has(key) {
                    masked.set_value(key, "********");
                }
            }
            println!("{}", serde_json::to_string_pretty(&masked)?);
        }
    }
    Ok(())
}

/// Asks a yes/no question; anything but `y` or `yes` is a no.
pub fn confirm(message: &str) -> crate::CliResult<bool> {
    print!("{message} [y/N]: ");
    std::io::Write::flush(&mut std::io::stdout())?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;

    Ok(input.trim().eq_ignore_ascii_case("y") || input.trim().eq_ignore_ascii_case("yes"))
}

/// Prompts for password input (hidden), twice.
pub fn prompt_new_password() -> crate::CliResult<String> {
    let password = rpassword::prompt_password("New password: ")?;
    let confirm = rpassword::prompt_password("Retype new password: ")?;
    if password != confirm {
        return Err(crate::CliError::Validation("passwords do not match".to_string()));
    }
    Ok(password)
}
