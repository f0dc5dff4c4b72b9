//! Output formatting utilities for CLI commands

use anyhow::Result;
use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, Color, ContentArrangement, Table};
use coursecraft_db::CourseDetails;
use coursecraft_lifecycle::ApiResponse;
use serde::Serialize;

/// Print an engine envelope and report whether it succeeded.
pub fn print_response(response: &ApiResponse) -> Result<bool> {
    print_json(response)?;
    Ok(response.success)
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a table with headers and rows
pub fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic);

    let header_cells: Vec<Cell> = headers.iter().map(|h| Cell::new(h).fg(Color::Cyan)).collect();
    table.set_header(header_cells);

    for row in rows {
        table.add_row(row);
    }

    println!("{}", table);
}

/// Format minor currency units for display
///
/// Examples:
/// - free -> "free"
/// - 4900 USD -> "49.00 USD"
/// - 4900 USD on sale for 2900 -> "29.00 USD (was 49.00)"
pub fn format_price(details: &CourseDetails) -> String {
    if details.is_free {
        return "free".to_string();
    }
    let Some(price) = details.price_cents else {
        return "-".to_string();
    };
    let currency = details.currency.as_deref().unwrap_or("USD");
    match details.sale_price_cents {
        Some(sale) if sale < price => {
            format!("{} {} (was {})", format_cents(sale), currency, format_cents(price))
        }
        _ => format!("{} {}", format_cents(price), currency),
    }
}

fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}
