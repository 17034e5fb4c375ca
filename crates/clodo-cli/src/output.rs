//! Output rendering: the four formats spec.md §6 names for `assess`
//! and `status`. Grounded on `aion-cli::output::OutputFormat`,
//! generalized from an enum-only module into one that also knows how
//! to render a `serde_json::Value` in each format.

use anyhow::Result;
use console::style;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
    Plain,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            "plain" | "text" => Ok(Self::Plain),
            _ => Err(anyhow::anyhow!("unknown output format '{s}'")),
        }
    }
}

/// Renders `value` to stdout in `format`. `Table` falls back to a
/// two-column key/value listing for anything that isn't a flat object
/// or array of flat objects — good enough for the shapes this CLI
/// produces (assessments, deployment summaries, metrics snapshots).
pub fn print_value(value: &serde_json::Value, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Yaml => println!("{}", serde_yaml::to_string(value)?),
        OutputFormat::Plain => print_plain(value, 0),
        OutputFormat::Table => print_table(value),
    }
    Ok(())
}

fn print_plain(value: &serde_json::Value, indent: usize) {
    let pad = "  ".repeat(indent);
    match value {
        serde_json::Value::Object(map) => {
            for (key, val) in map {
                match val {
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        println!("{pad}{key}:");
                        print_plain(val, indent + 1);
                    }
                    other => println!("{pad}{key}: {}", plain_scalar(other)),
                }
            }
        }
        serde_json::Value::Array(items) => {
            for item in items {
                match item {
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => print_plain(item, indent),
                    other => println!("{pad}- {}", plain_scalar(other)),
                }
            }
        }
        other => println!("{pad}{}", plain_scalar(other)),
    }
}

fn plain_scalar(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}

fn print_table(value: &serde_json::Value) {
    match value {
        serde_json::Value::Array(rows) if rows.iter().all(|r| r.is_object()) && !rows.is_empty() => {
            print_row_table(rows);
        }
        serde_json::Value::Object(map) => {
            for (key, val) in map {
                println!("{:<28} {}", style(key).bold(), plain_scalar_or_json(val));
            }
        }
        other => print_plain(other, 0),
    }
}

fn print_row_table(rows: &[serde_json::Value]) {
    let mut columns: Vec<String> = Vec::new();
    for row in rows {
        if let serde_json::Value::Object(map) = row {
            for key in map.keys() {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }
    }

    let header = columns.join("\t");
    println!("{}", style(header).bold());
    for row in rows {
        let cells: Vec<String> = columns
            .iter()
            .map(|c| row.get(c).map(plain_scalar_or_json).unwrap_or_else(|| "-".to_string()))
            .collect();
        println!("{}", cells.join("\t"));
    }
}

fn plain_scalar_or_json(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => "-".to_string(),
        serde_json::Value::Object(_) | serde_json::Value::Array(_) => value.to_string(),
        other => other.to_string(),
    }
}
