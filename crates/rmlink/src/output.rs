use std::io::IsTerminal;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use serde_json::Value;

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

pub const SCHEMA_BASE: &str = "https://schemas.3leaps.dev/rmlink/cli/v1";

pub fn schema_id(name: &str) -> String {
    format!("{SCHEMA_BASE}/{name}.schema.json")
}

pub fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

#[derive(Serialize)]
struct ReadingOutput<'a, T> {
    schema_id: String,
    channel: &'a str,
    seq: u64,
    timestamp: String,
    value: &'a T,
}

/// Print one telemetry reading.
pub fn print_reading<T: Serialize>(channel: &str, seq: u64, value: &T, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&ReadingOutput {
            schema_id: schema_id("telemetry-reading"),
            channel,
            seq,
            timestamp: now_unix_seconds(),
            value,
        }),
        OutputFormat::Table => {
            let fields = flatten(value);
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(
                    ["CHANNEL", "SEQ"]
                        .into_iter()
                        .map(str::to_string)
                        .chain(fields.iter().map(|(k, _)| k.to_uppercase()))
                        .collect::<Vec<_>>(),
                )
                .add_row(
                    [channel.to_string(), seq.to_string()]
                        .into_iter()
                        .chain(fields.into_iter().map(|(_, v)| v))
                        .collect::<Vec<_>>(),
                );
            println!("{table}");
        }
        OutputFormat::Pretty => {
            let fields = flatten(value)
                .into_iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join(" ");
            println!("[{seq}] {channel} {fields}");
        }
        OutputFormat::Raw => {
            let values = flatten(value)
                .into_iter()
                .map(|(_, v)| v)
                .collect::<Vec<_>>()
                .join(" ");
            println!("{values}");
        }
    }
}

/// Print `(field, value)` rows as a two-column table.
pub fn print_fields(title: &str, rows: &[(&str, String)], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FIELD", "VALUE"]);
            for (field, value) in rows {
                table.add_row(vec![field.to_string(), value.clone()]);
            }
            println!("{table}");
        }
        _ => {
            println!("{title}:");
            let width = rows.iter().map(|(f, _)| f.len()).max().unwrap_or(0) + 1;
            for (field, value) in rows {
                println!("  {:<width$} {value}", format!("{field}:"), width = width);
            }
        }
    }
}

/// Flatten a serialized value into dotted `(path, text)` pairs.
pub fn flatten<T: Serialize>(value: &T) -> Vec<(String, String)> {
    let mut out = Vec::new();
    match serde_json::to_value(value) {
        Ok(value) => flatten_into(String::new(), &value, &mut out),
        Err(err) => out.push(("error".to_string(), err.to_string())),
    }
    out
}

fn flatten_into(prefix: String, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (key, inner) in map {
                flatten_into(child(&prefix, key), inner, out);
            }
        }
        Value::Array(items) => {
            for (i, inner) in items.iter().enumerate() {
                flatten_into(child(&prefix, &i.to_string()), inner, out);
            }
        }
        Value::String(s) => out.push((leaf(prefix), s.clone())),
        Value::Null => out.push((leaf(prefix), "-".to_string())),
        other => out.push((leaf(prefix), other.to_string())),
    }
}

fn child(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

fn leaf(prefix: String) -> String {
    if prefix.is_empty() {
        "value".to_string()
    } else {
        prefix
    }
}

pub fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rmlink_session::{ChassisPosition, Line, LineType, Point};

    #[test]
    fn flattens_nested_readings() {
        let line = Line {
            line_type: LineType::Straight,
            points: vec![Point {
                x: 0.5,
                y: 0.25,
                tangent: 0.0,
                curvature: 1.0,
            }],
        };
        let fields = flatten(&line);
        assert_eq!(fields[0], ("line_type".to_string(), "straight".to_string()));
        assert!(fields.contains(&("points.0.y".to_string(), "0.25".to_string())));
    }

    #[test]
    fn flattens_scalars_and_missing_values() {
        assert_eq!(flatten(&412.0_f64), vec![("value".to_string(), "412.0".to_string())]);

        let position = ChassisPosition {
            forwards: 1.0,
            right: 0.0,
            clockwise: None,
        };
        assert!(flatten(&position).contains(&("clockwise".to_string(), "-".to_string())));
    }
}
