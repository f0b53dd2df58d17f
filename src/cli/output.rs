//! Output formatting for CLI commands.

use serde::{Deserialize, Serialize};

use crate::catalog::ProductId;
use crate::cli::args::{OutputFormat, RecommendArgs};
use crate::error::Result;
use crate::similarity::ScoredProduct;

/// Result of a recommendation command.
#[derive(Debug, Serialize, Deserialize)]
pub struct RecommendationOutput {
    pub operation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<ProductId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<u64>,
    pub limit: usize,
    pub product_ids: Vec<ProductId>,
    pub duration_ms: u64,
}

/// Result of a similarity lookup.
#[derive(Debug, Serialize, Deserialize)]
pub struct SimilarityOutput {
    pub product_id: ProductId,
    pub limit: usize,
    pub results: Vec<ScoredProduct>,
    pub duration_ms: u64,
}

/// Output a result in the specified format.
pub fn output_result<T: Serialize>(message: &str, result: &T, args: &RecommendArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Human => output_human(message, result, args),
        OutputFormat::Json => output_json(result, args),
    }
}

/// Output in human-readable format.
fn output_human<T: Serialize>(message: &str, result: &T, args: &RecommendArgs) -> Result<()> {
    if args.verbosity() > 0 {
        println!("{message}");
        println!();
    }

    let value = serde_json::to_value(result)?;
    for line in human_lines(&value) {
        println!("{line}");
    }
    Ok(())
}

/// Flatten a JSON value into `key: value` lines; nested objects are indented.
fn human_lines(value: &serde_json::Value) -> Vec<String> {
    let mut lines = Vec::new();
    push_human_lines(value, 0, &mut lines);
    lines
}

fn push_human_lines(value: &serde_json::Value, depth: usize, lines: &mut Vec<String>) {
    let indent = "  ".repeat(depth);
    match value {
        serde_json::Value::Object(obj) => {
            for (key, val) in obj {
                if val.is_object() {
                    lines.push(format!("{indent}{key}:"));
                    push_human_lines(val, depth + 1, lines);
                } else {
                    lines.push(format!("{indent}{key}: {}", format_value(val)));
                }
            }
        }
        _ => lines.push(format!("{indent}{}", format_value(value))),
    }
}

/// Output in JSON format.
fn output_json<T: Serialize>(result: &T, args: &RecommendArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };

    println!("{json}");
    Ok(())
}

/// Format a JSON value for human output.
fn format_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Array(arr) => {
            let formatted_values = arr.iter().map(format_value).collect::<Vec<_>>().join(", ");
            format!("[{formatted_values}]")
        }
        serde_json::Value::Object(obj) => {
            let fields = obj
                .iter()
                .map(|(key, val)| format!("{key}={}", format_value(val)))
                .collect::<Vec<_>>()
                .join(" ");
            format!("{{{fields}}}")
        }
        serde_json::Value::Null => "-".to_string(),
    }
}
