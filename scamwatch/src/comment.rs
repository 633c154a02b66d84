use serde_yaml::Value;

use crate::entry::Entry;

pub const NO_NEW_ENTRIES: &str = "**No new entries added**";
pub const HEADER: &str = "**New entries added**: \n\n";
pub const SEPARATOR: &str = "\n<hr>\n";

/// Render the pull-request comment for a list of (enriched) new entries.
pub fn format(entries: &[Entry]) -> String {
    if entries.is_empty() {
        return NO_NEW_ENTRIES.to_string();
    }

    let blocks: Vec<String> = entries.iter().map(format_entry).collect();
    format!("{HEADER}{}", blocks.join(SEPARATOR))
}

fn format_entry(entry: &Entry) -> String {
    entry
        .fields()
        .map(|(name, value)| format!("**{}**: {}", render(name), render(value)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Sequence(items) => items.iter().map(render).collect::<Vec<_>>().join(","),
        Value::Mapping(_) => serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string()),
        Value::Tagged(tagged) => render(&tagged.value),
    }
}
