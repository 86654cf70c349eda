//! Output formatting for the `foreman-qa` binary

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use foreman_qa_records::{Record, Value};
use serde_json::{Map, Value as Json};

/// Output format
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format
    Json,
    /// Plain `field: value` lines
    Plain,
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Str(s) => s.clone(),
        Value::Related(records) => records
            .iter()
            .map(|r| r.id().map(|id| id.to_string()).unwrap_or_else(|| "-".to_string()))
            .collect::<Vec<_>>()
            .join(", "),
    }
}

/// `(field, value)` rows of a record, id first
pub fn rows(record: &Record) -> Vec<(String, String)> {
    let id = record.id().map(|id| id.to_string()).unwrap_or_default();
    std::iter::once(("id".to_string(), id))
        .chain(record.values().map(|(name, value)| (name.to_string(), cell(value))))
        .collect()
}

/// Render a record in `format`
pub fn render_record(record: &Record, format: OutputFormat) -> String {
    match format {
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic);

            table.set_header(vec!["Field", "Value"]);
            for (field, value) in rows(record) {
                table.add_row(vec![field, value]);
            }
            table.to_string()
        }
        OutputFormat::Json => {
            let mut object = Map::new();
            object.insert("id".to_string(), record.id().map(Json::from).unwrap_or(Json::Null));
            for (name, value) in record.values() {
                object.insert(name.to_string(), value.to_json());
            }
            serde_json::to_string_pretty(&Json::Object(object)).unwrap_or_default()
        }
        OutputFormat::Plain => rows(record)
            .into_iter()
            .map(|(field, value)| format!("{}: {}", field, value))
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use foreman_qa_records::entities::Architecture;
    use foreman_qa_records::{Entity, Overrides};

    #[test]
    fn test_plain_rows() {
        let record = Architecture::build_with(Overrides::new().set("name", "x86_64")).unwrap();
        assert_eq!(render_record(&record, OutputFormat::Plain), "id: \nname: x86_64");
    }

    #[test]
    fn test_table_contains_values() {
        let record = Architecture::build_with(Overrides::new().set("name", "aarch64")).unwrap();
        let table = render_record(&record, OutputFormat::Table);
        assert!(table.contains("Field"));
        assert!(table.contains("aarch64"));
    }

    #[test]
    fn test_json() {
        let record = Architecture::build_with(Overrides::new().set("name", "ppc64")).unwrap();
        let json: Json = serde_json::from_str(&render_record(&record, OutputFormat::Json)).unwrap();
        assert_eq!(json["name"], "ppc64");
        assert!(json["id"].is_null());
    }
}
