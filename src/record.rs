use crate::field::FieldValue;
use crate::linking::LinkingMetadata;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::Level;

pub const TIMESTAMP_KEY: &str = "timestamp";
pub const LEVEL_KEY: &str = "log.level";
pub const MESSAGE_KEY: &str = "message";
pub const FILE_NAME_KEY: &str = "file.name";
pub const LINE_NUMBER_KEY: &str = "line.number";
pub const METHOD_NAME_KEY: &str = "method.name";

/// Call site of a log statement, as reported by the logging framework.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Caller {
    pub file: Option<String>,
    pub line: Option<u32>,
    pub method: Option<String>,
}

/// A log statement: everything the framework knows about one log call
/// except the tracing context.
///
/// An entry can be formatted any number of times against different
/// contexts; it never holds linking data itself.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: Level,
    pub message: String,
    pub caller: Option<Caller>,
    pub fields: BTreeMap<String, FieldValue>,
}

impl LogEntry {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        LogEntry {
            timestamp: Utc::now(),
            level,
            message: message.into(),
            caller: None,
            fields: BTreeMap::new(),
        }
    }

    pub fn with_time(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_caller(mut self, caller: Caller) -> Self {
        self.caller = Some(caller);
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn with_fields<K, V>(mut self, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        self.fields
            .extend(fields.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }
}

/// The flat key/value record emitted for one log call.
///
/// Keys are unique and sorted; values stay typed until the emitter renders
/// them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct LogRecord {
    fields: BTreeMap<String, FieldValue>,
}

impl LogRecord {
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Merge user fields, linking metadata and base fields into one record.
///
/// On a key collision the base fields win over linking fields, and linking
/// fields win over user fields. Caller fields are copied only when the
/// framework reported them.
pub fn assemble(entry: &LogEntry, linking: Option<&LinkingMetadata>) -> LogRecord {
    let mut fields = entry.fields.clone();

    if let Some(linking) = linking {
        for (key, value) in linking.entries() {
            fields.insert(key.to_string(), FieldValue::from(value));
        }
    }

    fields.insert(
        TIMESTAMP_KEY.to_string(),
        FieldValue::I64(entry.timestamp.timestamp_millis()),
    );
    fields.insert(
        LEVEL_KEY.to_string(),
        FieldValue::Text(entry.level.as_str().to_ascii_lowercase()),
    );
    fields.insert(MESSAGE_KEY.to_string(), FieldValue::from(entry.message.as_str()));

    if let Some(caller) = &entry.caller {
        if let Some(file) = &caller.file {
            fields.insert(FILE_NAME_KEY.to_string(), FieldValue::from(file.as_str()));
        }
        if let Some(line) = caller.line {
            fields.insert(LINE_NUMBER_KEY.to_string(), FieldValue::from(line));
        }
        if let Some(method) = &caller.method {
            fields.insert(METHOD_NAME_KEY.to_string(), FieldValue::from(method.as_str()));
        }
    }

    LogRecord { fields }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn test_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2014, 11, 28, 1, 1, 0).unwrap()
    }

    fn linking() -> LinkingMetadata {
        LinkingMetadata {
            entity_name: "AppName".to_string(),
            entity_type: "SERVICE".to_string(),
            hostname: Some("host1".to_string()),
            trace_id: Some("d9466896a525ccbf".to_string()),
            span_id: None,
        }
    }

    #[test]
    fn base_fields_only_without_linking() {
        let entry = LogEntry::new(Level::INFO, "Hello World!")
            .with_time(test_time())
            .with_caller(Caller {
                file: Some("src/main.rs".to_string()),
                line: Some(12),
                method: Some("app::run".to_string()),
            });
        let record = assemble(&entry, None);

        let keys: Vec<_> = record.iter().map(|(k, _)| k).collect();
        assert_eq!(
            keys,
            vec![FILE_NAME_KEY, LINE_NUMBER_KEY, LEVEL_KEY, MESSAGE_KEY, METHOD_NAME_KEY, TIMESTAMP_KEY]
        );
        assert_eq!(record.get(TIMESTAMP_KEY), Some(&FieldValue::I64(1417136460000)));
        assert_eq!(record.get(LEVEL_KEY), Some(&FieldValue::Text("info".to_string())));
        assert_eq!(record.get(LINE_NUMBER_KEY), Some(&FieldValue::U64(12)));
        assert_eq!(record.len(), 6);
        assert!(!record.is_empty());
        assert!(LogRecord::default().is_empty());
    }

    #[test]
    fn missing_caller_parts_are_omitted() {
        let entry = LogEntry::new(Level::WARN, "partial").with_caller(Caller {
            file: None,
            line: Some(3),
            method: None,
        });
        let record = assemble(&entry, None);
        assert!(!record.contains_key(FILE_NAME_KEY));
        assert!(!record.contains_key(METHOD_NAME_KEY));
        assert!(record.contains_key(LINE_NUMBER_KEY));
        assert_eq!(record.get(LEVEL_KEY), Some(&FieldValue::Text("warn".to_string())));
    }

    #[test]
    fn linking_fields_are_merged() {
        let entry = LogEntry::new(Level::INFO, "linked").with_field("zip", "zap");
        let record = assemble(&entry, Some(&linking()));
        assert_eq!(record.get("entity.name"), Some(&FieldValue::from("AppName")));
        assert_eq!(record.get("trace.id"), Some(&FieldValue::from("d9466896a525ccbf")));
        assert!(!record.contains_key("span.id"));
        assert_eq!(record.get("zip"), Some(&FieldValue::from("zap")));
    }

    #[test]
    fn base_beats_linking_beats_user_fields() {
        let entry = LogEntry::new(Level::ERROR, "real message")
            .with_time(test_time())
            .with_fields([
                ("message", FieldValue::from("spoofed")),
                ("timestamp", FieldValue::from(1u8)),
                ("log.level", FieldValue::from("debug")),
                ("hostname", FieldValue::from("user-host")),
                ("entity.name", FieldValue::from(true)),
            ]);
        let record = assemble(&entry, Some(&linking()));

        assert_eq!(record.get(MESSAGE_KEY), Some(&FieldValue::from("real message")));
        assert_eq!(record.get(TIMESTAMP_KEY), Some(&FieldValue::I64(1417136460000)));
        assert_eq!(record.get(LEVEL_KEY), Some(&FieldValue::from("error")));
        assert_eq!(record.get("hostname"), Some(&FieldValue::from("host1")));
        assert_eq!(record.get("entity.name"), Some(&FieldValue::from("AppName")));
    }

    #[test]
    fn user_field_survives_when_nothing_collides() {
        let entry = LogEntry::new(Level::INFO, "x").with_field("hostname", "user-host");
        let record = assemble(&entry, None);
        assert_eq!(record.get("hostname"), Some(&FieldValue::from("user-host")));
    }
}
