//! Request-scoped structured logging.

use std::collections::BTreeMap;
use std::time::Instant;

use serde::Serialize;
use serde_json::Value;
use swsr_core::{RenderMode, RequestId};

/// Severity of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

/// What one event carries besides its message.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<RenderMode>,
    /// Event-specific fields, serialized inline with the rest.
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
    /// Microseconds since the logger was created.
    pub elapsed_us: u64,
}

macro_rules! emit {
    ($level:ident, $entry:ident, $fields:ident) => {
        tracing::$level!(
            request_id = %$entry.request_id,
            route = $entry.route.as_deref().unwrap_or("-"),
            mode = $entry.mode.map(|m| m.as_str()).unwrap_or("-"),
            elapsed_us = $entry.elapsed_us,
            fields = %$fields,
            "{}",
            $entry.message
        )
    };
}

/// Logger bound to one intercepted request.
///
/// Every event carries the request ID, route, render mode and the time
/// since the request started as `tracing` fields; the subscriber decides
/// how they are written.
#[derive(Debug, Clone)]
pub struct StructuredLogger {
    request_id: RequestId,
    route: Option<String>,
    mode: Option<RenderMode>,
    started: Instant,
    min_level: LogLevel,
}

impl StructuredLogger {
    pub fn new(request_id: RequestId) -> Self {
        Self {
            request_id,
            route: None,
            mode: None,
            started: Instant::now(),
            min_level: LogLevel::Trace,
        }
    }

    pub fn with_route(mut self, route: impl Into<String>) -> Self {
        self.route = Some(route.into());
        self
    }

    /// Tag later events with the selected render mode.
    pub fn with_mode(mut self, mode: RenderMode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Drop events below `level` before they reach `tracing`.
    pub fn with_min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    pub fn debug(&self, message: &str) {
        self.event(LogLevel::Debug, message).emit();
    }

    pub fn warn(&self, message: &str) {
        self.event(LogLevel::Warn, message).emit();
    }

    /// Start an event that takes extra fields.
    pub fn event(&self, level: LogLevel, message: impl Into<String>) -> LogBuilder<'_> {
        LogBuilder {
            logger: self,
            level,
            message: message.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn debug_builder(&self, message: impl Into<String>) -> LogBuilder<'_> {
        self.event(LogLevel::Debug, message)
    }

    pub fn warn_builder(&self, message: impl Into<String>) -> LogBuilder<'_> {
        self.event(LogLevel::Warn, message)
    }

    pub fn elapsed_us(&self) -> u64 {
        self.started.elapsed().as_micros() as u64
    }

    fn entry(
        &self,
        level: LogLevel,
        message: String,
        fields: BTreeMap<String, Value>,
    ) -> Option<LogEntry> {
        (level >= self.min_level).then(|| LogEntry {
            level,
            message,
            request_id: self.request_id.to_string(),
            route: self.route.clone(),
            mode: self.mode,
            fields,
            elapsed_us: self.elapsed_us(),
        })
    }
}

/// One pending event.
pub struct LogBuilder<'a> {
    logger: &'a StructuredLogger,
    level: LogLevel,
    message: String,
    fields: BTreeMap<String, Value>,
}

impl LogBuilder<'_> {
    /// Attach a field; later values replace earlier ones with the same key.
    pub fn field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    /// Resolve the entry without emitting it.
    pub fn build(self) -> Option<LogEntry> {
        self.logger.entry(self.level, self.message, self.fields)
    }

    pub fn emit(self) {
        let Some(entry) = self.build() else {
            return;
        };

        let fields = Value::from(serde_json::Map::from_iter(entry.fields.clone()));
        match entry.level {
            LogLevel::Trace => emit!(trace, entry, fields),
            LogLevel::Debug => emit!(debug, entry, fields),
            LogLevel::Info => emit!(info, entry, fields),
            LogLevel::Warn => emit!(warn, entry, fields),
            LogLevel::Error => emit!(error, entry, fields),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn logger() -> StructuredLogger {
        StructuredLogger::new(RequestId::from_string("req-1"))
            .with_route("/posts/1")
            .with_mode(RenderMode::Stream)
    }

    #[test]
    fn test_entry_carries_request_context() {
        let logger = logger();
        let entry = logger.event(LogLevel::Info, "rendered").build().unwrap();

        assert_eq!(entry.request_id, "req-1");
        assert_eq!(entry.route.as_deref(), Some("/posts/1"));
        assert_eq!(entry.mode, Some(RenderMode::Stream));
    }

    #[test]
    fn test_min_level_filters() {
        let logger = logger().with_min_level(LogLevel::Warn);

        assert!(logger.event(LogLevel::Info, "quiet").build().is_none());
        assert!(logger.event(LogLevel::Error, "loud").build().is_some());
    }

    #[test]
    fn test_fields_serialize_flat() {
        let logger = logger();
        let entry = logger
            .warn_builder("falling back")
            .field("error", "boom")
            .field("emitted", false)
            .field("chunks", 2)
            .build()
            .unwrap();

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["level"], "warn");
        assert_eq!(json["mode"], "stream");
        assert_eq!(json["error"], "boom");
        assert_eq!(json["emitted"], false);
        assert_eq!(json["chunks"], 2);
    }

    #[test]
    fn test_emit_without_subscriber() {
        logger().warn("no subscriber installed");
        logger().debug_builder("still fine").field("k", "v").emit();
    }
}
