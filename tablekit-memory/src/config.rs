//! Serializable configuration for in-memory tables.
//!
//! [`TableConfig`] lets table settings live alongside the rest of an
//! application's configuration. Every field has a default, so a partial (or
//! empty) document is valid:
//!
//! ```ignore
//! let config: TableConfig = serde_json::from_str(r#"{ "name": "contacts", "response": "inline" }"#)?;
//! let table = InMemoryTable::<Contact>::builder().config(config).spawn()?;
//! ```

use serde::{Deserialize, Serialize};

/// Which built-in response context a table delivers its completions on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseMode {
    /// A dedicated response thread per table, running completions in order.
    #[default]
    Serial,
    /// Completions run directly on the table's worker.
    Inline,
}

/// Settings for an in-memory table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Table name used for logging and thread names. Defaults to the record's
    /// `table_name()`.
    pub name: Option<String>,
    /// Number of records to reserve room for up front.
    pub initial_capacity: usize,
    /// Where completions are delivered.
    pub response: ResponseMode,
}
