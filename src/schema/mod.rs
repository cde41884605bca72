//! Search modes and the fields each mode can filter on.
//!
//! The registry is static: every mode maps to an ordered list of fields, and
//! the first field of a mode is what the empty filter tree points at.

use serde::{Deserialize, Serialize};
use std::fmt;

#[cfg(test)]
mod schema_test;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    #[default]
    Accounts,
    Posts,
    Media,
    ArchiveSessions,
}

impl SearchMode {
    /// Registration order. The first entry is the default mode.
    pub const ALL: [SearchMode; 4] = [
        SearchMode::Accounts,
        SearchMode::Posts,
        SearchMode::Media,
        SearchMode::ArchiveSessions,
    ];

    pub fn key(self) -> &'static str {
        match self {
            SearchMode::Accounts => "accounts",
            SearchMode::Posts => "posts",
            SearchMode::Media => "media",
            SearchMode::ArchiveSessions => "archive_sessions",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SearchMode::Accounts => "Accounts",
            SearchMode::Posts => "Posts",
            SearchMode::Media => "Media",
            SearchMode::ArchiveSessions => "Archive Sessions",
        }
    }

    pub fn from_key(key: &str) -> Option<SearchMode> {
        Self::ALL.into_iter().find(|mode| mode.key() == key)
    }

    pub fn is_default(self) -> bool {
        self == SearchMode::default()
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Text,
    Date,
}

impl ValueType {
    /// Operators a field of this type supports before any exclusions.
    pub fn default_operators(self) -> &'static [OperatorKind] {
        use OperatorKind::*;
        match self {
            ValueType::Text => &[
                Equal, NotEqual, Like, NotLike, StartsWith, EndsWith, Proximity, IsEmpty,
                IsNotEmpty,
            ],
            ValueType::Date => &[
                Equal,
                NotEqual,
                Less,
                LessOrEqual,
                Greater,
                GreaterOrEqual,
                Between,
                NotBetween,
                IsEmpty,
                IsNotEmpty,
            ],
        }
    }

    /// Operators this system disables for every field of the type.
    pub fn excluded_operators(self) -> &'static [OperatorKind] {
        match self {
            ValueType::Text => &[
                OperatorKind::StartsWith,
                OperatorKind::EndsWith,
                OperatorKind::Proximity,
            ],
            ValueType::Date => &[],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatorKind {
    Equal,
    NotEqual,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
    Between,
    NotBetween,
    Like,
    NotLike,
    StartsWith,
    EndsWith,
    Proximity,
    IsEmpty,
    IsNotEmpty,
}

impl OperatorKind {
    pub const ALL: [OperatorKind; 15] = [
        OperatorKind::Equal,
        OperatorKind::NotEqual,
        OperatorKind::Less,
        OperatorKind::LessOrEqual,
        OperatorKind::Greater,
        OperatorKind::GreaterOrEqual,
        OperatorKind::Between,
        OperatorKind::NotBetween,
        OperatorKind::Like,
        OperatorKind::NotLike,
        OperatorKind::StartsWith,
        OperatorKind::EndsWith,
        OperatorKind::Proximity,
        OperatorKind::IsEmpty,
        OperatorKind::IsNotEmpty,
    ];

    pub fn key(self) -> &'static str {
        match self {
            OperatorKind::Equal => "equal",
            OperatorKind::NotEqual => "not_equal",
            OperatorKind::Less => "less",
            OperatorKind::LessOrEqual => "less_or_equal",
            OperatorKind::Greater => "greater",
            OperatorKind::GreaterOrEqual => "greater_or_equal",
            OperatorKind::Between => "between",
            OperatorKind::NotBetween => "not_between",
            OperatorKind::Like => "like",
            OperatorKind::NotLike => "not_like",
            OperatorKind::StartsWith => "starts_with",
            OperatorKind::EndsWith => "ends_with",
            OperatorKind::Proximity => "proximity",
            OperatorKind::IsEmpty => "is_empty",
            OperatorKind::IsNotEmpty => "is_not_empty",
        }
    }

    pub fn from_key(key: &str) -> Option<OperatorKind> {
        Self::ALL.into_iter().find(|op| op.key() == key)
    }

    /// Number of values a rule with this operator carries.
    pub fn arity(self) -> usize {
        match self {
            OperatorKind::IsEmpty | OperatorKind::IsNotEmpty => 0,
            OperatorKind::Between | OperatorKind::NotBetween => 2,
            OperatorKind::Proximity => 3,
            _ => 1,
        }
    }
}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub value_type: ValueType,
    pub allowed_operators: Vec<OperatorKind>,
}

impl FieldSpec {
    fn new(key: &'static str, label: &'static str, value_type: ValueType) -> Self {
        let excluded = value_type.excluded_operators();
        let allowed_operators = value_type
            .default_operators()
            .iter()
            .copied()
            .filter(|op| !excluded.contains(op))
            .collect();

        Self {
            key,
            label,
            value_type,
            allowed_operators,
        }
    }

    pub fn allows(&self, operator: OperatorKind) -> bool {
        self.allowed_operators.contains(&operator)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSchema {
    mode: SearchMode,
    fields: Vec<FieldSpec>,
}

impl FieldSchema {
    pub fn mode(&self) -> SearchMode {
        self.mode
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, key: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.key == key)
    }

    pub fn first_field(&self) -> &FieldSpec {
        // Every registered mode has at least one field.
        &self.fields[0]
    }
}

struct Registry {
    schemas: Vec<FieldSchema>,
}

fn registry() -> &'static Registry {
    static REGISTRY: std::sync::OnceLock<Registry> = std::sync::OnceLock::new();

    REGISTRY.get_or_init(|| {
        use ValueType::{Date, Text};

        let schemas = SearchMode::ALL
            .into_iter()
            .map(|mode| {
                let fields = match mode {
                    SearchMode::Accounts => vec![
                        FieldSpec::new("url_parts", "User Name", Text),
                        FieldSpec::new("display_name", "Display Name", Text),
                        FieldSpec::new("bio", "Bio", Text),
                        FieldSpec::new("notes", "Notes", Text),
                        FieldSpec::new("data", "Account Data (Slow)", Text),
                    ],
                    SearchMode::Posts => vec![
                        FieldSpec::new("publication_date", "Publication Date", Date),
                        FieldSpec::new("caption", "Caption", Text),
                        FieldSpec::new("notes", "Notes", Text),
                        FieldSpec::new("data", "Post Data (Slow)", Text),
                        FieldSpec::new("url", "Post URL", Text),
                    ],
                    SearchMode::Media => vec![
                        FieldSpec::new("ai_caption", "AI Generated Caption", Text),
                        FieldSpec::new("notes", "Notes", Text),
                        FieldSpec::new("data", "Media Data (Slow)", Text),
                    ],
                    SearchMode::ArchiveSessions => vec![
                        FieldSpec::new("archiving_date", "Archiving Date", Date),
                        FieldSpec::new("archived_url", "Archived URL", Text),
                        FieldSpec::new("notes", "Notes", Text),
                        FieldSpec::new("structures", "Full Accounts / Posts Data (Slow)", Text),
                    ],
                };
                FieldSchema { mode, fields }
            })
            .collect();

        Registry { schemas }
    })
}

pub fn schema_for(mode: SearchMode) -> &'static FieldSchema {
    let index = SearchMode::ALL
        .iter()
        .position(|m| *m == mode)
        .unwrap_or_default();
    &registry().schemas[index]
}
