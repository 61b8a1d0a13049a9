//! Execution options carried next to the filter, sort and projection.
//!
//! Legacy mutators on `Query` and the `FindOptions` object write into the same
//! struct; there is one slot per logical option.

use bson::{Bson, Document};
use serde::{Deserialize, Serialize};

pub const MODIFIER_COMMENT: &str = "$comment";
pub const MODIFIER_MAX_TIME_MS: &str = "$maxTimeMS";
pub const MODIFIER_MAX_SCAN: &str = "$maxScan";
pub const MODIFIER_SNAPSHOT: &str = "$snapshot";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CursorType {
    #[default]
    NonTailable,
    Tailable,
    TailableAwait,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadPreference {
    #[default]
    Primary,
    PrimaryPreferred,
    Secondary,
    SecondaryPreferred,
    Nearest,
}

impl ReadPreference {
    #[must_use]
    pub fn mode(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::PrimaryPreferred => "primaryPreferred",
            Self::Secondary => "secondary",
            Self::SecondaryPreferred => "secondaryPreferred",
            Self::Nearest => "nearest",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollationStrength {
    Primary,
    Secondary,
    Tertiary,
    Quaternary,
    Identical,
}

impl CollationStrength {
    #[must_use]
    pub fn level(self) -> i32 {
        match self {
            Self::Primary => 1,
            Self::Secondary => 2,
            Self::Tertiary => 3,
            Self::Quaternary => 4,
            Self::Identical => 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collation {
    pub locale: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strength: Option<CollationStrength>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_level: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numeric_ordering: Option<bool>,
}

impl Collation {
    pub fn new(locale: impl Into<String>) -> Self {
        Self { locale: locale.into(), strength: None, case_level: None, numeric_ordering: None }
    }

    #[must_use]
    pub fn strength(mut self, strength: CollationStrength) -> Self {
        self.strength = Some(strength);
        self
    }

    #[must_use]
    pub fn case_level(mut self, on: bool) -> Self {
        self.case_level = Some(on);
        self
    }

    #[must_use]
    pub fn numeric_ordering(mut self, on: bool) -> Self {
        self.numeric_ordering = Some(on);
        self
    }

    #[must_use]
    pub fn to_document(&self) -> Document {
        let mut d = Document::new();
        d.insert("locale", self.locale.clone());
        if let Some(s) = self.strength {
            d.insert("strength", s.level());
        }
        if let Some(c) = self.case_level {
            d.insert("caseLevel", c);
        }
        if let Some(n) = self.numeric_ordering {
            d.insert("numericOrdering", n);
        }
        d
    }
}

/// Find options. Unset fields leave the store default in place.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FindOptions {
    /// Negative: a single batch of `|n|` documents, then the cursor closes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_time_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collation: Option<Collation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor_type: Option<CursorType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_cursor_timeout: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_preference: Option<ReadPreference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<Document>,
    /// Store-specific directives not otherwise modelled, e.g. `$snapshot`.
    #[serde(skip_serializing_if = "Document::is_empty")]
    pub modifiers: Document,
}

impl FindOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn batch_size(mut self, n: i32) -> Self {
        self.batch_size = Some(n);
        self
    }

    #[must_use]
    pub fn limit(mut self, n: i64) -> Self {
        self.limit = Some(n);
        self
    }

    #[must_use]
    pub fn skip(mut self, n: u64) -> Self {
        self.skip = Some(n);
        self
    }

    #[must_use]
    pub fn max_time_ms(mut self, ms: u64) -> Self {
        self.max_time_ms = Some(ms);
        self
    }

    #[must_use]
    pub fn collation(mut self, collation: Collation) -> Self {
        self.collation = Some(collation);
        self
    }

    #[must_use]
    pub fn cursor_type(mut self, t: CursorType) -> Self {
        self.cursor_type = Some(t);
        self
    }

    #[must_use]
    pub fn comment(mut self, c: impl Into<String>) -> Self {
        self.comment = Some(c.into());
        self
    }

    #[must_use]
    pub fn no_cursor_timeout(mut self, on: bool) -> Self {
        self.no_cursor_timeout = Some(on);
        self
    }

    #[must_use]
    pub fn read_preference(mut self, rp: ReadPreference) -> Self {
        self.read_preference = Some(rp);
        self
    }

    #[must_use]
    pub fn hint(mut self, index: Document) -> Self {
        self.hint = Some(index);
        self
    }

    #[must_use]
    pub fn modifier(mut self, key: impl Into<String>, value: impl Into<Bson>) -> Self {
        self.set_modifier(key.into(), value.into());
        self
    }

    /// Sets one modifier. `$comment` and `$maxTimeMS` land in their typed slots.
    pub fn set_modifier(&mut self, key: String, value: Bson) {
        match (key.as_str(), &value) {
            (MODIFIER_COMMENT, Bson::String(s)) => self.comment = Some(s.clone()),
            (MODIFIER_MAX_TIME_MS, v) if as_u64(v).is_some() => self.max_time_ms = as_u64(v),
            _ => {
                self.modifiers.insert(key, value);
            }
        }
    }

    pub fn remove_modifier(&mut self, key: &str) -> Option<Bson> {
        self.modifiers.remove(key)
    }

    /// Overlays every option set in `other`; modifiers merge key-by-key.
    pub fn merge_from(&mut self, other: &FindOptions) {
        macro_rules! take {
            ($($f:ident),*) => {$(
                if other.$f.is_some() {
                    self.$f.clone_from(&other.$f);
                }
            )*};
        }
        take!(
            batch_size,
            limit,
            skip,
            max_time_ms,
            collation,
            cursor_type,
            comment,
            no_cursor_timeout,
            read_preference,
            hint
        );
        for (k, v) in &other.modifiers {
            self.set_modifier(k.clone(), v.clone());
        }
    }

    /// Option fields of a `find` command, in a fixed order.
    #[must_use]
    pub fn to_document(&self) -> Document {
        let mut d = Document::new();
        if let Some(h) = &self.hint {
            d.insert("hint", h.clone());
        }
        if let Some(s) = self.skip {
            d.insert("skip", Bson::Int64(i64::try_from(s).unwrap_or(i64::MAX)));
        }
        if let Some(l) = self.limit {
            d.insert("limit", Bson::Int64(i64::try_from(l.unsigned_abs()).unwrap_or(i64::MAX)));
            if l < 0 {
                d.insert("singleBatch", true);
            }
        }
        if let Some(b) = self.batch_size {
            d.insert("batchSize", Bson::Int32(i32::try_from(b.unsigned_abs()).unwrap_or(i32::MAX)));
            if b < 0 {
                d.insert("singleBatch", true);
            }
        }
        if let Some(c) = &self.comment {
            d.insert("comment", c.clone());
        }
        if let Some(ms) = self.max_time_ms {
            d.insert("maxTimeMS", Bson::Int64(i64::try_from(ms).unwrap_or(i64::MAX)));
        }
        match self.cursor_type {
            Some(CursorType::Tailable) => {
                d.insert("tailable", true);
            }
            Some(CursorType::TailableAwait) => {
                d.insert("tailable", true);
                d.insert("awaitData", true);
            }
            Some(CursorType::NonTailable) | None => {}
        }
        if let Some(true) = self.no_cursor_timeout {
            d.insert("noCursorTimeout", true);
        }
        if let Some(c) = &self.collation {
            d.insert("collation", c.to_document());
        }
        for (k, v) in &self.modifiers {
            d.insert(k.trim_start_matches('$'), v.clone());
        }
        d
    }
}

fn as_u64(v: &Bson) -> Option<u64> {
    match v {
        Bson::Int32(i) => u64::try_from(*i).ok(),
        Bson::Int64(i) => u64::try_from(*i).ok(),
        _ => None,
    }
}
