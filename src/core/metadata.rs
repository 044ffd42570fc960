//! Per-image metadata records and the editable fields they expose.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

// ───────────────────────────────────────── record ────────────

/// Metadata for one image, keyed by its file name.
///
/// Field names on the wire follow the metadata server's JSON
/// (`Filename`, `Artist`, `DateTime`, `GPS`, …).  Missing or `null`
/// entries read as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Metadata {
    pub filename: String,
    pub artist: String,
    pub caption: String,
    pub date_time: String,
    #[serde(rename = "GPS")]
    pub gps: String,
    #[serde(deserialize_with = "null_as_default")]
    pub groups: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub keywords: Vec<String>,
    pub location: String,
    #[serde(deserialize_with = "null_as_default")]
    pub people: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub places: Vec<String>,
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub topics: Vec<String>,
}

impl Metadata {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            ..Self::default()
        }
    }

    pub fn value(&self, field: Field) -> FieldValue {
        match field {
            Field::Artist => FieldValue::Text(self.artist.clone()),
            Field::Caption => FieldValue::Text(self.caption.clone()),
            Field::Gps => FieldValue::Text(self.gps.clone()),
            Field::Groups => FieldValue::List(self.groups.clone()),
            Field::Keywords => FieldValue::List(self.keywords.clone()),
            Field::Location => FieldValue::Text(self.location.clone()),
            Field::People => FieldValue::List(self.people.clone()),
            Field::Places => FieldValue::List(self.places.clone()),
            Field::Title => FieldValue::Text(self.title.clone()),
            Field::Topics => FieldValue::List(self.topics.clone()),
        }
    }

    /// Overwrite one field.  A value of the wrong shape is converted: text
    /// becomes a one-element list, a list is joined with `"; "`.
    pub fn set_value(&mut self, field: Field, value: FieldValue) {
        match field {
            Field::Artist => self.artist = value.into_text(),
            Field::Caption => self.caption = value.into_text(),
            Field::Gps => self.gps = value.into_text(),
            Field::Groups => self.groups = value.into_list(),
            Field::Keywords => self.keywords = value.into_list(),
            Field::Location => self.location = value.into_text(),
            Field::People => self.people = value.into_list(),
            Field::Places => self.places = value.into_list(),
            Field::Title => self.title = value.into_text(),
            Field::Topics => self.topics = value.into_list(),
        }
    }
}

// ───────────────────────────────────────── fields ────────────

/// The editable fields of a [`Metadata`] record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Artist,
    Caption,
    Gps,
    Groups,
    Keywords,
    Location,
    People,
    Places,
    Title,
    Topics,
}

impl Field {
    /// Display order in the field pane.
    pub const ALL: &[Field] = &[
        Field::Title,
        Field::Caption,
        Field::Artist,
        Field::Location,
        Field::Gps,
        Field::People,
        Field::Places,
        Field::Topics,
        Field::Groups,
        Field::Keywords,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Field::Artist => "Artist",
            Field::Caption => "Caption",
            Field::Gps => "GPS",
            Field::Groups => "Groups",
            Field::Keywords => "Keywords",
            Field::Location => "Location",
            Field::People => "People",
            Field::Places => "Places",
            Field::Title => "Title",
            Field::Topics => "Topics",
        }
    }

    pub fn is_list(self) -> bool {
        matches!(
            self,
            Field::Groups | Field::Keywords | Field::People | Field::Places | Field::Topics
        )
    }
}

/// Separator used when a list field is shown or edited as one line.
pub const LIST_SEPARATOR: &str = "; ";

/// The value of one editable field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    /// Single-line rendering, lists joined with [`LIST_SEPARATOR`].
    pub fn display(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::List(items) => items.join(LIST_SEPARATOR),
        }
    }

    /// Parse an edited line back into a value of `field`'s shape.  List
    /// items are split on `;`, trimmed, and blanks dropped.
    pub fn parse(field: Field, line: &str) -> Self {
        if field.is_list() {
            FieldValue::List(
                line.split(';')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect(),
            )
        } else {
            FieldValue::Text(line.trim().to_string())
        }
    }

    pub fn into_text(self) -> String {
        match self {
            FieldValue::Text(s) => s,
            FieldValue::List(items) => items.join(LIST_SEPARATOR),
        }
    }

    pub fn into_list(self) -> Vec<String> {
        match self {
            FieldValue::List(items) => items,
            FieldValue::Text(s) if s.is_empty() => Vec::new(),
            FieldValue::Text(s) => vec![s],
        }
    }
}

// ───────────────────────────────────────── date/time ─────────

/// Make a raw ISO-8601 timestamp easier to read.
///
/// `2021-06-05T14:03:22.123-07:00` becomes `Sat 2021-06-05 14:03:22 -07:00`:
/// the `T` becomes a space, fractional seconds are dropped, the zone is set
/// apart, and the weekday is prefixed.  Anything not starting with a date,
/// such as a value already in this form, is returned unchanged.
pub fn display_date_time(raw: &str) -> String {
    let Some(date) = raw
        .get(..10)
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
    else {
        return raw.to_string();
    };

    let mut out = raw.to_string();
    if out.len() > 10 && out.is_char_boundary(11) {
        out = format!("{} {}", &out[..10], &out[11..]);
        let dot = out.find('.');
        let zone = out[10..].find(&['-', '+', 'Z'][..]).map(|i| i + 10);
        out = match (dot, zone) {
            (Some(dot), None) => out[..dot].to_string(),
            (Some(dot), Some(zone)) if dot < zone => {
                format!("{} {}", &out[..dot], &out[zone..])
            }
            (_, Some(zone)) => format!("{} {}", &out[..zone], &out[zone..]),
            (None, None) => out,
        };
    }
    format!("{} {out}", date.format("%a"))
}

// ───────────────────────────────────────── serde helpers ─────

/// Treat an explicit `null` like a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
