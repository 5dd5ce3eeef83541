use serde::Deserialize;
use serde_json::Value;
use spdlog::trace;

/// The `{Value, PropertyDataType}` envelope the CMS puts around some
/// properties, but not all of them.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Wrapped<T> {
    #[serde(rename = "Value", default)]
    pub value: T,
    #[serde(rename = "PropertyDataType", default)]
    pub data_type: Option<String>,
}

/// A text property as it arrives on the wire.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum TextField {
    Plain(String),
    Wrapped(Wrapped<Option<String>>),
    Unknown(Value),
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct CategoryEntry {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Category property: either the bare list or the list inside an envelope.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum CategoryField {
    List(Vec<CategoryEntry>),
    Wrapped(Wrapped<Vec<CategoryEntry>>),
    Unknown(Value),
}

pub fn normalize_text(field: Option<&TextField>) -> String {
    match field {
        None => String::new(),
        Some(TextField::Plain(text)) => text.clone(),
        Some(TextField::Wrapped(wrapped)) => wrapped.value.clone().unwrap_or_default(),
        Some(TextField::Unknown(value)) => {
            trace!("Ignoring text field with unexpected shape: {}", value);
            String::new()
        }
    }
}

pub fn normalize_categories(field: Option<&CategoryField>) -> Vec<String> {
    let entries = match field {
        None => return vec![],
        Some(CategoryField::List(entries)) => entries,
        Some(CategoryField::Wrapped(wrapped)) => &wrapped.value,
        Some(CategoryField::Unknown(value)) => {
            trace!("Ignoring category field with unexpected shape: {}", value);
            return vec![];
        }
    };

    entries.iter()
        .filter(|entry| !entry.name.is_empty())
        .map(|entry| entry.name.clone())
        .collect()
}

pub fn normalize_keywords(field: Option<&TextField>) -> Vec<String> {
    split_keywords(&normalize_text(field))
}

/// Comma separated list, trimmed, empty tokens dropped. Duplicates are kept.
pub fn split_keywords(keywords: &str) -> Vec<String> {
    keywords.split(',')
        .map(|token| token.trim())
        .filter(|token| !token.is_empty())
        .map(|token| token.to_string())
        .collect()
}
