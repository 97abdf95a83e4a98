use serde::{de::Error as _, Deserialize, Deserializer};
use serde_json::Value;

use crate::Result;

/// Page size the registry assumes when a response doesn't state one.
const DEFAULT_PAGE_SIZE: u64 = 200;

/// One response of the catalogue API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResult {
    #[serde(default, deserialize_with = "lenient_count")]
    pub total_count: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub page_size: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub pages_total_count: Option<u64>,
    /// `None` when the response has no `items` key at all.
    #[serde(default, deserialize_with = "lenient_items")]
    pub items: Option<Vec<RecordDescriptor>>,
}

impl PageResult {
    pub fn total_count(&self) -> u64 {
        self.total_count.unwrap_or(0)
    }

    pub fn page_size(&self) -> u64 {
        self.page_size.unwrap_or(DEFAULT_PAGE_SIZE)
    }

    /// Falls back to a single page when the count is missing or unreadable,
    /// so a malformed field never stalls the crawl.
    pub fn pages_total_count(&self) -> u32 {
        self.pages_total_count
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or(1)
    }
}

/// One catalogue entry. Only `eo_number` is needed to download the file and
/// even that may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordDescriptor {
    #[serde(default, deserialize_with = "lenient_string")]
    pub eo_number: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub number: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub document_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub publish_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_authority")]
    pub signatory_authority: Option<SignatoryAuthority>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SignatoryAuthority {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
}

impl RecordDescriptor {
    pub fn authority_name(&self) -> Option<&str> {
        self.signatory_authority.as_ref()?.name.as_deref()
    }
}

/// Decodes a catalogue response body. Anything but a JSON object is rejected.
pub(crate) fn parse_page(body: &str) -> Result<PageResult> {
    let value: Value = serde_json::from_str(body)?;
    if !value.is_object() {
        return Err(serde_json::Error::custom(format!(
            "expected a JSON object, found {}",
            json_kind(&value)
        ))
        .into());
    }
    Ok(serde_json::from_value(value)?)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Accepts any JSON value and keeps it only if it reads as a non-negative
/// integer (numbers or numeric strings).
fn lenient_count<'de, D>(deserializer: D) -> core::result::Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Strings are kept, numbers become their decimal form, anything else is
/// treated as absent.
fn lenient_string<'de, D>(deserializer: D) -> core::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_authority<'de, D>(
    deserializer: D,
) -> core::result::Result<Option<SignatoryAuthority>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Object(_) => serde_json::from_value(value).ok(),
        _ => None,
    })
}

/// A malformed entry becomes an empty record instead of failing the page,
/// so it still shows up downstream as a record without identifier.
fn lenient_items<'de, D>(
    deserializer: D,
) -> core::result::Result<Option<Vec<RecordDescriptor>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => Some(
            items
                .into_iter()
                .map(|item| match item {
                    Value::Object(_) => serde_json::from_value(item).unwrap_or_default(),
                    _ => RecordDescriptor::default(),
                })
                .collect(),
        ),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn parses_full_page() {
        let body = r#"{
            "totalCount": 2,
            "pageSize": 30,
            "pagesTotalCount": 1,
            "items": [
                {
                    "eoNumber": "0001202510170001",
                    "title": "Указ Президента",
                    "number": "712",
                    "documentDate": "2025-10-16T00:00:00",
                    "publishDate": "2025-10-17T00:00:00",
                    "signatoryAuthority": { "name": "Президент Российской Федерации" }
                },
                { "eoNumber": "0001202510170002" }
            ]
        }"#;

        let page = parse_page(body).unwrap();
        assert_eq!(page.total_count(), 2);
        assert_eq!(page.page_size(), 30);
        assert_eq!(page.pages_total_count(), 1);

        let items = page.items.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].eo_number.as_deref(), Some("0001202510170001"));
        assert_eq!(items[0].authority_name(), Some("Президент Российской Федерации"));
        assert_eq!(items[1].title, None);
        assert_eq!(items[1].authority_name(), None);
    }

    #[test]
    fn missing_items_is_not_an_error() {
        let page = parse_page(r#"{"totalCount": 0, "pagesTotalCount": 1}"#).unwrap();
        assert!(page.items.is_none());
    }

    #[test]
    fn pagination_fields_fall_back_to_defaults() {
        let page = parse_page("{}").unwrap();
        assert_eq!(page.total_count(), 0);
        assert_eq!(page.page_size(), 200);
        assert_eq!(page.pages_total_count(), 1);

        let page = parse_page(r#"{"pagesTotalCount": "three"}"#).unwrap();
        assert_eq!(page.pages_total_count(), 1);

        let page = parse_page(r#"{"pagesTotalCount": -4}"#).unwrap();
        assert_eq!(page.pages_total_count(), 1);

        let page = parse_page(r#"{"pagesTotalCount": "4"}"#).unwrap();
        assert_eq!(page.pages_total_count(), 4);
    }

    #[test]
    fn null_fields_are_absent() {
        let page = parse_page(
            r#"{"items": [{"eoNumber": null, "title": null, "signatoryAuthority": null}]}"#,
        )
        .unwrap();
        assert_eq!(page.items.unwrap()[0], RecordDescriptor::default());
    }

    #[test]
    fn unreadable_body_is_schema_error() {
        assert!(matches!(parse_page(""), Err(Error::Schema(_))));
        assert!(matches!(parse_page("<html></html>"), Err(Error::Schema(_))));
        assert!(matches!(parse_page("[1, 2]"), Err(Error::Schema(_))));
        assert!(matches!(parse_page("[]"), Err(Error::Schema(_))));
        assert!(matches!(parse_page("null"), Err(Error::Schema(_))));
        assert!(matches!(parse_page(r#""items""#), Err(Error::Schema(_))));
    }

    #[test]
    fn numeric_fields_read_as_text() {
        let page = parse_page(
            r#"{"items": [
                {"eoNumber": 1202510170001, "number": 712, "title": true},
                {"eoNumber": "0001202510170002", "number": "713"}
            ]}"#,
        )
        .unwrap();

        let items = page.items.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].eo_number.as_deref(), Some("1202510170001"));
        assert_eq!(items[0].number.as_deref(), Some("712"));
        assert_eq!(items[0].title, None);
        assert_eq!(items[1].number.as_deref(), Some("713"));
    }

    #[test]
    fn malformed_entries_keep_their_place() {
        let page = parse_page(
            r#"{"items": [
                "garbage",
                [1, 2],
                {"eoNumber": "a", "signatoryAuthority": "Президент"},
                {"eoNumber": "b", "signatoryAuthority": {"name": 5}}
            ]}"#,
        )
        .unwrap();

        let items = page.items.unwrap();
        assert_eq!(items.len(), 4);
        assert_eq!(items[0], RecordDescriptor::default());
        assert_eq!(items[1], RecordDescriptor::default());
        assert_eq!(items[2].eo_number.as_deref(), Some("a"));
        assert_eq!(items[2].authority_name(), None);
        assert_eq!(items[3].authority_name(), Some("5"));
    }
}
