use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use std::fmt;

use crate::error::{Result, WikibaseError};

/// Identifier of a Wikibase item (`Q` followed by digits).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemId(String);

impl ItemId {
    /// Parse `Q123` (case-insensitive prefix). Returns `None` for anything else,
    /// including `Q0` and numbers that do not fit in a `u64`.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let digits = raw.strip_prefix('Q').or_else(|| raw.strip_prefix('q'))?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        match digits.parse::<u64>() {
            Ok(0) | Err(_) => None,
            Ok(numeric) => Some(Self::from_numeric(numeric)),
        }
    }

    pub fn from_numeric(id: u64) -> Self {
        Self(format!("Q{}", id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn numeric_id(&self) -> u64 {
        // Constructors guarantee the digits.
        self.0[1..].parse().unwrap_or_default()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Value held by a statement's main snak.
#[derive(Debug, Clone, PartialEq)]
pub enum SnakValue {
    String(String),
    Item(ItemId),
    NoValue,
    SomeValue,
    Other(serde_json::Value),
}

impl fmt::Display for SnakValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(value) => f.write_str(value),
            Self::Item(id) => write!(f, "{}", id),
            Self::NoValue => f.write_str("novalue"),
            Self::SomeValue => f.write_str("somevalue"),
            Self::Other(value) => write!(f, "{}", value),
        }
    }
}

/// A single statement on an item.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// Statement GUID, e.g. `Q42$F078E5B3-...`
    pub id: String,
    pub property: String,
    pub value: SnakValue,
}

/// A resolved item with its labels and statements.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Item {
    pub id: Option<ItemId>,
    pub labels: HashMap<String, String>,
    pub claims: HashMap<String, Vec<Statement>>,
}

impl Item {
    pub fn label(&self, lang: &str) -> Option<&str> {
        self.labels.get(lang).map(String::as_str)
    }

    pub fn statements(&self, property: &str) -> &[Statement] {
        self.claims.get(property).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Main value of the first statement for `property`.
    pub fn first_value(&self, property: &str) -> Option<&SnakValue> {
        self.statements(property).first().map(|s| &s.value)
    }

    /// First string value for `property`, if the first statement holds one.
    pub fn first_string(&self, property: &str) -> Option<&str> {
        match self.first_value(property) {
            Some(SnakValue::String(value)) => Some(value),
            _ => None,
        }
    }

    /// Item targets of `property`, in statement order.
    pub fn item_targets(&self, property: &str) -> Vec<&ItemId> {
        self.statements(property)
            .iter()
            .filter_map(|s| match &s.value {
                SnakValue::Item(id) => Some(id),
                _ => None,
            })
            .collect()
    }
}

// =============================================================================
// Raw API payloads
// =============================================================================

/// The API encodes empty objects as `[]`.
#[derive(Deserialize)]
#[serde(untagged)]
enum MapOrList<T> {
    Map(HashMap<String, T>),
    List(Vec<serde_json::Value>),
}

fn map_or_empty<'de, D, T>(deserializer: D) -> std::result::Result<HashMap<String, T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    match Option::<MapOrList<T>>::deserialize(deserializer)? {
        Some(MapOrList::Map(map)) => Ok(map),
        _ => Ok(HashMap::new()),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct EntitiesResponse {
    #[serde(default, deserialize_with = "map_or_empty")]
    pub entities: HashMap<String, RawEntity>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawEntity {
    pub id: Option<String>,
    pub missing: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "map_or_empty")]
    pub labels: HashMap<String, RawLabel>,
    #[serde(default, deserialize_with = "map_or_empty")]
    pub claims: HashMap<String, Vec<RawStatement>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawLabel {
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawStatement {
    pub id: String,
    pub mainsnak: RawSnak,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawSnak {
    pub snaktype: String,
    pub property: String,
    pub datavalue: Option<RawDataValue>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawDataValue {
    pub value: serde_json::Value,
    #[serde(rename = "type")]
    pub kind: String,
}

impl RawSnak {
    fn into_value(self) -> SnakValue {
        match self.snaktype.as_str() {
            "novalue" => return SnakValue::NoValue,
            "somevalue" => return SnakValue::SomeValue,
            _ => {}
        }
        let Some(datavalue) = self.datavalue else {
            return SnakValue::NoValue;
        };
        match datavalue.kind.as_str() {
            "string" => match datavalue.value {
                serde_json::Value::String(s) => SnakValue::String(s),
                other => SnakValue::Other(other),
            },
            "wikibase-entityid" => {
                let from_id = datavalue
                    .value
                    .get("id")
                    .and_then(|v| v.as_str())
                    .and_then(ItemId::parse);
                let from_numeric = datavalue
                    .value
                    .get("numeric-id")
                    .and_then(|v| v.as_u64())
                    .map(ItemId::from_numeric);
                match from_id.or(from_numeric) {
                    Some(id) => SnakValue::Item(id),
                    None => SnakValue::Other(datavalue.value),
                }
            }
            _ => SnakValue::Other(datavalue.value),
        }
    }
}

impl RawEntity {
    fn into_item(self) -> Option<Item> {
        if self.missing.is_some() {
            return None;
        }
        let labels = self
            .labels
            .into_iter()
            .map(|(lang, label)| (lang, label.value))
            .collect();
        let claims = self
            .claims
            .into_iter()
            .map(|(property, statements)| {
                let statements = statements
                    .into_iter()
                    .map(|raw| Statement {
                        id: raw.id,
                        property: raw.mainsnak.property.clone(),
                        value: raw.mainsnak.into_value(),
                    })
                    .collect();
                (property, statements)
            })
            .collect();
        Some(Item {
            id: self.id.as_deref().and_then(ItemId::parse),
            labels,
            claims,
        })
    }
}

/// Fail on an action API `error` envelope.
pub(crate) fn check_api_error(body: &serde_json::Value) -> Result<()> {
    if let Some(error) = body.get("error") {
        let field = |name: &str| {
            error
                .get(name)
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string()
        };
        return Err(WikibaseError::Api {
            code: field("code"),
            info: field("info"),
        });
    }
    Ok(())
}

/// Extract the single entity from a `wbgetentities` response.
///
/// `Ok(None)` when the entity is marked missing or absent.
pub fn parse_single_entity(body: serde_json::Value) -> Result<Option<Item>> {
    check_api_error(&body)?;
    let response: EntitiesResponse =
        serde_json::from_value(body).map_err(|e| WikibaseError::Parse(e.to_string()))?;
    Ok(response
        .entities
        .into_values()
        .next()
        .and_then(RawEntity::into_item))
}

/// Datavalue JSON for an item target, as expected by `wbcreateclaim` and `wbsetreference`.
pub(crate) fn item_datavalue(target: &ItemId) -> serde_json::Value {
    serde_json::json!({
        "entity-type": "item",
        "numeric-id": target.numeric_id(),
    })
}

/// Snaks JSON for a single-snak reference.
pub(crate) fn reference_snaks(property: &str, target: &ItemId) -> serde_json::Value {
    let snak = serde_json::json!({
        "snaktype": "value",
        "property": property,
        "datavalue": {
            "type": "wikibase-entityid",
            "value": item_datavalue(target),
        },
    });
    let mut snaks = serde_json::Map::new();
    snaks.insert(property.to_string(), serde_json::Value::Array(vec![snak]));
    serde_json::Value::Object(snaks)
}
