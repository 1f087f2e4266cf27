//! Wire types for the portfolio asset API.
//!
//! The API is loose about identifier types (some deployments return numeric
//! ids, others strings), so identifiers are normalized to their textual form.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Identifier as it appears on the wire: a JSON string or number.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(serde_json::Number),
}

fn deserialize_raw_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(text) => text,
        RawId::Number(number) => number.to_string(),
    })
}

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(#[serde(deserialize_with = "deserialize_raw_id")] String);

        impl $name {
            /// Returns the identifier as used in request paths.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

define_id!(
    /// Opaque identifier of a remote item (asset).
    ItemId
);

define_id!(
    /// Opaque identifier of a portfolio.
    PortfolioId
);

/// Value held by a remote item.
///
/// Newer API versions return `{amount, currency}`; older ones a bare scalar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemValue {
    Amount {
        amount: serde_json::Value,
        #[serde(skip_serializing_if = "Option::is_none")]
        currency: Option<String>,
    },
    Scalar(serde_json::Value),
}

impl ItemValue {
    /// Scalar value parsed from record text.
    ///
    /// Text that a JSON number reproduces exactly is sent as a number;
    /// anything else (`1500.10`, integers beyond 64 bits, `1e3`) verbatim as
    /// a string.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        Self::Scalar(number_or_text(text))
    }

    /// Amount with an explicit currency, parsed from record text.
    #[must_use]
    pub fn amount_from_text(amount: &str, currency: Option<&str>) -> Self {
        Self::Amount {
            amount: number_or_text(amount),
            currency: currency.map(str::to_string),
        }
    }

    /// The zero value matching the shape of `current`.
    ///
    /// Items holding an amount keep their currency; everything else is reset
    /// to the scalar `0`.
    #[must_use]
    pub fn zero_like(current: Option<&ItemValue>) -> Self {
        match current {
            Some(Self::Amount { currency, .. }) => Self::Amount {
                amount: serde_json::Value::from(0),
                currency: currency.clone(),
            },
            _ => Self::Scalar(serde_json::Value::from(0)),
        }
    }
}

fn number_or_text(text: &str) -> serde_json::Value {
    let trimmed = text.trim();
    match trimmed.parse::<serde_json::Number>() {
        Ok(number) if number.to_string() == trimmed => serde_json::Value::Number(number),
        _ => serde_json::Value::String(text.to_string()),
    }
}

/// A priced item as returned inside a portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteItem {
    pub id: ItemId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub value: Option<ItemValue>,
    /// Fields we do not interpret.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl RemoteItem {
    /// Minimal item, mostly useful for tests and fixtures.
    #[must_use]
    pub fn new(id: impl Into<ItemId>) -> Self {
        Self {
            id: id.into(),
            name: None,
            description: None,
            value: None,
            extra: serde_json::Map::new(),
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_value(mut self, value: ItemValue) -> Self {
        self.value = Some(value);
        self
    }
}

/// Entry of the portfolio listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    pub id: PortfolioId,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Body of `GET /data/portfolio/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PortfolioDetail {
    #[serde(default)]
    pub asset: Vec<RemoteItem>,
}

/// `{ "data": ... }` envelope used by every read endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct DataEnvelope<T> {
    pub data: T,
}

/// Body of a value push.
#[derive(Debug, Clone, Serialize)]
pub struct ValuePatch<'a> {
    pub value: &'a ItemValue,
}

/// Body of an attribute rewrite. Field order is part of the signed body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeRewrite {
    pub description: String,
    pub name: String,
}
