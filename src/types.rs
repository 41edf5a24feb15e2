//! GraphQL scalar, enum and input types shared by the schema

use async_graphql::{Enum, InputObject, Scalar, ScalarType, Value};
use chrono::{DateTime as ChronoDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{LinkError, Result};

/// DateTime scalar (RFC 3339)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateTime(pub ChronoDateTime<Utc>);

#[Scalar]
impl ScalarType for DateTime {
    fn parse(value: Value) -> async_graphql::InputValueResult<Self> {
        if let Value::String(s) = value {
            Ok(DateTime(
                ChronoDateTime::parse_from_rfc3339(&s)
                    .map_err(|e| format!("Invalid DateTime: {}", e))?
                    .with_timezone(&Utc),
            ))
        } else {
            Err("Expected string for DateTime".into())
        }
    }

    fn to_value(&self) -> Value {
        Value::String(self.0.to_rfc3339())
    }
}

impl From<ChronoDateTime<Utc>> for DateTime {
    fn from(value: ChronoDateTime<Utc>) -> Self {
        DateTime(value)
    }
}

/// Sort direction
#[derive(Enum, Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[graphql(rename_items = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Sort {
    Asc,
    Desc,
}

/// Link fields a feed can be ordered by
///
/// The GraphQL surface names them through [`LinkOrderByInput`]; any other
/// name is rejected during validation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SortField {
    Description,
    Url,
    CreatedAt,
}

/// One ordering key of a feed query
///
/// Exactly one field must be set per element; multiple elements form a
/// composite sort with the first element as the primary key.
#[derive(InputObject, Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkOrderByInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Sort>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<Sort>,
    #[serde(rename = "createdAt", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Sort>,
}

impl LinkOrderByInput {
    /// Resolve this element into its single (field, direction) pair
    pub fn key(&self) -> Result<(SortField, Sort)> {
        let set: Vec<(SortField, Sort)> = [
            (SortField::Description, self.description),
            (SortField::Url, self.url),
            (SortField::CreatedAt, self.created_at),
        ]
        .into_iter()
        .filter_map(|(field, sort)| sort.map(|s| (field, s)))
        .collect();

        match set.as_slice() {
            [single] => Ok(*single),
            [] => Err(LinkError::invalid_argument(
                "orderBy",
                "each element must name one of description, url, createdAt",
            )),
            _ => Err(LinkError::invalid_argument(
                "orderBy",
                "each element must name exactly one field; use separate elements for composite ordering",
            )),
        }
    }
}
