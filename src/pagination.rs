//! Skip/take pagination windows and feed identifiers

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};

use crate::{LinkError, Result};

/// Upper bound on `take` when none is configured
pub const DEFAULT_MAX_TAKE: u32 = 100;

/// Validated pagination window
///
/// `skip` and `take` apply after filtering and sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedWindow {
    pub skip: u64,
    pub take: u64,
}

impl FeedWindow {
    /// Validate raw `skip`/`take` arguments
    ///
    /// `skip` defaults to 0 and `take` defaults to `max_take`. Negative values,
    /// or a `take` above `max_take`, are rejected.
    pub fn new(skip: Option<i32>, take: Option<i32>, max_take: u32) -> Result<Self> {
        let skip = match skip {
            Some(skip) if skip < 0 => {
                return Err(LinkError::invalid_argument(
                    "skip",
                    "must be non-negative",
                ))
            }
            Some(skip) => skip as u64,
            None => 0,
        };

        let take = match take {
            Some(take) if take < 0 => {
                return Err(LinkError::invalid_argument(
                    "take",
                    "must be non-negative",
                ))
            }
            Some(take) if take as u32 > max_take => {
                return Err(LinkError::invalid_argument(
                    "take",
                    format!("cannot exceed {}", max_take),
                ))
            }
            Some(take) => take as u64,
            None => max_take as u64,
        };

        Ok(Self { skip, take })
    }
}

/// Feed identifier encoding/decoding
///
/// An id is the base64 of the JSON serialization of the query arguments, so
/// equal arguments give equal ids and distinct arguments give distinct ids.
pub struct FeedId;

impl FeedId {
    /// Encode structured arguments into an opaque id
    pub fn encode<T: Serialize>(value: &T) -> Result<String> {
        let json = serde_json::to_string(value)
            .map_err(|e| LinkError::invalid_argument("id", e.to_string()))?;
        Ok(BASE64.encode(json.as_bytes()))
    }

    /// Decode an id produced by [`FeedId::encode`]
    pub fn decode<T: for<'de> Deserialize<'de>>(id: &str) -> Result<T> {
        let bytes = BASE64
            .decode(id.as_bytes())
            .map_err(|e| LinkError::invalid_argument("id", e.to_string()))?;
        let json = String::from_utf8(bytes)
            .map_err(|e| LinkError::invalid_argument("id", e.to_string()))?;
        serde_json::from_str(&json).map_err(|e| LinkError::invalid_argument("id", e.to_string()))
    }
}
