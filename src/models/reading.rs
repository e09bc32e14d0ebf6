// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Tag-read payloads accepted by the ingest endpoints.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Convert a raw reader time to whole, non-negative milliseconds.
///
/// Fractions are floored and negatives clamp to zero; nothing is rejected
/// for being out of range.
pub fn sanitize_ms(raw: f64) -> u64 {
    if raw.is_nan() {
        return 0;
    }
    // `as` saturates at the integer bounds
    raw.floor().max(0.0) as u64
}

/// `POST /sessions/start`
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct StartSessionRequest {
    #[validate(length(min = 1, max = 128))]
    pub device_name: String,
}

/// `POST /ingest/read`
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SingleReadRequest {
    #[validate(length(min = 1, max = 128))]
    pub tag_id: String,
    pub time_ms: f64,
    #[validate(length(min = 1, max = 128))]
    pub device_id: String,
}

/// One read inside a batch.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TagRead {
    #[validate(length(min = 1, max = 128))]
    pub tag_id: String,
    pub time_ms: f64,
}

/// `POST /ingest/batch`
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BatchReadRequest {
    #[validate(length(min = 1, max = 128))]
    pub device_id: String,
    #[validate(length(min = 1, max = 500))]
    #[validate(nested)]
    pub items: Vec<TagRead>,
}

/// One read in the legacy reader payload.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LegacyRead {
    #[validate(length(min = 1, max = 128))]
    pub epc: String,
    pub t_ms: f64,
    /// Signal strength; accepted but unused
    #[serde(default)]
    pub rssi: Option<f64>,
}

/// `POST /ingestRfid` body as sent by the gate readers.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LegacyIngestRequest {
    #[serde(default)]
    pub start_ts: Option<f64>,
    #[serde(default, rename = "deviceId")]
    pub device_id: Option<String>,
    #[validate(length(max = 500))]
    #[validate(nested)]
    pub items: Vec<LegacyRead>,
}

impl LegacyIngestRequest {
    /// Reader start timestamp; absent or zero means the payload is unusable.
    pub fn start_ts(&self) -> Option<i64> {
        self.start_ts
            .filter(|ts| *ts != 0.0 && !ts.is_nan())
            .map(|ts| ts.floor() as i64)
    }

    pub fn reads(&self) -> Vec<TagRead> {
        self.items
            .iter()
            .map(|item| TagRead {
                tag_id: item.epc.clone(),
                time_ms: item.t_ms,
            })
            .collect()
    }
}

/// Per-request summary of a batch ingest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    /// Reads appended to the session
    pub processed: usize,
    /// Reads whose tag did not resolve
    pub skipped: usize,
    /// Distinct roster entries that received times
    pub riders: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_ms() {
        assert_eq!(sanitize_ms(1234.9), 1234);
        assert_eq!(sanitize_ms(-5.0), 0);
        assert_eq!(sanitize_ms(-0.5), 0);
        assert_eq!(sanitize_ms(f64::NAN), 0);
        assert_eq!(sanitize_ms(f64::INFINITY), u64::MAX);
        assert_eq!(sanitize_ms(0.0), 0);
    }

    #[test]
    fn test_batch_validation() {
        let empty = BatchReadRequest {
            device_id: "gate".to_string(),
            items: vec![],
        };
        assert!(empty.validate().is_err());

        let bad_item = BatchReadRequest {
            device_id: "gate".to_string(),
            items: vec![TagRead {
                tag_id: String::new(),
                time_ms: 1.0,
            }],
        };
        assert!(bad_item.validate().is_err());

        let ok = BatchReadRequest {
            device_id: "gate".to_string(),
            items: vec![TagRead {
                tag_id: "E200".to_string(),
                time_ms: 1.0,
            }],
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_batch_length_limits() {
        let read = TagRead {
            tag_id: "E200".to_string(),
            time_ms: 1.0,
        };
        let oversized = BatchReadRequest {
            device_id: "gate".to_string(),
            items: vec![read.clone(); 501],
        };
        let errors = oversized.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("items"));

        let legacy: LegacyIngestRequest = serde_json::from_value(serde_json::json!({
            "start_ts": 1,
            "items": vec![serde_json::json!({"epc": "E1", "t_ms": 1.0}); 501]
        }))
        .unwrap();
        assert!(legacy.validate().is_err());

        let full = BatchReadRequest {
            device_id: "gate".to_string(),
            items: vec![read; 500],
        };
        assert!(full.validate().is_ok());
    }

    #[test]
    fn test_legacy_start_ts() {
        let parsed: LegacyIngestRequest = serde_json::from_value(serde_json::json!({
            "start_ts": 1700000000123.7,
            "deviceId": "reader-1",
            "items": [{"epc": "E1", "t_ms": 10.2, "rssi": -40}]
        }))
        .unwrap();
        assert_eq!(parsed.start_ts(), Some(1700000000123));
        assert_eq!(parsed.device_id.as_deref(), Some("reader-1"));
        assert_eq!(parsed.reads()[0].tag_id, "E1");

        let zero: LegacyIngestRequest =
            serde_json::from_value(serde_json::json!({"start_ts": 0, "items": []})).unwrap();
        assert_eq!(zero.start_ts(), None);
    }
}
