// Copyright 2025 the ipip Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Inbound payload decoding.
//!
//! A payload is a JSON object keyed by figure name, each figure an object
//! keyed by stream name. Two stream shapes are accepted:
//!
//! ```json
//! { "fig1": { "sin": { "time": 1.5, "value": 0.99 },
//!             "heat": { "time": 1.5, "value": [0.1, 0.7], "ymin": 0, "ymax": 2 } } }
//! ```
//!
//! and the compact form with one shared timestamp:
//!
//! ```json
//! { "time": 1.5, "fig1": { "sin": 0.99, "heat": [0.1, 0.7] } }
//! ```
//!
//! A stream-level `time` wins over the shared one. Each stream is decoded on
//! its own: a malformed stream is reported and skipped, the rest of the
//! payload still goes through.

use serde_json::Value;
use thiserror::Error;

/// The key of the shared timestamp in the compact payload form.
const TIME_KEY: &str = "time";

/// One decoded sample for one stream.
#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
    /// Figure (subplot) the stream belongs to.
    pub figure: String,
    /// Stream name, unique within its figure.
    pub stream: String,
    /// Timestamp in seconds.
    pub time: f64,
    /// One value for a scalar stream, one per channel for a vector stream.
    pub values: Vec<f64>,
    /// Data-space y extent of the heatmap rows, if the sample set one.
    pub y_min: Option<f64>,
    /// See [`Self::y_min`].
    pub y_max: Option<f64>,
}

/// Why a payload, or one stream in it, was rejected.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The body is not JSON.
    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),
    /// The top level is not an object.
    #[error("payload must be a JSON object")]
    NotAnObject,
    /// A figure entry is not an object.
    #[error("figure {figure:?} must be an object of streams")]
    FigureNotAnObject {
        /// Figure name.
        figure: String,
    },
    /// Neither the stream nor the payload carries a numeric timestamp.
    #[error("stream {figure}/{stream}: missing numeric `time`")]
    MissingTime {
        /// Figure name.
        figure: String,
        /// Stream name.
        stream: String,
    },
    /// `value` is absent or not a number / array of numbers.
    #[error("stream {figure}/{stream}: `value` must be a number or an array of numbers")]
    BadValue {
        /// Figure name.
        figure: String,
        /// Stream name.
        stream: String,
    },
    /// `value` is an empty array.
    #[error("stream {figure}/{stream}: `value` is empty")]
    EmptyValue {
        /// Figure name.
        figure: String,
        /// Stream name.
        stream: String,
    },
    /// `ymin` or `ymax` is present but not a number.
    #[error("stream {figure}/{stream}: `{field}` must be a number")]
    BadExtent {
        /// Figure name.
        figure: String,
        /// Stream name.
        stream: String,
        /// `"ymin"` or `"ymax"`.
        field: &'static str,
    },
}

/// Everything decoded from one payload.
#[derive(Debug, Default)]
pub struct DecodedPayload {
    /// Well-formed samples, ordered by figure then stream name.
    pub samples: Vec<Sample>,
    /// One entry per rejected figure or stream.
    pub errors: Vec<DecodeError>,
}

/// Decodes a payload that is already parsed.
pub fn decode_payload(payload: &Value) -> DecodedPayload {
    let mut out = DecodedPayload::default();
    let Some(root) = payload.as_object() else {
        out.errors.push(DecodeError::NotAnObject);
        return out;
    };
    let shared_time = root.get(TIME_KEY).and_then(Value::as_f64);

    for (figure, streams) in root {
        if figure == TIME_KEY && streams.is_number() {
            continue;
        }
        let Some(streams) = streams.as_object() else {
            out.errors.push(DecodeError::FigureNotAnObject {
                figure: figure.clone(),
            });
            continue;
        };
        for (stream, entry) in streams {
            match decode_stream(figure, stream, entry, shared_time) {
                Ok(sample) => out.samples.push(sample),
                Err(err) => out.errors.push(err),
            }
        }
    }
    out
}

/// Parses and decodes a JSON body.
pub fn decode_str(body: &str) -> Result<DecodedPayload, DecodeError> {
    let value: Value = serde_json::from_str(body)?;
    Ok(decode_payload(&value))
}

fn decode_stream(
    figure: &str,
    stream: &str,
    entry: &Value,
    shared_time: Option<f64>,
) -> Result<Sample, DecodeError> {
    let names = || (figure.to_owned(), stream.to_owned());
    let (fields, value) = match entry {
        Value::Object(fields) => (Some(fields), fields.get("value")),
        other => (None, Some(other)),
    };

    let time = fields
        .and_then(|f| f.get(TIME_KEY))
        .and_then(Value::as_f64)
        .or(shared_time)
        .ok_or_else(|| {
            let (figure, stream) = names();
            DecodeError::MissingTime { figure, stream }
        })?;

    let values = match value {
        Some(Value::Number(n)) => n.as_f64().map(|v| vec![v]),
        Some(Value::Array(items)) => items.iter().map(Value::as_f64).collect(),
        _ => None,
    }
    .ok_or_else(|| {
        let (figure, stream) = names();
        DecodeError::BadValue { figure, stream }
    })?;
    if values.is_empty() {
        let (figure, stream) = names();
        return Err(DecodeError::EmptyValue { figure, stream });
    }

    let extent = |field: &'static str| -> Result<Option<f64>, DecodeError> {
        match fields.and_then(|f| f.get(field)) {
            None => Ok(None),
            Some(v) => v.as_f64().map(Some).ok_or_else(|| {
                let (figure, stream) = names();
                DecodeError::BadExtent {
                    figure,
                    stream,
                    field,
                }
            }),
        }
    };

    Ok(Sample {
        figure: figure.to_owned(),
        stream: stream.to_owned(),
        time,
        values,
        y_min: extent("ymin")?,
        y_max: extent("ymax")?,
    })
}
