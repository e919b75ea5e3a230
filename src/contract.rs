//! Response contract checking.
//!
//! Each endpoint family has its own notion of success. The rules are a closed
//! set of [`Contract`] variants so they can be checked without a network.

use serde_json::Value;

use crate::client::ApiResponse;

/// Outcome of one HTTP interaction, before it is judged.
pub type StepOutcome = crate::error::Result<ApiResponse>;

/// Shape the `data` field must have under [`Contract::Presence`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataShape {
    /// A non-empty JSON object.
    Map,
    /// A non-empty JSON array.
    List,
}

/// Success rule for a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contract {
    /// `code == 0` is success regardless of HTTP status.
    Envelope,
    /// Envelope plus a populated `data` field of the given shape.
    Presence(DataShape),
    /// Upstream provider body passed through verbatim: `choices[0].message.content`.
    RawProxy,
    /// HTTP 200 is success; the body is not inspected.
    StatusOnly,
    /// The request must be rejected.
    ExpectError,
}

/// Judgment of a [`StepOutcome`].
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// The response satisfied the contract.
    ///
    /// `payload` is the part of the body later extraction works on: the
    /// `data` field for envelope contracts, the whole body for raw-proxy,
    /// and `Null` otherwise. `note` describes a rejection under
    /// [`Contract::ExpectError`] and is empty elsewhere.
    Pass { payload: Value, note: String },
    /// The response violated the contract, or the request failed.
    Fail(String),
}

impl Verdict {
    fn pass(payload: Value) -> Self {
        Verdict::Pass {
            payload,
            note: String::new(),
        }
    }

    fn rejected(note: impl Into<String>) -> Self {
        Verdict::Pass {
            payload: Value::Null,
            note: note.into(),
        }
    }

    /// Returns true if the contract was satisfied.
    pub fn is_pass(&self) -> bool {
        matches!(self, Verdict::Pass { .. })
    }
}

impl Contract {
    /// Judges the outcome of a request.
    ///
    /// On a transport or decode error the body is never consulted; only the
    /// error's description is used. An unreachable backend satisfies
    /// [`Contract::ExpectError`]; an undecodable answer does not.
    pub fn check(&self, outcome: &StepOutcome) -> Verdict {
        let response = match outcome {
            Ok(response) => response,
            Err(err) => {
                return match self {
                    Contract::ExpectError if err.is_transport() => {
                        Verdict::rejected(format!("request rejected: {}", err))
                    }
                    _ => Verdict::Fail(err.to_string()),
                };
            }
        };

        match self {
            Contract::Envelope => match check_envelope(response) {
                Ok(body) => Verdict::pass(body.get("data").cloned().unwrap_or(Value::Null)),
                Err(cause) => Verdict::Fail(cause),
            },
            Contract::Presence(shape) => check_presence(response, *shape),
            Contract::RawProxy => check_raw_proxy(response),
            Contract::StatusOnly => {
                if response.status == 200 {
                    Verdict::pass(Value::Null)
                } else {
                    Verdict::Fail(format!("status code: {}", response.status))
                }
            }
            Contract::ExpectError => check_expect_error(response),
        }
    }
}

/// Returns the body if its envelope code signals success.
///
/// A missing `code` is accepted; plain JSON endpoints such as the health
/// probe omit it.
fn check_envelope(response: &ApiResponse) -> Result<&Value, String> {
    let body = match &response.body {
        Some(body) => body,
        None => return Err(format!("empty response body (status {})", response.status)),
    };
    if !body.is_object() {
        return Err("response is not a JSON object".to_string());
    }

    match envelope_code(body) {
        Ok(None) | Ok(Some(0)) => Ok(body),
        Ok(Some(code)) => Err(message_of(body).unwrap_or_else(|| format!("code {}", code))),
        Err(cause) => Err(cause),
    }
}

fn envelope_code(body: &Value) -> Result<Option<i64>, String> {
    match body.get("code") {
        None | Some(Value::Null) => Ok(None),
        Some(code) => code
            .as_i64()
            .or_else(|| code.as_f64().and_then(integral_code))
            .map(Some)
            .ok_or_else(|| format!("non-numeric code: {}", code)),
    }
}

fn integral_code(float: f64) -> Option<i64> {
    // i64::MAX is not exactly representable; stay strictly below 2^63
    if float.fract() == 0.0 && float >= i64::MIN as f64 && float < i64::MAX as f64 {
        Some(float as i64)
    } else {
        None
    }
}

fn check_presence(response: &ApiResponse, shape: DataShape) -> Verdict {
    let body = match check_envelope(response) {
        Ok(body) => body,
        Err(cause) => return Verdict::Fail(cause),
    };

    let data = match body.get("data") {
        None | Some(Value::Null) => return Verdict::Fail("response has no data field".to_string()),
        Some(data) => data,
    };

    match (shape, data) {
        (DataShape::Map, Value::Object(map)) if map.is_empty() => {
            Verdict::Fail("data is empty".to_string())
        }
        (DataShape::List, Value::Array(items)) if items.is_empty() => {
            Verdict::Fail("data is empty".to_string())
        }
        (DataShape::Map, Value::Object(_)) | (DataShape::List, Value::Array(_)) => {
            Verdict::pass(data.clone())
        }
        (DataShape::Map, _) => Verdict::Fail("data is not an object".to_string()),
        (DataShape::List, _) => Verdict::Fail("data is not a list".to_string()),
    }
}

fn check_raw_proxy(response: &ApiResponse) -> Verdict {
    let body = match &response.body {
        Some(body) => body,
        None => return Verdict::Fail(format!("empty response body (status {})", response.status)),
    };

    let first = match body.get("choices").and_then(Value::as_array) {
        Some(choices) if !choices.is_empty() => &choices[0],
        _ => {
            return Verdict::Fail(match message_of(body) {
                Some(message) => format!("no choices in response (status {}): {}", response.status, message),
                None => format!("no choices in response (status {})", response.status),
            });
        }
    };

    match first.pointer("/message/content").and_then(Value::as_str) {
        Some(content) if !content.is_empty() => Verdict::pass(body.clone()),
        _ => Verdict::Fail("first choice has no message content".to_string()),
    }
}

fn check_expect_error(response: &ApiResponse) -> Verdict {
    if !response.is_success_status() {
        return Verdict::rejected(format!("rejected with status {}", response.status));
    }

    let code = response
        .body
        .as_ref()
        .and_then(|body| envelope_code(body).ok().flatten());

    match code {
        Some(code) if code != 0 => {
            let message = response.body.as_ref().and_then(message_of);
            Verdict::rejected(match message {
                Some(message) => format!("rejected with code {}: {}", code, message),
                None => format!("rejected with code {}", code),
            })
        }
        _ => Verdict::Fail(format!("request was accepted (status {})", response.status)),
    }
}

/// Returns the envelope message, or an upstream `error.message`.
pub fn message_of(body: &Value) -> Option<String> {
    body.get("message")
        .and_then(Value::as_str)
        .or_else(|| body.pointer("/error/message").and_then(Value::as_str))
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

/// Returns a string field of an object.
pub fn field_str<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str)
}

/// Returns a non-negative integral id, accepting integral floats.
pub fn numeric_id(value: &Value) -> Option<u64> {
    if let Some(id) = value.as_u64() {
        return Some(id);
    }
    let float = value.as_f64()?;
    if float >= 0.0 && float.fract() == 0.0 && float <= u64::MAX as f64 {
        Some(float as u64)
    } else {
        None
    }
}
