//! Purpose: Uniform `{success, result, error}` envelope for every SDK call.
//! Exports: `ApiResponse`, `ErrorBody`.
//! Role: Shared contract between facades, the host transport, and plugins.
//! Invariants: `result` is present only on success; `error` only on failure.
use crate::core::error::{Error, ErrorKind};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: u32,
    pub message: String,
}

impl From<&Error> for ErrorBody {
    fn from(err: &Error) -> Self {
        Self {
            code: err.code(),
            message: err
                .message()
                .map(str::to_string)
                .unwrap_or_else(|| err.to_string()),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl<T> ApiResponse<T> {
    pub fn success(result: T) -> Self {
        Self {
            success: true,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(err: &Error) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(ErrorBody::from(err)),
        }
    }

    /// Successful response with a non-null result.
    pub fn has_result(&self) -> bool {
        self.success && self.result.is_some()
    }
}

impl ApiResponse<Value> {
    /// Reinterpret the raw host payload as `T`. A payload that does not
    /// match the expected shape is a broken host contract, not a business
    /// failure, so it surfaces as an `Err` rather than a failure envelope.
    pub fn decode<T: DeserializeOwned>(self) -> Result<ApiResponse<T>, Error> {
        let result = match (self.success, self.result) {
            (true, Some(value)) => Some(serde_json::from_value(value).map_err(|err| {
                Error::new(ErrorKind::Unclassified)
                    .with_message("host payload did not match the expected shape")
                    .with_source(err)
            })?),
            _ => None,
        };
        Ok(ApiResponse {
            success: self.success,
            result,
            error: self.error,
        })
    }
}
