use serde_json::Value;

use crate::enbox::error::EnboxError;
use crate::enbox::transport::RawResponse;
use crate::enbox::types::{ApiResult, EnboxList};

/// Maps a gateway response onto an [`ApiResult`].
///
/// Only 200 and 201 count as success. A successful body that is not JSON is
/// kept as a string value so it can still be shown.
pub fn normalize(response: RawResponse) -> ApiResult<Value> {
    match response.status {
        200 | 201 => {
            let value = serde_json::from_str(&response.body)
                .unwrap_or_else(|_| Value::String(response.body));
            ApiResult::Success {
                status_code: response.status,
                value,
            }
        }
        status => EnboxError::Api {
            status,
            body: response.body,
        }
        .into(),
    }
}

/// Like [`normalize`], then classifies the value without assuming it is a list.
pub fn normalize_list(response: RawResponse) -> ApiResult<EnboxList> {
    normalize(response).map(EnboxList::from_value)
}
