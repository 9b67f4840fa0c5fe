//! Response envelope shared by the JSON handlers.

use serde::Serialize;

/// Standard `{ "data": T }` envelope. Auth token responses are the only
/// payloads sent without it.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

impl<T: Serialize> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}
