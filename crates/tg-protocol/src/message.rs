use serde::{Deserialize, Serialize};
use tg_types::{ContentHash, Thunk};

use crate::codec::decode_data;
use crate::error::ProtocolResult;

/// A batch of thunks to reduce.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRequest {
    /// Storage backend URI, forwarded to the executor untouched.
    #[serde(default)]
    pub storage_backend: String,
    #[serde(default)]
    pub thunks: Vec<ThunkPayload>,
    /// Ask the executor to record timing logs.
    #[serde(default)]
    pub timelog: bool,
}

/// A thunk as it travels over the wire.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThunkPayload {
    /// Base64 (standard alphabet, padded) serialized thunk.
    pub data: String,
    pub hash: ContentHash,
    #[serde(default)]
    pub outputs: Vec<String>,
}

impl ThunkPayload {
    /// Decode the transfer encoding.
    pub fn decode(&self) -> ProtocolResult<Thunk> {
        let data = decode_data(self.hash.as_str(), &self.data)?;
        Ok(Thunk::new(self.hash.clone(), data, self.outputs.clone()))
    }
}

/// Outcome of a batch.
///
/// `executed_thunks` is present only when every requested output resolved.
/// When it is absent, `return_code` and `stdout` are the executor's.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResponse {
    pub return_code: i32,
    pub stdout: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executed_thunks: Option<Vec<ExecutedThunk>>,
}

impl ExecutionResponse {
    pub fn complete(executed_thunks: Vec<ExecutedThunk>) -> Self {
        Self {
            return_code: 0,
            stdout: String::new(),
            executed_thunks: Some(executed_thunks),
        }
    }

    pub fn partial(return_code: i32, stdout: impl Into<String>) -> Self {
        Self {
            return_code,
            stdout: stdout.into(),
            executed_thunks: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.executed_thunks.is_some()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutedThunk {
    pub thunk_hash: ContentHash,
    pub outputs: Vec<ReturnOutput>,
}

/// One resolved output of a thunk.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnOutput {
    pub tag: String,
    pub hash: ContentHash,
    pub size: u64,
    pub executable: bool,
    /// Base64 blob content for thunk-typed hashes, empty otherwise.
    #[serde(default)]
    pub data: String,
}

/// Body returned with non-2xx statuses.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
