use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("invalid job envelope: {0}")]
    Json(#[from] serde_json::Error),
}

/// The queue wire format: a JSON object `{"class": ..., "args": [...]}`,
/// matching what existing deployments already have sitting in their lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobEnvelope {
    #[serde(rename = "class")]
    pub job_type: String,
    #[serde(default)]
    pub args: Vec<Value>,
}

impl JobEnvelope {
    pub fn new(job_type: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            job_type: job_type.into(),
            args,
        }
    }

    pub fn encode(&self) -> Result<String, CodecError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn decode(payload: &str) -> Result<Self, CodecError> {
        Ok(serde_json::from_str(payload)?)
    }
}

/// One reserved attempt of a job. `source_queue` is the queue the invocation
/// was drawn from at the moment it was reserved; it is tracked per attempt
/// (not per job type) so concurrently reserved jobs of the same type drawn
/// from different queues route their overflow independently.
#[derive(Debug, Clone, PartialEq)]
pub struct JobInvocation {
    pub envelope: JobEnvelope,
    pub source_queue: String,
}

impl JobInvocation {
    pub fn job_type(&self) -> &str {
        &self.envelope.job_type
    }

    pub fn args(&self) -> &[Value] {
        &self.envelope.args
    }

    /// The queue this invocation was reserved from.
    pub fn source_queue(&self) -> &str {
        &self.source_queue
    }
}
