//! Wire protocol between the host and an execution unit.
//!
//! Every frame is one JSON document. The host sends [`HostMessage`]s; the
//! unit answers with [`UnitMessage`]s, which are either correlated
//! responses or unsolicited lifecycle events.
//!
//! ```text
//! host                                  unit
//!  │                                      │  (boot: load definitions)
//!  │ ◄──────────── event: ready{manifest} │
//!  │ request{id, run_component} ────────► │
//!  │ ◄──────────────── response{id, ok}   │
//!  │ ◄─────────────── event: fatal{error} │  (unhandled fault, unit exits)
//! ```

use crate::credential::Credential;
use crate::error::{DockyardError, Result};
use crate::metadata::UnitManifest;
use crate::types::RequestId;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Arguments for resolving a prop's options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropOptionsArgs {
    /// Component key.
    pub component_key: String,
    /// Prop whose options are requested.
    pub prop_name: String,
    /// Calling user.
    pub user_id: String,
    /// Props the user has configured so far.
    #[serde(default)]
    pub configured_props: Map<String, Value>,
    /// Cursor from the previous page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_context: Option<Value>,
    /// Credential injected for this call.
    #[serde(default)]
    pub credential: Credential,
}

/// Arguments for running a component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunArgs {
    /// Component key.
    pub component_key: String,
    /// Input props.
    #[serde(default)]
    pub props: Map<String, Value>,
    /// Calling user.
    pub user_id: String,
    /// Credential injected for this call.
    #[serde(default)]
    pub credential: Credential,
}

/// Operations a unit serves. None of them mutate its definitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "args", rename_all = "snake_case")]
pub enum Operation {
    /// Return the action/trigger key index.
    ListComponents,
    /// Resolve the options of a prop.
    PropOptions(PropOptionsArgs),
    /// Execute a component.
    RunComponent(RunArgs),
}

impl Operation {
    /// Operation name used in logs and timeout errors.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ListComponents => "listComponents",
            Self::PropOptions(_) => "propOptions",
            Self::RunComponent(_) => "runComponent",
        }
    }
}

/// A correlated request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Host-generated correlation id.
    pub id: RequestId,
    /// What to do.
    pub operation: Operation,
}

impl Request {
    /// Create a request with a fresh id.
    pub fn new(operation: Operation) -> Self {
        Self {
            id: RequestId::new(),
            operation,
        }
    }
}

/// A correlated response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Id of the request being answered.
    pub id: RequestId,
    /// Result payload or typed failure.
    pub outcome: std::result::Result<Value, DockyardError>,
}

impl Response {
    /// A successful response.
    pub fn ok(id: RequestId, value: Value) -> Self {
        Self {
            id,
            outcome: Ok(value),
        }
    }

    /// A failed response.
    pub fn err(id: RequestId, error: DockyardError) -> Self {
        Self {
            id,
            outcome: Err(error),
        }
    }
}

/// Frames sent from host to unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "body", rename_all = "snake_case")]
pub enum HostMessage {
    /// A request to serve.
    Request(Request),
    /// Ask the unit to exit.
    Shutdown,
}

/// Frames sent from unit to host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "body", rename_all = "snake_case")]
pub enum UnitMessage {
    /// Boot finished; carries the unit's bulk metadata. Sent exactly once.
    Ready(UnitManifest),
    /// Unhandled fault; the unit exits right after.
    Fatal {
        /// Fault description.
        error: String,
    },
    /// Answer to a request.
    Response(Response),
}

/// Encode a frame.
pub fn encode<T: Serialize>(message: &T) -> Result<String> {
    serde_json::to_string(message).map_err(|e| DockyardError::Protocol {
        cause: format!("failed to encode frame: {}", e),
    })
}

/// Decode a frame.
pub fn decode<T: DeserializeOwned>(frame: &str) -> Result<T> {
    serde_json::from_str(frame).map_err(|e| DockyardError::Protocol {
        cause: format!("malformed frame: {}", e),
    })
}
