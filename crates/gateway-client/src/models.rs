//! API types for the gateway's REST endpoints.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A remote compute backend, identity only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Kernel {
    pub id: String,
    pub name: String,
}

/// A running session binding a notebook path to a kernel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub kernel: Kernel,
}

/// Notebook descriptor sent with a session-creation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotebookLocator {
    pub path: String,
    pub name: String,
}

/// Body for `POST /api/sessions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRequest {
    pub path: String,
    pub name: String,
    #[serde(rename = "type")]
    pub session_type: String,
    pub kernel: Kernel,
    pub notebook: NotebookLocator,
}

/// One kernel specification from `GET /api/kernelspecs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KernelSpec {
    pub name: String,
    #[serde(default)]
    pub spec: Value,
    #[serde(default)]
    pub resources: HashMap<String, String>,
}

/// Response of `GET /api/kernelspecs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KernelSpecs {
    #[serde(default)]
    pub default: String,
    #[serde(default)]
    pub kernelspecs: HashMap<String, KernelSpec>,
}
