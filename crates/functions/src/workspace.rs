//! The current project root shared by every connection.
//!
//! Any request may move the root at any time (`setWorkingDirectory`). Reads
//! and writes are serialized by a lock, and each handler takes one snapshot
//! when it starts. Two clients that change the root concurrently can still
//! observe each other's value between calls; the host plugin runs one
//! project per server process, so this is accepted.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::registry::{Args, FunctionDescriptor, Handler, ParamKind, Parameter};
use crate::Result;

/// Environment variable the host sets to the project directory.
pub const PROJECT_ENV: &str = "LICENSE_TOOL_PROJECT";

/// Per-project directory holding the BOM, key file and logs.
pub const TOOL_DIR: &str = ".license-tool";

#[derive(Debug)]
pub struct Workspace {
    root: RwLock<PathBuf>,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: RwLock::new(root.into()),
        }
    }

    /// Root from `LICENSE_TOOL_PROJECT`, else `fallback`.
    pub fn from_env_or(fallback: impl Into<PathBuf>) -> Self {
        match std::env::var_os(PROJECT_ENV) {
            Some(root) if !root.is_empty() => Self::new(root),
            _ => Self::new(fallback),
        }
    }

    /// Snapshot of the current root.
    pub async fn root(&self) -> PathBuf {
        self.root.read().await.clone()
    }

    pub async fn set_root(&self, root: impl Into<PathBuf>) {
        *self.root.write().await = root.into();
    }

    pub fn tool_dir(root: &Path) -> PathBuf {
        root.join(TOOL_DIR)
    }

    pub fn bom_path(root: &Path) -> PathBuf {
        Self::tool_dir(root).join("bom.xml")
    }
}

const DIRECTORY: &[Parameter] = &[Parameter::new(
    "directory",
    ParamKind::String,
    "Absolute path of the project root.",
)];

struct SetWorkingDirectory(Arc<Workspace>);

#[async_trait]
impl Handler for SetWorkingDirectory {
    async fn call(&self, args: Args) -> Result<Value> {
        let directory = PathBuf::from(args.str(0)?);
        if !directory.is_dir() {
            tracing::warn!(directory = %directory.display(), "project root is not a directory");
        }
        tracing::info!(directory = %directory.display(), "project root changed");
        self.0.set_root(directory).await;
        Ok(Value::Null)
    }
}

struct GetWorkingDirectory(Arc<Workspace>);

#[async_trait]
impl Handler for GetWorkingDirectory {
    async fn call(&self, _args: Args) -> Result<Value> {
        Ok(Value::String(self.0.root().await.display().to_string()))
    }
}

/// `setWorkingDirectory(directory)` and `getWorkingDirectory()`.
pub fn functions(workspace: &Arc<Workspace>) -> Vec<FunctionDescriptor> {
    vec![
        FunctionDescriptor::new(
            "setWorkingDirectory",
            "Set the project root used by the project functions.",
            DIRECTORY,
            SetWorkingDirectory(workspace.clone()),
        ),
        FunctionDescriptor::new(
            "getWorkingDirectory",
            "Return the current project root.",
            &[],
            GetWorkingDirectory(workspace.clone()),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Registry;
    use serde_json::json;

    #[tokio::test]
    async fn set_then_get_round_trips_the_root() {
        let workspace = Arc::new(Workspace::new("/tmp/first"));
        let registry = Registry::new(functions(&workspace));

        let result = registry
            .invoke("setWorkingDirectory", vec![json!("/tmp/second")])
            .await
            .unwrap();
        assert_eq!(result, Value::Null);
        assert_eq!(workspace.root().await, PathBuf::from("/tmp/second"));

        let result = registry.invoke("getWorkingDirectory", vec![]).await.unwrap();
        assert_eq!(result, json!("/tmp/second"));
    }

    #[test]
    fn bom_lives_in_the_tool_dir() {
        assert_eq!(
            Workspace::bom_path(Path::new("/p")),
            PathBuf::from("/p/.license-tool/bom.xml")
        );
    }
}
