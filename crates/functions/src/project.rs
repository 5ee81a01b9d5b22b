//! Project introspection functions offered to the model.
//!
//! Every outcome the model can use, including a missing or malformed BOM, is
//! returned as a sentence rather than an error, so the conversation can carry
//! on with whatever the function could say.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::bom::{self, LicenseLookup};
use crate::registry::{Args, FunctionDescriptor, Handler, ParamKind, Parameter};
use crate::spdx;
use crate::workspace::Workspace;
use crate::Result;

const LICENSE_FILE_PREFIX: &str = "LICENSE";

const DEPENDENCY: &[Parameter] = &[Parameter::new(
    "dependency",
    ParamKind::String,
    "The dependency whose licensing information we are looking for. Written as one word.  Spaces should be replaced with hyphens.",
)];

/// Read the BOM, or the sentence explaining why it could not be read.
async fn read_bom(bom_path: &Path) -> std::result::Result<String, String> {
    tokio::fs::read_to_string(bom_path).await.map_err(|e| {
        tracing::warn!(path = %bom_path.display(), error = %e, "BOM unreadable");
        format!("Error reading BOM file: {e}")
    })
}

fn parse_failure(e: bom::ParseError) -> String {
    format!("Error parsing XML file: {e}")
}

pub async fn dependency_list(root: &Path) -> String {
    let xml = match read_bom(&Workspace::bom_path(root)).await {
        Ok(xml) => xml,
        Err(message) => return message,
    };
    match bom::dependency_names(&xml) {
        Ok(names) if names.is_empty() => "This project has no listed dependencies".to_string(),
        Ok(names) => format!("Dependencies used: {}", names.join(", ")),
        Err(e) => parse_failure(e),
    }
}

pub async fn project_licensing(root: &Path) -> Result<String> {
    let mut files = Vec::new();
    let mut entries = tokio::fs::read_dir(root).await?;
    while let Some(entry) = entries.next_entry().await? {
        let is_license = entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with(LICENSE_FILE_PREFIX));
        if is_license && entry.file_type().await?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();

    let mut licenses: Vec<String> = Vec::new();
    for path in &files {
        let bytes = tokio::fs::read(path).await?;
        let found = spdx::identify(&String::from_utf8_lossy(&bytes));
        tracing::debug!(file = %path.display(), ?found, "licence file classified");
        licenses.extend(found);
    }

    if licenses.is_empty() {
        return Ok("I could not find any licensing information for this project.".to_string());
    }
    Ok(format!(
        "The licensing for this project is: {}",
        licenses.join(", ")
    ))
}

pub async fn dependency_license(root: &Path, dependency: &str) -> String {
    let bom_path = Workspace::bom_path(root);
    let xml = match read_bom(&bom_path).await {
        Ok(xml) => xml,
        Err(message) => return message,
    };
    match bom::dependency_licenses(&xml, dependency) {
        Ok(LicenseLookup::Found(licenses)) => licenses,
        Ok(LicenseLookup::Unlicensed) => "No licensing information supplied".to_string(),
        Ok(LicenseLookup::NotFound) => format!("Dependency not found, {}", bom_path.display()),
        Err(e) => parse_failure(e),
    }
}

struct DependencyList(Arc<Workspace>);

#[async_trait]
impl Handler for DependencyList {
    async fn call(&self, _args: Args) -> Result<Value> {
        let root = self.0.root().await;
        Ok(Value::String(dependency_list(&root).await))
    }
}

struct ProjectLicensing(Arc<Workspace>);

#[async_trait]
impl Handler for ProjectLicensing {
    async fn call(&self, _args: Args) -> Result<Value> {
        let root = self.0.root().await;
        Ok(Value::String(project_licensing(&root).await?))
    }
}

struct DependencyLicense(Arc<Workspace>);

#[async_trait]
impl Handler for DependencyLicense {
    async fn call(&self, args: Args) -> Result<Value> {
        let root = self.0.root().await;
        Ok(Value::String(dependency_license(&root, args.str(0)?).await))
    }
}

/// The three model-facing project functions.
pub fn functions(workspace: &Arc<Workspace>) -> Vec<FunctionDescriptor> {
    vec![
        FunctionDescriptor::new(
            "get_dependency_license",
            "A function that returns the licensing information for a provided dependency.",
            DEPENDENCY,
            DependencyLicense(workspace.clone()),
        )
        .model_facing(),
        FunctionDescriptor::new(
            "get_licensing_for_my_project",
            "A function that returns the licensing information for the developer's project.",
            &[],
            ProjectLicensing(workspace.clone()),
        )
        .model_facing(),
        FunctionDescriptor::new(
            "get_dependency_list",
            "A function that returns the list of dependencies included in the developer's project.",
            &[],
            DependencyList(workspace.clone()),
        )
        .model_facing(),
    ]
}
