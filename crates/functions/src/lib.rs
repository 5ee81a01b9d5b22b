//! The functions a host can call by name.
//!
//! # Overview
//!
//! - **Registry**: name → [`FunctionDescriptor`] with declared parameter
//!   order, built once at startup.
//! - **Workspace**: the shared project root the project functions read from.
//! - **Project functions**: BOM and licence-file queries, also offered to the
//!   model as tools through [`ProjectTools`].
//! - **promptModel**: runs a conversational turn against OpenAI or Ollama.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use functions::{ModelCatalog, ProviderSettings, Workspace, standard_registry};
//!
//! # async fn example() -> functions::Result<()> {
//! let workspace = Arc::new(Workspace::from_env_or("."));
//! let registry = standard_registry(&workspace, ModelCatalog::default(), ProviderSettings::default())?;
//! let sum = registry.invoke("add", vec![2.into(), 3.into()]).await?;
//! assert_eq!(sum, 5);
//! # Ok(())
//! # }
//! ```

mod arithmetic;
mod bom;
mod error;
mod project;
mod prompt;
mod registry;
mod spdx;
mod tools;
mod workspace;

use std::sync::Arc;

pub use error::{CallError, Result};
pub use prompt::{ModelCatalog, OPENAI_KEY_ENV, OPENAI_KEY_FILE, ProviderSettings};
pub use registry::{Args, FunctionDescriptor, Handler, ParamKind, Parameter, Registry};
pub use tools::ProjectTools;
pub use workspace::{PROJECT_ENV, TOOL_DIR, Workspace};

/// Every function the server exposes.
///
/// The model-facing project functions are registered for the host too, and
/// `promptModel` offers them to the model.
pub fn standard_registry(
    workspace: &Arc<Workspace>,
    catalog: ModelCatalog,
    settings: ProviderSettings,
) -> Result<Registry> {
    let project = project::functions(workspace);
    let tools = Arc::new(ProjectTools::new(&project));

    let mut registry = Registry::new(arithmetic::functions());
    registry.extend(workspace::functions(workspace));
    registry.extend(project);
    registry.extend([prompt::function(catalog, settings, workspace, tools)?]);
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_every_function() {
        let workspace = Arc::new(Workspace::new("/"));
        let registry =
            standard_registry(&workspace, ModelCatalog::default(), ProviderSettings::default())
                .unwrap();
        let names: Vec<_> = registry.names().collect();
        assert_eq!(
            names,
            vec![
                "add",
                "getWorkingDirectory",
                "get_dependency_license",
                "get_dependency_list",
                "get_licensing_for_my_project",
                "promptModel",
                "setWorkingDirectory",
                "subtract",
            ]
        );
        assert_eq!(registry.tool_specs().len(), 3);
    }
}
