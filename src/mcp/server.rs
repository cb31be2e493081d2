//! MCP Server implementation
//!
//! Implements the MCP tools for mixhub using rmcp SDK.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rmcp::model::{Implementation, ServerCapabilities, ServerInfo, ToolsCapability};
use rmcp::{tool, ServerHandler};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::config::Config;
use crate::error::{suggest_fix, ErrorInfo, MixError};
use crate::executor::NullSink;
use crate::project::{discover_roots, resolve_project_root};
use crate::runner::{MixRunner, RunOptions, RunResult, TaskEntry};

/// MCP Server for mixhub
#[derive(Clone)]
pub struct MixhubServer {
    /// Loaded configuration
    config: Arc<RwLock<Config>>,
}

impl MixhubServer {
    /// Create with a specific config
    pub fn with_config(config: Config) -> Self {
        Self {
            config: Arc::new(RwLock::new(config)),
        }
    }

    /// Directory a tool call starts from (defaults to the server's cwd)
    fn start_directory(directory: Option<&str>) -> Result<PathBuf, MixError> {
        match directory {
            Some(dir) => Ok(PathBuf::from(dir)),
            None => Ok(std::env::current_dir()?),
        }
    }

    /// Resolve the project root a task tool should run in
    fn project_root(directory: Option<&str>, config: &Config) -> Result<PathBuf, MixError> {
        let start = Self::start_directory(directory)?;
        resolve_project_root(&start, config.prefer_umbrella(false))
    }

    /// Run a task and shape the result as a tool response
    async fn run_in_project(
        config: &Config,
        directory: Option<&str>,
        task: Option<&str>,
        args: Vec<String>,
        env: HashMap<String, String>,
    ) -> String {
        let root = match Self::project_root(directory, config) {
            Ok(root) => root,
            Err(e) => return ToolError::from_error(&e),
        };

        let runner = MixRunner::from_config(&config.mix);
        let mut options = RunOptions::from_config(&config.mix).with_args(args);
        options.env.extend(env);

        let result = match task {
            Some(task) => runner.run_task(&root, task, &options, &mut NullSink).await,
            None => runner.compile(&root, &options, &mut NullSink).await,
        };

        match result {
            Ok(result) => to_json(&RunTaskResponse::new(&root, result)),
            Err(e) => ToolError::from_error(&e),
        }
    }
}

impl Default for MixhubServer {
    fn default() -> Self {
        Self::with_config(Config::default())
    }
}

// === Tool Parameter Types ===

/// Parameters for find_project_root tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct FindProjectRootParams {
    /// Directory to search from (defaults to current directory)
    #[serde(default)]
    pub directory: Option<String>,

    /// Return the umbrella root instead of the nearest one (defaults to config)
    #[serde(default)]
    pub prefer_umbrella: Option<bool>,
}

/// Response from find_project_root tool
#[derive(Debug, Serialize)]
pub struct FindProjectRootResponse {
    /// Selected root
    pub root: String,
    /// Closest directory with mix.exs
    pub nearest: String,
    /// Outermost directory with mix.exs
    pub umbrella: String,
    /// Whether the nearest root sits inside an umbrella
    pub nested: bool,
}

/// Parameters for list_tasks tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListTasksParams {
    /// Directory inside the project (defaults to current directory)
    #[serde(default)]
    pub directory: Option<String>,
}

/// Response from list_tasks tool
#[derive(Debug, Serialize)]
pub struct ListTasksResponse {
    /// Project root the listing ran in
    pub root: String,
    /// Available tasks in listing order
    pub tasks: Vec<TaskEntry>,
}

/// Parameters for run_task tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct RunTaskParams {
    /// Task name to run (e.g., "test", "deps.get", "ecto.migrate")
    pub task: String,

    /// Arguments passed after the task name
    #[serde(default)]
    pub args: Vec<String>,

    /// Directory inside the project (defaults to current directory)
    #[serde(default)]
    pub directory: Option<String>,

    /// Extra environment variables (e.g., {"MIX_ENV": "test"})
    #[serde(default)]
    pub env: HashMap<String, String>,
}

/// Parameters for compile tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CompileParams {
    /// Arguments passed to the compile task (e.g., ["--warnings-as-errors"])
    #[serde(default)]
    pub args: Vec<String>,

    /// Directory inside the project (defaults to current directory)
    #[serde(default)]
    pub directory: Option<String>,
}

/// Response from run_task and compile tools
#[derive(Debug, Serialize)]
pub struct RunTaskResponse {
    /// Project root the task ran in
    pub root: String,
    /// Task outcome
    #[serde(flatten)]
    pub result: RunResult,
    /// Error information if the task failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

impl RunTaskResponse {
    fn new(root: &Path, result: RunResult) -> Self {
        let error = (!result.success).then(|| ErrorInfo {
            message: format!("Command failed with exit code {:?}", result.exit_code),
            error_type: "command_failed".to_string(),
            suggestion: suggest_fix(&result.command, &result.output),
            exit_code: result.exit_code,
        });

        Self {
            root: root.display().to_string(),
            result,
            error,
        }
    }
}

/// Error response for tools
#[derive(Debug, Serialize)]
struct ToolError {
    success: bool,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    suggestion: Option<String>,
}

impl ToolError {
    fn new(error: impl std::fmt::Display, suggestion: Option<String>) -> String {
        serde_json::to_string_pretty(&ToolError {
            success: false,
            error: error.to_string(),
            suggestion,
        })
        .unwrap_or_else(|_| format!("{{\"success\":false,\"error\":\"{}\"}}", error))
    }

    fn from_error(error: &MixError) -> String {
        Self::new(error, error.suggestion())
    }
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| ToolError::new(format!("Serialization error: {}", e), None))
}

// === MCP Tool Implementations ===

#[tool(tool_box)]
impl MixhubServer {
    /// Find the Mix project root for a directory
    #[tool(
        description = "Find the Mix project root (directory containing mix.exs) for a directory. Reports both the nearest and the umbrella root."
    )]
    pub async fn find_project_root(&self, #[tool(aggr)] params: FindProjectRootParams) -> String {
        let config = self.config.read().await;

        let start = match Self::start_directory(params.directory.as_deref()) {
            Ok(start) => start,
            Err(e) => return ToolError::from_error(&e),
        };

        let Some(roots) = discover_roots(&start) else {
            return ToolError::from_error(&MixError::NoProjectRootFound {
                start: start.display().to_string(),
            });
        };

        let prefer_umbrella = params
            .prefer_umbrella
            .unwrap_or_else(|| config.prefer_umbrella(false));

        to_json(&FindProjectRootResponse {
            root: roots.select(prefer_umbrella).display().to_string(),
            nearest: roots.nearest.display().to_string(),
            umbrella: roots.umbrella.display().to_string(),
            nested: roots.is_nested(),
        })
    }

    /// List available mix tasks in a project
    #[tool(
        description = "List available mix tasks in a project, in the order `mix help` prints them. Returns task names and descriptions."
    )]
    pub async fn list_tasks(&self, #[tool(aggr)] params: ListTasksParams) -> String {
        let config = self.config.read().await;

        let root = match Self::project_root(params.directory.as_deref(), &config) {
            Ok(root) => root,
            Err(e) => return ToolError::from_error(&e),
        };

        let runner = MixRunner::from_config(&config.mix);
        match runner.list_tasks(&root).await {
            Ok(tasks) => to_json(&ListTasksResponse {
                root: root.display().to_string(),
                tasks,
            }),
            Err(e) => ToolError::from_error(&e),
        }
    }

    /// Run a mix task at the project root
    #[tool(
        description = "Run a mix task at the project root. Returns combined output, exit code, and source locations (file:line) found in the output."
    )]
    pub async fn run_task(&self, #[tool(aggr)] params: RunTaskParams) -> String {
        let config = self.config.read().await;

        Self::run_in_project(
            &config,
            params.directory.as_deref(),
            Some(params.task.as_str()),
            params.args,
            params.env,
        )
        .await
    }

    /// Compile the project
    #[tool(
        description = "Compile the Mix project at its root. Returns compiler output, exit code, and source locations of warnings and errors."
    )]
    pub async fn compile(&self, #[tool(aggr)] params: CompileParams) -> String {
        let config = self.config.read().await;

        Self::run_in_project(
            &config,
            params.directory.as_deref(),
            None,
            params.args,
            HashMap::new(),
        )
        .await
    }
}

#[tool(tool_box)]
impl ServerHandler for MixhubServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {
                    list_changed: Some(false),
                }),
                ..Default::default()
            },
            server_info: Implementation {
                name: "mixhub".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            instructions: Some(
                "MCP server for Elixir Mix projects. Finds project roots (including umbrella \
                 roots), lists mix tasks, and runs tasks or compiles with source locations."
                    .to_string(),
            ),
        }
    }
}
