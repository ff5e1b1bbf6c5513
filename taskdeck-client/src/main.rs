//! taskdeck - terminal dashboard for the Taskdeck API

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use taskdeck_client::dashboard::{self, load_dashboard};
use taskdeck_client::session::{self, Session};
use taskdeck_client::types::{NewProject, NewTask, ProjectPatch, TaskPatch, TaskPriority, TaskStatus};
use taskdeck_client::ApiClient;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// taskdeck - manage workspaces, projects and tasks from the terminal
#[derive(Parser, Debug)]
#[command(name = "taskdeck")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Base URL of the Taskdeck API
    #[arg(long, env = "TASKDECK_API_URL", default_value = "http://localhost:4000")]
    api_url: String,

    /// Session file (defaults to ~/.taskdeck/session.json)
    #[arg(long, env = "TASKDECK_SESSION")]
    session: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    // === Account ===
    /// Create an account (also creates a personal workspace) and log in
    Signup {
        email: String,

        #[arg(long, env = "TASKDECK_PASSWORD")]
        password: String,

        /// Display name
        #[arg(long)]
        name: Option<String>,
    },

    /// Log in and store the session token
    Login {
        email: String,

        #[arg(long, env = "TASKDECK_PASSWORD")]
        password: String,
    },

    /// Forget the stored session
    Logout,

    /// Show the logged-in user
    Me,

    // === Overview ===
    /// List workspaces with their members
    Workspaces,

    /// Show the dashboard: workspaces, projects, stats and tasks
    Dashboard {
        /// Workspace to show instead of the first one
        #[arg(long)]
        workspace: Option<Uuid>,

        /// Project to show instead of the first one
        #[arg(long)]
        project: Option<Uuid>,
    },

    // === Resources ===
    /// Project commands
    #[command(subcommand)]
    Projects(ProjectCommands),

    /// Task commands
    #[command(subcommand)]
    Tasks(TaskCommands),

    // === Files ===
    /// Upload a file to a task
    Attach {
        task_id: Uuid,
        file: PathBuf,

        /// Content type (guessed from the extension when omitted)
        #[arg(long)]
        content_type: Option<String>,
    },

    /// List a task's attachments
    Attachments { task_id: Uuid },

    /// Download an attachment through its pre-signed link
    Download {
        attachment_id: Uuid,

        /// Output path
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
enum ProjectCommands {
    /// List accessible projects
    #[command(alias = "ls")]
    List {
        #[arg(long)]
        workspace: Option<Uuid>,
    },

    /// Create a project
    Create {
        name: String,

        #[arg(long)]
        workspace: Uuid,

        #[arg(long)]
        description: Option<String>,
    },

    /// Show a project with its task stats
    Show { id: Uuid },

    /// Rename or re-describe a project
    Update {
        id: Uuid,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        description: Option<String>,
    },

    /// Delete a project, its tasks and their files
    Delete { id: Uuid },
}

#[derive(Subcommand, Debug)]
enum TaskCommands {
    /// List accessible tasks
    #[command(alias = "ls")]
    List {
        #[arg(long)]
        project: Option<Uuid>,
    },

    /// Create a task
    Create(CreateTaskArgs),

    /// Show a task
    Show { id: Uuid },

    /// Change task fields
    Update(UpdateTaskArgs),

    /// Delete a task and its files
    Delete { id: Uuid },
}

#[derive(Args, Debug)]
struct CreateTaskArgs {
    title: String,

    #[arg(long)]
    project: Uuid,

    #[arg(long)]
    description: Option<String>,

    #[arg(long, value_enum)]
    priority: Option<TaskPriority>,

    /// RFC 3339 timestamp or YYYY-MM-DD
    #[arg(long)]
    due: Option<String>,

    #[arg(long)]
    assignee: Option<Uuid>,
}

#[derive(Args, Debug)]
struct UpdateTaskArgs {
    id: Uuid,

    #[arg(long)]
    title: Option<String>,

    #[arg(long, conflicts_with = "clear_description")]
    description: Option<String>,

    #[arg(long, value_enum)]
    status: Option<TaskStatus>,

    #[arg(long, value_enum)]
    priority: Option<TaskPriority>,

    #[arg(long, conflicts_with = "clear_due")]
    due: Option<String>,

    #[arg(long, conflicts_with = "unassign")]
    assignee: Option<Uuid>,

    #[arg(long)]
    clear_description: bool,

    #[arg(long)]
    clear_due: bool,

    #[arg(long)]
    unassign: bool,
}

impl UpdateTaskArgs {
    fn patch(&self) -> TaskPatch {
        fn field<T: Clone>(value: &Option<T>, clear: bool) -> Option<Option<T>> {
            if clear {
                Some(None)
            } else {
                value.clone().map(Some)
            }
        }

        TaskPatch {
            title: self.title.clone(),
            description: field(&self.description, self.clear_description),
            status: self.status,
            priority: self.priority,
            due_date: field(&self.due, self.clear_due),
            assignee_id: field(&self.assignee, self.unassign),
        }
    }
}

fn guess_content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match ext.as_deref() {
        Some("txt" | "log") => "text/plain",
        Some("md") => "text/markdown",
        Some("csv") => "text/csv",
        Some("json") => "application/json",
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("zip") => "application/zip",
        _ => "application/octet-stream",
    }
}

struct Runner {
    api_url: String,
    session_path: PathBuf,
}

impl Runner {
    fn anonymous(&self) -> Result<ApiClient> {
        Ok(ApiClient::new(&self.api_url)?)
    }

    fn authenticated(&self) -> Result<ApiClient> {
        let session = Session::load(&self.session_path)?
            .ok_or(taskdeck_client::ClientError::NotLoggedIn)?;
        Ok(self.anonymous()?.with_token(session.token))
    }

    fn remember(&self, email: &str, token: &str) -> Result<()> {
        Session {
            token: token.to_string(),
            email: email.to_string(),
        }
        .save(&self.session_path)?;
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let ctx = Runner {
        api_url: cli.api_url,
        session_path: match cli.session {
            Some(path) => path,
            None => session::default_path()?,
        },
    };

    match cli.command {
        Commands::Signup { email, password, name } => {
            let auth = ctx.anonymous()?.signup(&email, &password, name.as_deref()).await?;
            ctx.remember(&auth.user.email, &auth.token)?;

            println!("Signed up as {}", auth.user.email);
            if let Some(workspace) = auth.workspace {
                println!("Workspace: {} ({})", workspace.name, workspace.id);
            }
        }
        Commands::Login { email, password } => {
            let auth = ctx.anonymous()?.login(&email, &password).await?;
            ctx.remember(&auth.user.email, &auth.token)?;
            println!("Logged in as {}", auth.user.email);
        }
        Commands::Logout => {
            Session::clear(&ctx.session_path)?;
            println!("Logged out");
        }
        Commands::Me => {
            let user = ctx.authenticated()?.me().await?;
            println!("{}  {}  {}", user.id, user.email, user.name.as_deref().unwrap_or("-"));
        }
        Commands::Workspaces => {
            let workspaces = ctx.authenticated()?.workspaces().await?;
            for workspace in workspaces {
                println!("{}  {}", workspace.id, workspace.name);
                for member in workspace.members {
                    println!("    {:<8} {}", member.role, member.user.email);
                }
            }
        }
        Commands::Dashboard { workspace, project } => {
            let client = ctx.authenticated()?;
            let loaded = load_dashboard(&client, workspace, project).await?;
            print!("{}", dashboard::render_dashboard(&loaded));
        }
        Commands::Projects(command) => run_projects(&ctx, command).await?,
        Commands::Tasks(command) => run_tasks(&ctx, command).await?,
        Commands::Attach {
            task_id,
            file,
            content_type,
        } => {
            let body = tokio::fs::read(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let file_name = file
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("file")
                .to_string();
            let content_type = content_type.unwrap_or_else(|| guess_content_type(&file).to_string());

            let attachment = ctx
                .authenticated()?
                .upload_attachment(task_id, &file_name, &content_type, body)
                .await?;
            print!("{}", dashboard::render_attachment(&attachment));
        }
        Commands::Attachments { task_id } => {
            let attachments = ctx.authenticated()?.attachments(task_id).await?;
            print!("{}", dashboard::render_attachments(&attachments));
        }
        Commands::Download { attachment_id, output } => {
            let client = ctx.authenticated()?;
            let link = client.download_link(attachment_id).await?;
            let bytes = client.fetch_download(&link.download_url).await?;

            tokio::fs::write(&output, &bytes)
                .await
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!("Saved {} bytes to {}", bytes.len(), output.display());
        }
    }

    Ok(())
}

async fn run_projects(ctx: &Runner, command: ProjectCommands) -> Result<()> {
    let client = ctx.authenticated()?;

    match command {
        ProjectCommands::List { workspace } => {
            let projects = client.projects(workspace).await?;
            print!("{}", dashboard::render_projects(&projects));
        }
        ProjectCommands::Create {
            name,
            workspace,
            description,
        } => {
            let project = client
                .create_project(&NewProject {
                    name,
                    workspace_id: workspace,
                    description,
                })
                .await?;
            println!("Created project {} ({})", project.name, project.id);
        }
        ProjectCommands::Show { id } => {
            let detail = client.project(id).await?;
            println!("{}  {}", detail.project.id, detail.project.name);
            if let Some(description) = &detail.project.description {
                println!("  {}", description);
            }
            print!("{}", dashboard::render_stats(&detail.stats));
        }
        ProjectCommands::Update { id, name, description } => {
            let project = client.update_project(id, &ProjectPatch { name, description }).await?;
            println!("Updated project {} ({})", project.name, project.id);
        }
        ProjectCommands::Delete { id } => {
            let deleted = client.delete_project(id).await?;
            println!("{} ({} tasks removed)", deleted.message, deleted.deleted_tasks);
        }
    }

    Ok(())
}

async fn run_tasks(ctx: &Runner, command: TaskCommands) -> Result<()> {
    let client = ctx.authenticated()?;

    match command {
        TaskCommands::List { project } => {
            let tasks = client.tasks(project).await?;
            if tasks.is_empty() {
                println!("No tasks.");
            } else {
                print!("{}", dashboard::render_tasks(&tasks));
            }
        }
        TaskCommands::Create(args) => {
            let task = client
                .create_task(&NewTask {
                    title: args.title,
                    project_id: args.project,
                    description: args.description,
                    priority: args.priority,
                    due_date: args.due,
                    assignee_id: args.assignee,
                })
                .await?;
            println!("Created task {} ({})", task.title, task.id);
        }
        TaskCommands::Show { id } => {
            let task = client.task(id).await?;
            print!("{}", dashboard::render_task(&task));
        }
        TaskCommands::Update(args) => {
            let task = client.update_task(args.id, &args.patch()).await?;
            print!("{}", dashboard::render_task(&task));
        }
        TaskCommands::Delete { id } => {
            println!("{}", client.delete_task(id).await?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_update_flags_build_patch() {
        let cli = Cli::parse_from([
            "taskdeck",
            "tasks",
            "update",
            "00000000-0000-0000-0000-000000000000",
            "--status",
            "in_progress",
            "--clear-due",
        ]);

        let Commands::Tasks(TaskCommands::Update(args)) = cli.command else {
            panic!("expected tasks update");
        };
        let patch = serde_json::to_value(args.patch()).unwrap();
        assert_eq!(patch, serde_json::json!({ "status": "in_progress", "dueDate": null }));
    }

    #[test]
    fn test_guess_content_type() {
        assert_eq!(guess_content_type(Path::new("notes.TXT")), "text/plain");
        assert_eq!(guess_content_type(Path::new("blob")), "application/octet-stream");
    }
}
