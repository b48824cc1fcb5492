//! CLI command definitions, routing, and tracing setup.

use std::future::Future;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use sourcechat_core::viewmodel::{
    ChatsViewModel, LoginViewModel, ProfileViewModel, ProjectsViewModel, SourcesViewModel,
};
use sourcechat_core::{StaticIdentityProvider, UiEvent};
use sourcechat_shared::{
    AppConfig, DataError, NewChat, NewProject, ProfileUpdate, ProjectUpdate, credentials_db_path,
    init_config,
};
use tracing::{debug, info};

use crate::context::{AppContext, has_stored_session, resolve_config};
use crate::output::{CliProgress, Printer, print_events};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// SourceChat: chat with your projects' knowledge sources.
#[derive(Parser)]
#[command(
    name = "sourcechat",
    version,
    about = "Chat with the documents and links in your SourceChat projects.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Print results as JSON instead of text.
    #[arg(long, global = true)]
    pub json: bool,

    /// API base URL, overriding the config file.
    #[arg(long, env = "SOURCECHAT_API_URL", global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Sign in, refresh or sign out.
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },

    /// Chats and messages.
    Chat {
        #[command(subcommand)]
        action: ChatAction,
    },

    /// Projects.
    Project {
        #[command(subcommand)]
        action: ProjectAction,
    },

    /// Knowledge sources (files and links).
    Source {
        #[command(subcommand)]
        action: SourceAction,
    },

    /// Your profile and account.
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },

    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub(crate) enum AuthAction {
    /// Email a one-time sign-in code.
    SendOtp { email: String },

    /// Sign in with the emailed code.
    Verify { email: String, otp: String },

    /// Sign in with a Google ID token.
    Google {
        #[arg(long, env = "SOURCECHAT_GOOGLE_ID_TOKEN", hide_env_values = true)]
        id_token: String,
    },

    /// Renew the session with the stored refresh token.
    Refresh,

    /// Sign out and forget stored credentials.
    Logout,

    /// Show whether credentials are stored (no network).
    Status,
}

#[derive(Subcommand)]
pub(crate) enum ChatAction {
    /// List chats, most recent first.
    List {
        #[arg(long)]
        project: Option<String>,
    },

    /// Show a chat and its messages.
    Show { id: String },

    /// Start a new chat.
    New {
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        project: Option<String>,
    },

    /// Rename a chat.
    Rename { id: String, title: String },

    /// Delete a chat.
    Delete { id: String },

    /// Send a message and print the reply.
    Send { id: String, message: String },
}

#[derive(Subcommand)]
pub(crate) enum ProjectAction {
    /// List projects.
    List,

    /// Show one project.
    Show { id: String },

    /// Create a project.
    Create {
        name: String,
        #[arg(long)]
        description: Option<String>,
    },

    /// Change a project's name or description.
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },

    /// Delete a project.
    Delete { id: String },
}

#[derive(Subcommand)]
pub(crate) enum SourceAction {
    /// List knowledge sources, newest first.
    List {
        #[arg(long)]
        project: Option<String>,
    },

    /// Upload a local file.
    Upload {
        path: PathBuf,
        #[arg(long)]
        project: Option<String>,
    },

    /// Add a web page by URL.
    Link {
        url: String,
        #[arg(long)]
        project: Option<String>,
    },

    /// Delete a knowledge source.
    Delete { id: String },
}

#[derive(Subcommand)]
pub(crate) enum ProfileAction {
    /// Show your profile.
    Show,

    /// Update display name or avatar.
    Update {
        #[arg(long)]
        display_name: Option<String>,
        #[arg(long)]
        avatar_url: Option<String>,
    },

    /// Permanently delete your account.
    Delete {
        /// Confirm the deletion.
        #[arg(long)]
        yes: bool,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "sourcechat=info",
        1 => "sourcechat=debug",
        _ => "sourcechat=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<ExitCode> {
    let printer = Printer { json: cli.json };
    let api_url = cli.api_url.as_deref();

    match cli.command {
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(api_url),
        },
        Command::Auth {
            action: AuthAction::Status,
        } => cmd_auth_status(api_url, printer).await,
        command => {
            let ctx = AppContext::open(api_url).await?;
            info!(base_url = %ctx.config.api.base_url, "connected");
            let outcome = dispatch(&ctx, command, printer).await;
            ctx.close().await;
            outcome
        }
    }
}

async fn dispatch(ctx: &AppContext, command: Command, printer: Printer) -> Result<ExitCode> {
    match command {
        Command::Auth { action } => cmd_auth(ctx, action).await,
        Command::Chat { action } => cmd_chat(ctx, action, printer).await,
        Command::Project { action } => cmd_project(ctx, action, printer).await,
        Command::Source { action } => cmd_source(ctx, action, printer).await,
        Command::Profile { action } => cmd_profile(ctx, action, printer).await,
        Command::Config { .. } => Err(eyre!("config commands do not need a connection")),
    }
}

/// Await `future` behind a spinner.
async fn spin<F: Future>(message: &str, future: F) -> F::Output {
    let progress = CliProgress::start(message);
    let output = future.await;
    progress.finish();
    output
}

/// Print pending events and map success to an exit code.
fn conclude(ok: bool, events: Vec<UiEvent>) -> ExitCode {
    print_events(&events);
    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Report an error from a direct repository call.
fn fail(error: DataError) -> ExitCode {
    debug!(%error, "command failed");
    let event = if error.is_session_expired() {
        UiEvent::SessionExpired
    } else {
        UiEvent::Message(error.user_message().to_string())
    };
    conclude(false, vec![event])
}

// ---------------------------------------------------------------------------
// auth
// ---------------------------------------------------------------------------

async fn cmd_auth(ctx: &AppContext, action: AuthAction) -> Result<ExitCode> {
    let mut vm = LoginViewModel::new(ctx.repos.auth.clone());

    let ok = match action {
        AuthAction::SendOtp { email } => {
            vm.set_email(&email);
            spin("Sending code…", vm.request_otp()).await
        }
        AuthAction::Verify { email, otp } => {
            vm.set_email(&email);
            spin("Verifying…", vm.verify(&otp)).await
        }
        AuthAction::Google { id_token } => {
            let provider = StaticIdentityProvider::new(id_token);
            spin("Signing in…", vm.sign_in_with(&provider)).await
        }
        AuthAction::Refresh => {
            return match spin("Refreshing session…", ctx.repos.auth.refresh()).await {
                Ok(_) => {
                    eprintln!("Session refreshed.");
                    Ok(ExitCode::SUCCESS)
                }
                Err(error) => Ok(fail(error)),
            };
        }
        AuthAction::Logout => {
            spin("Signing out…", vm.sign_out()).await;
            !ctx.repos.auth.is_logged_in().await
        }
        AuthAction::Status => return Err(eyre!("status is handled without a connection")),
    };

    if let Some(error) = &vm.state().error {
        eprintln!("{error}");
    }
    Ok(conclude(ok, vm.take_events()))
}

async fn cmd_auth_status(api_url: Option<&str>, printer: Printer) -> Result<ExitCode> {
    let config = resolve_config(api_url)?;
    let db_path = credentials_db_path(&config)?;
    let signed_in = has_stored_session(&db_path).await?;

    if printer.json {
        let status = serde_json::json!({
            "signedIn": signed_in,
            "baseUrl": config.api.base_url,
            "credentials": db_path,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("  API:         {}", config.api.base_url);
        println!("  Credentials: {}", db_path.display());
        println!("  Signed in:   {}", if signed_in { "yes" } else { "no" });
    }
    Ok(ExitCode::SUCCESS)
}

// ---------------------------------------------------------------------------
// chat
// ---------------------------------------------------------------------------

async fn cmd_chat(ctx: &AppContext, action: ChatAction, printer: Printer) -> Result<ExitCode> {
    let mut vm = ChatsViewModel::new(ctx.repos.chats.clone());

    match action {
        ChatAction::List { project } => {
            spin("Loading chats…", vm.load(project.as_deref())).await;
            if let Some(chats) = vm.state().chats.ready() {
                printer.chats(chats)?;
            }
            let ok = vm.state().chats.error().is_none();
            Ok(conclude(ok, vm.take_events()))
        }
        ChatAction::Show { id } => {
            let chat = match spin("Loading chat…", ctx.repos.chats.get_chat(&id)).await {
                Ok(chat) => chat,
                Err(error) => return Ok(fail(error)),
            };
            spin("Loading messages…", vm.open(&id)).await;

            if printer.json {
                let messages = vm.state().messages.ready().cloned().unwrap_or_default();
                let view = serde_json::json!({ "chat": chat, "messages": messages });
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                printer.chat(&chat)?;
                println!();
                if let Some(messages) = vm.state().messages.ready() {
                    printer.messages(messages)?;
                }
            }
            let ok = vm.state().messages.error().is_none();
            Ok(conclude(ok, vm.take_events()))
        }
        ChatAction::New { title, project } => {
            let new = NewChat {
                title,
                project_id: project,
            };
            let created = spin("Creating chat…", vm.create(&new)).await;
            if let Some(chat) = &created {
                printer.chat(chat)?;
            }
            Ok(conclude(created.is_some(), vm.take_events()))
        }
        ChatAction::Rename { id, title } => {
            let renamed = spin("Renaming…", vm.rename(&id, &title)).await;
            if let Some(chat) = &renamed {
                printer.chat(chat)?;
            }
            Ok(conclude(renamed.is_some(), vm.take_events()))
        }
        ChatAction::Delete { id } => {
            let deleted = spin("Deleting…", vm.delete(&id)).await;
            if deleted {
                eprintln!("Deleted chat {id}.");
            }
            Ok(conclude(deleted, vm.take_events()))
        }
        ChatAction::Send { id, message } => {
            vm.open(&id).await;
            if let Some(error) = vm.state().messages.error() {
                return Ok(fail(error));
            }
            let reply = spin("Waiting for reply…", vm.send(&message)).await;
            if let Some(reply) = &reply {
                printer.message(reply)?;
            }
            Ok(conclude(reply.is_some(), vm.take_events()))
        }
    }
}

// ---------------------------------------------------------------------------
// project
// ---------------------------------------------------------------------------

async fn cmd_project(
    ctx: &AppContext,
    action: ProjectAction,
    printer: Printer,
) -> Result<ExitCode> {
    let mut vm = ProjectsViewModel::new(ctx.repos.projects.clone());

    match action {
        ProjectAction::List => {
            spin("Loading projects…", vm.load()).await;
            if let Some(projects) = vm.state().projects.ready() {
                printer.projects(projects)?;
            }
            let ok = vm.state().projects.error().is_none();
            Ok(conclude(ok, vm.take_events()))
        }
        ProjectAction::Show { id } => {
            spin("Loading project…", vm.select(&id)).await;
            if let Some(project) = vm.state().selected.ready() {
                printer.project(project)?;
            }
            let ok = vm.state().selected.error().is_none();
            Ok(conclude(ok, vm.take_events()))
        }
        ProjectAction::Create { name, description } => {
            let new = NewProject { name, description };
            let created = spin("Creating project…", vm.create(&new)).await;
            if let Some(project) = &created {
                printer.project(project)?;
            }
            Ok(conclude(created.is_some(), vm.take_events()))
        }
        ProjectAction::Update {
            id,
            name,
            description,
        } => {
            if name.is_none() && description.is_none() {
                return Err(eyre!("nothing to update: pass --name and/or --description"));
            }
            let update = ProjectUpdate { name, description };
            let updated = spin("Saving…", vm.update(&id, &update)).await;
            if let Some(project) = &updated {
                printer.project(project)?;
            }
            Ok(conclude(updated.is_some(), vm.take_events()))
        }
        ProjectAction::Delete { id } => {
            let deleted = spin("Deleting…", vm.delete(&id)).await;
            if deleted {
                eprintln!("Deleted project {id}.");
            }
            Ok(conclude(deleted, vm.take_events()))
        }
    }
}

// ---------------------------------------------------------------------------
// source
// ---------------------------------------------------------------------------

async fn cmd_source(ctx: &AppContext, action: SourceAction, printer: Printer) -> Result<ExitCode> {
    let repo = ctx.repos.sources.clone();

    match action {
        SourceAction::List { project } => {
            let mut vm = SourcesViewModel::new(repo, project);
            spin("Loading sources…", vm.load()).await;
            if let Some(sources) = vm.state().sources.ready() {
                printer.sources(sources)?;
            }
            let ok = vm.state().sources.error().is_none();
            Ok(conclude(ok, vm.take_events()))
        }
        SourceAction::Upload { path, project } => {
            let mut vm = SourcesViewModel::new(repo, project);
            let label = format!("Uploading {}…", path.display());
            let uploaded = spin(&label, vm.upload(&path)).await;
            if let Some(source) = &uploaded {
                printer.source(source)?;
            }
            Ok(conclude(uploaded.is_some(), vm.take_events()))
        }
        SourceAction::Link { url, project } => {
            let mut vm = SourcesViewModel::new(repo, project);
            let added = spin("Adding link…", vm.add_link(&url)).await;
            if let Some(source) = &added {
                printer.source(source)?;
            }
            Ok(conclude(added.is_some(), vm.take_events()))
        }
        SourceAction::Delete { id } => {
            let mut vm = SourcesViewModel::new(repo, None);
            let deleted = spin("Deleting…", vm.delete(&id)).await;
            if deleted {
                eprintln!("Deleted source {id}.");
            }
            Ok(conclude(deleted, vm.take_events()))
        }
    }
}

// ---------------------------------------------------------------------------
// profile
// ---------------------------------------------------------------------------

async fn cmd_profile(
    ctx: &AppContext,
    action: ProfileAction,
    printer: Printer,
) -> Result<ExitCode> {
    let mut vm = ProfileViewModel::new(ctx.repos.users.clone());

    match action {
        ProfileAction::Show => {
            spin("Loading profile…", vm.load()).await;
            if let Some(profile) = vm.state().profile.ready() {
                printer.profile(profile)?;
            }
            let ok = vm.state().profile.error().is_none();
            Ok(conclude(ok, vm.take_events()))
        }
        ProfileAction::Update {
            display_name,
            avatar_url,
        } => {
            if display_name.is_none() && avatar_url.is_none() {
                return Err(eyre!("nothing to update: pass --display-name and/or --avatar-url"));
            }
            let update = ProfileUpdate {
                display_name,
                avatar_url,
            };
            let saved = spin("Saving profile…", vm.save(&update)).await;
            if let Some(profile) = vm.state().profile.ready().filter(|_| saved) {
                printer.profile(profile)?;
            }
            Ok(conclude(saved, vm.take_events()))
        }
        ProfileAction::Delete { yes } => {
            if !yes {
                return Err(eyre!(
                    "account deletion is permanent; re-run with --yes to confirm"
                ));
            }
            let deleted = spin("Deleting account…", vm.delete_account()).await;
            Ok(conclude(deleted, vm.take_events()))
        }
    }
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

fn cmd_config_init() -> Result<ExitCode> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(ExitCode::SUCCESS)
}

fn cmd_config_show(api_url: Option<&str>) -> Result<ExitCode> {
    let config: AppConfig = resolve_config(api_url)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(ExitCode::SUCCESS)
}
