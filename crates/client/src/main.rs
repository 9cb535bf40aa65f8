//! Cabinet
//!
//! Terminal client for the Cabinet file server.

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};

use client::commands::Commands as Ops;
use client::config::Config;
use client::notify::Toasts;
use client::prefs::PrefsStore;
use client::state::Browser;
use client::ui::BrowserApp;
use client::users::{
    NewUser, Role, Session, SessionStore, UserDirectory, UserRecord, UserUpdate,
};

/// Cabinet - terminal client for the Cabinet file server.
#[derive(Parser, Debug)]
#[command(name = "cabinet")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Open the interactive file browser
    Browse,

    /// List a folder
    Ls {
        /// Folder to list (defaults to the root)
        folder: Option<String>,

        /// Show sizes and modification dates
        #[arg(long, short)]
        long: bool,
    },

    /// Upload local files
    Upload {
        /// Files to upload
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Destination folder
        #[arg(long, default_value = "")]
        folder: String,
    },

    /// Download files into the download directory
    Download {
        /// File names to download
        #[arg(required = true)]
        names: Vec<String>,

        /// Folder the files live in
        #[arg(long, default_value = "")]
        folder: String,

        /// Write downloads to this directory instead
        #[arg(long, short)]
        out: Option<PathBuf>,
    },

    /// Delete files or folders
    Rm {
        /// Entry names to delete
        #[arg(required = true)]
        names: Vec<String>,

        /// Folder the entries live in
        #[arg(long, default_value = "")]
        folder: String,
    },

    /// Create a folder
    Mkdir {
        /// Name of the new folder
        name: String,

        /// Parent folder
        #[arg(long, default_value = "")]
        parent: String,
    },

    /// Show storage usage
    Storage {
        /// Folder to scope the usage to
        folder: Option<String>,
    },

    /// Log in as a user
    Login {
        /// Username
        #[arg(long, short)]
        username: String,

        /// Password
        #[arg(long, short)]
        password: String,
    },

    /// Log out of the current session
    Logout,

    /// Show the logged-in user
    Whoami,

    /// Manage user accounts
    #[command(subcommand)]
    Users(UsersCommands),
}

/// Subcommands for account management.
#[derive(Subcommand, Debug, Clone)]
pub enum UsersCommands {
    /// List all accounts
    List,

    /// Create an account
    Create {
        #[arg(long)]
        username: String,

        #[arg(long)]
        password: String,

        #[arg(long)]
        email: String,

        #[arg(long)]
        name: String,

        #[arg(long, value_enum, default_value = "user")]
        role: RoleArg,
    },

    /// Update an account
    Update {
        /// Id of the account to update
        id: u64,

        #[arg(long)]
        username: Option<String>,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        name: Option<String>,

        #[arg(long, value_enum)]
        role: Option<RoleArg>,
    },

    /// Delete an account
    Delete {
        /// Id of the account to delete
        id: u64,
    },

    /// Change the logged-in user's password
    Passwd {
        /// Current password
        #[arg(long)]
        current: String,

        /// New password
        #[arg(long)]
        new: String,
    },

    /// Reset another account's password without verification
    Reset {
        /// Id of the account to reset
        id: u64,

        /// New password
        #[arg(long)]
        password: String,
    },
}

/// Account role argument.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleArg {
    Admin,
    User,
}

impl From<RoleArg> for Role {
    fn from(arg: RoleArg) -> Self {
        match arg {
            RoleArg::Admin => Role::Admin,
            RoleArg::User => Role::User,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration first so its log level can seed tracing.
    let mut config = if let Some(config_path) = &cli.config {
        Config::load(config_path)?
    } else {
        Config::load_default()?
    };
    config.apply_env_overrides();
    config.validate()?;

    let filter = if cli.verbose {
        "debug".to_string()
    } else if matches!(cli.command, Commands::Browse) {
        // Keep the alternate screen clean.
        "error".to_string()
    } else {
        config.client.log_level.clone()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let data_dir = config.client.data_dir.clone();
    let directory = UserDirectory::in_data_dir(&data_dir);
    directory.load()?;
    let sessions = SessionStore::in_data_dir(&data_dir);

    match cli.command {
        Commands::Browse => {
            let user = require_login(&directory, &sessions)?;
            run_browser(&config, &data_dir, user).await
        }
        Commands::Ls { folder, long } => {
            require_login(&directory, &sessions)?;
            let ops = Ops::from_config(&config)?;
            let mut browser = Browser::default();
            let mut toasts = Toasts::new();
            ops.load_files(&mut browser, &mut toasts, folder.as_deref().unwrap_or(""))
                .await;
            print_toasts(&toasts);

            let now = chrono::Local::now();
            for entry in browser.sorted_entries() {
                if long {
                    let size = if entry.is_directory {
                        "-".to_string()
                    } else {
                        client::format::format_size(entry.size)
                    };
                    println!(
                        "{:<32} {:>10}  {}",
                        entry.name,
                        size,
                        client::format::format_date(entry.modified, now)
                    );
                } else {
                    println!("{}", entry.name);
                }
            }
            Ok(())
        }
        Commands::Upload { paths, folder } => {
            require_login(&directory, &sessions)?;
            let ops = Ops::from_config(&config)?;
            let mut browser = Browser::default();
            let mut toasts = Toasts::new();
            ops.load_files(&mut browser, &mut toasts, &folder).await;
            let outcome = ops.upload_paths(&mut browser, &mut toasts, &paths).await;
            print_toasts(&toasts);
            if outcome.succeeded < outcome.attempted {
                bail!(
                    "uploaded {} of {} files",
                    outcome.succeeded,
                    outcome.attempted
                );
            }
            Ok(())
        }
        Commands::Download { names, folder, out } => {
            require_login(&directory, &sessions)?;
            let mut ops = Ops::from_config(&config)?;
            if let Some(out) = out {
                ops = Ops::new(
                    ops.api().clone(),
                    out,
                    config.download_throttle(),
                );
            }
            let mut browser = Browser::default();
            let mut toasts = Toasts::new();
            ops.load_files(&mut browser, &mut toasts, &folder).await;

            let ids: Vec<String> = names
                .iter()
                .filter_map(|name| {
                    let found = browser.entries().iter().find(|e| &e.name == name);
                    if found.is_none() {
                        eprintln!("not found: {name}");
                    }
                    found.map(|e| e.id.clone())
                })
                .collect();

            let mut succeeded = 0;
            for id in &ids {
                if ops.download_entry(&browser, &mut toasts, id).await {
                    succeeded += 1;
                }
                tokio::time::sleep(config.download_throttle()).await;
            }
            print_toasts(&toasts);
            if succeeded < names.len() {
                bail!("downloaded {} of {} files", succeeded, names.len());
            }
            Ok(())
        }
        Commands::Rm { names, folder } => {
            require_login(&directory, &sessions)?;
            let ops = Ops::from_config(&config)?;
            let mut browser = Browser::default();
            let mut toasts = Toasts::new();
            ops.load_files(&mut browser, &mut toasts, &folder).await;

            let ids: Vec<String> = names
                .iter()
                .filter_map(|name| {
                    let found = browser.entries().iter().find(|e| &e.name == name);
                    if found.is_none() {
                        eprintln!("not found: {name}");
                    }
                    found.map(|e| e.id.clone())
                })
                .collect();

            let outcome = ops.delete_entries(&mut browser, &mut toasts, &ids).await;
            print_toasts(&toasts);
            if outcome.succeeded < names.len() {
                bail!("deleted {} of {} entries", outcome.succeeded, names.len());
            }
            Ok(())
        }
        Commands::Mkdir { name, parent } => {
            require_login(&directory, &sessions)?;
            let ops = Ops::from_config(&config)?;
            let mut browser = Browser::default();
            let mut toasts = Toasts::new();
            browser.replace_listing(Vec::new(), &parent);
            let created = ops.create_folder(&mut browser, &mut toasts, &name).await;
            print_toasts(&toasts);
            if !created {
                bail!("failed to create folder");
            }
            Ok(())
        }
        Commands::Storage { folder } => {
            require_login(&directory, &sessions)?;
            let ops = Ops::from_config(&config)?;
            match ops.storage_info(folder.as_deref().unwrap_or("")).await {
                Some(info) => {
                    println!(
                        "Used {} of {} ({}%)",
                        client::format::format_size(info.used_space),
                        client::format::format_size(info.total_space),
                        info.used_percent()
                    );
                    println!(
                        "Folder size: {}",
                        client::format::format_size(info.total_size)
                    );
                    Ok(())
                }
                None => bail!("failed to fetch storage info"),
            }
        }
        Commands::Login { username, password } => {
            let user = directory
                .authenticate(&username, &password)
                .context("Login failed")?;
            directory.save()?;
            sessions.save(&Session::start(user.id))?;
            println!("Logged in as {} ({})", user.name, user.role.label());
            Ok(())
        }
        Commands::Logout => {
            sessions.clear()?;
            println!("Logged out");
            Ok(())
        }
        Commands::Whoami => {
            let user = require_login(&directory, &sessions)?;
            println!("{} <{}> [{}]", user.name, user.email, user.role.label());
            println!("Permissions: {}", user.permissions.join(", "));
            Ok(())
        }
        Commands::Users(command) => {
            let actor = require_login(&directory, &sessions)?;
            handle_users_command(&directory, &actor, command)?;
            directory.save()?;
            Ok(())
        }
    }
}

/// Runs the interactive browser.
async fn run_browser(config: &Config, data_dir: &PathBuf, user: UserRecord) -> anyhow::Result<()> {
    let prefs_store = PrefsStore::in_data_dir(data_dir);
    let prefs = prefs_store.load().unwrap_or_default();

    let ops = Ops::from_config(config)?;
    let browser = Browser::new(prefs.view_mode);
    let mut app = BrowserApp::new(browser, user.name, prefs_store)?;

    // Initial load of the root listing and storage usage.
    let (browser, toasts) = app.parts();
    ops.load_files(browser, toasts, "").await;
    let storage = ops.storage_info("").await;
    app.set_storage(storage);

    let result = app.run(&ops).await;
    app.restore()?;
    result?;
    Ok(())
}

/// Resolves the logged-in user or fails with a login hint.
fn require_login(directory: &UserDirectory, sessions: &SessionStore) -> anyhow::Result<UserRecord> {
    let session = sessions
        .load()?
        .ok_or_else(|| anyhow::anyhow!("Not logged in; run `cabinet login` first"))?;
    directory
        .get(session.user_id)?
        .ok_or_else(|| anyhow::anyhow!("Session user no longer exists; run `cabinet login`"))
}

/// Executes an account-management subcommand.
fn handle_users_command(
    directory: &UserDirectory,
    actor: &UserRecord,
    command: UsersCommands,
) -> anyhow::Result<()> {
    match command {
        UsersCommands::List => {
            for user in directory.list()? {
                let marker = if user.id == actor.id { " (current)" } else { "" };
                println!(
                    "{:>3}  {:<20} {:<28} {}{}",
                    user.id,
                    user.username,
                    user.email,
                    user.role.label(),
                    marker
                );
            }
            Ok(())
        }
        UsersCommands::Create {
            username,
            password,
            email,
            name,
            role,
        } => {
            let user = directory.create_user(NewUser {
                username,
                password,
                email,
                name,
                role: role.into(),
            })?;
            println!("Created user {} ({})", user.id, user.username);
            Ok(())
        }
        UsersCommands::Update {
            id,
            username,
            email,
            name,
            role,
        } => {
            let user = directory.update_user(
                id,
                UserUpdate {
                    username,
                    email,
                    name,
                    role: role.map(Into::into),
                },
            )?;
            println!("Updated user {} ({})", user.id, user.username);
            Ok(())
        }
        UsersCommands::Delete { id } => {
            let removed = directory.delete_user(actor.id, id)?;
            println!("Deleted user {} ({})", removed.id, removed.username);
            Ok(())
        }
        UsersCommands::Passwd { current, new } => {
            directory.change_password(actor.id, &current, &new)?;
            println!("Password changed");
            Ok(())
        }
        UsersCommands::Reset { id, password } => {
            directory.set_password(id, &password)?;
            println!("Password reset for user {id}");
            Ok(())
        }
    }
}

/// Prints accumulated toasts to the terminal.
fn print_toasts(toasts: &Toasts) {
    for toast in toasts.iter() {
        println!("{}", toast.message);
    }
}
