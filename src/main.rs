use anyhow::Result;
use bitdiff::areas::repository::Repository;
use bitdiff::artifacts::objects::commit::Author;
use bitdiff::config::{DEFAULT_LOG_FILTER, LOG_VAR};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "bitdiff",
    version = "0.1.0",
    author = "Sami Barbut-Dica",
    about = "Diff, status, blame and hunk staging for git repositories",
    long_about = "Reads a git repository's loose objects, index and working tree \
    to show diffs, status and blame, and stages or unstages individual hunks.",
    help_template = r"
{name} {version} - {about}

USAGE:
    {usage}

OPTIONS:
    {all-args}
",
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(
        name = "init",
        about = "Initialize a new repository",
        long_about = "This command initializes a new repository in the current directory or at the specified path."
    )]
    Init {
        #[arg(index = 1, help = "The path to the repository")]
        path: Option<PathBuf>,
    },
    #[command(name = "add", about = "Stage files as they are in the working tree")]
    Add {
        #[arg(index = 1, required = true, help = "Files or directories to stage")]
        paths: Vec<PathBuf>,
    },
    #[command(
        name = "commit",
        about = "Create a new commit with the specified message",
        long_about = "This command creates a new commit in the repository with the specified commit message."
    )]
    Commit {
        #[arg(short, long, help = "The commit message")]
        message: String,
    },
    #[command(name = "status", about = "Show per-file index and working tree status")]
    Status {
        #[arg(index = 1, help = "Only report this path")]
        path: Option<PathBuf>,
    },
    #[command(
        name = "diff",
        about = "Show unstaged changes, or staged ones with --cached",
        long_about = "This command prints a unified patch of the working tree against the index, \
        or of the index against HEAD when --cached is given."
    )]
    Diff {
        #[arg(long, alias = "staged", help = "Compare HEAD with the index")]
        cached: bool,
        #[arg(index = 1, help = "Only diff this path")]
        path: Option<PathBuf>,
    },
    #[command(name = "show", about = "Show a commit and its patch")]
    Show {
        #[arg(index = 1, default_value = "HEAD", help = "The revision to show")]
        revision: String,
        #[arg(long, help = "Compare against this parent instead of the first one")]
        parent: Option<String>,
        #[arg(index = 2, help = "Only show this path")]
        path: Option<PathBuf>,
    },
    #[command(name = "stage", about = "Stage one hunk of a file's unstaged diff")]
    Stage {
        #[arg(index = 1)]
        path: PathBuf,
        #[arg(long, default_value_t = 1, help = "1-based hunk number")]
        hunk: usize,
    },
    #[command(name = "unstage", about = "Unstage one hunk of a file's staged diff")]
    Unstage {
        #[arg(index = 1)]
        path: PathBuf,
        #[arg(long, default_value_t = 1, help = "1-based hunk number")]
        hunk: usize,
    },
    #[command(name = "blame", about = "Show which commit last changed each line")]
    Blame {
        #[arg(index = 1)]
        path: PathBuf,
        #[arg(long, help = "Revision to blame, HEAD by default")]
        from: Option<String>,
        #[arg(long, help = "Do not walk past this revision")]
        to: Option<String>,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_VAR)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open_repository() -> Result<Repository> {
    let pwd = std::env::current_dir()?;
    Repository::new(&pwd, Box::new(std::io::stdout()))
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Init { path } => {
            let repository = match path {
                Some(path) => Repository::new(&path, Box::new(std::io::stdout()))?,
                None => open_repository()?,
            };

            repository.init()?
        }
        Commands::Add { paths } => open_repository()?.add(&paths)?,
        Commands::Commit { message } => {
            open_repository()?.commit(&message, Author::load_from_env()?)?;
        }
        Commands::Status { path } => open_repository()?.show_status(path.as_deref())?,
        Commands::Diff { cached, path } => {
            open_repository()?.show_diff(cached, path.as_deref())?
        }
        Commands::Show {
            revision,
            parent,
            path,
        } => open_repository()?.show(&revision, parent.as_deref(), path.as_deref())?,
        Commands::Stage { path, hunk } => open_repository()?.stage_hunk(&path, hunk, true)?,
        Commands::Unstage { path, hunk } => open_repository()?.stage_hunk(&path, hunk, false)?,
        Commands::Blame { path, from, to } => {
            open_repository()?.show_blame(&path, from.as_deref(), to.as_deref())?
        }
    }

    Ok(())
}
