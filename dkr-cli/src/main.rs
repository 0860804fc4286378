use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "dkr")]
#[command(about = "Docker dev environment builder for large git repos", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

const SSH_KEY_DEFAULT: &str = "~/.ssh/id_rsa";

#[derive(Subcommand)]
enum Commands {
    /// Create a new Docker image with a git repo clone
    CreateImage {
        /// Path to local git repo (default: cwd)
        git_repo: Option<String>,

        /// Branch/ref to check out (default: HEAD)
        branch_from: Option<String>,

        /// SSH private key path
        #[arg(long, default_value = SSH_KEY_DEFAULT)]
        ssh_key: String,
    },

    /// Update an existing image with git fetch + rebase
    UpdateImage {
        /// Path to local git repo (default: cwd)
        git_repo: Option<String>,

        /// Branch/ref (default: HEAD)
        branch_from: Option<String>,

        /// SSH private key path
        #[arg(long, default_value = SSH_KEY_DEFAULT)]
        ssh_key: String,
    },

    /// Start a container from a dkr image
    StartImage {
        /// Path to local git repo (default: latest image)
        git_repo: Option<String>,

        /// Branch/ref (default: latest image)
        branch_from: Option<String>,

        /// Working branch name (default: random adjective-noun)
        #[arg(long)]
        name: Option<String>,

        /// AI agent to run in the first tmux window
        #[arg(long, value_enum, default_value = "claude")]
        agent: Agent,

        /// Path to a file containing the Anthropic API key (mounted read-only)
        #[arg(long)]
        anthropic_key: Option<String>,

        /// Extra arguments forwarded to the container entrypoint
        #[arg(last = true)]
        container_args: Vec<String>,
    },

    /// List dkr-managed Docker images
    ListImages {
        /// Path to local git repo (filter)
        git_repo: Option<String>,

        /// Branch/ref (filter)
        branch_from: Option<String>,
    },
}

/// Agent started in the container's first tmux window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Agent {
    Claude,
    Codex,
    Opencode,
    None,
}

impl Agent {
    fn as_str(self) -> &'static str {
        match self {
            Self::Claude => "claude",
            Self::Codex => "codex",
            Self::Opencode => "opencode",
            Self::None => "none",
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::CreateImage { git_repo, branch_from, ssh_key } => {
            commands::create::run(git_repo, branch_from, &ssh_key)
        }
        Commands::UpdateImage { git_repo, branch_from, ssh_key } => {
            commands::update::run(git_repo, branch_from, &ssh_key)
        }
        Commands::StartImage { git_repo, branch_from, name, agent, anthropic_key, container_args } => {
            commands::start::run(commands::start::StartArgs {
                git_repo,
                branch_from,
                name,
                agent: agent.as_str(),
                anthropic_key,
                container_args,
            })
        }
        Commands::ListImages { git_repo, branch_from } => {
            commands::images::run(git_repo, branch_from)
        }
    }
}
