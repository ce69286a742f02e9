//! sitegate CLI
//!
//! Command-line tools for building and serving a sitegate site.
//!
//! # Commands
//!
//! - `build` - Inline partials and write the site to the output directory
//! - `serve` - Serve the built site with the login/registration API
//! - `hash-password` - Print a stored password hash for seeding `users.json`

mod commands;

use clap::{Parser, Subcommand};
use sitegate_server::{BackendKind, ServerConfig};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Static site builder and auth server.
#[derive(Parser)]
#[command(name = "sitegate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render pages with their partials into the output directory
    Build {
        /// Directory of page templates and assets
        #[arg(short, long, default_value = "site")]
        input: PathBuf,

        /// Directory to write the site to
        #[arg(short, long, default_value = "dist")]
        output: PathBuf,

        /// Remove the output directory first
        #[arg(short, long)]
        clean: bool,
    },

    /// Serve the built site and the auth API
    Serve {
        /// Directory of built files to serve
        #[arg(long, default_value = "dist")]
        public: PathBuf,

        /// Address to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: IpAddr,

        /// Port to listen on
        #[arg(short, long, env = "PORT", default_value_t = 3000)]
        port: u16,

        /// Storage backend (demo, memory, file)
        #[arg(short, long, default_value = "file")]
        backend: BackendKind,

        /// Directory for users.json and sessions.json
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,

        /// Require CSRF tokens on POST requests
        #[arg(long, conflicts_with = "no_csrf")]
        csrf: bool,

        /// Do not require CSRF tokens
        #[arg(long)]
        no_csrf: bool,

        /// Session lifetime in seconds (0 = until logout)
        #[arg(long, default_value_t = 24 * 60 * 60)]
        session_ttl: u64,

        /// Mark cookies Secure (HTTPS deployments)
        #[arg(long)]
        secure_cookies: bool,
    },

    /// Print a password hash in the stored format
    HashPassword {
        /// Password to hash
        password: String,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Build {
            input,
            output,
            clean,
        } => {
            commands::build::run(&input, &output, clean)?;
        }
        Commands::Serve {
            public,
            host,
            port,
            backend,
            data_dir,
            csrf,
            no_csrf,
            session_ttl,
            secure_cookies,
        } => {
            let mut config = ServerConfig::new(SocketAddr::new(host, port))
                .with_public_dir(public)
                .with_backend(backend)
                .with_data_dir(data_dir)
                .with_session_ttl((session_ttl > 0).then(|| Duration::from_secs(session_ttl)))
                .with_secure_cookies(secure_cookies);
            if csrf || no_csrf {
                config = config.with_csrf(csrf);
            }
            commands::serve::run(config).await?;
        }
        Commands::HashPassword { password } => {
            commands::serve::hash(&password)?;
        }
        Commands::Version => {
            println!("sitegate v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
