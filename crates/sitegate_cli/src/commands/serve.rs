//! `sitegate serve`

use sitegate_server::{hash_password, Server, ServerConfig};
use tracing::info;

/// Runs the server until interrupted.
pub async fn run(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    if !config.public_dir.is_dir() {
        return Err(format!(
            "public directory {:?} not found (run `sitegate build` first)",
            config.public_dir
        )
        .into());
    }

    info!("Starting {} backend on {}", config.backend, config.bind_addr);
    Server::new(config)?.serve().await?;
    Ok(())
}

/// Prints a stored hash for `password`.
pub fn hash(password: &str) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", hash_password(password)?);
    Ok(())
}
