use crate::config::Config;
use anyhow::{Context, Result};
use mongodb::{bson::doc, Client, Database};
use tracing::info;

/**
 * function to connect_db
 * pings the server so a bad uri fails at startup, not on the first request
 */
pub async fn connect_db(config: &Config) -> Result<Database> {
    let uri = config
        .mongodb_uri
        .as_deref()
        .context("You must set the ENV for MONGODB_URI")?;

    let client = Client::with_uri_str(uri).await?;
    let db = client.database(&config.database_name);
    db.run_command(doc! { "ping": 1 })
        .await
        .context("MongoDB did not answer ping")?;

    info!("Connected to MongoDB database {}", config.database_name);
    Ok(db)
}
