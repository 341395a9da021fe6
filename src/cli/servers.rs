//! Servers command implementation

use crate::api::types::ServerEntry;
use crate::cli::Session;
use crate::core::error::Result;

/// Run the servers command
pub async fn run(session: &Session) -> Result<()> {
    let names = session
        .scope
        .run(session.directory.refresh(&session.client))
        .await?;
    let entries: Vec<ServerEntry> = names.into_iter().map(|name| ServerEntry { name }).collect();
    session.print(&entries);
    Ok(())
}
