use std::path::Path;

use crate::commands::common::{open_service, short_id};
use crate::error::CliError;

pub async fn run_toggle(id: &str, db_path: &Path) -> Result<(), CliError> {
    let service = open_service(db_path).await?;
    let task = service.resolve(id).await?;

    let task = service.toggle_status(&task.id).await?;
    println!("{}  {}", short_id(&task), task.status);
    Ok(())
}
