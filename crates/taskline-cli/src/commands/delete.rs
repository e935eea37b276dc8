use std::path::Path;

use crate::commands::common::open_service;
use crate::error::CliError;

pub async fn run_delete(id: &str, db_path: &Path) -> Result<(), CliError> {
    let service = open_service(db_path).await?;
    let task = service.resolve(id).await?;

    service.request_delete(&task.id).await?;
    println!("{}", task.id);
    Ok(())
}
