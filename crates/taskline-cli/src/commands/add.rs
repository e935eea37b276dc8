use std::path::Path;

use crate::commands::common::{open_service, resolve_title};
use crate::error::CliError;

pub async fn run_add(
    title_parts: &[String],
    description: Option<&str>,
    db_path: &Path,
) -> Result<(), CliError> {
    let title = resolve_title(title_parts)?;

    let service = open_service(db_path).await?;
    let task = service.create(&title, description.unwrap_or_default()).await?;

    println!("{}", task.id);
    Ok(())
}
