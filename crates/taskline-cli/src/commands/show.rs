use std::path::Path;

use crate::commands::common::{format_task_details, open_service, task_to_list_item};
use crate::error::CliError;

pub async fn run_show(id: &str, as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let service = open_service(db_path).await?;
    let task = service.resolve(id).await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&task_to_list_item(&task))?);
    } else {
        for line in format_task_details(&task) {
            println!("{line}");
        }
    }
    Ok(())
}
