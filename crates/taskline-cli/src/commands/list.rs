use std::path::Path;

use taskline_core::TaskStatus;

use crate::commands::common::{format_task_lines, open_service, task_to_list_item, TaskListItem};
use crate::error::CliError;

pub async fn run_list(include_completed: bool, as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let service = open_service(db_path).await?;
    let tasks = service
        .list()
        .await?
        .into_iter()
        .filter(|task| include_completed || task.status == TaskStatus::Pending)
        .collect::<Vec<_>>();

    if as_json {
        let json_items = tasks
            .iter()
            .map(task_to_list_item)
            .collect::<Vec<TaskListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else if tasks.is_empty() {
        println!("No tasks.");
    } else {
        for line in format_task_lines(&tasks) {
            println!("{line}");
        }
    }

    Ok(())
}
