use std::path::Path;

use taskline_core::models::TaskPatch;

use crate::cli::StatusArg;
use crate::commands::common::{open_service, short_id};
use crate::error::CliError;

pub struct EditArgs {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<StatusArg>,
}

impl EditArgs {
    fn into_patch(self) -> TaskPatch {
        TaskPatch {
            title: self.title,
            description: self.description,
            status: self.status.map(Into::into),
        }
    }
}

pub async fn run_edit(id: &str, args: EditArgs, db_path: &Path) -> Result<(), CliError> {
    let patch = args.into_patch();
    if patch.is_empty() {
        return Err(CliError::EmptyEdit);
    }

    let service = open_service(db_path).await?;
    let task = service.resolve(id).await?;
    let task = service.update(&task.id, patch).await?;

    println!("{}  {}", short_id(&task), task.title);
    Ok(())
}
