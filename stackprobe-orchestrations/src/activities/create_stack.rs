//! Submit stack activity

use chrono::Utc;
use stackprobe_models::{StackHandle, StackRequest};
use std::path::Path;

use crate::clients::StackService;
use crate::error::ProvisionError;
use crate::types::SubmitOptions;

/// Activity name for logging
pub const NAME: &str = "stackprobe::activity::create-stack";

pub async fn activity(
    stacks: &dyn StackService,
    template_file: &Path,
    key_name: &str,
    options: &SubmitOptions,
) -> Result<StackHandle, ProvisionError> {
    let template = read_template(template_file).await?;

    let request = StackRequest::new(&options.name_prefix, template, key_name, Utc::now())
        .with_timeout_mins(options.creation_timeout_mins)
        .with_disable_rollback(options.disable_rollback);

    tracing::info!(activity = NAME, "Started creating stack: {}", request.name);

    let handle = stacks
        .create_stack(&request)
        .await
        .map_err(ProvisionError::Submit)?;

    tracing::info!(activity = NAME, stack = %handle, "Stack submitted");
    Ok(handle)
}

/// Read the template and make sure it is at least well-formed YAML
async fn read_template(path: &Path) -> Result<String, ProvisionError> {
    let template = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ProvisionError::Template { path: path.to_path_buf(), source })?;

    serde_yaml::from_str::<serde_yaml::Value>(&template)
        .map_err(|source| ProvisionError::TemplateSyntax { path: path.to_path_buf(), source })?;

    Ok(template)
}
