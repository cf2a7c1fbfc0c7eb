use crate::copiclone::pac::{parse, AuthConfig, PacClient};
use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::{io::ErrorKind, path::Path, sync::Arc};
use tracing::{debug, error, instrument, warn};
use utoipa::ToSchema;

/// Fixed 400 body for a missing/empty field or a malformed request body.
pub const MISSING_PARAMETERS: &str = "Please provide all required parameters.";

/// Fixed 400 body when the pac probe fails.
pub const PAC_NOT_INSTALLED: &str =
    "Power Platform CLI (pac) is not installed or not in the system PATH.";

/// Fixed 500 body; detail is only logged server-side.
pub const CLONE_FAILED: &str = "An error occurred while cloning the copilot.";

#[derive(ToSchema, Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct CloneRequest {
    #[serde(default)]
    pub environment_id: String,
    #[serde(default)]
    pub bot_id: String,
    #[serde(default)]
    pub new_copilot_display_name: String,
    #[serde(default)]
    pub new_copilot_schema_name: String,
    #[serde(default)]
    pub new_copilot_solution: String,
}

impl CloneRequest {
    fn is_complete(&self) -> bool {
        [
            &self.environment_id,
            &self.bot_id,
            &self.new_copilot_display_name,
            &self.new_copilot_schema_name,
            &self.new_copilot_solution,
        ]
        .iter()
        .all(|field| !field.trim().is_empty())
    }
}

type CloneResponse = Result<(StatusCode, String), (StatusCode, String)>;

#[utoipa::path(
    post,
    path= "/clone",
    request_body = CloneRequest,
    responses (
        (status = 200, description = "Copilot cloned, human-readable summary", body = String),
        (status = 400, description = "Invalid request, pac missing, or a pac step failed", body = String),
        (status = 500, description = "Unexpected error while cloning", body = String)
    ),
    tag = "clone",
)]
#[instrument(skip(pac, payload))]
pub async fn clone_copilot(
    Extension(pac): Extension<Arc<PacClient>>,
    payload: Result<Json<CloneRequest>, JsonRejection>,
) -> CloneResponse {
    let request = parse_request(payload)?;

    if !pac.is_installed().await {
        return Err((StatusCode::BAD_REQUEST, PAC_NOT_INSTALLED.to_string()));
    }

    authenticate(&pac).await?;

    let template = pac.template_file(&request.new_copilot_schema_name);

    extract_template(&pac, &request, &template).await?;

    let created = pac
        .create_copilot(
            &request.environment_id,
            &request.new_copilot_display_name,
            &request.new_copilot_schema_name,
            &request.new_copilot_solution,
            &template,
        )
        .await;

    // The template is transient; it goes away whether or not create succeeded.
    remove_template(&template).await;

    let created = created.map_err(internal_error)?;
    if !created.success {
        return Err((
            StatusCode::BAD_REQUEST,
            format!(
                "Failed to create new copilot: {} {}",
                created.error, created.output
            ),
        ));
    }

    let copilot_id = parse::copilot_id(&created.output);
    let copilot_url = parse::copilot_url(&created.output);

    Ok((
        StatusCode::OK,
        success_message(&request.new_copilot_display_name, &copilot_id, &copilot_url),
    ))
}

fn parse_request(
    payload: Result<Json<CloneRequest>, JsonRejection>,
) -> Result<CloneRequest, (StatusCode, String)> {
    let Ok(Json(request)) = payload else {
        debug!("Malformed clone request body");
        return Err((StatusCode::BAD_REQUEST, MISSING_PARAMETERS.to_string()));
    };

    if !request.is_complete() {
        return Err((StatusCode::BAD_REQUEST, MISSING_PARAMETERS.to_string()));
    }

    Ok(request)
}

async fn authenticate(pac: &PacClient) -> Result<(), (StatusCode, String)> {
    let auth = AuthConfig::from_env().map_err(internal_error)?;

    let result = pac.auth_create(&auth).await.map_err(internal_error)?;
    if result.success {
        Ok(())
    } else {
        error!(
            "pac authentication failed. Output: {}. Error: {}",
            result.output, result.error
        );
        Err((StatusCode::INTERNAL_SERVER_ERROR, CLONE_FAILED.to_string()))
    }
}

async fn extract_template(
    pac: &PacClient,
    request: &CloneRequest,
    template: &Path,
) -> Result<(), (StatusCode, String)> {
    let result = pac
        .extract_template(&request.environment_id, &request.bot_id, template)
        .await
        .map_err(internal_error)?;

    if result.success {
        Ok(())
    } else {
        Err((
            StatusCode::BAD_REQUEST,
            format!("Failed to extract template: {}", result.error),
        ))
    }
}

// The extract step may have failed before writing the file; a missing file is fine.
async fn remove_template(template: &Path) {
    match tokio::fs::remove_file(template).await {
        Ok(()) => {}
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => warn!(
            "Could not remove template file {}: {}",
            template.display(),
            err
        ),
    }
}

fn internal_error(err: anyhow::Error) -> (StatusCode, String) {
    error!("Error cloning copilot: {err:#}");
    (StatusCode::INTERNAL_SERVER_ERROR, CLONE_FAILED.to_string())
}

fn success_message(display_name: &str, copilot_id: &str, copilot_url: &str) -> String {
    format!(
        "Copilot created successfully.\n\
         New copilot: {display_name}\n\
         Copilot ID: {copilot_id}\n\
         Copilot URL: {copilot_url}\n\n\
         To publish this copilot to channels of your choice, please follow these steps:\n\
         1. Go to the Power Virtual Agents portal: https://web.powerva.microsoft.com\n\
         2. Select your environment and open the newly created copilot\n\
         3. Navigate to the 'Publish' section\n\
         4. Choose the desired channels and follow the instructions to publish your copilot\n\n\
         For more information on publishing, visit: https://learn.microsoft.com/en-us/power-virtual-agents/publication-fundamentals-publish-channels"
    )
}
