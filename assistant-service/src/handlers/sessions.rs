use crate::dtos::{
    DocumentView, PostMessageRequest, SessionCreatedResponse, SessionDetailResponse, TurnResponse,
};
use crate::middleware::ClientId;
use crate::models::UploadedDocument;
use crate::services::assistants::AssistantError;
use crate::services::decoder;
use crate::services::ConversationError;
use crate::startup::AppState;
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use validator::Validate;

/// Convert conversation errors to the HTTP taxonomy.
fn conversation_error_to_app(error: ConversationError) -> AppError {
    match error {
        ConversationError::QuotaExceeded => AppError::TooManyRequests(
            "Usage limit reached. Please try again later.".to_string(),
            None,
        ),
        ConversationError::SessionNotFound(id) => {
            AppError::NotFound(anyhow::anyhow!("Session not found: {}", id))
        }
        ConversationError::RunInFlight(id) => AppError::Conflict(anyhow::anyhow!(
            "A run is already in progress for session {}",
            id
        )),
        ConversationError::Assistant(AssistantError::RateLimited) => AppError::TooManyRequests(
            "Rate limited by the assistant service".to_string(),
            None,
        ),
        ConversationError::Assistant(AssistantError::NotConfigured(msg)) => {
            AppError::InternalError(anyhow::anyhow!(msg))
        }
        err @ (ConversationError::RunFailed { .. }
        | ConversationError::RunCancelled(_)
        | ConversationError::RunExpired(_)
        | ConversationError::RunTimeout { .. }
        | ConversationError::Assistant(_)) => AppError::BadGateway(err.to_string()),
    }
}

/// Create a session: decode the uploaded contract, gate on quota, create
/// the remote thread and drive the first turn.
pub async fn create_session(
    State(state): State<AppState>,
    client_id: ClientId,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut file: Option<(String, String, Vec<u8>)> = None;
    let mut message: Option<String> = None;
    let mut title: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        AppError::BadRequest(anyhow::anyhow!("Failed to read multipart field: {}", e))
    })? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("file") => {
                let filename = field.file_name().unwrap_or("unnamed").to_string();
                let mime_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field.bytes().await.map_err(|e| {
                    AppError::BadRequest(anyhow::anyhow!("Failed to read file bytes: {}", e))
                })?;
                file = Some((filename, mime_type, data.to_vec()));
            }
            Some("message") => {
                message = Some(field.text().await.map_err(|e| {
                    AppError::BadRequest(anyhow::anyhow!("Failed to read message field: {}", e))
                })?);
            }
            Some("title") => {
                title = Some(field.text().await.map_err(|e| {
                    AppError::BadRequest(anyhow::anyhow!("Failed to read title field: {}", e))
                })?);
            }
            _ => {}
        }
    }

    let (filename, mime_type, raw) =
        file.ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("No contract file uploaded")))?;
    let message = message
        .filter(|m| !m.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("A message is required")))?;

    let size = raw.len() as i64;
    if size > state.config.limits.max_upload_bytes {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "File too large (max {} bytes)",
            state.config.limits.max_upload_bytes
        )));
    }

    let decoded = decoder::decode(&raw)
        .map_err(|e| AppError::BadRequest(anyhow::anyhow!("Error reading the file: {}", e)))?;

    tracing::info!(
        filename = %filename,
        size = size,
        encoding = %decoded.encoding,
        via_fallback = ?decoded.via_fallback,
        "Contract decoded"
    );

    let document = UploadedDocument::new(
        filename,
        mime_type,
        size,
        decoded.encoding,
        decoded.text,
    );

    let session = state
        .manager
        .start_session(&client_id.0, document, title)
        .await
        .map_err(conversation_error_to_app)?;

    // First turn carries the user's message and the contract text together.
    let first_turn = format!("{}\n\n{}", message, session.document.text);
    let reply = state
        .manager
        .converse(&session.session_id, &first_turn)
        .await
        .map_err(conversation_error_to_app)?;

    let session = state
        .store
        .find(&session.session_id)
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Session disappeared during creation")))?;

    Ok((
        StatusCode::CREATED,
        Json(SessionCreatedResponse {
            session_id: session.session_id.clone(),
            thread_id: session.thread_id.clone(),
            title: session.title.clone(),
            document: DocumentView::from(&session.document),
            reply,
            turn_count: session.turn_count,
        }),
    ))
}

/// Drive one follow-up turn on an existing session.
pub async fn post_message(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(payload): Json<PostMessageRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let reply = state
        .manager
        .converse(&session_id, &payload.message)
        .await
        .map_err(conversation_error_to_app)?;

    let session = state
        .store
        .find(&session_id)
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Session not found: {}", session_id)))?;

    Ok(Json(TurnResponse {
        session_id,
        reply,
        turn_count: session.turn_count,
    }))
}

/// Fetch a session with its turns.
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let session = state
        .store
        .find(&session_id)
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Session not found: {}", session_id)))?;

    Ok(Json(SessionDetailResponse::from(session)))
}

/// Close and discard a session.
pub async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if !state.store.delete(&session_id) {
        return Err(AppError::NotFound(anyhow::anyhow!(
            "Session not found: {}",
            session_id
        )));
    }

    tracing::info!(session_id = %session_id, "Session deleted");

    Ok(StatusCode::NO_CONTENT)
}
