//! Conversations between users and agencies
//!
//! Every write publishes a `MessageEvent` to the conversation members through
//! the `MessageHub`; the WebSocket side lives in `message_ws`.

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use serde::Serialize;
use shared::ApiResponse;
use shared::error::ErrorCode;
use shared::models::{
    Conversation, ConversationCreate, ConversationSummary, Message, MessageCreate, MessageEvent, MessagesQuery,
    message_body,
};
use validator::Validate;

use crate::auth::UserIdentity;
use crate::db;
use crate::db::messages::ConversationAccess;
use crate::error::ServiceResult;
use crate::state::AppState;

use super::ApiResult;

/// Conversation together with the message that opened or continued it
#[derive(Debug, Serialize)]
pub struct ConversationStarted {
    pub conversation: Conversation,
    pub message: Message,
}

async fn member_access(state: &AppState, identity: &UserIdentity, id: i64) -> ServiceResult<ConversationAccess> {
    // Non-members see the same error as a missing conversation
    Ok(db::messages::find_access(&state.pool, id)
        .await?
        .filter(|access| access.is_member(&identity.user_id))
        .ok_or(ErrorCode::ConversationNotFound)?)
}

fn publish_created(state: &AppState, members: &[&str], message: &Message) {
    let reached = state.message_hub.publish(
        members,
        &MessageEvent::MessageCreated {
            conversation_id: message.conversation_id,
            message: message.clone(),
        },
    );
    tracing::debug!(conversation_id = message.conversation_id, reached, "Message event published");
}

/// GET /api/conversations
pub async fn list_conversations(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
) -> ApiResult<Vec<ConversationSummary>> {
    let conversations = db::messages::list_for_user(&state.pool, &identity.user_id).await?;
    Ok(ApiResponse::success(conversations))
}

/// POST /api/conversations
///
/// Reuses the caller's conversation with the agency when one exists.
pub async fn create_conversation(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Json(req): Json<ConversationCreate>,
) -> ApiResult<ConversationStarted> {
    req.validate()?;
    let body = message_body(&req.body).ok_or(ErrorCode::MessageEmpty)?;

    let agency = db::agencies::find_by_id(&state.pool, req.agency_id)
        .await?
        .filter(|a| a.is_active)
        .ok_or(ErrorCode::AgencyNotFound)?;
    let Some(owner_id) = agency.owner_id.clone().filter(|_| agency.is_claimed) else {
        return Err(ErrorCode::AgencyNotMessageable.into());
    };
    if owner_id == identity.user_id {
        return Err(ErrorCode::AgencyNotMessageable.into());
    }

    let subject = shared::util::non_blank(req.subject.as_deref());
    let now = shared::util::now_millis();
    let mut tx = state.pool.begin().await?;
    let conversation =
        db::messages::get_or_create(&mut *tx, agency.id, &identity.user_id, subject, now).await?;
    let message = db::messages::insert_message(&mut tx, conversation.id, &identity.user_id, body, now).await?;
    tx.commit().await?;

    publish_created(&state, &[identity.user_id.as_str(), owner_id.as_str()], &message);
    tracing::info!(
        conversation_id = conversation.id,
        agency_id = agency.id,
        user_id = %identity.user_id,
        "Conversation message sent"
    );
    Ok(ApiResponse::created(ConversationStarted { conversation, message }))
}

/// GET /api/conversations/{id}/messages?before=&limit=
pub async fn list_messages(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(id): Path<i64>,
    Query(query): Query<MessagesQuery>,
) -> ApiResult<Vec<Message>> {
    member_access(&state, &identity, id).await?;
    let messages = db::messages::list_messages(&state.pool, id, query.before, query.limit()).await?;
    Ok(ApiResponse::success(messages))
}

/// POST /api/conversations/{id}/messages
pub async fn send_message(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(id): Path<i64>,
    Json(req): Json<MessageCreate>,
) -> ApiResult<Message> {
    req.validate()?;
    let body = message_body(&req.body).ok_or(ErrorCode::MessageEmpty)?;
    let access = member_access(&state, &identity, id).await?;

    let now = shared::util::now_millis();
    let mut tx = state.pool.begin().await?;
    let message = db::messages::insert_message(&mut tx, id, &identity.user_id, body, now).await?;
    tx.commit().await?;

    publish_created(&state, &access.members(), &message);
    Ok(ApiResponse::created(message))
}

/// POST /api/conversations/{id}/read
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(id): Path<i64>,
) -> ApiResult<serde_json::Value> {
    let access = member_access(&state, &identity, id).await?;
    let now = shared::util::now_millis();
    let marked = db::messages::mark_read(&state.pool, id, &identity.user_id, now).await?;

    if marked > 0 {
        state.message_hub.publish(
            &access.members(),
            &MessageEvent::ConversationRead {
                conversation_id: id,
                reader_id: identity.user_id.clone(),
                read_at: now,
            },
        );
    }
    Ok(ApiResponse::success(serde_json::json!({ "marked": marked })))
}
