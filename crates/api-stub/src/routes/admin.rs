use crate::error::{ok, StubError, StubResult};
use crate::extract::CurrentUser;
use crate::store::{new_id, timestamp};
use crate::StubState;
use axum::extract::State;
use axum::Json;
use medconnect_api_shared::admin::Broadcast;
use medconnect_api_shared::{Conversation, Message, MessageKind, ParticipantLink};
use serde_json::{json, Value};

/// Posts `content` to a new group conversation holding every user.
#[axum::debug_handler]
pub async fn broadcast(
    State(state): State<StubState>,
    user: CurrentUser,
    Json(broadcast): Json<Broadcast>,
) -> StubResult<Value> {
    let mut store = state.store.write().await;
    if !store.user(&user.0).is_some_and(|u| u.is_admin()) {
        return Err(StubError::forbidden("Admin access required"));
    }
    let content = broadcast.content.trim();
    if content.is_empty() {
        return Err(StubError::bad_request("Broadcast content is required"));
    }

    let now = timestamp();
    let links: Vec<ParticipantLink> = store
        .users
        .iter()
        .filter_map(|u| {
            let id = u.id().to_string();
            store.participant(&id).map(|participant| ParticipantLink {
                last_read_at: (id == user.0).then(|| now.clone()),
                role: if id == user.0 { "owner".into() } else { "member".into() },
                user_id: id,
                user: participant,
            })
        })
        .collect();
    let recipients = links.len().saturating_sub(1);
    let message = Message {
        id: new_id("msg"),
        content: Some(content.to_string()),
        kind: MessageKind::Text,
        attachment_url: None,
        attachment_name: None,
        attachment_mime_type: None,
        attachment_size: None,
        hidden: Some(false),
        created_at: now.clone(),
        author: store.participant(&user.0),
    };
    let conversation = Conversation {
        id: new_id("conv"),
        title: broadcast
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .or_else(|| Some("Announcement".into())),
        is_group: true,
        unread_count: 0,
        updated_at: now,
        participant_links: links,
        messages: vec![message],
    };
    store.conversations.push(conversation);
    tracing::info!("broadcast sent to {recipients} users");
    ok(json!({ "recipients": recipients }))
}
