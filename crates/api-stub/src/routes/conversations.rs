use crate::error::{ok, StubError, StubResult};
use crate::extract::{read_form, CurrentUser, FormFields};
use crate::store::{new_id, timestamp, Store};
use crate::StubState;
use axum::extract::{Multipart, Path, State};
use axum::Json;
use medconnect_api_shared::{Conversation, Message, MessageKind, ParticipantLink};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct TitleBody {
    #[serde(default)]
    title: String,
}

fn is_participant(conversation: &Conversation, user_id: &str) -> bool {
    conversation
        .participant_links
        .iter()
        .any(|p| p.user_id == user_id)
}

fn conversation_index(store: &Store, id: &str, user_id: &str) -> Result<usize, StubError> {
    let index = store
        .conversations
        .iter()
        .position(|c| c.id == id)
        .ok_or_else(|| StubError::not_found("Conversation not found"))?;
    if !is_participant(&store.conversations[index], user_id) {
        return Err(StubError::forbidden("Not a participant in this conversation"));
    }
    Ok(index)
}

/// The conversation as `viewer` sees it, with their unread count.
fn view_for(conversation: &Conversation, viewer: &str) -> Conversation {
    let last_read = conversation
        .participant_links
        .iter()
        .find(|p| p.user_id == viewer)
        .and_then(|p| p.last_read_at.clone());
    let unread = conversation
        .messages
        .iter()
        .filter(|m| m.author.as_ref().map(|a| a.id.as_str()) != Some(viewer))
        .filter(|m| last_read.as_deref().map_or(true, |read| m.created_at.as_str() > read))
        .count();
    Conversation {
        unread_count: unread as u32,
        ..conversation.clone()
    }
}

fn mark_read(conversation: &mut Conversation, viewer: &str, at: &str) {
    if let Some(link) = conversation
        .participant_links
        .iter_mut()
        .find(|p| p.user_id == viewer)
    {
        link.last_read_at = Some(at.to_string());
    }
}

/// A message built from `content`, `type` and `attachment` form fields, if any were sent.
fn message_from_form(store: &Store, form: &FormFields, author_id: &str) -> Option<Message> {
    let content = form.trimmed("content");
    let file = form.file.as_ref();
    if content.is_none() && file.is_none() {
        return None;
    }
    let kind = match form.trimmed("type").as_deref() {
        Some("image") => MessageKind::Image,
        Some("file") => MessageKind::File,
        Some(_) => MessageKind::Text,
        None => match file {
            Some(f) if f.mime_type.starts_with("image/") => MessageKind::Image,
            Some(_) => MessageKind::File,
            None => MessageKind::Text,
        },
    };
    Some(Message {
        id: new_id("msg"),
        content,
        kind,
        attachment_url: file.map(|f| f.url()),
        attachment_name: file.map(|f| f.name.clone()),
        attachment_mime_type: file.map(|f| f.mime_type.clone()),
        attachment_size: file.map(|f| f.size),
        hidden: Some(false),
        created_at: timestamp(),
        author: store.participant(author_id),
    })
}

/// Conversations the caller takes part in, most recently active first, with only the latest
/// message inlined.
#[axum::debug_handler]
pub async fn list(State(state): State<StubState>, user: CurrentUser) -> StubResult<Vec<Conversation>> {
    let store = state.store.read().await;
    let mut conversations: Vec<Conversation> = store
        .conversations
        .iter()
        .filter(|c| is_participant(c, &user.0))
        .map(|c| {
            let mut view = view_for(c, &user.0);
            let skip = view.messages.len().saturating_sub(1);
            view.messages = view.messages.split_off(skip);
            view
        })
        .collect();
    conversations.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    ok(conversations)
}

/// Full conversation. Reading it marks everything read for the caller.
#[axum::debug_handler]
pub async fn show(
    State(state): State<StubState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> StubResult<Conversation> {
    let mut store = state.store.write().await;
    let index = conversation_index(&store, &id, &user.0)?;
    let view = view_for(&store.conversations[index], &user.0);
    mark_read(&mut store.conversations[index], &user.0, &timestamp());
    ok(view)
}

/// `POST /conversations` (multipart: `participantIds` as a JSON array, `title`, optional first
/// message).
#[axum::debug_handler]
pub async fn create(
    State(state): State<StubState>,
    user: CurrentUser,
    multipart: Multipart,
) -> StubResult<Conversation> {
    let form = read_form(multipart).await?;
    let others: Vec<String> = form
        .text
        .get("participantIds")
        .map(|raw| serde_json::from_str(raw))
        .transpose()
        .map_err(|_| StubError::bad_request("participantIds must be a JSON array"))?
        .unwrap_or_default();

    let mut store = state.store.write().await;
    let mut ids = vec![user.0.clone()];
    for id in others {
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    if ids.len() < 2 {
        return Err(StubError::bad_request("A conversation needs another participant"));
    }
    let now = timestamp();
    let mut links = Vec::with_capacity(ids.len());
    for id in &ids {
        let participant = store
            .participant(id)
            .ok_or_else(|| StubError::bad_request(format!("Unknown participant: {id}")))?;
        links.push(ParticipantLink {
            user_id: id.clone(),
            user: participant,
            role: if *id == user.0 { "owner".into() } else { "member".into() },
            last_read_at: (*id == user.0).then(|| now.clone()),
        });
    }
    let conversation = Conversation {
        id: new_id("conv"),
        title: form.trimmed("title"),
        is_group: ids.len() > 2,
        unread_count: 0,
        updated_at: now,
        participant_links: links,
        messages: message_from_form(&store, &form, &user.0).into_iter().collect(),
    };
    let view = view_for(&conversation, &user.0);
    store.conversations.push(conversation);
    ok(view)
}

#[axum::debug_handler]
pub async fn post_message(
    State(state): State<StubState>,
    user: CurrentUser,
    Path(id): Path<String>,
    multipart: Multipart,
) -> StubResult<Message> {
    let form = read_form(multipart).await?;
    let mut store = state.store.write().await;
    let index = conversation_index(&store, &id, &user.0)?;
    let message = message_from_form(&store, &form, &user.0)
        .ok_or_else(|| StubError::bad_request("Message content or attachment is required"))?;
    let conversation = &mut store.conversations[index];
    conversation.updated_at = message.created_at.clone();
    conversation.messages.push(message.clone());
    mark_read(conversation, &user.0, &message.created_at);
    ok(message)
}

#[axum::debug_handler]
pub async fn rename(
    State(state): State<StubState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(body): Json<TitleBody>,
) -> StubResult<Conversation> {
    let mut store = state.store.write().await;
    let index = conversation_index(&store, &id, &user.0)?;
    let title = body.title.trim();
    store.conversations[index].title = (!title.is_empty()).then(|| title.to_string());
    ok(view_for(&store.conversations[index], &user.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use medconnect_api_shared::ParticipantUser;

    fn message(author: &str, at: &str) -> Message {
        Message {
            id: format!("m-{at}"),
            content: Some("hi".into()),
            kind: MessageKind::Text,
            attachment_url: None,
            attachment_name: None,
            attachment_mime_type: None,
            attachment_size: None,
            hidden: None,
            created_at: at.into(),
            author: Some(ParticipantUser {
                id: author.into(),
                ..ParticipantUser::default()
            }),
        }
    }

    #[test]
    fn unread_counts_only_newer_messages_from_others() {
        let conversation = Conversation {
            id: "conv".into(),
            title: None,
            is_group: false,
            unread_count: 0,
            updated_at: String::new(),
            participant_links: vec![ParticipantLink {
                user_id: "me".into(),
                last_read_at: Some("2025-03-10T10:00:00.000Z".into()),
                ..ParticipantLink::default()
            }],
            messages: vec![
                message("you", "2025-03-10T09:00:00.000Z"),
                message("you", "2025-03-10T11:00:00.000Z"),
                message("me", "2025-03-10T11:30:00.000Z"),
                message("you", "2025-03-10T12:00:00.000Z"),
            ],
        };
        assert_eq!(view_for(&conversation, "me").unread_count, 2);
    }
}
