//! Helpers for conversation lists.

use crate::constants::APP_NAME;
use medconnect_api_shared::Conversation;

/// Unread messages across all conversations.
pub fn total_unread(conversations: &[Conversation]) -> u32 {
    conversations.iter().map(|c| c.unread_count).sum()
}

/// Window title with the unread badge: `(3) MedConnect`.
pub fn unread_title(unread: u32) -> String {
    if unread > 0 {
        format!("({unread}) {APP_NAME}")
    } else {
        APP_NAME.to_string()
    }
}

/// The explicit title, otherwise the names of everyone except `viewer_id`.
pub fn conversation_title(conversation: &Conversation, viewer_id: &str) -> String {
    if let Some(title) = conversation
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
    {
        return title.to_string();
    }
    conversation
        .participant_links
        .iter()
        .filter(|p| p.user_id != viewer_id)
        .map(|p| p.user.display_name())
        .filter(|n| !n.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use medconnect_api_shared::{ParticipantLink, ParticipantUser};

    fn link(id: &str, first: &str, last: &str) -> ParticipantLink {
        ParticipantLink {
            user_id: id.into(),
            user: ParticipantUser {
                id: id.into(),
                first_name: first.into(),
                last_name: last.into(),
                ..ParticipantUser::default()
            },
            ..ParticipantLink::default()
        }
    }

    fn conversation(title: Option<&str>, unread: u32) -> Conversation {
        Conversation {
            id: "conv".into(),
            title: title.map(str::to_owned),
            is_group: true,
            unread_count: unread,
            updated_at: String::new(),
            participant_links: vec![
                link("me", "Ama", "Mensah"),
                link("u2", "Kofi", "Boateng"),
                link("u3", "Esi", "Owusu"),
            ],
            messages: Vec::new(),
        }
    }

    #[test]
    fn unread_badge() {
        let list = vec![conversation(None, 2), conversation(None, 0), conversation(None, 1)];
        assert_eq!(total_unread(&list), 3);
        assert_eq!(unread_title(3), "(3) MedConnect");
        assert_eq!(unread_title(0), "MedConnect");
    }

    #[test]
    fn title_falls_back_to_other_participants() {
        assert_eq!(
            conversation_title(&conversation(None, 0), "me"),
            "Kofi Boateng, Esi Owusu"
        );
        assert_eq!(
            conversation_title(&conversation(Some(" Ward round "), 0), "me"),
            "Ward round"
        );
    }
}
