//! Case Detail / Authoring rules: tag normalisation, draft validation and the author check.

use crate::constants::MAX_CASE_TAGS;
use crate::error::{ApiError, ApiResult};
use crate::profile::Profile;
use crate::transform::CaseView;
use medconnect_api_shared::{CaseUpdate, MediaItem, NewCase};
use medconnect_types::{NonEmptyText, Urgency};

/// Trim, strip leading `#` and lowercase. `None` when nothing is left.
pub fn normalize_tag(raw: &str) -> Option<String> {
    let tag = raw.trim().trim_start_matches('#').to_lowercase();
    if tag.is_empty() {
        None
    } else {
        Some(tag)
    }
}

/// Trim and lowercase a tag used as a feed filter.
pub fn normalize_tag_filter(raw: &str) -> Option<String> {
    let tag = raw.trim().to_lowercase();
    if tag.is_empty() {
        None
    } else {
        Some(tag)
    }
}

/// Add a tag to a case's tag list. Returns `false` when the tag is blank, a duplicate, or the
/// list is already full.
pub fn add_tag(tags: &mut Vec<String>, raw: &str) -> bool {
    match normalize_tag(raw) {
        Some(tag) if !tags.contains(&tag) && tags.len() < MAX_CASE_TAGS => {
            tags.push(tag);
            true
        }
        _ => false,
    }
}

/// A new case as typed by the user.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CaseDraft {
    pub title: String,
    pub description: String,
    pub urgency: Option<Urgency>,
    pub tags: Vec<String>,
    pub media: Vec<MediaItem>,
}

impl CaseDraft {
    /// Validate and build the request body. Tags go through [`add_tag`].
    pub fn into_request(self) -> ApiResult<NewCase> {
        let (title, description, urgency) =
            required_fields(&self.title, &self.description, self.urgency)?;
        let mut tags = Vec::new();
        for raw in &self.tags {
            add_tag(&mut tags, raw);
        }
        Ok(NewCase {
            title: title.into_inner(),
            description: description.into_inner(),
            specialty: None,
            urgency,
            tags,
            country: None,
            media: self.media,
        })
    }
}

/// An edit of an existing case. Title, description and urgency are resubmitted together.
#[derive(Clone, Debug, PartialEq)]
pub struct CaseEdit {
    pub title: String,
    pub description: String,
    pub urgency: Option<Urgency>,
}

impl CaseEdit {
    pub fn into_request(self) -> ApiResult<CaseUpdate> {
        let (title, description, urgency) =
            required_fields(&self.title, &self.description, self.urgency)?;
        Ok(CaseUpdate {
            title: Some(title.into_inner()),
            description: Some(description.into_inner()),
            urgency: Some(urgency),
            tags: None,
        })
    }
}

fn required_fields(
    title: &str,
    description: &str,
    urgency: Option<Urgency>,
) -> ApiResult<(NonEmptyText, NonEmptyText, Urgency)> {
    let title = NonEmptyText::new(title)
        .map_err(|_| ApiError::InvalidInput("A case needs a title".into()))?;
    let description = NonEmptyText::new(description)
        .map_err(|_| ApiError::InvalidInput("A case needs a description".into()))?;
    let urgency =
        urgency.ok_or_else(|| ApiError::InvalidInput("Please choose an urgency".into()))?;
    Ok((title, description, urgency))
}

/// Whether `viewer` wrote `case`. Matches on author id; cases without one fall back to comparing
/// display names.
pub fn is_case_author(case: &CaseView, viewer: &Profile) -> bool {
    match case.author_id.as_deref() {
        Some(author_id) => author_id == viewer.id,
        None => case.author == viewer.display_name() || case.author == "You",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medconnect_api_shared::UserRecord;

    fn viewer() -> Profile {
        Profile::from_record(&UserRecord {
            id: Some("u-1".into()),
            first_name: Some("Ama".into()),
            last_name: Some("Mensah".into()),
            ..UserRecord::default()
        })
        .expect("profile")
    }

    fn case_by(author_id: Option<&str>, author: &str) -> CaseView {
        CaseView {
            id: "c".into(),
            author_id: author_id.map(str::to_owned),
            title: "t".into(),
            author: author.into(),
            specialty: "s".into(),
            country: "—".into(),
            description: "d".into(),
            time: String::new(),
            created_at: None,
            votes: 0,
            answers: Vec::new(),
            urgency: Some(Urgency::CaseStudy),
            tags: Vec::new(),
            media: Vec::new(),
            closed: false,
            edited: false,
            edited_at: None,
            author_score: 0.0,
        }
    }

    #[test]
    fn tags_are_normalised_and_capped() {
        let mut tags = Vec::new();
        assert!(add_tag(&mut tags, "  #Cardio "));
        assert!(!add_tag(&mut tags, "cardio"));
        assert!(!add_tag(&mut tags, "##"));
        for i in 0..10 {
            add_tag(&mut tags, &format!("t{i}"));
        }
        assert_eq!(tags.len(), MAX_CASE_TAGS);
        assert_eq!(tags[0], "cardio");
    }

    #[test]
    fn tag_filters_keep_hash() {
        assert_eq!(normalize_tag_filter(" ICU "), Some("icu".into()));
        assert_eq!(normalize_tag_filter("   "), None);
    }

    #[test]
    fn draft_requires_title_description_and_urgency() {
        let draft = CaseDraft {
            title: "  ".into(),
            description: "d".into(),
            urgency: Some(Urgency::Urgent),
            ..CaseDraft::default()
        };
        assert!(matches!(draft.into_request(), Err(ApiError::InvalidInput(_))));

        let draft = CaseDraft {
            title: "t".into(),
            description: "d".into(),
            urgency: None,
            ..CaseDraft::default()
        };
        assert!(matches!(draft.into_request(), Err(ApiError::InvalidInput(_))));
    }

    #[test]
    fn draft_builds_trimmed_request() {
        let draft = CaseDraft {
            title: " Sepsis in pregnancy ".into(),
            description: " 28 weeks ".into(),
            urgency: Some(Urgency::NonUrgent),
            tags: vec!["#OBS".into(), "obs".into(), "sepsis".into()],
            media: Vec::new(),
        };
        let request = draft.into_request().expect("valid draft");
        assert_eq!(request.title, "Sepsis in pregnancy");
        assert_eq!(request.description, "28 weeks");
        assert_eq!(request.tags, vec!["obs", "sepsis"]);
    }

    #[test]
    fn edit_resubmits_all_three_fields() {
        let edit = CaseEdit {
            title: "New".into(),
            description: "Body".into(),
            urgency: Some(Urgency::CaseStudy),
        };
        let update = edit.into_request().expect("valid edit");
        assert_eq!(update.urgency, Some(Urgency::CaseStudy));
        assert_eq!(update.title.as_deref(), Some("New"));
        assert!(update.tags.is_none());
    }

    #[test]
    fn author_matches_by_id_then_name() {
        let viewer = viewer();
        assert!(is_case_author(&case_by(Some("u-1"), "Someone Else"), &viewer));
        assert!(!is_case_author(&case_by(Some("u-2"), "Ama Mensah"), &viewer));
        assert!(is_case_author(&case_by(None, "Ama Mensah"), &viewer));
        assert!(!is_case_author(&case_by(None, "Kofi Boateng"), &viewer));
    }
}
