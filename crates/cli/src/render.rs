//! Plain-text rendering of view models for the terminal.

use medconnect_api_shared::{Hospital, UserRecord};
use medconnect_core::board::LeaderRow;
use medconnect_core::{CaseView, Profile};

pub fn case_line(case: &CaseView) -> String {
    let mut flags = Vec::new();
    if case.closed {
        flags.push("closed");
    }
    if case.edited {
        flags.push("edited");
    }
    let flags = if flags.is_empty() {
        String::new()
    } else {
        format!(" [{}]", flags.join(", "))
    };
    format!(
        "{id}  [{urgency}] {title}{flags}\n      {author} ({specialty}, {country}) · {time} · {votes} votes · {answers} answers",
        id = case.id,
        urgency = case.urgency.map_or("Unspecified", |u| u.label()),
        title = case.title,
        author = case.author,
        specialty = case.specialty,
        country = case.country,
        time = case.time,
        votes = case.votes,
        answers = case.answers.len(),
    )
}

pub fn case_detail(case: &CaseView) -> String {
    let mut out = case_line(case);
    out.push_str(&format!("\n\n{}\n", case.description));
    if !case.tags.is_empty() {
        let tags: Vec<String> = case.tags.iter().map(|t| format!("#{t}")).collect();
        out.push_str(&format!("\n{}\n", tags.join(" ")));
    }
    for item in &case.media {
        out.push_str(&format!("media: {}\n", item.url));
    }
    if case.closed {
        out.push_str("\nThis case is closed. Voting and new answers are disabled.\n");
    }
    out.push_str(&format!("\nAnswers ({}):\n", case.answers.len()));
    for answer in &case.answers {
        out.push_str(&format!(
            "\n  {} · {} ({}, score {:.2}) · {} votes\n",
            answer.id, answer.author, answer.specialty, answer.author_score, answer.votes
        ));
        if let Some(content) = &answer.content {
            out.push_str(&format!("  {content}\n"));
        }
        if let Some(attachment) = &answer.attachment {
            let name = attachment.name.as_deref().unwrap_or(&attachment.url);
            out.push_str(&format!("  attachment: {name}\n"));
        }
    }
    out
}

pub fn profile(profile: &Profile) -> String {
    let mut lines = vec![
        profile.full_title(),
        format!("email: {}", profile.email),
        format!("phone: {}", profile.formatted_phone()),
        format!("hospital: {}", profile.hospital),
        format!("specialty: {}", profile.specialty),
        format!("country: {}", profile.country),
        format!(
            "score: {:.2} ({} case votes, {} answer votes)",
            profile.score, profile.case_votes_received, profile.answer_votes_received
        ),
    ];
    if !profile.credentials.is_empty() {
        lines.push(format!("credentials: {}", profile.credentials.join(", ")));
    }
    if profile.is_admin() {
        lines.push("role: admin".into());
    }
    lines.join("\n")
}

pub fn leaders(rows: &[LeaderRow]) -> String {
    rows.iter()
        .enumerate()
        .map(|(i, row)| format!("{:>2}. {} ({:.2})", i + 1, row.name, row.score))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn doctor(user: &UserRecord) -> String {
    let name = medconnect_core::transform::display_name(
        user.first_name.as_deref(),
        user.last_name.as_deref(),
    );
    format!(
        "{}  {} · {} · {}",
        user.id.as_deref().unwrap_or("-"),
        name,
        user.specialty.as_deref().unwrap_or("-"),
        user.hospital.as_deref().unwrap_or("-"),
    )
}

pub fn hospital(hospital: &Hospital) -> String {
    let level = hospital.level.map(|l| l.as_str()).unwrap_or("-");
    format!(
        "{}  {} ({level}) · {}, {}",
        hospital.id.as_deref().unwrap_or("-"),
        hospital.name,
        hospital.city,
        hospital.country
    )
}
