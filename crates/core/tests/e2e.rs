//! The real client and case board against the in-memory backend on a local port.

use medconnect_api_shared::{NewCase, RegisterRequest, Urgency};
use medconnect_api_stub::StubState;
use medconnect_core::authoring::CaseDraft;
use medconnect_core::resources::AnswerDraft;
use medconnect_core::session::{CachedSession, RegistrationForm};
use medconnect_core::error::NETWORK_ERROR_MESSAGE;
use medconnect_core::{
    ApiClient, ApiError, Attachment, CaseBoard, ClientConfig, FeedFilters, FileSessionStore,
    MemorySessionStore, Session, VoteOutcome, VoteTarget,
};
use std::path::PathBuf;
use tempfile::TempDir;

struct Backend {
    state: StubState,
    base_url: String,
}

impl Backend {
    async fn start() -> Self {
        let state = StubState::new();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("should bind an ephemeral port");
        let addr = listener.local_addr().expect("should have a local address");
        tokio::spawn(medconnect_api_stub::serve(listener, state.clone()));
        Self {
            state,
            base_url: format!("http://{addr}/api"),
        }
    }

    fn client(&self) -> ApiClient {
        let config = ClientConfig::new(self.base_url.clone(), PathBuf::from("unused.json"))
            .expect("should build config");
        ApiClient::new(config).expect("should build client")
    }

    async fn signed_in(&self, dir: &TempDir, first_name: &str) -> Session<FileSessionStore> {
        let store = FileSessionStore::new(dir.path().join(format!("{first_name}.json")));
        let mut session = Session::new(store, self.client());
        let form = RegistrationForm {
            request: RegisterRequest {
                first_name: first_name.into(),
                last_name: "Mensah".into(),
                email: format!("{}@example.com", first_name.to_lowercase()),
                password: "secret".into(),
                phone_number: "024 123 4567".into(),
                country: "Ghana".into(),
                license_number: "MDC-42".into(),
                ..RegisterRequest::default()
            },
            confirm_password: "secret".into(),
        };
        session.register(form).await.expect("should register");
        session
    }

    fn last_listing_query(&self) -> String {
        self.state
            .requests()
            .into_iter()
            .filter(|r| r.method == "GET" && r.path == "/cases")
            .last()
            .and_then(|r| r.query)
            .unwrap_or_default()
    }
}

fn new_case(title: &str, urgency: Urgency) -> NewCase {
    NewCase {
        title: title.into(),
        description: "details".into(),
        specialty: None,
        urgency,
        tags: Vec::new(),
        country: None,
        media: Vec::new(),
    }
}

#[tokio::test]
async fn urgent_feed_vote_is_sent_once_and_reconciled() {
    let backend = Backend::start().await;
    let dir = TempDir::new().expect("should create temp dir");
    let author = backend.signed_in(&dir, "Kofi").await;
    for (title, urgency) in [
        ("a", Urgency::Urgent),
        ("b", Urgency::CaseStudy),
        ("c", Urgency::Urgent),
        ("d", Urgency::NonUrgent),
    ] {
        author
            .client()
            .create_case(&new_case(title, urgency))
            .await
            .expect("should create case");
    }

    let mut viewer = backend.signed_in(&dir, "Ama").await;
    let mut board = CaseBoard::new(viewer.client().clone(), 20);
    board
        .set_filters(FeedFilters {
            urgency: Some(Urgency::Urgent),
            ..FeedFilters::default()
        })
        .await
        .expect("should load feed");

    let query = backend.last_listing_query();
    assert!(query.contains("urgency=Urgent+ongoing+case"), "query was {query}");
    assert!(query.contains("limit=20"), "query was {query}");
    let cases = board.feed().cases();
    assert_eq!(cases.len(), 2);
    assert!(cases.iter().all(|c| c.urgency == Some(Urgency::Urgent)));

    let first = cases[0].id.clone();
    let outcome = board
        .vote(VoteTarget::case(&first), viewer.profile_mut())
        .await
        .expect("vote should succeed");
    match outcome {
        VoteOutcome::Applied { case, score_delta } => {
            assert_eq!(case.votes, 1);
            assert_eq!(case.author_score, 1.0);
            assert_eq!(score_delta, None);
        }
        other => panic!("Expected Applied, got {other:?}"),
    }

    let vote_path = format!("/cases/{first}/vote");
    assert_eq!(backend.state.count("POST", &vote_path), 1);
    assert_eq!(backend.state.count("GET", &format!("/cases/{first}")), 0);
    assert_eq!(board.feed().cases().len(), 2);
    assert_eq!(board.feed().find(&first).expect("case should be held").votes, 1);
    assert_eq!(board.leaders()[0].score, 1.0);

    let again = board
        .vote(VoteTarget::case(&first), viewer.profile_mut())
        .await
        .expect("repeat vote should be a no-op");
    assert!(matches!(again, VoteOutcome::AlreadyVoted));
    assert_eq!(backend.state.count("POST", &vote_path), 1);
}

#[tokio::test]
async fn requests_carry_the_session_token() {
    let backend = Backend::start().await;
    let dir = TempDir::new().expect("should create temp dir");
    let session = backend.signed_in(&dir, "Esi").await;
    let token = session.client().token().expect("token should be installed");
    assert!(token.starts_with("tok-"));

    let user = session.client().me().await.expect("me should succeed");
    assert_eq!(user.id.as_deref(), session.profile().map(|p| p.id.as_str()));
    let last = backend.state.requests().pop().expect("request logged");
    assert_eq!(last.path, "/auth/me");
    assert_eq!(last.authorization, Some(format!("Bearer {token}")));
}

#[tokio::test]
async fn json_bodies_are_labelled_and_multipart_keeps_its_boundary() {
    let backend = Backend::start().await;
    let dir = TempDir::new().expect("should create temp dir");
    let author = backend.signed_in(&dir, "Kofi").await;
    let case = author
        .client()
        .create_case(&new_case("Hyponatraemia", Urgency::NonUrgent))
        .await
        .expect("should create case");
    let last = backend.state.requests().pop().expect("request logged");
    assert_eq!(last.path, "/cases");
    assert_eq!(last.content_type.as_deref(), Some("application/json"));

    let answer = author
        .client()
        .create_answer(
            &case.id,
            AnswerDraft {
                content: Some("Check serum osmolality".into()),
                specialty: None,
                attachment: Some(Attachment::from_bytes("labs.pdf", b"%PDF-1.4".to_vec())),
            },
        )
        .await
        .expect("should post answer with attachment");
    assert_eq!(answer.attachment_name.as_deref(), Some("labs.pdf"));
    let last = backend.state.requests().pop().expect("request logged");
    assert_eq!(last.path, format!("/answers/{}", case.id));
    let content_type = last.content_type.expect("multipart content type");
    assert!(
        content_type.starts_with("multipart/form-data; boundary="),
        "content type was {content_type}"
    );
}

#[tokio::test]
async fn unreachable_backend_is_a_network_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("should bind a port");
    let addr = listener.local_addr().expect("should have a local address");
    drop(listener);
    let config = ClientConfig::new(format!("http://{addr}/api"), PathBuf::from("unused.json"))
        .expect("should build config");
    let client = ApiClient::new(config).expect("should build client");

    let err = client.me().await.expect_err("nothing is listening");
    assert!(err.is_network());
    assert_eq!(err.status(), None);
    assert_eq!(err.to_string(), NETWORK_ERROR_MESSAGE);
}

#[tokio::test]
async fn closed_case_rejects_votes_locally_and_remotely() {
    let backend = Backend::start().await;
    let dir = TempDir::new().expect("should create temp dir");
    let mut author = backend.signed_in(&dir, "Kofi").await;
    let mut board = CaseBoard::new(author.client().clone(), 20);

    let draft = CaseDraft {
        title: "Wound dehiscence".into(),
        description: "Day 5 post laparotomy".into(),
        urgency: Some(Urgency::NonUrgent),
        tags: vec!["#Surgery".into()],
        media: Vec::new(),
    };
    let id = board
        .create_case(draft, author.profile())
        .await
        .expect("should create case")
        .id
        .clone();
    assert_eq!(board.feed().cases()[0].tags, vec!["surgery"]);

    board
        .close_case(&id, author.profile())
        .await
        .expect("author should close case");
    assert!(board.selected().expect("case is open").closed);

    let err = board
        .vote(VoteTarget::case(&id), author.profile_mut())
        .await
        .expect_err("vote on a closed case should fail");
    match err {
        ApiError::CaseClosed => {}
        other => panic!("Expected CaseClosed, got {other:?}"),
    }
    assert_eq!(backend.state.count("POST", &format!("/cases/{id}/vote")), 0);

    let other = backend.signed_in(&dir, "Ama").await;
    let err = other
        .client()
        .vote_case(&id)
        .await
        .expect_err("backend should reject the vote");
    assert_eq!(err.status(), Some(400));
    assert_eq!(err.to_string(), "This case is closed");
}

#[tokio::test]
async fn validation_details_reach_the_error_message() {
    let backend = Backend::start().await;
    let dir = TempDir::new().expect("should create temp dir");
    let author = backend.signed_in(&dir, "Kofi").await;
    let case = author
        .client()
        .create_case(&new_case("Rash", Urgency::CaseStudy))
        .await
        .expect("should create case");

    let err = author
        .client()
        .create_answer(
            &case.id,
            AnswerDraft {
                content: Some("   ".into()),
                specialty: Some("Dermatology".into()),
                attachment: None,
            },
        )
        .await
        .expect_err("blank answer should be rejected");
    assert!(err.is_validation());
    assert_eq!(
        err.to_string(),
        "Validation failed: Answer content or attachment is required"
    );
    assert_eq!(
        err.field_errors(),
        vec![(
            "content".to_string(),
            "Answer content or attachment is required".to_string()
        )]
    );
}

#[tokio::test]
async fn voting_for_own_answer_moves_own_score() {
    let backend = Backend::start().await;
    let dir = TempDir::new().expect("should create temp dir");
    let author = backend.signed_in(&dir, "Kofi").await;
    let case = author
        .client()
        .create_case(&new_case("Chest pain", Urgency::Urgent))
        .await
        .expect("should create case");

    let mut doctor = backend.signed_in(&dir, "Ama").await;
    let mut board = CaseBoard::new(doctor.client().clone(), 20);
    board.refresh_feed().await.expect("should load feed");
    let answer = board
        .submit_answer(&case.id, AnswerDraft::text("  Get an ECG  "), doctor.profile())
        .await
        .expect("should answer");
    assert_eq!(answer.content.as_deref(), Some("Get an ECG"));

    let outcome = board
        .vote(VoteTarget::answer(&case.id, &answer.id), doctor.profile_mut())
        .await
        .expect("vote should succeed");
    match outcome {
        VoteOutcome::Applied { score_delta, .. } => assert_eq!(score_delta, Some(1.0)),
        other => panic!("Expected Applied, got {other:?}"),
    }
    let profile = doctor.profile().expect("signed in");
    assert_eq!(profile.score, 1.0);
    assert_eq!(profile.answer_votes_received, 1);
}

#[tokio::test]
async fn rejected_cached_token_clears_the_session() {
    let backend = Backend::start().await;
    let store = MemorySessionStore::with(CachedSession {
        token: Some("tok-stale".into()),
        user: None,
    });
    let mut session = Session::new(store, backend.client());

    let restored = session.restore().await.expect("restore should not fail");
    assert!(!restored);
    assert!(!session.is_authenticated());
    assert_eq!(session.client().token(), None);
    assert_eq!(backend.state.count("GET", "/auth/me"), 1);
}

#[tokio::test]
async fn cached_user_restores_without_a_request() {
    let backend = Backend::start().await;
    let dir = TempDir::new().expect("should create temp dir");
    let first = backend.signed_in(&dir, "Esi").await;
    let id = first.profile().expect("signed in").id.clone();
    let before = backend.state.requests().len();

    let mut again = Session::new(
        FileSessionStore::new(dir.path().join("Esi.json")),
        backend.client(),
    );
    assert!(again.restore().await.expect("restore"));
    assert_eq!(again.profile().map(|p| p.id.clone()), Some(id));
    assert_eq!(backend.state.requests().len(), before);
}
