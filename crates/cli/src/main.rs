//! `medconnect`: the MedConnect client on the command line.
//!
//! The session (token and user) is cached in `MEDCONNECT_SESSION_PATH` between runs, so `login`
//! once and the other commands act as that user.

mod render;

use clap::{Parser, Subcommand, ValueEnum};
use medconnect_api_shared::admin::Broadcast;
use medconnect_api_shared::{RegisterRequest, Urgency};
use medconnect_core::attachment::Attachment;
use medconnect_core::authoring::{CaseDraft, CaseEdit};
use medconnect_core::constants::{API_URL_ENV, SESSION_PATH_ENV};
use medconnect_core::messaging::{conversation_title, total_unread, unread_title};
use medconnect_core::resources::{AnswerDraft, HospitalFilters, UserFilters};
use medconnect_core::session::RegistrationForm;
use medconnect_core::{
    ApiClient, ApiError, ApiResult, CaseBoard, ClientConfig, FeedFilters, FeedTab,
    FileSessionStore, Profile, Session, VoteOutcome, VoteTarget,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "medconnect")]
#[command(about = "MedConnect case discussion client")]
struct Cli {
    /// Backend base URL, e.g. http://localhost:4000/api
    #[arg(long, global = true, env = API_URL_ENV)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, Default, ValueEnum)]
enum Tab {
    /// Most urgent first, then newest
    #[default]
    Trending,
    /// Newest first
    Recent,
}

impl From<Tab> for FeedTab {
    fn from(tab: Tab) -> Self {
        match tab {
            Tab::Trending => FeedTab::Trending,
            Tab::Recent => FeedTab::Recent,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and cache the session
    Login {
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Create an account and sign in
    Register {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        confirm_password: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        country: String,
        #[arg(long)]
        license_number: String,
        #[arg(long, default_value = "Dr.")]
        title: String,
        #[arg(long, default_value = "")]
        hospital: String,
        #[arg(long, default_value = "")]
        specialty: String,
        /// Repeat for several credentials
        #[arg(long = "credential")]
        credentials: Vec<String>,
    },
    /// Forget the cached session
    Logout,
    /// Show the signed-in profile
    Me,
    /// List cases
    Feed {
        #[arg(long)]
        search: Option<String>,
        /// urgent, non-urgent, study, or the full label
        #[arg(long)]
        urgency: Option<Urgency>,
        /// Repeat to require several tags
        #[arg(long = "tag")]
        tags: Vec<String>,
        #[arg(long)]
        open_only: bool,
        #[arg(long, value_enum, default_value_t = Tab::Trending)]
        tab: Tab,
        /// Number of pages to load
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    /// Show a case with its answers
    Show { case: String },
    /// Upvote a case
    VoteCase { case: String },
    /// Upvote an answer
    VoteAnswer { case: String, answer: String },
    /// Answer a case
    Answer {
        case: String,
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        attachment: Option<std::path::PathBuf>,
    },
    /// Edit one of your cases
    Edit {
        case: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        urgency: Urgency,
    },
    /// Close one of your cases
    Close { case: String },
    /// Post a new case
    Post {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        urgency: Option<Urgency>,
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// Top doctors by score
    Leaderboard,
    /// Search the doctor directory
    Doctors {
        #[arg(long)]
        search: Option<String>,
    },
    /// Search the hospital directory
    Hospitals {
        #[arg(long)]
        search: Option<String>,
    },
    /// List your conversations
    Conversations,
    /// Count unread messages
    Unread,
    /// Send a message to every user (admins only)
    AdminBroadcast {
        content: String,
        #[arg(long)]
        title: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("medconnect=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("Use 'medconnect --help' for commands");
        return Ok(());
    };

    let config = ClientConfig::from_env_values(cli.api_url, std::env::var(SESSION_PATH_ENV).ok())?;
    let client = ApiClient::new(config.clone())?;
    let mut session = Session::new(FileSessionStore::new(config.session_path()), client);
    session.restore().await?;

    if let Err(err) = run(command, &mut session, &config).await {
        if session.invalidate_on(&err) {
            eprintln!("Your session has expired. Please log in again.");
        } else if err.is_network() {
            eprintln!("{err}");
        } else {
            eprintln!("{}", err.alert_text());
        }
        std::process::exit(1);
    }
    Ok(())
}

fn signed_in(session: &Session<FileSessionStore>) -> ApiResult<&Profile> {
    session.profile().ok_or(ApiError::AuthRequired)
}

fn print_vote(outcome: VoteOutcome, session: &Session<FileSessionStore>) {
    match outcome {
        VoteOutcome::AlreadyVoted => println!("You have already voted on this."),
        VoteOutcome::Applied { case, score_delta } => {
            println!("Vote recorded. {} now has {} votes.", case.id, case.votes);
            if let (Some(_), Some(profile)) = (score_delta, session.profile()) {
                println!("Your score is now {:.2}.", profile.score);
            }
        }
    }
}

async fn run(
    command: Commands,
    session: &mut Session<FileSessionStore>,
    config: &ClientConfig,
) -> ApiResult<()> {
    let mut board = CaseBoard::new(session.client().clone(), config.page_size())
        .with_leaderboard_limit(config.leaderboard_limit());

    match command {
        Commands::Login { email, password } => {
            let profile = session.login(&email, &password).await?;
            println!("Signed in as {}", profile.full_title());
        }
        Commands::Register {
            first_name,
            last_name,
            email,
            password,
            confirm_password,
            phone,
            country,
            license_number,
            title,
            hospital,
            specialty,
            credentials,
        } => {
            let form = RegistrationForm {
                request: RegisterRequest {
                    title,
                    first_name,
                    last_name,
                    email,
                    password,
                    phone_number: phone,
                    country,
                    hospital,
                    specialty,
                    license_number,
                    bio: String::new(),
                    credentials,
                },
                confirm_password,
            };
            let profile = session.register(form).await?;
            println!("Welcome, {}", profile.full_title());
        }
        Commands::Logout => {
            session.logout()?;
            println!("Signed out");
        }
        Commands::Me => {
            println!("{}", render::profile(signed_in(session)?));
        }
        Commands::Feed {
            search,
            urgency,
            tags,
            open_only,
            tab,
            pages,
        } => {
            let mut filters = FeedFilters {
                search: search.unwrap_or_default(),
                urgency,
                open_only,
                ..FeedFilters::default()
            };
            for tag in &tags {
                filters.add_tag(tag);
            }
            board.set_filters(filters).await?;
            for _ in 1..pages {
                if !board.load_more().await? {
                    break;
                }
            }
            let cases = board.visible_cases(tab.into());
            if cases.is_empty() {
                println!("No cases found.");
            }
            for case in cases {
                println!("{}", render::case_line(case));
            }
            let feed = board.feed();
            match feed.total_pages() {
                Some(total) => println!("\npage {} of {}", feed.current_page(), total),
                None => println!("\npage {}", feed.current_page()),
            }
            if feed.has_more() {
                println!("more cases available (use --pages)");
            }
        }
        Commands::Show { case } => {
            let view = board.open_case(&case).await?;
            println!("{}", render::case_detail(view));
        }
        Commands::VoteCase { case } => {
            board.open_case(&case).await?;
            let outcome = board
                .vote(VoteTarget::case(case), session.profile_mut())
                .await?;
            print_vote(outcome, session);
        }
        Commands::VoteAnswer { case, answer } => {
            board.open_case(&case).await?;
            let outcome = board
                .vote(VoteTarget::answer(case, answer), session.profile_mut())
                .await?;
            print_vote(outcome, session);
        }
        Commands::Answer {
            case,
            content,
            attachment,
        } => {
            let attachment = match attachment {
                Some(path) => Some(Attachment::from_path(path).await?),
                None => None,
            };
            board.open_case(&case).await?;
            let draft = AnswerDraft {
                content,
                specialty: session.profile().map(|p| p.specialty.clone()),
                attachment,
            };
            let answer = board.submit_answer(&case, draft, session.profile()).await?;
            println!("Answer {} posted.", answer.id);
        }
        Commands::Edit {
            case,
            title,
            description,
            urgency,
        } => {
            board.open_case(&case).await?;
            let edit = CaseEdit {
                title,
                description,
                urgency: Some(urgency),
            };
            let view = board.edit_case(&case, edit, session.profile()).await?;
            println!("{}", render::case_line(&view));
        }
        Commands::Close { case } => {
            board.open_case(&case).await?;
            board.close_case(&case, session.profile()).await?;
            println!("Case {case} closed.");
        }
        Commands::Post {
            title,
            description,
            urgency,
            tags,
        } => {
            let draft = CaseDraft {
                title,
                description,
                urgency,
                tags,
                media: Vec::new(),
            };
            let view = board.create_case(draft, session.profile()).await?;
            println!("Posted case {}", view.id);
        }
        Commands::Leaderboard => {
            let rows = board.refresh_leaderboard().await?;
            println!("{}", render::leaders(rows));
        }
        Commands::Doctors { search } => {
            let filters = UserFilters {
                search,
                ..UserFilters::default()
            };
            for user in session.client().list_users(&filters).await? {
                println!("{}", render::doctor(&user));
            }
        }
        Commands::Hospitals { search } => {
            let filters = HospitalFilters {
                search,
                ..HospitalFilters::default()
            };
            for hospital in session.client().list_hospitals(&filters).await? {
                println!("{}", render::hospital(&hospital));
            }
        }
        Commands::Conversations => {
            let viewer = signed_in(session)?.id.clone();
            for conversation in session.client().list_conversations().await? {
                println!(
                    "{}  {} ({} unread)",
                    conversation.id,
                    conversation_title(&conversation, &viewer),
                    conversation.unread_count
                );
            }
        }
        Commands::Unread => {
            signed_in(session)?;
            let conversations = session.client().list_conversations().await?;
            println!("{}", unread_title(total_unread(&conversations)));
        }
        Commands::AdminBroadcast { content, title } => {
            if !signed_in(session)?.is_admin() {
                return Err(ApiError::InvalidInput("Admin access required".into()));
            }
            let response = session
                .client()
                .admin_broadcast(&Broadcast { content, title })
                .await?;
            println!("Broadcast sent: {response}");
        }
    }
    Ok(())
}
