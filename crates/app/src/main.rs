mod commands;

use std::fmt;
use std::path::PathBuf;

use prep_core::model::CategoryKind;
use services::{AppServices, Clock};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    MissingCategory,
    ConflictingCategory,
    MissingRole,
    BlankValue { flag: &'static str },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::MissingCategory => write!(f, "quiz needs --subject or --company"),
            ArgsError::ConflictingCategory => {
                write!(f, "use only one of --subject and --company")
            }
            ArgsError::MissingRole => write!(f, "interview needs --role"),
            ArgsError::BlankValue { flag } => write!(f, "{flag} cannot be blank"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    let value = args.next().ok_or(ArgsError::MissingValue { flag })?;
    if value.trim().is_empty() {
        return Err(ArgsError::BlankValue { flag });
    }
    Ok(value)
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Quiz { kind: CategoryKind, name: String },
    Interview { role: String, clips: Vec<PathBuf> },
    Chat { query: Option<String> },
    Report,
}

struct Args {
    command: Command,
    token: Option<String>,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  prep quiz      (--subject <name> | --company <name>) [--token <token>]");
    eprintln!("  prep interview --role <name> --clip <file> [--clip <file> ...] [--token <token>]");
    eprintln!("  prep chat      [--query <text>] [--token <token>]");
    eprintln!("  prep report    [--token <token>]");
    eprintln!();
    eprintln!("Interview answers are read from the given audio files, one per question.");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  PREP_BACKEND_URL (default http://localhost:3000)");
    eprintln!("  PREP_TOKEN, PREP_AUTH_HEADER (default token), PREP_HTTP_TIMEOUT_SECS (default 30)");
    eprintln!("  RUST_LOG (default info)");
}

impl Args {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Option<Self>, ArgsError> {
        let Some(sub) = args.next() else {
            return Ok(None);
        };

        let mut token = None;
        let mut subject = None;
        let mut company = None;
        let mut role = None;
        let mut clips = Vec::new();
        let mut query = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--token" => token = Some(require_value(&mut args, "--token")?),
                "--subject" if sub == "quiz" => {
                    subject = Some(require_value(&mut args, "--subject")?);
                }
                "--company" if sub == "quiz" => {
                    company = Some(require_value(&mut args, "--company")?);
                }
                "--role" if sub == "interview" => {
                    role = Some(require_value(&mut args, "--role")?);
                }
                "--clip" if sub == "interview" => {
                    clips.push(PathBuf::from(require_value(&mut args, "--clip")?));
                }
                "--query" if sub == "chat" => query = Some(require_value(&mut args, "--query")?),
                "--help" | "-h" => return Ok(None),
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        let command = match sub.as_str() {
            "quiz" => match (subject, company) {
                (Some(name), None) => Command::Quiz {
                    kind: CategoryKind::Subject,
                    name,
                },
                (None, Some(name)) => Command::Quiz {
                    kind: CategoryKind::Company,
                    name,
                },
                (None, None) => return Err(ArgsError::MissingCategory),
                (Some(_), Some(_)) => return Err(ArgsError::ConflictingCategory),
            },
            "interview" => Command::Interview {
                role: role.ok_or(ArgsError::MissingRole)?,
                clips,
            },
            "chat" => Command::Chat { query },
            "report" => Command::Report,
            "--help" | "-h" => return Ok(None),
            _ => return Err(ArgsError::UnknownArg(sub)),
        };

        Ok(Some(Self { command, token }))
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let parsed = Args::parse(std::env::args().skip(1)).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;
    let Some(args) = parsed else {
        print_usage();
        return Ok(());
    };

    init_tracing();
    let services = AppServices::http_from_env(Clock::default())?;
    if let Some(token) = args.token {
        services.credentials().sign_in(token);
    }
    info!(command = ?args.command, "starting");

    match args.command {
        Command::Quiz { kind, name } => commands::quiz(&services, kind, &name).await,
        Command::Interview { role, clips } => commands::interview(&services, &role, clips).await,
        Command::Chat { query } => commands::chat(&services, query).await,
        Command::Report => commands::report(&services).await,
    }
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
