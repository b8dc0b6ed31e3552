use clap::Parser;
use dotenv::dotenv;
use human_panic::setup_panic;
use std::process::ExitCode;
use tracing::{debug, warn};

use rust_assignment_store::backend::{NodePath, RemoteStore};
use rust_assignment_store::config::AppConfig;
use rust_assignment_store::errors::{Result, StoreError};
use rust_assignment_store::models::assignments::record;
use rust_assignment_store::models::{Assignment, Bucket};
use rust_assignment_store::runtime::lifetime::{self, startup::StartupContext};
use rust_assignment_store::services::{AssignmentBoard, IdentityProvider, StaticIdentity};
use rust_assignment_store::utils::{format_due_label, is_canonical_due_date};

mod args;

use args::{Cli, Commands};

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();
    setup_panic!();

    let cli = Cli::parse();

    // 初始化配置
    if let Err(e) = AppConfig::init() {
        eprintln!("Failed to initialize configuration: {e}");
        return ExitCode::FAILURE;
    }
    let config = AppConfig::get();

    // 初始化日志
    let (non_blocking_writer, _guard) = tracing_appender::non_blocking(std::io::stderr());
    let filter = tracing_subscriber::EnvFilter::new(&config.app.log_level);
    let tracing_format = tracing_subscriber::fmt::format()
        .with_level(true)
        .with_ansi(true);

    let tracing_builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking_writer)
        .event_format(tracing_format);

    if config.is_development() {
        tracing_builder
            .with_file(true)
            .with_line_number(true)
            .init();
    } else {
        tracing_builder.json().init();
    }

    debug!(
        "{} {} starting",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );

    let context = match lifetime::startup::prepare_startup(config).await {
        Ok(context) => context,
        Err(e) => {
            report(&e);
            return ExitCode::FAILURE;
        }
    };

    let identity = match cli.user.or_else(|| config.current_user_id()) {
        Some(user_id) => StaticIdentity::signed_in(user_id),
        None => StaticIdentity::signed_out(),
    };

    let outcome = tokio::select! {
        res = run(cli.command, context, identity) => res,
        _ = lifetime::shutdown::listen_for_shutdown() => {
            warn!(
                "Interrupted; the remote store may hold a partial result, run `reconcile` if needed"
            );
            return ExitCode::from(130);
        }
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report(&e);
            ExitCode::FAILURE
        }
    }
}

fn report(error: &StoreError) {
    #[cfg(debug_assertions)]
    eprintln!("{}", error.format_colored());
    #[cfg(not(debug_assertions))]
    eprintln!("{}", error.format_simple());
}

fn print_assignments(assignments: &[Assignment]) {
    if assignments.is_empty() {
        println!("No assignments.");
        return;
    }
    for assignment in assignments {
        println!(
            "{}  {}  [{}]  {}",
            format_due_label(&assignment.due_date),
            assignment.course,
            assignment.id,
            assignment.details
        );
    }
}

async fn run(command: Commands, context: StartupContext, identity: StaticIdentity) -> Result<()> {
    let store = context.store;

    match command {
        Commands::List => {
            let mut board = AssignmentBoard::new(store, identity);
            board.refresh().await?;
            let rows = board.rows();
            if rows.is_empty() {
                println!("No pending assignments.");
            }
            for (index, row) in rows.iter().enumerate() {
                println!(
                    "{:>3}. {}  {}  [{}]  {}",
                    index + 1,
                    row.due_label,
                    row.course,
                    row.id,
                    row.details
                );
            }
        }
        Commands::Completed => {
            let user = store.resolve_user(&identity)?;
            print_assignments(&store.load_bucket(&user, Bucket::Completed).await?);
        }
        Commands::Complete { id } => {
            let user = store.resolve_user(&identity)?;
            let done = store.complete(&user, &id).await?;
            println!("Completed {} ({})", done.course, done.id);
        }
        Commands::Delete { id, bucket } => {
            let user = store.resolve_user(&identity)?;
            store.delete(&user, &id, bucket).await?;
            println!("Deleted {id} from {bucket}");
        }
        Commands::Reconcile => {
            let user = store.resolve_user(&identity)?;
            let repaired = store.reconcile(&user).await?;
            println!("Removed {repaired} stale pending assignment(s)");
        }
        Commands::Add {
            course,
            due,
            details,
        } => {
            let user = store.resolve_user(&identity)?;
            if course.trim().is_empty() {
                return Err(StoreError::validation("course must not be empty"));
            }
            if !is_canonical_due_date(&due) {
                return Err(StoreError::validation(format!(
                    "due date '{due}' is not in YYYY-MM-DD form"
                )));
            }

            let assignment = Assignment {
                id: uuid::Uuid::new_v4().simple().to_string(),
                course,
                details,
                due_date: due,
                completed: false,
            };
            let path = NodePath::bucket(&user, Bucket::Current).child(&assignment.id);
            context
                .backend
                .set_record(&path, record::encode(&assignment, Bucket::Current))
                .await?;
            if context.backend.name() == "memory" {
                warn!("The memory backend does not persist across runs");
            }
            println!("Added {} ({})", assignment.course, assignment.id);
        }
    }

    Ok(())
}
