//! TonTin command line client
//!
//! Main application entry point

use anyhow::{bail, Context};
use futures::StreamExt;
use tracing::{error, info, warn};

use tontin_client::{
    config::Settings,
    models::{DarPagination, NotificationFilter},
    services::ServiceFactory,
    state::{SessionStore, Teardown},
    utils::{helpers::format_amount, logging},
};

/// Commands understood by the binary
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Login { identifier: String, password: String },
    Logout,
    Dars,
    Rounds { dar_id: String },
    Notifications,
    Watch,
    Help,
}

impl Command {
    fn parse(args: &[String]) -> anyhow::Result<Self> {
        let command = match args.first().map(String::as_str) {
            Some("login") => match (args.get(1), args.get(2)) {
                (Some(identifier), Some(password)) => Command::Login {
                    identifier: identifier.clone(),
                    password: password.clone(),
                },
                _ => bail!("usage: tontin login <email-or-username> <password>"),
            },
            Some("logout") => Command::Logout,
            Some("dars") => Command::Dars,
            Some("rounds") => match args.get(1) {
                Some(dar_id) => Command::Rounds { dar_id: dar_id.clone() },
                None => bail!("usage: tontin rounds <dar-id>"),
            },
            Some("notifications") => Command::Notifications,
            Some("watch") => Command::Watch,
            Some("help") | None => Command::Help,
            Some(other) => bail!("unknown command: {}", other),
        };
        Ok(command)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::new().context("failed to load configuration")?;
    settings.validate()?;

    // Initialize logging; the guard keeps the file writer alive
    let _log_guard = logging::init_logging(&settings.logging)?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = Command::parse(&args)?;

    let session = SessionStore::from_config(&settings.auth).await?;
    let services = ServiceFactory::new(settings, session)?;

    if let Err(e) = run(command, &services).await {
        error!(error = %e, "Command failed");
        return Err(e);
    }
    Ok(())
}

async fn run(command: Command, services: &ServiceFactory) -> anyhow::Result<()> {
    match command {
        Command::Login { identifier, password } => {
            let outcome = services.auth_service.login(&identifier, &password).await?;
            let name = outcome.user.as_ref().map(|u| u.user_name.as_str()).unwrap_or("unknown user");
            println!("Signed in as {} (session valid until {})", name, outcome.expires_at);
            println!("Next: {}", outcome.navigation.to_url());
        }
        Command::Logout => {
            services.sign_out().await?;
            println!("Signed out");
        }
        Command::Dars => {
            require_session(services)?;
            let page = services
                .dar_service
                .get_my_dars(0, DarPagination::DEFAULT_PAGE_SIZE, None)
                .await?;
            for dar in &page.content {
                println!(
                    "{:>6}  {:<30} {:<10} {:>3}/{:<3} {}",
                    dar.id,
                    dar.name,
                    dar.status.label(),
                    dar.current_cycle,
                    dar.total_cycles,
                    format_amount(dar.monthly_contribution)
                );
            }
            println!("{}", page.item_range());
        }
        Command::Rounds { dar_id } => {
            require_session(services)?;
            let rounds = services.round_service.get_rounds_by_dar(&dar_id).await?;
            for round in &rounds {
                println!(
                    "#{:<3} {:<7} {:>12}  {}",
                    round.number,
                    round.status.label(),
                    format_amount(round.amount),
                    round.recipient_member_name.as_deref().unwrap_or("-")
                );
            }
        }
        Command::Notifications => {
            require_session(services)?;
            let notifications = &services.notification_service;
            let page = notifications
                .get_notifications(0, notifications.page_size(), &NotificationFilter::default())
                .await?;
            let unread = notifications.get_unread_count().await?;
            for item in &page.content {
                let marker = if item.is_read { " " } else { "*" };
                println!("{} [{}] {}: {}", marker, item.kind.as_str(), item.title, item.message);
            }
            println!("{} unread", unread);
        }
        Command::Watch => {
            require_session(services)?;
            let teardown = Teardown::new();
            let mut counts = Box::pin(services.notification_service.unread_count_stream(teardown.signal()));
            info!("Watching unread notifications, press Ctrl-C to stop");

            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        teardown.fire();
                        break;
                    }
                    next = counts.next() => match next {
                        Some(count) => println!("{} unread", count),
                        None => break,
                    }
                }
            }
        }
        Command::Help => {
            println!("{}", tontin_client::info());
            println!("commands: login <id> <password> | logout | dars | rounds <dar-id> | notifications | watch");
        }
    }
    Ok(())
}

fn require_session(services: &ServiceFactory) -> anyhow::Result<()> {
    if !services.auth_service.is_authenticated() {
        warn!("No valid session");
        bail!("not signed in, run `tontin login` first");
    }
    Ok(())
}
