use std::error::Error;

use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use engine::{Amount, Engine, Role, format_percent_bp};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};

#[derive(Parser, Debug)]
#[command(name = "obolo_admin")]
#[command(about = "Admin utilities for Obolo (users, campaigns, donations, reports)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./obolo.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    User(User),
    Campaign(Campaign),
    /// Record a wallet-funded donation.
    Donate(DonateArgs),
    /// Show a single donation by id.
    Donation(DonationArgs),
    /// Recompute campaign totals from the donation ledger.
    Reconcile,
}

#[derive(Args, Debug)]
struct User {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    Create(UserCreateArgs),
    /// Credit a user's wallet.
    Topup(TopupArgs),
    /// Print a user's wallet balance.
    Balance(UserIdArgs),
    /// Print lifetime giving totals and full history.
    Report(UserIdArgs),
}

#[derive(Args, Debug)]
struct UserCreateArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    /// `user` or `admin`.
    #[arg(long, default_value = "user")]
    role: String,
}

#[derive(Args, Debug)]
struct TopupArgs {
    #[arg(long)]
    user: String,
    /// Amount in major units, e.g. `25.00`.
    #[arg(long)]
    amount: Amount,
}

#[derive(Args, Debug)]
struct UserIdArgs {
    #[arg(long)]
    user: String,
}

#[derive(Args, Debug)]
struct Campaign {
    #[command(subcommand)]
    command: CampaignCommand,
}

#[derive(Subcommand, Debug)]
enum CampaignCommand {
    Create(CampaignCreateArgs),
    /// Cancel an active campaign (admins only).
    Cancel(CampaignCancelArgs),
    /// List campaigns still accepting donations today.
    List,
    /// Print a campaign's progress, donor count, and donation highlights.
    Report(CampaignIdArgs),
}

#[derive(Args, Debug)]
struct CampaignCreateArgs {
    #[arg(long)]
    title: String,
    #[arg(long)]
    description: String,
    /// Goal in major units, e.g. `500.00`.
    #[arg(long)]
    goal: Amount,
    #[arg(long)]
    start: NaiveDate,
    #[arg(long)]
    end: NaiveDate,
    /// Id of the creating user.
    #[arg(long)]
    creator: String,
}

#[derive(Args, Debug)]
struct CampaignCancelArgs {
    #[arg(long)]
    campaign: String,
    /// Id of the admin performing the cancellation.
    #[arg(long)]
    admin: String,
}

#[derive(Args, Debug)]
struct CampaignIdArgs {
    #[arg(long)]
    campaign: String,
}

#[derive(Args, Debug)]
struct DonationArgs {
    #[arg(long)]
    id: String,
}

#[derive(Args, Debug)]
struct DonateArgs {
    #[arg(long)]
    user: String,
    #[arg(long)]
    campaign: String,
    /// Amount in major units, e.g. `5.00`.
    #[arg(long)]
    amount: Amount,
    #[arg(long)]
    payment_mode: Option<String>,
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    tracing::info!("database ready at {database_url}");
    Ok(db)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "obolo_admin=info,engine=info".to_string()),
        )
        .init();

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder().database(db).build().await?;

    match cli.command {
        Command::User(User {
            command: UserCommand::Create(args),
        }) => {
            let role = match Role::try_from(args.role.as_str()) {
                Ok(role) => role,
                Err(err) => {
                    eprintln!("{err}");
                    std::process::exit(2);
                }
            };
            let user = engine.register_user(&args.name, &args.email, role).await?;
            println!("created user: {} ({})", user.name, user.id);
        }
        Command::User(User {
            command: UserCommand::Topup(args),
        }) => {
            let balance = engine.add_to_wallet(&args.user, args.amount).await?;
            println!("new balance: {balance}");
        }
        Command::User(User {
            command: UserCommand::Balance(args),
        }) => {
            let balance = engine.wallet_balance(&args.user).await?;
            println!("{balance}");
        }
        Command::User(User {
            command: UserCommand::Report(args),
        }) => {
            let report = engine.user_report(&args.user).await?;
            println!(
                "{} donated {} across {} donations",
                report.user.name, report.total_donated, report.total_donations
            );
            for view in &report.history {
                println!(
                    "  {}  {}  {}  [{}]  {}",
                    view.donation.donated_at.format("%Y-%m-%d %H:%M:%S"),
                    view.donation.amount,
                    view.campaign_title,
                    view.donation.status.as_str(),
                    view.donation.transaction_ref,
                );
            }
        }
        Command::Campaign(Campaign {
            command: CampaignCommand::Create(args),
        }) => {
            let campaign = engine
                .new_campaign(
                    &args.title,
                    &args.description,
                    args.goal,
                    args.start,
                    args.end,
                    &args.creator,
                )
                .await?;
            println!("created campaign: {} ({})", campaign.title, campaign.id);
        }
        Command::Campaign(Campaign {
            command: CampaignCommand::Cancel(args),
        }) => {
            engine.cancel_campaign(&args.campaign, &args.admin).await?;
            println!("cancelled campaign: {}", args.campaign);
        }
        Command::Campaign(Campaign {
            command: CampaignCommand::List,
        }) => {
            let today = Utc::now().date_naive();
            for campaign in engine.list_open_campaigns(today).await? {
                println!(
                    "{}  {}  {} / {} (ends {})",
                    campaign.id, campaign.title, campaign.raised, campaign.goal, campaign.end_date
                );
            }
        }
        Command::Campaign(Campaign {
            command: CampaignCommand::Report(args),
        }) => {
            let report = engine.campaign_report(&args.campaign).await?;
            println!(
                "{}: {} / {} ({}), {} donors, status {}",
                report.campaign.title,
                report.campaign.raised,
                report.campaign.goal,
                format_percent_bp(report.progress_bp),
                report.total_donors,
                report.campaign.status.as_str(),
            );
            println!("top donations:");
            for view in &report.top_donations {
                println!("  {}  {}", view.donation.amount, view.donor_name);
            }
            println!("recent donations:");
            for view in &report.recent_donations {
                println!(
                    "  {}  {}  {}",
                    view.donation.donated_at.format("%Y-%m-%d %H:%M:%S"),
                    view.donation.amount,
                    view.donor_name,
                );
            }
        }
        Command::Donate(args) => {
            let donation = engine
                .make_donation(
                    &args.user,
                    &args.campaign,
                    args.amount,
                    args.payment_mode.as_deref(),
                    Utc::now(),
                )
                .await?;
            println!(
                "recorded donation {} ({})",
                donation.transaction_ref, donation.id
            );
        }
        Command::Donation(args) => {
            let donation = engine.donation(&args.id).await?;
            println!(
                "{}  {}  user {}  campaign {}  [{}]  {}",
                donation.donated_at.format("%Y-%m-%d %H:%M:%S"),
                donation.amount,
                donation.user_id,
                donation.campaign_id,
                donation.status.as_str(),
                donation.transaction_ref,
            );
        }
        Command::Reconcile => {
            let corrected = engine.reconcile_campaigns().await?;
            println!("corrected {corrected} campaigns");
        }
    }

    Ok(())
}
