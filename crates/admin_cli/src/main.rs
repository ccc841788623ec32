use std::{error::Error, io::Write};

use clap::{Args, Parser, Subcommand, ValueEnum};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    style::Print,
    terminal,
    terminal::ClearType,
};
use engine::{Engine, EngineError, FundableKind};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "charity_fund_admin")]
#[command(about = "Admin utilities for the charity fund (users, allocation sweeps)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./charity_fund.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    User(User),
    /// Run one allocation sweep over every unsettled entity.
    Allocate,
    /// Settle an entity whose target already matches its allocated amount.
    Recalculate(RecalculateArgs),
}

#[derive(Args, Debug)]
struct User {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    Create(UserCreateArgs),
}

#[derive(Args, Debug)]
struct UserCreateArgs {
    #[arg(long)]
    username: String,
    /// Allow the user to manage funding requests.
    #[arg(long)]
    superuser: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Kind {
    FundingRequest,
    Contribution,
}

impl From<Kind> for FundableKind {
    fn from(value: Kind) -> Self {
        match value {
            Kind::FundingRequest => FundableKind::FundingRequest,
            Kind::Contribution => FundableKind::Contribution,
        }
    }
}

#[derive(Args, Debug)]
struct RecalculateArgs {
    #[arg(long, value_enum)]
    kind: Kind,
    #[arg(long)]
    id: Uuid,
}

struct RawModeGuard;

impl RawModeGuard {
    fn enter() -> Result<Self, Box<dyn Error + Send + Sync>> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

fn prompt_password(prompt: &str) -> Result<String, Box<dyn Error + Send + Sync>> {
    let _raw = RawModeGuard::enter()?;

    let mut out = std::io::stderr();
    execute!(
        out,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine),
        Print(prompt)
    )?;
    out.flush()?;

    let mut buf = String::new();
    loop {
        let Event::Key(KeyEvent {
            code, modifiers, ..
        }) = event::read()?
        else {
            continue;
        };

        match code {
            KeyCode::Enter => {
                execute!(out, Print("\r\n"))?;
                out.flush()?;
                break;
            }
            KeyCode::Backspace => {
                if buf.pop().is_some() {
                    execute!(out, cursor::MoveLeft(1), Print(" "), cursor::MoveLeft(1))?;
                    out.flush()?;
                }
            }
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                execute!(out, Print("\r\n"))?;
                out.flush()?;
                return Err("interrupted".into());
            }
            KeyCode::Char(ch) if !modifiers.contains(KeyModifiers::CONTROL) => {
                buf.push(ch);
                execute!(out, Print("*"))?;
                out.flush()?;
            }
            _ => {}
        }
    }

    Ok(buf)
}

fn prompt_password_twice() -> Result<String, Box<dyn Error + Send + Sync>> {
    let mut out = std::io::stderr();
    for _ in 0..3 {
        let p1 = prompt_password("Password: ")?;
        if p1.is_empty() {
            execute!(
                out,
                cursor::MoveToColumn(0),
                terminal::Clear(ClearType::CurrentLine),
                Print("Password must not be empty.\r\n")
            )?;
            continue;
        }

        let p2 = prompt_password("Confirm password: ")?;
        if p1 == p2 {
            return Ok(p1);
        }

        execute!(
            out,
            cursor::MoveToColumn(0),
            terminal::Clear(ClearType::CurrentLine),
            Print("Passwords do not match. Try again.\r\n")
        )?;
    }

    Err("too many attempts".into())
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder().database(db).build().await?;

    match cli.command {
        Command::User(User {
            command: UserCommand::Create(args),
        }) => {
            let password = prompt_password_twice()?;

            match engine
                .new_user(&args.username, &password, args.superuser)
                .await
            {
                Ok(user) if user.is_superuser => println!("created superuser: {}", user.username),
                Ok(user) => println!("created user: {}", user.username),
                Err(EngineError::ExistingKey(username)) => {
                    eprintln!("user already exists: {username}");
                    std::process::exit(1);
                }
                Err(err) => return Err(err.into()),
            }
        }
        Command::Allocate => {
            let outcome = engine.allocate().await?;
            for allocation in &outcome.allocations {
                println!(
                    "{} -> {}: {}",
                    allocation.contribution_id, allocation.request_id, allocation.amount
                );
            }
            println!(
                "moved {} in {} allocations ({} requests and {} contributions settled)",
                outcome.moved(),
                outcome.allocations.len(),
                outcome.settled_requests.len(),
                outcome.settled_contributions.len()
            );
        }
        Command::Recalculate(args) => {
            let kind = FundableKind::from(args.kind);
            if engine.recalculate(kind, args.id).await? {
                println!("{} {} settled", kind.as_str(), args.id);
            } else {
                println!("{} {} still open", kind.as_str(), args.id);
            }
        }
    }

    Ok(())
}
