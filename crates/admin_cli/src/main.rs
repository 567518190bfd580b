use std::{error::Error, io::Write};

use clap::{Args, Parser, Subcommand};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    style::Print,
    terminal::{self, ClearType},
};
use engine::{Engine, EngineError};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};

type CliResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

const MAX_PASSWORD_ATTEMPTS: usize = 3;

#[derive(Parser, Debug)]
#[command(name = "centavo_admin")]
#[command(about = "Admin utilities for Centavo (user management)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./centavo.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    User(User),
}

#[derive(Args, Debug)]
struct User {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    /// Create a user; the password is prompted twice.
    Create(UserCreateArgs),
    /// Delete a user together with every account, payment method, category
    /// and transaction they own.
    Delete(UserDeleteArgs),
}

#[derive(Args, Debug)]
struct UserCreateArgs {
    #[arg(long)]
    username: String,
}

#[derive(Args, Debug)]
struct UserDeleteArgs {
    #[arg(long)]
    username: String,
    /// Skip the confirmation prompt.
    #[arg(long)]
    yes: bool,
}

/// Puts the terminal in raw mode until dropped.
struct RawModeGuard;

impl RawModeGuard {
    fn enter() -> CliResult<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

/// Prints `message` on a fresh line of stderr.
fn say(message: &str) -> CliResult<()> {
    let mut out = std::io::stderr();
    execute!(
        out,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine),
        Print(message),
        Print("\r\n")
    )?;
    Ok(())
}

/// Reads one line from the terminal. With `mask`, typed characters are
/// echoed as `*`.
fn read_line(prompt: &str, mask: bool) -> CliResult<String> {
    let _raw = RawModeGuard::enter()?;

    let mut out = std::io::stderr();
    execute!(
        out,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine),
        Print(prompt)
    )?;
    out.flush()?;

    let mut line = String::new();
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
                break;
            }
            KeyCode::Backspace if line.pop().is_some() => {
                execute!(out, cursor::MoveLeft(1), Print(" "), cursor::MoveLeft(1))?;
            }
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                execute!(out, Print("\r\n"))?;
                return Err("interrupted".into());
            }
            KeyCode::Char(ch) if !modifiers.contains(KeyModifiers::CONTROL) => {
                line.push(ch);
                if mask {
                    execute!(out, Print("*"))?;
                } else {
                    execute!(out, Print(ch))?;
                }
            }
            _ => {}
        }
        out.flush()?;
    }

    Ok(line)
}

fn prompt_new_password() -> CliResult<String> {
    for _ in 0..MAX_PASSWORD_ATTEMPTS {
        let password = read_line("Password: ", true)?;
        if password.is_empty() {
            say("Password must not be empty.")?;
            continue;
        }
        if read_line("Confirm password: ", true)? == password {
            return Ok(password);
        }
        say("Passwords do not match. Try again.")?;
    }

    Err("too many attempts".into())
}

fn confirm(question: &str) -> CliResult<bool> {
    let answer = read_line(&format!("{question} [y/N] "), false)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

async fn connect_db(database_url: &str) -> CliResult<DatabaseConnection> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

async fn create_user(engine: &Engine, args: UserCreateArgs) -> CliResult<()> {
    let password = prompt_new_password()?;
    match engine.create_user(&args.username, &password).await {
        Ok(()) => {
            println!("created user: {}", args.username);
            Ok(())
        }
        Err(EngineError::ExistingKey(_)) => {
            eprintln!("user already exists: {}", args.username);
            std::process::exit(1);
        }
        Err(err) => Err(err.into()),
    }
}

async fn delete_user(engine: &Engine, args: UserDeleteArgs) -> CliResult<()> {
    if !args.yes
        && !confirm(&format!(
            "Delete {} and all of their data? This cannot be undone.",
            args.username
        ))?
    {
        eprintln!("aborted");
        return Ok(());
    }

    match engine.delete_user(&args.username).await {
        Ok(()) => {
            println!("deleted user: {}", args.username);
            Ok(())
        }
        Err(EngineError::KeyNotFound(_)) => {
            eprintln!("user not found: {}", args.username);
            std::process::exit(1);
        }
        Err(err) => Err(err.into()),
    }
}

#[tokio::main]
async fn main() -> CliResult<()> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder().database(db).build().await?;

    match cli.command {
        Command::User(User { command }) => match command {
            UserCommand::Create(args) => create_user(&engine, args).await?,
            UserCommand::Delete(args) => delete_user(&engine, args).await?,
        },
    }

    Ok(())
}
