//! authgate - terminal front end for the authgate session core.
//!
//! Logs in against the configured auth API, keeps remembered tokens in the
//! durable store, and shows what the route guard would do for a path.

use std::io::{self, Write};

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use authgate_core::{Config, Credentials, ErrorRecord, Navigation, RouteGuard, SessionManager};

const USAGE: &str = "\
Usage: authgate <command>

Commands:
  login [--remember] [username]   Log in (prompts for the password)
  logout                          Log out and clear stored tokens
  status                          Rehydrate from storage and print the session
  whoami                          Print the logged-in user
  navigate <path>                 Show the guard decision for a path
  help                            Show this message

Environment:
  AUTHGATE_API_URL        Auth API base URL
  AUTHGATE_TIMEOUT_SECS   Request timeout in seconds
  RUST_LOG                Log filter (default: warn)";

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = args.first().map(String::as_str).unwrap_or("help");

    let mut config = Config::load()?;
    info!(api = %config.api_base_url, "authgate starting");

    match command {
        "login" => login(&mut config, &args[1..]).await,
        "logout" => logout(&config).await,
        "status" => status(&config).await,
        "whoami" => whoami(&config).await,
        "navigate" => match args.get(1) {
            Some(path) => navigate(&config, path).await,
            None => {
                eprintln!("{}", USAGE);
                std::process::exit(2);
            }
        },
        "help" | "--help" | "-h" => {
            println!("{}", USAGE);
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {}\n\n{}", other, USAGE);
            std::process::exit(2);
        }
    }
}

async fn login(config: &mut Config, args: &[String]) -> Result<()> {
    let remember = args.iter().any(|a| a == "--remember" || a == "-r");
    let username = match args.iter().find(|a| !a.starts_with('-')) {
        Some(name) => name.clone(),
        None => prompt_username(config.last_username.as_deref())?,
    };
    let password = rpassword::prompt_password("Password: ")?;

    let mut manager = SessionManager::from_config(config)?;
    let credentials = Credentials::new(username, password).remember(remember);

    match manager.login(&credentials).await {
        Ok(session) => {
            println!(
                "Logged in as {} (expires in {} min)",
                session.user.display(),
                session.minutes_until_expiry()
            );
            if !remember {
                println!("Session not remembered; it ends when this process exits. Use --remember to keep it.");
            }
            config.last_username = Some(credentials.normalized().username);
            config.save()?;
            Ok(())
        }
        Err(e) => fail(&e),
    }
}

async fn logout(config: &Config) -> Result<()> {
    let mut manager = SessionManager::from_config(config)?;
    // Let the server-side notification finish before the runtime shuts down
    if let Some(remote) = manager.logout() {
        let _ = remote.await;
    }
    println!("Logged out");
    Ok(())
}

async fn status(config: &Config) -> Result<()> {
    let mut manager = SessionManager::from_config(config)?;
    let mut guard = RouteGuard::default();

    if let Err(e) = guard.check_auth(&mut manager).await {
        if e.is_auth() {
            eprintln!("Stored session rejected: {}", e);
        } else {
            eprintln!("Could not verify stored session: {}", e);
        }
    }

    let snapshot = manager.state().snapshot();
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

async fn whoami(config: &Config) -> Result<()> {
    let mut manager = SessionManager::from_config(config)?;
    let mut guard = RouteGuard::default();

    match guard.check_auth(&mut manager).await {
        Ok(Some(session)) => {
            let user = &session.user;
            println!("{}", user.display());
            println!("  id:   {}", user.id);
            if let Some(role) = &user.role {
                println!("  role: {:?}", role);
            }
        }
        Ok(None) => println!("Not logged in"),
        Err(e) => println!("Not logged in ({})", e),
    }
    Ok(())
}

async fn navigate(config: &Config, path: &str) -> Result<()> {
    let mut manager = SessionManager::from_config(config)?;
    let mut guard = RouteGuard::default();

    match guard.navigate(&mut manager, path).await {
        Navigation::Allow => println!("allow {}", path),
        Navigation::Redirect(to) => println!("redirect {} -> {}", path, to),
    }
    Ok(())
}

fn prompt_username(last: Option<&str>) -> Result<String> {
    match last {
        Some(last) => print!("Username [{}]: ", last),
        None => print!("Username: "),
    }
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim();

    Ok(match (input.is_empty(), last) {
        (true, Some(last)) => last.to_string(),
        _ => input.to_string(),
    })
}

fn fail(error: &ErrorRecord) -> ! {
    eprintln!("Login failed: {}", error.message);
    std::process::exit(1);
}
