//! Quillgate command-line client.
//!
//! Thin front end over the library: each invocation builds the store,
//! the gateway, and the controller, restores the persisted session, and
//! runs exactly one operation. Passwords are always prompted, never
//! accepted as arguments.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use console::style;

use quillgate::config::ClientConfig;
use quillgate::gateway::HttpAuthGateway;
use quillgate::policy::{self, AccessRule, GuardDecision};
use quillgate::prefs::{Theme, ThemePreference};
use quillgate::session::{OpOutcome, SessionController};
use quillgate::store::{KeyValueStore, SqliteStore};

#[derive(Parser)]
#[command(name = "quillgate", version, about = "Quillgate blog client")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in with email and password.
    Login { email: String },
    /// Create an account and sign in.
    Signup { username: String, email: String },
    /// Sign out and clear the stored session.
    Logout,
    /// Show the current identity and what it can access.
    Status,
    /// Activate the subscription for the signed-in account.
    Subscribe,
    /// Re-fetch the subscription state from the backend.
    Refresh,
    /// Request a password-reset token.
    ForgotPassword { email: String },
    /// Consume a reset token and set a new password.
    ResetPassword { token: String },
    /// Show or change the display theme.
    Theme {
        #[command(subcommand)]
        action: ThemeAction,
    },
}

#[derive(Subcommand)]
enum ThemeAction {
    /// Print the current theme.
    Get,
    /// Set the theme to `dark` or `light`.
    Set { theme: String },
    /// Flip between dark and light.
    Toggle,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let config = ClientConfig::load();

    let store_path = config.store_path()?;
    let store: Arc<dyn KeyValueStore> = Arc::new(SqliteStore::open(&store_path)?);

    // Theme commands never need the backend.
    if let Command::Theme { action } = &cli.command {
        return run_theme(action, Arc::clone(&store));
    }

    let gateway = Arc::new(
        HttpAuthGateway::new(
            &config.api_base_url,
            Duration::from_secs(config.timeout_secs),
        )
        .context("building HTTP client")?,
    );
    let controller = SessionController::new(store, gateway);
    controller.restore();

    match cli.command {
        Command::Login { email } => {
            let password = prompt_password("Password")?;
            let outcome = controller.login(&email, &password).await;
            report(outcome, &format!("Signed in as {email}"))
        }
        Command::Signup { username, email } => {
            let password = prompt_password("Choose a password")?;
            let outcome = controller.signup(&username, &email, &password).await;
            report(outcome, &format!("Account created for {email}"))
        }
        Command::Logout => {
            let outcome = controller.logout().await;
            report(outcome, "Signed out")
        }
        Command::Status => {
            print_status(&controller);
            Ok(())
        }
        Command::Subscribe => {
            let outcome = controller.subscribe().await;
            report(outcome, "Subscription active")
        }
        Command::Refresh => {
            let outcome = controller.refresh_user().await;
            report(outcome, "Account refreshed")
        }
        Command::ForgotPassword { email } => {
            let outcome = controller.request_password_reset(&email).await;
            if !outcome.success {
                fail(outcome.message.as_deref().unwrap_or("Request failed"));
            }
            if let Some(message) = &outcome.message {
                println!("{message}");
            }
            if let Some(token) = &outcome.reset_token {
                println!("Reset token (valid for one hour, single use):");
                println!("  {}", style(token).bold());
            }
            Ok(())
        }
        Command::ResetPassword { token } => {
            let new_password = prompt_password("New password")?;
            let confirm_password = prompt_password("Confirm new password")?;
            let outcome = controller
                .reset_password(&token, &new_password, &confirm_password)
                .await;
            report(outcome, "Password updated. Sign in with the new password.")
        }
        Command::Theme { .. } => unreachable!("handled before gateway setup"),
    }
}

fn run_theme(action: &ThemeAction, store: Arc<dyn KeyValueStore>) -> anyhow::Result<()> {
    let prefs = ThemePreference::new(store);
    match action {
        ThemeAction::Get => println!("{}", prefs.current()),
        ThemeAction::Set { theme } => {
            let theme = Theme::parse(theme)
                .ok_or_else(|| anyhow::anyhow!("theme must be `dark` or `light`"))?;
            prefs.set(theme)?;
            println!("Theme set to {theme}");
        }
        ThemeAction::Toggle => {
            let theme = prefs.toggle()?;
            println!("Theme set to {theme}");
        }
    }
    Ok(())
}

fn prompt_password(prompt: &str) -> anyhow::Result<String> {
    Ok(dialoguer::Password::new()
        .with_prompt(prompt)
        .interact()
        .context("reading password")?)
}

fn print_status(controller: &SessionController) {
    match controller.current() {
        Some(session) => {
            let user = &session.user;
            println!(
                "Signed in as {} <{}> ({:?})",
                style(&user.username).bold(),
                user.email,
                user.role,
            );
            let caps = controller.capabilities();
            println!(
                "  subscription: {}",
                if caps.is_subscribed { "active" } else { "none" },
            );
            for (label, rule) in [
                ("premium content", AccessRule::SubscriberOnly),
                ("admin dashboard", AccessRule::AdminOnly),
            ] {
                match policy::evaluate(rule, caps) {
                    GuardDecision::Allow => println!("  {label}: {}", style("accessible").green()),
                    GuardDecision::Redirect(route) => {
                        println!("  {label}: redirects to {}", route.path());
                    }
                }
            }
        }
        None => println!("Not signed in."),
    }
}

/// Print the outcome of an operation and exit non-zero on failure.
fn report(outcome: OpOutcome, success_default: &str) -> anyhow::Result<()> {
    if outcome.success {
        println!(
            "{}",
            outcome.message.as_deref().unwrap_or(success_default),
        );
        Ok(())
    } else {
        fail(outcome.message.as_deref().unwrap_or("Operation failed"));
    }
}

fn fail(message: &str) -> ! {
    eprintln!("{}", style(message).red());
    std::process::exit(1);
}
