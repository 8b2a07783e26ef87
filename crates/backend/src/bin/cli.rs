use anyhow::{bail, Context};
use chrono::{TimeZone, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use dashboard_backend::auth::{
    types::SESSION_TTL_SECS, AllowList, Identity, SessionSigner, Verification,
};
use reqwest::Client;
use shared_types::{MeResponse, SessionStatus};

const MAX_TTL_SECS: i64 = 10 * 365 * 86_400;

#[derive(Parser)]
#[command(name = "dashboard-cli")]
#[command(about = "Operator tools for the traffic dashboard backend")]
#[command(
    long_about = "A command-line companion to the dashboard backend.\n\n\
    Mints and inspects session credentials offline, checks emails against the\n\
    allow-list, and fetches data endpoints from a running server."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mint or inspect session credentials
    Token {
        /// Secret used to sign credentials. Must match the server's.
        #[arg(long, env = "SESSION_SECRET", hide_env_values = true)]
        secret: String,

        #[command(subcommand)]
        action: TokenAction,
    },

    /// Check whether an email would be allowed to log in
    AllowCheck {
        /// The email address to check (case-insensitive).
        email: String,

        /// Comma-separated allow-list, as in the server's configuration.
        #[arg(long, env = "ALLOWED_EMAILS")]
        allowed_emails: String,
    },

    /// Fetch a data endpoint from a running server
    ///
    /// Authenticates with the end-to-end test header, so the server must have
    /// E2E_TEST_TOKEN configured.
    Fetch {
        /// Which endpoint to fetch.
        #[arg(value_enum)]
        endpoint: Endpoint,

        /// Backend server URL to connect to.
        #[arg(
            short,
            long,
            default_value = "http://localhost:3000",
            env = "DASHBOARD_API_URL"
        )]
        base_url: String,

        /// Value for the X-Test-Token header.
        #[arg(long, env = "E2E_TEST_TOKEN", hide_env_values = true)]
        test_token: String,
    },

    /// Ask a running server whether a credential is accepted
    ///
    /// Calls /api/auth/me with the credential as the session cookie.
    Whoami {
        /// The session credential to present.
        token: String,

        /// Backend server URL to connect to.
        #[arg(
            short,
            long,
            default_value = "http://localhost:3000",
            env = "DASHBOARD_API_URL"
        )]
        base_url: String,
    },
}

#[derive(Subcommand)]
enum TokenAction {
    /// Mint a session credential for an email
    ///
    /// The credential can be set as the auth_session cookie to reach the
    /// dashboard without going through Google.
    Issue {
        /// Email to put in the credential. Lowercased before signing.
        #[arg(short, long)]
        email: String,

        /// Display name.
        #[arg(short, long)]
        name: Option<String>,

        /// Avatar URL.
        #[arg(short, long, value_name = "URL")]
        picture: Option<String>,

        /// Lifetime in seconds (at most ten years).
        #[arg(
            long,
            default_value_t = SESSION_TTL_SECS,
            value_parser = clap::value_parser!(i64).range(1..=MAX_TTL_SECS)
        )]
        ttl_secs: i64,
    },

    /// Verify a credential and print its claims or why it was rejected
    Inspect {
        /// The credential to verify.
        token: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Endpoint {
    Revenue,
    Rd,
    AgentNiche,
    SyncLog,
    SyncStatus,
}

impl Endpoint {
    fn path(self) -> &'static str {
        match self {
            Endpoint::Revenue => "/api/data/revenue",
            Endpoint::Rd => "/api/data/rd",
            Endpoint::AgentNiche => "/api/data/agent-niche",
            Endpoint::SyncLog => "/api/data/sync-log",
            Endpoint::SyncStatus => "/api/data/sync-status",
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Commands::Token { secret, action } => handle_token(&secret, action)?,
        Commands::AllowCheck {
            email,
            allowed_emails,
        } => {
            let list = AllowList::parse(&allowed_emails);
            if list.is_allowed(&email) {
                println!("{} is allowed", email.to_lowercase());
            } else {
                bail!("{} is not on the allow-list", email.to_lowercase());
            }
        }
        Commands::Fetch {
            endpoint,
            base_url,
            test_token,
        } => fetch(&Client::new(), &base_url, endpoint, &test_token).await?,
        Commands::Whoami { token, base_url } => whoami(&Client::new(), &base_url, &token).await?,
    }

    Ok(())
}

fn handle_token(secret: &str, action: TokenAction) -> anyhow::Result<()> {
    if secret.is_empty() {
        bail!("SESSION_SECRET must not be empty");
    }

    match action {
        TokenAction::Issue {
            email,
            name,
            picture,
            ttl_secs,
        } => {
            let signer = SessionSigner::new(secret, ttl_secs);
            let token = signer
                .issue(
                    &Identity {
                        email,
                        name,
                        picture,
                    },
                    Utc::now(),
                )
                .context("Failed to sign credential")?;
            println!("{}", token);
        }
        TokenAction::Inspect { token } => {
            let signer = SessionSigner::new(secret, SESSION_TTL_SECS);
            match signer.verify(token.trim(), Utc::now()) {
                Verification::Accepted(claims) => {
                    println!("{}", serde_json::to_string_pretty(&claims)?);
                    if let Some(expires) = claims
                        .expires_at
                        .and_then(|exp| Utc.timestamp_opt(exp, 0).single())
                    {
                        println!("Expires: {}", expires.to_rfc3339());
                    }
                }
                Verification::Rejected(reason) => bail!("Rejected: {}", reason),
            }
        }
    }

    Ok(())
}

async fn fetch(
    client: &Client,
    base_url: &str,
    endpoint: Endpoint,
    test_token: &str,
) -> anyhow::Result<()> {
    let url = format!("{}{}", base_url.trim_end_matches('/'), endpoint.path());
    let response = client
        .get(&url)
        .header("X-Test-Token", test_token)
        .send()
        .await
        .with_context(|| format!("GET {} failed", url))?;

    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        bail!("GET {} returned {}: {}", url, status, body);
    }

    print!("{}", body);
    Ok(())
}

async fn whoami(client: &Client, base_url: &str, token: &str) -> anyhow::Result<()> {
    let base_url = base_url.trim_end_matches('/');
    let cookie = format!("auth_session={}", token.trim());

    let status: SessionStatus = client
        .get(format!("{}/api/auth/check", base_url))
        .header("Cookie", &cookie)
        .send()
        .await?
        .json()
        .await?;
    if !status.authenticated {
        bail!("Server rejected the credential");
    }

    let me: MeResponse = client
        .get(format!("{}/api/auth/me", base_url))
        .header("Cookie", &cookie)
        .send()
        .await?
        .json()
        .await?;
    println!(
        "Authenticated as {} ({})",
        me.email.unwrap_or_default(),
        me.name.as_deref().unwrap_or("no name")
    );

    Ok(())
}
