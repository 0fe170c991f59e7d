use clap::Subcommand;
use serde_json::json;

use crate::api::auth;
use crate::cli::output::{output_error, output_success};
use crate::cli::OutputFormat;
use crate::client::ApiClient;
use crate::error::ClientError;

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Login to the platform")]
    Login {
        #[arg(help = "Username")]
        username: String,
        #[arg(long, help = "Password (will prompt if not provided)")]
        password: Option<String>,
    },

    #[command(about = "Logout and discard the stored session token")]
    Logout,

    #[command(about = "Show current authentication status")]
    Status,

    #[command(about = "Show the identity in the stored session token")]
    Whoami,

    #[command(about = "Register a new account")]
    Register {
        #[arg(help = "Username")]
        username: String,
        #[arg(help = "Email")]
        email: String,
        #[arg(long, help = "Password (will prompt if not provided)")]
        password: Option<String>,
        #[arg(long, default_value = "", help = "Invitation code")]
        code: String,
    },
}

pub async fn handle(
    client: &ApiClient,
    cmd: AuthCommands,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    match cmd {
        AuthCommands::Login { username, password } => {
            let password = resolve_password(password)?;
            match auth::login(client, &username, &password).await {
                Ok(_) => output_success(
                    &output_format,
                    &format!("Logged in as '{}'", username),
                    None,
                ),
                Err(err) => report_api_error(&output_format, &err),
            }
        }
        AuthCommands::Logout => {
            auth::logout(client);
            output_success(&output_format, "Logged out", None)
        }
        AuthCommands::Status => {
            let session = client.session();
            match session.claims() {
                Some(claims) => {
                    let expires = claims
                        .expires_at()
                        .map(|t| t.to_rfc3339())
                        .unwrap_or_else(|| "unknown".to_string());
                    output_success(
                        &output_format,
                        "Session token present",
                        Some(json!({
                            "user": claims.display_name(),
                            "privileges": claims.privilege_level(),
                            "expires_at": expires,
                        })),
                    )
                }
                None if session.get().is_some() => {
                    output_error(&output_format, "Stored token is not decodable")
                }
                None => output_error(&output_format, "Not logged in"),
            }
        }
        AuthCommands::Whoami => match client.session().claims() {
            Some(claims) => output_success(
                &output_format,
                claims.display_name().unwrap_or("unknown user"),
                Some(json!({
                    "uid": claims.uid,
                    "username": claims.username,
                    "privileges": claims.privilege_level(),
                })),
            ),
            None => output_error(&output_format, "Not logged in"),
        },
        AuthCommands::Register {
            username,
            email,
            password,
            code,
        } => {
            let password = resolve_password(password)?;
            let request = auth::RegisterRequest {
                username: username.clone(),
                password,
                email,
                code,
            };
            match auth::register(client, &request).await {
                Ok(()) => output_success(
                    &output_format,
                    &format!("Registered user '{}'", username),
                    None,
                ),
                Err(err) => report_api_error(&output_format, &err),
            }
        }
    }
}

fn resolve_password(password: Option<String>) -> anyhow::Result<String> {
    match password {
        Some(password) => Ok(password),
        None => Ok(rpassword::prompt_password("Password: ")?),
    }
}

fn report_api_error(output_format: &OutputFormat, err: &ClientError) -> anyhow::Result<()> {
    // Prefer the mapped user-facing message when the backend error is a
    // well-known one.
    let message = err
        .known_error()
        .map(|known| known.user_message().to_string())
        .or_else(|| err.api_error_message())
        .unwrap_or_else(|| err.to_string());
    output_error(output_format, &message)
}
