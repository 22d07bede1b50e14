//! CLI command handlers.

use crate::auth::TokenState;
use crate::client::KrmPesanClient;
use crate::config::{ClientConfig, CredentialSource};

use super::{Cli, Commands};

/// Build a client from the environment and run one command.
pub async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = ClientConfig::from_env()?;
    if let Some(dir) = cli.token_dir {
        config.credentials = CredentialSource::TokenDirectory(dir);
    }
    let client = KrmPesanClient::new(config).await?;

    let response = match cli.command {
        Commands::Device => client.get_device().await?,
        Commands::Messages => client.get_messages().await?,
        Commands::SendText(args) => client.send_reply_text(&args.to, &args.text).await?,
        Commands::SendImage(args) => {
            client
                .send_reply_image(&args.to, &args.url, &args.caption)
                .await?
        }
        Commands::SendDocument(args) => client.send_reply_document(&args.to, &args.url).await?,
        Commands::Upload(args) => {
            println!("{}", client.upload(&args.path).await?);
            return Ok(());
        }
        Commands::Refresh => {
            client.refresh_token().await?;
            print_token(&client).await;
            return Ok(());
        }
        Commands::Token => {
            print_token(&client).await;
            return Ok(());
        }
    };

    let status = response.status();
    println!("{}", response.into_text());
    if !status.is_success() {
        return Err(format!("request failed with status {status}").into());
    }
    Ok(())
}

async fn print_token(client: &KrmPesanClient) {
    let credentials = client.credentials().await;
    let state = match client.token_state().await {
        TokenState::Valid => "valid",
        TokenState::Expired => "expired",
        TokenState::Refreshing => "refreshing",
        TokenState::Uninitialized => "uninitialized",
    };
    println!("device:  {}", credentials.device_id);
    println!("state:   {state}");
    match credentials.expired_at_string() {
        Some(expired_at) => println!("expires: {expired_at}"),
        None => println!("expires: unknown"),
    }
}
