use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use etsy_core::CredentialConfig;
use etsy_mcp_runtime::{DEFAULT_API_BASE_URL, McpCommands, ServerConfig, run as run_mcp};

#[derive(Parser)]
#[command(
    name = "etsy-mcp",
    version,
    about = "Etsy MCP server: Etsy Open API v3 tools over stdio"
)]
struct Cli {
    /// Etsy API key (otherwise ETSY_API_KEY)
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Default shop id for shop-scoped tools (otherwise ETSY_SHOP_ID)
    #[arg(long, global = true)]
    shop_id: Option<String>,

    /// OAuth 2.0 access token enabling write tools (otherwise ETSY_ACCESS_TOKEN)
    #[arg(long, global = true)]
    access_token: Option<String>,

    /// Etsy API base URL
    #[arg(long, env = "ETSY_API_BASE_URL", default_value = DEFAULT_API_BASE_URL)]
    api_base_url: String,

    #[command(subcommand)]
    command: Option<McpCommands>,
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    // Structured JSON logging on stderr; stdout carries the protocol
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "etsy_mcp=info,etsy_mcp_runtime=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr),
        )
        .init();

    let cli = Cli::parse();
    let config = ServerConfig {
        credentials: CredentialConfig {
            api_key: cli.api_key,
            shop_id: cli.shop_id,
            access_token: cli.access_token,
        },
        api_base_url: cli.api_base_url,
    };

    let code = run_mcp(config, cli.command.unwrap_or_default()).await;
    std::process::exit(code);
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["etsy-mcp", "--api-key", "k"]).unwrap();
        assert_eq!(cli.command, None);
        assert_eq!(cli.api_key.as_deref(), Some("k"));
    }

    #[test]
    fn catalog_subcommand_accepts_global_flags() {
        let cli = Cli::try_parse_from(["etsy-mcp", "catalog", "--shop-id", "42"]).unwrap();
        assert_eq!(cli.command, Some(McpCommands::Catalog));
        assert_eq!(cli.shop_id.as_deref(), Some("42"));
    }
}
