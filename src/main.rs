use clap::{Parser, Subcommand};

use hublex::{build_remote_state, server};
use hublex_core::config::Config;
use hublex_core::types::ObjectType;

#[derive(Parser)]
#[command(name = "hublex", about = "Natural-language search middleware over a CRM")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server.
    Serve {
        /// Listen address, overriding the configured one.
        #[arg(long)]
        addr: Option<String>,
    },
    /// Re-export the encyclopedia from the live remote schema.
    Refresh {
        /// Restrict to one object type (companies, contacts, deals, tickets).
        #[arg(long)]
        object_type: Option<String>,
    },
    /// Resolve a query and run the search once, printing the outcome as JSON.
    Search {
        object_type: String,
        query: String,
        #[arg(long)]
        limit: Option<usize>,
        /// Use the group-scoped hierarchical resolver.
        #[arg(long)]
        hierarchical: bool,
        /// Caller email for "my name" style queries.
        #[arg(long)]
        user_email: Option<String>,
    },
}

fn parse_object_type(raw: &str) -> anyhow::Result<ObjectType> {
    ObjectType::parse(raw).ok_or_else(|| {
        anyhow::anyhow!("invalid object type '{raw}', expected companies|contacts|deals|tickets")
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("RUST_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Command::Serve { addr } => {
            let state = build_remote_state(&config)?;
            let addr = addr.unwrap_or_else(|| config.server.addr.clone());
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!(%addr, "hublex listening");
            axum::serve(listener, server::router(state)).await?;
        }
        Command::Refresh { object_type } => {
            let object_type = object_type.as_deref().map(parse_object_type).transpose()?;
            let state = build_remote_state(&config)?;
            let refreshed = state.exporter.refresh(object_type).await;
            for (ot, encyclopedia) in &refreshed {
                println!(
                    "{ot}: {} properties, {} values",
                    encyclopedia.property_mappings.len(),
                    encyclopedia.total_values()
                );
                state.resolver.install(*ot, encyclopedia.clone());
            }
        }
        Command::Search {
            object_type,
            query,
            limit,
            hierarchical,
            user_email,
        } => {
            let object_type = parse_object_type(&object_type)?;
            let state = build_remote_state(&config)?;
            let limit = limit.unwrap_or(config.search.default_limit);
            let resolved = if hierarchical {
                state
                    .hierarchical
                    .resolve_and_search(object_type, &query, limit, user_email.as_deref())
                    .await
            } else {
                state
                    .resolver
                    .resolve_and_search(object_type, &query, limit, user_email.as_deref())
                    .await
            };
            println!("{}", serde_json::to_string_pretty(&resolved)?);
        }
    }

    Ok(())
}
