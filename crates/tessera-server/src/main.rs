//! Tessera - grid topology discovery and command routing

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::sync::Arc;
use tessera_core::Address;
use tessera_server::api::{self, AppState};
use tessera_server::network::{candidates, router, FormationController, GridConfig, HttpTransport, Prober};
use tessera_server::observability::{self, TracingConfig};
use tessera_server::version;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "tessera")]
#[command(about = "Topology discovery and command routing for actuator module grids")]
#[command(version = version::VERSION, long_version = version::LONG_VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the control API.
    Serve {
        /// Listen address
        #[arg(long, env = "BIND_ADDR")]
        bind: Option<String>,
        /// Run a formation pass as soon as the server starts
        #[arg(long, env = "TESSERA_FORM_ON_START")]
        form_on_start: bool,
    },

    /// Scan once and print the discovered devices.
    Scan,

    /// Run one formation pass and print the topology.
    Form,

    /// Run a formation pass and print the routing decision for an address.
    Route {
        address: Address,
    },

    /// Run a formation pass and send a height command to one module.
    SetHeight {
        address: Address,
        height: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    observability::init_tracing(TracingConfig::from_env())
        .map_err(|e| anyhow::anyhow!(e))
        .context("failed to initialize tracing")?;

    let config = GridConfig::from_env();
    let result = match cli.command {
        Commands::Serve {
            bind,
            form_on_start,
        } => serve(config, bind, form_on_start).await,
        Commands::Scan => {
            let registry = controller(config)?.scan().await?;
            print_json(&registry.devices())
        }
        Commands::Form => {
            let topology = controller(config)?.run().await?;
            print_json(&topology)
        }
        Commands::Route { address } => {
            let topology = controller(config)?.run().await?;
            print_json(&topology.decide(address))
        }
        Commands::SetHeight { address, height } => {
            let mut controller = controller(config)?;
            let topology = controller.run().await?;
            let outcome = router::set_height(controller.prober(), &topology, address, height)
                .await
                .with_context(|| format!("failed to set height of module {address}"))?;
            print_json(&outcome)
        }
    };

    observability::shutdown_tracing();
    result
}

fn prober(config: &GridConfig) -> Result<Prober> {
    let transport = HttpTransport::new().context("failed to build HTTP client")?;
    Ok(Prober::new(Arc::new(transport), config))
}

fn controller(config: GridConfig) -> Result<FormationController> {
    let prober = prober(&config)?;
    let source = candidates::from_config(&config.candidates);
    Ok(FormationController::new(config, prober, source))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn serve(mut config: GridConfig, bind: Option<String>, form_on_start: bool) -> Result<()> {
    info!("Starting Tessera Server...");
    info!("{}", version::build_info());

    if let Some(bind) = bind {
        config.bind_addr = bind;
    }
    let bind_addr = config.bind_addr.clone();

    info!(
        grid_capacity = config.grid_capacity,
        root_address = config.root_address,
        island_policy = %config.island_policy,
        default_endpoint = %config.default_endpoint,
        "Grid configuration loaded"
    );

    let metrics_state = match observability::init_metrics() {
        Ok(state) => Some(state),
        Err(e) => {
            warn!(error = %e, "Failed to initialize metrics, /metrics will be unavailable");
            None
        }
    };

    let prober = prober(&config)?;
    let source = candidates::from_config(&config.candidates);
    let state = AppState::new(config, prober, source, metrics_state);

    if form_on_start {
        let state = state.clone();
        tokio::spawn(async move {
            match state.form().await {
                Ok(topology) => info!(
                    islands = topology.islands.len(),
                    devices = topology.registry.len(),
                    "Initial formation published"
                ),
                Err(e) => warn!(error = %e, "Initial formation failed"),
            }
        });
    }

    let app = api::create_router(state);

    info!("Starting API server on {}", bind_addr);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await?;

    Ok(())
}
