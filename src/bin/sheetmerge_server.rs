//! sheetmerge API Server binary

use clap::Parser;
use sheetmerge::api::{run_api_server, ApiConfig};
use sheetmerge::config::Config;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "sheetmerge-server")]
#[command(version)]
#[command(about = "sheetmerge API Server - HTTP REST API for workbook consolidation")]
#[command(long_about = r#"
sheetmerge API Server - HTTP REST API

Provides RESTful endpoints for all sheetmerge operations:
  - POST /api/v1/consolidate - Combine sheets and attach ordered quantities
  - POST /api/v1/split       - One workbook per vendor from a PO list
  - POST /api/v1/columns     - PO list header columns

Additional endpoints:
  - GET  /health             - Health check
  - GET  /version            - Server version info
  - GET  /                   - API documentation

Paths in requests are resolved on the server's filesystem.

Example usage:
  sheetmerge-server                           # Start on localhost:8080
  sheetmerge-server --host 0.0.0.0 --port 3000

  curl -X POST http://localhost:8080/api/v1/consolidate \
    -H "Content-Type: application/json" \
    -d '{"main_file": "plan.xlsx", "order_file": "orders.xlsx"}'
"#)]
struct Args {
    /// Host address to bind to (use 0.0.0.0 for all interfaces)
    #[arg(short = 'H', long, default_value = "127.0.0.1", env = "SHEETMERGE_HOST")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "8080", env = "SHEETMERGE_PORT")]
    port: u16,

    /// YAML configuration applied to every request
    #[arg(short, long, env = "SHEETMERGE_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let run_config = Config::load_or_default(args.config.as_deref())?;

    let config = ApiConfig {
        host: args.host,
        port: args.port,
    };

    run_api_server(config, run_config).await
}
