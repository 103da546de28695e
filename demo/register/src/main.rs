// Register Demo - Sends one boleto request file through the adapter registry
//
// Usage: register-boleto <request.json>
// MOCK_BANKS=1 plus BOLETO_GATEWAY_URLS__* point the adapters at sandboxes.

use anyhow::{anyhow, bail, Context, Result};
use boleto_adapters::telemetry::init_tracing;
use boleto_adapters::{AdapterRegistry, FileCertificateProvider, GatewayConfig};
use boleto_core::{BoletoRequest, StatusClass};
use colored::Colorize;
use serde_json::json;
use std::env;
use std::fs;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let path = env::args()
        .nth(1)
        .context("usage: register-boleto <request.json>")?;

    let config = GatewayConfig::from_env().context("failed to load gateway configuration")?;
    config.validate().map_err(|e| anyhow!(e))?;

    init_tracing(env::var("LOG_FORMAT").map(|f| f == "json").unwrap_or(false));
    info!(mock_mode = config.mock_mode, "Gateway configuration loaded");

    let raw = fs::read_to_string(&path).with_context(|| format!("failed to read {}", path))?;
    let request: BoletoRequest =
        serde_json::from_str(&raw).with_context(|| format!("invalid boleto request in {}", path))?;

    let certificates = Arc::new(FileCertificateProvider::new(config.certificates_dir.clone()));
    let registry = AdapterRegistry::build(&config, certificates);
    if registry.ready_banks().is_empty() {
        bail!("no bank adapter could be initialised");
    }

    let outcome = registry.register_boleto(request).await;

    let code = outcome.status.as_u16();
    let label = if outcome.status == StatusClass::Ok {
        code.to_string().green()
    } else {
        code.to_string().red()
    };
    eprintln!("{} {}", "Status:".bold(), label);

    let printed = json!({ "status": code, "response": outcome.response });
    println!("{}", serde_json::to_string_pretty(&printed)?);

    Ok(())
}
