use anyhow::Result;
use colored::*;
use gateway::GatewayClient;
use lifecycle::orchestrator::url_path;
use lifecycle::Settings;
use serde_json::json;
use std::sync::Arc;
use transport::ReqwestTransport;

/// Resolve the identity application bound to an asset URL at the gateway
pub async fn execute(settings: &Settings, asset_url: String, format: String) -> Result<()> {
    let path = url_path(&asset_url)?;
    let transport = Arc::new(ReqwestTransport::new(&settings.gateway_transport())?);
    let client = GatewayClient::new(settings.gateway.clone(), transport);

    let app_id = client.resolve_app_id(&path).await?;

    match format.as_str() {
        "json" => {
            let output = json!({
                "asset_url": asset_url,
                "path": path,
                "app_id": app_id,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        _ => match app_id {
            Some(app_id) => println!(
                "{} {} is protected by application {}",
                "✓".green(),
                path.cyan(),
                app_id.bold()
            ),
            None => println!(
                "{} {} is published without an identity application",
                "○".white(),
                path.cyan()
            ),
        },
    }

    Ok(())
}
