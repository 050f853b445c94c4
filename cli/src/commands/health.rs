use anyhow::Result;
use colored::*;
use identity::{IdentityClient, IdentityError};
use lifecycle::Settings;
use serde_json::json;
use transport::{HttpRequest, HttpTransport, ReqwestTransport, TransportError};

/// Execute the health check command
pub async fn execute(settings: &Settings, format: String) -> Result<()> {
    let health_status = check_health(settings).await?;

    match format.as_str() {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&health_status)?);
        }
        _ => {
            print_health_status_text(&health_status);
        }
    }

    Ok(())
}

/// Probe every external authority the lifecycle depends on
async fn check_health(settings: &Settings) -> Result<serde_json::Value> {
    let mut status = json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "components": {}
    });

    let identity_transport = ReqwestTransport::new(&settings.identity_transport())?;
    status["components"]["identity"] = check_identity_health(settings, &identity_transport).await;

    let gateway_transport = ReqwestTransport::new(&settings.gateway_transport())?;
    status["components"]["gateway"] = check_gateway_health(settings, &gateway_transport).await;

    let all_healthy = status["components"]
        .as_object()
        .map(|components| {
            components
                .values()
                .all(|v| v["status"].as_str() == Some("healthy"))
        })
        .unwrap_or(false);

    if !all_healthy {
        status["status"] = json!("degraded");
    }

    Ok(status)
}

/// Log in with the configured service credentials
async fn check_identity_health(
    settings: &Settings,
    transport: &dyn HttpTransport,
) -> serde_json::Value {
    let endpoint = settings.identity.url.clone();

    match IdentityClient::authenticate(&settings.identity, transport).await {
        Ok(_) => json!({
            "status": "healthy",
            "message": format!("Logged in as {}", settings.identity.user),
            "endpoint": endpoint
        }),
        Err(IdentityError::Authentication(e)) if e.is_connection() => json!({
            "status": "offline",
            "message": "Identity authority is not reachable",
            "endpoint": endpoint
        }),
        Err(e) => json!({
            "status": "unhealthy",
            "message": e.to_string(),
            "endpoint": endpoint
        }),
    }
}

/// Fetch a single page of the gateway API listing
async fn check_gateway_health(
    settings: &Settings,
    transport: &dyn HttpTransport,
) -> serde_json::Value {
    if settings.gateway.url.is_empty() {
        return json!({
            "status": "not_configured",
            "message": "No gateway URL configured"
        });
    }

    let endpoint = settings.gateway.url.clone();
    let request = HttpRequest::get(format!(
        "{}/api-umbrella/v1/apis.json?start=0&length=1",
        endpoint.trim_end_matches('/')
    ))
    .header("X-Api-Key", settings.gateway.api_key.clone())
    .header("X-Admin-Auth-Token", settings.gateway.admin_token.clone());

    match transport
        .send(request)
        .await
        .and_then(|response| response.error_for_status())
    {
        Ok(_) => json!({
            "status": "healthy",
            "message": "Gateway admin API is responsive",
            "endpoint": endpoint
        }),
        Err(e @ TransportError::Connection { .. }) => json!({
            "status": "offline",
            "message": format!("Gateway is not reachable: {}", e),
            "endpoint": endpoint
        }),
        Err(e) => json!({
            "status": "unhealthy",
            "message": e.to_string(),
            "endpoint": endpoint
        }),
    }
}

/// Print health status in a formatted text output
fn print_health_status_text(status: &serde_json::Value) {
    println!("{}", "=== NGSI Asset Health Check ===".bold());
    println!();

    let overall_status = status["status"].as_str().unwrap_or("unknown");
    let status_display = match overall_status {
        "healthy" => "HEALTHY".green().bold(),
        "degraded" => "DEGRADED".yellow().bold(),
        _ => "UNKNOWN".white().bold(),
    };

    println!("Overall Status: {}", status_display);
    println!("Timestamp: {}", status["timestamp"].as_str().unwrap_or(""));
    println!();

    println!("{}", "Components:".bold());
    println!("{}", "─".repeat(50));

    if let Some(components) = status["components"].as_object() {
        for (name, component) in components {
            let comp_status = component["status"].as_str().unwrap_or("unknown");
            let status_icon = match comp_status {
                "healthy" => "✓".green(),
                "unhealthy" => "✗".red(),
                "offline" | "not_configured" => "○".white(),
                _ => "?".white(),
            };

            let status_text = match comp_status {
                "healthy" => comp_status.green(),
                "unhealthy" => comp_status.red(),
                _ => comp_status.white(),
            };

            println!(
                "{} {} ({})",
                status_icon,
                name.to_uppercase().bold(),
                status_text
            );

            if let Some(message) = component["message"].as_str() {
                println!("  {}", message);
            }
            if let Some(endpoint) = component["endpoint"].as_str() {
                println!("  Endpoint: {}", endpoint);
            }

            println!();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use transport::mock::MockTransport;
    use transport::{HttpResponse, Method};

    fn settings() -> Settings {
        let mut settings = Settings::default();
        settings.identity.url = "http://idm:5000".to_string();
        settings.gateway.url = "http://umbrella".to_string();
        settings
    }

    #[tokio::test]
    async fn test_identity_health_states() {
        let transport = MockTransport::new().route(
            Method::Post,
            "/v3/auth/tokens",
            HttpResponse::new(201).with_header("X-Subject-Token", "tok"),
        );
        let status = check_identity_health(&settings(), &transport).await;
        assert_eq!(status["status"], "healthy");

        let transport = MockTransport::new().unreachable(Method::Post, "/v3/auth/tokens");
        let status = check_identity_health(&settings(), &transport).await;
        assert_eq!(status["status"], "offline");

        let transport =
            MockTransport::new().route(Method::Post, "/v3/auth/tokens", HttpResponse::new(401));
        let status = check_identity_health(&settings(), &transport).await;
        assert_eq!(status["status"], "unhealthy");
    }

    #[tokio::test]
    async fn test_gateway_health_states() {
        let transport = MockTransport::new().route(
            Method::Get,
            "apis.json",
            HttpResponse::json_body(200, json!({"data": []})),
        );
        let status = check_gateway_health(&settings(), &transport).await;
        assert_eq!(status["status"], "healthy");

        let transport = MockTransport::new();
        let status = check_gateway_health(&settings(), &transport).await;
        assert_eq!(status["status"], "unhealthy");

        let mut unconfigured = settings();
        unconfigured.gateway.url = String::new();
        let status = check_gateway_health(&unconfigured, &transport).await;
        assert_eq!(status["status"], "not_configured");
        assert!(transport.requests().len() == 1);
    }
}
