//! `thoughtline tools` — list the tools the agent can use.

use thoughtline_config::AppConfig;

use super::session::build_registry;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let (registry, bridge) = build_registry(&config).await?;

    println!("🔧 Available Tools ({})", registry.len());
    println!("====================");
    println!();
    for descriptor in registry.descriptors() {
        println!("{}", descriptor.render());
    }
    if registry.is_empty() {
        println!("  No tools enabled. Check [tools] in your config.");
    }

    if let Some(bridge) = bridge {
        use thoughtline_tools::mcp::ToolBridge;
        bridge.stop().await;
    }
    Ok(())
}
