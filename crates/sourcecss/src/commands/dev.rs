//! Sandbox server command.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use sourcecss_server::{PlaygroundConfig, PlaygroundServer, RebuildGenerator};

use super::Project;

/// Run the sandbox server.
pub async fn run(config: &Path, port: Option<u16>, open: bool) -> Result<()> {
    let project = Project::discover(config)?;
    let generator = Arc::new(project.generator());

    // Serve the previous output when the first run fails
    let initial = Arc::clone(&generator);
    match tokio::task::spawn_blocking(move || initial.generate(&[])).await? {
        Ok(results) => tracing::info!("Generated {} stylesheets", results.len()),
        Err(e) => tracing::error!("Initial generation failed: {}", e),
    }

    let layout = &generator.config().layout;
    let server_config = PlaygroundConfig {
        source_dir: project.root.join(&layout.source_dir),
        dist_dir: project.root.join(&layout.dist_dir),
        watch_files: vec![project.config_file.clone()],
        port: port.unwrap_or(project.config.server.port),
        host: project.config.server.host.clone(),
        open,
    };

    // Config edits take effect on the next full regeneration
    let root = project.root.clone();
    let config_file = project.config_file.clone();
    let rebuild: RebuildGenerator = Arc::new(move || {
        Project::load(root.clone(), config_file.clone())
            .map(|project| project.generator())
            .map_err(|e| format!("{e:#}"))
    });

    tracing::info!("Starting sandbox server on port {}", server_config.port);

    PlaygroundServer::new(server_config, Arc::clone(&generator))
        .with_rebuild(rebuild)
        .start()
        .await?;

    Ok(())
}
