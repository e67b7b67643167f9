//! Stylesheet generation command.

use std::path::Path;

use anyhow::Result;

use super::Project;

/// Run the generate command.
pub async fn run(config: &Path, components: &[String]) -> Result<()> {
    let project = Project::discover(config)?;
    let generator = project.generator();

    let components = components.to_vec();
    let results =
        tokio::task::spawn_blocking(move || generator.generate(&components)).await??;

    let rules: usize = results.iter().map(|result| result.rules).sum();
    tracing::info!(
        "Generated {} stylesheets with {} rules",
        results.len(),
        rules
    );

    Ok(())
}
