use anyhow::{Context, Result};
use console::style;

use super::AppContext;

pub async fn handle_set_context_path_command(path: String) -> Result<()> {
    let mut app = AppContext::load()?;
    app.config.set_context_path(&path);

    let config_path = app.dirs.config_file_path();
    app.config
        .save(&config_path)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    println!(
        "{} Context path set to: {}",
        style("✓").green(),
        style(app.config.context_path.display()).cyan()
    );
    Ok(())
}
