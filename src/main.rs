use clap::Parser;
use docchat::cli::Cli;
use docchat::env::logging as env_vars;

fn main() -> anyhow::Result<()> {
    // Load .env file if it exists (ignore errors if missing)
    dotenvy::dotenv().ok();

    if std::env::var_os(env_vars::NO_COLOR).is_some() {
        console::set_colors_enabled(false);
    }

    docchat::logging::init_from_env()?;

    let cli = Cli::parse();
    cli.run()
}
