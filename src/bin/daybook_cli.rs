use daybook::{cli::output, cli::run_cli, config::ConfigManager, init_with_filter};

fn main() {
    let config = match ConfigManager::default_location().and_then(|manager| manager.load()) {
        Ok(config) => config,
        Err(err) => {
            output::error(format!("failed to load configuration: {err}"));
            std::process::exit(1);
        }
    };
    init_with_filter(config.log_filter.as_deref());

    if let Err(err) = run_cli(std::env::args().skip(1), &config) {
        output::error(err);
        std::process::exit(1);
    }
}
