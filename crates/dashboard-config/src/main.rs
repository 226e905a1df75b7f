use dashboard_config::{cli, write_config_files};
use tracing::{debug, error, info};

fn main() {
    tracing_subscriber::fmt::init();

    let args = cli::parse();
    let Some(config) = args.dashboard_config() else {
        debug!("DASHBOARD_CONTROLLER_URL not provided, skipping config generation");
        return;
    };

    let written = config
        .rendered_files(&args.nginx_path, args.write_config_js, args.write_nginx)
        .and_then(|files| write_config_files(&files).map(|_| files.len()));
    match written {
        Ok(count) => info!("Wrote {} dashboard config file(s)", count),
        Err(e) => {
            error!("Application error: {}", e);
            std::process::exit(1);
        }
    }
}
