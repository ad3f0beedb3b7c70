use clap::Parser;
use ringline::{app::Application, cli::Opts, config::Config, daemon, trace};
use tracing::error;

fn main() {
    let opts = Opts::parse();
    trace::init(&opts.log_level);

    let mut config = match Config::load(opts.config.as_deref()) {
        Ok(config) => config,
        Err(error) => {
            error!(message = "Invalid configuration.", %error);
            std::process::exit(exitcode::CONFIG);
        }
    };
    config.apply_cli(&opts);

    // Fork before any runtime threads exist.
    if opts.daemon {
        if let Err(error) = daemon::daemonize() {
            error!(message = "Failed to daemonize.", %error);
            std::process::exit(exitcode::OSERR);
        }
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            error!(message = "Failed to start runtime.", %error);
            std::process::exit(exitcode::SOFTWARE);
        }
    };

    match runtime.block_on(Application::new(config).run()) {
        Ok(()) => std::process::exit(exitcode::OK),
        Err(error) => {
            error!(message = "Fatal error.", %error);
            std::process::exit(exitcode::SOFTWARE);
        }
    }
}
