//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

fn main() {
    pretty_env_logger::init();
    if let Err(err) = saferoute_cli::run() {
        log::debug!("{err:?}");
        eprintln!("saferoute: {err}");
        std::process::exit(1);
    }
}
