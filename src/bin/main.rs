use std::process::exit;

fn main() {
    let matches = bpkg::cli::app().get_matches();
    let verbosity = matches.occurrences_of("verbose") as u8;
    let log = bpkg::root_logger(verbosity);

    if let Err(e) = bpkg::cli::run(&matches, log.clone()) {
        slog::error!(log, "{}", e);
        exit(1);
    }
}
