use clap::Parser;
use devscope::cli::Cli;

/// Print the config schema when invoked as `devscope --schema`.
fn handle_schema_flag() -> bool {
    let args: Vec<String> = std::env::args().collect();
    if args.get(1).map(|s| s.as_str()) != Some("--schema") {
        return false;
    }
    let response = serde_json::json!({
        "config_path": ".devscope/config.toml",
        "format": "toml",
        "schema": schemars::schema_for!(devscope::config::DevscopeConfig)
    });
    match serde_json::to_string_pretty(&response) {
        Ok(text) => println!("{}", text),
        Err(e) => eprintln!("error: {}", e),
    }
    true
}

/// Reset SIGPIPE to default behavior so piping to `head` etc. doesn't panic.
#[cfg(unix)]
fn reset_sigpipe() {
    // SAFETY: resets the SIGPIPE disposition to the POSIX default (terminate)
    // before any output is written. No memory is touched.
    unsafe {
        libc::signal(libc::SIGPIPE, libc::SIG_DFL);
    }
}

#[cfg(not(unix))]
fn reset_sigpipe() {}

fn main() {
    reset_sigpipe();

    if handle_schema_flag() {
        return;
    }

    devscope::logging::init_tracing();
    let cli = Cli::parse();
    match devscope::run(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("error: {:#}", e);
            std::process::exit(1);
        }
    }
}
