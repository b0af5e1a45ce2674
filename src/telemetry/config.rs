use std::sync::OnceLock;

static JSON_MODE: OnceLock<bool> = OnceLock::new();

/// `--json`: list commands and finished cycles print a JSON envelope on stdout.
pub fn set_json_mode(v: bool) {
    let _ = JSON_MODE.set(v);
}

pub fn json_mode() -> bool {
    *JSON_MODE.get().unwrap_or(&false)
}

pub fn logs_are_json() -> bool {
    matches!(std::env::var("GATOR_LOG_FORMAT").as_deref(), Ok("json"))
}

/// Initialize tracing/logging according to RUST_LOG and GATOR_LOG_FORMAT.
/// - Defaults to `info` if `RUST_LOG` is unset
/// - Supports `GATOR_LOG_FORMAT=json` for JSON logs (stderr)
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};
    use tracing_subscriber::prelude::*; // for .with()

    // Default filter if RUST_LOG unset
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);
    let builder = tracing_subscriber::registry().with(filter);

    if logs_are_json() {
        let _ = builder.with(fmt_layer.json().flatten_event(true)).try_init();
    } else {
        // human-friendly compact text
        let _ = builder.with(fmt_layer.compact()).try_init();
    }
}

// Strip CR/LF so remote error text cannot forge extra log lines.
pub fn sanitize(input: &str) -> String {
    input.replace(['\r', '\n'], " ")
}
