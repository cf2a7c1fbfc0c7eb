use crate::cli::globals::GlobalArgs;
use anyhow::Result;
use std::{path::PathBuf, time::Duration};
use tracing::info;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub pac_bin: String,
    pub work_dir: Option<String>,
    pub pac_timeout: u64,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let work_dir = args.work_dir.map_or_else(std::env::temp_dir, PathBuf::from);

    let globals = GlobalArgs::new(
        args.pac_bin,
        work_dir,
        Duration::from_secs(args.pac_timeout),
    );

    log_startup_args(&globals, args.port);

    crate::copiclone::new(args.port, &globals).await
}

fn log_startup_args(globals: &GlobalArgs, port: u16) {
    let entries = [
        ("listen", format!("tcp:{port}")),
        ("pac_bin", globals.pac_bin.clone()),
        ("work_dir", globals.work_dir.display().to_string()),
        (
            "pac_timeout",
            format!("{}s", globals.pac_timeout.as_secs()),
        ),
    ];

    let max_key_len = entries.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    let mut message = String::from("Startup configuration:");
    for (key, value) in &entries {
        let padding = " ".repeat(max_key_len.saturating_sub(key.len()));
        let _ =
            std::fmt::Write::write_fmt(&mut message, format_args!("\n  {key}:{padding} {value}"));
    }
    info!("{message}");
}
