use crate::cli::actions::{server::Args, Action};
use anyhow::{Context, Result};

/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches
        .get_one::<u16>("port")
        .copied()
        .context("missing required argument: --port")?;

    let pac_bin = matches
        .get_one::<String>("pac-bin")
        .cloned()
        .context("missing required argument: --pac-bin")?;

    let work_dir = matches.get_one::<String>("work-dir").cloned();

    let pac_timeout = matches
        .get_one::<u64>("pac-timeout")
        .copied()
        .context("missing required argument: --pac-timeout")?;

    Ok(Action::Server(Args {
        port,
        pac_bin,
        work_dir,
        pac_timeout,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands;

    #[test]
    fn test_handler_defaults() {
        temp_env::with_vars(
            [
                ("COPICLONE_PORT", None::<&str>),
                ("COPICLONE_PAC_BIN", None),
                ("COPICLONE_WORK_DIR", None),
                ("COPICLONE_PAC_TIMEOUT", None),
            ],
            || {
                let matches = commands::new().get_matches_from(vec!["copiclone"]);
                let action = handler(&matches).unwrap();

                let Action::Server(args) = action;
                assert_eq!(args.port, 8080);
                assert_eq!(args.pac_bin, "pac");
                assert_eq!(args.work_dir, None);
                assert_eq!(args.pac_timeout, 300);
            },
        );
    }

    #[test]
    fn test_handler_explicit_args() {
        let matches = commands::new().get_matches_from(vec![
            "copiclone",
            "--port",
            "8088",
            "--pac-bin",
            "/usr/local/bin/pac",
            "--work-dir",
            "/tmp/copiclone",
            "--pac-timeout",
            "30",
        ]);
        let action = handler(&matches).unwrap();

        let Action::Server(args) = action;
        assert_eq!(args.port, 8088);
        assert_eq!(args.pac_bin, "/usr/local/bin/pac");
        assert_eq!(args.work_dir, Some("/tmp/copiclone".to_string()));
        assert_eq!(args.pac_timeout, 30);
    }
}
