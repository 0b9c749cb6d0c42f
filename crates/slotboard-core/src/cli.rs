use std::ffi::OsString;
use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use chrono::NaiveDate;
use clap::{ArgAction, Parser};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
pub struct PreprocessedArgs {
    pub cleaned_args: Vec<OsString>,
    pub rc_overrides: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct KeyVal {
    pub key: String,
    pub value: String,
}

impl std::str::FromStr for KeyVal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (k, v) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got: {s}"))?;
        Ok(Self {
            key: k.trim().to_string(),
            value: v.trim().to_string(),
        })
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "slotboard",
    version,
    about = "Slotboard: provider booking dashboard in the terminal"
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count)]
    pub quiet: u8,

    #[arg(
        long = "rc",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<KeyVal>()),
        action = ArgAction::Append
    )]
    pub rc_overrides: Vec<KeyVal>,

    #[arg(long = "slotboardrc")]
    pub slotboardrc: Option<PathBuf>,

    /// Day to select (YYYY-MM-DD). Weekends and unavailable days are refused.
    #[arg(long = "day")]
    pub day: Option<NaiveDate>,

    /// Month to show on the calendar (YYYY-MM).
    #[arg(long = "month", value_parser = parse_month_arg)]
    pub month: Option<NaiveDate>,
}

pub fn parse_month_arg(raw: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{}-01", raw.trim()), "%Y-%m-%d")
        .map_err(|e| anyhow!("expected YYYY-MM, got {raw}: {e}"))
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}

/// Pulls positional `rc.key=value` (or `rc.key:value`) overrides out of the
/// argument list before clap sees it.
#[tracing::instrument(skip_all)]
pub fn preprocess_args(raw: &[OsString]) -> anyhow::Result<PreprocessedArgs> {
    let mut cleaned = Vec::with_capacity(raw.len());
    let mut overrides: Vec<(String, String)> = Vec::new();

    let mut iter = raw.iter().cloned();
    if let Some(bin) = iter.next() {
        cleaned.push(bin);
    }

    for arg in iter {
        let s = arg.to_string_lossy();
        if let Some(rest) = s.strip_prefix("rc.") {
            let parsed = if let Some((k, v)) = rest.split_once('=') {
                Some((format!("rc.{k}"), v.to_string()))
            } else if let Some((k, v)) = rest.split_once(':') {
                Some((format!("rc.{k}"), v.to_string()))
            } else {
                None
            };

            if let Some((k, v)) = parsed {
                debug!(key = %k, "captured positional rc override");
                overrides.push((k, v));
                continue;
            }
        }

        cleaned.push(arg);
    }

    Ok(PreprocessedArgs {
        cleaned_args: cleaned,
        rc_overrides: overrides,
    })
}

#[cfg(test)]
mod tests {
    use std::ffi::OsString;

    use chrono::NaiveDate;
    use clap::Parser;

    use super::{GlobalCli, parse_month_arg, preprocess_args};

    fn args(raw: &[&str]) -> Vec<OsString> {
        raw.iter().map(OsString::from).collect()
    }

    #[test]
    fn positional_rc_overrides_are_extracted() {
        let pre = preprocess_args(&args(&[
            "slotboard",
            "rc.locale=pt_BR",
            "--day",
            "2024-03-11",
            "rc.agenda.ordering:chronological",
        ]))
        .expect("preprocess");
        assert_eq!(
            pre.rc_overrides,
            vec![
                ("rc.locale".to_string(), "pt_BR".to_string()),
                ("rc.agenda.ordering".to_string(), "chronological".to_string()),
            ]
        );
        assert_eq!(pre.cleaned_args, args(&["slotboard", "--day", "2024-03-11"]));
    }

    #[test]
    fn parses_day_month_and_rc_flags() {
        let cli = GlobalCli::try_parse_from([
            "slotboard",
            "-vv",
            "--day",
            "2024-03-11",
            "--month",
            "2024-04",
            "--rc",
            "color=off",
        ])
        .expect("parse cli");
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.day, NaiveDate::from_ymd_opt(2024, 3, 11));
        assert_eq!(cli.month, NaiveDate::from_ymd_opt(2024, 4, 1));
        assert_eq!(cli.rc_overrides[0].key, "color");
        assert_eq!(cli.rc_overrides[0].value, "off");
    }

    #[test]
    fn month_arg_rejects_garbage() {
        assert!(parse_month_arg("2024-13").is_err());
        assert!(parse_month_arg("march").is_err());
    }
}
