// glacier-restore/src/config/mod.rs
use anyhow::Context;
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{RestoreError, Result};
use crate::listing::Source;
use crate::restore::dispatch::DEFAULT_MAX_TRIES;
use crate::restore::pricing::Pricing;
use crate::storage::{RestoreTarget, Tier};

pub const DEFAULT_THREADS: usize = 40;

/// Command-line arguments.
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about = "Batch-restore archived S3 objects and report their restore status")]
pub struct Args {
    /// Restore every object under this s3://bucket/prefix
    #[arg(long, conflicts_with = "list")]
    pub prefix: Option<String>,

    /// File with one s3://bucket/key locator per line
    #[arg(long)]
    pub list: Option<PathBuf>,

    /// Days to keep the restored copy available
    #[arg(long, conflicts_with = "dest_bucket")]
    pub days: Option<i32>,

    /// Restore into this bucket instead of in place, keeping each object's key
    #[arg(long)]
    pub dest_bucket: Option<String>,

    /// Number of parallel workers
    #[arg(long, default_value_t = DEFAULT_THREADS)]
    pub threads: usize,

    /// Only report restore status, never issue restores
    #[arg(long)]
    pub status: bool,

    /// Only restore objects that are neither restored nor restoring
    #[arg(long)]
    pub missing: bool,

    /// AWS credentials profile
    #[arg(long)]
    pub profile: Option<String>,

    /// AWS region (overrides the profile's region)
    #[arg(long)]
    pub region: Option<String>,

    /// Endpoint for S3-compatible object stores
    #[arg(long)]
    pub endpoint_url: Option<String>,

    /// Attempts per object before giving up on throttled restores
    #[arg(long, default_value_t = DEFAULT_MAX_TRIES)]
    pub max_tries: u32,

    /// Restore tier; skips the interactive cost prompt
    #[arg(long, value_enum)]
    pub tier: Option<Tier>,

    /// JSON file overriding the built-in prices
    #[arg(long)]
    pub pricing: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Report status and stop.
    StatusOnly,
    /// Restore the working set, optionally filtered to objects needing a restore.
    Restore { missing_only: bool, target: RestoreTarget },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteSettings {
    pub profile: Option<String>,
    pub region: Option<String>,
    pub endpoint_url: Option<String>,
}

/// Validated settings for one run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub source: Source,
    pub mode: Mode,
    pub threads: usize,
    pub max_tries: u32,
    pub tier: Option<Tier>,
    pub remote: RemoteSettings,
    pub pricing: Pricing,
}

impl RunConfig {
    pub fn from_args(args: Args) -> Result<Self> {
        let source = match (args.prefix, args.list) {
            (Some(prefix), None) => Source::Prefix(prefix),
            (None, Some(list)) => Source::List(list),
            (None, None) => {
                return Err(RestoreError::Config(
                    "one of --prefix or --list is required".to_string(),
                ));
            }
            (Some(_), Some(_)) => {
                return Err(RestoreError::Config(
                    "--prefix and --list cannot be used together".to_string(),
                ));
            }
        };

        if args.threads == 0 {
            return Err(RestoreError::Config("--threads must be at least 1".to_string()));
        }

        let mode = if args.status && !args.missing {
            Mode::StatusOnly
        } else {
            let target = match (args.dest_bucket, args.days) {
                (Some(bucket), _) if !bucket.trim().is_empty() => RestoreTarget::Destination { bucket },
                (Some(_), _) => {
                    return Err(RestoreError::Config("--dest-bucket cannot be empty".to_string()));
                }
                (None, Some(days)) if days >= 1 => RestoreTarget::InPlace { days },
                (None, Some(days)) => {
                    return Err(RestoreError::Config(format!(
                        "--days must be at least 1, got {}",
                        days
                    )));
                }
                (None, None) if args.missing => {
                    return Err(RestoreError::Config(
                        "--missing needs --days or --dest-bucket".to_string(),
                    ));
                }
                (None, None) => {
                    return Err(RestoreError::Config(
                        "one of --status, --days or --dest-bucket is required".to_string(),
                    ));
                }
            };
            Mode::Restore { missing_only: args.missing, target }
        };

        let pricing = match &args.pricing {
            Some(path) => load_pricing_from_json(path)?,
            None => Pricing::default(),
        };

        Ok(Self {
            source,
            mode,
            threads: args.threads,
            max_tries: args.max_tries,
            tier: args.tier,
            remote: RemoteSettings {
                profile: args.profile,
                region: args.region,
                endpoint_url: args.endpoint_url,
            },
            pricing,
        })
    }

    /// Whether the run starts with a status pass over the working set.
    pub fn checks_status(&self) -> bool {
        matches!(
            self.mode,
            Mode::StatusOnly | Mode::Restore { missing_only: true, .. }
        )
    }
}

pub fn load_pricing_from_json(path: &Path) -> Result<Pricing> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read pricing file at {}", path.display()))?;
    let pricing = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse JSON from pricing file at {}", path.display()))?;
    Ok(pricing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn args() -> Args {
        Args {
            prefix: Some("s3://bucket/logs/".to_string()),
            threads: DEFAULT_THREADS,
            max_tries: DEFAULT_MAX_TRIES,
            ..Args::default()
        }
    }

    #[test]
    fn test_cli_defaults() {
        let parsed = Args::parse_from(["glacier-restore", "--prefix", "s3://b/p", "--days", "5"]);
        assert_eq!(parsed.threads, 40);
        assert_eq!(parsed.max_tries, 10);
        assert_eq!(parsed.days, Some(5));
        assert!(!parsed.status && !parsed.missing);
    }

    #[test]
    fn test_cli_rejects_both_sources() {
        let parsed = Args::try_parse_from([
            "glacier-restore", "--prefix", "s3://b/p", "--list", "objects.txt", "--status",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_cli_parses_tier() {
        let parsed = Args::parse_from(["glacier-restore", "--list", "x", "--days", "1", "--tier", "bulk"]);
        assert_eq!(parsed.tier, Some(Tier::Bulk));
    }

    #[test]
    fn test_missing_source_is_config_error() {
        let err = RunConfig::from_args(Args { prefix: None, status: true, ..args() }).unwrap_err();
        assert!(matches!(err, RestoreError::Config(_)));
    }

    #[test]
    fn test_restore_needs_days_or_destination() {
        let err = RunConfig::from_args(args()).unwrap_err();
        assert!(matches!(err, RestoreError::Config(ref msg) if msg.contains("--days")));
    }

    #[test]
    fn test_missing_without_target_names_the_missing_flags() {
        let err = RunConfig::from_args(Args { status: true, missing: true, ..args() }).unwrap_err();
        assert!(
            matches!(err, RestoreError::Config(ref msg) if msg == "--missing needs --days or --dest-bucket"),
            "{err}"
        );
    }

    #[test]
    fn test_status_only_needs_no_target() -> anyhow::Result<()> {
        let config = RunConfig::from_args(Args { status: true, ..args() })?;
        assert_eq!(config.mode, Mode::StatusOnly);
        assert!(config.checks_status());
        Ok(())
    }

    #[test]
    fn test_missing_overrides_status_only() -> anyhow::Result<()> {
        let config = RunConfig::from_args(Args { status: true, missing: true, days: Some(2), ..args() })?;
        assert_eq!(
            config.mode,
            Mode::Restore { missing_only: true, target: RestoreTarget::InPlace { days: 2 } }
        );
        assert!(config.checks_status());
        Ok(())
    }

    #[test]
    fn test_destination_mode_has_no_retention() -> anyhow::Result<()> {
        let config = RunConfig::from_args(Args { dest_bucket: Some("warm".to_string()), ..args() })?;
        match config.mode {
            Mode::Restore { missing_only, target } => {
                assert!(!missing_only);
                assert_eq!(target.retention_days(), None);
            }
            other => panic!("unexpected mode {other:?}"),
        }
        assert!(!RunConfig::from_args(Args { dest_bucket: Some("warm".to_string()), ..args() })?.checks_status());
        Ok(())
    }

    #[test]
    fn test_invalid_numbers_are_rejected() {
        assert!(RunConfig::from_args(Args { days: Some(0), ..args() }).is_err());
        assert!(RunConfig::from_args(Args { days: Some(1), threads: 0, ..args() }).is_err());
    }

    #[test]
    fn test_pricing_file_is_loaded() -> anyhow::Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        write!(file, r#"{{ "storage_gb_month": 0.004 }}"#)?;

        let config = RunConfig::from_args(Args {
            days: Some(1),
            pricing: Some(file.path().to_path_buf()),
            ..args()
        })?;

        assert_eq!(config.pricing.storage_gb_month, 0.004);
        assert_eq!(config.pricing.bulk, Pricing::default().bulk);
        Ok(())
    }

    #[test]
    fn test_malformed_pricing_file_is_an_error() -> anyhow::Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        write!(file, "not json")?;
        assert!(load_pricing_from_json(file.path()).is_err());
        Ok(())
    }
}
