// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Command-line front end for a local tskv store.
//!
//! Usage:
//!   tskv set <key> <value-file> [--tag T]   # save a new version
//!   tskv get <key>                          # print the latest content
//!   tskv list <key>                         # print every tag, one per line
//!   tskv rollback --tag T <key>             # re-save tag T as a new version
//!
//! The store directory comes from `--store` or `TSKV_STORE_PATH`.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tskv::engine::{EngineConfig, RollbackPolicy, VersionedStore};
use tskv::record::Blob;
use tskv::storage::{new_holder_token, RocksBackend, Session};

#[derive(Parser)]
#[command(name = "tskv", version, about = "Versioned key-value store")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct GlobalArgs {
    /// Store directory.
    #[arg(long, global = true, env = "TSKV_STORE_PATH", default_value = ".tskv")]
    store: PathBuf,

    /// Enable debug logging.
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Suppress all logging.
    #[arg(long, short, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Get the last set value of a key.
    Get {
        /// Key to get.
        key: String,
    },

    /// Set a key from the contents of a file.
    Set {
        /// Key to set.
        key: String,

        /// File holding the value. Trailing newlines are trimmed.
        value: PathBuf,

        /// Tag for this version (default: current time in nanoseconds).
        #[arg(long)]
        tag: Option<String>,

        /// Hold the key's advisory lock while saving.
        #[arg(long)]
        lock: bool,
    },

    /// Roll the value of a key back to a tag.
    Rollback {
        /// Tag to restore.
        #[arg(long)]
        tag: String,

        /// Key to roll back.
        key: String,

        /// Leave the live value untouched and only extend the history.
        #[arg(long)]
        archive_only: bool,
    },

    /// List the tags of a key.
    List {
        /// Key to list.
        key: String,
    },
}

fn init_tracing(quiet: bool, verbose: bool) {
    let filter = if quiet {
        EnvFilter::new("off")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

/// Drops trailing newlines picked up from the value file.
fn trim_trailing_newlines(mut bytes: Vec<u8>) -> Vec<u8> {
    while bytes.last() == Some(&b'\n') {
        bytes.pop();
    }
    bytes
}

fn run(cli: Cli, out: &mut impl Write) -> Result<()> {
    let backend = RocksBackend::new(&cli.global.store);
    let session = Session::open(backend)
        .with_context(|| format!("opening store {}", cli.global.store.display()))?;

    let mut config = EngineConfig::default();
    if let Command::Rollback { archive_only: true, .. } = cli.command {
        config = config.with_rollback_policy(RollbackPolicy::ArchiveOnly);
    }
    let store = VersionedStore::new(&session, config);
    let archive = store.archive().clone();

    match cli.command {
        Command::Get { key } => {
            let mut blob = Blob::empty(key);
            store.get(&mut blob, Some(&archive))?;
            out.write_all(blob.content())?;
            writeln!(out)?;
        }

        Command::Set {
            key,
            value,
            tag,
            lock,
        } => {
            let bytes = std::fs::read(&value)
                .with_context(|| format!("reading value file {}", value.display()))?;
            let tag = tag.unwrap_or_else(|| store.next_tag());
            let mut blob = Blob::new(key.clone(), trim_trailing_newlines(bytes));

            if lock {
                let holder = new_holder_token();
                store.with_lock(&key, &holder, |store| store.save(&mut blob, &archive, &tag))?;
            } else {
                store.save(&mut blob, &archive, &tag)?;
            }
            writeln!(out, "{}", tag)?;
        }

        Command::Rollback { tag, key, .. } => {
            let mut blob = Blob::empty(key);
            let new_tag = store.rollback(&mut blob, &archive, &tag)?;
            writeln!(out, "{}", new_tag)?;
        }

        Command::List { key } => {
            for tag in store.get_versions(&Blob::empty(key), &archive)? {
                writeln!(out, "{}", tag)?;
            }
        }
    }

    drop(store);
    session.close()?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.global.quiet, cli.global.verbose);
    run(cli, &mut std::io::stdout().lock())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;
    use tskv::engine::EngineError;

    fn run_at(store: &Path, args: &[&str]) -> Result<String> {
        let mut argv = vec![
            "tskv".to_string(),
            "--store".to_string(),
            store.display().to_string(),
        ];
        argv.extend(args.iter().map(|a| a.to_string()));

        let mut out = Vec::new();
        run(Cli::try_parse_from(argv)?, &mut out)?;
        Ok(String::from_utf8(out)?)
    }

    #[test]
    fn test_trim_trailing_newlines() {
        assert_eq!(trim_trailing_newlines(b"value\n\n".to_vec()), b"value");
        assert_eq!(trim_trailing_newlines(b"a\nb".to_vec()), b"a\nb");
        assert_eq!(trim_trailing_newlines(b"\n".to_vec()), b"");
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from(["tskv", "--store", "/tmp/x", "set", "k", "f", "--tag", "t1"]).unwrap();
        match cli.command {
            Command::Set { key, tag, lock, .. } => {
                assert_eq!(key, "k");
                assert_eq!(tag.as_deref(), Some("t1"));
                assert!(!lock);
            }
            _ => panic!("expected set"),
        }

        let cli = Cli::try_parse_from(["tskv", "rollback", "--tag", "t1", "k"]).unwrap();
        assert!(matches!(cli.command, Command::Rollback { .. }));
    }

    #[test]
    fn test_set_get_list_rollback() {
        let dir = TempDir::new().unwrap();
        let store = dir.path().join("store");
        let v1 = dir.path().join("v1");
        let v2 = dir.path().join("v2");
        std::fs::write(&v1, b"one\n").unwrap();
        std::fs::write(&v2, b"two").unwrap();

        let set = |file: &Path, tag: &str, extra: &[&str]| {
            let mut args = vec!["set", "alpha", file.to_str().unwrap(), "--tag", tag];
            args.extend_from_slice(extra);
            run_at(&store, &args).unwrap()
        };
        assert_eq!(set(&v1, "t1", &[]), "t1\n");
        assert_eq!(set(&v2, "t2", &["--lock"]), "t2\n");

        assert_eq!(run_at(&store, &["get", "alpha"]).unwrap(), "two\n");
        assert_eq!(run_at(&store, &["list", "alpha"]).unwrap(), "latest\nt1\nt2\n");

        let new_tag = run_at(&store, &["rollback", "--tag", "t1", "alpha"]).unwrap();
        assert!(!new_tag.trim().is_empty());
        assert_eq!(run_at(&store, &["get", "alpha"]).unwrap(), "one\n");
        assert_eq!(run_at(&store, &["list", "alpha"]).unwrap().lines().count(), 4);

        let err = run_at(&store, &["rollback", "--tag", "t9", "alpha"]).unwrap_err();
        assert!(err
            .downcast_ref::<EngineError>()
            .is_some_and(EngineError::is_not_found));
    }

    #[test]
    fn test_get_unwritten_key_prints_empty_line() {
        let dir = TempDir::new().unwrap();
        let store = dir.path().join("store");

        assert_eq!(run_at(&store, &["get", "ghost"]).unwrap(), "\n");
        assert_eq!(run_at(&store, &["list", "ghost"]).unwrap(), "");
    }
}
