/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fmt::Write;

use anyhow::{Context, anyhow};
use clap::{Arg, ArgMatches, Command};
use tokio::io::{AsyncRead, AsyncWrite};

use ftpb_client::{FtpConnectionProvider, FtpDirEntry};

use crate::browse::{format_size, media_class, resolve_path, sort_entries};
use crate::table::FtpSessionTable;

pub(super) const COMMAND: &str = "list";

const COMMAND_ARG_PATH: &str = "path";

pub(super) fn command() -> Command {
    Command::new(COMMAND).about("List directory").arg(
        Arg::new(COMMAND_ARG_PATH)
            .value_name("DIR PATH")
            .num_args(1),
    )
}

/// List a path below the server root, directories first
pub(super) async fn list_sorted<CP, S>(
    table: &mut FtpSessionTable<CP, S>,
    server: &str,
    path: &str,
) -> anyhow::Result<(String, Vec<FtpDirEntry>)>
where
    CP: FtpConnectionProvider<S> + Send,
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    let root = table
        .server(server)
        .map(|s| s.root_path.clone())
        .ok_or_else(|| anyhow!("no server named {server}"))?;
    let path = resolve_path(&root, path);

    let session = table.checkout(server).await?;
    let mut entries = session
        .list_directory(&path)
        .await
        .context(format!("failed to list {path}"))?;
    sort_entries(&mut entries);
    Ok((path, entries))
}

fn render_entries(entries: &[FtpDirEntry]) -> String {
    let mut s = String::new();
    for entry in entries {
        let size = if entry.is_dir() {
            "-".to_string()
        } else {
            format_size(entry.size())
        };
        let _ = writeln!(
            s,
            "{} {:>10} {:<9} {}",
            entry.permissions(),
            size,
            media_class(entry),
            entry.path()
        );
    }
    s
}

pub(super) async fn run<CP, S>(
    table: &mut FtpSessionTable<CP, S>,
    server: &str,
    args: &ArgMatches,
) -> anyhow::Result<()>
where
    CP: FtpConnectionProvider<S> + Send,
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    let path = args
        .get_one::<String>(COMMAND_ARG_PATH)
        .map(|s| s.as_str())
        .unwrap_or_default();

    let (_, entries) = list_sorted(table, server, path).await?;
    print!("{}", render_entries(&entries));
    Ok(())
}
