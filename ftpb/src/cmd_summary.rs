/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use clap::{Arg, ArgMatches, Command};
use tokio::io::{AsyncRead, AsyncWrite};

use ftpb_client::{FtpConnectionProvider, FtpDirEntry};

use crate::browse::format_size;
use crate::table::FtpSessionTable;

pub(super) const COMMAND: &str = "summary";

const COMMAND_ARG_PATH: &str = "path";

pub(super) fn command() -> Command {
    Command::new(COMMAND)
        .about("Count files and directories in a path")
        .arg(Arg::new(COMMAND_ARG_PATH).value_name("DIR PATH").num_args(1))
}

#[derive(Debug, Default, PartialEq, Eq)]
struct DirSummary {
    file_count: usize,
    dir_count: usize,
    total_size: u64,
}

impl DirSummary {
    fn collect(entries: &[FtpDirEntry]) -> Self {
        let mut summary = DirSummary::default();
        for entry in entries {
            if entry.is_dir() {
                summary.dir_count += 1;
            } else {
                summary.file_count += 1;
                summary.total_size += entry.size();
            }
        }
        summary
    }
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

    let (path, entries) = super::cmd_list::list_sorted(table, server, path).await?;
    let summary = DirSummary::collect(&entries);

    println!("Server: {server}");
    println!("Path: {path}");
    println!("Files: {}", summary.file_count);
    println!("Directories: {}", summary.dir_count);
    println!(
        "Total Size: {} ({} bytes)",
        format_size(summary.total_size),
        summary.total_size
    );
    Ok(())
}
