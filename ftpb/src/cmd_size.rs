/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use anyhow::{Context, anyhow};
use clap::{Arg, ArgMatches, Command};
use tokio::io::{AsyncRead, AsyncWrite};

use ftpb_client::FtpConnectionProvider;

use crate::browse::{format_size, resolve_path};
use crate::table::FtpSessionTable;

pub(super) const COMMAND: &str = "size";

const COMMAND_ARG_PATH: &str = "path";

pub(super) fn command() -> Command {
    Command::new(COMMAND).about("Query file size").arg(
        Arg::new(COMMAND_ARG_PATH)
            .value_name("FILE PATH")
            .num_args(1)
            .required(true),
    )
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
    let root = table
        .server(server)
        .map(|s| s.root_path.clone())
        .ok_or_else(|| anyhow!("no server named {server}"))?;
    let path = resolve_path(&root, path);

    let session = table.checkout(server).await?;
    let size = session
        .file_size(&path)
        .await
        .context(format!("failed to query size of {path}"))?;

    println!("Path: {path}");
    match size {
        Some(size) => println!("Size: {} ({size} bytes)", format_size(size)),
        None => println!("Size: unknown"),
    }
    Ok(())
}
