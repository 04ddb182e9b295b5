/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::path::PathBuf;

use anyhow::{Context, anyhow};
use clap::{Arg, ArgMatches, Command, value_parser};
use log::{info, warn};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use ftpb_client::{FtpConnectionProvider, FtpFileStream};

use crate::browse::{format_size, guess_media_type, resolve_path};
use crate::table::FtpSessionTable;

pub(super) const COMMAND: &str = "get";

const COMMAND_ARG_PATH: &str = "path";
const COMMAND_ARG_OUTPUT: &str = "output";

pub(super) fn command() -> Command {
    Command::new(COMMAND)
        .about("Download file")
        .arg(
            Arg::new(COMMAND_ARG_PATH)
                .value_name("FILE PATH")
                .num_args(1)
                .required(true),
        )
        .arg(
            Arg::new(COMMAND_ARG_OUTPUT)
                .help("Local file to write to, '-' for stdout")
                .value_name("LOCAL FILE")
                .num_args(1)
                .value_parser(value_parser!(PathBuf))
                .short('o')
                .long("output"),
        )
}

#[derive(Debug, PartialEq, Eq)]
struct FetchReport {
    path: String,
    advertised: Option<u64>,
    written: u64,
}

impl FetchReport {
    fn size_matched(&self) -> Option<bool> {
        self.advertised.map(|size| size == self.written)
    }
}

/// Copy every chunk into the writer, closing the stream early on write errors
async fn save_stream<CP, S, W>(
    mut stream: FtpFileStream<'_, CP, S>,
    writer: &mut W,
) -> anyhow::Result<u64>
where
    CP: FtpConnectionProvider<S> + Send,
    S: AsyncRead + AsyncWrite + Unpin + Send,
    W: AsyncWrite + Unpin,
{
    loop {
        match stream.next_chunk().await {
            Ok(Some(chunk)) => {
                if let Err(e) = writer.write_all(&chunk).await {
                    stream.close().await;
                    return Err(anyhow!("failed to write local output: {e}"));
                }
            }
            Ok(None) => break,
            Err(e) => return Err(anyhow!("download failed: {e}")),
        }
    }
    let written = stream.received_bytes();
    writer
        .flush()
        .await
        .map_err(|e| anyhow!("failed to flush local output: {e}"))?;
    Ok(written)
}

async fn fetch<CP, S, W>(
    table: &mut FtpSessionTable<CP, S>,
    server: &str,
    path: &str,
    writer: &mut W,
) -> anyhow::Result<FetchReport>
where
    CP: FtpConnectionProvider<S> + Send,
    S: AsyncRead + AsyncWrite + Unpin + Send,
    W: AsyncWrite + Unpin,
{
    let root = table
        .server(server)
        .map(|s| s.root_path.clone())
        .ok_or_else(|| anyhow!("no server named {server}"))?;
    let path = resolve_path(&root, path);

    let session = table.checkout(server).await?;
    let advertised = session
        .file_size(&path)
        .await
        .context(format!("failed to query size of {path}"))?;
    info!(
        "fetching {path} ({}), size {}",
        guess_media_type(&path),
        advertised.map(format_size).unwrap_or_else(|| "unknown".to_string())
    );

    let stream = session
        .download(&path)
        .await
        .context(format!("download failed: {path}"))?;
    let written = save_stream(stream, writer).await?;
    Ok(FetchReport {
        path,
        advertised,
        written,
    })
}

fn default_output(path: &str) -> anyhow::Result<PathBuf> {
    match path.rsplit('/').next() {
        Some(name) if !name.is_empty() => Ok(PathBuf::from(name)),
        _ => Err(anyhow!("no file name found in path {path}")),
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
    let output = match args.get_one::<PathBuf>(COMMAND_ARG_OUTPUT) {
        Some(p) => p.clone(),
        None => default_output(path)?,
    };

    let report = if output.as_os_str() == "-" {
        let mut stdout = tokio::io::stdout();
        fetch(table, server, path, &mut stdout).await?
    } else {
        let mut file = tokio::fs::File::create(&output)
            .await
            .map_err(|e| anyhow!("failed to create {}: {e}", output.display()))?;
        fetch(table, server, path, &mut file).await?
    };

    match report.size_matched() {
        Some(false) => warn!(
            "{}: received {} bytes, while the server reported {}",
            report.path,
            report.written,
            report.advertised.unwrap_or_default()
        ),
        _ => info!("{}: received {} bytes", report.path, report.written),
    }
    if output.as_os_str() != "-" {
        eprintln!(
            "{} -> {} ({})",
            report.path,
            output.display(),
            format_size(report.written)
        );
    }
    Ok(())
}
