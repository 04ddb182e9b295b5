/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use anyhow::anyhow;
use clap::{ArgMatches, Command};
use tokio::io::{AsyncRead, AsyncWrite};

use ftpb_client::FtpConnectionProvider;

use crate::table::FtpSessionTable;

pub(super) const COMMAND: &str = "check";

pub(super) fn command() -> Command {
    Command::new(COMMAND).about("Check that the server accepts a login and stays usable")
}

pub(super) async fn run<CP, S>(
    table: &mut FtpSessionTable<CP, S>,
    server: &str,
    _args: &ArgMatches,
) -> anyhow::Result<()>
where
    CP: FtpConnectionProvider<S> + Send,
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    let session = table.checkout(server).await?;
    let address = format!("{}:{}", session.host(), session.port());
    if session.is_reusable().await {
        println!("{server} ({address}): ok");
        Ok(())
    } else {
        table.remove(server).await;
        Err(anyhow!("{server} ({address}): service unavailable, health check failed"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::tests::{login_script, mock_table};
    use tokio_test::io::Builder;

    #[tokio::test]
    async fn healthy() {
        let control = login_script(&mut Builder::new())
            .write(b"NOOP\r\n")
            .read(b"200 ok\r\n")
            .build();
        let mut table = mock_table(vec![control]);
        run(&mut table, "nas", &ArgMatches::default()).await.unwrap();
    }

    #[tokio::test]
    async fn noop_rejected() {
        let control = login_script(&mut Builder::new())
            .write(b"NOOP\r\n")
            .read(b"500 unknown command\r\n")
            .write(b"QUIT\r\n")
            .read(b"221 bye\r\n")
            .build();
        let mut table = mock_table(vec![control]);
        assert!(run(&mut table, "nas", &ArgMatches::default()).await.is_err());
    }
}
