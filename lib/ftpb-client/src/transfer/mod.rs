/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::FtpFileStreamError;

mod passive;
pub use passive::FtpPassiveEndpoint;

mod stream;
pub use stream::FtpFileStream;

/// Drain a data channel until the server closes it
pub(crate) async fn read_data_to_end<S>(
    stream: &mut S,
    timeout: Duration,
    buf: &mut Vec<u8>,
) -> Result<(), FtpFileStreamError>
where
    S: AsyncRead + Unpin,
{
    loop {
        match tokio::time::timeout(timeout, stream.read_buf(buf)).await {
            Ok(Ok(0)) => return Ok(()),
            Ok(Ok(_)) => {}
            Ok(Err(e)) => return Err(FtpFileStreamError::ReadFailed(e)),
            Err(_) => return Err(FtpFileStreamError::ReadTimedOut),
        }
    }
}
