/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::time::Duration;

use bytes::Bytes;
use log::{debug, warn};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};

use crate::control::FtpCommand;
use crate::error::FtpFileStreamError;
use crate::{FtpConnectionProvider, FtpSession};

/// A file being retrieved over a passive data channel.
///
/// The stream holds the session exclusively until it is drained or closed.
/// Chunks are at most `chunk_size` bytes and the sequence ends at the first
/// empty read, after which the completion reply is consumed from the control
/// channel. Dropping the stream before that point closes the data channel and
/// leaves the session disconnected, as the pending completion reply would be
/// read as the reply of the next command.
pub struct FtpFileStream<'a, CP, S>
where
    CP: FtpConnectionProvider<S> + Send,
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    session: &'a mut FtpSession<CP, S>,
    data: Option<S>,
    chunk_size: usize,
    read_timeout: Duration,
    received: u64,
    finished: bool,
}

impl<'a, CP, S> FtpFileStream<'a, CP, S>
where
    CP: FtpConnectionProvider<S> + Send,
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub(crate) fn new(
        session: &'a mut FtpSession<CP, S>,
        data: S,
        chunk_size: usize,
        read_timeout: Duration,
    ) -> Self {
        FtpFileStream {
            session,
            data: Some(data),
            chunk_size,
            read_timeout,
            received: 0,
            finished: false,
        }
    }

    /// Bytes received so far
    #[inline]
    pub fn received_bytes(&self) -> u64 {
        self.received
    }

    /// Whether the transfer has ended, normally or not
    #[inline]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Returns `Ok(None)` once the server has sent the whole file
    pub async fn next_chunk(&mut self) -> Result<Option<Bytes>, FtpFileStreamError> {
        let Some(data) = self.data.as_mut() else {
            return Ok(None);
        };

        let mut buf = vec![0u8; self.chunk_size];
        match tokio::time::timeout(self.read_timeout, data.read(&mut buf)).await {
            Ok(Ok(0)) => {
                self.data = None;
                self.session.end_transfer(FtpCommand::RETR).await;
                self.finished = true;
                debug!("retrieved {} bytes", self.received);
                Ok(None)
            }
            Ok(Ok(n)) => {
                buf.truncate(n);
                self.received += n as u64;
                Ok(Some(Bytes::from(buf)))
            }
            Ok(Err(e)) => {
                self.abandon();
                Err(FtpFileStreamError::ReadFailed(e))
            }
            Err(_) => {
                self.abandon();
                Err(FtpFileStreamError::ReadTimedOut)
            }
        }
    }

    /// Close the data channel, and wait for the server to acknowledge the end
    /// of the transfer so the session can be reused
    pub async fn close(mut self) {
        if self.finished {
            return;
        }
        if self.data.take().is_some() {
            debug!(
                "data channel closed by client after {} bytes",
                self.received
            );
        }
        self.session.end_transfer(FtpCommand::RETR).await;
        self.finished = true;
    }

    fn abandon(&mut self) {
        self.data = None;
        if !self.finished {
            self.finished = true;
            self.session.set_disconnected();
        }
    }
}

impl<CP, S> Drop for FtpFileStream<'_, CP, S>
where
    CP: FtpConnectionProvider<S> + Send,
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    fn drop(&mut self) {
        if !self.finished {
            warn!(
                "file stream dropped after {} bytes without close, session discarded",
                self.received
            );
            self.abandon();
        }
    }
}
