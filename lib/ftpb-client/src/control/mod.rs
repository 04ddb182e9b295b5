/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::str::FromStr;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, BufStream};

use crate::FtpClientConfig;
use crate::error::{FtpCommandError, FtpFileRetrieveStartError, FtpRawResponseError};
use crate::transfer::FtpPassiveEndpoint;

mod response;

mod command;
pub use command::FtpCommand;

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum FtpAuthStatus {
    LoggedIn,
    NeedPassword,
    NeedAccount,
    Rejected(u16),
}

pub(crate) struct FtpControlChannel<T>
where
    T: AsyncRead + AsyncWrite,
{
    command_timeout: Duration,
    stream: BufStream<T>,
}

impl<T> FtpControlChannel<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    pub(crate) fn new(stream: T, config: &FtpClientConfig) -> Self {
        FtpControlChannel {
            command_timeout: config.command_timeout,
            stream: BufStream::new(stream),
        }
    }

    pub(crate) async fn wait_greetings(&mut self) -> Result<(), FtpCommandError> {
        loop {
            let reply = self.read_raw_response().await?;
            return match reply.code() {
                120 => continue,
                220 => Ok(()),
                421 => Err(FtpCommandError::ServiceNotAvailable),
                n => Err(FtpCommandError::UnexpectedReplyCode(
                    FtpCommand::GREETING,
                    n,
                )),
            };
        }
    }

    pub(crate) async fn send_username(
        &mut self,
        username: &str,
    ) -> Result<FtpAuthStatus, FtpCommandError> {
        let cmd = FtpCommand::USER;
        self.send_cmd1(cmd, username)
            .await
            .map_err(|e| FtpCommandError::SendFailed(cmd, e))?;

        let reply = self.timed_read_raw_response("send username").await?;
        match reply.code() {
            230 => Ok(FtpAuthStatus::LoggedIn),
            331 => Ok(FtpAuthStatus::NeedPassword),
            332 => Ok(FtpAuthStatus::NeedAccount),
            421 => Err(FtpCommandError::ServiceNotAvailable),
            n => Ok(FtpAuthStatus::Rejected(n)),
        }
    }

    pub(crate) async fn send_password(
        &mut self,
        password: &str,
    ) -> Result<FtpAuthStatus, FtpCommandError> {
        let cmd = FtpCommand::PASS;
        self.send_cmd1(cmd, password)
            .await
            .map_err(|e| FtpCommandError::SendFailed(cmd, e))?;

        let reply = self.timed_read_raw_response("send password").await?;
        match reply.code() {
            230 => Ok(FtpAuthStatus::LoggedIn),
            332 => Ok(FtpAuthStatus::NeedAccount),
            421 => Err(FtpCommandError::ServiceNotAvailable),
            n => Ok(FtpAuthStatus::Rejected(n)),
        }
    }

    pub(crate) async fn request_binary_type(&mut self) -> Result<(), FtpCommandError> {
        let cmd = FtpCommand::TYPE_I;
        self.send_cmd(cmd)
            .await
            .map_err(|e| FtpCommandError::SendFailed(cmd, e))?;

        let reply = self.timed_read_raw_response("request binary type").await?;
        match reply.code() {
            200 => Ok(()),
            421 => Err(FtpCommandError::ServiceNotAvailable),
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n)),
        }
    }

    pub(crate) async fn change_dir(&mut self, path: &str) -> Result<(), FtpCommandError> {
        let cmd = FtpCommand::CWD;
        self.send_cmd1(cmd, path)
            .await
            .map_err(|e| FtpCommandError::SendFailed(cmd, e))?;

        let reply = self.timed_read_raw_response("change dir").await?;
        match reply.code() {
            250 => Ok(()),
            421 => Err(FtpCommandError::ServiceNotAvailable),
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n)),
        }
    }

    /// Every reply other than 213 means the size is unknown
    pub(crate) async fn request_size(&mut self, path: &str) -> Result<Option<u64>, FtpCommandError> {
        let cmd = FtpCommand::SIZE;
        self.send_cmd1(cmd, path)
            .await
            .map_err(|e| FtpCommandError::SendFailed(cmd, e))?;

        let reply = self.timed_read_raw_response("request size").await?;
        match reply.code() {
            213 => Ok(u64::from_str(reply.line_trimmed()).ok()),
            _ => Ok(None),
        }
    }

    pub(crate) async fn request_pasv_port(
        &mut self,
    ) -> Result<FtpPassiveEndpoint, FtpCommandError> {
        let cmd = FtpCommand::PASV;
        self.send_cmd(cmd)
            .await
            .map_err(|e| FtpCommandError::SendFailed(cmd, e))?;

        let reply = self.timed_read_raw_response("request pasv port").await?;
        match reply.code() {
            227 => reply
                .lines()
                .iter()
                .find_map(|line| FtpPassiveEndpoint::parse_pasv_reply(line))
                .ok_or(FtpCommandError::InvalidReplySyntax(cmd, 227)),
            421 => Err(FtpCommandError::ServiceNotAvailable),
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n)),
        }
    }

    pub(crate) async fn start_list(&mut self) -> Result<(), FtpCommandError> {
        let cmd = FtpCommand::LIST;
        self.send_cmd(cmd)
            .await
            .map_err(|e| FtpCommandError::SendFailed(cmd, e))?;

        let reply = self.timed_read_raw_response("start list").await?;
        match reply.code() {
            125 | 150 => Ok(()),
            421 => Err(FtpCommandError::ServiceNotAvailable),
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n)),
        }
    }

    pub(crate) async fn start_retrieve(
        &mut self,
        path: &str,
    ) -> Result<(), FtpFileRetrieveStartError> {
        let cmd = FtpCommand::RETR;
        self.send_cmd1(cmd, path)
            .await
            .map_err(|e| FtpCommandError::SendFailed(cmd, e))?;

        let reply = self
            .timed_read_raw_response("start retrieve")
            .await
            .map_err(FtpCommandError::RecvFailed)?;
        match reply.code() {
            125 | 150 => Ok(()),
            421 => Err(FtpFileRetrieveStartError::ServiceNotAvailable),
            n @ (450 | 550) => Err(FtpFileRetrieveStartError::FileUnavailable(n)),
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n).into()),
        }
    }

    /// Read the reply that closes a data transfer, returning its code
    pub(crate) async fn wait_transfer_end(
        &mut self,
        timeout: Duration,
    ) -> Result<u16, FtpRawResponseError> {
        let reply = self
            .timed_read_raw_response_in(timeout, "wait transfer end")
            .await?;
        Ok(reply.code())
    }

    pub(crate) async fn send_noop(&mut self) -> Result<bool, FtpCommandError> {
        let cmd = FtpCommand::NOOP;
        self.send_cmd(cmd)
            .await
            .map_err(|e| FtpCommandError::SendFailed(cmd, e))?;

        let reply = self.timed_read_raw_response("send noop").await?;
        Ok(reply.code() == 200)
    }

    pub(crate) async fn send_quit(&mut self) -> Result<(), FtpCommandError> {
        let cmd = FtpCommand::QUIT;
        self.send_cmd(cmd)
            .await
            .map_err(|e| FtpCommandError::SendFailed(cmd, e))?;

        let reply = self.timed_read_raw_response("send quit").await?;
        match reply.code() {
            221 => Ok(()),
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::io::{Builder, Mock};

    fn new_channel(stream: Mock) -> FtpControlChannel<Mock> {
        FtpControlChannel::new(stream, &FtpClientConfig::default())
    }

    #[tokio::test]
    async fn greetings() {
        let stream = Builder::new()
            .read(b"120 wait a moment\r\n")
            .read(b"220 ready\r\n")
            .build();
        let mut channel = new_channel(stream);
        channel.wait_greetings().await.unwrap();

        let stream = Builder::new().read(b"421 too many users\r\n").build();
        let mut channel = new_channel(stream);
        assert!(matches!(
            channel.wait_greetings().await,
            Err(FtpCommandError::ServiceNotAvailable)
        ));

        let stream = Builder::new().read(b"500 nope\r\n").build();
        let mut channel = new_channel(stream);
        assert!(matches!(
            channel.wait_greetings().await,
            Err(FtpCommandError::UnexpectedReplyCode(FtpCommand::GREETING, 500))
        ));
    }

    #[tokio::test]
    async fn user_and_pass() {
        let stream = Builder::new()
            .write(b"USER bob\r\n")
            .read(b"331 password please\r\n")
            .write(b"PASS secret\r\n")
            .read(b"230 logged in\r\n")
            .build();
        let mut channel = new_channel(stream);
        assert_eq!(
            channel.send_username("bob").await.unwrap(),
            FtpAuthStatus::NeedPassword
        );
        assert_eq!(
            channel.send_password("secret").await.unwrap(),
            FtpAuthStatus::LoggedIn
        );
    }

    #[tokio::test]
    async fn user_rejected() {
        let stream = Builder::new()
            .write(b"USER bob\r\n")
            .read(b"530 not allowed\r\n")
            .build();
        let mut channel = new_channel(stream);
        assert_eq!(
            channel.send_username("bob").await.unwrap(),
            FtpAuthStatus::Rejected(530)
        );
    }

    #[tokio::test]
    async fn size_reply() {
        let stream = Builder::new()
            .write(b"SIZE /a.bin\r\n")
            .read(b"213 123456\r\n")
            .write(b"SIZE /b.bin\r\n")
            .read(b"550 no such file\r\n")
            .write(b"SIZE /c.bin\r\n")
            .read(b"502 not implemented\r\n")
            .write(b"SIZE /d.bin\r\n")
            .read(b"213 huge\r\n")
            .build();
        let mut channel = new_channel(stream);
        assert_eq!(channel.request_size("/a.bin").await.unwrap(), Some(123456));
        assert_eq!(channel.request_size("/b.bin").await.unwrap(), None);
        assert_eq!(channel.request_size("/c.bin").await.unwrap(), None);
        assert_eq!(channel.request_size("/d.bin").await.unwrap(), None);
    }

    #[tokio::test]
    async fn pasv_reply() {
        let stream = Builder::new()
            .write(b"PASV\r\n")
            .read(b"227 Entering Passive Mode (192,168,1,10,200,15)\r\n")
            .write(b"PASV\r\n")
            .read(b"227 Entering Passive Mode (192,168,1)\r\n")
            .write(b"PASV\r\n")
            .read(b"502 no passive\r\n")
            .build();
        let mut channel = new_channel(stream);
        let endpoint = channel.request_pasv_port().await.unwrap();
        assert_eq!(endpoint.addr().to_string(), "192.168.1.10:51215");
        assert!(matches!(
            channel.request_pasv_port().await,
            Err(FtpCommandError::InvalidReplySyntax(FtpCommand::PASV, 227))
        ));
        assert!(matches!(
            channel.request_pasv_port().await,
            Err(FtpCommandError::UnexpectedReplyCode(FtpCommand::PASV, 502))
        ));
    }

    #[tokio::test]
    async fn retrieve_start() {
        let stream = Builder::new()
            .write(b"RETR /missing\r\n")
            .read(b"550 not found\r\n")
            .write(b"RETR /file\r\n")
            .read(b"125 already open\r\n")
            .build();
        let mut channel = new_channel(stream);
        assert!(matches!(
            channel.start_retrieve("/missing").await,
            Err(FtpFileRetrieveStartError::FileUnavailable(550))
        ));
        channel.start_retrieve("/file").await.unwrap();
    }

    #[tokio::test]
    async fn send_failed_without_peer() {
        let stream = Builder::new()
            .write_error(std::io::Error::from(std::io::ErrorKind::BrokenPipe))
            .build();
        let mut channel = new_channel(stream);
        assert!(matches!(
            channel.send_noop().await,
            Err(FtpCommandError::SendFailed(FtpCommand::NOOP, _))
        ));
    }
}
