/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fmt;

use log::{debug, error, warn};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::control::{FtpAuthStatus, FtpCommand, FtpControlChannel};
use crate::error::{
    FtpAuthError, FtpCommandError, FtpConnectError, FtpFileRetrieveStartError,
    FtpRawResponseError, FtpTransferSetupError,
};
use crate::listing::{FtpDirEntry, parse_listing};
use crate::transfer::{FtpFileStream, read_data_to_end};
use crate::{FtpClientConfig, FtpConnectionProvider};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FtpSessionState {
    Disconnected,
    /// greeting received
    Connected,
    /// logged in and in binary mode
    Authenticated,
    Transferring,
}

impl fmt::Display for FtpSessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FtpSessionState::Disconnected => f.write_str("disconnected"),
            FtpSessionState::Connected => f.write_str("connected"),
            FtpSessionState::Authenticated => f.write_str("authenticated"),
            FtpSessionState::Transferring => f.write_str("transferring"),
        }
    }
}

fn is_root_path(path: &str) -> bool {
    path.is_empty() || path == "/"
}

/// A logical connection to one FTP server.
///
/// Commands on the control channel are strictly sequential, so every method
/// takes `&mut self` and a download keeps the session borrowed until its
/// stream is finished. Use one session per concurrent activity.
pub struct FtpSession<CP, S>
where
    CP: FtpConnectionProvider<S> + Send,
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    host: String,
    port: u16,
    config: FtpClientConfig,
    provider: CP,
    control: Option<FtpControlChannel<S>>,
    state: FtpSessionState,
    /// directory set by the last successful CWD, None for the login directory
    work_dir: Option<String>,
}

impl<CP, S> FtpSession<CP, S>
where
    CP: FtpConnectionProvider<S> + Send,
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub fn new(host: &str, port: u16, provider: CP, config: FtpClientConfig) -> Self {
        FtpSession {
            host: host.to_string(),
            port,
            config,
            provider,
            control: None,
            state: FtpSessionState::Disconnected,
            work_dir: None,
        }
    }

    #[inline]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[inline]
    pub fn port(&self) -> u16 {
        self.port
    }

    #[inline]
    pub fn state(&self) -> FtpSessionState {
        self.state
    }

    #[inline]
    pub fn config(&self) -> &FtpClientConfig {
        &self.config
    }

    pub(crate) fn set_disconnected(&mut self) {
        if self.control.take().is_some() {
            debug!("control channel to {}:{} dropped", self.host, self.port);
        }
        self.state = FtpSessionState::Disconnected;
        self.work_dir = None;
    }

    /// Drop the control channel if the error left it in an unknown state
    fn check_command_error(&mut self, e: FtpCommandError) -> FtpCommandError {
        if e.is_fatal() {
            self.set_disconnected();
        }
        e
    }

    fn ready_control(&mut self) -> Result<&mut FtpControlChannel<S>, FtpCommandError> {
        match self.state {
            FtpSessionState::Authenticated => {}
            FtpSessionState::Disconnected => return Err(FtpCommandError::NotConnected),
            FtpSessionState::Connected | FtpSessionState::Transferring => {
                return Err(FtpCommandError::NotLoggedIn);
            }
        }
        self.control.as_mut().ok_or(FtpCommandError::NotConnected)
    }

    /// Open the control connection and wait for the server greeting
    pub async fn connect(&mut self) -> Result<(), FtpConnectError> {
        self.set_disconnected();

        let stream = match tokio::time::timeout(
            self.config.connect_timeout,
            self.provider.new_control_connection(&self.host, self.port),
        )
        .await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return Err(FtpConnectError::ConnectIoError(e)),
            Err(_) => return Err(FtpConnectError::ConnectTimedOut),
        };

        let mut control = FtpControlChannel::new(stream, &self.config);
        match tokio::time::timeout(self.config.greeting_timeout, control.wait_greetings()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => return Err(FtpConnectError::GreetingTimedOut),
        }

        debug!("connected to ftp server {}:{}", self.host, self.port);
        self.control = Some(control);
        self.state = FtpSessionState::Connected;
        Ok(())
    }

    /// Authenticate and switch to binary transfer mode
    pub async fn login(&mut self, username: &str, password: &str) -> Result<(), FtpAuthError> {
        if self.state != FtpSessionState::Connected {
            return Err(FtpAuthError::RawCommandError(FtpCommandError::NotConnected));
        }
        let Some(control) = self.control.as_mut() else {
            return Err(FtpAuthError::RawCommandError(FtpCommandError::NotConnected));
        };

        if let Err(e) = Self::do_login(control, username, password).await {
            let fatal = match &e {
                FtpAuthError::RawCommandError(e) => e.is_fatal(),
                FtpAuthError::ServiceNotAvailable => true,
                _ => false,
            };
            if fatal {
                self.set_disconnected();
            }
            return Err(e);
        }

        debug!("logged in to {}:{} as {username}", self.host, self.port);
        self.state = FtpSessionState::Authenticated;
        Ok(())
    }

    async fn do_login(
        control: &mut FtpControlChannel<S>,
        username: &str,
        password: &str,
    ) -> Result<(), FtpAuthError> {
        match control.send_username(username).await? {
            FtpAuthStatus::LoggedIn => {}
            FtpAuthStatus::NeedPassword => match control.send_password(password).await? {
                FtpAuthStatus::LoggedIn => {}
                FtpAuthStatus::NeedAccount => return Err(FtpAuthError::AccountIsNeeded),
                FtpAuthStatus::NeedPassword => return Err(FtpAuthError::PasswordRejected(331)),
                FtpAuthStatus::Rejected(code) => return Err(FtpAuthError::PasswordRejected(code)),
            },
            FtpAuthStatus::NeedAccount => return Err(FtpAuthError::AccountIsNeeded),
            FtpAuthStatus::Rejected(code) => return Err(FtpAuthError::UserRejected(code)),
        }

        match control.request_binary_type().await {
            Ok(()) => Ok(()),
            Err(FtpCommandError::UnexpectedReplyCode(_, code)) => {
                Err(FtpAuthError::BinaryModeRejected(code))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Returns true only if the server answered NOOP with 200
    pub async fn is_reusable(&mut self) -> bool {
        let Ok(control) = self.ready_control() else {
            return false;
        };
        match control.send_noop().await {
            Ok(true) => true,
            Ok(false) => {
                debug!("health check of {}:{} failed", self.host, self.port);
                false
            }
            Err(e) => {
                debug!("health check of {}:{} failed: {e}", self.host, self.port);
                self.check_command_error(e);
                false
            }
        }
    }

    /// Send QUIT and drop the control connection, errors are ignored
    pub async fn close(&mut self) {
        if let Some(mut control) = self.control.take() {
            let timeout = self.config.command_timeout;
            match tokio::time::timeout(timeout, control.send_quit()).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => debug!("quit {}:{} failed: {e}", self.host, self.port),
                Err(_) => debug!("quit {}:{} timed out", self.host, self.port),
            }
        }
        self.set_disconnected();
    }

    async fn open_data_channel(&mut self) -> Result<S, FtpTransferSetupError> {
        let control = self.ready_control()?;
        let mut endpoint = match control.request_pasv_port().await {
            Ok(endpoint) => endpoint,
            Err(e) => return Err(self.check_command_error(e).into()),
        };
        if self.config.pasv_use_control_ip {
            if let Some(ip) = self.provider.control_peer_ip() {
                endpoint = endpoint.with_ip(ip);
            }
        }

        let addr = endpoint.addr();
        match tokio::time::timeout(
            self.config.connect_timeout,
            self.provider.new_data_connection(addr),
        )
        .await
        {
            Ok(Ok(stream)) => Ok(stream),
            Ok(Err(e)) => Err(FtpTransferSetupError::DataConnectFailed(addr, e)),
            Err(_) => Err(FtpTransferSetupError::DataConnectTimedOut(addr)),
        }
    }

    /// Consume the completion reply of a transfer whose data channel is closed
    pub(crate) async fn end_transfer(&mut self, cmd: FtpCommand) {
        let timeout = self.config.end_wait_timeout;
        let Some(control) = self.control.as_mut() else {
            return;
        };
        match control.wait_transfer_end(timeout).await {
            Ok(226 | 250) => self.state = FtpSessionState::Authenticated,
            Ok(code) => {
                warn!("transfer completion reply for {cmd} not received, got {code}");
                self.state = FtpSessionState::Authenticated;
            }
            Err(FtpRawResponseError::ReadResponseTimedOut(stage)) => {
                warn!("transfer completion reply for {cmd} not received ({stage} timed out)");
                self.state = FtpSessionState::Authenticated;
            }
            Err(e) => {
                error!("failed to read transfer completion reply for {cmd}: {e}");
                self.set_disconnected();
            }
        }
    }

    /// List a directory.
    ///
    /// An inaccessible path or a refused transfer yields an empty listing;
    /// only the loss of the control channel is an error. A broken data channel
    /// also yields an empty listing, but leaves the session disconnected.
    /// Entries are in the order sent by the server.
    pub async fn list_directory(&mut self, path: &str) -> Result<Vec<FtpDirEntry>, FtpCommandError> {
        let target = if is_root_path(path) {
            // only needed if a previous listing moved away from the login dir
            match &self.work_dir {
                Some(dir) if !is_root_path(dir) => Some("/"),
                _ => None,
            }
        } else {
            Some(path)
        };

        let control = self.ready_control()?;
        if let Some(dir) = target {
            match control.change_dir(dir).await {
                Ok(()) => self.work_dir = Some(dir.to_string()),
                Err(e) if e.is_fatal() => return Err(self.check_command_error(e)),
                Err(e) => {
                    error!("failed to change directory to {dir}: {e}");
                    return Ok(Vec::new());
                }
            }
        }

        let mut data = match self.open_data_channel().await {
            Ok(stream) => stream,
            Err(FtpTransferSetupError::PassiveCommandFailed(e)) if e.is_fatal() => return Err(e),
            Err(e) => {
                error!("failed to open data channel to list {path}: {e}");
                return Ok(Vec::new());
            }
        };

        let control = self.ready_control()?;
        if let Err(e) = control.start_list().await {
            if e.is_fatal() {
                return Err(self.check_command_error(e));
            }
            error!("failed to list directory {path}: {e}");
            return Ok(Vec::new());
        }
        self.state = FtpSessionState::Transferring;

        let mut buf = Vec::new();
        let drained = read_data_to_end(&mut data, self.config.transfer_timeout, &mut buf).await;
        drop(data);
        if let Err(e) = drained {
            // the completion reply can not be matched to this transfer any more
            error!("failed to receive listing of {path}: {e}");
            self.set_disconnected();
            return Ok(Vec::new());
        }
        self.end_transfer(FtpCommand::LIST).await;

        let text = String::from_utf8_lossy(&buf);
        Ok(parse_listing(path, &text))
    }

    /// Query the size of a file, `Ok(None)` if the server can not tell
    pub async fn file_size(&mut self, path: &str) -> Result<Option<u64>, FtpCommandError> {
        let control = self.ready_control()?;
        match control.request_size(path).await {
            Ok(size) => Ok(size),
            Err(e) => Err(self.check_command_error(e)),
        }
    }

    /// Start retrieving a file, see [`FtpFileStream`] for the ownership rules
    pub async fn download(
        &mut self,
        path: &str,
    ) -> Result<FtpFileStream<'_, CP, S>, FtpFileRetrieveStartError> {
        let data = self.open_data_channel().await?;

        let control = self.ready_control()?;
        if let Err(e) = control.start_retrieve(path).await {
            let fatal = match &e {
                FtpFileRetrieveStartError::CommandError(e) => e.is_fatal(),
                FtpFileRetrieveStartError::ServiceNotAvailable => true,
                _ => false,
            };
            if fatal {
                self.set_disconnected();
            }
            return Err(e);
        }
        self.state = FtpSessionState::Transferring;

        let chunk_size = self.config.chunk_size;
        let read_timeout = self.config.transfer_timeout;
        Ok(FtpFileStream::new(self, data, chunk_size, read_timeout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::io;
    use std::net::{IpAddr, Ipv4Addr, SocketAddr};

    use async_trait::async_trait;
    use tokio_test::io::{Builder, Mock};

    use crate::FtpEntryKind;

    const PASV_REPLY: &[u8] = b"227 Entering Passive Mode (127,0,0,1,200,10)\r\n";

    #[derive(Default)]
    struct MockProvider {
        control: Option<Mock>,
        data: VecDeque<Mock>,
        data_addrs: Vec<SocketAddr>,
        peer_ip: Option<IpAddr>,
    }

    #[async_trait]
    impl FtpConnectionProvider<Mock> for MockProvider {
        async fn new_control_connection(&mut self, _host: &str, _port: u16) -> io::Result<Mock> {
            self.control
                .take()
                .ok_or_else(|| io::Error::from(io::ErrorKind::ConnectionRefused))
        }

        async fn new_data_connection(&mut self, addr: SocketAddr) -> io::Result<Mock> {
            self.data_addrs.push(addr);
            self.data
                .pop_front()
                .ok_or_else(|| io::Error::from(io::ErrorKind::ConnectionRefused))
        }

        fn control_peer_ip(&self) -> Option<IpAddr> {
            self.peer_ip
        }
    }

    fn login_script(builder: &mut Builder) -> &mut Builder {
        builder
            .read(b"220 ready\r\n")
            .write(b"USER demo\r\n")
            .read(b"331 password required\r\n")
            .write(b"PASS secret\r\n")
            .read(b"230 logged in\r\n")
            .write(b"TYPE I\r\n")
            .read(b"200 type set to I\r\n")
    }

    fn new_session(control: Mock, data: Vec<Mock>) -> FtpSession<MockProvider, Mock> {
        let provider = MockProvider {
            control: Some(control),
            data: data.into(),
            ..Default::default()
        };
        FtpSession::new("ftp.example.net", 21, provider, FtpClientConfig::default())
    }

    async fn logged_in(control: Mock, data: Vec<Mock>) -> FtpSession<MockProvider, Mock> {
        let mut session = new_session(control, data);
        session.connect().await.unwrap();
        assert_eq!(session.state(), FtpSessionState::Connected);
        session.login("demo", "secret").await.unwrap();
        assert_eq!(session.state(), FtpSessionState::Authenticated);
        session
    }

    #[tokio::test]
    async fn connect_refused() {
        let mut session: FtpSession<MockProvider, Mock> = FtpSession::new(
            "ftp.example.net",
            21,
            MockProvider::default(),
            FtpClientConfig::default(),
        );
        let e = session.connect().await.unwrap_err();
        assert!(matches!(e, FtpConnectError::ConnectIoError(_)));
        assert_eq!(session.state(), FtpSessionState::Disconnected);
    }

    #[tokio::test]
    async fn connect_service_not_available() {
        let control = Builder::new().read(b"421 too many users\r\n").build();
        let mut session = new_session(control, vec![]);
        let e = session.connect().await.unwrap_err();
        assert!(matches!(e, FtpConnectError::ServiceNotAvailable));
        assert_eq!(session.state(), FtpSessionState::Disconnected);
    }

    #[tokio::test]
    async fn user_rejected_without_password() {
        let control = Builder::new()
            .read(b"220 ready\r\n")
            .write(b"USER demo\r\n")
            .read(b"530 not allowed\r\n")
            .build();
        let mut session = new_session(control, vec![]);
        session.connect().await.unwrap();
        let e = session.login("demo", "secret").await.unwrap_err();
        assert!(matches!(e, FtpAuthError::UserRejected(530)));
        assert_eq!(session.state(), FtpSessionState::Connected);
    }

    #[tokio::test]
    async fn password_rejected() {
        let control = Builder::new()
            .read(b"220 ready\r\n")
            .write(b"USER demo\r\n")
            .read(b"331 password required\r\n")
            .write(b"PASS wrong\r\n")
            .read(b"530 login incorrect\r\n")
            .build();
        let mut session = new_session(control, vec![]);
        session.connect().await.unwrap();
        let e = session.login("demo", "wrong").await.unwrap_err();
        assert!(matches!(e, FtpAuthError::PasswordRejected(530)));
    }

    #[tokio::test]
    async fn login_without_password() {
        let control = Builder::new()
            .read(b"220 ready\r\n")
            .write(b"USER anonymous\r\n")
            .read(b"230 welcome\r\n")
            .write(b"TYPE I\r\n")
            .read(b"200 ok\r\n")
            .build();
        let mut session = new_session(control, vec![]);
        session.connect().await.unwrap();
        session.login("anonymous", "").await.unwrap();
        assert_eq!(session.state(), FtpSessionState::Authenticated);
    }

    #[tokio::test]
    async fn binary_mode_rejected() {
        let control = Builder::new()
            .read(b"220 ready\r\n")
            .write(b"USER demo\r\n")
            .read(b"230 welcome\r\n")
            .write(b"TYPE I\r\n")
            .read(b"504 not implemented\r\n")
            .build();
        let mut session = new_session(control, vec![]);
        session.connect().await.unwrap();
        let e = session.login("demo", "secret").await.unwrap_err();
        assert!(matches!(e, FtpAuthError::BinaryModeRejected(504)));
        assert_eq!(session.state(), FtpSessionState::Connected);
    }

    #[tokio::test]
    async fn commands_need_login() {
        let mut session = new_session(Builder::new().build(), vec![]);
        let e = session.list_directory("/").await.unwrap_err();
        assert!(matches!(e, FtpCommandError::NotConnected));
        let e = session.file_size("/a").await.unwrap_err();
        assert!(matches!(e, FtpCommandError::NotConnected));
        assert!(!session.is_reusable().await);
    }

    #[tokio::test]
    async fn list_root_then_subdir_then_root() {
        let control = login_script(&mut Builder::new())
            // fresh root listing, no CWD
            .write(b"PASV\r\n")
            .read(PASV_REPLY)
            .write(b"LIST\r\n")
            .read(b"150 here comes the listing\r\n")
            .read(b"226 transfer complete\r\n")
            .write(b"CWD /music\r\n")
            .read(b"250 ok\r\n")
            .write(b"PASV\r\n")
            .read(PASV_REPLY)
            .write(b"LIST\r\n")
            .read(b"125 data connection already open\r\n")
            .read(b"226 transfer complete\r\n")
            .write(b"CWD /\r\n")
            .read(b"250 ok\r\n")
            .write(b"PASV\r\n")
            .read(PASV_REPLY)
            .write(b"LIST\r\n")
            .read(b"150 here comes the listing\r\n")
            .read(b"226 transfer complete\r\n")
            .build();
        let root = Builder::new()
            .read(b"drwxr-xr-x 2 user group 4096 Jan 01 12:00 music\r\n")
            .read(b"-rw-r--r-- 1 user group 1048576 Jan 01 12:00 report.pdf\r\n")
            .build();
        let music = Builder::new()
            .read(b"-rw-r--r-- 1 user group 5000000 Feb 02 08:30 track.mp3\r\n")
            .build();
        let root_again = Builder::new().build();
        let mut session = logged_in(control, vec![root, music, root_again]).await;

        let entries = session.list_directory("/").await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name(), "music");
        assert_eq!(entries[0].path(), "/music");
        assert_eq!(entries[0].kind(), FtpEntryKind::Directory);
        assert_eq!(entries[1].name(), "report.pdf");
        assert_eq!(entries[1].path(), "/report.pdf");
        assert_eq!(entries[1].size(), 1048576);
        assert_eq!(session.state(), FtpSessionState::Authenticated);

        let entries = session.list_directory("/music").await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].path(), "/music/track.mp3");
        assert_eq!(entries[0].kind(), FtpEntryKind::File);
        assert_eq!(entries[0].size(), 5000000);

        let entries = session.list_directory("/").await.unwrap();
        assert!(entries.is_empty());

        let data_addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 51210);
        assert_eq!(session.provider.data_addrs, vec![data_addr; 3]);
    }

    #[tokio::test]
    async fn list_missing_dir() {
        let control = login_script(&mut Builder::new())
            .write(b"CWD /missing\r\n")
            .read(b"550 no such directory\r\n")
            .write(b"NOOP\r\n")
            .read(b"200 ok\r\n")
            .build();
        let mut session = logged_in(control, vec![]).await;
        let entries = session.list_directory("/missing").await.unwrap();
        assert!(entries.is_empty());
        assert_eq!(session.state(), FtpSessionState::Authenticated);
        assert!(session.is_reusable().await);
    }

    #[tokio::test]
    async fn list_data_reset() {
        let control = login_script(&mut Builder::new())
            .write(b"PASV\r\n")
            .read(PASV_REPLY)
            .write(b"LIST\r\n")
            .read(b"150 here comes the listing\r\n")
            .build();
        let data = Builder::new()
            .read(b"drwxr-xr-x 2 user group 4096 Jan 01 12:00 music\r\n")
            .read_error(io::Error::from(io::ErrorKind::ConnectionReset))
            .build();
        let mut session = logged_in(control, vec![data]).await;

        let entries = session.list_directory("/").await.unwrap();
        assert!(entries.is_empty());
        assert_eq!(session.state(), FtpSessionState::Disconnected);
        assert!(matches!(
            session.list_directory("/").await,
            Err(FtpCommandError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn list_control_closed() {
        let control = login_script(&mut Builder::new())
            .write(b"CWD /music\r\n")
            .build();
        let mut session = logged_in(control, vec![]).await;
        let e = session.list_directory("/music").await.unwrap_err();
        assert!(e.is_fatal());
        assert_eq!(session.state(), FtpSessionState::Disconnected);
    }

    #[tokio::test]
    async fn pasv_use_control_ip() {
        let control = login_script(&mut Builder::new())
            .write(b"PASV\r\n")
            .read(b"227 Entering Passive Mode (192,168,1,10,200,15)\r\n")
            .write(b"LIST\r\n")
            .read(b"150 ok\r\n")
            .read(b"226 done\r\n")
            .build();
        let mut session = logged_in(control, vec![Builder::new().build()]).await;
        session.config.set_pasv_use_control_ip(true);
        let peer_ip = IpAddr::V4(Ipv4Addr::new(203, 0, 113, 7));
        session.provider.peer_ip = Some(peer_ip);

        let entries = session.list_directory("").await.unwrap();
        assert!(entries.is_empty());
        assert_eq!(
            session.provider.data_addrs,
            vec![SocketAddr::new(peer_ip, 51215)]
        );
    }

    #[tokio::test]
    async fn file_size() {
        let control = login_script(&mut Builder::new())
            .write(b"SIZE /report.pdf\r\n")
            .read(b"213 1048576\r\n")
            .write(b"SIZE /missing\r\n")
            .read(b"550 no such file\r\n")
            .write(b"SIZE /music\r\n")
            .read(b"213 not a number\r\n")
            .build();
        let mut session = logged_in(control, vec![]).await;
        assert_eq!(session.file_size("/report.pdf").await.unwrap(), Some(1048576));
        assert_eq!(session.file_size("/missing").await.unwrap(), None);
        assert_eq!(session.file_size("/music").await.unwrap(), None);
        assert_eq!(session.state(), FtpSessionState::Authenticated);
    }

    fn retr_script(builder: &mut Builder, path: &str, end_reply: &'static [u8]) -> Mock {
        let retr = format!("RETR {path}\r\n");
        builder
            .write(b"PASV\r\n")
            .read(PASV_REPLY)
            .write(retr.as_bytes())
            .read(b"150 opening binary mode data connection\r\n")
            .read(end_reply)
            .build()
    }

    async fn download_all(size: usize) -> (Vec<usize>, Vec<u8>) {
        let content: Vec<u8> = (0..size).map(|i| (i % 251) as u8).collect();
        let control = retr_script(
            login_script(&mut Builder::new()),
            "/report.pdf",
            b"226 transfer complete\r\n",
        );
        let mut data = Builder::new();
        if !content.is_empty() {
            data.read(&content);
        }
        let mut session = logged_in(control, vec![data.build()]).await;

        let mut sizes = Vec::new();
        let mut received = Vec::new();
        let mut stream = session.download("/report.pdf").await.unwrap();
        while let Some(chunk) = stream.next_chunk().await.unwrap() {
            sizes.push(chunk.len());
            received.extend_from_slice(&chunk);
        }
        assert!(stream.is_finished());
        assert_eq!(stream.received_bytes(), size as u64);
        assert!(stream.next_chunk().await.unwrap().is_none());
        drop(stream);
        assert_eq!(session.state(), FtpSessionState::Authenticated);

        assert_eq!(received, content);
        (sizes, received)
    }

    #[tokio::test]
    async fn download_partial_last_chunk() {
        let (sizes, _) = download_all(20000).await;
        assert_eq!(sizes, vec![8192, 8192, 3616]);
    }

    #[tokio::test]
    async fn download_exact_chunks() {
        let (sizes, _) = download_all(16384).await;
        assert_eq!(sizes, vec![8192, 8192]);
    }

    #[tokio::test]
    async fn download_empty_file() {
        let (sizes, received) = download_all(0).await;
        assert!(sizes.is_empty());
        assert!(received.is_empty());
    }

    #[tokio::test]
    async fn download_close_early() {
        let control = retr_script(
            login_script(&mut Builder::new()),
            "/big.iso",
            b"426 transfer aborted\r\n",
        );
        let data = Builder::new().read(&[0u8; 8192]).build();
        let mut session = logged_in(control, vec![data]).await;

        let mut stream = session.download("/big.iso").await.unwrap();
        let chunk = stream.next_chunk().await.unwrap().unwrap();
        assert_eq!(chunk.len(), 8192);
        assert_eq!(stream.received_bytes(), 8192);
        stream.close().await;
        assert_eq!(session.state(), FtpSessionState::Authenticated);
    }

    #[tokio::test]
    async fn download_dropped() {
        let mut control = Builder::new();
        login_script(&mut control)
            .write(b"PASV\r\n")
            .read(PASV_REPLY)
            .write(b"RETR /big.iso\r\n")
            .read(b"150 ok\r\n");
        let data = Builder::new().read(&[0u8; 8192]).build();
        let mut session = logged_in(control.build(), vec![data]).await;

        let mut stream = session.download("/big.iso").await.unwrap();
        let _ = stream.next_chunk().await.unwrap();
        assert!(!stream.is_finished());
        drop(stream);
        assert_eq!(session.state(), FtpSessionState::Disconnected);
        assert!(!session.is_reusable().await);
    }

    #[tokio::test]
    async fn download_missing_file() {
        let control = login_script(&mut Builder::new())
            .write(b"PASV\r\n")
            .read(PASV_REPLY)
            .write(b"RETR /missing\r\n")
            .read(b"550 no such file\r\n")
            .build();
        let mut session = logged_in(control, vec![Builder::new().build()]).await;
        let e = session.download("/missing").await.err().unwrap();
        assert!(matches!(e, FtpFileRetrieveStartError::FileUnavailable(550)));
        assert_eq!(session.state(), FtpSessionState::Authenticated);
    }

    #[tokio::test]
    async fn download_data_connect_failed() {
        let control = login_script(&mut Builder::new())
            .write(b"PASV\r\n")
            .read(PASV_REPLY)
            .build();
        let mut session = logged_in(control, vec![]).await;
        let e = session.download("/report.pdf").await.err().unwrap();
        match e {
            FtpFileRetrieveStartError::TransferSetupFailed(e) => assert!(e.control_usable()),
            e => panic!("unexpected error: {e}"),
        }
        assert_eq!(session.state(), FtpSessionState::Authenticated);
    }

    #[tokio::test]
    async fn noop_rejected() {
        let control = login_script(&mut Builder::new())
            .write(b"NOOP\r\n")
            .read(b"502 not implemented\r\n")
            .build();
        let mut session = logged_in(control, vec![]).await;
        assert!(!session.is_reusable().await);
    }

    #[tokio::test]
    async fn close_session() {
        let control = login_script(&mut Builder::new())
            .write(b"QUIT\r\n")
            .read(b"221 bye\r\n")
            .build();
        let mut session = logged_in(control, vec![]).await;
        session.close().await;
        assert_eq!(session.state(), FtpSessionState::Disconnected);
    }

    #[tokio::test]
    async fn close_after_hang_up() {
        let control = login_script(&mut Builder::new())
            .write_error(io::Error::from(io::ErrorKind::BrokenPipe))
            .build();
        let mut session = logged_in(control, vec![]).await;
        session.close().await;
        assert_eq!(session.state(), FtpSessionState::Disconnected);

        // never connected
        let mut session = new_session(Builder::new().build(), vec![]);
        session.close().await;
        assert_eq!(session.state(), FtpSessionState::Disconnected);
    }
}
