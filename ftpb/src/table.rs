/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::collections::HashMap;

use anyhow::{Context, anyhow};
use log::{debug, info};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

use ftpb_client::{FtpConnectionProvider, FtpSession, TcpConnectionProvider};

use crate::config::FtpServerConfig;

type ProviderBuilder<CP> = Box<dyn Fn(&FtpServerConfig) -> CP>;

/// At most one live session per configured server.
///
/// A cached session is health checked with `NOOP` before it is handed out
/// again, and replaced by a fresh one if the check fails.
pub(crate) struct FtpSessionTable<CP, S>
where
    CP: FtpConnectionProvider<S> + Send,
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    servers: HashMap<String, FtpServerConfig>,
    sessions: HashMap<String, FtpSession<CP, S>>,
    new_provider: ProviderBuilder<CP>,
}

impl FtpSessionTable<TcpConnectionProvider, TcpStream> {
    pub(crate) fn with_tcp(servers: Vec<FtpServerConfig>) -> Self {
        FtpSessionTable::new(
            servers,
            Box::new(|server| {
                let mut provider = TcpConnectionProvider::default();
                if let Some(ip) = server.bind_ip {
                    provider.set_bind_ip(ip);
                }
                provider
            }),
        )
    }
}

impl<CP, S> FtpSessionTable<CP, S>
where
    CP: FtpConnectionProvider<S> + Send,
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub(crate) fn new(servers: Vec<FtpServerConfig>, new_provider: ProviderBuilder<CP>) -> Self {
        let servers = servers
            .into_iter()
            .map(|server| (server.name.clone(), server))
            .collect();
        FtpSessionTable {
            servers,
            sessions: HashMap::new(),
            new_provider,
        }
    }

    pub(crate) fn server(&self, name: &str) -> Option<&FtpServerConfig> {
        self.servers.get(name)
    }

    #[cfg(test)]
    fn session_count(&self) -> usize {
        self.sessions.len()
    }

    async fn open_session(
        server: &FtpServerConfig,
        provider: CP,
    ) -> anyhow::Result<FtpSession<CP, S>> {
        let mut session =
            FtpSession::new(&server.host, server.port, provider, server.client.clone());
        session
            .connect()
            .await
            .context(format!("service unavailable: failed to connect to {}", server.name))?;
        if let Err(e) = session.login(&server.username, &server.password).await {
            session.close().await;
            return Err(anyhow::Error::new(e).context(format!(
                "service unavailable: failed to login to {} as {}",
                server.name, server.username
            )));
        }
        info!("new session to {} ({}:{})", server.name, server.host, server.port);
        Ok(session)
    }

    /// Get a usable session for the server, creating one if needed
    pub(crate) async fn checkout(&mut self, name: &str) -> anyhow::Result<&mut FtpSession<CP, S>> {
        let Some(server) = self.servers.get(name) else {
            return Err(anyhow!("no server named {name}"));
        };

        let reusable = match self.sessions.get_mut(name) {
            Some(session) => session.is_reusable().await,
            None => false,
        };
        if !reusable {
            if let Some(mut stale) = self.sessions.remove(name) {
                debug!("session to {name} is no longer usable, reconnecting");
                stale.close().await;
            }
            let provider = (self.new_provider)(server);
            let session = Self::open_session(server, provider).await?;
            self.sessions.insert(name.to_string(), session);
        }

        self.sessions
            .get_mut(name)
            .ok_or_else(|| anyhow!("no session for server {name}"))
    }

    pub(crate) async fn remove(&mut self, name: &str) {
        if let Some(mut session) = self.sessions.remove(name) {
            session.close().await;
        }
    }

    pub(crate) async fn close_all(&mut self) {
        for (name, mut session) in self.sessions.drain() {
            debug!("closing session to {name}");
            session.close().await;
        }
    }
}
