/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::io;
use std::net::{IpAddr, SocketAddr};

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpSocket, TcpStream};

#[async_trait]
pub trait FtpConnectionProvider<S: AsyncRead + AsyncWrite> {
    async fn new_control_connection(&mut self, host: &str, port: u16) -> io::Result<S>;
    async fn new_data_connection(&mut self, addr: SocketAddr) -> io::Result<S>;

    /// Peer address of the current control connection, if known
    fn control_peer_ip(&self) -> Option<IpAddr> {
        None
    }
}

/// Plain TCP connections, optionally bound to a local source address
#[derive(Default)]
pub struct TcpConnectionProvider {
    bind_ip: Option<IpAddr>,
    remote_addr: Option<SocketAddr>,
}

impl TcpConnectionProvider {
    pub fn set_bind_ip(&mut self, ip: IpAddr) {
        self.bind_ip = Some(ip);
    }

    async fn connect_to(&self, addr: SocketAddr) -> io::Result<TcpStream> {
        let socket = match addr {
            SocketAddr::V4(_) => TcpSocket::new_v4()?,
            SocketAddr::V6(_) => TcpSocket::new_v6()?,
        };
        if let Some(ip) = self.bind_ip {
            socket.bind(SocketAddr::new(ip, 0))?;
        }
        let stream = socket.connect(addr).await?;
        stream.set_nodelay(true)?;
        Ok(stream)
    }
}

#[async_trait]
impl FtpConnectionProvider<TcpStream> for TcpConnectionProvider {
    async fn new_control_connection(&mut self, host: &str, port: u16) -> io::Result<TcpStream> {
        let mut err = io::Error::new(io::ErrorKind::AddrNotAvailable, "no addr resolved");
        for addr in tokio::net::lookup_host((host, port)).await? {
            if let Some(ip) = self.bind_ip {
                if ip.is_ipv4() != addr.is_ipv4() {
                    continue;
                }
            }
            match self.connect_to(addr).await {
                Ok(stream) => {
                    self.remote_addr = Some(addr);
                    return Ok(stream);
                }
                Err(e) => err = e,
            }
        }

        Err(err)
    }

    async fn new_data_connection(&mut self, addr: SocketAddr) -> io::Result<TcpStream> {
        self.connect_to(addr).await
    }

    fn control_peer_ip(&self) -> Option<IpAddr> {
        self.remote_addr.map(|addr| addr.ip())
    }
}
