/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

static PASV_NUMBERS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+),(\d+),(\d+),(\d+),(\d+),(\d+)").unwrap()
});

/// The data channel address advertised by a 227 reply, valid for one transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FtpPassiveEndpoint {
    addr: SocketAddr,
}

impl FtpPassiveEndpoint {
    /// Find `h1,h2,h3,h4,p1,p2` anywhere in the reply text
    pub fn parse_pasv_reply(text: &str) -> Option<Self> {
        let caps = PASV_NUMBERS.captures(text)?;
        let mut v = [0u8; 6];
        for (i, n) in v.iter_mut().enumerate() {
            *n = u8::from_str(caps.get(i + 1)?.as_str()).ok()?;
        }

        let ip = IpAddr::V4(Ipv4Addr::new(v[0], v[1], v[2], v[3]));
        let port = ((v[4] as u16) << 8) + (v[5] as u16);
        Some(FtpPassiveEndpoint {
            addr: SocketAddr::new(ip, port),
        })
    }

    #[inline]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    #[inline]
    pub fn ip(&self) -> IpAddr {
        self.addr.ip()
    }

    #[inline]
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Keep the advertised port but connect to another host
    pub(crate) fn with_ip(self, ip: IpAddr) -> Self {
        FtpPassiveEndpoint {
            addr: SocketAddr::new(ip, self.addr.port()),
        }
    }
}
