/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite};

use super::FtpControlChannel;
use crate::error::FtpRawResponseError;

/// One complete reply, which may span multiple lines
#[derive(Debug)]
pub(crate) struct FtpRawResponse {
    code: u16,
    lines: Vec<String>,
}

fn parse_reply_code(line: &[u8]) -> Result<u16, FtpRawResponseError> {
    if line.len() < 3 || !line[..3].iter().all(u8::is_ascii_digit) {
        return Err(FtpRawResponseError::InvalidLineFormat);
    }
    let code = line[..3]
        .iter()
        .fold(0u16, |acc, c| acc * 10 + (c - b'0') as u16);
    if !(100..600).contains(&code) {
        return Err(FtpRawResponseError::InvalidReplyCode(code));
    }
    Ok(code)
}

fn line_text(line: &[u8]) -> String {
    String::from_utf8_lossy(line).trim_end().to_string()
}

impl FtpRawResponse {
    #[inline]
    pub(crate) fn code(&self) -> u16 {
        self.code
    }

    /// Text of the final line, without the leading code
    pub(crate) fn line_trimmed(&self) -> &str {
        self.lines.last().map(|s| s.trim()).unwrap_or_default()
    }

    /// All text of the reply, one line per item
    pub(crate) fn lines(&self) -> &[String] {
        &self.lines
    }
}

/// Accumulates the lines of a reply until its final line is seen
struct FtpReplyParser {
    code: u16,
    end_prefix: [u8; 4],
    lines: Vec<String>,
}

impl FtpReplyParser {
    /// Feed the first line, returns the completed reply if it is a single line one
    fn start(line: &[u8]) -> Result<Result<FtpRawResponse, Self>, FtpRawResponseError> {
        let code = parse_reply_code(line)?;
        match line.get(3) {
            None | Some(b' ') | Some(b'\r') | Some(b'\n') => {
                let text = line.get(4..).map(line_text).unwrap_or_default();
                Ok(Ok(FtpRawResponse {
                    code,
                    lines: vec![text],
                }))
            }
            Some(b'-') => Ok(Err(FtpReplyParser {
                code,
                end_prefix: [line[0], line[1], line[2], b' '],
                lines: vec![line_text(&line[4..])],
            })),
            Some(_) => Err(FtpRawResponseError::InvalidLineFormat),
        }
    }

    fn feed_line(&mut self, line: &[u8]) -> bool {
        if line.starts_with(&self.end_prefix) {
            self.lines.push(line_text(&line[4..]));
            true
        } else if line.len() >= 3 && line[..3] == self.end_prefix[..3] && line_text(line).len() == 3
        {
            // a bare code also closes the reply
            self.lines.push(String::new());
            true
        } else {
            // do not trim whitespace at beginning
            self.lines.push(line_text(line));
            false
        }
    }

    fn finish(self) -> FtpRawResponse {
        FtpRawResponse {
            code: self.code,
            lines: self.lines,
        }
    }
}

impl<T> FtpControlChannel<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    async fn read_line(&mut self, buf: &mut Vec<u8>) -> Result<(), FtpRawResponseError> {
        buf.clear();

        let len = self
            .stream
            .read_until(b'\n', buf)
            .await
            .map_err(FtpRawResponseError::ReadFailed)?;
        if len == 0 {
            return Err(FtpRawResponseError::ConnectionClosed);
        }

        #[cfg(feature = "log-raw-io")]
        crate::debug::log_rsp(String::from_utf8_lossy(buf).trim_end());

        if buf.last() != Some(&b'\n') {
            // peer closed in the middle of a line
            return Err(FtpRawResponseError::ConnectionClosed);
        }
        Ok(())
    }

    pub(crate) async fn read_raw_response(
        &mut self,
    ) -> Result<FtpRawResponse, FtpRawResponseError> {
        let mut buf = Vec::<u8>::with_capacity(256);
        self.read_line(&mut buf).await?;

        let mut parser = match FtpReplyParser::start(&buf)? {
            Ok(reply) => return Ok(reply),
            Err(parser) => parser,
        };
        loop {
            self.read_line(&mut buf).await?;
            if parser.feed_line(&buf) {
                return Ok(parser.finish());
            }
        }
    }

    pub(crate) async fn timed_read_raw_response_in(
        &mut self,
        timeout: Duration,
        stage: &'static str,
    ) -> Result<FtpRawResponse, FtpRawResponseError> {
        match tokio::time::timeout(timeout, self.read_raw_response()).await {
            Ok(r) => r,
            Err(_) => Err(FtpRawResponseError::ReadResponseTimedOut(stage)),
        }
    }

    pub(crate) async fn timed_read_raw_response(
        &mut self,
        stage: &'static str,
    ) -> Result<FtpRawResponse, FtpRawResponseError> {
        self.timed_read_raw_response_in(self.command_timeout, stage)
            .await
    }
}
