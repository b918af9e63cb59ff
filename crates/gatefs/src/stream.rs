// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Scoped byte streams returned by `Gateway::read` and `Gateway::write`.
//!
//! A stream owns whatever keeps its backend handle valid (for the tree
//! backend, a provider lease), so the handle lives exactly as long as the
//! stream value.

use crate::shared::KeepAlive;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadBuf};

pub struct ReadStream {
    inner: Pin<Box<dyn AsyncRead + Send>>,
    _keep_alive: KeepAlive,
}

impl ReadStream {
    pub fn new(inner: Pin<Box<dyn AsyncRead + Send>>, keep_alive: KeepAlive) -> Self {
        Self {
            inner,
            _keep_alive: keep_alive,
        }
    }

    /// Read everything that is left.
    /// WARNING: loads the whole remainder into memory.
    pub async fn read_to_vec(mut self) -> io::Result<Vec<u8>> {
        let mut buffer = Vec::new();
        _ = self.read_to_end(&mut buffer).await?;
        Ok(buffer)
    }
}

impl AsyncRead for ReadStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        self.inner.as_mut().poll_read(cx, buf)
    }
}

pub struct WriteStream {
    inner: Pin<Box<dyn AsyncWrite + Send>>,
    _keep_alive: KeepAlive,
}

impl WriteStream {
    pub fn new(inner: Pin<Box<dyn AsyncWrite + Send>>, keep_alive: KeepAlive) -> Self {
        Self {
            inner,
            _keep_alive: keep_alive,
        }
    }

    /// Write `content`, then flush and shut the stream down.
    pub async fn write_all_and_close(mut self, content: &[u8]) -> io::Result<()> {
        self.write_all(content).await?;
        self.close().await
    }

    /// Flush and shut down. Dropping without closing discards buffered bytes
    /// on backends that buffer until shutdown.
    pub async fn close(mut self) -> io::Result<()> {
        self.flush().await?;
        self.shutdown().await
    }
}

impl AsyncWrite for WriteStream {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.inner.as_mut().poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.inner.as_mut().poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.inner.as_mut().poll_shutdown(cx)
    }
}
