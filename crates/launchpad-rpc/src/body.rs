// crates/launchpad-rpc/src/body.rs
//
// Adapters between HTTP bodies and tokio byte streams.
//
// Uploads and downloads can be gigabytes, so neither direction collects the
// body in memory: `BodyReader` exposes a request body as `AsyncRead` with a
// byte cap, and `ReaderBody` streams an `AsyncRead` out as response frames.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Buf, Bytes};
use http_body::{Body as HttpBody, Frame, SizeHint};
use tokio::io::{AsyncRead, ReadBuf};
use tonic::Status;

const CHUNK_SIZE: usize = 64 * 1024;

// ---------------------------------------------------------------------------
// Request body -> AsyncRead
// ---------------------------------------------------------------------------

/// Reads a request body as a byte stream, failing once more than `limit`
/// bytes have arrived.
pub struct BodyReader<B> {
    body: Pin<Box<B>>,
    chunk: Bytes,
    received: u64,
    limit: u64,
    over_limit: bool,
}

impl<B> BodyReader<B> {
    pub fn new(body: B, limit: u64) -> Self {
        Self {
            body: Box::pin(body),
            chunk: Bytes::new(),
            received: 0,
            limit,
            over_limit: false,
        }
    }

    /// Whether the read failed because the body exceeded the cap.
    pub fn over_limit(&self) -> bool {
        self.over_limit
    }
}

impl<B> AsyncRead for BodyReader<B>
where
    B: HttpBody,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        loop {
            if !this.chunk.is_empty() {
                let n = this.chunk.len().min(buf.remaining());
                buf.put_slice(&this.chunk[..n]);
                this.chunk.advance(n);
                return Poll::Ready(Ok(()));
            }

            match this.body.as_mut().poll_frame(cx) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(None) => return Poll::Ready(Ok(())),
                Poll::Ready(Some(Err(e))) => {
                    let cause: Box<dyn std::error::Error + Send + Sync> = e.into();
                    return Poll::Ready(Err(io::Error::new(io::ErrorKind::Other, cause)));
                }
                Poll::Ready(Some(Ok(frame))) => {
                    let Ok(mut data) = frame.into_data() else {
                        continue;
                    };
                    let bytes = data.copy_to_bytes(data.remaining());
                    this.received += bytes.len() as u64;
                    if this.received > this.limit {
                        this.over_limit = true;
                        return Poll::Ready(Err(io::Error::new(
                            io::ErrorKind::InvalidData,
                            format!("upload exceeds {} bytes", this.limit),
                        )));
                    }
                    this.chunk = bytes;
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// AsyncRead -> response body
// ---------------------------------------------------------------------------

/// Streams a reader of known length as response data frames.
pub struct ReaderBody {
    reader: Box<dyn AsyncRead + Send + Unpin>,
    buf: Box<[u8]>,
    remaining: u64,
    done: bool,
}

impl ReaderBody {
    pub fn new(reader: Box<dyn AsyncRead + Send + Unpin>, size: u64) -> Self {
        Self {
            reader,
            buf: vec![0u8; CHUNK_SIZE].into_boxed_slice(),
            remaining: size,
            done: false,
        }
    }
}

impl HttpBody for ReaderBody {
    type Data = Bytes;
    type Error = Status;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        if this.done {
            return Poll::Ready(None);
        }

        let mut read_buf = ReadBuf::new(&mut this.buf);
        match Pin::new(&mut this.reader).poll_read(cx, &mut read_buf) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Err(e)) => {
                this.done = true;
                tracing::error!("Artifact read failed mid-stream: {}", e);
                Poll::Ready(Some(Err(Status::internal(format!("read error: {}", e)))))
            }
            Poll::Ready(Ok(())) => {
                let filled = read_buf.filled();
                if filled.is_empty() {
                    this.done = true;
                    return Poll::Ready(None);
                }
                this.remaining = this.remaining.saturating_sub(filled.len() as u64);
                Poll::Ready(Some(Ok(Frame::data(Bytes::copy_from_slice(filled)))))
            }
        }
    }

    fn is_end_stream(&self) -> bool {
        self.done
    }

    fn size_hint(&self) -> SizeHint {
        if self.done {
            SizeHint::with_exact(0)
        } else {
            let mut hint = SizeHint::new();
            hint.set_upper(self.remaining);
            hint
        }
    }
}
