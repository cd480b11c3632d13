//! Pull-based MJPEG stream demultiplexer.
//!
//! Blue Iris delivers live video as an unbounded
//! `multipart/x-mixed-replace` HTTP body: one JPEG image per
//! boundary-delimited section. [`MjpegStream`] splits that body into
//! discrete frames on demand -- nothing is read past the frame the
//! consumer asked for, and dropping the value releases the single
//! underlying connection.
//!
//! # Example
//!
//! ```rust,ignore
//! use tokio_util::sync::CancellationToken;
//!
//! let cancel = CancellationToken::new();
//! let mut stream = client.live_stream("drive", 10.0, cancel.clone()).await?;
//!
//! while let Some(frame) = stream.next_frame().await? {
//!     println!("frame: {} bytes", frame.len());
//! }
//! ```

use bytes::{Buf, Bytes, BytesMut};
use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::error::Error;

// ── Content-type parsing ─────────────────────────────────────────────

/// Extract the boundary token from a stream response's content type.
///
/// The header must split on `;` into exactly two parts: the fixed
/// `multipart/x-mixed-replace` media type and a `boundary=` parameter
/// (prefix matched case-insensitively). Anything else is a framing
/// error, raised before any frame is produced.
pub(crate) fn parse_boundary(content_type: &str) -> Result<String, Error> {
    let parts: Vec<&str> = content_type.split(';').collect();
    if parts.len() != 2 {
        return Err(Error::Framing {
            message: format!("unexpected stream content type: {content_type}"),
        });
    }
    if parts[0].trim() != "multipart/x-mixed-replace" {
        return Err(Error::Framing {
            message: format!("not an x-mixed-replace stream: {content_type}"),
        });
    }

    let param = parts[1].trim();
    let prefix = "boundary=";
    let matches_prefix = param
        .get(..prefix.len())
        .is_some_and(|p| p.eq_ignore_ascii_case(prefix));
    if !matches_prefix {
        return Err(Error::Framing {
            message: format!("missing multipart boundary: {content_type}"),
        });
    }

    Ok(param[prefix.len()..].to_owned())
}

// ── Frame stream ─────────────────────────────────────────────────────

/// A lazy, forward-only sequence of JPEG frames from one live stream.
///
/// The sequence ends when the server closes the connection, the terminal
/// multipart boundary arrives, or the cancellation token fires. It is
/// not restartable: open a new stream instead.
pub struct MjpegStream {
    body: BoxStream<'static, reqwest::Result<Bytes>>,
    buf: BytesMut,
    /// `--{boundary}`, the section opener.
    delimiter: Vec<u8>,
    /// `\r\n--{boundary}`, the section-body terminator.
    body_delimiter: Vec<u8>,
    cancel: CancellationToken,
    eof: bool,
    finished: bool,
}

impl MjpegStream {
    pub(crate) fn new(
        response: reqwest::Response,
        boundary: &str,
        cancel: CancellationToken,
    ) -> Self {
        Self::from_body(response.bytes_stream().boxed(), boundary, cancel)
    }

    pub(crate) fn from_body(
        body: BoxStream<'static, reqwest::Result<Bytes>>,
        boundary: &str,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            body,
            buf: BytesMut::new(),
            delimiter: format!("--{boundary}").into_bytes(),
            body_delimiter: format!("\r\n--{boundary}").into_bytes(),
            cancel,
            eof: false,
            finished: false,
        }
    }

    /// Pull the next frame.
    ///
    /// Returns `Ok(None)` when the stream ends: connection closed,
    /// terminal boundary, or cancellation. Cancellation is checked
    /// before any read, and a partially received section is discarded,
    /// never yielded. After the first `None` every further call returns
    /// `None`.
    pub async fn next_frame(&mut self) -> Result<Option<Bytes>, Error> {
        if self.finished || self.cancel.is_cancelled() {
            self.finished = true;
            return Ok(None);
        }

        // Locate the opening delimiter of the next section. Anything in
        // front of it is preamble and gets discarded, keeping a tail
        // shorter than the delimiter in case the marker straddles a
        // chunk boundary.
        loop {
            if let Some(at) = find(&self.buf, &self.delimiter, 0) {
                self.buf.advance(at + self.delimiter.len());
                break;
            }
            let keep = self.delimiter.len().saturating_sub(1).min(self.buf.len());
            let discard = self.buf.len() - keep;
            if discard > 0 {
                self.buf.advance(discard);
            }
            if !self.fill().await? {
                self.finished = true;
                return Ok(None);
            }
        }

        // `--` directly after the final boundary terminates the stream.
        while self.buf.len() < 2 {
            if !self.fill().await? {
                self.finished = true;
                return Ok(None);
            }
        }
        if self.buf.starts_with(b"--") {
            debug!("terminal multipart boundary");
            self.finished = true;
            return Ok(None);
        }

        // Skip the rest of the boundary line.
        loop {
            if let Some(at) = find(&self.buf, b"\r\n", 0) {
                self.buf.advance(at + 2);
                break;
            }
            if !self.fill().await? {
                self.finished = true;
                return Ok(None);
            }
        }

        // Section headers run up to the first blank line. An empty
        // header block is legal: the blank line follows the boundary
        // line directly.
        let headers_end = loop {
            if self.buf.starts_with(b"\r\n") {
                break None;
            }
            if let Some(at) = find(&self.buf, b"\r\n\r\n", 0) {
                break Some(at);
            }
            if !self.fill().await? {
                self.finished = true;
                return Ok(None);
            }
        };
        match headers_end {
            None => self.buf.advance(2),
            Some(at) => {
                if let Err(e) = validate_section_headers(&self.buf[..at]) {
                    self.finished = true;
                    return Err(e);
                }
                self.buf.advance(at + 4);
            }
        }

        // The body runs to the next delimiter. The running search offset
        // avoids rescanning a large frame on every chunk.
        let mut from = 0;
        let body_end = loop {
            if let Some(at) = find(&self.buf, &self.body_delimiter, from) {
                break at;
            }
            from = self
                .buf
                .len()
                .saturating_sub(self.body_delimiter.len() - 1);
            if !self.fill().await? {
                // Connection closed mid-section: discard the partial frame.
                self.finished = true;
                return Ok(None);
            }
        };

        let frame = self.buf.split_to(body_end).freeze();
        // Consume the CRLF; the `--{boundary}` marker stays in the
        // buffer for the next call.
        self.buf.advance(2);

        trace!(bytes = frame.len(), "frame");
        Ok(Some(frame))
    }

    /// Adapt into a [`futures_core::Stream`] of frames.
    ///
    /// The stream ends after the first `None` from
    /// [`next_frame`](Self::next_frame); an error is yielded once and
    /// then the stream ends.
    pub fn into_stream(mut self) -> impl futures_core::Stream<Item = Result<Bytes, Error>> {
        async_stream::stream! {
            loop {
                match self.next_frame().await {
                    Ok(Some(frame)) => yield Ok(frame),
                    Ok(None) => break,
                    Err(e) => {
                        yield Err(e);
                        break;
                    }
                }
            }
        }
    }

    /// Read one chunk into the buffer. Returns `false` when no more data
    /// will arrive: end of body, or cancellation.
    async fn fill(&mut self) -> Result<bool, Error> {
        if self.eof {
            return Ok(false);
        }

        let cancel = self.cancel.clone();
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!("stream cancelled");
                self.finished = true;
                Ok(false)
            }
            chunk = self.body.next() => match chunk {
                Some(Ok(bytes)) => {
                    self.buf.extend_from_slice(&bytes);
                    Ok(true)
                }
                Some(Err(e)) => {
                    self.finished = true;
                    Err(Error::Transport(e))
                }
                None => {
                    self.eof = true;
                    Ok(false)
                }
            }
        }
    }
}

/// First occurrence of `needle` in `haystack` at or after `from`.
fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if needle.is_empty() || from > haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|at| at + from)
}

/// Every section-header line must look like `Name: value`.
fn validate_section_headers(block: &[u8]) -> Result<(), Error> {
    for line in block.split(|&byte| byte == b'\n') {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        if line.is_empty() {
            continue;
        }
        if !line.contains(&b':') {
            return Err(Error::Framing {
                message: format!(
                    "malformed section header: {}",
                    String::from_utf8_lossy(line)
                ),
            });
        }
    }
    Ok(())
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn canned(chunks: Vec<Bytes>, cancel: CancellationToken) -> MjpegStream {
        let chunks: Vec<reqwest::Result<Bytes>> = chunks.into_iter().map(Ok).collect();
        MjpegStream::from_body(futures_util::stream::iter(chunks).boxed(), "bi", cancel)
    }

    fn section(body: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(b"--bi\r\n");
        out.extend_from_slice(b"Content-Type: image/jpeg\r\n");
        out.extend_from_slice(format!("Content-Length: {}\r\n", body.len()).as_bytes());
        out.extend_from_slice(b"\r\n");
        out.extend_from_slice(body);
        out.extend_from_slice(b"\r\n");
        out
    }

    #[test]
    fn boundary_parses_from_content_type() {
        assert_eq!(
            parse_boundary("multipart/x-mixed-replace;boundary=bi-frame").unwrap(),
            "bi-frame"
        );
        assert_eq!(
            parse_boundary("multipart/x-mixed-replace; boundary=xyz").unwrap(),
            "xyz"
        );
        // The prefix match is case-insensitive.
        assert_eq!(
            parse_boundary("multipart/x-mixed-replace; Boundary=xyz").unwrap(),
            "xyz"
        );
    }

    #[test]
    fn boundary_rejects_other_content_types() {
        assert!(parse_boundary("image/jpeg").unwrap_err().is_framing());
        assert!(
            parse_boundary("multipart/form-data; boundary=xyz")
                .unwrap_err()
                .is_framing()
        );
        assert!(
            parse_boundary("multipart/x-mixed-replace")
                .unwrap_err()
                .is_framing()
        );
        assert!(
            parse_boundary("multipart/x-mixed-replace; charset=utf-8")
                .unwrap_err()
                .is_framing()
        );
        assert!(
            parse_boundary("multipart/x-mixed-replace; boundary=a; extra=b")
                .unwrap_err()
                .is_framing()
        );
    }

    #[tokio::test]
    async fn yields_each_section_in_order_then_ends() {
        let mut body = Vec::new();
        body.extend_from_slice(&section(b"frame-one"));
        body.extend_from_slice(&section(b"frame-two"));
        body.extend_from_slice(b"--bi--\r\n");

        let mut stream = canned(vec![Bytes::from(body)], CancellationToken::new());
        assert_eq!(
            stream.next_frame().await.unwrap().as_deref(),
            Some(&b"frame-one"[..])
        );
        assert_eq!(
            stream.next_frame().await.unwrap().as_deref(),
            Some(&b"frame-two"[..])
        );
        assert_eq!(stream.next_frame().await.unwrap(), None);
        // The stream stays finished.
        assert_eq!(stream.next_frame().await.unwrap(), None);
    }

    #[tokio::test]
    async fn empty_body_yields_an_empty_sequence() {
        let mut stream = canned(vec![], CancellationToken::new());
        assert_eq!(stream.next_frame().await.unwrap(), None);
    }

    #[tokio::test]
    async fn stream_ends_at_connection_close_without_terminal_boundary() {
        // The server closed right after the delimiter instead of sending
        // the terminal `--bi--` marker.
        let mut stream_body = section(b"only-frame");
        stream_body.extend_from_slice(b"--bi");
        let mut stream = canned(vec![Bytes::from(stream_body)], CancellationToken::new());

        assert_eq!(
            stream.next_frame().await.unwrap().as_deref(),
            Some(&b"only-frame"[..])
        );
        assert_eq!(stream.next_frame().await.unwrap(), None);
    }

    #[tokio::test]
    async fn frame_split_across_chunks_is_reassembled() {
        let mut body = section(b"abcdefghij");
        body.extend_from_slice(b"--bi--\r\n");
        let chunks = body
            .chunks(3)
            .map(Bytes::copy_from_slice)
            .collect::<Vec<_>>();

        let mut stream = canned(chunks, CancellationToken::new());
        assert_eq!(
            stream.next_frame().await.unwrap().as_deref(),
            Some(&b"abcdefghij"[..])
        );
        assert_eq!(stream.next_frame().await.unwrap(), None);
    }

    #[tokio::test]
    async fn binary_frame_bodies_pass_through_verbatim() {
        let payload = [0xffu8, 0xd8, 0x00, 0x0d, 0x0a, 0x2d, 0x2d, 0xff, 0xd9];
        let mut body = section(&payload);
        body.extend_from_slice(b"--bi--\r\n");

        let mut stream = canned(vec![Bytes::from(body)], CancellationToken::new());
        assert_eq!(
            stream.next_frame().await.unwrap().as_deref(),
            Some(&payload[..])
        );
    }

    #[tokio::test]
    async fn malformed_section_header_is_a_framing_error() {
        let mut body = Vec::new();
        body.extend_from_slice(b"--bi\r\n");
        body.extend_from_slice(b"this line has no separator\r\n");
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(b"data\r\n--bi--\r\n");

        let mut stream = canned(vec![Bytes::from(body)], CancellationToken::new());
        let err = stream.next_frame().await.unwrap_err();
        assert!(err.is_framing(), "expected framing error, got: {err:?}");
        // The error terminates the sequence.
        assert_eq!(stream.next_frame().await.unwrap(), None);
    }

    #[tokio::test]
    async fn partial_section_at_eof_is_discarded() {
        let mut body = section(b"complete");
        body.extend_from_slice(b"--bi\r\nContent-Type: image/jpeg\r\n\r\ntrunc");

        let mut stream = canned(vec![Bytes::from(body)], CancellationToken::new());
        assert_eq!(
            stream.next_frame().await.unwrap().as_deref(),
            Some(&b"complete"[..])
        );
        assert_eq!(stream.next_frame().await.unwrap(), None);
    }

    #[tokio::test]
    async fn sections_without_headers_are_supported() {
        let body = b"--bi\r\n\r\nbare\r\n--bi--\r\n".to_vec();

        let mut stream = canned(vec![Bytes::from(body)], CancellationToken::new());
        assert_eq!(
            stream.next_frame().await.unwrap().as_deref(),
            Some(&b"bare"[..])
        );
        assert_eq!(stream.next_frame().await.unwrap(), None);
    }

    #[tokio::test]
    async fn cancellation_ends_the_stream_without_a_frame() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let body = section(b"never-delivered");
        let mut stream = canned(vec![Bytes::from(body)], cancel);
        assert_eq!(stream.next_frame().await.unwrap(), None);
    }

    #[tokio::test]
    async fn into_stream_adapts_to_a_futures_stream() {
        let mut body = Vec::new();
        body.extend_from_slice(&section(b"one"));
        body.extend_from_slice(&section(b"two"));
        body.extend_from_slice(b"--bi--\r\n");

        let frames: Vec<Bytes> = canned(vec![Bytes::from(body)], CancellationToken::new())
            .into_stream()
            .map(Result::unwrap)
            .collect()
            .await;
        assert_eq!(frames, [Bytes::from_static(b"one"), Bytes::from_static(b"two")]);
    }
}
