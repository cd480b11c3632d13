// Byte-oriented endpoints
//
// Still images and the live MJPEG stream bypass the JSON protocol
// entirely: they are plain GETs under HTTP Basic auth, served from
// `/image/{short}` and `/mjpg/{short}`.

use bytes::Bytes;
use secrecy::ExposeSecret;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::Error;
use crate::mjpeg::{MjpegStream, parse_boundary};
use crate::protocol::client::Client;

impl Client {
    /// Fetch a single JPEG still for a camera (`GET /image/{short}`).
    pub async fn still_image(&self, camera: &str) -> Result<Bytes, Error> {
        let url = self.base_url().join(&format!("image/{camera}"))?;
        debug!(camera, "fetching still image");

        let (username, password) = self.basic_credentials();
        let resp = self
            .media_http()
            .get(url)
            .basic_auth(username, Some(password.expose_secret()))
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Media {
                camera: camera.to_owned(),
                status: status.as_u16(),
            });
        }

        resp.bytes().await.map_err(Error::Transport)
    }

    /// Open the live MJPEG stream for a camera
    /// (`GET /mjpg/{short}?fps={fps}`).
    ///
    /// Frames are pulled one at a time from the returned stream; nothing
    /// is read ahead of the consumer. The `cancel` token is honored at
    /// every read suspension point, and dropping the stream releases the
    /// connection.
    pub async fn live_stream(
        &self,
        camera: &str,
        frames_per_second: f64,
        cancel: CancellationToken,
    ) -> Result<MjpegStream, Error> {
        let mut url = self.base_url().join(&format!("mjpg/{camera}"))?;
        url.query_pairs_mut()
            .append_pair("fps", &frames_per_second.to_string());
        debug!(camera, fps = frames_per_second, "opening live stream");

        let (username, password) = self.basic_credentials();
        let resp = self
            .media_http()
            .get(url)
            .basic_auth(username, Some(password.expose_secret()))
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Media {
                camera: camera.to_owned(),
                status: status.as_u16(),
            });
        }

        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| Error::Framing {
                message: "stream response carried no Content-Type header".into(),
            })?;
        let boundary = parse_boundary(content_type)?;

        Ok(MjpegStream::new(resp, &boundary, cancel))
    }
}
