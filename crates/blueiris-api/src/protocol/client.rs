// Blue Iris HTTP client
//
// Wraps two `reqwest::Client` instances: a JSON client for the `/json`
// command endpoint and a media client (HTTP Basic) for the byte-oriented
// image and stream paths. This module owns transport mechanics and
// envelope handling; the operations live in auth.rs, cameras.rs,
// control.rs, and media.rs as inherent methods.

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use secrecy::SecretString;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::protocol::models::{Envelope, ResponseResult, SystemInfo};
use crate::transport::TransportConfig;

/// Authenticated client for one Blue Iris server.
///
/// Constructed only via [`Client::connect`], which performs the login
/// handshake, so a `Client` always holds a valid session token. The
/// token is fixed for the client's lifetime and attached to every
/// command; commands may be issued concurrently through `&self`.
/// Re-authentication (after the server drops the session) is a caller
/// decision: connect again and replace the client.
pub struct Client {
    json: reqwest::Client,
    media: reqwest::Client,
    base_url: Url,
    session: String,
    username: String,
    password: SecretString,
    system_info: SystemInfo,
}

impl Client {
    /// Connect to a server and run the login handshake.
    ///
    /// `base_url` is the web server root, e.g. `http://192.168.1.20:81/`.
    /// The same credentials are reused for HTTP Basic auth on the image
    /// and stream endpoints, which live outside the JSON protocol.
    pub async fn connect(
        base_url: Url,
        username: impl Into<String>,
        password: SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let json = transport.build_client(headers)?;
        let media = transport.build_media_client()?;

        let username = username.into();
        let (session, system_info) =
            Self::authenticate(&json, &base_url, &username, &password).await?;

        Ok(Self {
            json,
            media,
            base_url,
            session,
            username,
            password,
            system_info,
        })
    }

    /// The live session token.
    pub fn session(&self) -> &str {
        &self.session
    }

    /// The server base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Server details captured from the login response.
    pub fn system_info(&self) -> &SystemInfo {
        &self.system_info
    }

    /// The media client (image/stream endpoints, HTTP Basic auth).
    pub(crate) fn media_http(&self) -> &reqwest::Client {
        &self.media
    }

    /// Credentials for HTTP Basic auth on the byte endpoints.
    pub(crate) fn basic_credentials(&self) -> (&str, &SecretString) {
        (&self.username, &self.password)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// POST a command to `/json` and decode the response envelope.
    pub(crate) async fn post_json<T: DeserializeOwned>(
        &self,
        command: &impl Serialize,
    ) -> Result<Envelope<T>, Error> {
        Self::post_json_with(&self.json, &self.base_url, command).await
    }

    /// Envelope POST against an explicit client/base pair.
    ///
    /// [`Client::connect`] needs this before a `Client` value exists.
    pub(crate) async fn post_json_with<T: DeserializeOwned>(
        http: &reqwest::Client,
        base_url: &Url,
        command: &impl Serialize,
    ) -> Result<Envelope<T>, Error> {
        let url = base_url.join("json")?;
        debug!(%url, "POST command");

        let resp = http
            .post(url)
            .json(command)
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        let body = resp.text().await.map_err(Error::Transport)?;

        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })
    }

    /// Require `result: "success"` on a command envelope.
    pub(crate) fn expect_success<T>(envelope: Envelope<T>) -> Result<Envelope<T>, Error> {
        match envelope.result {
            ResponseResult::Success => Ok(envelope),
            ResponseResult::Fail => Err(Error::Command {
                message: "server returned result \"fail\"".into(),
            }),
        }
    }
}
