// Login handshake
//
// Blue Iris authenticates with a two-step challenge-response exchange on
// the same `/json` endpoint as every other command:
//
//   1. a bare `login` command -- the server answers `result: "fail"`
//      with a one-time `session` value, the challenge;
//   2. `login` again, carrying the challenge session and
//      `md5("{user}:{challenge}:{pass}")` as lowercase hex -- the server
//      answers `result: "success"` with the final session token.
//
// Any other sequence is a protocol violation and fails fast. The token
// is forwarded verbatim on every later command; expiry handling is the
// caller's problem.

use std::fmt::Write as _;

use md5::{Digest, Md5};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info};
use url::Url;

use crate::error::Error;
use crate::protocol::client::Client;
use crate::protocol::models::{Envelope, LoginRequest, ResponseResult, SystemInfo};

impl Client {
    /// Run the handshake, returning the session token and the server
    /// details from the login payload.
    pub(crate) async fn authenticate(
        http: &reqwest::Client,
        base_url: &Url,
        username: &str,
        password: &SecretString,
    ) -> Result<(String, SystemInfo), Error> {
        debug!(username, "requesting login challenge");

        let challenge: Envelope<SystemInfo> = Self::post_json_with(
            http,
            base_url,
            &LoginRequest {
                cmd: "login",
                session: None,
                response: None,
            },
        )
        .await
        .map_err(auth_error)?;

        // Step 1 must be refused: the `fail` reply carries the challenge.
        if challenge.result != ResponseResult::Fail {
            return Err(Error::Authentication {
                message: "unexpected result on login challenge request".into(),
            });
        }
        let Some(challenge_session) = challenge.session else {
            return Err(Error::Authentication {
                message: "login challenge carried no session".into(),
            });
        };

        let response = login_digest(username, &challenge_session, password);

        let login: Envelope<SystemInfo> = Self::post_json_with(
            http,
            base_url,
            &LoginRequest {
                cmd: "login",
                session: Some(&challenge_session),
                response: Some(&response),
            },
        )
        .await
        .map_err(auth_error)?;

        if login.result != ResponseResult::Success {
            return Err(Error::Authentication {
                message: "server rejected login credentials".into(),
            });
        }
        let Some(session) = login.session else {
            return Err(Error::Authentication {
                message: "login succeeded without a session token".into(),
            });
        };

        info!(username, "logged in");
        Ok((session, login.data.unwrap_or_default()))
    }
}

/// Handshake-scope error mapping: a non-success status or a malformed
/// envelope during login is an authentication failure to the caller.
/// Connection-level errors stay transport errors.
fn auth_error(err: Error) -> Error {
    match err {
        Error::Status { status, body } => Error::Authentication {
            message: format!("login failed (HTTP {status}): {body}"),
        },
        Error::Deserialization { message, .. } => Error::Authentication {
            message: format!("malformed login response: {message}"),
        },
        other => other,
    }
}

/// `hex(md5("{username}:{challenge}:{password}"))`, lowercase, no
/// separators.
fn login_digest(username: &str, challenge: &str, password: &SecretString) -> String {
    let mut md5 = Md5::new();
    md5.update(username.as_bytes());
    md5.update(b":");
    md5.update(challenge.as_bytes());
    md5.update(b":");
    md5.update(password.expose_secret().as_bytes());

    let digest = md5.finalize();
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(hex, "{byte:02x}");
    }
    hex
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn digest(username: &str, challenge: &str, password: &str) -> String {
        login_digest(username, challenge, &SecretString::from(password))
    }

    #[test]
    fn digest_matches_known_vector() {
        assert_eq!(
            digest("admin", "abc123", "secret"),
            "b556a555c2c690feeac3ed0e9a5e2a31"
        );
    }

    #[test]
    fn digest_depends_on_challenge() {
        assert_eq!(
            digest("admin", "5e8f3c", "hunter2"),
            "5717fc749eacdd3b4513beaa37c477a8"
        );
        assert_ne!(
            digest("admin", "5e8f3c", "hunter2"),
            digest("admin", "abc123", "hunter2")
        );
    }

    #[test]
    fn digest_is_lowercase_hex() {
        let d = digest("user", "challenge", "pw");
        assert_eq!(d, "ebf6c937b035c2c2f8144c6332593941");
        assert_eq!(d.len(), 32);
        assert!(d.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }
}
