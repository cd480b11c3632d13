// Command protocol wire types
//
// Every response from the `/json` endpoint is wrapped in the same
// envelope: `{ "result": "success"|"fail", "session": ..., "data": ... }`.
// Unset fields are omitted from the wire entirely, in both directions:
// request structs carry `skip_serializing_if` on every optional field and
// response fields use `#[serde(default)]`. Nothing is ever sent or
// expected as an explicit `null`.

use serde::{Deserialize, Serialize};

// ── Response envelope ────────────────────────────────────────────────

/// Outcome flag carried by every response envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseResult {
    Success,
    Fail,
}

/// Standard Blue Iris response envelope.
///
/// `data` is only present when `result` is [`ResponseResult::Success`];
/// `session` is present on login exchanges.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Envelope<T> {
    pub result: ResponseResult,
    #[serde(default)]
    pub session: Option<String>,
    #[serde(default)]
    pub data: Option<T>,
}

// ── Login payload ────────────────────────────────────────────────────

/// Server details returned in the `data` payload of a successful login.
///
/// Everything here is informational; the server omits fields freely
/// depending on version and the logged-in user's permissions.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SystemInfo {
    #[serde(default, rename = "system name")]
    pub system_name: Option<String>,
    #[serde(default)]
    pub admin: Option<bool>,
    #[serde(default)]
    pub ptz: Option<bool>,
    #[serde(default)]
    pub audio: Option<bool>,
    #[serde(default)]
    pub clips: Option<bool>,
    #[serde(default, rename = "streamtimelimit")]
    pub stream_time_limit: Option<bool>,
    #[serde(default)]
    pub dio: Option<bool>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub license: Option<String>,
    /// Support expiry, as a formatted date string.
    #[serde(default)]
    pub support: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    /// Offset from UTC in minutes.
    #[serde(default, rename = "tzone")]
    pub tz_offset_minutes: Option<i32>,
    #[serde(default)]
    pub streams: Vec<String>,
    #[serde(default)]
    pub sounds: Vec<String>,
    #[serde(default)]
    pub profiles: Vec<String>,
    #[serde(default)]
    pub schedules: Vec<String>,
}

// ── Requests ─────────────────────────────────────────────────────────

/// `cmd: "login"` -- bare for the challenge request, then again with the
/// challenge session and the digest response.
#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub cmd: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<&'a str>,
}

/// `cmd: "camlist"`.
#[derive(Debug, Serialize)]
pub(crate) struct CamListRequest<'a> {
    pub cmd: &'static str,
    pub session: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset: Option<u8>,
}

/// `cmd: "trigger"`.
#[derive(Debug, Serialize)]
pub(crate) struct TriggerRequest<'a> {
    pub cmd: &'static str,
    pub session: &'a str,
    pub camera: &'a str,
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_success_with_data() {
        let envelope: Envelope<Vec<i32>> =
            serde_json::from_value(json!({ "result": "success", "data": [1, 2, 3] })).unwrap();
        assert_eq!(envelope.result, ResponseResult::Success);
        assert!(envelope.session.is_none());
        assert_eq!(envelope.data.as_deref(), Some(&[1, 2, 3][..]));
    }

    #[test]
    fn envelope_fail_without_data() {
        let envelope: Envelope<Vec<i32>> =
            serde_json::from_value(json!({ "result": "fail", "session": "ch" })).unwrap();
        assert_eq!(envelope.result, ResponseResult::Fail);
        assert_eq!(envelope.session.as_deref(), Some("ch"));
        assert!(envelope.data.is_none());
    }

    #[test]
    fn bare_login_request_omits_unset_fields() {
        let request = LoginRequest {
            cmd: "login",
            session: None,
            response: None,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value, json!({ "cmd": "login" }));
    }

    #[test]
    fn camlist_request_omits_zero_reset() {
        let request = CamListRequest {
            cmd: "camlist",
            session: "s",
            reset: None,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value, json!({ "cmd": "camlist", "session": "s" }));
    }

    #[test]
    fn system_info_decodes_login_payload() {
        let info: SystemInfo = serde_json::from_value(json!({
            "system name": "garage",
            "admin": true,
            "version": "5.5.5.0",
            "tzone": -300,
            "profiles": ["Home", "Away"]
        }))
        .unwrap();
        assert_eq!(info.system_name.as_deref(), Some("garage"));
        assert_eq!(info.admin, Some(true));
        assert_eq!(info.tz_offset_minutes, Some(-300));
        assert_eq!(info.profiles, ["Home", "Away"]);
        assert!(info.latitude.is_none());
    }
}
