// Camera window manipulation
//
// `camset` drives a camera window remotely: select, trigger, pause,
// enable, PTZ, zoom, preset bookkeeping, and window moves. Every option
// is independent and left off the wire when unset; no combination is
// validated client-side -- the server is authoritative about what it
// accepts.

use serde::{Serialize, Serializer};
use tracing::debug;

use crate::error::Error;
use crate::protocol::client::Client;
use crate::protocol::models::TriggerRequest;

/// Zoom view within the image rectangle.
///
/// Serialized as the 5-float array `[factor, x1, y1, x2, y2]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Zoom {
    pub factor: f32,
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl Serialize for Zoom {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        [self.factor, self.x1, self.y1, self.x2, self.y2].serialize(serializer)
    }
}

/// Window move behavior for [`CamSetOptions::move_mode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveMode {
    /// Swap the selected camera with the target camera window.
    Swap,
    /// Insert the selected camera at the target window position.
    Insert,
}

impl Serialize for MoveMode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u8(match self {
            Self::Swap => 0,
            Self::Insert => 1,
        })
    }
}

/// Options for [`Client::cam_set`]. Unset fields are omitted from the
/// payload entirely.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CamSetOptions {
    /// Perform the camera "click": select it and reset the current
    /// user's new alerts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub click: Option<bool>,
    /// Play live audio.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<bool>,
    /// Delete the camera window.
    #[serde(rename = "delete", skip_serializing_if = "Option::is_none")]
    pub delete_window: Option<bool>,
    /// PTZ command in `"id:args"` form. Ids 2201-2240 call preset
    /// positions 1-40; 2301-2340 set them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ptz: Option<String>,
    /// Trigger the camera.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger: Option<bool>,
    /// Reset the camera window.
    #[serde(rename = "reset", skip_serializing_if = "Option::is_none")]
    pub reset_window: Option<bool>,
    /// Enable or disable the camera.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable: Option<bool>,
    /// Toggle manual video recording.
    #[serde(rename = "video", skip_serializing_if = "Option::is_none")]
    pub record_video: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zoom: Option<Zoom>,
    /// Capture a preset position image (preset 1-40).
    #[serde(rename = "snapPreset", skip_serializing_if = "Option::is_none")]
    pub snap_preset: Option<u8>,
    /// Clear a preset position image (preset 1-40).
    #[serde(rename = "clearPreset", skip_serializing_if = "Option::is_none")]
    pub clear_preset: Option<u8>,
    /// Exchange preset x with preset x-1 (preset 2-40).
    #[serde(rename = "upPreset", skip_serializing_if = "Option::is_none")]
    pub up_preset: Option<u8>,
    /// Exchange preset x with preset x+1 (preset 1-39).
    #[serde(rename = "downPreset", skip_serializing_if = "Option::is_none")]
    pub down_preset: Option<u8>,
    /// Target camera short name for `move_mode`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(rename = "move", skip_serializing_if = "Option::is_none")]
    pub move_mode: Option<MoveMode>,
}

impl CamSetOptions {
    /// Options carrying only `trigger: true`.
    pub fn trigger() -> Self {
        Self {
            trigger: Some(true),
            ..Self::default()
        }
    }
}

/// `cmd: "camset"` -- the options flatten into the payload.
#[derive(Debug, Serialize)]
pub(crate) struct CamSetRequest<'a> {
    pub cmd: &'static str,
    pub session: &'a str,
    pub camera: &'a str,
    #[serde(flatten)]
    pub options: &'a CamSetOptions,
}

impl Client {
    /// Manipulate a camera window (`cmd: "camset"`).
    pub async fn cam_set(&self, camera: &str, options: &CamSetOptions) -> Result<(), Error> {
        let request = CamSetRequest {
            cmd: "camset",
            session: self.session(),
            camera,
            options,
        };

        debug!(camera, "camset");
        Self::expect_success(self.post_json::<serde_json::Value>(&request).await?)?;
        Ok(())
    }

    /// Trigger a camera as if its motion sensor had fired
    /// (`cmd: "trigger"`).
    pub async fn trigger(&self, camera: &str) -> Result<(), Error> {
        let request = TriggerRequest {
            cmd: "trigger",
            session: self.session(),
            camera,
        };

        debug!(camera, "trigger");
        Self::expect_success(self.post_json::<serde_json::Value>(&request).await?)?;
        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unset_options_are_omitted_from_the_payload() {
        let request = CamSetRequest {
            cmd: "camset",
            session: "s1",
            camera: "drive",
            options: &CamSetOptions::trigger(),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "cmd": "camset",
                "session": "s1",
                "camera": "drive",
                "trigger": true
            })
        );
    }

    #[test]
    fn default_options_add_nothing() {
        let value = serde_json::to_value(CamSetOptions::default()).unwrap();
        assert_eq!(value, json!({}));
    }

    #[test]
    fn zoom_serializes_as_a_five_float_array() {
        let options = CamSetOptions {
            zoom: Some(Zoom {
                factor: 2.0,
                x1: 0.25,
                y1: 0.5,
                x2: 0.75,
                y2: 0.875,
            }),
            ..CamSetOptions::default()
        };
        let value = serde_json::to_value(&options).unwrap();
        assert_eq!(value, json!({ "zoom": [2.0, 0.25, 0.5, 0.75, 0.875] }));
    }

    #[test]
    fn move_mode_serializes_as_an_integer() {
        let swap = CamSetOptions {
            target: Some("porch".into()),
            move_mode: Some(MoveMode::Swap),
            ..CamSetOptions::default()
        };
        assert_eq!(
            serde_json::to_value(&swap).unwrap(),
            json!({ "target": "porch", "move": 0 })
        );

        let insert = CamSetOptions {
            move_mode: Some(MoveMode::Insert),
            ..CamSetOptions::default()
        };
        assert_eq!(
            serde_json::to_value(&insert).unwrap(),
            json!({ "move": 1 })
        );
    }

    #[test]
    fn wire_names_differ_from_field_names() {
        let options = CamSetOptions {
            delete_window: Some(true),
            reset_window: Some(true),
            record_video: Some(true),
            snap_preset: Some(3),
            ..CamSetOptions::default()
        };
        let value = serde_json::to_value(&options).unwrap();
        assert_eq!(
            value,
            json!({ "delete": true, "reset": true, "video": true, "snapPreset": 3 })
        );
    }
}
