// Camera-or-group inventory decoding
//
// `camlist` returns a heterogeneous array: each entry is either a single
// camera or a group of cameras. There is no type tag -- an entry is a
// group exactly when it carries a `group` field (even an empty one), so
// the discriminator must run on raw field presence before any
// camera-required field is validated. Server ordering (grouped cameras
// first, ungrouped after, disabled last) is meaningful and preserved.
//
// Wire field names differ from the domain model and several values need
// conversion (packed colors, corner rectangles, millisecond durations),
// so the raw serde structs stay private and conversion happens in one
// place.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

// ── Geometry / value types ───────────────────────────────────────────

/// Frame size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelSize {
    pub width: u32,
    pub height: u32,
}

/// Group layout: cameras across and tall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSize {
    pub columns: u32,
    pub rows: u32,
}

/// Axis-aligned rectangle within the group image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    /// Build from the wire form `[x1, y1, x2, y2]`.
    fn from_corners(c: [i32; 4]) -> Self {
        Self {
            x: c[0],
            y: c[1],
            width: c[2] - c[0],
            height: c[3] - c[1],
        }
    }
}

/// Display color unpacked from the server's packed 24-bit integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Rgb {
    /// Unpack a 24-bit color value. The least significant byte is red.
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_packed(packed: u32) -> Self {
        Self {
            red: (packed & 0xff) as u8,
            green: ((packed >> 8) & 0xff) as u8,
            blue: ((packed >> 16) & 0xff) as u8,
        }
    }
}

// ── Domain model ─────────────────────────────────────────────────────

/// Fields shared by cameras and groups.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceBase {
    /// Human-readable name shown in the UI.
    pub display_name: String,
    /// Stable identifier used in all commands.
    pub short_name: String,
    /// Current frames/second delivered from the camera.
    pub frames_per_second: Option<f64>,
    /// Currently sensing motion.
    pub is_motion: Option<bool>,
    pub is_triggered: Option<bool>,
    pub is_audio_supported: Option<bool>,
    pub frame_size: Option<PixelSize>,
    /// Per-user count of unseen alerts.
    pub new_alerts: Option<u32>,
    /// Database record locator for the most recent alert image.
    pub last_alert: Option<i64>,
    /// Timestamp of the most recent alert image.
    pub last_alert_utc: Option<DateTime<Utc>>,
}

/// A single camera entry.
#[derive(Debug, Clone, Serialize)]
pub struct Camera {
    pub base: DeviceBase,
    pub color: Option<Rgb>,
    /// Clips created since the camera stats were last reset.
    pub clips_created: Option<u32>,
    /// Currently sending an alert.
    pub is_alerting: Option<bool>,
    /// Currently displaying live video.
    pub is_active: Option<bool>,
    pub camera_type: Option<i32>,
    /// 0 = not paused, -1 = paused indefinitely, else seconds remaining.
    pub pause: Option<i32>,
    pub is_enabled: Option<bool>,
    pub is_online: Option<bool>,
    pub is_no_signal: Option<bool>,
    pub is_paused: Option<bool>,
    pub is_recording: Option<bool>,
    pub is_manually_recording: Option<bool>,
    /// Time since manual recording began.
    pub manual_recording_elapsed: Option<Duration>,
    /// Limit for a manual recording.
    pub manual_recording_limit: Option<Duration>,
    pub is_yellow: Option<bool>,
    /// Active profile, as overridden by the schedule or the UI buttons.
    pub profile: Option<i32>,
    pub is_ptz_supported: Option<bool>,
    /// Trigger events since last reset.
    pub trigger_count: Option<u32>,
    /// No-signal events since last reset.
    pub no_signal_count: Option<u32>,
    /// Clip count since last reset.
    pub clip_count: Option<u32>,
    /// Formatted camera error condition, if any.
    pub error: Option<String>,
}

/// A camera-group entry.
#[derive(Debug, Clone, Serialize)]
pub struct Group {
    pub base: DeviceBase,
    /// Member camera short names, in display order. May be empty.
    pub members: Vec<String>,
    /// Cameras across and tall in the group image.
    pub grid: Option<GridSize>,
    /// Member sub-rectangles within the group image.
    pub rects: Vec<Rect>,
}

/// One entry of the `camlist` inventory.
#[derive(Debug, Clone, Serialize)]
pub enum DeviceEntry {
    Camera(Box<Camera>),
    Group(Group),
}

impl DeviceEntry {
    pub fn base(&self) -> &DeviceBase {
        match self {
            Self::Camera(camera) => &camera.base,
            Self::Group(group) => &group.base,
        }
    }

    pub fn short_name(&self) -> &str {
        &self.base().short_name
    }

    pub fn display_name(&self) -> &str {
        &self.base().display_name
    }

    pub fn is_group(&self) -> bool {
        matches!(self, Self::Group(_))
    }
}

impl<'de> Deserialize<'de> for DeviceEntry {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Buffer the raw object first: the variant is chosen by the
        // presence of the `group` field, which has to be decided before
        // any camera-required field is validated.
        let value = serde_json::Value::deserialize(deserializer)?;
        let is_group = value
            .as_object()
            .is_some_and(|object| object.contains_key("group"));

        if is_group {
            let raw: RawGroup = serde_json::from_value(value).map_err(de::Error::custom)?;
            Ok(Self::Group(raw.into()))
        } else {
            let raw: RawCamera = serde_json::from_value(value).map_err(de::Error::custom)?;
            Ok(Self::Camera(Box::new(raw.into())))
        }
    }
}

// ── Wire shapes ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RawBase {
    #[serde(rename = "optionDisplay")]
    display_name: String,
    #[serde(rename = "optionValue")]
    short_name: String,
    #[serde(default, rename = "FPS")]
    fps: Option<f64>,
    #[serde(default, rename = "isMotion")]
    is_motion: Option<bool>,
    #[serde(default, rename = "isTriggered")]
    is_triggered: Option<bool>,
    #[serde(default)]
    audio: Option<bool>,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
    #[serde(default)]
    newalerts: Option<u32>,
    #[serde(default)]
    lastalert: Option<i64>,
    #[serde(default)]
    lastalertutc: Option<i64>,
}

impl From<RawBase> for DeviceBase {
    fn from(raw: RawBase) -> Self {
        // A frame size exists as soon as either dimension was reported;
        // the missing half defaults to zero.
        let frame_size = match (raw.width, raw.height) {
            (None, None) => None,
            (width, height) => Some(PixelSize {
                width: width.unwrap_or(0),
                height: height.unwrap_or(0),
            }),
        };

        Self {
            display_name: raw.display_name,
            short_name: raw.short_name,
            frames_per_second: raw.fps,
            is_motion: raw.is_motion,
            is_triggered: raw.is_triggered,
            is_audio_supported: raw.audio,
            frame_size,
            new_alerts: raw.newalerts,
            last_alert: raw.lastalert,
            last_alert_utc: raw.lastalertutc.and_then(DateTime::from_timestamp_millis),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawCamera {
    #[serde(flatten)]
    base: RawBase,
    #[serde(default)]
    color: Option<i64>,
    #[serde(default, rename = "clipsCreated")]
    clips_created: Option<u32>,
    #[serde(default, rename = "isAlerting")]
    is_alerting: Option<bool>,
    #[serde(default)]
    active: Option<bool>,
    #[serde(default, rename = "type")]
    camera_type: Option<i32>,
    #[serde(default)]
    pause: Option<i32>,
    #[serde(default, rename = "isEnabled")]
    is_enabled: Option<bool>,
    #[serde(default, rename = "isOnline")]
    is_online: Option<bool>,
    #[serde(default, rename = "isNoSignal")]
    is_no_signal: Option<bool>,
    #[serde(default, rename = "isPaused")]
    is_paused: Option<bool>,
    #[serde(default, rename = "isRecording")]
    is_recording: Option<bool>,
    #[serde(default, rename = "isManRec")]
    is_man_rec: Option<bool>,
    #[serde(default, rename = "ManRecElapsed")]
    man_rec_elapsed_ms: Option<i64>,
    #[serde(default, rename = "ManRecLimit")]
    man_rec_limit_ms: Option<i64>,
    #[serde(default, rename = "isYellow")]
    is_yellow: Option<bool>,
    #[serde(default)]
    profile: Option<i32>,
    #[serde(default)]
    ptz: Option<bool>,
    #[serde(default, rename = "nTriggers")]
    n_triggers: Option<u32>,
    #[serde(default, rename = "nNoSignal")]
    n_no_signal: Option<u32>,
    #[serde(default, rename = "nClips")]
    n_clips: Option<u32>,
    #[serde(default)]
    error: Option<String>,
}

/// Milliseconds off the wire, clamped at zero.
#[allow(clippy::cast_sign_loss)]
fn millis(ms: i64) -> Duration {
    Duration::from_millis(ms.max(0) as u64)
}

#[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
fn packed_color(packed: i64) -> Rgb {
    Rgb::from_packed((packed & 0x00ff_ffff) as u32)
}

impl From<RawCamera> for Camera {
    fn from(raw: RawCamera) -> Self {
        Self {
            base: raw.base.into(),
            color: raw.color.map(packed_color),
            clips_created: raw.clips_created,
            is_alerting: raw.is_alerting,
            is_active: raw.active,
            camera_type: raw.camera_type,
            pause: raw.pause,
            is_enabled: raw.is_enabled,
            is_online: raw.is_online,
            is_no_signal: raw.is_no_signal,
            is_paused: raw.is_paused,
            is_recording: raw.is_recording,
            is_manually_recording: raw.is_man_rec,
            manual_recording_elapsed: raw.man_rec_elapsed_ms.map(millis),
            manual_recording_limit: raw.man_rec_limit_ms.map(millis),
            is_yellow: raw.is_yellow,
            profile: raw.profile,
            is_ptz_supported: raw.ptz,
            trigger_count: raw.n_triggers,
            no_signal_count: raw.n_no_signal,
            clip_count: raw.n_clips,
            error: raw.error,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawGroup {
    #[serde(flatten)]
    base: RawBase,
    #[serde(default)]
    group: Option<Vec<String>>,
    #[serde(default)]
    xsize: Option<u32>,
    #[serde(default)]
    ysize: Option<u32>,
    #[serde(default)]
    rects: Option<Vec<[i32; 4]>>,
}

impl From<RawGroup> for Group {
    fn from(raw: RawGroup) -> Self {
        let grid = match (raw.xsize, raw.ysize) {
            (None, None) => None,
            (columns, rows) => Some(GridSize {
                columns: columns.unwrap_or(0),
                rows: rows.unwrap_or(0),
            }),
        };

        Self {
            base: raw.base.into(),
            members: raw.group.unwrap_or_default(),
            grid,
            rects: raw
                .rects
                .unwrap_or_default()
                .into_iter()
                .map(Rect::from_corners)
                .collect(),
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────
