// Inventory listing
//
// `camlist` returns every camera and group visible to the session, in
// server order: grouped cameras first (beneath their group), ungrouped
// cameras after, disabled cameras at the end. The order is kept as-is.

use tracing::debug;

use crate::error::Error;
use crate::protocol::client::Client;
use crate::protocol::inventory::DeviceEntry;
use crate::protocol::models::CamListRequest;

/// Combine the two reset flags into the wire bit-field: `1` resets the
/// statistic counters, `2` the new-alert counters. Omitted entirely when
/// neither is set.
fn reset_bits(reset_stats: bool, reset_alerts: bool) -> Option<u8> {
    let bits = u8::from(reset_stats) | (u8::from(reset_alerts) << 1);
    (bits > 0).then_some(bits)
}

impl Client {
    /// List cameras and groups in server order.
    ///
    /// `reset_stats` and `reset_alerts` clear the per-camera statistic
    /// and new-alert counters as a side effect of the listing.
    pub async fn list_cameras(
        &self,
        reset_stats: bool,
        reset_alerts: bool,
    ) -> Result<Vec<DeviceEntry>, Error> {
        let request = CamListRequest {
            cmd: "camlist",
            session: self.session(),
            reset: reset_bits(reset_stats, reset_alerts),
        };

        debug!(reset = ?request.reset, "listing cameras and groups");
        let envelope = Self::expect_success(self.post_json::<Vec<DeviceEntry>>(&request).await?)?;

        envelope.data.ok_or_else(|| Error::Deserialization {
            message: "camlist succeeded without a data payload".into(),
            body: String::new(),
        })
    }
}

// ── Tests ────────────────────────────────────────────────────────────
