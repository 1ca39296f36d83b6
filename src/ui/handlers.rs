//! HTTP API handlers

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::audio::buffer::Allocation;
use crate::audio::device::{list_devices, AudioDeviceInfo};
use crate::monitor::counters::{IntervalValues, LifetimeValues};
use crate::monitor::stats::StatsSnapshot;
use crate::ui::server::AppState;

/// API response wrapper
#[derive(serde::Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

/// Live buffer state plus the last periodic report
#[derive(serde::Serialize)]
pub struct SystemStatus {
    pub uptime_seconds: u64,
    pub format: String,
    pub occupied: usize,
    pub capacity: usize,
    pub fill_percent: f32,
    pub allocation: Allocation,
    /// Counts accumulated since the last report
    pub pending: IntervalValues,
    pub lifetime: LifetimeValues,
    pub last_report: Option<StatsSnapshot>,
}

/// Get system status
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<ApiResponse<SystemStatus>> {
    let ring = state.buffer.stats();
    let status = SystemStatus {
        uptime_seconds: state.started.elapsed().as_secs(),
        format: state.format.to_string(),
        occupied: ring.occupied,
        capacity: ring.capacity,
        fill_percent: ring.occupied as f32 * 100.0 / ring.capacity as f32,
        allocation: state.buffer.allocation(),
        pending: state.counters.peek(),
        lifetime: state.counters.lifetime(),
        last_report: state.latest.read().clone(),
    };

    Json(ApiResponse::ok(status))
}

/// Get available output devices
pub async fn get_devices() -> Json<ApiResponse<Vec<AudioDeviceInfo>>> {
    match tokio::task::spawn_blocking(list_devices).await {
        Ok(devices) => Json(ApiResponse::ok(devices)),
        Err(e) => Json(ApiResponse::error(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::buffer::RingBuffer;
    use crate::audio::format::PcmFormat;
    use crate::monitor::counters::IntervalCounters;
    use parking_lot::RwLock;
    use std::time::Instant;

    fn state() -> Arc<AppState> {
        Arc::new(AppState {
            buffer: Arc::new(RingBuffer::new(2048)),
            counters: Arc::new(IntervalCounters::new()),
            latest: Arc::new(RwLock::new(None)),
            format: PcmFormat::default(),
            started: Instant::now(),
        })
    }

    #[tokio::test]
    async fn test_status_reports_live_occupancy() {
        let state = state();
        state.buffer.try_write(&[0; 512]);
        state.counters.record_packet(512);

        let Json(response) = get_status(State(state.clone())).await;
        assert!(response.success);
        let status = response.data.unwrap();
        assert_eq!(status.occupied, 512);
        assert_eq!(status.capacity, 2048);
        assert_eq!(status.fill_percent, 25.0);
        assert_eq!(status.pending.packets_received, 1);
        assert!(status.last_report.is_none());

        // Reading status never consumes the interval counters
        assert_eq!(state.counters.peek().packets_received, 1);
    }

    #[test]
    fn test_error_response_omits_data() {
        let response: ApiResponse<()> = ApiResponse::error("boom");
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json, serde_json::json!({ "success": false, "error": "boom" }));
    }
}
