use crate::{
    CaptureConstraints, CapturePhase, CaptureSession, DeviceFailure, DeviceStream, RecorderError,
    testing::{FakeDevices, FinalizeBehavior},
};

use std::time::Duration;

fn session(devices: &FakeDevices) -> CaptureSession<FakeDevices> {
    CaptureSession::new(devices.clone(), CaptureConstraints::default())
}

/// WHAT: Payload is the chunks concatenated in arrival order
/// WHY: Chunk order is the byte order of the recording
#[tokio::test(start_paused = true)]
#[allow(clippy::unwrap_used)]
async fn given_jittered_chunks_when_stopping_then_payload_keeps_order() {
    // Given: Three chunks arriving with uneven delays, plus a trailing flush
    let devices = FakeDevices::new();
    devices.set_chunks(
        vec![vec![1, 2], vec![3], vec![4, 5]],
        vec![
            Duration::from_millis(30),
            Duration::from_millis(1),
            Duration::from_millis(80),
        ],
    );
    devices.set_trailing_chunks(vec![vec![6]]);
    let mut capture = session(&devices);
    capture.start().await.unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    // When: Stopping
    let payload = capture.stop().await.unwrap();

    // Then: Bytes are in emission order, trailing chunk last
    assert_eq!(payload, Some(vec![1, 2, 3, 4, 5, 6]));
    assert_eq!(capture.phase(), CapturePhase::Idle);
}

/// WHAT: Empty chunks contribute nothing
/// WHY: Pipelines may emit empty data events between real ones
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_empty_chunks_when_stopping_then_they_are_dropped() {
    // Given: A mix of empty and non-empty chunks
    let devices = FakeDevices::new();
    devices.set_chunks(vec![vec![], vec![7], vec![]], Vec::new());
    let mut capture = session(&devices);
    capture.start().await.unwrap();

    // When: Stopping
    let payload = capture.stop().await.unwrap();

    // Then: Only the real bytes remain
    assert_eq!(payload, Some(vec![7]));
}

/// WHAT: A recording with no data still finalizes
/// WHY: An immediate stop yields an empty but valid payload
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_no_chunks_when_stopping_then_empty_payload() {
    // Given: An active session that emits nothing
    let devices = FakeDevices::new();
    let mut capture = session(&devices);
    capture.start().await.unwrap();

    // When: Stopping
    let payload = capture.stop().await.unwrap();

    // Then: An empty payload is returned
    assert_eq!(payload, Some(Vec::new()));
}

/// WHAT: Starting holds the tracks and stopping releases every one
/// WHY: Device indicators must switch off after recording
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_active_session_when_stopping_then_all_tracks_released() {
    // Given: An active session
    let devices = FakeDevices::new();
    let mut capture = session(&devices);
    let tracks = capture.start().await.unwrap().active_tracks();
    assert_eq!(tracks, 2);
    assert_eq!(devices.live_tracks(), 2);
    assert!(capture.is_active());

    // When: Stopping
    capture.stop().await.unwrap();

    // Then: Nothing is held
    assert_eq!(devices.live_tracks(), 0);
    assert_eq!(capture.active_tracks(), 0);
    assert!(capture.stream().is_none());
}

/// WHAT: A pipeline failure during finalize still releases the tracks
/// WHY: Device release must not depend on finalization succeeding
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_failing_pipeline_when_stopping_then_finalize_failed_and_tracks_released() {
    // Given: A pipeline that fails on stop
    let devices = FakeDevices::new();
    devices.set_chunks(vec![vec![1]], Vec::new());
    devices.set_finalize(FinalizeBehavior::Fail("encoder crashed".to_string()));
    let mut capture = session(&devices);
    capture.start().await.unwrap();

    // When: Stopping
    let result = capture.stop().await;

    // Then: Finalize error carries the reason, and the device is free
    assert!(matches!(
        result,
        Err(RecorderError::FinalizeFailed { ref reason, .. }) if reason == "encoder crashed"
    ));
    assert_eq!(devices.live_tracks(), 0);
    assert_eq!(capture.phase(), CapturePhase::Idle);
}

/// WHAT: A pipeline that closes silently is a finalize failure
/// WHY: Missing confirmation means the payload may be truncated
#[tokio::test]
async fn given_pipeline_closing_without_confirmation_when_stopping_then_finalize_failed() {
    // Given: A pipeline that drops its sink on stop
    let devices = FakeDevices::new();
    devices.set_finalize(FinalizeBehavior::Close);
    let mut capture = session(&devices);
    let _ = capture.start().await;

    // When: Stopping
    let result = capture.stop().await;

    // Then: Finalization failed and nothing is held
    assert!(matches!(result, Err(RecorderError::FinalizeFailed { .. })));
    assert_eq!(devices.live_tracks(), 0);
}

/// WHAT: A hung pipeline is abandoned after the finalize timeout
/// WHY: Stop must always terminate
#[tokio::test(start_paused = true)]
#[allow(clippy::unwrap_used)]
async fn given_hung_pipeline_when_stopping_then_times_out_and_releases_tracks() {
    // Given: A pipeline that never answers, with a short timeout
    let devices = FakeDevices::new();
    devices.set_finalize(FinalizeBehavior::Hang);
    let mut capture = session(&devices).with_finalize_timeout(Duration::from_secs(2));
    capture.start().await.unwrap();

    // When: Stopping
    let result = capture.stop().await;

    // Then: Timed out, and the session is reusable
    assert!(matches!(result, Err(RecorderError::FinalizeFailed { .. })));
    assert_eq!(devices.live_tracks(), 0);
    assert!(capture.start().await.is_ok());
}

/// WHAT: Stop without a recording is a no-op
/// WHY: A double stop must not fail or touch the devices
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_idle_session_when_stopping_then_returns_none() {
    // Given: An idle session
    let devices = FakeDevices::new();
    let mut capture = session(&devices);

    // When: Stopping
    let payload = capture.stop().await.unwrap();

    // Then: Nothing to return, no device contact
    assert!(payload.is_none());
    assert_eq!(devices.access_requests(), 0);
}

/// WHAT: A second start while recording is rejected
/// WHY: Only one recording may own the devices
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_active_session_when_starting_again_then_capture_busy() {
    // Given: An active session
    let devices = FakeDevices::new();
    let mut capture = session(&devices);
    capture.start().await.unwrap();

    // When: Starting again
    let result = capture.start().await;

    // Then: Rejected without a second acquisition
    assert!(matches!(result, Err(RecorderError::CaptureBusy { .. })));
    assert_eq!(devices.access_requests(), 1);
    assert_eq!(devices.live_tracks(), 2);
}

/// WHAT: A host without recording support fails fast
/// WHY: No device should be touched when recording is impossible
#[tokio::test]
async fn given_unsupported_host_when_starting_then_unsupported_environment() {
    // Given: A host lacking recording capability
    let devices = FakeDevices::new();
    devices.set_supports_recording(false);
    let mut capture = session(&devices);

    // When: Starting
    let result = capture.start().await;

    // Then: Rejected before any access request
    assert!(matches!(result, Err(RecorderError::UnsupportedEnvironment { .. })));
    assert_eq!(devices.access_requests(), 0);
}

/// WHAT: Denied access leaves the session idle
/// WHY: The user may grant access and try again
#[tokio::test]
async fn given_denied_access_when_starting_then_permission_denied_and_idle() {
    // Given: Access is denied
    let devices = FakeDevices::new();
    devices.set_access_failure(Some(DeviceFailure::PermissionDenied));
    let mut capture = session(&devices);

    // When: Starting
    let result = capture.start().await;

    // Then: Denied, idle, and nothing held
    assert!(matches!(result, Err(RecorderError::PermissionDenied { .. })));
    assert_eq!(capture.phase(), CapturePhase::Idle);
    assert_eq!(devices.live_tracks(), 0);
}

/// WHAT: Recorder binding failure releases the acquired stream
/// WHY: The stream was granted before the failure and must not leak
#[tokio::test]
async fn given_recorder_failure_when_starting_then_stream_released() {
    // Given: Access succeeds but the recorder cannot bind
    let devices = FakeDevices::new();
    devices.set_recorder_failure(Some(DeviceFailure::DeviceBusy));
    let mut capture = session(&devices);

    // When: Starting
    let result = capture.start().await;

    // Then: Busy error, and the stream is released
    assert!(matches!(result, Err(RecorderError::DeviceBusy { .. })));
    assert_eq!(devices.live_tracks(), 0);
    assert!(!capture.is_active());
}

/// WHAT: The access check releases its stream immediately
/// WHY: Checking permission must not leave the devices busy
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_idle_session_when_requesting_access_then_stream_released() {
    // Given: An idle session
    let devices = FakeDevices::new();
    let mut capture = session(&devices);

    // When: Requesting access
    capture.request_access().await.unwrap();

    // Then: Access was requested with the configured constraints and nothing is held
    assert_eq!(devices.access_requests(), 1);
    assert_eq!(devices.last_constraints(), Some(CaptureConstraints::default()));
    assert_eq!(devices.live_tracks(), 0);
}

/// WHAT: Access check during a recording does not reacquire
/// WHY: The active recording already proves access
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_active_session_when_requesting_access_then_no_new_request() {
    // Given: An active session
    let devices = FakeDevices::new();
    let mut capture = session(&devices);
    capture.start().await.unwrap();

    // When: Requesting access
    capture.request_access().await.unwrap();

    // Then: Only the original request was made
    assert_eq!(devices.access_requests(), 1);
    assert!(capture.is_active());
}
