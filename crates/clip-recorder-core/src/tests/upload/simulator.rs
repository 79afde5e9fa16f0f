use crate::{UPLOAD_FAILED_MESSAGE, UploadProgress, UploadSettings, UploadSimulator, UploadStatus};

use std::time::Duration;

use rand::{SeedableRng, rngs::StdRng};
use tokio::sync::watch;

fn simulator(settings: UploadSettings, seed: u64) -> UploadSimulator {
    UploadSimulator::with_rng(settings, StdRng::seed_from_u64(seed))
}

async fn wait_until_finished(observer: &mut watch::Receiver<UploadProgress>) -> UploadProgress {
    loop {
        let progress = observer.borrow_and_update().clone();
        if progress.status != UploadStatus::Uploading {
            return progress;
        }
        if observer.changed().await.is_err() {
            return progress;
        }
    }
}

/// WHAT: With the default bounds every run fails before 100
/// WHY: The threshold range is always within reach of the steps
#[tokio::test(start_paused = true)]
async fn given_default_settings_when_uploading_then_fails_below_threshold_range() {
    for seed in 0..8 {
        // Given: A seeded simulator with default settings
        let mut upload = simulator(UploadSettings::default(), seed);
        let mut observer = upload.subscribe();

        // When: Running to the end
        upload.start();
        let finished = wait_until_finished(&mut observer).await;

        // Then: Failed with the upload message and progress under 89
        assert_eq!(finished.status, UploadStatus::Failed, "seed {seed}");
        assert_eq!(finished.error.as_deref(), Some(UPLOAD_FAILED_MESSAGE));
        assert!(finished.percent < 89, "seed {seed}: {}", finished.percent);
        assert!(!upload.is_uploading());
    }
}

/// WHAT: A threshold beyond 100 lets the run succeed
/// WHY: Success is reachable when configured
#[tokio::test(start_paused = true)]
async fn given_threshold_above_hundred_when_uploading_then_succeeds_at_hundred() {
    // Given: A simulator that can never hit its threshold
    let settings = UploadSettings {
        failure_threshold: 150..=150,
        ..UploadSettings::default()
    };
    let mut upload = simulator(settings, 7);
    let mut observer = upload.subscribe();

    // When: Running to the end
    upload.start();
    let finished = wait_until_finished(&mut observer).await;

    // Then: Succeeded at exactly 100 without an error
    assert_eq!(finished.status, UploadStatus::Succeeded);
    assert_eq!(finished.percent, 100);
    assert!(finished.error.is_none());
}

/// WHAT: Progress only ever increases during a run
/// WHY: The bar must not jump backwards
#[tokio::test(start_paused = true)]
async fn given_running_upload_when_observing_then_percent_never_decreases() {
    // Given: A run that succeeds
    let settings = UploadSettings {
        failure_threshold: 200..=200,
        ..UploadSettings::default()
    };
    let mut upload = simulator(settings, 3);
    let mut observer = upload.subscribe();
    upload.start();

    // When: Observing every change
    let mut seen = vec![observer.borrow_and_update().percent];
    while observer.changed().await.is_ok() {
        let progress = observer.borrow_and_update().clone();
        seen.push(progress.percent);
        if progress.status != UploadStatus::Uploading {
            break;
        }
    }

    // Then: Monotonic from 0 to 100
    assert_eq!(seen.first(), Some(&0));
    assert_eq!(seen.last(), Some(&100));
    assert!(seen.windows(2).all(|pair| pair[0] <= pair[1]));
}

/// WHAT: Reset mid-run returns to idle and nothing changes afterwards
/// WHY: A cancelled run must not report progress later
#[tokio::test(start_paused = true)]
async fn given_running_upload_when_reset_then_idle_and_no_further_ticks() {
    // Given: A run that has ticked a few times
    let settings = UploadSettings {
        failure_threshold: 200..=200,
        ..UploadSettings::default()
    };
    let mut upload = simulator(settings, 11);
    let mut observer = upload.subscribe();
    upload.start();
    tokio::time::sleep(Duration::from_millis(1_600)).await;
    assert!(upload.progress().percent > 0);

    // When: Resetting, then letting plenty of time pass
    upload.reset();
    observer.borrow_and_update();
    tokio::time::sleep(Duration::from_secs(30)).await;

    // Then: Idle at zero with no later updates
    assert_eq!(upload.progress(), UploadProgress::default());
    assert!(!observer.has_changed().unwrap_or(true));
}

/// WHAT: Starting again restarts from zero
/// WHY: A retry after failure begins a fresh run
#[tokio::test(start_paused = true)]
async fn given_failed_upload_when_starting_again_then_restarts_from_zero() {
    // Given: A failed run
    let mut upload = simulator(UploadSettings::default(), 5);
    let mut observer = upload.subscribe();
    upload.start();
    wait_until_finished(&mut observer).await;

    // When: Starting again
    upload.start();

    // Then: Uploading from zero without the old error
    let progress = upload.progress();
    assert_eq!(progress.status, UploadStatus::Uploading);
    assert_eq!(progress.percent, 0);
    assert!(progress.error.is_none());
}
