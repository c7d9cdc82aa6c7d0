use super::*;
use crate::error::CameraError;
use crate::frame::FrameData;
use crate::size::Size;
use crate::surface::{SurfaceKind, SurfaceOutput};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[test]
fn test_phone_backend_enumeration() {
    let backend = SimulatedBackend::phone(BackendKind::Legacy);

    assert_eq!(backend.kind(), BackendKind::Legacy);
    assert_eq!(backend.device_count(), 2);

    let back = backend.device_info(0).unwrap();
    assert_eq!(back.orientation, 90);
    let front = backend.device_info(1).unwrap();
    assert_eq!(front.orientation, 270);

    assert!(matches!(
        backend.device_info(5),
        Err(CameraError::InvalidDevice { device: 5 })
    ));
}

#[test]
fn test_open_failure_is_recorded() {
    let mut backend = SimulatedBackend::new(
        BackendKind::Legacy,
        vec![SimulatedDevice::back().failing_open()],
    );
    let probe = backend.probe();

    assert!(matches!(
        backend.open(0),
        Err(CameraError::Open { device: 0, .. })
    ));
    assert!(matches!(
        backend.open(3),
        Err(CameraError::Open { device: 3, .. })
    ));

    let snapshot = probe.snapshot();
    assert_eq!(snapshot.open_attempts, vec![0, 3]);
    assert_eq!(snapshot.live_handles, 0);
}

#[test]
fn test_commit_rejects_unsupported_preview_size() {
    let mut backend = SimulatedBackend::phone(BackendKind::Legacy);
    let probe = backend.probe();
    let mut handle = backend.open(0).unwrap();

    let rejected = HardwareParameters {
        preview_size: Some(Size::new(4000, 3000)),
        ..HardwareParameters::default()
    };
    assert!(handle.set_parameters(&rejected).is_err());

    let accepted = HardwareParameters {
        preview_size: Some(Size::new(1280, 720)),
        rotation: 90,
        focus_mode: Some(FocusMode::Fixed),
    };
    assert!(handle.set_parameters(&accepted).is_ok());
    assert_eq!(handle.parameters(), accepted);

    let snapshot = probe.snapshot();
    assert_eq!(snapshot.commits.len(), 2);
    assert_eq!(snapshot.rejected_commits, 1);

    handle.release();
    assert_eq!(probe.snapshot().live_handles, 0);
}

#[test]
fn test_frames_only_flow_while_streaming() {
    let mut backend = SimulatedBackend::phone(BackendKind::Legacy);
    let probe = backend.probe();
    let mut handle = backend.open(0).unwrap();

    let received = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&received);
    handle.set_frame_callback(Some(Arc::new(move |_frame: FrameData| {
        counter.fetch_add(1, Ordering::Relaxed);
    })));

    assert!(!probe.emit_frame(vec![0; 8], Size::new(4, 1)));

    handle.start_preview().unwrap();
    assert!(probe.emit_frame(vec![0; 8], Size::new(4, 1)));
    assert_eq!(received.load(Ordering::Relaxed), 1);

    handle.stop_preview();
    assert!(!probe.emit_frame(vec![0; 8], Size::new(4, 1)));
    assert_eq!(received.load(Ordering::Relaxed), 1);

    handle.release();
}

#[test]
fn test_capture_thread_generates_frames() {
    let mut backend = SimulatedBackend::phone(BackendKind::Advanced)
        .with_fps(100)
        .with_frame_bytes(16);
    let probe = backend.probe();
    let mut handle = backend.open(0).unwrap();

    let received = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&received);
    handle.set_frame_callback(Some(Arc::new(move |frame: FrameData| {
        assert_eq!(frame.data.len(), 16);
        counter.fetch_add(1, Ordering::Relaxed);
    })));
    handle.start_preview().unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    while received.load(Ordering::Relaxed) < 3 && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(10));
    }
    handle.release();

    assert!(received.load(Ordering::Relaxed) >= 3);
    assert!(!probe.snapshot().streaming);
}

#[test]
fn test_pause_requirements() {
    let mut backend = SimulatedBackend::new(
        BackendKind::Legacy,
        vec![SimulatedDevice::back().pausing_for_live_changes()],
    );
    let handle = backend.open(0).unwrap();

    assert!(handle.requires_pause_for(&LiveProperty::DisplayOrientation));
    assert!(handle.requires_pause_for(&LiveProperty::PreviewTarget(SurfaceKind::Holder)));
    assert!(!handle.requires_pause_for(&LiveProperty::PreviewTarget(SurfaceKind::Texture)));
    handle.release();

    let mut backend = SimulatedBackend::phone(BackendKind::Legacy);
    let mut handle = backend.open(1).unwrap();
    assert!(!handle.requires_pause_for(&LiveProperty::DisplayOrientation));

    let output = SurfaceOutput {
        kind: SurfaceKind::Texture,
        id: 7,
        size: Size::new(800, 480),
    };
    handle.bind_surface(&output).unwrap();
    assert_eq!(backend.probe().snapshot().bindings, vec![output]);
    handle.release();
}

#[test]
fn test_capture_thread_emits_full_nv21_frames_by_default() {
    let mut backend = SimulatedBackend::phone(BackendKind::Legacy).with_fps(100);
    let mut handle = backend.open(0).unwrap();
    handle
        .set_parameters(&HardwareParameters {
            preview_size: Some(Size::new(640, 480)),
            ..HardwareParameters::default()
        })
        .unwrap();

    let complete = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&complete);
    handle.set_frame_callback(Some(Arc::new(move |frame: FrameData| {
        if frame.is_complete() && frame.size == Size::new(640, 480) {
            counter.fetch_add(1, Ordering::Relaxed);
        }
    })));
    handle.start_preview().unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    while complete.load(Ordering::Relaxed) < 2 && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(10));
    }
    handle.release();

    assert!(complete.load(Ordering::Relaxed) >= 2);
}

#[test]
fn test_high_fps_keeps_a_nonzero_interval() {
    let backend = SimulatedBackend::phone(BackendKind::Legacy).with_fps(5000);
    let interval = backend.frame_interval().unwrap();
    assert!(interval > Duration::ZERO);
    assert!(interval < Duration::from_millis(1));

    assert_eq!(
        SimulatedBackend::phone(BackendKind::Legacy)
            .with_fps(0)
            .frame_interval(),
        None
    );
}

#[test]
fn test_commit_limit_rejects_later_commits() {
    let mut backend = SimulatedBackend::new(
        BackendKind::Legacy,
        vec![SimulatedDevice::back().rejecting_after(1)],
    );
    let probe = backend.probe();
    let params = HardwareParameters {
        preview_size: Some(Size::new(1280, 720)),
        ..HardwareParameters::default()
    };

    let mut handle = backend.open(0).unwrap();
    assert!(handle.set_parameters(&params).is_ok());
    assert!(matches!(
        handle.set_parameters(&params),
        Err(CameraError::Commit { .. })
    ));
    handle.release();

    // The limit counts per open
    let mut handle = backend.open(0).unwrap();
    assert!(handle.set_parameters(&params).is_ok());
    handle.release();

    assert_eq!(probe.snapshot().rejected_commits, 1);
}
