//! Reconciles a requested [`ParameterSet`] with what the open device supports.

use crate::device::{Capabilities, DeviceHandle, DeviceInfo, FocusMode, HardwareParameters};
use crate::error::CameraError;
use crate::orientation::capture_rotation;
use crate::parameters::ParameterSet;
use crate::size::Size;
use tracing::{debug, warn};

/// Resolution retried once when the hardware rejects the requested one
pub const SAFE_FALLBACK_SIZE: Size = Size::new(640, 480);

/// Pick a focus mode in priority order: continuous-picture (only when
/// autofocus is requested), fixed, infinity, then whatever comes first.
pub fn select_focus_mode(modes: &[FocusMode], autofocus: bool) -> Option<FocusMode> {
    if autofocus && modes.contains(&FocusMode::ContinuousPicture) {
        return Some(FocusMode::ContinuousPicture);
    }
    [FocusMode::Fixed, FocusMode::Infinity]
        .into_iter()
        .find(|mode| modes.contains(mode))
        .or_else(|| modes.first().copied())
}

/// Capture size used when the caller did not request one
pub fn default_capture_size(capabilities: &Capabilities) -> Size {
    Size::largest(&capabilities.capture_sizes).unwrap_or_else(|| {
        warn!(
            "Camera reports no capture sizes, using {}",
            SAFE_FALLBACK_SIZE
        );
        SAFE_FALLBACK_SIZE
    })
}

/// Apply `parameters` to the device and commit them.
///
/// On a rejected commit both the requested and the working parameters are
/// overwritten with [`SAFE_FALLBACK_SIZE`] and the commit is retried exactly
/// once. Streaming is paused around the commit when `streaming` is set.
/// Returns the size the hardware accepted.
pub fn negotiate(
    device: &mut dyn DeviceHandle,
    info: &DeviceInfo,
    capabilities: &Capabilities,
    parameters: &mut ParameterSet,
    working: &mut HardwareParameters,
    streaming: bool,
) -> Result<Size, CameraError> {
    let requested = match parameters.capture_size {
        Some(size) => size,
        None => {
            let size = default_capture_size(capabilities);
            parameters.capture_size = Some(size);
            size
        }
    };

    if streaming {
        device.stop_preview();
    }

    working.preview_size = Some(requested);
    working.rotation = capture_rotation(info.facing, info.orientation, parameters.display_orientation);
    working.focus_mode = select_focus_mode(&capabilities.focus_modes, parameters.autofocus);

    debug!(
        "Committing camera {} parameters: {} rotation {} focus {:?}",
        info.id, requested, working.rotation, working.focus_mode
    );

    let negotiated = match device.set_parameters(working) {
        Ok(()) => requested,
        Err(e) => {
            warn!(
                "Camera {} rejected {} ({}), retrying at {}",
                info.id, requested, e, SAFE_FALLBACK_SIZE
            );
            parameters.capture_size = Some(SAFE_FALLBACK_SIZE);
            working.preview_size = Some(SAFE_FALLBACK_SIZE);
            device
                .set_parameters(working)
                .map_err(|e| CameraError::ConfigurationRejected {
                    size: SAFE_FALLBACK_SIZE,
                    details: e.to_string(),
                })?;
            SAFE_FALLBACK_SIZE
        }
    };

    parameters.preview_size = Some(negotiated);

    if streaming {
        device.start_preview()?;
    }

    Ok(negotiated)
}
