use crate::size::Size;
use serde::{Deserialize, Serialize};

/// Value of `scale` meaning "not set"
pub const SCALE_UNSET: f32 = -1.0;

/// Which physical camera the caller asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraSelector {
    #[default]
    Back,
    Front,
}

impl CameraSelector {
    /// Device index this selector maps to when scanning devices
    pub fn index(&self) -> usize {
        match self {
            CameraSelector::Back => 0,
            CameraSelector::Front => 1,
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            CameraSelector::Back => CameraSelector::Front,
            CameraSelector::Front => CameraSelector::Back,
        }
    }
}

/// Placement hint for the preview inside its container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gravity {
    #[default]
    Center,
    Top,
    Bottom,
    Start,
    End,
}

/// Requested and negotiated session configuration.
///
/// Unset values are `None` (sizes) or [`SCALE_UNSET`] (scale). The setters and
/// [`ParameterSet::merge`] never let an unset value overwrite a set one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSet {
    pub camera: CameraSelector,
    /// Resolution requested from the sensor
    pub capture_size: Option<Size>,
    /// Resolution actually applied, measured by the UI
    pub preview_size: Option<Size>,
    /// Screen-orientation reading in degrees
    pub display_orientation: u32,
    pub scale: f32,
    pub autofocus: bool,
    pub adjust_view_bounds: bool,
    pub adjust_vertical: bool,
    pub gravity: Gravity,
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self {
            camera: CameraSelector::Back,
            capture_size: None,
            preview_size: None,
            display_orientation: 0,
            scale: SCALE_UNSET,
            autofocus: true,
            adjust_view_bounds: true,
            adjust_vertical: false,
            gravity: Gravity::Center,
        }
    }
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scale(&self) -> Option<f32> {
        if self.scale == SCALE_UNSET {
            None
        } else {
            Some(self.scale)
        }
    }

    pub fn set_scale(&mut self, scale: f32) -> &mut Self {
        if scale != SCALE_UNSET {
            self.scale = scale;
        }
        self
    }

    pub fn set_capture_size(&mut self, size: Option<Size>) -> &mut Self {
        if let Some(size) = size {
            self.capture_size = Some(size);
        }
        self
    }

    pub fn set_preview_size(&mut self, size: Option<Size>) -> &mut Self {
        if let Some(size) = size {
            self.preview_size = Some(size);
        }
        self
    }

    pub fn set_camera(&mut self, camera: CameraSelector) -> &mut Self {
        self.camera = camera;
        self
    }

    pub fn set_display_orientation(&mut self, degrees: u32) -> &mut Self {
        self.display_orientation = degrees;
        self
    }

    pub fn set_autofocus(&mut self, autofocus: bool) -> &mut Self {
        self.autofocus = autofocus;
        self
    }

    pub fn set_adjust_view_bounds(&mut self, adjust: bool) -> &mut Self {
        self.adjust_view_bounds = adjust;
        self
    }

    pub fn set_adjust_vertical(&mut self, adjust: bool) -> &mut Self {
        self.adjust_vertical = adjust;
        self
    }

    pub fn set_gravity(&mut self, gravity: Gravity) -> &mut Self {
        self.gravity = gravity;
        self
    }

    /// Fill this set from `source`, skipping every value `source` leaves unset.
    pub fn merge(&mut self, source: &ParameterSet) -> &mut Self {
        self.set_scale(source.scale)
            .set_camera(source.camera)
            .set_display_orientation(source.display_orientation)
            .set_adjust_vertical(source.adjust_vertical)
            .set_adjust_view_bounds(source.adjust_view_bounds)
            .set_autofocus(source.autofocus)
            .set_gravity(source.gravity)
            .set_preview_size(source.preview_size)
            .set_capture_size(source.capture_size)
    }
}

/// Free-function form of [`ParameterSet::merge`].
pub fn merge<'a>(target: &'a mut ParameterSet, source: &ParameterSet) -> &'a mut ParameterSet {
    target.merge(source)
}
