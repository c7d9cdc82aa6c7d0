//! Rotation arithmetic between the screen, the sensor and the preview.
//!
//! These are the only places rotation degrees are computed. Inputs are taken
//! modulo 360, so every reading in `[0, 360)` is used as-is.

use serde::{Deserialize, Serialize};

/// Direction a camera sensor points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    Back,
    Front,
}

/// True for the two landscape screen readings.
pub fn is_landscape(screen_orientation: u32) -> bool {
    screen_orientation == 90 || screen_orientation == 270
}

/// Rotation the hardware applies to captured frames.
pub fn capture_rotation(facing: Facing, sensor_angle: u32, screen_orientation: u32) -> u32 {
    let sensor = sensor_angle % 360;
    let screen = screen_orientation % 360;

    let degrees = match facing {
        Facing::Front => (sensor + screen) % 360,
        Facing::Back => {
            let landscape_flip = if is_landscape(screen) { 180 } else { 0 };
            (sensor + screen + landscape_flip) % 360
        }
    };

    quadrant_or_fallback(degrees, screen)
}

/// Rotation applied to the live preview so it appears upright.
pub fn display_rotation(facing: Facing, sensor_angle: u32, screen_orientation: u32) -> u32 {
    let sensor = sensor_angle % 360;
    let screen = screen_orientation % 360;

    let degrees = match facing {
        Facing::Front => (360 - (sensor + screen) % 360) % 360,
        Facing::Back => (sensor + 360 - screen) % 360,
    };

    quadrant_or_fallback(degrees, screen)
}

// Non-quadrant results fall back to the screen reading, then to zero.
fn quadrant_or_fallback(degrees: u32, screen: u32) -> u32 {
    if degrees % 90 == 0 {
        degrees
    } else if screen % 90 == 0 {
        screen
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const QUADRANTS: [u32; 4] = [0, 90, 180, 270];

    // Degrees before the quadrant fallback, computed with signed arithmetic
    fn raw_rotations(facing: Facing, sensor: u32, screen: u32) -> (u32, u32) {
        let (sensor, screen) = (sensor as i64, screen as i64);
        let flip = if screen == 90 || screen == 270 { 180 } else { 0 };
        let (capture, display) = match facing {
            Facing::Front => (sensor + screen, -(sensor + screen)),
            Facing::Back => (sensor + screen + flip, sensor - screen),
        };
        (capture.rem_euclid(360) as u32, display.rem_euclid(360) as u32)
    }

    #[test]
    fn test_back_camera_portrait() {
        // Typical phone back sensor mounted at 90 degrees
        assert_eq!(display_rotation(Facing::Back, 90, 0), 90);
        assert_eq!(capture_rotation(Facing::Back, 90, 0), 90);
    }

    #[test]
    fn test_back_camera_landscape_flip() {
        assert_eq!(capture_rotation(Facing::Back, 90, 90), 0);
        assert_eq!(capture_rotation(Facing::Back, 90, 270), 180);
        assert_eq!(display_rotation(Facing::Back, 90, 90), 0);
        assert_eq!(display_rotation(Facing::Back, 90, 270), 180);
    }

    #[test]
    fn test_front_camera() {
        assert_eq!(capture_rotation(Facing::Front, 270, 0), 270);
        assert_eq!(capture_rotation(Facing::Front, 270, 90), 0);
        assert_eq!(display_rotation(Facing::Front, 270, 0), 90);
        assert_eq!(display_rotation(Facing::Front, 270, 90), 0);
        assert_eq!(display_rotation(Facing::Front, 0, 0), 0);
    }

    #[test]
    fn test_all_quadrant_combinations_are_aligned() {
        for facing in [Facing::Front, Facing::Back] {
            for sensor in QUADRANTS {
                for screen in QUADRANTS {
                    let display = display_rotation(facing, sensor, screen);
                    let capture = capture_rotation(facing, sensor, screen);
                    assert!(display < 360 && display % 90 == 0);
                    assert!(capture < 360 && capture % 90 == 0);
                }
            }
        }
    }

    #[test]
    fn test_unaligned_reading_falls_back_to_zero() {
        assert_eq!(display_rotation(Facing::Back, 90, 45), 0);
        assert_eq!(capture_rotation(Facing::Back, 90, 45), 0);
        assert_eq!(display_rotation(Facing::Front, 0, 30), 0);
        assert_eq!(capture_rotation(Facing::Front, 0, 30), 0);
    }

    #[test]
    fn test_unaligned_sensor_falls_back_to_screen() {
        assert_eq!(display_rotation(Facing::Back, 45, 90), 90);
        assert_eq!(capture_rotation(Facing::Back, 45, 180), 180);
        assert_eq!(display_rotation(Facing::Front, 10, 270), 270);
    }

    proptest! {
        #[test]
        fn prop_rotations_stay_in_range(
            front in any::<bool>(),
            sensor in 0u32..360,
            screen in 0u32..360,
        ) {
            let facing = if front { Facing::Front } else { Facing::Back };
            let display = display_rotation(facing, sensor, screen);
            let capture = capture_rotation(facing, sensor, screen);
            prop_assert!(display < 360);
            prop_assert!(capture < 360);
            prop_assert!(display % 90 == 0 || display == screen);
            prop_assert!(capture % 90 == 0 || capture == screen);
        }

        #[test]
        fn prop_quadrant_inputs_give_quadrant_outputs(
            front in any::<bool>(),
            sensor_step in 0u32..4,
            screen_step in 0u32..4,
        ) {
            let facing = if front { Facing::Front } else { Facing::Back };
            let sensor = sensor_step * 90;
            let screen = screen_step * 90;
            prop_assert_eq!(display_rotation(facing, sensor, screen) % 90, 0);
            prop_assert_eq!(capture_rotation(facing, sensor, screen) % 90, 0);
        }

        #[test]
        fn prop_unaligned_results_follow_fallback_rule(
            front in any::<bool>(),
            sensor in 0u32..360,
            screen in 0u32..360,
        ) {
            let facing = if front { Facing::Front } else { Facing::Back };
            let (raw_capture, raw_display) = raw_rotations(facing, sensor, screen);
            let expected = |raw: u32| {
                if raw % 90 == 0 {
                    raw
                } else if screen % 90 == 0 {
                    screen
                } else {
                    0
                }
            };
            prop_assert_eq!(capture_rotation(facing, sensor, screen), expected(raw_capture));
            prop_assert_eq!(display_rotation(facing, sensor, screen), expected(raw_display));
        }

        #[test]
        fn prop_unaligned_screen_and_result_give_zero(
            front in any::<bool>(),
            sensor in 0u32..360,
            screen in 0u32..360,
        ) {
            prop_assume!(screen % 90 != 0);
            let facing = if front { Facing::Front } else { Facing::Back };
            let (raw_capture, raw_display) = raw_rotations(facing, sensor, screen);
            if raw_capture % 90 != 0 {
                prop_assert_eq!(capture_rotation(facing, sensor, screen), 0);
            }
            if raw_display % 90 != 0 {
                prop_assert_eq!(display_rotation(facing, sensor, screen), 0);
            }
        }
    }
}
