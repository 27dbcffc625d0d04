//! Camera types and the camera toggle cycle.

use serde::{Deserialize, Serialize};

/// How the camera follows (or ignores) its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CameraType {
    Null,
    /// Free-floating, no bound object.
    Free,
    Edit,
    /// First person, from inside the vehicle.
    Onboard,
    /// Chase camera behind the target.
    Back,
    /// Fixed orbit around the target.
    Fix,
    /// Short shake after an explosion.
    Explo,
    Script,
    Info,
    /// Guided camera towards a visit location.
    Visit,
    /// Neutral camera used by menus and phase changes.
    Dialog,
    /// Top view from above.
    Plane,
}

impl CameraType {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "FREE" => Self::Free,
            "EDIT" => Self::Edit,
            "ONBOARD" => Self::Onboard,
            "BACK" => Self::Back,
            "FIX" => Self::Fix,
            "EXPLO" => Self::Explo,
            "SCRIPT" => Self::Script,
            "INFO" => Self::Info,
            "VISIT" => Self::Visit,
            "DIALOG" => Self::Dialog,
            "PLANE" => Self::Plane,
            _ => return None,
        })
    }
}

/// Which set of camera types the toggle key cycles through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraCycle {
    /// Drawing robot: top view and chase camera.
    Drawing,
    /// Trainer vehicles: onboard, fixed, top, chase.
    Trainer,
    /// Everything else: onboard and chase.
    Standard,
}

/// Camera type after pressing the camera toggle.
pub fn next_camera(cycle: CameraCycle, current: CameraType) -> CameraType {
    match cycle {
        CameraCycle::Drawing => {
            if current == CameraType::Plane {
                CameraType::Back
            } else {
                CameraType::Plane
            }
        }
        CameraCycle::Trainer => match current {
            CameraType::Onboard => CameraType::Fix,
            CameraType::Fix => CameraType::Plane,
            CameraType::Plane => CameraType::Back,
            _ => CameraType::Onboard,
        },
        CameraCycle::Standard => {
            if current == CameraType::Onboard {
                CameraType::Back
            } else {
                CameraType::Onboard
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trainer_cycle_returns_to_start() {
        let mut cam = CameraType::Onboard;
        let mut seen = Vec::new();
        for _ in 0..4 {
            cam = next_camera(CameraCycle::Trainer, cam);
            seen.push(cam);
        }
        assert_eq!(
            seen,
            vec![CameraType::Fix, CameraType::Plane, CameraType::Back, CameraType::Onboard]
        );
    }

    #[test]
    fn test_standard_and_drawing_toggle() {
        assert_eq!(next_camera(CameraCycle::Standard, CameraType::Back), CameraType::Onboard);
        assert_eq!(next_camera(CameraCycle::Standard, CameraType::Onboard), CameraType::Back);
        assert_eq!(next_camera(CameraCycle::Drawing, CameraType::Back), CameraType::Plane);
        assert_eq!(next_camera(CameraCycle::Drawing, CameraType::Plane), CameraType::Back);
    }
}
