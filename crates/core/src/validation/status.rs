use serde::{Deserialize, Serialize};

use crate::analysis::geometric_analyzer::Orientation;
use crate::shared::bounding_box::BoundingBox;

pub const MSG_INITIALIZING: &str = "Iniciando detección...";
pub const MSG_UNAVAILABLE: &str = "Error al inicializar detección facial";
pub const MSG_NO_FACE: &str = "No se detecta ningún rostro";
pub const MSG_MULTIPLE_FACES: &str =
    "Hay múltiples rostros. Por favor, asegúrate de que solo aparezcas tú.";
pub const MSG_READY: &str = "¡Perfecto! Listo para capturar foto";
pub const MSG_ADJUST: &str = "Ajusta tu posición";

/// Tri-state summary used for guidance color and overlay strokes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Red,
    Yellow,
    Green,
}

impl Verdict {
    pub fn hex(&self) -> &'static str {
        match self {
            Verdict::Red => "#ef4444",
            Verdict::Yellow => "#eab308",
            Verdict::Green => "#22c55e",
        }
    }

    pub fn rgba(&self) -> [u8; 4] {
        match self {
            Verdict::Red => [0xef, 0x44, 0x44, 0xff],
            Verdict::Yellow => [0xea, 0xb3, 0x08, 0xff],
            Verdict::Green => [0x22, 0xc5, 0x5e, 0xff],
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Red => write!(f, "red"),
            Verdict::Yellow => write!(f, "yellow"),
            Verdict::Green => write!(f, "green"),
        }
    }
}

/// Raw, unrounded measurements of the single detected face.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeometricMetrics {
    pub face_percentage: f64,
    pub brightness: f64,
    pub sharpness: f64,
    pub orientation: Orientation,
    pub centered: bool,
}

/// Outcome of each individual check.
///
/// Only `has_face`, `single_face`, `face_size_in_range` and `brightness`
/// decide whether capture is allowed; `centered` and `orientation` are
/// informational.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checks {
    pub has_face: bool,
    pub single_face: bool,
    pub face_size_in_range: bool,
    pub brightness: bool,
    pub centered: bool,
    pub orientation: bool,
}

impl Checks {
    pub fn can_capture(&self) -> bool {
        self.has_face && self.single_face && self.face_size_in_range && self.brightness
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatusDetails {
    pub metrics: GeometricMetrics,
    pub checks: Checks,
    pub bounding_box: BoundingBox,
}

/// The only artifact consumers observe. Each instance fully replaces the
/// previous one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValidationStatus {
    pub is_valid: bool,
    pub color: Verdict,
    pub message: String,
    pub details: Option<StatusDetails>,
}

impl ValidationStatus {
    pub fn rejected(color: Verdict, message: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            color,
            message: message.into(),
            details: None,
        }
    }

    /// State before the first processed frame.
    pub fn initializing() -> Self {
        Self::rejected(Verdict::Red, MSG_INITIALIZING)
    }

    /// Terminal state after the detection engine failed to initialize.
    pub fn unavailable() -> Self {
        Self::rejected(Verdict::Red, MSG_UNAVAILABLE)
    }

    pub fn no_face() -> Self {
        Self::rejected(Verdict::Red, MSG_NO_FACE)
    }

    pub fn multiple_faces() -> Self {
        Self::rejected(Verdict::Red, MSG_MULTIPLE_FACES)
    }

    pub fn metrics(&self) -> Option<&GeometricMetrics> {
        self.details.as_ref().map(|d| &d.metrics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_hex_matches_rgba() {
        for v in [Verdict::Red, Verdict::Yellow, Verdict::Green] {
            let [r, g, b, _] = v.rgba();
            assert_eq!(v.hex(), format!("#{r:02x}{g:02x}{b:02x}"));
        }
    }

    #[test]
    fn test_verdict_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Verdict::Yellow).unwrap(), "\"yellow\"");
        assert_eq!(Verdict::Green.to_string(), "green");
    }

    #[test]
    fn test_fixed_statuses_are_red_and_invalid() {
        for s in [
            ValidationStatus::initializing(),
            ValidationStatus::unavailable(),
            ValidationStatus::no_face(),
            ValidationStatus::multiple_faces(),
        ] {
            assert!(!s.is_valid);
            assert_eq!(s.color, Verdict::Red);
            assert!(s.details.is_none());
        }
        assert_eq!(
            ValidationStatus::unavailable().message,
            "Error al inicializar detección facial"
        );
    }

    #[test]
    fn test_can_capture_ignores_centering_and_orientation() {
        let checks = Checks {
            has_face: true,
            single_face: true,
            face_size_in_range: true,
            brightness: true,
            centered: false,
            orientation: false,
        };
        assert!(checks.can_capture());
        assert!(!Checks {
            brightness: false,
            ..checks
        }
        .can_capture());
    }
}
