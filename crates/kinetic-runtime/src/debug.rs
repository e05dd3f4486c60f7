#![forbid(unsafe_code)]

//! Point-in-time view of a motion value for inspectors and logs.

use std::fmt;

use kinetic_core::{
    GuaranteeState, InputDirection, SegmentChangeType, SpringParameters, SpringState,
};

/// Everything a debugger wants to show about one motion value.
///
/// Pure projection: taking a snapshot does not change the motion value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DebugSnapshot {
    pub label: Option<String>,
    pub input: f32,
    pub output: f32,
    pub output_target: f32,
    pub is_stable: bool,
    pub is_running: bool,
    pub frame_time_nanos: i64,
    pub direction: InputDirection,
    pub gesture_drag_offset: f32,
    /// Display form of the active segment key, e.g. `[open, <max>]@Max`.
    pub segment: String,
    pub change_type: SegmentChangeType,
    pub spring_parameters: SpringParameters,
    pub spring_state: SpringState,
    pub guarantee_state: GuaranteeState,
}

impl fmt::Display for DebugSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} input={} output={} target={} {:?}",
            self.label.as_deref().unwrap_or("motion"),
            self.segment,
            self.input,
            self.output,
            self.output_target,
            self.change_type,
        )?;
        if self.is_stable {
            f.write_str(" stable")
        } else {
            write!(
                f,
                " spring(k={}, zeta={}, x={}, v={})",
                self.spring_parameters.stiffness(),
                self.spring_parameters.damping_ratio(),
                self.spring_state.displacement,
                self.spring_state.velocity,
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> DebugSnapshot {
        DebugSnapshot {
            label: Some("sheet".to_owned()),
            input: 2.0,
            output: 0.5,
            output_target: 1.0,
            is_stable: false,
            is_running: true,
            frame_time_nanos: 16_000_000,
            direction: InputDirection::Max,
            gesture_drag_offset: 0.0,
            segment: "[open, <max>]@Max".to_owned(),
            change_type: SegmentChangeType::Traverse,
            spring_parameters: SpringParameters::new(100.0, 1.0),
            spring_state: SpringState::new(-0.5, 2.0),
            guarantee_state: GuaranteeState::INACTIVE,
        }
    }

    #[test]
    fn display_shows_spring_while_moving() {
        assert_eq!(
            snapshot().to_string(),
            "sheet [open, <max>]@Max input=2 output=0.5 target=1 Traverse spring(k=100, zeta=1, x=-0.5, v=2)"
        );
    }

    #[test]
    fn display_when_stable() {
        let snapshot = DebugSnapshot {
            label: None,
            is_stable: true,
            change_type: SegmentChangeType::Same,
            ..snapshot()
        };
        assert_eq!(
            snapshot.to_string(),
            "motion [open, <max>]@Max input=2 output=0.5 target=1 Same stable"
        );
    }
}
