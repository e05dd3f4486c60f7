//! Serialized form of the plain data types (`--features serde`).
#![cfg(feature = "serde")]

use kinetic_core::{Guarantee, GuaranteeState, InputDirection, SegmentChangeType, SpringParameters, SpringState};
use serde_json::json;

#[test]
fn spring_parameters_serialize_as_fields() {
    let value = serde_json::to_value(SpringParameters::new(400.0, 0.5)).unwrap();
    assert_eq!(value, json!({ "stiffness": 400.0, "damping_ratio": 0.5 }));
}

#[test]
fn guarantee_variants_are_externally_tagged() {
    assert_eq!(serde_json::to_value(Guarantee::None).unwrap(), json!("None"));
    assert_eq!(
        serde_json::to_value(Guarantee::InputDelta(12.5)).unwrap(),
        json!({ "InputDelta": 12.5 })
    );
    let parsed: Guarantee = serde_json::from_value(json!({ "GestureDragDelta": 3.0 })).unwrap();
    assert_eq!(parsed, Guarantee::GestureDragDelta(3.0));
}

#[test]
fn frame_level_values_round_trip() {
    let state = SpringState::new(-0.25, 3.0);
    let text = serde_json::to_string(&state).unwrap();
    assert_eq!(serde_json::from_str::<SpringState>(&text).unwrap(), state);

    let guarantee = GuaranteeState::with_start_value(2.0).with_current_value(5.0, InputDirection::Max);
    let text = serde_json::to_string(&guarantee).unwrap();
    assert_eq!(serde_json::from_str::<GuaranteeState>(&text).unwrap(), guarantee);

    assert_eq!(serde_json::to_value(SegmentChangeType::Traverse).unwrap(), json!("Traverse"));
    assert_eq!(serde_json::to_value(InputDirection::Min).unwrap(), json!("Min"));
}
