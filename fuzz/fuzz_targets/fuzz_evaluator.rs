#![no_main]

use std::sync::Arc;

use arbitrary::Arbitrary;
use kinetic_core::{
    Breakpoint, DEFAULT_STABLE_THRESHOLD, DirectionalSpec, FrameInput, FrameState, Guarantee,
    InputDirection, Mapping, MotionSpec, SpringParameters, compute_frame,
};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum FuzzMapping {
    Zero,
    One,
    Identity,
    Fixed(i16),
    Linear(i8, i16),
}

impl FuzzMapping {
    fn build(&self) -> Mapping {
        match *self {
            Self::Zero => Mapping::Zero,
            Self::One => Mapping::One,
            Self::Identity => Mapping::Identity,
            Self::Fixed(value) => Mapping::Fixed(f32::from(value) / 8.0),
            Self::Linear(factor, offset) => {
                Mapping::linear(f32::from(factor) / 16.0, f32::from(offset) / 8.0)
            }
        }
    }
}

#[derive(Debug, Arbitrary)]
struct FuzzBreakpoint {
    position: i16,
    stiffness: u16,
    damping: u8,
    guarantee: u8,
}

#[derive(Debug, Arbitrary)]
struct FuzzStep {
    input: i16,
    toward_max: bool,
    drag_offset: i16,
    elapsed_micros: u16,
}

#[derive(Debug, Arbitrary)]
struct FuzzCase {
    breakpoints: Vec<FuzzBreakpoint>,
    mappings: Vec<FuzzMapping>,
    steps: Vec<FuzzStep>,
}

fn directional(case: &FuzzCase) -> Option<DirectionalSpec> {
    let count = case.breakpoints.len().min(case.mappings.len().saturating_sub(1));
    let breakpoints = case.breakpoints[..count]
        .iter()
        .enumerate()
        .map(|(i, b)| {
            let spring = if b.stiffness == 0 {
                SpringParameters::SNAP
            } else {
                SpringParameters::new(f32::from(b.stiffness), f32::from(b.damping) / 64.0)
            };
            let distance = f32::from(b.guarantee % 64 + 1) / 4.0;
            let guarantee = match b.guarantee / 64 {
                0 => Guarantee::None,
                1 => Guarantee::InputDelta(distance),
                _ => Guarantee::GestureDragDelta(distance),
            };
            Breakpoint::new(format!("b{i}"), f32::from(b.position) / 8.0)
                .with_spring(spring)
                .with_guarantee(guarantee)
        })
        .collect();
    let mappings = case.mappings[..=count].iter().map(FuzzMapping::build).collect();
    DirectionalSpec::new(breakpoints, mappings).ok()
}

fuzz_target!(|case: FuzzCase| {
    if case.mappings.is_empty() {
        return;
    }
    let Some(spec) = directional(&case) else {
        return;
    };
    let spec = Arc::new(MotionSpec::symmetric(spec));

    let mut time = 0i64;
    let mut state = FrameState::initial(
        &spec,
        FrameInput {
            input: 0.0,
            direction: InputDirection::Max,
            gesture_drag_offset: 0.0,
            frame_time_nanos: time,
        },
    );
    for step in case.steps.iter().take(256) {
        time += i64::from(step.elapsed_micros) * 1_000;
        let frame = FrameInput {
            input: f32::from(step.input) / 8.0,
            direction: if step.toward_max {
                InputDirection::Max
            } else {
                InputDirection::Min
            },
            gesture_drag_offset: f32::from(step.drag_offset) / 8.0,
            frame_time_nanos: time,
        };
        let result = compute_frame(&state, &spec, frame, DEFAULT_STABLE_THRESHOLD);

        // Post-conditions that must always hold:
        assert!(result.spring_state.is_finite(), "spring state diverged");
        assert!(result.output.is_finite(), "output diverged");
        assert!(
            result.guarantee_state.is_inactive() || result.guarantee_state.max_delta() >= 0.0,
            "negative guarantee delta"
        );
        assert!(
            result.segment.is_valid_for_input(frame.input, frame.direction)
                || spec.has_segment_handlers(),
            "segment does not contain the input"
        );

        state = result.to_frame_state();
        if result.is_stable {
            assert!(state.spring_state.is_at_rest(), "stable frame kept a spring");
        }
    }
});
