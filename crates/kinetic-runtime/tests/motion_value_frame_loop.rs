//! Integration tests for the motion value frame loop.

use std::sync::Arc;
use std::sync::mpsc;
use std::time::Duration;

use kinetic_core::{
    Breakpoint, DirectionalSpec, Guarantee, InputDirection, Mapping, MotionSpec, SemanticKey,
    SpringParameters,
};
use kinetic_runtime::{
    DistanceGestureContext, FrameStatus, FrameTick, FrameTicker, GestureContext, MotionError,
    MotionValue, MotionValueConfig, ProvidedGestureContext,
};

const FRAME_NANOS: i64 = 16_000_000;

fn expanded() -> SemanticKey<bool> {
    SemanticKey::new("expanded")
}

fn sheet_spec() -> kinetic_runtime::Result<Arc<MotionSpec>> {
    let expanded = expanded();
    let open = DirectionalSpec::builder(Mapping::Zero)
        .semantic(&expanded, false)
        .breakpoint(
            Breakpoint::new("open", 100.0)
                .with_spring(SpringParameters::new(300.0, 0.9))
                .with_guarantee(Guarantee::InputDelta(50.0)),
            Mapping::Fixed(1.0),
        )
        .semantic(&expanded, true)
        .build()?;
    let close = DirectionalSpec::builder(Mapping::Zero)
        .semantic(&expanded, false)
        .breakpoint(
            Breakpoint::new("close", 60.0).with_spring(SpringParameters::new(300.0, 0.9)),
            Mapping::Fixed(1.0),
        )
        .semantic(&expanded, true)
        .build()?;
    Ok(Arc::new(MotionSpec::new(open, close)))
}

#[test]
fn invalid_specs_surface_through_the_runtime_error() {
    let built: kinetic_runtime::Result<DirectionalSpec> = DirectionalSpec::builder(Mapping::Zero)
        .breakpoint(Breakpoint::new("a", 1.0), Mapping::One)
        .breakpoint(Breakpoint::new("a", 2.0), Mapping::Zero)
        .build()
        .map_err(MotionError::from);
    assert!(matches!(built, Err(MotionError::Spec(_))));
}

#[test]
fn sheet_opens_and_reports_semantics() {
    let mut value = MotionValue::with_config(
        sheet_spec().unwrap(),
        ProvidedGestureContext::default(),
        0.0,
        MotionValueConfig::default().with_label("sheet"),
    );
    assert_eq!(value.semantic(&expanded()), Some(false));

    value.start().unwrap();
    let mut time = 0;
    for input in [40.0, 80.0, 120.0, 160.0] {
        time += FRAME_NANOS;
        value.set_input(input);
        value.on_frame(time, true).unwrap();
    }
    assert_eq!(value.semantic(&expanded()), Some(true));
    // 60 past the breakpoint with a 50 guarantee: fully snapped.
    assert!(value.spring_parameters().is_snap());
    assert_eq!(value.output(), 1.0);

    time += FRAME_NANOS;
    assert_eq!(value.on_frame(time, false).unwrap(), FrameStatus::Finished);
    let snapshot = value.debug_snapshot();
    assert_eq!(snapshot.label.as_deref(), Some("sheet"));
    assert!(!snapshot.is_running);
    assert!(snapshot.is_stable);
}

#[test]
fn hysteresis_between_directions() {
    let gesture = DistanceGestureContext::new(0.0, InputDirection::Max, 8.0).unwrap();
    let mut value = MotionValue::new(sheet_spec().unwrap(), gesture, 0.0);
    value.start().unwrap();

    let mut time = 0;
    let mut drive = |value: &mut MotionValue<DistanceGestureContext>, offset: f32| {
        time += FRAME_NANOS;
        value.gesture_mut().set_drag_offset(offset);
        value.set_input(offset);
        value.on_frame(time, true).unwrap();
        value.output_target()
    };

    assert_eq!(drive(&mut value, 90.0), 0.0);
    assert_eq!(drive(&mut value, 110.0), 1.0);
    // Coming back within the slop keeps moving toward Max.
    assert_eq!(drive(&mut value, 102.0), 1.0);
    assert_eq!(value.gesture().direction(), InputDirection::Max);
    // Past the slop the close spec applies; 80 is still above its breakpoint.
    assert_eq!(drive(&mut value, 80.0), 1.0);
    assert_eq!(value.gesture().direction(), InputDirection::Min);
    assert_eq!(drive(&mut value, 59.0), 0.0);
}

#[test]
fn derived_values_follow_their_source() {
    let spec = Arc::new(MotionSpec::symmetric(
        DirectionalSpec::builder(Mapping::Zero)
            .breakpoint(
                Breakpoint::new("step", 1.0).with_spring(SpringParameters::new(200.0, 1.0)),
                Mapping::Fixed(10.0),
            )
            .build()
            .unwrap(),
    ));
    let scale = Arc::new(MotionSpec::symmetric(DirectionalSpec::uniform(Mapping::linear(2.0, 0.0))));

    let mut source = MotionValue::new(spec, ProvidedGestureContext::default(), 0.0);
    let mut derived = MotionValue::new(scale, ProvidedGestureContext::default(), 0.0);
    source.start().unwrap();
    derived.start().unwrap();
    source.set_input(2.0);

    let mut time = 0;
    loop {
        time += FRAME_NANOS;
        let status = source.on_frame(time, false).unwrap();
        derived.set_input(source.output());
        derived.on_frame(time, true).unwrap();
        assert_eq!(derived.output(), 2.0 * source.output());
        if status == FrameStatus::Finished {
            break;
        }
        assert!(time < 200 * FRAME_NANOS, "source never settled");
    }
    assert_eq!(derived.output(), 20.0);
}

#[test]
fn spec_swap_mid_animation_stays_continuous() {
    let spec = sheet_spec().unwrap();
    let mut value = MotionValue::new(spec, ProvidedGestureContext::default(), 0.0);
    value.start().unwrap();
    value.set_input(105.0);
    value.on_frame(FRAME_NANOS, true).unwrap();
    let before = value.output();

    let replacement = Arc::new(
        MotionSpec::symmetric(DirectionalSpec::uniform(Mapping::Fixed(3.0)))
            .with_reset_spring(SpringParameters::new(500.0, 1.0)),
    );
    value.set_spec(replacement);
    let swapped = value.output();
    assert!((swapped - before).abs() < 1e-4, "{before} -> {swapped}");
    assert_eq!(value.output_target(), 3.0);
}

#[test]
fn run_until_stable_with_synthetic_ticks() {
    let spec = sheet_spec().unwrap();
    let mut value = MotionValue::new(spec, ProvidedGestureContext::default(), 0.0);
    let (sender, receiver) = mpsc::channel();
    for i in 1..=300 {
        sender.send(FrameTick::new(i * FRAME_NANOS)).unwrap();
    }
    drop(sender);

    let mut frames = 0;
    let status = value
        .run_until_stable(&receiver, |value, _tick| {
            frames += 1;
            value.set_input(120.0);
            false
        })
        .unwrap();
    assert_eq!(status, FrameStatus::Finished);
    assert!(frames < 300);
    assert!(!value.is_running());
    assert_eq!(value.output(), 1.0);
}

#[test]
fn closed_channel_ends_the_loop() {
    let spec = sheet_spec().unwrap();
    let mut value = MotionValue::new(spec, ProvidedGestureContext::default(), 0.0);
    let (sender, receiver) = mpsc::channel();
    sender.send(FrameTick::new(FRAME_NANOS)).unwrap();
    sender.send(FrameTick::new(2 * FRAME_NANOS)).unwrap();
    drop(sender);

    let status = value
        .run_until_stable(&receiver, |value, _tick| {
            value.set_input(101.0);
            true
        })
        .unwrap();
    assert_eq!(status, FrameStatus::Animating);
    assert!(!value.is_running());
    assert_eq!(value.frame_time_nanos(), 2 * FRAME_NANOS);
}

#[test]
fn ticker_drives_a_value_to_rest() {
    let spec = Arc::new(MotionSpec::symmetric(
        DirectionalSpec::builder(Mapping::Zero)
            .breakpoint(
                Breakpoint::new("step", 1.0).with_spring(SpringParameters::new(5_000.0, 1.0)),
                Mapping::One,
            )
            .build()
            .unwrap(),
    ));
    let mut value = MotionValue::new(spec, ProvidedGestureContext::default(), 0.0);
    value.set_input(2.0);
    let ticker = FrameTicker::spawn(Duration::from_millis(2));
    let status = value.run_until_stable(ticker.receiver(), |_, _| false).unwrap();
    ticker.stop();
    assert_eq!(status, FrameStatus::Finished);
    assert_eq!(value.output(), 1.0);
}

#[test]
fn loop_state_errors() {
    let mut value = MotionValue::new(
        Arc::new(MotionSpec::empty()),
        ProvidedGestureContext::default(),
        0.0,
    );
    assert_eq!(value.on_frame(0, false), Err(MotionError::NotRunning));
    value.start().unwrap();
    assert_eq!(value.start(), Err(MotionError::AlreadyRunning));

    let (sender, receiver) = mpsc::channel::<FrameTick>();
    drop(sender);
    // Already running is fine for the driver; the closed channel ends it.
    assert_eq!(value.run_until_stable(&receiver, |_, _| true), Ok(FrameStatus::Animating));
}
