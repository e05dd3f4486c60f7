#![no_main]

use kinetic_core::InputDirection;
use kinetic_runtime::{DistanceGestureContext, GestureContext};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // First byte picks the slop (0..=63.75); the rest are drag offsets.
    let Some((&slop, payload)) = data.split_first() else {
        return;
    };
    let slop = f32::from(slop) / 4.0;
    let Ok(mut gesture) = DistanceGestureContext::new(0.0, InputDirection::Max, slop) else {
        return;
    };

    for chunk in payload.chunks_exact(4) {
        let offset = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        let before = gesture.direction();
        gesture.set_drag_offset(offset);

        if !offset.is_finite() {
            assert_eq!(gesture.direction(), before, "non-finite offset flipped direction");
            continue;
        }
        let travel = gesture.reverse_travel();
        assert!(travel >= 0.0, "negative reverse travel");
        assert!(travel <= slop || travel.is_nan(), "reverse travel exceeds slop");
    }
});
