use platetrace_types::{BoundingBox, TrackedVehicle};

/// Finds the vehicle a plate belongs to: the first tracked vehicle, in the
/// order the tracker reported them, whose box strictly contains the plate
/// box. Touching edges never match, and no overlap ranking is attempted —
/// with overlapping vehicle boxes the result is deliberately order-dependent.
pub fn locate_owner<'a>(
    plate: &BoundingBox,
    vehicles: &'a [TrackedVehicle],
) -> Option<&'a TrackedVehicle> {
    vehicles
        .iter()
        .find(|vehicle| vehicle.bbox.strictly_contains(plate))
}
