// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! contains useful type definitions and conversion functions.
use nalgebra::{DVector, Isometry3, Quaternion, Translation3, UnitQuaternion, Vector3};
use std::collections::BTreeMap;

/// Maps a joint name to a scalar value: a position, velocity or acceleration depending on
/// the context.
pub type JointValues = BTreeMap<String, f64>;

/// Smallest norm a quaternion may have before it is considered degenerate.
const QUATERNION_NORM_THRESHOLD: f64 = 1e-5;

/// Builds a [`JointValues`] map from parallel slices of names and values.
///
/// Surplus entries of the longer slice are ignored.
pub fn joint_values_from<S: AsRef<str>>(names: &[S], values: &[f64]) -> JointValues {
    names
        .iter()
        .zip(values.iter())
        .map(|(name, &value)| (name.as_ref().to_string(), value))
        .collect()
}

/// Collects the values of `values` in the order of `names` into a vector.
///
/// # Return
/// `None` if one of the names has no value.
pub fn ordered_values<S: AsRef<str>>(names: &[S], values: &JointValues) -> Option<DVector<f64>> {
    let collected: Option<Vec<f64>> = names
        .iter()
        .map(|name| values.get(name.as_ref()).copied())
        .collect();
    collected.map(DVector::from_vec)
}

/// Normalizes a quaternion of a request into a rotation.
///
/// # Return
/// `None` if the quaternion is (almost) zero or not finite.
pub fn normalize_quaternion(quaternion: &Quaternion<f64>) -> Option<UnitQuaternion<f64>> {
    let norm = quaternion.norm();
    if !norm.is_finite() || norm < QUATERNION_NORM_THRESHOLD {
        return None;
    }
    Some(UnitQuaternion::from_quaternion(*quaternion))
}

/// converts a position and an orientation to an Isometry
pub fn pose_from_parts(position: &Vector3<f64>, orientation: &UnitQuaternion<f64>) -> Isometry3<f64> {
    Isometry3::from_parts(Translation3::from(*position), *orientation)
}

/// Translational distance between the origins of two poses.
pub fn translational_distance(from: &Isometry3<f64>, to: &Isometry3<f64>) -> f64 {
    (to.translation.vector - from.translation.vector).norm()
}

/// Angle of the rotation which turns the orientation of `from` into the orientation of `to`.
pub fn angular_distance(from: &Isometry3<f64>, to: &Isometry3<f64>) -> f64 {
    from.rotation.angle_to(&to.rotation)
}

#[cfg(test)]
mod test {
    use crate::utils::{
        angular_distance, joint_values_from, normalize_quaternion, ordered_values,
        pose_from_parts, translational_distance,
    };
    use nalgebra::{Quaternion, UnitQuaternion, Vector3};
    use std::f64::consts::PI;

    fn float_compare(a: f64, b: f64, thresh: f64) {
        assert!((a - b).abs() < thresh);
    }

    #[test]
    fn joint_values_round_trip_in_name_order() {
        let values = joint_values_from(&["b", "a"], &[2., 1.]);
        let ordered = ordered_values(&["a", "b"], &values).unwrap();
        float_compare(ordered[0], 1., 1e-15);
        float_compare(ordered[1], 2., 1e-15);
        assert!(ordered_values(&["a", "c"], &values).is_none());
    }

    #[test]
    fn normalize_quaternion_test() {
        let q = normalize_quaternion(&Quaternion::new(2., 0., 0., 0.)).unwrap();
        float_compare(q.angle(), 0., 1e-12);
        assert!(normalize_quaternion(&Quaternion::new(0., 0., 0., 0.)).is_none());
        assert!(normalize_quaternion(&Quaternion::new(f64::NAN, 0., 0., 0.)).is_none());
    }

    #[test]
    fn pose_distances() {
        let start = pose_from_parts(&Vector3::new(0., 0., 0.), &UnitQuaternion::identity());
        let goal = pose_from_parts(
            &Vector3::new(0.3, 0.4, 0.),
            &UnitQuaternion::from_euler_angles(0., 0., PI / 2.),
        );
        float_compare(translational_distance(&start, &goal), 0.5, 1e-12);
        float_compare(angular_distance(&start, &goal), PI / 2., 1e-12);
    }
}
