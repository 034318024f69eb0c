// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the search for the waypoint where a link leaves a sphere.
use nalgebra::Vector3;
use tracing::debug;

use crate::model::KinematicContext;
use crate::trajectory::RobotTrajectory;
use crate::PlanningResult;

/// Determines whether the step from `p_current` to `p_next` leaves the sphere around
/// `p_center` with radius `r`.
pub fn intersection_found(
    p_center: &Vector3<f64>,
    p_current: &Vector3<f64>,
    p_next: &Vector3<f64>,
    r: f64,
) -> bool {
    (p_current - p_center).norm() <= r && (p_next - p_center).norm() >= r
}

/// Searches the waypoint at which the link crosses the surface of a sphere.
///
/// Searching forward it is the first waypoint inside (or on) the sphere whose successor is
/// outside (or on) it. Searching backward (`inverse_order`) it is the last waypoint inside the
/// sphere whose predecessor is outside of it.
/// # Arguments
/// * `context` - Used for the forward kinematics of the link.
/// * `link_name` - Link whose position is checked.
/// * `center_position` - Center of the sphere.
/// * `r` - Radius of the sphere.
/// * `trajectory` - Trajectory to search.
/// * `inverse_order` - Searches from the end of the trajectory if set.
/// # Return
/// Index of the waypoint or `None` if the link does not cross the surface.
/// # Errors
/// * NoKinematicsSolver if the link is unknown.
pub fn linear_search_intersection_point(
    context: &KinematicContext,
    link_name: &str,
    center_position: &Vector3<f64>,
    r: f64,
    trajectory: &RobotTrajectory,
    inverse_order: bool,
) -> PlanningResult<Option<usize>> {
    debug!("Start linear search for intersection point.");
    let joint_names = trajectory.joint_names();
    let link_positions = trajectory
        .waypoints()
        .iter()
        .map(|waypoint| {
            context
                .compute_link_fk(link_name, &waypoint.joint_positions(joint_names))
                .map(|pose| pose.translation.vector)
        })
        .collect::<PlanningResult<Vec<Vector3<f64>>>>()?;

    let waypoint_num = link_positions.len();
    if waypoint_num < 2 {
        return Ok(None);
    }
    let found = if inverse_order {
        (1..waypoint_num).rev().find(|&i| {
            intersection_found(
                center_position,
                &link_positions[i],
                &link_positions[i - 1],
                r,
            )
        })
    } else {
        (0..waypoint_num - 1).find(|&i| {
            intersection_found(
                center_position,
                &link_positions[i],
                &link_positions[i + 1],
                r,
            )
        })
    };
    Ok(found)
}

#[cfg(test)]
mod tests {
    use crate::exception::ErrorKind;
    use crate::model::KinematicContext;
    use crate::testing::GantryRobot;
    use crate::trajectory::intersection::{intersection_found, linear_search_intersection_point};
    use crate::trajectory::{RobotTrajectory, Waypoint};
    use nalgebra::{DVector, Vector3};

    fn straight_line(points: usize) -> RobotTrajectory {
        let joint_names = vec!["x".to_string(), "y".to_string(), "z".to_string()];
        let mut trajectory = RobotTrajectory::new("arm", joint_names);
        for i in 0..points {
            let x = i as f64 / (points - 1) as f64;
            trajectory.add_suffix_waypoint(
                Waypoint::at_rest(DVector::from_column_slice(&[x, 0., 0.])),
                0.1,
            );
        }
        trajectory
    }

    #[test]
    fn intersection_found_on_surface() {
        let center = Vector3::zeros();
        assert!(intersection_found(&center, &Vector3::new(1., 0., 0.), &Vector3::new(1., 0., 0.), 1.));
        assert!(!intersection_found(&center, &Vector3::new(1.1, 0., 0.), &Vector3::new(2., 0., 0.), 1.));
        assert!(!intersection_found(&center, &Vector3::new(0.5, 0., 0.), &Vector3::new(0.9, 0., 0.), 1.));
    }

    #[test]
    fn forward_and_backward_search() {
        let robot = GantryRobot::xyz();
        let context = KinematicContext::new(&robot, &robot);
        let trajectory = straight_line(5);
        let center = Vector3::new(0.5, 0., 0.);
        let forward =
            linear_search_intersection_point(&context, "tool0", &center, 0.3, &trajectory, false)
                .unwrap();
        assert_eq!(forward, Some(3));
        let backward =
            linear_search_intersection_point(&context, "tool0", &center, 0.3, &trajectory, true)
                .unwrap();
        assert_eq!(backward, Some(1));
    }

    #[test]
    fn no_intersection() {
        let robot = GantryRobot::xyz();
        let context = KinematicContext::new(&robot, &robot);
        let trajectory = straight_line(5);
        let center = Vector3::new(5., 0., 0.);
        let result =
            linear_search_intersection_point(&context, "tool0", &center, 0.3, &trajectory, false)
                .unwrap();
        assert_eq!(result, None);
        let result =
            linear_search_intersection_point(&context, "tool0", &center, 0.3, &straight_line(1), true)
                .unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn unknown_link() {
        let robot = GantryRobot::xyz();
        let context = KinematicContext::new(&robot, &robot);
        let error = linear_search_intersection_point(
            &context,
            "camera",
            &Vector3::zeros(),
            0.3,
            &straight_line(3),
            false,
        )
        .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::NoKinematicsSolver);
    }
}
