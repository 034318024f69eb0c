// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the merging of consecutive trajectories.
use tracing::{debug, error};

use crate::exception::PlanningException;
use crate::trajectory::state_comparison::{is_robot_state_equal, ROBOT_STATE_EQUALITY_EPSILON};
use crate::trajectory::RobotTrajectory;
use crate::PlanningResult;

/// Appends `source` to `result`.
///
/// If the last waypoint of `result` equals the first waypoint of `source` (see
/// [`ROBOT_STATE_EQUALITY_EPSILON`]), the first waypoint of `source` is skipped and the other
/// waypoints keep their durations. Otherwise the whole `source` is appended without an
/// additional time gap.
/// # Errors
/// * [`DegenerateInput`](`crate::exception::PlanningException::DegenerateInput`) if both
/// trajectories differ in group or joints. `result` stays untouched in that case.
pub fn merge(result: &mut RobotTrajectory, source: &RobotTrajectory) -> PlanningResult<()> {
    if result.group_name() != source.group_name() || result.joint_names() != source.joint_names() {
        let message = format!(
            "Cannot append trajectory of group {} with joints {:?} to trajectory of group {} with joints {:?}",
            source.group_name(),
            source.joint_names(),
            result.group_name(),
            result.joint_names()
        );
        error!("{}", message);
        return Err(PlanningException::DegenerateInput { message });
    }

    let shares_boundary = match (result.last_waypoint(), source.first_waypoint()) {
        (Some(last), Some(first)) => is_robot_state_equal(last, first, ROBOT_STATE_EQUALITY_EPSILON),
        _ => false,
    };

    if shares_boundary {
        debug!("Skipping first waypoint of the appended trajectory");
        for (i, waypoint) in source.waypoints().iter().enumerate().skip(1) {
            result.add_suffix_waypoint(
                waypoint.clone(),
                source.duration_from_previous(i).unwrap_or_default(),
            );
        }
    } else {
        result.append(source, 0.);
    }
    Ok(())
}
