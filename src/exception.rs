// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains exception and Result definitions
use thiserror::Error;

/// Coarse classification of a [`PlanningException`]. This is what ends up in a
/// [`MotionPlanResponse`](`crate::MotionPlanResponse`) when planning fails.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidScalingFactor,
    UnknownGroup,
    InvalidStartState,
    InvalidGoalConstraints,
    InvalidPathConstraints,
    NoKinematicsSolver,
    NoSolutionFound,
    LimitsViolated,
    DegenerateInput,
    InvalidConfiguration,
}

/// Represents all kind of errors which can occur while validating a request or generating a
/// trajectory.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlanningException {
    /// The velocity or acceleration scaling factor is outside of (0.0001, 1].
    #[error("{message}")]
    InvalidScalingFactor { message: String },

    /// The requested planning group is not part of the robot model.
    #[error("Unknown planning group: {group}")]
    UnknownGroup { group: String },

    /// The start state is empty, incomplete, out of its position limits or not at rest.
    #[error("{message}")]
    InvalidStartState { message: String },

    /// The goal constraints are missing, ambiguous or out of range.
    #[error("{message}")]
    InvalidGoalConstraints { message: String },

    /// The auxiliary point of a circular motion is missing or does not describe a circle.
    #[error("{message}")]
    InvalidPathConstraints { message: String },

    /// There is no inverse kinematics solver for the link or the link is unknown.
    #[error("{message}")]
    NoKinematicsSolver { message: String },

    /// Inverse kinematics could not resolve a pose.
    #[error("{message}")]
    NoSolutionFound { message: String },

    /// A sampled joint velocity, acceleration or deceleration exceeds its limit.
    #[error("{message}")]
    LimitsViolated { message: String },

    /// The input is too small or too short to be differentiated or sampled.
    #[error("{message}")]
    DegenerateInput { message: String },

    /// One of two trajectories does not follow the common sampling time.
    #[error("Trajectory {trajectory} violates sampling time {expected} between points {} and {index} (duration {actual})", .index - 1)]
    SamplingTimeMismatch {
        /// 1 for the first trajectory, 2 for the second one.
        trajectory: usize,
        /// Index of the waypoint whose duration from the previous waypoint is wrong.
        index: usize,
        /// Common sampling time.
        expected: f64,
        /// Duration found between the waypoints.
        actual: f64,
    },

    /// Limits or planner configuration could not be loaded or are inconsistent.
    #[error("{message}")]
    InvalidConfiguration { message: String },
}

impl PlanningException {
    /// Returns the [`ErrorKind`] of the exception.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PlanningException::InvalidScalingFactor { .. } => ErrorKind::InvalidScalingFactor,
            PlanningException::UnknownGroup { .. } => ErrorKind::UnknownGroup,
            PlanningException::InvalidStartState { .. } => ErrorKind::InvalidStartState,
            PlanningException::InvalidGoalConstraints { .. } => ErrorKind::InvalidGoalConstraints,
            PlanningException::InvalidPathConstraints { .. } => ErrorKind::InvalidPathConstraints,
            PlanningException::NoKinematicsSolver { .. } => ErrorKind::NoKinematicsSolver,
            PlanningException::NoSolutionFound { .. } => ErrorKind::NoSolutionFound,
            PlanningException::LimitsViolated { .. } => ErrorKind::LimitsViolated,
            PlanningException::DegenerateInput { .. }
            | PlanningException::SamplingTimeMismatch { .. } => ErrorKind::DegenerateInput,
            PlanningException::InvalidConfiguration { .. } => ErrorKind::InvalidConfiguration,
        }
    }
}

/// creates an InvalidStartState exception from anything that converts to a String
pub(crate) fn create_start_state_exception<S: Into<String>>(message: S) -> PlanningException {
    PlanningException::InvalidStartState {
        message: message.into(),
    }
}

/// creates an InvalidGoalConstraints exception from anything that converts to a String
pub(crate) fn create_goal_exception<S: Into<String>>(message: S) -> PlanningException {
    PlanningException::InvalidGoalConstraints {
        message: message.into(),
    }
}

/// creates an InvalidConfiguration exception from anything that converts to a String
pub(crate) fn create_config_exception<S: Into<String>>(message: S) -> PlanningException {
    PlanningException::InvalidConfiguration {
        message: message.into(),
    }
}

/// Result type which can have PlanningException as Error
pub type PlanningResult<T> = Result<T, PlanningException>;
