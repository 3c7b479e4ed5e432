//! Step Transitions
//!
//! Pure presentation state for the slide between wizard steps. The wizard
//! coordinator owns a [`Navigation`] pair and hands out [`TransitionPlan`]s.
//! The UI slides pages with a spring-driven carousel and tags the entering
//! page with the plan's direction class, which picks the side it fades in
//! from.

use crate::wizard::Step;

/// Which way the wizard moved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
    None,
}

impl Direction {
    /// Direction from the signed index delta `to - from`
    pub fn from_delta(delta: i32) -> Self {
        match delta.signum() {
            1 => Direction::Forward,
            -1 => Direction::Backward,
            _ => Direction::None,
        }
    }

    /// CSS class applied to the entering page
    pub fn css_class(self) -> &'static str {
        match self {
            Direction::Forward => "enter-forward",
            Direction::Backward => "enter-backward",
            Direction::None => "enter-still",
        }
    }
}

/// Spring used to animate the slide
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpringConfig {
    pub stiffness: f64,
    pub damping: f64,
    pub mass: f64,
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self {
            stiffness: 300.0,
            damping: 30.0,
            mass: 1.0,
        }
    }
}

impl SpringConfig {
    /// Damping ratio `c / (2 * sqrt(k * m))`, the form libadwaita expects
    pub fn damping_ratio(&self) -> f64 {
        let critical = 2.0 * (self.stiffness * self.mass).sqrt();
        if critical <= f64::EPSILON {
            1.0
        } else {
            self.damping / critical
        }
    }
}

/// A single requested move between steps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionPlan {
    pub from: Step,
    pub to: Step,
    pub direction: Direction,
}

/// `(active, previous)` pair threaded through the wizard coordinator.
///
/// `previous` is committed only when the old step has left the screen
/// ([`Navigation::exit_finished`]), never at the moment the new step is
/// chosen, so the next direction is computed against the step being left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Navigation {
    active: Step,
    previous: Step,
    leaving: Option<Step>,
}

impl Default for Navigation {
    fn default() -> Self {
        Self {
            active: Step::ChooseType,
            previous: Step::ChooseType,
            leaving: None,
        }
    }
}

impl Navigation {
    pub fn active(&self) -> Step {
        self.active
    }

    pub fn previous(&self) -> Step {
        self.previous
    }

    /// `active - previous` as a direction
    pub fn direction(&self) -> Direction {
        Direction::from_delta(self.active.index() as i32 - self.previous.index() as i32)
    }

    /// Start moving to `to`.
    ///
    /// An exit still pending from a previous move is committed first.
    pub fn begin(&mut self, to: Step) -> TransitionPlan {
        self.exit_finished();
        let from = self.active;
        self.leaving = Some(from);
        self.active = to;
        TransitionPlan {
            from,
            to,
            direction: Direction::from_delta(to.index() as i32 - from.index() as i32),
        }
    }

    /// The step that was left is gone from view
    pub fn exit_finished(&mut self) {
        if let Some(left) = self.leaving.take() {
            self.previous = left;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_from_delta() {
        assert_eq!(Direction::from_delta(2), Direction::Forward);
        assert_eq!(Direction::from_delta(-1), Direction::Backward);
        assert_eq!(Direction::from_delta(0), Direction::None);
    }

    #[test]
    fn test_previous_commits_on_exit_only() {
        let mut nav = Navigation::default();
        let plan = nav.begin(Step::ProvideSource);
        assert_eq!(plan.direction, Direction::Forward);
        assert_eq!(nav.active(), Step::ProvideSource);
        assert_eq!(nav.previous(), Step::ChooseType);

        nav.exit_finished();
        assert_eq!(nav.previous(), Step::ChooseType);

        let plan = nav.begin(Step::PreviewResult);
        nav.exit_finished();
        assert_eq!(nav.previous(), Step::ProvideSource);
        assert_eq!(nav.direction(), plan.direction);
    }

    #[test]
    fn test_home_jump_is_backward() {
        let mut nav = Navigation::default();
        nav.begin(Step::ProvideSource);
        nav.begin(Step::PreviewResult);
        let plan = nav.begin(Step::ChooseType);
        assert_eq!(plan.from, Step::PreviewResult);
        assert_eq!(plan.direction, Direction::Backward);

        nav.exit_finished();
        assert_eq!(nav.previous(), Step::PreviewResult);
        assert_eq!(nav.direction(), Direction::Backward);
    }

    #[test]
    fn test_direction_classes_differ() {
        let classes = [Direction::Forward, Direction::Backward, Direction::None].map(Direction::css_class);
        assert_eq!(classes, ["enter-forward", "enter-backward", "enter-still"]);
    }

    #[test]
    fn test_spring_damping_ratio() {
        let spring = SpringConfig::default();
        let ratio = spring.damping_ratio();
        assert!((ratio - 0.866).abs() < 0.001);
    }
}
