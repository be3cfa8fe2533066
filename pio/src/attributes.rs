//! Pin attributes and the named modes that select them.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pull {
    Float,
    Up,
    Down,
}

/// `Attributes` is the electrical configuration applied to a pin.
///
/// `pull` is only meaningful for inputs; outputs always carry
/// `Pull::Float`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attributes {
    pub direction: Direction,
    pub pull: Pull,
}

impl Attributes {
    pub const INPUT_FLOAT: Attributes = Attributes {
        direction: Direction::Input,
        pull: Pull::Float,
    };
    pub const INPUT_PULL_UP: Attributes = Attributes {
        direction: Direction::Input,
        pull: Pull::Up,
    };
    pub const INPUT_PULL_DOWN: Attributes = Attributes {
        direction: Direction::Input,
        pull: Pull::Down,
    };
    pub const OUTPUT: Attributes = Attributes {
        direction: Direction::Output,
        pull: Pull::Float,
    };
}

/// `Mode` is a named pin configuration, as a user would ask for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Float,
    Output,
    PullUp,
    PullDown,
}

impl Mode {
    /// `parse` accepts the mode names and their aliases:
    ///
    /// - `in`, `float`, `tri`: floating input
    /// - `out`: output
    /// - `up`, `pullup`: input with pull-up
    /// - `down`, `pulldown`: input with pull-down
    ///
    /// Any other string, including the empty string, returns `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "in" | "float" | "tri" => Some(Mode::Float),
            "out" => Some(Mode::Output),
            "up" | "pullup" => Some(Mode::PullUp),
            "down" | "pulldown" => Some(Mode::PullDown),
            _ => None,
        }
    }

    /// `name` is the canonical name reported back once the mode is applied.
    pub fn name(&self) -> &'static str {
        match self {
            Mode::Float => "in",
            Mode::Output => "out",
            Mode::PullUp => "pullup",
            Mode::PullDown => "pulldown",
        }
    }

    pub fn attributes(&self) -> Attributes {
        match self {
            Mode::Float => Attributes::INPUT_FLOAT,
            Mode::Output => Attributes::OUTPUT,
            Mode::PullUp => Attributes::INPUT_PULL_UP,
            Mode::PullDown => Attributes::INPUT_PULL_DOWN,
        }
    }
}
