use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Waiting for markers, or showing a panel.
    #[default]
    Scan,
    /// A fetch for an edit or detail page is in flight.
    Loading,
    /// Shopping edit panel open.
    Edit,
    /// To-do detail page open.
    Detail,
    /// Typing into the input line.
    Input,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Scan => write!(f, "SCAN"),
            Mode::Loading => write!(f, "LOADING"),
            Mode::Edit => write!(f, "EDIT"),
            Mode::Detail => write!(f, "DETAIL"),
            Mode::Input => write!(f, "INPUT"),
        }
    }
}
