use ar_notes::board::LineStyle;
use ar_notes::config::Config;
use ar_notes::note::NoteColor;
use ratatui::style::{Color, Modifier, Style};

#[derive(Debug, Clone)]
pub struct Theme {
    pub background: Color,
    pub foreground: Color,
    pub done: Color,
    pub hidden: Color,
    pub important: Color,
    pub selected_bg: Color,
    pub status_bar_bg: Color,
    pub status_bar_fg: Color,
}

impl Theme {
    pub fn default_theme() -> Self {
        Self {
            background: Color::Reset,
            foreground: Color::White,
            done: Color::DarkGray,
            hidden: Color::Rgb(90, 90, 90),
            important: Color::Rgb(255, 100, 100),
            selected_bg: Color::Rgb(60, 60, 80),
            status_bar_bg: Color::Rgb(40, 40, 40),
            status_bar_fg: Color::White,
        }
    }

    pub fn dark() -> Self {
        Self {
            background: Color::Black,
            ..Self::default_theme()
        }
    }

    pub fn light() -> Self {
        Self {
            background: Color::White,
            foreground: Color::Black,
            done: Color::Gray,
            hidden: Color::Rgb(170, 170, 170),
            important: Color::Rgb(200, 50, 50),
            selected_bg: Color::Rgb(200, 210, 240),
            status_bar_bg: Color::LightBlue,
            status_bar_fg: Color::Black,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        match config.theme.as_str() {
            "dark" => Self::dark(),
            "light" => Self::light(),
            _ => Self::default_theme(),
        }
    }

    pub fn line_style(&self, style: LineStyle) -> Style {
        let base = Style::default().fg(self.foreground);
        match style {
            LineStyle::Undone => base,
            LineStyle::Done => base.fg(self.done).add_modifier(Modifier::CROSSED_OUT),
            LineStyle::Hidden => base.fg(self.hidden).add_modifier(Modifier::ITALIC),
            LineStyle::Important => base.fg(self.important).add_modifier(Modifier::BOLD),
            LineStyle::Selected => base.bg(self.selected_bg).add_modifier(Modifier::BOLD),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::default_theme()
    }
}

/// Terminal colour for a note colour.
pub fn note_color(color: NoteColor) -> Color {
    Color::Rgb(color.r, color.g, color.b)
}
