//! Color theme system for ssbprep.
//!
//! Two built-in themes:
//!
//! - `dark` uses ANSI 16 colors so it works on any terminal, including 256-color SSH
//!   sessions with no truecolor support.
//! - `catppuccin_mocha` uses the Catppuccin Mocha palette in RGB; requires truecolor.

use ratatui::style::Color;

/// All color values used across the UI.
#[derive(Debug, Clone)]
pub struct Theme {
    // Panel borders
    pub border_active: Color,
    pub border_inactive: Color,

    // Text
    pub text: Color,
    pub muted: Color,
    pub accent: Color,
    pub error: Color,

    // Countdown bar by time left
    pub timer_ok: Color,
    pub timer_warn: Color,
    pub timer_critical: Color,

    // Discussion speakers
    pub speaker_candidate: Color,
    pub speaker_peer: Color,
    pub speaker_gto: Color,

    // Screening outcome
    pub outcome_in: Color,
    pub outcome_borderline: Color,
    pub outcome_out: Color,

    // Status bar
    pub status_bar_bg: Color,
    pub status_bar_fg: Color,
    pub status_mode_normal: Color,
    pub status_mode_insert: Color,
    pub status_mode_prompt: Color,

    /// Application background (used for clearing areas).
    pub background: Color,
}

impl Theme {
    /// The built-in dark theme using ANSI 16 colors.
    pub fn dark() -> Self {
        Self {
            border_active: Color::Cyan,
            border_inactive: Color::DarkGray,

            text: Color::Reset,
            muted: Color::DarkGray,
            accent: Color::Cyan,
            error: Color::Red,

            timer_ok: Color::Green,
            timer_warn: Color::Yellow,
            timer_critical: Color::Red,

            speaker_candidate: Color::Green,
            speaker_peer: Color::Blue,
            speaker_gto: Color::Magenta,

            outcome_in: Color::Green,
            outcome_borderline: Color::Yellow,
            outcome_out: Color::Red,

            status_bar_bg: Color::DarkGray,
            status_bar_fg: Color::White,
            status_mode_normal: Color::Cyan,
            status_mode_insert: Color::Green,
            status_mode_prompt: Color::Yellow,

            background: Color::Reset,
        }
    }

    /// The Catppuccin Mocha theme using RGB truecolor values.
    ///
    /// Palette source: <https://github.com/catppuccin/catppuccin> Mocha variant.
    pub fn catppuccin_mocha() -> Self {
        let green = Color::Rgb(166, 227, 161); // #a6e3a1
        let red = Color::Rgb(243, 139, 168); // #f38ba8
        let yellow = Color::Rgb(249, 226, 175); // #f9e2af
        let blue = Color::Rgb(137, 180, 250); // #89b4fa
        let mauve = Color::Rgb(203, 166, 247); // #cba6f7
        let lavender = Color::Rgb(180, 190, 254); // #b4befe
        let overlay1 = Color::Rgb(127, 132, 156); // #7f849c
        let surface1 = Color::Rgb(69, 71, 90); // #45475a
        let base = Color::Rgb(30, 30, 46); // #1e1e2e
        let text = Color::Rgb(205, 214, 244); // #cdd6f4
        let peach = Color::Rgb(250, 179, 135); // #fab387

        Self {
            border_active: lavender,
            border_inactive: overlay1,

            text,
            muted: overlay1,
            accent: lavender,
            error: red,

            timer_ok: green,
            timer_warn: peach,
            timer_critical: red,

            speaker_candidate: green,
            speaker_peer: blue,
            speaker_gto: mauve,

            outcome_in: green,
            outcome_borderline: yellow,
            outcome_out: red,

            status_bar_bg: surface1,
            status_bar_fg: text,
            status_mode_normal: lavender,
            status_mode_insert: green,
            status_mode_prompt: peach,

            background: base,
        }
    }

    /// Resolves a theme name from config. Unknown names fall back to `dark()`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "catppuccin-mocha" | "catppuccin_mocha" => Self::catppuccin_mocha(),
            "dark" => Self::dark(),
            other => {
                tracing::warn!(theme = other, "unknown theme, falling back to 'dark'");
                Self::dark()
            }
        }
    }

    /// Countdown color for `remaining` of `total` seconds.
    pub fn timer_color(&self, remaining: u32, total: u32) -> Color {
        if remaining <= 10 || remaining * 10 <= total {
            self.timer_critical
        } else if remaining * 4 <= total {
            self.timer_warn
        } else {
            self.timer_ok
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_theme_falls_back_to_dark() {
        assert_eq!(Theme::from_name("solarized").border_active, Color::Cyan);
    }

    #[test]
    fn timer_turns_red_near_the_end() {
        let t = Theme::dark();
        assert_eq!(t.timer_color(300, 300), t.timer_ok);
        assert_eq!(t.timer_color(70, 300), t.timer_warn);
        assert_eq!(t.timer_color(9, 30), t.timer_critical);
    }
}
