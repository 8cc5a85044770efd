use ratatui::style::Color;

/// Theme names offered by the theme toggle, in cycle order. The first
/// entry doubles as the fallback for unrecognized persisted names.
pub(crate) const THEME_NAMES: [&str; 2] = ["dark", "light"];

/// Resolved colors for one theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Palette {
    pub name: &'static str,
    pub heading: Color,
    pub link: Color,
    pub matched: Color,
    pub scope: Color,
    pub code: Color,
    pub dim: Color,
    pub ok: Color,
    pub err: Color,
}

const DARK: Palette = Palette {
    name: "dark",
    heading: Color::Cyan,
    link: Color::LightBlue,
    matched: Color::Yellow,
    scope: Color::DarkGray,
    code: Color::Green,
    dim: Color::DarkGray,
    ok: Color::Green,
    err: Color::Red,
};

const LIGHT: Palette = Palette {
    name: "light",
    heading: Color::Blue,
    link: Color::Blue,
    matched: Color::Magenta,
    scope: Color::Gray,
    code: Color::Rgb(0, 96, 0),
    dim: Color::Gray,
    ok: Color::Rgb(0, 96, 0),
    err: Color::Red,
};

pub(crate) fn palette(name: &str) -> Palette {
    match name {
        "light" => LIGHT,
        _ => DARK,
    }
}

pub(crate) fn next_theme(name: &str) -> &'static str {
    let position = THEME_NAMES.iter().position(|candidate| *candidate == name);
    match position {
        Some(index) => THEME_NAMES[(index + 1) % THEME_NAMES.len()],
        None => THEME_NAMES[0],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_names_fall_back_to_dark() {
        assert_eq!(palette("solarized").name, "dark");
        assert_eq!(palette("light").name, "light");
    }

    #[test]
    fn themes_cycle_and_wrap() {
        assert_eq!(next_theme("dark"), "light");
        assert_eq!(next_theme("light"), "dark");
        assert_eq!(next_theme("nonsense"), "dark");
    }
}
