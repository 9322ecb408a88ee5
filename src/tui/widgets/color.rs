use ratatui::style::Color;

/// Parse a theme color. Accepts terminal color names (`"lightcyan"`, `"grey"`),
/// `#RRGGBB` / `#RGB` and `rgb(r, g, b)`.
pub fn try_parse_color(value: &str) -> Option<Color> {
    let value = value.trim().to_lowercase();

    let named = match value.as_str() {
        "black" => Color::Black,
        "red" => Color::Red,
        "green" => Color::Green,
        "yellow" => Color::Yellow,
        "blue" => Color::Blue,
        "magenta" => Color::Magenta,
        "cyan" => Color::Cyan,
        "white" => Color::White,
        "gray" | "grey" | "lightgray" | "lightgrey" => Color::Gray,
        "darkgray" | "darkgrey" => Color::DarkGray,
        "lightred" => Color::LightRed,
        "lightgreen" => Color::LightGreen,
        "lightyellow" => Color::LightYellow,
        "lightblue" => Color::LightBlue,
        "lightmagenta" => Color::LightMagenta,
        "lightcyan" => Color::LightCyan,
        "reset" => Color::Reset,
        _ => {
            if let Some(hex) = value.strip_prefix('#') {
                return parse_hex(hex);
            }
            if let Some(body) = value.strip_prefix("rgb(").and_then(|v| v.strip_suffix(')')) {
                return parse_rgb(body);
            }
            return None;
        }
    };
    Some(named)
}

/// Like [`try_parse_color`], falling back to white for anything unrecognized
pub fn parse_color(value: &str) -> Color {
    try_parse_color(value).unwrap_or(Color::White)
}

fn parse_hex(hex: &str) -> Option<Color> {
    if !hex.is_ascii() {
        return None;
    }
    match hex.len() {
        6 => {
            let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
            Some(Color::Rgb(channel(0)?, channel(2)?, channel(4)?))
        }
        3 => {
            // #abc is shorthand for #aabbcc
            let channel = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|c| c * 17);
            Some(Color::Rgb(channel(0)?, channel(1)?, channel(2)?))
        }
        _ => None,
    }
}

fn parse_rgb(body: &str) -> Option<Color> {
    let channels: Vec<u8> = body
        .split(',')
        .map(|part| part.trim().parse::<u8>().ok())
        .collect::<Option<_>>()?;
    match channels.as_slice() {
        [r, g, b] => Some(Color::Rgb(*r, *g, *b)),
        _ => None,
    }
}

/// Inverse of [`parse_color`] for the colors it produces
pub fn format_color_for_display(color: &Color) -> String {
    let name = match color {
        Color::Black => "black",
        Color::Red => "red",
        Color::Green => "green",
        Color::Yellow => "yellow",
        Color::Blue => "blue",
        Color::Magenta => "magenta",
        Color::Cyan => "cyan",
        Color::White => "white",
        Color::Gray => "gray",
        Color::DarkGray => "darkgray",
        Color::LightRed => "lightred",
        Color::LightGreen => "lightgreen",
        Color::LightYellow => "lightyellow",
        Color::LightBlue => "lightblue",
        Color::LightMagenta => "lightmagenta",
        Color::LightCyan => "lightcyan",
        Color::Reset => "reset",
        Color::Rgb(r, g, b) => return format!("#{:02X}{:02X}{:02X}", r, g, b),
        Color::Indexed(i) => return format!("indexed({})", i),
    };
    name.to_string()
}

/// WCAG relative luminance of an RGB color, 0.0 (black) to 1.0 (white)
fn relative_luminance(r: u8, g: u8, b: u8) -> f64 {
    let linear = |c: u8| {
        let c = c as f64 / 255.0;
        if c <= 0.03928 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    0.2126 * linear(r) + 0.7152 * linear(g) + 0.0722 * linear(b)
}

/// Black or white, whichever reads better on `background`
pub fn get_contrast_text_color(background: Color) -> Color {
    let dark = match background {
        Color::Rgb(r, g, b) => relative_luminance(r, g, b) < 0.5,
        // Terminals render gray and the light variants bright enough for black text
        Color::Black | Color::Blue | Color::Magenta | Color::Red | Color::DarkGray => true,
        _ => false,
    };
    if dark { Color::White } else { Color::Black }
}

pub fn get_contrast_text_color_from_str(background: &str) -> Color {
    get_contrast_text_color(parse_color(background))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_named_hex_and_rgb() {
        assert_eq!(parse_color("LightCyan"), Color::LightCyan);
        assert_eq!(parse_color("grey"), Color::Gray);
        assert_eq!(parse_color("#1e3a5f"), Color::Rgb(0x1e, 0x3a, 0x5f));
        assert_eq!(parse_color("#fff"), Color::Rgb(255, 255, 255));
        assert_eq!(parse_color("rgb(10, 20, 30)"), Color::Rgb(10, 20, 30));
    }

    #[test]
    fn test_unknown_colors_fall_back_to_white() {
        assert_eq!(try_parse_color("chartreuse"), None);
        assert_eq!(try_parse_color("#12345"), None);
        assert_eq!(try_parse_color("rgb(1,2)"), None);
        assert_eq!(parse_color("rgb(300,0,0)"), Color::White);
    }

    #[test]
    fn test_format_round_trips_through_parse() {
        for name in ["black", "lightmagenta", "darkgray"] {
            assert_eq!(format_color_for_display(&parse_color(name)), name);
        }
        assert_eq!(format_color_for_display(&Color::Rgb(30, 58, 95)), "#1E3A5F");
    }

    #[test]
    fn test_contrast_text_color() {
        assert_eq!(get_contrast_text_color(Color::Blue), Color::White);
        assert_eq!(get_contrast_text_color(Color::Yellow), Color::Black);
        assert_eq!(get_contrast_text_color_from_str("#f0f0f0"), Color::Black);
        assert_eq!(get_contrast_text_color_from_str("#1e3a5f"), Color::White);
    }
}
