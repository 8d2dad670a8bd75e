pub type Rgb = (u8, u8, u8);

pub const fn hex(value: u32) -> Rgb {
    (((value >> 16) & 0xff) as u8, ((value >> 8) & 0xff) as u8, (value & 0xff) as u8)
}

pub const PURPLE: Rgb = hex(0x9900ff);
pub const BLUE: Rgb = hex(0x00bfff);
pub const VIOLET: Rgb = hex(0xaa00ff);
pub const AZURE: Rgb = hex(0x0088ff);
pub const MAGENTA: Rgb = hex(0xff00cc);
pub const ROSE: Rgb = hex(0xff3db4);
pub const GOLD: Rgb = hex(0xffd700);

/// Purple and blue, the two colors most effects alternate between.
pub const SHADOW_PAIR: [Rgb; 2] = [PURPLE, BLUE];

/// Parses `RRGGBB` with or without a leading `#`.
pub fn parse_hex_color(hex: &str) -> Option<Rgb> {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }

    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;

    Some((r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_splits_channels() {
        assert_eq!(PURPLE, (153, 0, 255));
        assert_eq!(BLUE, (0, 191, 255));
    }

    #[test]
    fn parses_colors_with_and_without_hash() {
        assert_eq!(parse_hex_color("1a1b26"), Some((0x1a, 0x1b, 0x26)));
        assert_eq!(parse_hex_color("#ffffff"), Some((255, 255, 255)));
        assert_eq!(parse_hex_color("fff"), None);
        assert_eq!(parse_hex_color("zzzzzz"), None);
    }
}
