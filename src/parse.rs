use thiserror::Error;

use crate::color::Rgb;

/// error returned when a color string matches neither the hex nor the rgb
/// forms accepted by [`parse_color`]. carries the offending input for
/// diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid color format: {input:?}. expected hex (#ff5733) or rgb (rgb(255, 87, 51), or 255, 87, 51)")]
pub struct ParseColorError {
    pub input: String,
}

#[inline]
fn nibble(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

/// parse `#RGB`, `#RRGGBB`, `RGB` or `RRGGBB` (case-insensitive).
/// 3-digit shorthand expands each nibble twice (`#f53` == `#ff5533`).
pub fn hex_to_rgb(input: &str) -> Option<Rgb> {
    let hex = input.strip_prefix('#').unwrap_or(input);
    let bytes = hex.as_bytes();
    match bytes.len() {
        3 => {
            let r = nibble(bytes[0])?;
            let g = nibble(bytes[1])?;
            let b = nibble(bytes[2])?;
            Some(Rgb::new(r * 17, g * 17, b * 17))
        }
        6 => {
            let pair = |hi: u8, lo: u8| Some((nibble(hi)? << 4) | nibble(lo)?);
            Some(Rgb::new(
                pair(bytes[0], bytes[1])?,
                pair(bytes[2], bytes[3])?,
                pair(bytes[4], bytes[5])?,
            ))
        }
        _ => None,
    }
}

/// one rgb component: a non-negative integer. values above 255 clamp to
/// 255; anything with a sign or other non-digit does not parse.
fn parse_component(text: &str) -> Option<u8> {
    let text = text.trim();
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // all-digit values too large for u64 are certainly above 255
    Some(text.parse::<u64>().map_or(255, |v| v.min(255) as u8))
}

/// strip a case-insensitive `rgb( ... )` call, returning its argument list.
fn strip_rgb_call(text: &str) -> Option<&str> {
    if !text.as_bytes().get(..3)?.eq_ignore_ascii_case(b"rgb") {
        return None;
    }
    text[3..]
        .trim_start()
        .strip_prefix('(')?
        .strip_suffix(')')
        .map(str::trim)
}

/// parse `rgb(R, G, B)` or a bare `R, G, B` triple. components are
/// non-negative integers only: negatives are unparseable, values above
/// 255 clamp.
pub fn parse_rgb(input: &str) -> Option<Rgb> {
    let body = input.trim();
    let body = strip_rgb_call(body).unwrap_or(body);

    let mut parts = body.split(',');
    let r = parse_component(parts.next()?)?;
    let g = parse_component(parts.next()?)?;
    let b = parse_component(parts.next()?)?;
    if parts.next().is_some() {
        return None;
    }
    Some(Rgb::new(r, g, b))
}

/// color-string front door: hex first, then the rgb forms.
pub fn parse_color(input: &str) -> Result<Rgb, ParseColorError> {
    hex_to_rgb(input)
        .or_else(|| parse_rgb(input))
        .ok_or_else(|| ParseColorError {
            input: input.to_owned(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_six_digit() {
        assert_eq!(hex_to_rgb("#ff5733"), Some(Rgb::new(255, 87, 51)));
        assert_eq!(hex_to_rgb("ff5733"), Some(Rgb::new(255, 87, 51)));
        assert_eq!(hex_to_rgb("#AaBbCc"), Some(Rgb::new(170, 187, 204)));
    }

    #[test]
    fn test_hex_shorthand_expands_nibbles() {
        assert_eq!(hex_to_rgb("#fff"), Some(Rgb::new(255, 255, 255)));
        assert_eq!(hex_to_rgb("000"), Some(Rgb::BLACK));
        assert_eq!(hex_to_rgb("#f53"), Some(Rgb::new(255, 85, 51)));
    }

    #[test]
    fn test_hex_rejects_invalid() {
        assert_eq!(hex_to_rgb("invalid"), None);
        assert_eq!(hex_to_rgb("#gggggg"), None);
        assert_eq!(hex_to_rgb("#12345"), None); // 5 digits
        assert_eq!(hex_to_rgb(""), None);
    }

    #[test]
    fn test_rgb_function_form() {
        assert_eq!(parse_rgb("rgb(255, 87, 51)"), Some(Rgb::new(255, 87, 51)));
        assert_eq!(parse_rgb("rgb(255,87,51)"), Some(Rgb::new(255, 87, 51)));
        assert_eq!(parse_rgb("RGB(0, 0, 255)"), Some(Rgb::new(0, 0, 255)));
    }

    #[test]
    fn test_rgb_bare_comma_form() {
        assert_eq!(parse_rgb("255, 87, 51"), Some(Rgb::new(255, 87, 51)));
        assert_eq!(parse_rgb("255,87,51"), Some(Rgb::new(255, 87, 51)));
    }

    #[test]
    fn test_rgb_clamps_oversized_components() {
        assert_eq!(parse_rgb("300, 400, 500"), Some(Rgb::new(255, 255, 255)));
        assert_eq!(
            parse_rgb("99999999999999999999, 0, 0"),
            Some(Rgb::new(255, 0, 0))
        );
    }

    #[test]
    fn test_rgb_rejects_negative_components() {
        assert_eq!(parse_rgb("255, -10, 128"), None);
    }

    #[test]
    fn test_rgb_rejects_wrong_arity() {
        assert_eq!(parse_rgb("255, 87"), None);
        assert_eq!(parse_rgb("255, 87, 51, 12"), None);
        assert_eq!(parse_rgb("invalid"), None);
        assert_eq!(parse_rgb(""), None);
    }

    #[test]
    fn test_parse_color_tries_hex_then_rgb() {
        assert_eq!(parse_color("#ff5733"), Ok(Rgb::new(255, 87, 51)));
        assert_eq!(parse_color("255, 87, 51"), Ok(Rgb::new(255, 87, 51)));

        let err = parse_color("not-a-color").unwrap_err();
        assert_eq!(err.input, "not-a-color");
        assert!(err.to_string().contains("invalid color format"));
    }
}
