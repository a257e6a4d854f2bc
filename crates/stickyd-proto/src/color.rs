//! Theme color handling.
//!
//! Embed colors are plain RGB integers on the wire; operators write them
//! as CSS-style hex strings (`#0099ff`).

use crate::error::ColorError;

/// Parse `#rrggbb`, `0xrrggbb` or `rrggbb` into an embed color value.
pub fn parse_hex_color(input: &str) -> Result<u32, ColorError> {
    let trimmed = input.trim();
    let digits = trimmed
        .strip_prefix('#')
        .or_else(|| trimmed.strip_prefix("0x"))
        .unwrap_or(trimmed);

    if digits.len() != 6 {
        return Err(ColorError::Length(digits.len()));
    }
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(ColorError::InvalidDigit(digits.to_string()));
    }

    u32::from_str_radix(digits, 16).map_err(|_| ColorError::InvalidDigit(digits.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parses_default_palette() {
        assert_eq!(parse_hex_color("#0099ff"), Ok(0x0099ff));
        assert_eq!(parse_hex_color("#ff0000"), Ok(0xff0000));
        assert_eq!(parse_hex_color("0x7289DA"), Ok(0x7289da));
        assert_eq!(parse_hex_color("7289da"), Ok(0x7289da));
    }

    #[test]
    fn rejects_short_and_garbage() {
        assert_eq!(parse_hex_color("#fff"), Err(ColorError::Length(3)));
        assert!(matches!(
            parse_hex_color("#gg0000"),
            Err(ColorError::InvalidDigit(_))
        ));
        assert_eq!(parse_hex_color(""), Err(ColorError::Length(0)));
    }

    proptest! {
        #[test]
        fn any_rgb_value_parses_back(value in 0u32..=0xff_ffff) {
            let rendered = format!("#{:06x}", value);
            prop_assert_eq!(parse_hex_color(&rendered), Ok(value));
        }
    }
}
