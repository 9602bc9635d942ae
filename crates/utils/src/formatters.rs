// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use core::fmt;

// Custom formatter function for hex display
pub fn hexf(data: &[u8], f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{}", truncate(hex::encode(data)))
}

/// Short form of a hex encoded identifier, eg. `0x1a2b..9f0e`
pub fn short_hex(data: &[u8]) -> String {
    let s = hex::encode(data);
    if s.len() <= 12 {
        return format!("0x{}", s);
    }
    format!("0x{}..{}", &s[..4], &s[s.len() - 4..])
}

/// truncate a string
fn truncate(s: String) -> String {
    let threshold = 100;
    let limit = 50;
    let cutoff = limit / 2;
    if s.len() <= threshold {
        format!("0x{}", s)
    } else {
        let start = &s[..cutoff];
        let end = &s[s.len() - (limit - cutoff)..];
        format!("<bytes({}):0x{}..{}>", s.len(), start, end)
    }
}

#[cfg(test)]
mod tests {
    use super::short_hex;

    #[test]
    fn short_hex_keeps_small_values_whole() {
        assert_eq!(short_hex(&[0x01, 0x02]), "0x0102");
        assert_eq!(short_hex(&[0xaa; 32]), "0xaaaa..aaaa");
    }
}
