//! Colour helpers: hex parsing/formatting and the representative colour of a
//! capture (average of its visible pixels).

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Lowercase `#rrggbb`.
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Parses `#rrggbb` or `rrggbb` (case-insensitive).
    pub fn from_hex(s: &str) -> Option<Self> {
        let digits = s.trim().strip_prefix('#').unwrap_or(s.trim());
        if digits.len() != 6 || !digits.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
        Some(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
        })
    }
}

/// Average colour over RGBA pixels, skipping fully transparent ones.
///
/// Trailing bytes that do not form a whole pixel are ignored. Returns `None`
/// when no visible pixel exists.
pub fn representative_color(rgba: &[u8]) -> Option<Rgb> {
    let mut sum = [0u64; 3];
    let mut count = 0u64;

    for px in rgba.chunks_exact(4) {
        if px[3] == 0 {
            continue;
        }
        sum[0] += px[0] as u64;
        sum[1] += px[1] as u64;
        sum[2] += px[2] as u64;
        count += 1;
    }

    if count == 0 {
        return None;
    }

    let avg = |total: u64| ((total as f64 / count as f64).round()).clamp(0.0, 255.0) as u8;
    Some(Rgb {
        r: avg(sum[0]),
        g: avg(sum[1]),
        b: avg(sum[2]),
    })
}
