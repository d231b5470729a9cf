#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Color {
    r: u8,
    g: u8,
    b: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Channels normalized to `0.0..=1.0`, in r, g, b order.
    pub fn unit_channels(&self) -> [f64; 3] {
        [self.r, self.g, self.b].map(|c| c as f64 / 255.0)
    }

    pub fn to_wgpu(self) -> wgpu::Color {
        let [r, g, b] = self.unit_channels();
        wgpu::Color { r, g, b, a: 1.0 }
    }

    /// Parses `#rrggbb` or `rrggbb`.
    pub fn from_hex(s: &str) -> Option<Color> {
        let s = s.strip_prefix('#').unwrap_or(s);
        if s.len() != 6 || !s.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&s[i..i + 2], 16).ok();
        Some(Color::rgb(channel(0)?, channel(2)?, channel(4)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_channels_scale_to_one() {
        assert_eq!(Color::WHITE.unit_channels(), [1.0, 1.0, 1.0]);
        assert_eq!(Color::rgb(0, 0, 0).unit_channels(), [0.0, 0.0, 0.0]);
        let [r, ..] = Color::rgb(51, 0, 0).unit_channels();
        assert!((r - 0.2).abs() < 1e-12);
    }

    #[test]
    fn hex_parsing() {
        assert_eq!(Color::from_hex("#333333"), Some(Color::rgb(51, 51, 51)));
        assert_eq!(Color::from_hex("ff0080"), Some(Color::rgb(255, 0, 128)));
        assert_eq!(Color::from_hex("#12345"), None);
        assert_eq!(Color::from_hex("zzzzzz"), None);
    }
}
