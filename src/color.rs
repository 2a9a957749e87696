/// An RGBA color with 8-bit channels and a unit-interval alpha. Colors are
/// ephemeral: decoded from hex per paint pass, never persisted.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub alpha: f64,
}

impl Default for Color {
    /// Opaque black, matching a fresh drawing context's fill and stroke
    /// styles.
    fn default() -> Self {
        Color {
            red: 0,
            green: 0,
            blue: 0,
            alpha: 1.0,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ParseColorError {
    BadLength { len: usize },
    BadDigit,
}

impl Color {
    /// Decodes a 6-hex-digit string as a 24-bit color: red in bits 16–23,
    /// green in bits 8–15, blue in bits 0–7. Alpha is 1.
    pub fn try_parse(hex: &str) -> Result<Color, ParseColorError> {
        if hex.len() != 6 {
            return Err(ParseColorError::BadLength { len: hex.len() });
        }
        let bits = u32::from_str_radix(hex, 16).map_err(|_| ParseColorError::BadDigit)?;
        Ok(Color {
            red: ((bits & 0xff0000) >> 16) as u8,
            green: ((bits & 0x00ff00) >> 8) as u8,
            blue: (bits & 0x0000ff) as u8,
            alpha: 1.0,
        })
    }

    /// Lossy variant of [`Color::try_parse`]: malformed input degrades
    /// silently to opaque black. This is a best-effort visual utility, so
    /// callers that want validation use `try_parse` instead.
    pub fn parse(hex: &str) -> Color {
        Color::try_parse(hex).unwrap_or_default()
    }

    pub fn with_alpha(mut self, alpha: f64) -> Color {
        self.alpha = alpha;
        self
    }

    /// Builds a color from real-valued channels, clamping RGB into `[0, 255]`.
    /// Alpha is kept as-is; rasterization clamps it at the source boundary.
    pub fn from_channels(red: f64, green: f64, blue: f64, alpha: f64) -> Color {
        Color {
            red: red.clamp(0.0, 255.0) as u8,
            green: green.clamp(0.0, 255.0) as u8,
            blue: blue.clamp(0.0, 255.0) as u8,
            alpha,
        }
    }

    /// Lowercase 6-hex-digit representation of the RGB channels.
    pub fn to_hex(self) -> String {
        format!("{:02x}{:02x}{:02x}", self.red, self.green, self.blue)
    }
}
