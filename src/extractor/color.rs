//! # 颜色值与十六进制规范化

use serde::{Deserialize, Serialize};

/// 取色器输出的 4 通道颜色（0–255）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RgbaColor {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub alpha: u8,
}

impl RgbaColor {
    pub const fn new(red: u8, green: u8, blue: u8, alpha: u8) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// 输出 `#rrggbb`，丢弃 alpha。
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.red, self.green, self.blue)
    }
}

/// 颜色缺失时返回 `None`，由调用方替换为兜底色。
///
/// # 示例
/// ```rust
/// use image_colors::extractor::{rgba_to_hex, RgbaColor};
///
/// let color = RgbaColor::new(255, 0, 128, 255);
/// assert_eq!(rgba_to_hex(Some(&color)).as_deref(), Some("#ff0080"));
/// assert_eq!(rgba_to_hex(None), None);
/// ```
pub fn rgba_to_hex(color: Option<&RgbaColor>) -> Option<String> {
    color.map(RgbaColor::to_hex)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn hex_drops_alpha_and_pads_channels() {
        assert_eq!(RgbaColor::new(255, 0, 128, 255).to_hex(), "#ff0080");
        assert_eq!(RgbaColor::new(1, 2, 3, 0).to_hex(), "#010203");
        assert_eq!(RgbaColor::new(0, 0, 0, 17).to_hex(), "#000000");
    }

    #[test]
    fn missing_color_yields_no_hex() {
        assert!(rgba_to_hex(None).is_none());
    }

    proptest! {
        #[test]
        fn hex_is_always_well_formed(r: u8, g: u8, b: u8, a: u8) {
            let hex = RgbaColor::new(r, g, b, a).to_hex();
            prop_assert_eq!(hex.len(), 7);
            prop_assert!(hex.starts_with('#'));
            prop_assert!(hex[1..].chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
            prop_assert_eq!(u8::from_str_radix(&hex[1..3], 16).unwrap(), r);
            prop_assert_eq!(u8::from_str_radix(&hex[3..5], 16).unwrap(), g);
            prop_assert_eq!(u8::from_str_radix(&hex[5..7], 16).unwrap(), b);
        }
    }
}
