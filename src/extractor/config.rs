//! # 配置模块
//!
//! ## 设计思路
//!
//! 配置分两层：
//! - `ImageColorsConfig`：单次调用参数（兜底色、质量档位、请求头等），不可变，
//!   字段命名与宿主侧 JS 配置对象一致（camelCase），可直接由 JSON 反序列化。
//! - `ExtractorConfig`：处理器级运行时策略（体积/像素上限、缩放滤镜、资源根目录、
//!   结果缓存容量），由 `ImageColorsHandler` 持有并按调用取快照。
//!
//! ## 实现思路
//!
//! - `Quality` 负责档位解析与除数映射，未知/缺省档位一律按 `low` 处理。
//! - `parse_fallback_color` 在任何 I/O 之前校验兜底色，`#rgb` 展开为 `#rrggbb`。

use std::collections::HashMap;
use std::path::PathBuf;

use image::imageops::FilterType;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

use super::ImageColorsError;

/// 缺省兜底色。
pub const DEFAULT_FALLBACK_COLOR: &str = "#000000";

static FALLBACK_COLOR_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#([A-Fa-f0-9]{6}|[A-Fa-f0-9]{3})$").expect("fallback color pattern is valid")
});

/// 解码质量档位。
///
/// - `Lowest`：尺寸 ÷10，最快
/// - `Low`：尺寸 ÷5（缺省）
/// - `High`：尺寸 ÷1.333
/// - `Highest`：原始分辨率
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    Lowest,
    #[default]
    Low,
    High,
    Highest,
}

impl Quality {
    /// 从外部字符串解析档位。
    ///
    /// 只识别全小写的档位名，其它输入（含大小写变体、首尾空白）一律回落到 `Low`。
    ///
    /// # 示例
    /// ```rust
    /// use image_colors::extractor::Quality;
    ///
    /// assert_eq!(Quality::from_name("highest"), Quality::Highest);
    /// assert_eq!(Quality::from_name("Highest"), Quality::Low);
    /// assert_eq!(Quality::from_name("ultra"), Quality::Low);
    /// ```
    pub fn from_name(name: &str) -> Self {
        match name {
            "lowest" => Self::Lowest,
            "low" => Self::Low,
            "high" => Self::High,
            "highest" => Self::Highest,
            other => {
                log::debug!("未知质量档位：{}，按 low 处理", other);
                Self::Low
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lowest => "lowest",
            Self::Low => "low",
            Self::High => "high",
            Self::Highest => "highest",
        }
    }

    /// 解码目标尺寸的除数。
    pub fn divisor(self) -> f64 {
        match self {
            Self::Lowest => 10.0,
            Self::Low => 5.0,
            Self::High => 1.333,
            Self::Highest => 1.0,
        }
    }

    /// 按除数计算解码目标尺寸，每边至少 1 像素。
    pub fn target_size(self, width: u32, height: u32) -> (u32, u32) {
        let divisor = self.divisor();
        let scale = |dim: u32| ((dim as f64 / divisor).floor() as u32).max(1);
        (scale(width), scale(height))
    }
}

impl<'de> Deserialize<'de> for Quality {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name = Option::<String>::deserialize(deserializer)?;
        Ok(name.as_deref().map(Quality::from_name).unwrap_or_default())
    }
}

/// `data:image` 内联数据的取字节策略。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InlineDataMode {
    /// 按 `;base64,` 之后的负载做 Base64 解码。
    #[default]
    Decode,
    /// 直接把 URI 文本本身当作图片字节（旧行为）。
    Literal,
}

/// 单次取色调用参数。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageColorsConfig {
    /// 取色失败时使用的兜底色，须为 `#rgb` 或 `#rrggbb`。
    pub fallback: Option<String>,
    pub quality: Quality,
    /// 下载时使用的请求头；存在时整体替换默认请求头。
    pub headers: Option<HashMap<String, String>>,
    /// Android 端采样间隔，本流水线不消费。
    pub pixel_spacing: Option<u32>,
    /// 是否启用结果缓存（由服务层消费）。
    pub cache: bool,
    /// 结果缓存键，缺省使用 URI。
    pub key: Option<String>,
    pub inline_data: InlineDataMode,
}

impl ImageColorsConfig {
    /// 校验并返回规范化的兜底色。
    ///
    /// 空字符串与未提供等价，使用缺省兜底色。
    pub fn resolved_fallback(&self) -> Result<String, ImageColorsError> {
        let fallback = self
            .fallback
            .as_deref()
            .filter(|f| !f.is_empty())
            .unwrap_or(DEFAULT_FALLBACK_COLOR);
        parse_fallback_color(fallback)
    }
}

/// 校验兜底色并展开为 6 位形式。
///
/// 6 位输入原样返回；3 位输入逐位重复。
///
/// # 示例
/// ```rust
/// use image_colors::extractor::parse_fallback_color;
///
/// assert_eq!(parse_fallback_color("#abc").unwrap(), "#aabbcc");
/// assert!(parse_fallback_color("abc").is_err());
/// ```
pub fn parse_fallback_color(hex: &str) -> Result<String, ImageColorsError> {
    if !FALLBACK_COLOR_PATTERN.is_match(hex) {
        return Err(ImageColorsError::InvalidConfig(format!(
            "兜底色格式非法：{}（须为 #ffffff 或 #fff）",
            hex
        )));
    }

    if hex.len() == 7 {
        return Ok(hex.to_string());
    }

    let expanded: String = hex[1..].chars().flat_map(|c| [c, c]).collect();
    Ok(format!("#{}", expanded))
}

/// 处理器级运行时配置。
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// 下载/读取原始字节时允许的最大体积（字节）。
    pub max_file_size: u64,
    /// 源图像素上限（`width * height`），超过则拒绝解码。
    pub max_decoded_pixels: u64,
    /// 降采样滤镜策略。
    pub resize_filter: FilterType,
    /// 内置资源根目录，`asset://x` 对应 `<asset_root>/assets/x`。
    pub asset_root: PathBuf,
    /// 结果缓存容量（条）。
    pub result_cache_capacity: usize,
    /// 未提供缓存键时，允许作为缓存键的 URI 最大长度。
    pub cache_key_max_uri_len: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            max_file_size: 50 * 1024 * 1024,
            max_decoded_pixels: 40_000_000,
            resize_filter: FilterType::Triangle,
            asset_root: PathBuf::from("."),
            result_cache_capacity: 64,
            cache_key_max_uri_len: 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn quality_divisors_match_levels() {
        assert_eq!(Quality::Highest.divisor(), 1.0);
        assert_eq!(Quality::High.divisor(), 1.333);
        assert_eq!(Quality::Low.divisor(), 5.0);
        assert_eq!(Quality::Lowest.divisor(), 10.0);
    }

    #[test]
    fn unknown_or_missing_quality_falls_back_to_low() {
        assert_eq!(Quality::from_name("extreme"), Quality::Low);
        assert_eq!(Quality::default().divisor(), Quality::Low.divisor());

        let config: ImageColorsConfig =
            serde_json::from_str(r#"{"quality":"ultra"}"#).expect("parse config");
        assert_eq!(config.quality.divisor(), 5.0);

        let config: ImageColorsConfig = serde_json::from_str("{}").expect("parse config");
        assert_eq!(config.quality, Quality::Low);

        let config: ImageColorsConfig =
            serde_json::from_str(r#"{"quality":null}"#).expect("parse config");
        assert_eq!(config.quality, Quality::Low);
    }

    #[test]
    fn quality_names_are_case_sensitive() {
        for name in ["Highest", "HIGHEST", " high ", "Lowest"] {
            assert_eq!(Quality::from_name(name), Quality::Low, "{name:?} should fall back to low");
        }

        let config: ImageColorsConfig =
            serde_json::from_str(r#"{"quality":"Highest"}"#).expect("parse config");
        assert_eq!(config.quality.divisor(), 5.0);
    }

    #[test]
    fn empty_fallback_uses_default_color() {
        let config: ImageColorsConfig =
            serde_json::from_str(r#"{"fallback":""}"#).expect("parse config");
        assert_eq!(config.resolved_fallback().expect("empty fallback"), "#000000");

        assert!(matches!(
            parse_fallback_color(""),
            Err(ImageColorsError::InvalidConfig(_))
        ));
    }

    #[test]
    fn target_size_divides_and_never_reaches_zero() {
        assert_eq!(Quality::Highest.target_size(640, 480), (640, 480));
        assert_eq!(Quality::Lowest.target_size(640, 480), (64, 48));
        assert_eq!(Quality::Low.target_size(3, 2), (1, 1));
        assert_eq!(Quality::High.target_size(1000, 400), (750, 300));
    }

    #[test]
    fn config_parses_camel_case_js_object() {
        let json = r##"{
            "fallback": "#fff",
            "quality": "highest",
            "headers": {"Authorization": "Bearer t"},
            "pixelSpacing": 5,
            "cache": true,
            "key": "cover-1",
            "inlineData": "literal"
        }"##;
        let config: ImageColorsConfig = serde_json::from_str(json).expect("parse config");

        assert_eq!(config.quality, Quality::Highest);
        assert_eq!(config.pixel_spacing, Some(5));
        assert!(config.cache);
        assert_eq!(config.key.as_deref(), Some("cover-1"));
        assert_eq!(config.inline_data, InlineDataMode::Literal);
        assert_eq!(config.resolved_fallback().expect("valid fallback"), "#ffffff");
    }

    #[test]
    fn default_fallback_is_black() {
        let config = ImageColorsConfig::default();
        assert_eq!(config.resolved_fallback().expect("default fallback"), "#000000");
    }

    #[test]
    fn fallback_rejects_malformed_values() {
        for bad in ["", "#", "000000", "#12345", "#1234567", "#ggg", "#12 456", " #123456"] {
            assert!(
                matches!(parse_fallback_color(bad), Err(ImageColorsError::InvalidConfig(_))),
                "should reject {bad:?}"
            );
        }
    }

    proptest! {
        #[test]
        fn six_digit_fallback_is_returned_unchanged(hex in "#[0-9A-Fa-f]{6}") {
            prop_assert_eq!(parse_fallback_color(&hex).unwrap(), hex);
        }

        #[test]
        fn three_digit_fallback_expands_each_digit(
            r in "[0-9A-Fa-f]",
            g in "[0-9A-Fa-f]",
            b in "[0-9A-Fa-f]",
        ) {
            let short = format!("#{r}{g}{b}");
            let expected = format!("#{r}{r}{g}{g}{b}{b}");
            prop_assert_eq!(parse_fallback_color(&short).unwrap(), expected);
        }

        #[test]
        fn fallback_without_hash_prefix_is_rejected(s in "[^#]\\PC{0,8}") {
            prop_assert!(parse_fallback_color(&s).is_err());
        }

        #[test]
        fn fallback_with_wrong_digit_count_is_rejected(
            digits in "[0-9A-Fa-f]{0,2}|[0-9A-Fa-f]{4,5}|[0-9A-Fa-f]{7,10}",
        ) {
            let input = format!("#{digits}");
            prop_assert!(parse_fallback_color(&input).is_err());
        }

        #[test]
        fn fallback_with_non_hex_digit_is_rejected(
            head in "[0-9A-Fa-f]{0,5}",
            bad in "[g-zG-Z ]",
        ) {
            let input = format!("#{head}{bad}");
            prop_assert!(parse_fallback_color(&input).is_err());
        }
    }
}
