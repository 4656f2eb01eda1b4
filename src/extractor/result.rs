//! # 取色结果模型
//!
//! ## 设计思路
//!
//! 各宿主平台的取色结果字段集合不同，用 `platform` 字段区分的标签联合表示，
//! 不引入公共父结构。序列化后与宿主侧 JS 类型一一对应（camelCase）。
//!
//! 本 crate 的流水线回答四项 harmony 查询并产出 `Harmony` 变体；其余变体用于
//! 反序列化其它平台产出的结果。

use serde::{Deserialize, Serialize};

use super::Quality;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AndroidImageColors {
    pub dominant: String,
    pub average: String,
    pub vibrant: String,
    pub dark_vibrant: String,
    pub light_vibrant: String,
    pub dark_muted: String,
    pub light_muted: String,
    pub muted: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebImageColors {
    pub dominant: String,
    pub vibrant: String,
    pub dark_vibrant: String,
    pub light_vibrant: String,
    pub dark_muted: String,
    pub light_muted: String,
    pub muted: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IosImageColors {
    pub background: String,
    pub primary: String,
    pub secondary: String,
    pub detail: String,
    pub quality: Quality,
}

/// 主色、占比最大色、饱和度最高色、平均色。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HarmonyImageColors {
    pub main_color: String,
    pub largest_proportion_color: String,
    pub highest_saturation_color: String,
    pub average_color: String,
}

/// 按平台区分的取色结果。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "platform", rename_all = "lowercase")]
pub enum ImageColorsResult {
    Android(AndroidImageColors),
    Web(WebImageColors),
    Ios(IosImageColors),
    Harmony(HarmonyImageColors),
}

impl ImageColorsResult {
    pub fn platform(&self) -> &'static str {
        match self {
            Self::Android(_) => "android",
            Self::Web(_) => "web",
            Self::Ios(_) => "ios",
            Self::Harmony(_) => "harmony",
        }
    }

    pub fn as_harmony(&self) -> Option<&HarmonyImageColors> {
        match self {
            Self::Harmony(colors) => Some(colors),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn harmony_result_serializes_with_platform_tag() {
        let result = ImageColorsResult::Harmony(HarmonyImageColors {
            main_color: "#112233".to_string(),
            largest_proportion_color: "#445566".to_string(),
            highest_saturation_color: "#778899".to_string(),
            average_color: "#aabbcc".to_string(),
        });

        let value = serde_json::to_value(&result).expect("serialize result");
        assert_eq!(
            value,
            json!({
                "platform": "harmony",
                "mainColor": "#112233",
                "largestProportionColor": "#445566",
                "highestSaturationColor": "#778899",
                "averageColor": "#aabbcc",
            })
        );
    }

    #[test]
    fn ios_result_deserializes_by_platform_tag() {
        let value = json!({
            "platform": "ios",
            "background": "#000000",
            "primary": "#111111",
            "secondary": "#222222",
            "detail": "#333333",
            "quality": "highest",
        });

        let result: ImageColorsResult =
            serde_json::from_value(value).expect("deserialize ios result");
        assert_eq!(result.platform(), "ios");
        assert!(result.as_harmony().is_none());
        match result {
            ImageColorsResult::Ios(colors) => {
                assert_eq!(colors.detail, "#333333");
                assert_eq!(colors.quality, Quality::Highest);
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn android_result_uses_camel_case_fields() {
        let value = json!({
            "platform": "android",
            "dominant": "#010101",
            "average": "#020202",
            "vibrant": "#030303",
            "darkVibrant": "#040404",
            "lightVibrant": "#050505",
            "darkMuted": "#060606",
            "lightMuted": "#070707",
            "muted": "#080808",
        });

        let result: ImageColorsResult =
            serde_json::from_value(value).expect("deserialize android result");
        match result {
            ImageColorsResult::Android(colors) => assert_eq!(colors.dark_muted, "#060606"),
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn unknown_platform_is_rejected() {
        let value = json!({ "platform": "symbian", "dominant": "#000000" });
        assert!(serde_json::from_value::<ImageColorsResult>(value).is_err());
    }
}
