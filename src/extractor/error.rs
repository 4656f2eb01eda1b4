//! # 错误模型模块
//!
//! ## 设计思路
//!
//! 使用单一错误枚举承载取色链路中的所有错误来源，避免字符串拼接式错误处理。
//! 通过 `thiserror` 保持人类可读错误，同时让调用侧可按分支匹配。
//!
//! 单色缺失（某项取色结果为空）不是错误，由编排层直接替换为兜底色。

use serde::Serialize;

/// 取色流程统一错误类型。
#[derive(Debug, thiserror::Error)]
pub enum ImageColorsError {
    /// 调用方配置非法（兜底色、请求头、缓存键），在任何 I/O 之前失败。
    #[error("配置错误：{0}")]
    InvalidConfig(String),

    /// URI 无法匹配任何取字节策略，或未取得任何字节。
    #[error("获取图片失败：{0}")]
    UnsupportedUri(String),

    #[error("网络错误：{0}")]
    Network(String),

    #[error("资源读取错误：{0}")]
    Asset(String),

    #[error("资源限制：{0}")]
    ResourceLimit(String),

    #[error("解码错误：{0}")]
    Decode(String),

    #[error("取色错误：{0}")]
    Analysis(String),
}

impl ImageColorsError {
    /// 稳定错误码，供 CLI / 宿主侧按码分支。
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig(_) => "E_INVALID_CONFIG",
            Self::UnsupportedUri(_) => "E_UNSUPPORTED_URI",
            Self::Network(_) => "E_NETWORK",
            Self::Asset(_) => "E_ASSET",
            Self::ResourceLimit(_) => "E_RESOURCE_LIMIT",
            Self::Decode(_) => "E_DECODE",
            Self::Analysis(_) => "E_ANALYSIS",
        }
    }

    /// 出错所在的流水线阶段。
    pub fn stage(&self) -> &'static str {
        match self {
            Self::InvalidConfig(_) => "config",
            Self::UnsupportedUri(_) => "resolve",
            Self::Network(_) | Self::Asset(_) => "load",
            Self::ResourceLimit(_) | Self::Decode(_) => "decode",
            Self::Analysis(_) => "analyze",
        }
    }
}

/// 序列化为人类可读字符串，满足 JSON 出口要求。
impl Serialize for ImageColorsError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// 结构化错误负载：`{code, stage, message}`。
#[derive(Debug, Clone, Serialize)]
pub struct ImageColorsErrorPayload {
    pub code: &'static str,
    pub stage: &'static str,
    pub message: String,
}

impl From<&ImageColorsError> for ImageColorsErrorPayload {
    fn from(error: &ImageColorsError) -> Self {
        Self {
            code: error.code(),
            stage: error.stage(),
            message: error.to_string(),
        }
    }
}
