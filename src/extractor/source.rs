//! # 数据源与中间模型
//!
//! ## 设计思路
//!
//! 将“外部 URI 语义”和“流水线中间结果”解耦：
//! - `ImageSource` 表示 URI 分类后的取字节策略
//! - `RawImageData` 表示已加载但未解码的字节
//! - `PixelMap` 表示已解码、待取色的 RGBA 像素缓冲

use std::fmt;

use bytes::Bytes;

const HTTP_PREFIX: &str = "http";
const ASSET_PREFIX: &str = "asset://";
const ASSET_DIR_PREFIX: &str = "assets/";
const INLINE_DATA_PREFIX: &str = "data:image";

/// 图片输入来源（按 URI 前缀分类）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// 网络地址（`http` / `https` 前缀）。
    Remote(String),
    /// 内置资源，已把 `asset://` 替换为 `assets/` 的相对路径。
    Asset(String),
    /// `data:image` 内联数据，保留完整 URI。
    InlineData(String),
}

impl ImageSource {
    /// 按前缀选择取字节策略；无法识别时返回 `None`。
    ///
    /// # 示例
    /// ```rust
    /// use image_colors::extractor::ImageSource;
    ///
    /// assert_eq!(
    ///     ImageSource::classify("asset://icon.png"),
    ///     Some(ImageSource::Asset("assets/icon.png".into()))
    /// );
    /// assert_eq!(ImageSource::classify("ftp://host/a.png"), None);
    /// ```
    pub fn classify(uri: &str) -> Option<Self> {
        if uri.starts_with(HTTP_PREFIX) {
            return Some(Self::Remote(uri.to_string()));
        }

        if let Some(rest) = uri.strip_prefix(ASSET_PREFIX) {
            return Some(Self::Asset(format!("{}{}", ASSET_DIR_PREFIX, rest)));
        }

        if uri.starts_with(INLINE_DATA_PREFIX) {
            return Some(Self::InlineData(uri.to_string()));
        }

        None
    }

    /// 来源提示（用于日志与诊断）。
    pub fn hint(&self) -> &'static str {
        match self {
            Self::Remote(_) => "remote",
            Self::Asset(_) => "asset",
            Self::InlineData(_) => "inline-data",
        }
    }
}

/// 加载阶段输出：原始字节与来源标识。
pub(crate) struct RawImageData {
    pub(crate) bytes: Bytes,
    pub(crate) source_hint: &'static str,
}

type ReleaseHook = Box<dyn FnOnce() + Send>;

/// 解码阶段输出：RGBA8 像素缓冲。
///
/// 取色完成（无论成功与否）后随作用域释放，释放时调用一次可选的释放回调，
/// 对应平台侧 native 像素句柄的 `release()`。
pub struct PixelMap {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
    on_release: Option<ReleaseHook>,
}

impl PixelMap {
    /// 由 RGBA 字节构建像素缓冲，长度须为 `width * height * 4`。
    pub fn from_rgba(width: u32, height: u32, rgba: Vec<u8>) -> Option<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|pixels| pixels.checked_mul(4))?;

        if rgba.len() != expected {
            return None;
        }

        Some(Self {
            width,
            height,
            rgba,
            on_release: None,
        })
    }

    /// 绑定释放回调，`Drop` 时恰好调用一次。
    pub fn with_release_hook<F>(mut self, hook: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.on_release = Some(Box::new(hook));
        self
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn as_rgba(&self) -> &[u8] {
        &self.rgba
    }

    /// 按像素迭代 `[r, g, b, a]`。
    pub fn pixels(&self) -> impl Iterator<Item = [u8; 4]> + '_ {
        self.rgba
            .chunks_exact(4)
            .map(|px| [px[0], px[1], px[2], px[3]])
    }
}

impl fmt::Debug for PixelMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixelMap")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.rgba.len())
            .finish()
    }
}

impl Drop for PixelMap {
    fn drop(&mut self) {
        if let Some(hook) = self.on_release.take() {
            hook();
        }
        log::debug!("🧹 已释放像素缓冲 {}x{}", self.width, self.height);
    }
}
