//! # 加载模块
//!
//! ## 设计思路
//!
//! 统一处理三种来源（网络 / 内置资源 / 内联数据）的原始字节加载，在解码之前
//! 尽早失败，减少不必要的内存与 CPU 消耗。
//!
//! ## 实现思路
//!
//! - 网络：单次 GET，调用方请求头整体替换默认头；仅 200 视为成功，流式读取并做体积限制。
//!   不重试、不额外设置超时，沿用 HTTP 客户端默认行为。
//! - 资源：经 `AssetReader` 按相对路径读取，默认实现读取 `<asset_root>/assets/...`。
//! - 内联数据：按 `InlineDataMode` 选择 Base64 解码或直接使用 URI 文本。

use std::collections::HashMap;
use std::io;
use std::path::{Component, Path, PathBuf};

use base64::{Engine as _, engine::general_purpose};
use bytes::{Bytes, BytesMut};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};

use super::source::RawImageData;
use super::{ExtractorConfig, ImageColorsError, ImageColorsHandler, InlineDataMode};

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";
const BASE64_MARKER: &str = ";base64,";
const BUFFER_INITIAL_CAPACITY: usize = 16 * 1024;

/// 内置资源读取能力，按相对路径（如 `assets/icon.png`）返回原始字节。
pub trait AssetReader: Send + Sync {
    fn read(&self, relative_path: &str) -> io::Result<Vec<u8>>;
}

/// 从磁盘目录读取内置资源。
#[derive(Debug, Clone)]
pub struct BundleAssetReader {
    root: PathBuf,
}

impl BundleAssetReader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl AssetReader for BundleAssetReader {
    fn read(&self, relative_path: &str) -> io::Result<Vec<u8>> {
        let relative = Path::new(relative_path);
        let escapes_root = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));

        if escapes_root {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("资源路径非法：{}", relative_path),
            ));
        }

        let full_path = self.root.join(relative);
        log::trace!("📦 读取内置资源 - 路径: {}", full_path.display());
        std::fs::read(full_path)
    }
}

impl ImageColorsHandler {
    /// 从网络地址加载图片原始字节。
    pub(super) async fn load_from_remote(
        &self,
        url: &str,
        headers: Option<&HashMap<String, String>>,
        config: &ExtractorConfig,
    ) -> Result<RawImageData, ImageColorsError> {
        log::info!("🌐 开始下载图片 - URL: {}", Self::redact_url_for_log(url));

        let request_headers = Self::build_request_headers(headers)?;
        let mut response = self
            .http
            .get(url)
            .headers(request_headers)
            .send()
            .await
            .map_err(|e| {
                ImageColorsError::Network(Self::sanitize_error_message_with_redacted_url(
                    &e.to_string(),
                    url,
                ))
            })?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(ImageColorsError::Network(format!(
                "HTTP {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("请求失败")
            )));
        }

        let total_len = response.content_length();
        if let Some(size) = total_len {
            if size > config.max_file_size {
                return Err(ImageColorsError::ResourceLimit(format!(
                    "文件过大：{:.2} MB（限制：{:.2} MB）",
                    size as f64 / 1024.0 / 1024.0,
                    config.max_file_size as f64 / 1024.0 / 1024.0
                )));
            }
        }

        let initial_capacity = total_len
            .map(|len| len.min(config.max_file_size).min(usize::MAX as u64) as usize)
            .filter(|len| *len > 0)
            .unwrap_or(BUFFER_INITIAL_CAPACITY);
        let mut buffer = BytesMut::with_capacity(initial_capacity);
        let mut total: u64 = 0;

        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| ImageColorsError::Network(format!("下载失败：{}", e)))?
        {
            total = total.saturating_add(chunk.len() as u64);
            if total > config.max_file_size {
                return Err(ImageColorsError::ResourceLimit("下载后文件超过大小限制".to_string()));
            }
            buffer.extend_from_slice(&chunk);
        }

        log::debug!("✅ 下载完成 - {} bytes", total);

        Ok(RawImageData {
            bytes: buffer.freeze(),
            source_hint: "remote",
        })
    }

    /// 从内置资源加载图片原始字节。
    pub(super) fn load_from_asset(
        &self,
        relative_path: &str,
        config: &ExtractorConfig,
    ) -> Result<RawImageData, ImageColorsError> {
        log::info!("📁 开始读取内置资源 - 路径: {}", relative_path);

        let bytes = match &self.assets {
            Some(reader) => reader.read(relative_path),
            None => BundleAssetReader::new(&config.asset_root).read(relative_path),
        }
        .map_err(|e| ImageColorsError::Asset(format!("{}：{}", relative_path, e)))?;

        if bytes.len() as u64 > config.max_file_size {
            return Err(ImageColorsError::ResourceLimit(format!(
                "资源文件过大：{:.2} MB（限制：{:.2} MB）",
                bytes.len() as f64 / 1024.0 / 1024.0,
                config.max_file_size as f64 / 1024.0 / 1024.0
            )));
        }

        Ok(RawImageData {
            bytes: Bytes::from(bytes),
            source_hint: "asset",
        })
    }

    /// 从 `data:image` URI 加载图片原始字节。
    pub(super) fn load_from_inline_data(
        &self,
        uri: &str,
        mode: InlineDataMode,
        config: &ExtractorConfig,
    ) -> Result<RawImageData, ImageColorsError> {
        log::info!("📝 开始处理内联图片数据（mode={:?}）", mode);

        let bytes = match mode {
            InlineDataMode::Decode => Self::parse_data_uri_with_limit(uri, config.max_file_size)?,
            InlineDataMode::Literal => uri.as_bytes().to_vec(),
        };

        Ok(RawImageData {
            bytes: Bytes::from(bytes),
            source_hint: "inline-data",
        })
    }

    /// 构建请求头：调用方提供时整体替换默认的 `Content-Type`。
    fn build_request_headers(
        headers: Option<&HashMap<String, String>>,
    ) -> Result<HeaderMap, ImageColorsError> {
        let mut map = HeaderMap::new();

        let Some(headers) = headers else {
            map.insert(CONTENT_TYPE, HeaderValue::from_static(DEFAULT_CONTENT_TYPE));
            return Ok(map);
        };

        for (name, value) in headers {
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                ImageColorsError::InvalidConfig(format!("请求头名称非法：{}（{}）", name, e))
            })?;
            let header_value = HeaderValue::from_str(value).map_err(|e| {
                ImageColorsError::InvalidConfig(format!("请求头 {} 的值非法：{}", name, e))
            })?;
            map.insert(header_name, header_value);
        }

        Ok(map)
    }

    fn estimate_base64_decoded_upper_bound_len(base64_data: &str) -> Result<u64, ImageColorsError> {
        let len = base64_data.trim().len() as u64;
        let groups = len
            .checked_add(3)
            .ok_or_else(|| ImageColorsError::ResourceLimit("Base64 输入长度溢出".to_string()))?
            / 4;

        groups
            .checked_mul(3)
            .ok_or_else(|| ImageColorsError::ResourceLimit("Base64 解码体积估算溢出".to_string()))
    }

    pub(crate) fn parse_data_uri_with_limit(
        data: &str,
        max_file_size: u64,
    ) -> Result<Vec<u8>, ImageColorsError> {
        let normalized = data.trim();

        let base64_start = normalized
            .find(BASE64_MARKER)
            .ok_or_else(|| ImageColorsError::Decode("内联数据缺少 base64 标记".to_string()))?;
        let base64_data = &normalized[base64_start + BASE64_MARKER.len()..];

        let estimated_len = Self::estimate_base64_decoded_upper_bound_len(base64_data)?;
        if estimated_len > max_file_size {
            return Err(ImageColorsError::ResourceLimit(format!(
                "Base64 预计解码体积过大：{:.2} MB（限制：{:.2} MB）",
                estimated_len as f64 / 1024.0 / 1024.0,
                max_file_size as f64 / 1024.0 / 1024.0
            )));
        }

        general_purpose::STANDARD
            .decode(base64_data)
            .map_err(|e| ImageColorsError::Decode(format!("Base64 解码失败：{}", e)))
    }

    fn redact_url_for_log(url: &str) -> String {
        let Ok(parsed) = reqwest::Url::parse(url) else {
            return "<invalid-url>".to_string();
        };

        let host = parsed.host_str().unwrap_or("<unknown-host>");
        let port = parsed.port().map(|p| format!(":{}", p)).unwrap_or_default();

        format!("{}://{}{}{}", parsed.scheme(), host, port, parsed.path())
    }

    fn sanitize_error_message_with_redacted_url(error_msg: &str, url: &str) -> String {
        let redacted = Self::redact_url_for_log(url);
        error_msg.replace(url, &redacted)
    }
}
