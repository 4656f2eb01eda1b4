//! # 服务层（带结果缓存）
//!
//! ## 设计思路
//!
//! `ImageColorsService` 包装 `ImageColorsHandler`，消费调用参数里的 `cache` / `key`：
//! - `cache == false`：直接透传到处理器
//! - `cache == true`：以 `key`（缺省为 URI）查询 LRU 缓存，命中即返回，不触发任何 I/O
//!
//! 只缓存成功结果，失败不写入缓存。
//!
//! ## 实现思路
//!
//! 缓存由 `Mutex<LruCache>` 保护，锁不跨 `await` 持有；同一键的并发未命中
//! 会各自执行一次流水线，后写入者覆盖先写入者（结果等价）。

use std::num::NonZeroUsize;
use std::sync::Mutex;

use lru::LruCache;

use super::{
    ExtractorConfig, ImageColorsConfig, ImageColorsError, ImageColorsHandler, ImageColorsResult,
};

/// 取色服务。
pub struct ImageColorsService {
    handler: ImageColorsHandler,
    cache: Option<Mutex<LruCache<String, ImageColorsResult>>>,
}

impl ImageColorsService {
    /// 使用默认配置创建服务。
    ///
    /// # 示例
    /// ```rust,no_run
    /// use image_colors::extractor::ImageColorsService;
    ///
    /// let service = ImageColorsService::new()?;
    /// # Ok::<(), image_colors::extractor::ImageColorsError>(())
    /// ```
    pub fn new() -> Result<Self, ImageColorsError> {
        Self::with_config(ExtractorConfig::default())
    }

    /// 使用自定义配置创建服务。
    ///
    /// # 示例
    /// ```rust,no_run
    /// use image_colors::extractor::{ExtractorConfig, ImageColorsService};
    ///
    /// let mut config = ExtractorConfig::default();
    /// config.result_cache_capacity = 16;
    /// let service = ImageColorsService::with_config(config)?;
    /// # Ok::<(), image_colors::extractor::ImageColorsError>(())
    /// ```
    pub fn with_config(config: ExtractorConfig) -> Result<Self, ImageColorsError> {
        Self::with_handler(ImageColorsHandler::new(config)?)
    }

    /// 包装已构建（可能注入了自定义能力）的处理器。
    ///
    /// 缓存容量取自处理器当前配置，容量为 0 时关闭缓存。
    pub fn with_handler(handler: ImageColorsHandler) -> Result<Self, ImageColorsError> {
        let capacity = handler.config_snapshot()?.result_cache_capacity;
        let cache = NonZeroUsize::new(capacity).map(|cap| Mutex::new(LruCache::new(cap)));
        if cache.is_none() {
            log::info!("ℹ️ 结果缓存容量为 0，缓存已关闭");
        }

        Ok(Self { handler, cache })
    }

    /// 取色，按需读写结果缓存。
    ///
    /// # 示例
    /// ```rust,no_run
    /// use image_colors::extractor::{ImageColorsConfig, ImageColorsService};
    ///
    /// # async fn demo() -> Result<(), image_colors::extractor::ImageColorsError> {
    /// let service = ImageColorsService::new()?;
    /// let options = ImageColorsConfig {
    ///     cache: true,
    ///     key: Some("album-42".into()),
    ///     ..ImageColorsConfig::default()
    /// };
    /// let first = service.get_colors("asset://cover.png", Some(&options)).await?;
    /// let second = service.get_colors("asset://cover.png", Some(&options)).await?;
    /// assert_eq!(first, second);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn get_colors(
        &self,
        uri: &str,
        options: Option<&ImageColorsConfig>,
    ) -> Result<ImageColorsResult, ImageColorsError> {
        // 未要求缓存或缓存已关闭（容量为 0）时直接透传，不要求缓存键
        let Some(options) = options.filter(|o| o.cache && self.cache.is_some()) else {
            return self.handler.get_colors(uri, options).await;
        };

        // 缓存命中前仍校验兜底色，非法配置不因命中而被掩盖
        options.resolved_fallback()?;
        let key = self.cache_key(uri, options)?;

        if let Some(hit) = self.lookup(&key)? {
            log::debug!("🗂️ 结果缓存命中 - key: {}", key);
            return Ok(hit);
        }

        let result = self.handler.get_colors(uri, Some(options)).await?;
        self.store(key, result.clone())?;
        Ok(result)
    }

    /// 清空结果缓存。
    pub fn clear_cache(&self) -> Result<(), ImageColorsError> {
        if let Some(cache) = &self.cache {
            Self::lock(cache)?.clear();
            log::info!("🧹 已清空取色结果缓存");
        }
        Ok(())
    }

    /// 当前缓存条目数。
    pub fn cached_len(&self) -> Result<usize, ImageColorsError> {
        match &self.cache {
            Some(cache) => Ok(Self::lock(cache)?.len()),
            None => Ok(0),
        }
    }

    fn cache_key(
        &self,
        uri: &str,
        options: &ImageColorsConfig,
    ) -> Result<String, ImageColorsError> {
        if let Some(key) = &options.key {
            return Ok(key.clone());
        }

        let max_len = self.handler.config_snapshot()?.cache_key_max_uri_len;
        if uri.len() > max_len {
            return Err(ImageColorsError::InvalidConfig(format!(
                "URI 长度 {} 超过缓存键上限 {}，请提供 key",
                uri.len(),
                max_len
            )));
        }

        Ok(uri.to_string())
    }

    fn lookup(&self, key: &str) -> Result<Option<ImageColorsResult>, ImageColorsError> {
        match &self.cache {
            Some(cache) => Ok(Self::lock(cache)?.get(key).cloned()),
            None => Ok(None),
        }
    }

    fn store(&self, key: String, result: ImageColorsResult) -> Result<(), ImageColorsError> {
        if let Some(cache) = &self.cache {
            Self::lock(cache)?.put(key, result);
        }
        Ok(())
    }

    fn lock(
        cache: &Mutex<LruCache<String, ImageColorsResult>>,
    ) -> Result<std::sync::MutexGuard<'_, LruCache<String, ImageColorsResult>>, ImageColorsError> {
        cache
            .lock()
            .map_err(|_| ImageColorsError::InvalidConfig("结果缓存锁已中毒".to_string()))
    }
}
