//! # 核心编排模块
//!
//! ## 设计思路
//!
//! `ImageColorsHandler` 只负责流程编排与配置管理，不绑定任何宿主运行时。
//! 处理链路固定为单向流水线：
//! 1. 校验兜底色（任何 I/O 之前）
//! 2. 按 URI 前缀选择取字节策略并加载原始字节
//! 3. 按质量档位解码
//! 4. 取色并规范化为十六进制
//! 5. 释放像素缓冲并返回
//!
//! 任一阶段失败即短路为单个错误，不返回部分结果、不重试。
//!
//! ## 实现思路
//!
//! - 配置通过 `Arc<RwLock<ExtractorConfig>>` 支持运行时调整，单次调用内使用同一快照。
//! - 资源读取、解码、取色三项能力均可注入，缺省分别为磁盘资源目录、`image` 解码与 k-means 取色。
//! - 记录 `load/decode/analyze/total` 阶段耗时，便于性能诊断。

use std::sync::{Arc, RwLock};
use std::time::Instant;

use super::{
    AssetReader, ColorAnalyzer, ExtractorConfig, ImageColorsConfig, ImageColorsError,
    ImageColorsResult, ImageSource, KmeansColorAnalyzer, PixelDecoder,
};

/// 取色处理器。
pub struct ImageColorsHandler {
    pub(super) config: Arc<RwLock<ExtractorConfig>>,
    pub(super) http: reqwest::Client,
    pub(super) assets: Option<Arc<dyn AssetReader>>,
    pub(super) decoder: Option<Arc<dyn PixelDecoder>>,
    pub(super) analyzer: Arc<dyn ColorAnalyzer>,
}

impl ImageColorsHandler {
    /// 根据初始配置创建处理器。
    ///
    /// 这里同时构建复用型 HTTP 客户端，减少每次请求的初始化开销。
    ///
    /// # 示例
    /// ```rust
    /// use image_colors::extractor::{ExtractorConfig, ImageColorsHandler};
    ///
    /// let handler = ImageColorsHandler::new(ExtractorConfig::default())?;
    /// # Ok::<(), image_colors::extractor::ImageColorsError>(())
    /// ```
    pub fn new(config: ExtractorConfig) -> Result<Self, ImageColorsError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| ImageColorsError::Network(format!("无法创建 HTTP 客户端：{}", e)))?;

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            http,
            assets: None,
            decoder: None,
            analyzer: Arc::new(KmeansColorAnalyzer::default()),
        })
    }

    /// 注入资源读取实现（替代 `<asset_root>` 目录读取）。
    pub fn with_asset_reader(mut self, reader: Arc<dyn AssetReader>) -> Self {
        self.assets = Some(reader);
        self
    }

    /// 注入解码实现（替代按配置构建的 `ImageCrateDecoder`）。
    pub fn with_decoder(mut self, decoder: Arc<dyn PixelDecoder>) -> Self {
        self.decoder = Some(decoder);
        self
    }

    pub fn with_analyzer(mut self, analyzer: Arc<dyn ColorAnalyzer>) -> Self {
        self.analyzer = analyzer;
        self
    }

    /// 获取配置快照。
    ///
    /// 作用：保证单次请求链路使用一致参数。
    pub fn config_snapshot(&self) -> Result<ExtractorConfig, ImageColorsError> {
        self.config
            .read()
            .map(|cfg| cfg.clone())
            .map_err(|_| ImageColorsError::InvalidConfig("配置读取锁已中毒".to_string()))
    }

    /// 原地修改运行时配置，对之后发起的调用生效。
    pub fn update_config<F>(&self, update: F) -> Result<(), ImageColorsError>
    where
        F: FnOnce(&mut ExtractorConfig),
    {
        let mut config = self
            .config
            .write()
            .map_err(|_| ImageColorsError::InvalidConfig("配置写入锁已中毒".to_string()))?;
        update(&mut config);

        log::info!(
            "⚙️ 已更新取色配置（max_file_size={}, max_decoded_pixels={}, filter={:?}, root={}）",
            config.max_file_size,
            config.max_decoded_pixels,
            config.resize_filter,
            config.asset_root.display()
        );

        Ok(())
    }

    /// 处理主入口：从 URI 取色。
    ///
    /// `options` 为空时使用缺省配置（兜底色 `#000000`、档位 `low`）。
    ///
    /// # 示例
    /// ```rust,no_run
    /// use image_colors::extractor::{ExtractorConfig, ImageColorsConfig, ImageColorsHandler};
    ///
    /// # async fn demo() -> Result<(), image_colors::extractor::ImageColorsError> {
    /// let handler = ImageColorsHandler::new(ExtractorConfig::default())?;
    /// let options = ImageColorsConfig {
    ///     fallback: Some("#fff".into()),
    ///     ..ImageColorsConfig::default()
    /// };
    /// let colors = handler
    ///     .get_colors("https://example.com/cover.png", Some(&options))
    ///     .await?;
    /// println!("{}", colors.platform());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn get_colors(
        &self,
        uri: &str,
        options: Option<&ImageColorsConfig>,
    ) -> Result<ImageColorsResult, ImageColorsError> {
        let defaults = ImageColorsConfig::default();
        let options = options.unwrap_or(&defaults);

        let fallback = options.resolved_fallback()?;
        let config = self.config_snapshot()?;
        let total_start = Instant::now();

        let source = ImageSource::classify(uri).ok_or_else(|| {
            ImageColorsError::UnsupportedUri(format!(
                "无法识别的 URI：{}",
                Self::truncate_for_log(uri)
            ))
        })?;

        let load_start = Instant::now();
        let raw = match &source {
            ImageSource::Remote(url) => {
                self.load_from_remote(url, options.headers.as_ref(), &config).await?
            }
            ImageSource::Asset(path) => self.load_from_asset(path, &config)?,
            ImageSource::InlineData(data) => {
                self.load_from_inline_data(data, options.inline_data, &config)?
            }
        };
        let load_elapsed = load_start.elapsed();

        if raw.bytes.is_empty() {
            return Err(ImageColorsError::UnsupportedUri(format!(
                "未取得图片数据（来源：{}）",
                source.hint()
            )));
        }

        let decode_start = Instant::now();
        let pixels = self.decode_pixels(&raw, options.quality, &config)?;
        let decode_elapsed = decode_start.elapsed();
        drop(raw);

        let analyze_start = Instant::now();
        let colors = self.analyze_pixels(pixels, &fallback)?;
        let analyze_elapsed = analyze_start.elapsed();

        log::info!(
            "✅ 取色完成 - 来源: {} load={}ms decode={}ms analyze={}ms total={}ms",
            source.hint(),
            load_elapsed.as_millis(),
            decode_elapsed.as_millis(),
            analyze_elapsed.as_millis(),
            total_start.elapsed().as_millis()
        );

        Ok(ImageColorsResult::Harmony(colors))
    }

    /// 截断超长 URI（如内联数据），避免日志与错误信息膨胀。
    fn truncate_for_log(uri: &str) -> String {
        const MAX_CHARS: usize = 64;
        if uri.chars().count() <= MAX_CHARS {
            return uri.to_string();
        }
        let head: String = uri.chars().take(MAX_CHARS).collect();
        format!("{}…", head)
    }
}
