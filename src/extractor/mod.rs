//! # 图片取色模块（extractor）
//!
//! ## 设计思路
//!
//! 该模块将“URI 分类 → 取字节 → 按档位解码 → 取色 → 十六进制规范化”
//! 按职责拆分为多个子模块，避免单文件膨胀与耦合。
//!
//! - `service`：结果缓存（消费 `cache` / `key`）
//! - `handler`：编排整条处理流水线
//! - `loader`：负责网络/内置资源/内联数据三种取字节策略
//! - `pipeline`：负责签名校验、像素限制、按档位降采样
//! - `analyzer`：负责四项取色查询（k-means）
//! - `color/result`：颜色与按平台区分的结果模型
//! - `config/error/source`：配置、错误、中间数据模型
//!
//! ## 实现思路
//!
//! 对外仅暴露稳定类型与能力 trait（`AssetReader` / `PixelDecoder` / `ColorAnalyzer`），
//! 内部加载与解码细节保持 `mod` 私有。每次调用独立创建并丢弃全部中间数据，
//! 唯一跨调用的状态是服务层的可选结果缓存。
//!
//! ## 新同事快速上手
//!
//! 可以按下面顺序理解调用链：
//!
//! ```text
//! CLI / 宿主调用
//!    ↓
//! service.rs（可选结果缓存）
//!    ↓
//! handler.rs（兜底色校验 + 统一编排 + 阶段耗时日志）
//!    ├─ loader.rs（http / asset:// / data:image 取字节）
//!    ├─ pipeline.rs（解码 + 像素限制 + 降采样）
//!    └─ analyzer.rs（取色 + 兜底替换，像素缓冲随即释放）
//!    ↓
//! 返回 ImageColorsResult::Harmony 或 ImageColorsError
//! ```
//!
//! ## 分层职责建议
//!
//! - 新增 URI 形式优先改 `source.rs` 与 `loader.rs`
//! - 配置与策略变更优先改 `config.rs`
//! - 业务流程顺序变更优先改 `handler.rs`
//! - 取色算法调整只改 `analyzer.rs`

mod analyzer;
mod color;
mod config;
mod error;
mod handler;
mod loader;
mod pipeline;
mod result;
mod service;
mod source;

pub use analyzer::{ColorAnalyzer, ColorPicker, KmeansColorAnalyzer, KmeansColorPicker};
pub use color::{RgbaColor, rgba_to_hex};
pub use config::{
    DEFAULT_FALLBACK_COLOR, ExtractorConfig, ImageColorsConfig, InlineDataMode, Quality,
    parse_fallback_color,
};
pub use error::{ImageColorsError, ImageColorsErrorPayload};
pub use handler::ImageColorsHandler;
pub use loader::{AssetReader, BundleAssetReader};
pub use pipeline::{ImageCrateDecoder, PixelDecoder};
pub use result::{
    AndroidImageColors, HarmonyImageColors, ImageColorsResult, IosImageColors, WebImageColors,
};
pub use service::ImageColorsService;
pub use source::{ImageSource, PixelMap};
