//! # 图片取色工具 — 库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │   调用方（CLI `image-colors` / 宿主应用）                 │
//! │        │  uri + ImageColorsConfig (camelCase JSON)        │
//! └────────┼─────────────────────────────────────────────────┘
//!          ↓
//! ┌────────┼─────────────────────────────────────────────────┐
//! │        ↓            extractor                             │
//! │                                                          │
//! │  ImageColorsService ── LRU 结果缓存 (cache / key)         │
//! │        │                                                 │
//! │  ImageColorsHandler                                      │
//! │   ├─ loader     http(s) / asset:// / data:image          │
//! │   ├─ pipeline   infer 签名 + image 解码 + 降采样          │
//! │   └─ analyzer   kmeans_colors 聚类取色                    │
//! │        │                                                 │
//! │  ImageColorsResult { platform: "harmony", ... }          │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`extractor`] | 从 URI 加载图片并提取主色、占比最大色、饱和度最高色、平均色 |

pub mod extractor;
