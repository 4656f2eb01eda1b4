//! # 图片取色工具 — 命令行入口
//!
//! 本文件仅负责参数解析、日志初始化与结果输出。
//! 取色逻辑位于 `extractor` 模块，详见 `lib.rs` 架构文档。

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use image_colors::extractor::{
    ExtractorConfig, ImageColorsConfig, ImageColorsError, ImageColorsErrorPayload,
    ImageColorsService, InlineDataMode, Quality,
};

#[derive(Parser)]
#[command(name = "image-colors")]
#[command(about = "Extract main, dominant, most saturated and average colors from an image URI")]
struct Cli {
    /// Image URI: http(s)://..., asset://<path> or data:image/...;base64,...
    uri: String,

    /// Fallback color (#rgb or #rrggbb) used when a color cannot be determined
    #[arg(long)]
    fallback: Option<String>,

    /// Decode quality: lowest, low, high or highest (unknown values fall back to low)
    #[arg(long)]
    quality: Option<String>,

    /// Request header for remote URIs, as NAME:VALUE (repeatable)
    #[arg(long = "header", value_name = "NAME:VALUE")]
    headers: Vec<String>,

    /// Directory containing the bundled `assets/` tree
    #[arg(long)]
    asset_root: Option<PathBuf>,

    /// Full options object as camelCase JSON; explicit flags override its fields
    #[arg(long, value_name = "JSON")]
    config: Option<String>,

    /// Route the call through the result cache
    #[arg(long)]
    cache: bool,

    /// Treat data:image URIs as literal bytes instead of base64-decoding them
    #[arg(long)]
    literal_data: bool,
}

impl Cli {
    /// 合并 `--config` 与显式参数，得到单次调用配置。
    fn options(&self) -> Result<ImageColorsConfig, ImageColorsError> {
        let mut options = match &self.config {
            Some(json) => serde_json::from_str::<ImageColorsConfig>(json).map_err(|e| {
                ImageColorsError::InvalidConfig(format!("--config 不是合法的配置 JSON：{}", e))
            })?,
            None => ImageColorsConfig::default(),
        };

        if let Some(fallback) = &self.fallback {
            options.fallback = Some(fallback.clone());
        }
        if let Some(quality) = &self.quality {
            options.quality = Quality::from_name(quality);
        }
        if !self.headers.is_empty() {
            options.headers = Some(parse_headers(&self.headers)?);
        }
        if self.cache {
            options.cache = true;
        }
        if self.literal_data {
            options.inline_data = InlineDataMode::Literal;
        }

        Ok(options)
    }

    fn extractor_config(&self) -> ExtractorConfig {
        let mut config = ExtractorConfig::default();
        if let Some(root) = &self.asset_root {
            config.asset_root = root.clone();
        }
        config
    }
}

fn parse_headers(raw: &[String]) -> Result<HashMap<String, String>, ImageColorsError> {
    raw.iter()
        .map(|entry| {
            let (name, value) = entry.split_once(':').ok_or_else(|| {
                ImageColorsError::InvalidConfig(format!("请求头须为 NAME:VALUE 形式：{}", entry))
            })?;
            Ok((name.trim().to_string(), value.trim().to_string()))
        })
        .collect()
}

async fn run(cli: &Cli) -> Result<String, ImageColorsError> {
    let options = cli.options()?;
    let service = ImageColorsService::with_config(cli.extractor_config())?;
    let result = service.get_colors(&cli.uri, Some(&options)).await?;

    serde_json::to_string_pretty(&result)
        .map_err(|e| ImageColorsError::Analysis(format!("结果序列化失败：{}", e)))
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match run(&cli).await {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("❌ 取色失败 [{}]: {}", err.stage(), err);
            let payload = ImageColorsErrorPayload::from(&err);
            match serde_json::to_string(&payload) {
                Ok(json) => eprintln!("{}", json),
                Err(_) => eprintln!("{}", err),
            }
            ExitCode::FAILURE
        }
    }
}
