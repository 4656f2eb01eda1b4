//! # 解码与降采样模块
//!
//! ## 设计思路
//!
//! 将“字节 → 图像 → RGBA”的过程集中在 `PixelDecoder` 能力之后，编排层只依赖该 trait，
//! 测试与其它平台可替换实现。
//!
//! ## 实现思路
//!
//! 1. 通过文件签名识别是否为图片
//! 2. 读取 header 尺寸并按像素上限快速拒绝
//! 3. 完整解码
//! 4. 按质量档位除数计算目标尺寸并降采样（`fast_image_resize`，失败回退 `image`）
//! 5. 输出固定像素格式 RGBA8

use std::io::Cursor;

use fast_image_resize as fr;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageBuffer, ImageReader, Rgba};

use super::source::{PixelMap, RawImageData};
use super::{ExtractorConfig, ImageColorsError, ImageColorsHandler, Quality};

/// 像素解码能力：原始字节 + 质量档位 → 按目标尺寸解码的像素缓冲。
pub trait PixelDecoder: Send + Sync {
    fn decode(&self, bytes: &[u8], quality: Quality) -> Result<PixelMap, ImageColorsError>;
}

/// 基于 `image` + `fast_image_resize` 的默认解码实现。
#[derive(Debug, Clone)]
pub struct ImageCrateDecoder {
    max_decoded_pixels: u64,
    resize_filter: FilterType,
}

impl ImageCrateDecoder {
    pub fn new(max_decoded_pixels: u64, resize_filter: FilterType) -> Self {
        Self {
            max_decoded_pixels,
            resize_filter,
        }
    }

    pub fn from_config(config: &ExtractorConfig) -> Self {
        Self::new(config.max_decoded_pixels, config.resize_filter)
    }

    /// 通过文件签名（magic bytes）校验输入是否为图片。
    fn validate_image_signature(bytes: &[u8]) -> Result<(), ImageColorsError> {
        if bytes.is_empty() {
            return Err(ImageColorsError::Decode("图片内容为空".to_string()));
        }

        let kind = infer::get(bytes)
            .ok_or_else(|| ImageColorsError::Decode("无法识别图片类型".to_string()))?;

        if kind.matcher_type() != infer::MatcherType::Image {
            return Err(ImageColorsError::Decode(format!(
                "文件签名不是图片类型：{}",
                kind.mime_type()
            )));
        }

        Ok(())
    }

    /// 仅通过内存中的图片头信息读取宽高。
    fn inspect_dimensions_from_memory(bytes: &[u8]) -> Result<(u32, u32), ImageColorsError> {
        let reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| ImageColorsError::Decode(format!("无法识别图片格式：{}", e)))?;

        reader
            .into_dimensions()
            .map_err(|e| ImageColorsError::Decode(format!("无法读取图片尺寸：{}", e)))
    }

    fn validate_pixel_limits(&self, width: u32, height: u32) -> Result<(), ImageColorsError> {
        let pixels = (width as u64)
            .checked_mul(height as u64)
            .ok_or_else(|| ImageColorsError::ResourceLimit("图片像素数溢出".to_string()))?;

        if pixels > self.max_decoded_pixels {
            return Err(ImageColorsError::ResourceLimit(format!(
                "图片像素过大：{} 像素（限制：{} 像素）",
                pixels, self.max_decoded_pixels
            )));
        }

        Ok(())
    }

    fn resize_to(
        &self,
        image: DynamicImage,
        target_width: u32,
        target_height: u32,
    ) -> DynamicImage {
        match Self::resize_with_fast_image_resize(
            &image,
            target_width,
            target_height,
            self.resize_filter,
        ) {
            Ok(resized) => resized,
            Err(err) => {
                log::warn!("⚠️ fast_image_resize 降采样失败，回退 image::resize_exact：{}", err);
                image.resize_exact(target_width, target_height, self.resize_filter)
            }
        }
    }

    fn resize_with_fast_image_resize(
        image: &DynamicImage,
        target_width: u32,
        target_height: u32,
        filter: FilterType,
    ) -> Result<DynamicImage, ImageColorsError> {
        let src = image.to_rgba8();
        let (src_width, src_height) = src.dimensions();

        let src_image = fr::images::Image::from_vec_u8(
            src_width,
            src_height,
            src.into_raw(),
            fr::PixelType::U8x4,
        )
        .map_err(|e| ImageColorsError::Decode(format!("构建源图像缓冲失败：{}", e)))?;

        let mut dst_image =
            fr::images::Image::new(target_width, target_height, fr::PixelType::U8x4);

        let mut resizer = fr::Resizer::new();
        let options = fr::ResizeOptions::new()
            .resize_alg(fr::ResizeAlg::Convolution(Self::to_fast_filter(filter)));

        resizer
            .resize(&src_image, &mut dst_image, Some(&options))
            .map_err(|e| ImageColorsError::Decode(format!("fast_image_resize 执行失败：{}", e)))?;

        let rgba = ImageBuffer::<Rgba<u8>, Vec<u8>>::from_raw(
            target_width,
            target_height,
            dst_image.into_vec(),
        )
        .ok_or_else(|| ImageColorsError::Decode("fast_image_resize 输出缓冲长度异常".to_string()))?;

        Ok(DynamicImage::ImageRgba8(rgba))
    }

    fn to_fast_filter(filter: FilterType) -> fr::FilterType {
        match filter {
            FilterType::Nearest => fr::FilterType::Box,
            FilterType::Triangle => fr::FilterType::Bilinear,
            FilterType::CatmullRom => fr::FilterType::CatmullRom,
            FilterType::Gaussian => fr::FilterType::Mitchell,
            FilterType::Lanczos3 => fr::FilterType::Lanczos3,
        }
    }
}

impl Default for ImageCrateDecoder {
    fn default() -> Self {
        Self::from_config(&ExtractorConfig::default())
    }
}

impl PixelDecoder for ImageCrateDecoder {
    fn decode(&self, bytes: &[u8], quality: Quality) -> Result<PixelMap, ImageColorsError> {
        Self::validate_image_signature(bytes)?;

        let (header_width, header_height) = Self::inspect_dimensions_from_memory(bytes)?;
        self.validate_pixel_limits(header_width, header_height)?;

        let decoded = image::load_from_memory(bytes)
            .map_err(|e| ImageColorsError::Decode(format!("图片解码失败：{}", e)))?;

        let (raw_width, raw_height) = decoded.dimensions();
        let (target_width, target_height) = quality.target_size(raw_width, raw_height);

        let sized = if (target_width, target_height) == (raw_width, raw_height) {
            decoded
        } else {
            self.resize_to(decoded, target_width, target_height)
        };

        let (width, height) = sized.dimensions();
        let pixels = PixelMap::from_rgba(width, height, sized.to_rgba8().into_raw())
            .ok_or_else(|| ImageColorsError::Decode("解码后像素数据长度异常".to_string()))?;

        log::info!(
            "✅ 图片解码成功 - 档位: {} 原始尺寸: {}x{} 输出尺寸: {}x{}",
            quality.as_str(),
            raw_width,
            raw_height,
            width,
            height
        );

        Ok(pixels)
    }
}

impl ImageColorsHandler {
    /// 使用注入的解码器（缺省按配置快照构建 `ImageCrateDecoder`）解码原始字节。
    pub(super) fn decode_pixels(
        &self,
        raw: &RawImageData,
        quality: Quality,
        config: &ExtractorConfig,
    ) -> Result<PixelMap, ImageColorsError> {
        log::debug!("🧩 开始解码 - 来源: {} 字节: {}", raw.source_hint, raw.bytes.len());

        match &self.decoder {
            Some(decoder) => decoder.decode(&raw.bytes, quality),
            None => ImageCrateDecoder::from_config(config).decode(&raw.bytes, quality),
        }
    }
}
