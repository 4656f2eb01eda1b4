//! # 取色模块
//!
//! ## 设计思路
//!
//! 编排层只依赖 `ColorAnalyzer` / `ColorPicker` 两个能力：
//! - `ColorAnalyzer::create_picker` 基于已解码像素创建取色器
//! - `ColorPicker` 暴露四项彼此独立、可为空的查询
//!
//! ## 实现思路
//!
//! 默认实现把聚类交给 `kmeans_colors`（Lab 空间），本模块只负责在聚类结果上挑选：
//! - 占比最大色：成员最多的簇
//! - 主色：按 `数量 × (1 + 彩度/24)` 加权，排除过暗/过亮簇，全部被排除时退回占比最大色
//! - 饱和度最高色：HSV 饱和度最大的簇
//! - 平均色：参与统计像素的 sRGB 算术平均
//!
//! 近透明像素（alpha 过低）不参与统计；没有可用像素时四项查询均返回 `None`。

use std::collections::HashSet;

use kmeans_colors::get_kmeans;
use palette::{IntoColor, Lab, LinSrgb, Srgb};

use super::source::PixelMap;
use super::{HarmonyImageColors, ImageColorsError, ImageColorsHandler, RgbaColor, rgba_to_hex};

const MAIN_COLOR_MIN_LIGHTNESS: f32 = 8.0;
const MAIN_COLOR_MAX_LIGHTNESS: f32 = 95.0;
const MAIN_COLOR_CHROMA_WEIGHT: f32 = 24.0;

/// 四项取色查询。
pub trait ColorPicker {
    fn main_color(&self) -> Option<RgbaColor>;
    fn largest_proportion_color(&self) -> Option<RgbaColor>;
    fn highest_saturation_color(&self) -> Option<RgbaColor>;
    fn average_color(&self) -> Option<RgbaColor>;
}

/// 取色能力：基于像素缓冲创建取色器。
pub trait ColorAnalyzer: Send + Sync {
    fn create_picker<'a>(
        &self,
        pixels: &'a PixelMap,
    ) -> Result<Box<dyn ColorPicker + 'a>, ImageColorsError>;
}

/// 基于 k-means 聚类的默认取色实现。
#[derive(Debug, Clone)]
pub struct KmeansColorAnalyzer {
    /// 最大簇数。
    pub clusters: usize,
    pub max_iterations: usize,
    pub converge: f32,
    pub seed: u64,
    /// 低于该 alpha 的像素视为透明，不参与统计。
    pub min_alpha: u8,
}

impl Default for KmeansColorAnalyzer {
    fn default() -> Self {
        Self {
            clusters: 8,
            max_iterations: 20,
            converge: 1e-4,
            seed: 0,
            min_alpha: 16,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Swatch {
    color: RgbaColor,
    lab: Lab,
    population: usize,
}

impl Swatch {
    fn chroma(&self) -> f32 {
        (self.lab.a * self.lab.a + self.lab.b * self.lab.b).sqrt()
    }

    fn saturation(&self) -> f32 {
        let RgbaColor { red, green, blue, .. } = self.color;
        let max = red.max(green).max(blue);
        let min = red.min(green).min(blue);
        if max == 0 {
            return 0.0;
        }
        (max - min) as f32 / max as f32
    }
}

/// k-means 取色结果。
#[derive(Debug, Clone, Default)]
pub struct KmeansColorPicker {
    swatches: Vec<Swatch>,
    average: Option<RgbaColor>,
}

impl KmeansColorPicker {
    pub fn swatch_count(&self) -> usize {
        self.swatches.len()
    }
}

impl ColorPicker for KmeansColorPicker {
    fn main_color(&self) -> Option<RgbaColor> {
        let score =
            |s: &Swatch| s.population as f32 * (1.0 + s.chroma() / MAIN_COLOR_CHROMA_WEIGHT);

        self.swatches
            .iter()
            .filter(|s| (MAIN_COLOR_MIN_LIGHTNESS..=MAIN_COLOR_MAX_LIGHTNESS).contains(&s.lab.l))
            .max_by(|a, b| score(a).total_cmp(&score(b)))
            .map(|s| s.color)
            .or_else(|| self.largest_proportion_color())
    }

    fn largest_proportion_color(&self) -> Option<RgbaColor> {
        self.swatches
            .iter()
            .max_by_key(|s| s.population)
            .map(|s| s.color)
    }

    fn highest_saturation_color(&self) -> Option<RgbaColor> {
        self.swatches
            .iter()
            .max_by(|a, b| a.saturation().total_cmp(&b.saturation()))
            .map(|s| s.color)
    }

    fn average_color(&self) -> Option<RgbaColor> {
        self.average
    }
}

fn lab_from_rgb(rgb: [u8; 3]) -> Lab {
    let linear: LinSrgb = Srgb::new(rgb[0], rgb[1], rgb[2]).into_linear();
    linear.into_color()
}

fn rgba_from_lab(lab: Lab) -> RgbaColor {
    let linear: LinSrgb = lab.into_color();
    let srgb: Srgb<f32> = Srgb::from_linear(linear);
    let to_u8 = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    RgbaColor::new(to_u8(srgb.red), to_u8(srgb.green), to_u8(srgb.blue), 255)
}

impl KmeansColorAnalyzer {
    /// 直接返回具体取色器，便于测试与离线分析。
    pub fn pick(&self, pixels: &PixelMap) -> KmeansColorPicker {
        let opaque: Vec<[u8; 3]> = pixels
            .pixels()
            .filter(|px| px[3] >= self.min_alpha)
            .map(|px| [px[0], px[1], px[2]])
            .collect();

        if opaque.is_empty() {
            log::debug!("🎨 没有可用像素，取色结果全部为空");
            return KmeansColorPicker::default();
        }

        let (sum_r, sum_g, sum_b) = opaque.iter().fold((0u64, 0u64, 0u64), |(r, g, b), px| {
            (r + px[0] as u64, g + px[1] as u64, b + px[2] as u64)
        });
        let count = opaque.len() as u64;
        let mean = |sum: u64| ((sum + count / 2) / count) as u8;
        let average = RgbaColor::new(mean(sum_r), mean(sum_g), mean(sum_b), 255);

        let distinct: HashSet<[u8; 3]> = opaque.iter().copied().collect();
        let swatches = if distinct.len() == 1 {
            vec![Swatch {
                color: RgbaColor::new(opaque[0][0], opaque[0][1], opaque[0][2], 255),
                lab: lab_from_rgb(opaque[0]),
                population: opaque.len(),
            }]
        } else {
            self.cluster(&opaque, distinct.len())
        };

        log::debug!("🎨 聚类完成 - 像素: {} 簇: {}", opaque.len(), swatches.len());

        KmeansColorPicker {
            swatches,
            average: Some(average),
        }
    }

    fn cluster(&self, opaque: &[[u8; 3]], distinct: usize) -> Vec<Swatch> {
        let k = self.clusters.max(1).min(distinct);
        let lab_pixels: Vec<Lab> = opaque.iter().map(|px| lab_from_rgb(*px)).collect();

        let result = get_kmeans(
            k,
            self.max_iterations,
            self.converge,
            false,
            &lab_pixels,
            self.seed,
        );

        let mut populations = vec![0usize; result.centroids.len()];
        for &index in &result.indices {
            if let Some(slot) = populations.get_mut(index as usize) {
                *slot += 1;
            }
        }

        result
            .centroids
            .iter()
            .zip(populations)
            .filter(|(_, population)| *population > 0)
            .map(|(lab, population)| Swatch {
                color: rgba_from_lab(*lab),
                lab: *lab,
                population,
            })
            .collect()
    }
}

impl ColorAnalyzer for KmeansColorAnalyzer {
    fn create_picker<'a>(
        &self,
        pixels: &'a PixelMap,
    ) -> Result<Box<dyn ColorPicker + 'a>, ImageColorsError> {
        Ok(Box::new(self.pick(pixels)))
    }
}

impl ImageColorsHandler {
    /// 取色并规范化为十六进制，缺失项替换为兜底色。
    ///
    /// 按值接收像素缓冲：函数返回（无论成功或失败）即释放。
    pub(super) fn analyze_pixels(
        &self,
        pixels: PixelMap,
        fallback: &str,
    ) -> Result<HarmonyImageColors, ImageColorsError> {
        let picker = self.analyzer.create_picker(&pixels)?;
        let or_fallback = |color: Option<RgbaColor>| {
            rgba_to_hex(color.as_ref()).unwrap_or_else(|| fallback.to_string())
        };

        Ok(HarmonyImageColors {
            main_color: or_fallback(picker.main_color()),
            largest_proportion_color: or_fallback(picker.largest_proportion_color()),
            highest_saturation_color: or_fallback(picker.highest_saturation_color()),
            average_color: or_fallback(picker.average_color()),
        })
    }
}
