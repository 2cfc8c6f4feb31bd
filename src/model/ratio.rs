// 该文件是 Plantmate（植物伙伴）项目的一部分。
// src/model/ratio.rs - 植物/花盆生长比例估计
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

//! # 生长比例估计
//!
//! 把一张植物照片折算成“叶片纵向跨度 / 花盆参考高度”的比例：
//!
//! 1. HSV 固定色带分割出叶片掩码；
//! 2. 5x5 开运算去噪；
//! 3. 取最外层轮廓，丢弃面积小于 300 的区域；
//! 4. 叶片跨度 = 所有区域外接矩形的最高点到最低点；
//! 5. 花盆参考区域固定为图像底部 25%，并不真正检测花盆；
//! 6. 比例保留两位小数，并截断到 `[1.0, 300.0]`。
//!
//! 注意下限是 1.0：任何被检测到的植物都不会低于 1.0，
//! 很小的植物与刚冒头的植物会得到相同的结果。

use image::RgbImage;
use tracing::debug;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  model::{
    ConfigError, EstimateError, EstimatorConfig, Measurement, Model, RatioSample, absorb,
    foliage::{foliage_mask, foliage_regions, open_mask},
  },
};

pub struct GrowthRatioEstimatorBuilder {
  config: EstimatorConfig,
}

impl FromUrlWithScheme for GrowthRatioEstimatorBuilder {
  const SCHEME: &'static str = "ratio";
}

impl FromUrl for GrowthRatioEstimatorBuilder {
  type Error = ConfigError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(ConfigError::InvalidValue {
        key: "scheme".to_string(),
        value: url.scheme().to_string(),
      });
    }

    let config = EstimatorConfig::default().apply_query(url.query_pairs())?;
    Ok(GrowthRatioEstimatorBuilder { config })
  }
}

impl Default for GrowthRatioEstimatorBuilder {
  fn default() -> Self {
    Self {
      config: EstimatorConfig::default(),
    }
  }
}

impl GrowthRatioEstimatorBuilder {
  pub fn config(mut self, config: EstimatorConfig) -> Self {
    self.config = config;
    self
  }

  pub fn build(self) -> Result<GrowthRatioEstimator, ConfigError> {
    self.config.validate()?;
    debug!("估计器配置: {:?}", self.config);
    Ok(GrowthRatioEstimator {
      config: self.config,
    })
  }
}

/// 无状态的生长比例估计器，可在多个线程间共享
#[derive(Debug, Clone, Default)]
pub struct GrowthRatioEstimator {
  config: EstimatorConfig,
}

// 两位小数，恰为 .5 时取偶
fn round2(value: f64) -> f64 {
  (value * 100.0).round_ties_even() / 100.0
}

impl GrowthRatioEstimator {
  pub fn config(&self) -> &EstimatorConfig {
    &self.config
  }

  /// 估计单张图片，任何失败都记为未检测
  pub fn estimate(&self, image: &RgbImage) -> RatioSample {
    absorb(&self.infer(image))
  }

  /// 从编码后的图片字节估计，解码失败记为未检测
  pub fn estimate_bytes(&self, bytes: &[u8]) -> RatioSample {
    absorb(&crate::photo::decode_rgb(bytes).and_then(|image| self.infer(&image)))
  }
}

impl Model for GrowthRatioEstimator {
  type Input = RgbImage;
  type Output = Measurement;
  type Error = EstimateError;

  fn infer(&self, image: &RgbImage) -> Result<Measurement, EstimateError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
      return Err(EstimateError::DegenerateGeometry { width, height });
    }

    let mask = open_mask(&foliage_mask(image, &self.config), &self.config);
    let regions = foliage_regions(&mask, self.config.min_area);
    if regions.is_empty() {
      return Err(EstimateError::NoFoliage);
    }

    let plant_top = regions.iter().map(|r| r.top).min().unwrap_or(0);
    let plant_bottom = regions.iter().map(|r| r.bottom).max().unwrap_or(0);
    let plant_height = plant_bottom.saturating_sub(plant_top);

    let pot_top = (height as f64 * (1.0 - self.config.pot_fraction)).floor() as u32;
    let pot_height = height.saturating_sub(pot_top);
    if pot_height == 0 {
      return Err(EstimateError::DegenerateGeometry { width, height });
    }

    let raw = plant_height as f64 / pot_height as f64;
    let ratio = round2(raw).clamp(self.config.ratio_min, self.config.ratio_max);
    debug!(
      "区域数 {}, 叶片 [{}, {}), 花盆 [{}, {}), 未取整比例 {:.4}, 结果 {:.2}",
      regions.len(),
      plant_top,
      plant_bottom,
      pot_top,
      height,
      raw,
      ratio
    );

    Ok(Measurement {
      sample: RatioSample::detected(ratio),
      plant_span: (plant_top, plant_bottom),
      pot_span: (pot_top, height),
      regions: regions.len(),
    })
  }
}
