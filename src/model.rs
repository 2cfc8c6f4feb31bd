// 该文件是 Plantmate（植物伙伴）项目的一部分。
// src/model.rs - 模型
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

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

pub trait Model {
  type Input;
  type Output;
  type Error;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error>;
}

/// 单张图片的生长比例样本
///
/// 检测到植物时 `ratio` 位于 `[1.0, 300.0]`，否则为 `0.0`。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatioSample {
  pub ratio: f64,
  pub detected: bool,
}

impl RatioSample {
  pub const UNDETECTED: RatioSample = RatioSample {
    ratio: 0.0,
    detected: false,
  };

  pub fn detected(ratio: f64) -> Self {
    Self {
      ratio,
      detected: true,
    }
  }
}

/// 一次成功测量的完整结果，供叠加绘制使用
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
  pub sample: RatioSample,
  /// 植物区域 [top, bottom)
  pub plant_span: (u32, u32),
  /// 花盆参考区域 [top, bottom)
  pub pot_span: (u32, u32),
  /// 通过面积过滤的区域数量
  pub regions: usize,
}

/// 单张图片估计失败的原因
///
/// 这些错误不会中断批处理，只会让样本记为未检测。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EstimateError {
  #[error("图像解码失败: {0}")]
  DecodeFailure(String),
  #[error("图像缺少颜色通道")]
  MissingChannels,
  #[error("花盆参考区域高度无效 ({width}x{height})")]
  DegenerateGeometry { width: u32, height: u32 },
  #[error("未找到足够大的植物区域")]
  NoFoliage,
}

impl From<image::ImageError> for EstimateError {
  fn from(err: image::ImageError) -> Self {
    EstimateError::DecodeFailure(err.to_string())
  }
}

impl From<std::io::Error> for EstimateError {
  fn from(err: std::io::Error) -> Self {
    EstimateError::DecodeFailure(err.to_string())
  }
}

/// 把单张图片的估计结果折叠为样本，失败记为未检测
pub fn absorb(outcome: &Result<Measurement, EstimateError>) -> RatioSample {
  match outcome {
    Ok(measurement) => measurement.sample,
    Err(e) => {
      warn!("样本记为未检测: {}", e);
      RatioSample::UNDETECTED
    }
  }
}

mod config;
mod foliage;
mod ratio;

pub use self::config::{ConfigError, EstimatorConfig};
pub use self::foliage::{FoliageRegion, Hsv, foliage_mask, foliage_regions, open_mask};
pub use self::ratio::{GrowthRatioEstimator, GrowthRatioEstimatorBuilder};
