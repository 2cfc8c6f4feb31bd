// 该文件是 Plantmate（植物伙伴）项目的一部分。
// src/model/config.rs - 估计器阈值配置
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

use std::str::FromStr;

use thiserror::Error;
use tracing::warn;

// HSV 范围沿用 OpenCV 8 位约定：H 为 0..180，S/V 为 0..255
const FOLIAGE_HUE_MIN: u8 = 35;
const FOLIAGE_HUE_MAX: u8 = 85;
const FOLIAGE_SAT_MIN: u8 = 50;
const FOLIAGE_VAL_MIN: u8 = 50;
const OPENING_KERNEL_SIZE: u8 = 5;
const MIN_REGION_AREA: f64 = 300.0;
const POT_FRACTION: f64 = 0.25;
// 下限为 1.0 而不是 0.0：检测到的极小植物一律报告为 1.0，
// 与刚冒头的植物无法区分。
const RATIO_MIN: f64 = 1.0;
const RATIO_MAX: f64 = 300.0;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
  #[error("参数 {key} 的取值无效: {value}")]
  InvalidValue { key: String, value: String },
  #[error("配置不一致: {0}")]
  Inconsistent(String),
}

/// 生长比例估计器的阈值
#[derive(Debug, Clone, PartialEq)]
pub struct EstimatorConfig {
  pub hue_min: u8,
  pub hue_max: u8,
  pub sat_min: u8,
  pub val_min: u8,
  /// 开运算的方形结构元素边长（奇数）
  pub kernel_size: u8,
  /// 区域最小面积（像素²）
  pub min_area: f64,
  /// 图像底部作为花盆参考区域的比例
  pub pot_fraction: f64,
  pub ratio_min: f64,
  pub ratio_max: f64,
}

impl Default for EstimatorConfig {
  fn default() -> Self {
    Self {
      hue_min: FOLIAGE_HUE_MIN,
      hue_max: FOLIAGE_HUE_MAX,
      sat_min: FOLIAGE_SAT_MIN,
      val_min: FOLIAGE_VAL_MIN,
      kernel_size: OPENING_KERNEL_SIZE,
      min_area: MIN_REGION_AREA,
      pot_fraction: POT_FRACTION,
      ratio_min: RATIO_MIN,
      ratio_max: RATIO_MAX,
    }
  }
}

fn parse<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
  value.parse().map_err(|_| ConfigError::InvalidValue {
    key: key.to_string(),
    value: value.to_string(),
  })
}

impl EstimatorConfig {
  /// 用 URL 查询参数覆盖默认阈值，未知参数仅给出警告
  pub fn apply_query<'a, I>(mut self, pairs: I) -> Result<Self, ConfigError>
  where
    I: IntoIterator<Item = (std::borrow::Cow<'a, str>, std::borrow::Cow<'a, str>)>,
  {
    for (key, value) in pairs {
      let value = value.as_ref();
      match key.as_ref() {
        "hue_min" => self.hue_min = parse(&key, value)?,
        "hue_max" => self.hue_max = parse(&key, value)?,
        "sat_min" => self.sat_min = parse(&key, value)?,
        "val_min" => self.val_min = parse(&key, value)?,
        "kernel" => self.kernel_size = parse(&key, value)?,
        "min_area" => self.min_area = parse(&key, value)?,
        "pot_fraction" => self.pot_fraction = parse(&key, value)?,
        "ratio_min" => self.ratio_min = parse(&key, value)?,
        "ratio_max" => self.ratio_max = parse(&key, value)?,
        other => warn!("忽略未知的估计器参数: {}", other),
      }
    }
    Ok(self)
  }

  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.hue_min > self.hue_max {
      return Err(ConfigError::Inconsistent(format!(
        "hue_min ({}) 大于 hue_max ({})",
        self.hue_min, self.hue_max
      )));
    }
    if self.kernel_size == 0 || self.kernel_size % 2 == 0 {
      return Err(ConfigError::Inconsistent(format!(
        "结构元素边长必须为正奇数，实际为 {}",
        self.kernel_size
      )));
    }
    if !(self.pot_fraction > 0.0 && self.pot_fraction <= 1.0) {
      return Err(ConfigError::Inconsistent(format!(
        "pot_fraction 必须位于 (0, 1]，实际为 {}",
        self.pot_fraction
      )));
    }
    if !(self.ratio_min <= self.ratio_max) {
      return Err(ConfigError::Inconsistent(format!(
        "ratio_min ({}) 大于 ratio_max ({})",
        self.ratio_min, self.ratio_max
      )));
    }
    if self.min_area < 0.0 {
      return Err(ConfigError::Inconsistent(format!(
        "min_area 不能为负数: {}",
        self.min_area
      )));
    }
    Ok(())
  }

  /// 结构元素半径，对应 L∞ 范数下的开运算
  pub(crate) fn kernel_radius(&self) -> u8 {
    self.kernel_size / 2
  }
}
