// 该文件是 Plantmate（植物伙伴）项目的一部分。
// src/record.rs - 生长分析记录
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

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::trend::GrowthTrend;

fn round_to(value: f64, places: i32) -> f64 {
  let factor = 10f64.powi(places);
  (value * factor).round_ties_even() / factor
}

/// 一次生长分析的可持久化记录
///
/// 趋势本身不做取整；记录中的差值保留两位、百分比保留一位小数。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthRecord {
  pub plant_id: String,
  pub ratios: Vec<f64>,
  pub growth_diffs: Vec<f64>,
  pub growth_rates_percent: Vec<f64>,
  pub growth_rate_percent: f64,
  pub undetected_baseline: bool,
  pub summary: String,
  pub first_image: String,
  pub last_image: String,
  pub analyzed_at: DateTime<Utc>,
}

impl GrowthRecord {
  pub fn new(
    plant_id: &str,
    trend: &GrowthTrend,
    first_image: &str,
    last_image: &str,
    analyzed_at: DateTime<Utc>,
  ) -> Self {
    let growth_rate_percent = round_to(trend.overall_percent, 1);
    let summary = match trend.summary {
      crate::trend::GrowthSummary::Percent(_) => {
        crate::trend::GrowthSummary::Percent(growth_rate_percent).to_string()
      }
      baseline => baseline.to_string(),
    };

    GrowthRecord {
      plant_id: plant_id.to_string(),
      ratios: trend.ratios.clone(),
      growth_diffs: trend.diffs.iter().map(|d| round_to(*d, 2)).collect(),
      growth_rates_percent: trend
        .rates_percent
        .iter()
        .map(|r| round_to(*r, 1))
        .collect(),
      growth_rate_percent,
      undetected_baseline: trend.undetected_baseline(),
      summary,
      first_image: first_image.to_string(),
      last_image: last_image.to_string(),
      analyzed_at,
    }
  }
}

/// 交给报告生成方的数值输入，本项目不生成任何报告文本
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRequest {
  pub plant_id: String,
  pub ratios: Vec<f64>,
  pub growth_diffs: Vec<f64>,
  pub growth_rates_percent: Vec<f64>,
  pub summary: String,
}

impl From<&GrowthRecord> for ReportRequest {
  fn from(record: &GrowthRecord) -> Self {
    ReportRequest {
      plant_id: record.plant_id.clone(),
      ratios: record.ratios.clone(),
      growth_diffs: record.growth_diffs.clone(),
      growth_rates_percent: record.growth_rates_percent.clone(),
      summary: record.summary.clone(),
    }
  }
}
