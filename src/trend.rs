// 该文件是 Plantmate（植物伙伴）项目的一部分。
// src/trend.rs - 生长趋势汇总
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

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::RatioSample;

/// 趋势计算所需的最少样本数
pub const MIN_TREND_SAMPLES: usize = 2;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TrendError {
  #[error("生长分析至少需要 2 个样本，实际为 {0}")]
  InsufficientSamples(usize),
}

/// 总体变化的汇总状态
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "percent", rename_all = "snake_case")]
pub enum GrowthSummary {
  /// 相对第一个样本的总体百分比变化
  Percent(f64),
  /// 第一个样本未检测到植物，无法给出百分比
  UndetectedBaseline,
}

impl fmt::Display for GrowthSummary {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      GrowthSummary::Percent(p) => write!(f, "total growth ratio: {:.1}%", p),
      GrowthSummary::UndetectedBaseline => write!(
        f,
        "no plant detected in the first photo; growth rate cannot be computed"
      ),
    }
  }
}

/// 按时间顺序排列的样本的生长趋势
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthTrend {
  pub ratios: Vec<f64>,
  pub diffs: Vec<f64>,
  pub rates_percent: Vec<f64>,
  pub overall_percent: f64,
  pub summary: GrowthSummary,
}

impl GrowthTrend {
  pub fn undetected_baseline(&self) -> bool {
    self.summary == GrowthSummary::UndetectedBaseline
  }
}

fn percent_change(from: f64, to: f64) -> f64 {
  if from == 0.0 {
    0.0
  } else {
    (to - from) / from * 100.0
  }
}

/// 汇总按时间先后排列的样本，不会重新排序
pub fn summarize(samples: &[RatioSample]) -> Result<GrowthTrend, TrendError> {
  if samples.len() < MIN_TREND_SAMPLES {
    return Err(TrendError::InsufficientSamples(samples.len()));
  }

  let ratios: Vec<f64> = samples.iter().map(|s| s.ratio).collect();
  let diffs: Vec<f64> = ratios.windows(2).map(|w| w[1] - w[0]).collect();
  let rates_percent = ratios
    .windows(2)
    .map(|w| percent_change(w[0], w[1]))
    .collect();

  let first = ratios[0];
  let last = ratios[ratios.len() - 1];
  let (overall_percent, summary) = if first == 0.0 {
    (0.0, GrowthSummary::UndetectedBaseline)
  } else {
    let overall = percent_change(first, last);
    (overall, GrowthSummary::Percent(overall))
  };

  Ok(GrowthTrend {
    ratios,
    diffs,
    rates_percent,
    overall_percent,
    summary,
  })
}

/// 按时间键稳定排序后再汇总，返回排序后的键
pub fn summarize_chronological<K: Ord>(
  mut entries: Vec<(K, RatioSample)>,
) -> Result<(Vec<K>, GrowthTrend), TrendError> {
  entries.sort_by(|a, b| a.0.cmp(&b.0));
  let samples: Vec<RatioSample> = entries.iter().map(|(_, s)| *s).collect();
  let trend = summarize(&samples)?;
  Ok((entries.into_iter().map(|(k, _)| k).collect(), trend))
}

#[cfg(test)]
mod tests {
  use super::*;
  use approx::assert_relative_eq;

  fn samples(ratios: &[f64]) -> Vec<RatioSample> {
    ratios
      .iter()
      .map(|&r| {
        if r == 0.0 {
          RatioSample::UNDETECTED
        } else {
          RatioSample::detected(r)
        }
      })
      .collect()
  }

  #[test]
  fn test_insufficient_samples() {
    assert_eq!(summarize(&[]), Err(TrendError::InsufficientSamples(0)));
    assert_eq!(
      summarize(&samples(&[3.0])),
      Err(TrendError::InsufficientSamples(1))
    );
    assert!(summarize(&samples(&[3.0, 4.0])).is_ok());
  }

  #[test]
  fn test_three_point_trend() {
    let trend = summarize(&samples(&[10.0, 15.0, 12.0])).unwrap();
    assert_eq!(trend.ratios, vec![10.0, 15.0, 12.0]);
    assert_eq!(trend.diffs, vec![5.0, -3.0]);
    assert_eq!(trend.rates_percent.len(), 2);
    assert_relative_eq!(trend.rates_percent[0], 50.0, epsilon = 1e-9);
    assert_relative_eq!(trend.rates_percent[1], -20.0, epsilon = 1e-9);
    assert_relative_eq!(trend.overall_percent, 20.0, epsilon = 1e-9);
    assert!(!trend.undetected_baseline());
    assert!(matches!(trend.summary, GrowthSummary::Percent(p) if (p - 20.0).abs() < 1e-9));
  }

  #[test]
  fn test_undetected_baseline() {
    let trend = summarize(&samples(&[0.0, 20.0])).unwrap();
    assert_eq!(trend.diffs, vec![20.0]);
    assert_eq!(trend.rates_percent, vec![0.0]);
    assert_eq!(trend.overall_percent, 0.0);
    assert!(trend.undetected_baseline());
    assert!(trend.overall_percent.is_finite());
  }

  #[test]
  fn test_zero_in_middle_guards_rate_only() {
    let trend = summarize(&samples(&[2.0, 0.0, 4.0])).unwrap();
    assert_eq!(trend.diffs, vec![-2.0, 4.0]);
    assert_eq!(trend.rates_percent, vec![-100.0, 0.0]);
    assert_relative_eq!(trend.overall_percent, 100.0, epsilon = 1e-9);
  }

  #[test]
  fn test_lengths_invariant() {
    for n in 2..8 {
      let ratios: Vec<f64> = (0..n).map(|i| 1.0 + i as f64 * 0.5).collect();
      let trend = summarize(&samples(&ratios)).unwrap();
      assert_eq!(trend.ratios.len(), n);
      assert_eq!(trend.diffs.len(), n - 1);
      assert_eq!(trend.rates_percent.len(), n - 1);
    }
  }

  #[test]
  fn test_deterministic() {
    let input = samples(&[1.5, 2.25, 1.0, 4.0]);
    assert_eq!(summarize(&input), summarize(&input));
  }

  #[test]
  fn test_chronological_sorts_by_key() {
    let entries = vec![
      (3, RatioSample::detected(12.0)),
      (1, RatioSample::detected(10.0)),
      (2, RatioSample::detected(15.0)),
    ];
    let (keys, trend) = summarize_chronological(entries).unwrap();
    assert_eq!(keys, vec![1, 2, 3]);
    assert_eq!(trend.ratios, vec![10.0, 15.0, 12.0]);
    assert_relative_eq!(trend.overall_percent, 20.0, epsilon = 1e-9);
  }

  #[test]
  fn test_chronological_is_stable() {
    let entries = vec![
      (1, RatioSample::detected(2.0)),
      (1, RatioSample::detected(3.0)),
    ];
    let (_, trend) = summarize_chronological(entries).unwrap();
    assert_eq!(trend.ratios, vec![2.0, 3.0]);
  }

  #[test]
  fn test_summary_text() {
    assert_eq!(
      GrowthSummary::Percent(20.0).to_string(),
      "total growth ratio: 20.0%"
    );
    assert!(
      GrowthSummary::UndetectedBaseline
        .to_string()
        .starts_with("no plant detected")
    );
  }
}
