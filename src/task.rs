// 该文件是 Plantmate（植物伙伴）项目的一部分。
// src/task.rs - 估计与生长分析任务
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

use std::num::NonZeroUsize;

use chrono::Utc;
use image::RgbImage;
use tracing::{debug, info, warn};

use crate::{
  model::{EstimateError, Measurement, Model, RatioSample, absorb},
  output::Render,
  photo::Photo,
  record::GrowthRecord,
  trend::{MIN_TREND_SAMPLES, TrendError, summarize, summarize_chronological},
};

pub trait Task<I, M, O>: Sized {
  type Output;
  type Error;
  fn run_task(self, input: I, model: M, output: O) -> Result<Self::Output, Self::Error>;
}

fn measure<M>(model: &M, photo: &Photo) -> Result<Measurement, EstimateError>
where
  M: Model<Input = RgbImage, Output = Measurement, Error = EstimateError>,
{
  match &photo.image {
    Ok(image) => model.infer(image),
    Err(e) => Err(e.clone()),
  }
}

/// 把照片均分给不超过可用核数的线程，按输入顺序收回结果
fn measure_parallel<M>(
  model: &M,
  photos: &[Photo],
) -> anyhow::Result<Vec<Result<Measurement, EstimateError>>>
where
  M: Model<Input = RgbImage, Output = Measurement, Error = EstimateError> + Sync,
{
  if photos.is_empty() {
    return Ok(Vec::new());
  }
  let workers = std::thread::available_parallelism()
    .map(NonZeroUsize::get)
    .unwrap_or(1);
  let batch_size = photos.len().div_ceil(workers);
  debug!("{} 张照片分给 {} 个线程", photos.len(), photos.len().div_ceil(batch_size));

  let batches = std::thread::scope(|scope| {
    let handles: Vec<_> = photos
      .chunks(batch_size)
      .map(|batch| {
        scope.spawn(move || {
          batch
            .iter()
            .map(|photo| measure(model, photo))
            .collect::<Vec<_>>()
        })
      })
      .collect();
    handles
      .into_iter()
      .map(|handle| {
        handle
          .join()
          .map_err(|_| anyhow::anyhow!("估计线程异常退出"))
      })
      .collect::<Result<Vec<_>, _>>()
  })?;

  Ok(batches.into_iter().flatten().collect())
}

fn render_outcome<O, RE>(output: &O, photo: &Photo, outcome: &Result<Measurement, EstimateError>)
where
  O: Render<Photo, Measurement, Error = RE>,
  RE: std::error::Error,
{
  if let Ok(measurement) = outcome
    && let Err(e) = output.render_result(photo, measurement)
  {
    warn!("照片 {} 的叠加图像输出失败: {}", photo.name, e);
  }
}

/// 逐张估计，返回每张照片的样本
pub struct EstimateTask;

impl<I, M, O, RE> Task<I, M, O> for EstimateTask
where
  I: Iterator<Item = Photo>,
  M: Model<Input = RgbImage, Output = Measurement, Error = EstimateError>,
  O: Render<Photo, Measurement, Error = RE>,
  RE: std::error::Error,
{
  type Output = Vec<(String, RatioSample)>;
  type Error = anyhow::Error;

  fn run_task(self, input: I, model: M, output: O) -> Result<Self::Output, Self::Error> {
    info!("开始估计任务...");
    let mut samples = Vec::new();
    for photo in input {
      let now = std::time::Instant::now();
      let outcome = measure(&model, &photo);
      let sample = absorb(&outcome);
      info!(
        "{}: 比例 {:.2} (检测: {}), 耗时: {:.2?}",
        photo.name,
        sample.ratio,
        sample.detected,
        now.elapsed()
      );
      render_outcome(&output, &photo, &outcome);
      samples.push((photo.name, sample));
    }

    if samples.is_empty() {
      return Err(anyhow::anyhow!("没有输入照片"));
    }
    Ok(samples)
  }
}

/// 一株植物的照片序列：并行估计，再汇总生长趋势
pub struct GrowthAnalysisTask {
  plant_id: String,
}

impl GrowthAnalysisTask {
  pub fn new(plant_id: impl Into<String>) -> Self {
    Self {
      plant_id: plant_id.into(),
    }
  }
}

impl<I, M, O, RE> Task<I, M, O> for GrowthAnalysisTask
where
  I: Iterator<Item = Photo>,
  M: Model<Input = RgbImage, Output = Measurement, Error = EstimateError> + Sync,
  O: Render<Photo, Measurement, Error = RE>,
  RE: std::error::Error,
{
  type Output = GrowthRecord;
  type Error = anyhow::Error;

  fn run_task(self, input: I, model: M, output: O) -> Result<Self::Output, Self::Error> {
    let photos: Vec<Photo> = input.collect();
    info!("开始分析植物 {}，共 {} 张照片", self.plant_id, photos.len());
    if photos.len() < MIN_TREND_SAMPLES {
      return Err(TrendError::InsufficientSamples(photos.len()).into());
    }

    let now = std::time::Instant::now();
    let outcomes = measure_parallel(&model, &photos)?;
    info!("估计完成，耗时: {:.2?}", now.elapsed());

    for (photo, outcome) in photos.iter().zip(outcomes.iter()) {
      render_outcome(&output, photo, outcome);
    }

    let samples: Vec<RatioSample> = outcomes.iter().map(absorb).collect();
    let timestamps: Option<Vec<_>> = photos.iter().map(|p| p.captured_at).collect();
    let (order, trend) = match timestamps {
      Some(timestamps) => {
        let entries = timestamps
          .into_iter()
          .enumerate()
          .map(|(index, at)| (at, index))
          .zip(samples.iter().copied())
          .collect();
        let (keys, trend) = summarize_chronological(entries)?;
        (keys.into_iter().map(|(_, index)| index).collect(), trend)
      }
      None => {
        warn!("部分照片缺少拍摄时间，按输入顺序汇总");
        ((0..photos.len()).collect::<Vec<_>>(), summarize(&samples)?)
      }
    };

    let first = &photos[order[0]].name;
    let last = &photos[order[order.len() - 1]].name;
    let record = GrowthRecord::new(&self.plant_id, &trend, first, last, Utc::now());
    info!("{}: {}", self.plant_id, record.summary);

    Ok(record)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::GrowthRatioEstimator;
  use chrono::NaiveDate;
  use image::Rgb;
  use std::{cell::RefCell, convert::Infallible, path::PathBuf};

  struct Collect(RefCell<Vec<String>>);

  impl Render<Photo, Measurement> for Collect {
    type Error = Infallible;

    fn render_result(&self, frame: &Photo, _: &Measurement) -> Result<(), Self::Error> {
      self.0.borrow_mut().push(frame.name.clone());
      Ok(())
    }
  }

  fn photo(name: &str, day: Option<u32>, plant_rows: Option<(u32, u32)>) -> Photo {
    let image = RgbImage::from_fn(100, 200, |_, y| match plant_rows {
      Some((top, bottom)) if (top..bottom).contains(&y) => Rgb([30, 170, 40]),
      _ => Rgb([250, 250, 250]),
    });
    Photo {
      name: name.to_string(),
      path: PathBuf::from(name),
      captured_at: day.map(|d| {
        NaiveDate::from_ymd_opt(2025, 6, d)
          .unwrap()
          .and_hms_opt(9, 0, 0)
          .unwrap()
      }),
      image: Ok(image),
    }
  }

  #[test]
  fn test_growth_analysis_orders_by_capture_time() {
    // 花盆高 50：100 行 => 2.0，50 行 => 1.0
    let photos = vec![
      photo("b.png", Some(3), Some((40, 140))),
      photo("a.png", Some(1), Some((80, 130))),
    ];
    let collect = Collect(RefCell::new(Vec::new()));
    let record = GrowthAnalysisTask::new("fern")
      .run_task(photos.into_iter(), GrowthRatioEstimator::default(), &collect)
      .unwrap();

    assert_eq!(record.ratios, vec![1.0, 2.0]);
    assert_eq!(record.growth_rate_percent, 100.0);
    assert_eq!(record.first_image, "a.png");
    assert_eq!(record.last_image, "b.png");
    assert_eq!(collect.0.borrow().len(), 2);
  }

  #[test]
  fn test_growth_analysis_keeps_input_order_without_timestamps() {
    let photos = vec![
      photo("x.png", None, Some((40, 140))),
      photo("y.png", Some(1), Some((80, 130))),
    ];
    let record = GrowthAnalysisTask::new("fern")
      .run_task(photos.into_iter(), GrowthRatioEstimator::default(), None::<Collect>)
      .unwrap();
    assert_eq!(record.ratios, vec![2.0, 1.0]);
    assert_eq!(record.first_image, "x.png");
  }

  #[test]
  fn test_growth_analysis_absorbs_bad_photo() {
    let mut broken = photo("a.png", Some(1), None);
    broken.image = Err(EstimateError::DecodeFailure("truncated".to_string()));
    let photos = vec![broken, photo("b.png", Some(2), Some((40, 140)))];

    let collect = Collect(RefCell::new(Vec::new()));
    let record = GrowthAnalysisTask::new("fern")
      .run_task(photos.into_iter(), GrowthRatioEstimator::default(), &collect)
      .unwrap();
    assert_eq!(record.ratios, vec![0.0, 2.0]);
    assert!(record.undetected_baseline);
    assert_eq!(record.growth_rates_percent, vec![0.0]);
    assert_eq!(*collect.0.borrow(), vec!["b.png".to_string()]);
  }

  #[test]
  fn test_growth_analysis_requires_two_photos() {
    let photos = vec![photo("a.png", Some(1), Some((40, 140)))];
    let err = GrowthAnalysisTask::new("fern")
      .run_task(photos.into_iter(), GrowthRatioEstimator::default(), None::<Collect>)
      .unwrap_err();
    assert_eq!(
      err.downcast_ref::<TrendError>(),
      Some(&TrendError::InsufficientSamples(1))
    );
  }

  #[test]
  fn test_parallel_measure_keeps_input_order() {
    let workers = std::thread::available_parallelism()
      .map(NonZeroUsize::get)
      .unwrap_or(1);
    // 照片数多于线程数，偶数张有植物
    let photos: Vec<Photo> = (0..workers * 3 + 1)
      .map(|i| {
        let rows = (i % 2 == 0).then_some((40, 140));
        photo(&format!("{:03}.png", i), None, rows)
      })
      .collect();

    let outcomes = measure_parallel(&GrowthRatioEstimator::default(), &photos).unwrap();
    assert_eq!(outcomes.len(), photos.len());
    for (i, outcome) in outcomes.iter().enumerate() {
      if i % 2 == 0 {
        assert_eq!(outcome.as_ref().unwrap().sample, RatioSample::detected(2.0));
      } else {
        assert_eq!(outcome, &Err(EstimateError::NoFoliage));
      }
    }
  }

  #[test]
  fn test_estimate_task() {
    let photos = vec![
      photo("a.png", None, Some((40, 140))),
      photo("b.png", None, None),
    ];
    let samples = EstimateTask
      .run_task(photos.into_iter(), GrowthRatioEstimator::default(), None::<Collect>)
      .unwrap();
    assert_eq!(
      samples,
      vec![
        ("a.png".to_string(), RatioSample::detected(2.0)),
        ("b.png".to_string(), RatioSample::UNDETECTED),
      ]
    );
  }
}
