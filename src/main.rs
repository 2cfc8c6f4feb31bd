// 该文件是 Plantmate（植物伙伴）项目的一部分。
// src/main.rs - 项目主程序
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

mod args;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::info;
use url::Url;

use plantmate::{
  FromUrl,
  input::InputWrapper,
  model::{GrowthRatioEstimator, GrowthRatioEstimatorBuilder, RatioSample},
  output::{JsonRecordOutput, OutputWrapper, Record},
  record::ReportRequest,
  task::{EstimateTask, GrowthAnalysisTask, Task},
};

use args::{Args, Command};

#[derive(Serialize)]
struct PhotoSample {
  photo: String,
  #[serde(flatten)]
  sample: RatioSample,
}

fn build_model(url: &Url) -> Result<GrowthRatioEstimator> {
  let model = GrowthRatioEstimatorBuilder::from_url(url)
    .and_then(|builder| builder.build())
    .with_context(|| format!("无法创建估计器: {}", url))?;
  Ok(model)
}

fn build_annotate(url: Option<&Url>) -> Result<Option<OutputWrapper>> {
  url
    .map(|url| OutputWrapper::from_url(url).with_context(|| format!("无法创建叠加输出: {}", url)))
    .transpose()
}

fn build_record(url: &Url) -> Result<JsonRecordOutput> {
  JsonRecordOutput::from_url(url).with_context(|| format!("无法创建记录输出: {}", url))
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  match args.command {
    Command::Estimate {
      model,
      input,
      annotate,
      output,
    } => {
      info!("估计器: {}", model);
      info!("输入来源: {}", input);

      let model = build_model(&model)?;
      let input = InputWrapper::from_url(&input).context("无法打开输入")?;
      let annotate = build_annotate(annotate.as_ref())?;
      let record = build_record(&output)?;

      let samples: Vec<PhotoSample> = EstimateTask
        .run_task(input, model, annotate)?
        .into_iter()
        .map(|(photo, sample)| PhotoSample { photo, sample })
        .collect();
      record.record(&samples).context("写入估计结果失败")?;
    }
    Command::Trend {
      model,
      input,
      plant,
      annotate,
      output,
      report_request,
    } => {
      info!("估计器: {}", model);
      info!("输入来源: {}", input);

      let model = build_model(&model)?;
      let input = InputWrapper::from_url(&input).context("无法打开输入")?;
      let plant_id = plant
        .or_else(|| input.plant_id().map(str::to_string))
        .context("缺少植物 ID，请在输入中指定 plant 参数或使用 --plant")?;
      let annotate = build_annotate(annotate.as_ref())?;
      let record_output = build_record(&output)?;

      let record = GrowthAnalysisTask::new(plant_id).run_task(input, model, annotate)?;
      record_output
        .record(&record)
        .context("写入生长记录失败")?;

      if let Some(url) = report_request {
        build_record(&url)?
          .record(&ReportRequest::from(&record))
          .context("写入报告请求失败")?;
      }
    }
  }

  Ok(())
}
