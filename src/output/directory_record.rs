// 该文件是 Plantmate（植物伙伴）项目的一部分。
// src/output/directory_record.rs - 目录叠加图像输出
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

use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, warn};

use crate::{
  FromUrl, FromUrlWithScheme,
  model::Measurement,
  output::{
    Render,
    draw::{Draw, DrawError},
  },
  photo::{ANNOTATED_PREFIX, Photo},
  url_file_path,
};

#[derive(Error, Debug)]
pub enum DirectoryRecordOutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("图像错误: {0}")]
  ImageError(#[from] image::ImageError),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("字体错误: {0}")]
  DrawError(#[from] DrawError),
}

/// 把一组照片的叠加图像写入目录，文件名为 `annotated_<原文件名>`
pub struct DirectoryRecordOutput {
  directory: PathBuf,
  draw: Draw,
}

impl FromUrlWithScheme for DirectoryRecordOutput {
  const SCHEME: &'static str = "folder";
}

impl FromUrl for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn from_url(uri: &url::Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(DirectoryRecordOutputError::SchemeMismatch);
    }

    Ok(DirectoryRecordOutput {
      directory: url_file_path(uri),
      draw: Draw::from_query(uri)?,
    })
  }
}

impl DirectoryRecordOutput {
  fn frame_path(&self, photo: &Photo) -> Result<PathBuf, DirectoryRecordOutputError> {
    if !self.directory.exists() {
      std::fs::create_dir_all(&self.directory)?;
    }
    Ok(
      self
        .directory
        .join(format!("{}{}", ANNOTATED_PREFIX, photo.name)),
    )
  }
}

impl Render<Photo, Measurement> for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn render_result(&self, frame: &Photo, result: &Measurement) -> Result<(), Self::Error> {
    let image = match &frame.image {
      Ok(image) => image,
      Err(e) => {
        warn!("照片 {} 没有可绘制的图像: {}", frame.name, e);
        return Ok(());
      }
    };

    let path = self.frame_path(frame)?;
    self.draw.render_overlay(image, result).save(&path)?;
    debug!("保存叠加图像: {}", path.display());
    Ok(())
  }
}
