// 该文件是 Plantmate（植物伙伴）项目的一部分。
// src/output/save_image_file.rs - 保存叠加图像文件
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
use tracing::{info, warn};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  model::Measurement,
  output::{
    Render,
    draw::{Draw, DrawError},
  },
  photo::Photo,
  url_file_path,
};

pub struct SaveImageFileOutput {
  path: PathBuf,
  draw: Draw,
}

#[derive(Error, Debug)]
pub enum SaveImageFileError {
  #[error("I/O 错误: {0}")]
  IoError(std::io::Error),
  #[error("图像错误: {0}")]
  ImageError(image::ImageError),
  #[error("字体错误: {0}")]
  DrawError(#[from] DrawError),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

impl FromUrlWithScheme for SaveImageFileOutput {
  const SCHEME: &'static str = "image";
}

impl FromUrl for SaveImageFileOutput {
  type Error = SaveImageFileError;

  fn from_url(uri: &Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(SaveImageFileError::SchemeMismatch(format!(
        "期望保存方式 '{}', 实际保存方式 '{}'",
        Self::SCHEME,
        uri.scheme()
      )));
    }

    Ok(SaveImageFileOutput {
      path: url_file_path(uri),
      draw: Draw::from_query(uri)?,
    })
  }
}

impl SaveImageFileOutput {
  fn save_image(&self, image: image::RgbImage) -> Result<(), SaveImageFileError> {
    if let Some(parent) = self.path.parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent).map_err(SaveImageFileError::IoError)?;
    }

    image
      .save(&self.path)
      .map_err(SaveImageFileError::ImageError)?;

    info!("保存叠加图像到文件: {}", self.path.display());

    Ok(())
  }
}

impl Render<Photo, Measurement> for SaveImageFileOutput {
  type Error = SaveImageFileError;

  fn render_result(&self, frame: &Photo, result: &Measurement) -> Result<(), Self::Error> {
    match &frame.image {
      Ok(image) => self.save_image(self.draw.render_overlay(image, result)),
      Err(e) => {
        warn!("照片 {} 没有可绘制的图像: {}", frame.name, e);
        Ok(())
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::{GrowthRatioEstimator, Model};
  use image::{Rgb, RgbImage};

  #[test]
  fn test_saves_annotated_image() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("nested").join("overlay.png");
    let url = Url::parse(&format!("image://{}", out.display())).unwrap();
    let output = SaveImageFileOutput::from_url(&url).unwrap();

    let image = RgbImage::from_fn(100, 200, |_, y| {
      if (40..140).contains(&y) {
        Rgb([30, 170, 40])
      } else {
        Rgb([250, 250, 250])
      }
    });
    let measurement = GrowthRatioEstimator::default().infer(&image).unwrap();
    let photo = Photo {
      name: "20250101_000000_fern.png".to_string(),
      path: dir.path().join("20250101_000000_fern.png"),
      captured_at: None,
      image: Ok(image),
    };

    output.render_result(&photo, &measurement).unwrap();
    let saved = image::open(&out).unwrap().to_rgb8();
    assert_eq!(saved.dimensions(), (100, 200));
    assert_eq!(*saved.get_pixel(50, measurement.plant_span.0), Rgb([0, 255, 0]));
  }

  #[test]
  fn test_scheme_mismatch() {
    let url = Url::parse("json:///tmp/x.json").unwrap();
    assert!(matches!(
      SaveImageFileOutput::from_url(&url),
      Err(SaveImageFileError::SchemeMismatch(_))
    ));
  }
}
