// 该文件是 Plantmate（植物伙伴）项目的一部分。
// src/photo.rs - 植物照片与命名约定
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

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use image::{ImageReader, RgbImage};
use thiserror::Error;

use crate::model::EstimateError;

/// 拍摄时间戳格式，位于文件名开头
pub const CAPTURE_STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const CAPTURE_STAMP_LEN: usize = 15;

/// 可接受的照片扩展名
pub const PHOTO_EXTENSIONS: [&str; 3] = [".jpg", ".jpeg", ".png"];

/// 叠加绘制输出文件名前缀，照片源会跳过这些文件
pub const ANNOTATED_PREFIX: &str = "annotated_";

#[derive(Error, Debug, PartialEq)]
pub enum PhotoNameError {
  #[error("不支持的图片扩展名: {0}")]
  UnsupportedExtension(String),
  #[error("植物 ID 为空")]
  EmptyPlantId,
}

/// 一张植物照片；解码失败随照片一起传递，由估计器吸收
#[derive(Debug)]
pub struct Photo {
  pub name: String,
  pub path: PathBuf,
  pub captured_at: Option<NaiveDateTime>,
  pub image: Result<RgbImage, EstimateError>,
}

impl Photo {
  pub fn open(path: &Path) -> Self {
    let name = path
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_default();
    let captured_at = parse_capture_time(&name);

    Photo {
      name,
      path: path.to_path_buf(),
      captured_at,
      image: read_rgb(path),
    }
  }
}

fn ensure_color(image: image::DynamicImage) -> Result<RgbImage, EstimateError> {
  if !image.color().has_color() {
    return Err(EstimateError::MissingChannels);
  }
  Ok(image.to_rgb8())
}

/// 读取并解码图片文件为 RGB
pub fn read_rgb(path: &Path) -> Result<RgbImage, EstimateError> {
  let image = ImageReader::open(path)?.with_guessed_format()?.decode()?;
  ensure_color(image)
}

/// 解码内存中的图片为 RGB
pub fn decode_rgb(bytes: &[u8]) -> Result<RgbImage, EstimateError> {
  ensure_color(image::load_from_memory(bytes)?)
}

pub fn is_photo_extension(name: &str) -> bool {
  let lower = name.to_lowercase();
  PHOTO_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// 从 `YYYYMMDD_HHMMSS_...` 形式的文件名解析拍摄时间
pub fn parse_capture_time(name: &str) -> Option<NaiveDateTime> {
  let stamp = name.get(..CAPTURE_STAMP_LEN)?;
  NaiveDateTime::parse_from_str(stamp, CAPTURE_STAMP_FORMAT).ok()
}

/// 上传照片的存储文件名：`<时间戳>_<植物ID><扩展名>`
pub fn photo_file_name(
  captured_at: NaiveDateTime,
  plant_id: &str,
  extension: &str,
) -> Result<String, PhotoNameError> {
  let plant_id = plant_id.trim();
  if plant_id.is_empty() {
    return Err(PhotoNameError::EmptyPlantId);
  }
  if !is_photo_extension(extension) {
    return Err(PhotoNameError::UnsupportedExtension(extension.to_string()));
  }

  Ok(format!(
    "{}_{}{}",
    captured_at.format(CAPTURE_STAMP_FORMAT),
    plant_id.replace(' ', "_"),
    extension
  ))
}
