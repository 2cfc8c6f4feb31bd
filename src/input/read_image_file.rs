// 该文件是 Plantmate（植物伙伴）项目的一部分。
// src/input/read_image_file.rs - 单张图片文件输入
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

use thiserror::Error;
use tracing::{error, warn};
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, photo::Photo, url_file_path};

#[derive(Error, Debug)]
pub enum ImageFileInputError {
  #[error("URI schema mismatch")]
  SchemaMismatch,
  #[error("Image file not found: {0}")]
  NotFound(String),
}

/// 单张图片输入；解码失败不会在这里报错，而是随照片传给估计器
pub struct ImageFileInput {
  photo: Option<Photo>,
}

impl FromUrlWithScheme for ImageFileInput {
  const SCHEME: &'static str = "image";
}

impl FromUrl for ImageFileInput {
  type Error = ImageFileInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(ImageFileInputError::SchemaMismatch);
    }

    let path = url_file_path(url);
    if !path.is_file() {
      return Err(ImageFileInputError::NotFound(path.display().to_string()));
    }

    let photo = Photo::open(&path);
    if let Err(e) = &photo.image {
      warn!("图片无法解码，将记为未检测: {} ({})", photo.name, e);
    }

    Ok(ImageFileInput { photo: Some(photo) })
  }
}

impl ImageFileInput {
  pub fn len(&self) -> usize {
    usize::from(self.photo.is_some())
  }

  pub fn is_empty(&self) -> bool {
    self.photo.is_none()
  }
}

impl Iterator for ImageFileInput {
  type Item = Photo;

  fn next(&mut self) -> Option<Self::Item> {
    self.photo.take()
  }
}
