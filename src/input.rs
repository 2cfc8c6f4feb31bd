// 该文件是 Plantmate（植物伙伴）项目的一部分。
// src/input.rs - 照片输入
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

use crate::{FromUrl, photo::Photo};

#[cfg(feature = "read_image_file")]
mod read_image_file;
#[cfg(feature = "read_image_file")]
pub use self::read_image_file::{ImageFileInput, ImageFileInputError};

#[cfg(feature = "plant_folder")]
mod plant_folder;
#[cfg(feature = "plant_folder")]
pub use self::plant_folder::{DEFAULT_MAX_PHOTOS, PlantFolderInput, PlantFolderInputError};

#[derive(Error, Debug)]
pub enum InputError {
  #[cfg(feature = "read_image_file")]
  #[error("图片文件输入错误: {0}")]
  ImageFileInputError(#[from] ImageFileInputError),
  #[cfg(feature = "plant_folder")]
  #[error("照片目录输入错误: {0}")]
  PlantFolderInputError(#[from] PlantFolderInputError),
  #[error("URI 方案不匹配")]
  SchemeMismatch,
}

pub enum InputWrapper {
  #[cfg(feature = "read_image_file")]
  ReadImageFile(ImageFileInput),
  #[cfg(feature = "plant_folder")]
  PlantFolder(PlantFolderInput),
}

impl FromUrl for InputWrapper {
  type Error = InputError;

  fn from_url(url: &url::Url) -> Result<Self, Self::Error> {
    #[cfg(feature = "plant_folder")]
    {
      use crate::FromUrlWithScheme;

      if url.scheme() == PlantFolderInput::SCHEME {
        let input = PlantFolderInput::from_url(url)?;
        return Ok(InputWrapper::PlantFolder(input));
      }
    }
    #[cfg(feature = "read_image_file")]
    {
      use crate::FromUrlWithScheme;

      if url.scheme() == ImageFileInput::SCHEME {
        let input = ImageFileInput::from_url(url)?;
        return Ok(InputWrapper::ReadImageFile(input));
      }
    }
    Err(InputError::SchemeMismatch)
  }
}

impl InputWrapper {
  /// 输入中的照片数量
  pub fn len(&self) -> usize {
    match self {
      #[cfg(feature = "read_image_file")]
      InputWrapper::ReadImageFile(input) => input.len(),
      #[cfg(feature = "plant_folder")]
      InputWrapper::PlantFolder(input) => input.len(),
    }
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// 照片所属的植物 ID（若输入指定了）
  pub fn plant_id(&self) -> Option<&str> {
    match self {
      #[cfg(feature = "read_image_file")]
      InputWrapper::ReadImageFile(_) => None,
      #[cfg(feature = "plant_folder")]
      InputWrapper::PlantFolder(input) => Some(input.plant_id()),
    }
  }
}

impl Iterator for InputWrapper {
  type Item = Photo;

  fn next(&mut self) -> Option<Self::Item> {
    match self {
      #[cfg(feature = "read_image_file")]
      InputWrapper::ReadImageFile(input) => input.next(),
      #[cfg(feature = "plant_folder")]
      InputWrapper::PlantFolder(input) => input.next(),
    }
  }
}
