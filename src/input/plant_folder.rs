// 该文件是 Plantmate（植物伙伴）项目的一部分。
// src/input/plant_folder.rs - 按植物筛选的照片目录输入
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

//! `folder:///目录?plant=<植物ID>&max=<数量>`
//!
//! 目录中的文件按以下规则筛选：
//! - 文件名包含植物 ID（不区分大小写）；
//! - 扩展名为 jpg/jpeg/png；
//! - 跳过 `annotated_` 开头的叠加输出。
//!
//! 结果按文件名排序（文件名以拍摄时间戳开头），最多保留 `max` 张。

use std::{collections::VecDeque, path::PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  photo::{ANNOTATED_PREFIX, Photo, is_photo_extension},
  url_file_path,
};

pub const DEFAULT_MAX_PHOTOS: usize = 20;

#[derive(Error, Debug)]
pub enum PlantFolderInputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("缺少 plant 参数")]
  MissingPlant,
  #[error("max 参数无效: {0}")]
  InvalidMax(String),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
}

pub struct PlantFolderInput {
  plant_id: String,
  pending: VecDeque<PathBuf>,
}

impl FromUrlWithScheme for PlantFolderInput {
  const SCHEME: &'static str = "folder";
}

impl FromUrl for PlantFolderInput {
  type Error = PlantFolderInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(PlantFolderInputError::SchemeMismatch);
    }

    let mut plant_id = None;
    let mut max = DEFAULT_MAX_PHOTOS;
    for (k, v) in url.query_pairs() {
      match k.as_ref() {
        "plant" => plant_id = Some(v.into_owned()),
        "max" => {
          max = v
            .parse()
            .map_err(|_| PlantFolderInputError::InvalidMax(v.to_string()))?
        }
        other => warn!("忽略未知的输入参数: {}", other),
      }
    }
    let plant_id = plant_id
      .filter(|p| !p.trim().is_empty())
      .ok_or(PlantFolderInputError::MissingPlant)?;

    Self::scan(url_file_path(url), plant_id, max)
  }
}

impl PlantFolderInput {
  /// 扫描目录并筛选某株植物的照片
  pub fn scan(
    directory: PathBuf,
    plant_id: String,
    max: usize,
  ) -> Result<Self, PlantFolderInputError> {
    let needle = plant_id.to_lowercase();
    let mut names = Vec::new();
    for entry in std::fs::read_dir(&directory)? {
      let entry = entry?;
      if !entry.file_type()?.is_file() {
        continue;
      }
      let name = entry.file_name().to_string_lossy().into_owned();
      if name.to_lowercase().contains(&needle)
        && is_photo_extension(&name)
        && !name.starts_with(ANNOTATED_PREFIX)
      {
        names.push(name);
      } else {
        debug!("跳过文件: {}", name);
      }
    }

    names.sort();
    names.truncate(max);
    info!(
      "植物 {} 在 {} 中找到 {} 张照片",
      plant_id,
      directory.display(),
      names.len()
    );

    let pending = names.iter().map(|name| directory.join(name)).collect();
    Ok(PlantFolderInput {
      plant_id,
      pending,
    })
  }

  pub fn plant_id(&self) -> &str {
    &self.plant_id
  }

  /// 尚未读取的照片数量
  pub fn len(&self) -> usize {
    self.pending.len()
  }

  pub fn is_empty(&self) -> bool {
    self.pending.is_empty()
  }
}

impl Iterator for PlantFolderInput {
  type Item = Photo;

  fn next(&mut self) -> Option<Self::Item> {
    let path = self.pending.pop_front()?;
    let photo = Photo::open(&path);
    if let Err(e) = &photo.image {
      warn!("照片无法解码，将记为未检测: {} ({})", photo.name, e);
    }
    Some(photo)
  }
}
