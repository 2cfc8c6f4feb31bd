// 该文件是 Plantmate（植物伙伴）项目的一部分。
// src/output/json_record.rs - JSON 记录输出
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

use std::{io::Write, path::PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::info;
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, output::Record, url_file_path};

const STDOUT_PATH: &str = "-";

#[derive(Error, Debug)]
pub enum JsonRecordOutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("序列化错误: {0}")]
  SerializeError(#[from] serde_json::Error),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
}

/// `json:///路径.json` 写入文件，`json:-` 写到标准输出
pub struct JsonRecordOutput {
  target: Option<PathBuf>,
}

impl FromUrlWithScheme for JsonRecordOutput {
  const SCHEME: &'static str = "json";
}

impl FromUrl for JsonRecordOutput {
  type Error = JsonRecordOutputError;

  fn from_url(uri: &Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(JsonRecordOutputError::SchemeMismatch);
    }

    let target = match uri.path() {
      STDOUT_PATH | "" => None,
      _ => Some(url_file_path(uri)),
    };
    Ok(JsonRecordOutput { target })
  }
}

impl<T: Serialize> Record<T> for JsonRecordOutput {
  type Error = JsonRecordOutputError;

  fn record(&self, item: &T) -> Result<(), Self::Error> {
    let json = serde_json::to_string_pretty(item)?;
    match &self.target {
      Some(path) => {
        if let Some(parent) = path.parent()
          && !parent.as_os_str().is_empty()
        {
          std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)?;
        info!("记录已写入: {}", path.display());
      }
      None => {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{}", json)?;
      }
    }
    Ok(())
  }
}
