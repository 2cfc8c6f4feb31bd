// 该文件是 Plantmate（植物伙伴）项目的一部分。
// src/output/draw.rs - 生长比例测量结果可视化
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

use std::path::Path;

use ab_glyph::{FontArc, PxScale};
use image::{Rgb, RgbImage};
use imageproc::{
  drawing::{draw_hollow_rect_mut, draw_text_mut},
  rect::Rect,
};
use thiserror::Error;
use tracing::info;
use url::Url;

use crate::model::Measurement;

// 文本渲染常量
const LABEL_FONT_SIZE: f32 = 28.0;
const LABEL_POSITION: (i32, i32) = (10, 8);
const BOX_THICKNESS: u32 = 2;
const PLANT_COLOR: [u8; 3] = [0, 255, 0]; // 绿色
const POT_COLOR: [u8; 3] = [0, 0, 255]; // 蓝色
const LABEL_COLOR: [u8; 3] = [255, 0, 0]; // 红色

#[derive(Error, Debug)]
pub enum DrawError {
  #[error("无法读取字体文件: {0}")]
  FontIo(#[from] std::io::Error),
  #[error("字体文件无效: {0}")]
  InvalidFont(#[from] ab_glyph::InvalidFont),
}

/// 叠加绘制：叶片跨度框、花盆参考框、比例文本
///
/// 不内嵌字体；未提供字体时只绘制两个框。
pub struct Draw {
  font: Option<FontArc>,
  font_size: f32,
  plant_color: [u8; 3],
  pot_color: [u8; 3],
  label_color: [u8; 3],
}

impl Default for Draw {
  fn default() -> Self {
    Self {
      font: None,
      font_size: LABEL_FONT_SIZE,
      plant_color: PLANT_COLOR,
      pot_color: POT_COLOR,
      label_color: LABEL_COLOR,
    }
  }
}

impl Draw {
  pub fn with_font_file(path: &Path) -> Result<Self, DrawError> {
    let data = std::fs::read(path)?;
    let font = FontArc::try_from_vec(data)?;
    info!("已加载叠加字体: {}", path.display());
    Ok(Self {
      font: Some(font),
      ..Self::default()
    })
  }

  /// 依据输出 URL 的 `font` 参数构造
  pub fn from_query(url: &Url) -> Result<Self, DrawError> {
    match url.query_pairs().find(|(k, _)| k == "font") {
      Some((_, path)) => Self::with_font_file(Path::new(path.as_ref())),
      None => Ok(Self::default()),
    }
  }

  pub fn has_font(&self) -> bool {
    self.font.is_some()
  }

  // 在 [top, bottom) 行之间绘制横跨整幅图像的框
  fn draw_band(&self, image: &mut RgbImage, top: u32, bottom: u32, color: [u8; 3]) {
    let width = image.width();
    let bottom = bottom.min(image.height());
    if top >= bottom || width == 0 {
      return;
    }

    for inset in 0..BOX_THICKNESS {
      let w = width.saturating_sub(2 * inset);
      let h = (bottom - top).saturating_sub(2 * inset);
      if w == 0 || h == 0 {
        break;
      }
      let rect = Rect::at(inset as i32, (top + inset) as i32).of_size(w, h);
      draw_hollow_rect_mut(image, rect, Rgb(color));
    }
  }

  /// 在图像副本上绘制测量结果，不修改原图
  pub fn render_overlay(&self, image: &RgbImage, measurement: &Measurement) -> RgbImage {
    let mut annotated = image.clone();
    let (plant_top, plant_bottom) = measurement.plant_span;
    let (pot_top, pot_bottom) = measurement.pot_span;

    self.draw_band(&mut annotated, plant_top, plant_bottom, self.plant_color);
    self.draw_band(&mut annotated, pot_top, pot_bottom, self.pot_color);

    if let Some(font) = &self.font {
      let label = format!("Ratio: {}", measurement.sample.ratio);
      draw_text_mut(
        &mut annotated,
        Rgb(self.label_color),
        LABEL_POSITION.0,
        LABEL_POSITION.1,
        PxScale::from(self.font_size),
        font,
        &label,
      );
    }

    annotated
  }
}
