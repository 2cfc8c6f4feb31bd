// 该文件是 Plantmate（植物伙伴）项目的一部分。
// src/model/foliage.rs - 叶片颜色分割与区域提取
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

use image::{GrayImage, Luma, Rgb, RgbImage, imageops};
use imageproc::{
  contours::{BorderType, find_contours},
  distance_transform::Norm,
  geometry::contour_area,
  morphology,
};

use super::EstimatorConfig;

const MASK_ON: u8 = 255;

/// OpenCV 8 位约定下的 HSV 像素
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hsv {
  /// 色相，0..180
  pub h: u8,
  /// 饱和度，0..255
  pub s: u8,
  /// 明度，0..255
  pub v: u8,
}

impl From<Rgb<u8>> for Hsv {
  fn from(Rgb([r, g, b]): Rgb<u8>) -> Self {
    let (rf, gf, bf) = (r as f32, g as f32, b as f32);
    let max = rf.max(gf).max(bf);
    let min = rf.min(gf).min(bf);
    let delta = max - min;

    let s = if max > 0.0 { delta * 255.0 / max } else { 0.0 };

    let mut h = if delta == 0.0 {
      0.0
    } else if max == rf {
      60.0 * (gf - bf) / delta
    } else if max == gf {
      120.0 + 60.0 * (bf - rf) / delta
    } else {
      240.0 + 60.0 * (rf - gf) / delta
    };
    if h < 0.0 {
      h += 360.0;
    }

    Hsv {
      h: (h / 2.0).round().min(180.0) as u8,
      s: s.round() as u8,
      v: max as u8,
    }
  }
}

impl Hsv {
  pub fn in_foliage_band(&self, config: &EstimatorConfig) -> bool {
    (config.hue_min..=config.hue_max).contains(&self.h)
      && self.s >= config.sat_min
      && self.v >= config.val_min
  }
}

/// 叶片二值掩码：色带内为 255，其余为 0
pub fn foliage_mask(image: &RgbImage, config: &EstimatorConfig) -> GrayImage {
  GrayImage::from_fn(image.width(), image.height(), |x, y| {
    let hsv = Hsv::from(*image.get_pixel(x, y));
    if hsv.in_foliage_band(config) {
      Luma([MASK_ON])
    } else {
      Luma([0])
    }
  })
}

/// 开运算去除散点噪声
pub fn open_mask(mask: &GrayImage, config: &EstimatorConfig) -> GrayImage {
  morphology::open(mask, Norm::LInf, config.kernel_radius())
}

/// 一个通过面积过滤的叶片区域，坐标为外接矩形
#[derive(Debug, Clone, PartialEq)]
pub struct FoliageRegion {
  pub left: u32,
  pub top: u32,
  /// 不含
  pub right: u32,
  /// 不含
  pub bottom: u32,
  pub area: f64,
}

impl FoliageRegion {
  pub fn height(&self) -> u32 {
    self.bottom - self.top
  }
}

/// 提取最外层轮廓，丢弃面积小于阈值的区域
///
/// 掩码先补一圈 0 再找轮廓，贴着图像边缘的区域也按外轮廓处理。
pub fn foliage_regions(mask: &GrayImage, min_area: f64) -> Vec<FoliageRegion> {
  let mut padded = GrayImage::new(mask.width() + 2, mask.height() + 2);
  imageops::replace(&mut padded, mask, 1, 1);

  find_contours::<i32>(&padded)
    .into_iter()
    .filter(|contour| contour.border_type == BorderType::Outer && contour.parent.is_none())
    .filter_map(|contour| {
      if contour.points.is_empty() {
        return None;
      }
      let area = contour_area(&contour.points).abs();
      if area < min_area {
        return None;
      }

      let (mut left, mut top) = (i32::MAX, i32::MAX);
      let (mut right, mut bottom) = (i32::MIN, i32::MIN);
      for point in contour.points.iter() {
        left = left.min(point.x);
        top = top.min(point.y);
        right = right.max(point.x);
        bottom = bottom.max(point.y);
      }

      // 补边后的坐标整体偏移 1；右、下边界不含，故不再减
      Some(FoliageRegion {
        left: (left - 1) as u32,
        top: (top - 1) as u32,
        right: right as u32,
        bottom: bottom as u32,
        area,
      })
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn hsv(r: u8, g: u8, b: u8) -> Hsv {
    Hsv::from(Rgb([r, g, b]))
  }

  #[test]
  fn test_hsv_primaries() {
    assert_eq!(hsv(255, 0, 0), Hsv { h: 0, s: 255, v: 255 });
    assert_eq!(hsv(0, 255, 0), Hsv { h: 60, s: 255, v: 255 });
    assert_eq!(hsv(0, 0, 255), Hsv { h: 120, s: 255, v: 255 });
    assert_eq!(hsv(0, 0, 0), Hsv { h: 0, s: 0, v: 0 });
    assert_eq!(hsv(200, 200, 200), Hsv { h: 0, s: 0, v: 200 });
  }

  #[test]
  fn test_hsv_band_edges() {
    let config = EstimatorConfig::default();
    // 纯绿、深绿在色带内
    assert!(hsv(0, 255, 0).in_foliage_band(&config));
    assert!(hsv(34, 139, 34).in_foliage_band(&config));
    // 黄色 H=30，低于下限
    assert!(!hsv(255, 255, 0).in_foliage_band(&config));
    // 青色 H=90，高于上限
    assert!(!hsv(0, 255, 255).in_foliage_band(&config));
    // 太暗
    assert!(!hsv(0, 40, 0).in_foliage_band(&config));
    // 饱和度不足
    assert!(!hsv(180, 200, 180).in_foliage_band(&config));
  }

  #[test]
  fn test_opening_removes_speckles() {
    let config = EstimatorConfig::default();
    let mut mask = GrayImage::new(40, 40);
    // 孤立噪点
    mask.put_pixel(3, 3, Luma([MASK_ON]));
    mask.put_pixel(30, 8, Luma([MASK_ON]));
    // 10x10 实心块
    for y in 20..30 {
      for x in 10..20 {
        mask.put_pixel(x, y, Luma([MASK_ON]));
      }
    }

    let opened = open_mask(&mask, &config);
    assert_eq!(opened.get_pixel(3, 3)[0], 0);
    assert_eq!(opened.get_pixel(30, 8)[0], 0);
    assert_eq!(opened.get_pixel(15, 25)[0], MASK_ON);
  }

  #[test]
  fn test_regions_filter_by_area() {
    let mut mask = GrayImage::new(100, 100);
    // 40x30 大区域
    for y in 10..40 {
      for x in 20..60 {
        mask.put_pixel(x, y, Luma([MASK_ON]));
      }
    }
    // 8x8 小区域，面积低于 300
    for y in 70..78 {
      for x in 70..78 {
        mask.put_pixel(x, y, Luma([MASK_ON]));
      }
    }

    let regions = foliage_regions(&mask, 300.0);
    assert_eq!(regions.len(), 1);
    let region = &regions[0];
    assert_eq!((region.left, region.top), (20, 10));
    assert_eq!((region.right, region.bottom), (60, 40));
    assert_eq!(region.height(), 30);
    assert!(region.area >= 300.0);
  }

  #[test]
  fn test_holes_are_not_separate_regions() {
    let mut mask = GrayImage::new(80, 80);
    for y in 10..70 {
      for x in 10..70 {
        let inside_hole = (30..50).contains(&x) && (30..50).contains(&y);
        if !inside_hole {
          mask.put_pixel(x, y, Luma([MASK_ON]));
        }
      }
    }
    // 洞内的小岛屿不是最外层轮廓
    for y in 36..44 {
      for x in 36..44 {
        mask.put_pixel(x, y, Luma([MASK_ON]));
      }
    }

    let regions = foliage_regions(&mask, 0.0);
    assert_eq!(regions.len(), 1);
    assert_eq!((regions[0].top, regions[0].bottom), (10, 70));
  }

  #[test]
  fn test_regions_touching_image_edges() {
    let mut mask = GrayImage::new(100, 100);
    // 贴左边
    for y in 10..60 {
      for x in 0..30 {
        mask.put_pixel(x, y, Luma([MASK_ON]));
      }
    }
    // 贴右下角
    for y in 70..100 {
      for x in 60..100 {
        mask.put_pixel(x, y, Luma([MASK_ON]));
      }
    }

    let mut regions = foliage_regions(&mask, 300.0);
    regions.sort_by_key(|r| r.left);
    assert_eq!(regions.len(), 2);
    assert_eq!(
      (regions[0].left, regions[0].top, regions[0].right, regions[0].bottom),
      (0, 10, 30, 60)
    );
    assert_eq!(
      (regions[1].left, regions[1].top, regions[1].right, regions[1].bottom),
      (60, 70, 100, 100)
    );
  }

  #[test]
  fn test_full_mask_is_one_region() {
    let mask = GrayImage::from_pixel(40, 30, Luma([MASK_ON]));
    let regions = foliage_regions(&mask, 300.0);
    assert_eq!(regions.len(), 1);
    assert_eq!((regions[0].top, regions[0].bottom), (0, 30));
    assert_eq!((regions[0].left, regions[0].right), (0, 40));
  }

  #[test]
  fn test_empty_mask_has_no_regions() {
    let mask = GrayImage::new(50, 50);
    assert!(foliage_regions(&mask, 300.0).is_empty());
  }
}
