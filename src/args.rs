// 该文件是 Plantmate（植物伙伴）项目的一部分。
// src/args.rs - 命令行参数
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

use clap::{Parser, Subcommand};
use url::Url;

/// Plantmate 植物生长比例估计与趋势分析
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  #[command(subcommand)]
  pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
  /// 估计照片中的叶片/花盆比例
  Estimate {
    /// 估计器配置，例如 ratio:default?min_area=500
    #[arg(long, value_name = "MODEL", default_value = "ratio:default")]
    model: Url,
    /// 输入来源
    /// - 单张图片: image:///path/to/photo.jpg
    /// - 照片目录: folder:///dir?plant=<ID>
    #[arg(long, value_name = "SOURCE")]
    input: Url,
    /// 叠加图像输出: image:///out.png 或 folder:///dir，可附加 ?font=<TTF>
    #[arg(long, value_name = "ANNOTATE")]
    annotate: Option<Url>,
    /// 结果输出: json:///path.json 或 json:-
    #[arg(long, value_name = "OUTPUT", default_value = "json:-")]
    output: Url,
  },
  /// 分析一株植物的照片序列的生长趋势
  Trend {
    /// 估计器配置
    #[arg(long, value_name = "MODEL", default_value = "ratio:default")]
    model: Url,
    /// 照片目录: folder:///dir?plant=<ID>&max=<N>
    #[arg(long, value_name = "SOURCE")]
    input: Url,
    /// 植物 ID（输入未指定时使用）
    #[arg(long, value_name = "PLANT")]
    plant: Option<String>,
    /// 叠加图像输出目录: folder:///dir
    #[arg(long, value_name = "ANNOTATE")]
    annotate: Option<Url>,
    /// 生长记录输出: json:///path.json 或 json:-
    #[arg(long, value_name = "OUTPUT", default_value = "json:-")]
    output: Url,
    /// 报告请求输出（交给报告生成方）
    #[arg(long, value_name = "REPORT")]
    report_request: Option<Url>,
  },
}
