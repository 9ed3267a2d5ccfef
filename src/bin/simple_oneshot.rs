// 该文件是 Hanjian （焊检） 项目的一部分。
// src/bin/simple_oneshot.rs - 单张图像缺陷检测
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

use anyhow::Result;
use clap::Parser;
use url::Url;

use hanjian::{
  DEFAULT_MODEL_PATH, FromUrl,
  input::ImageFileInput,
  inspect::Inspector,
  model::Yolov8Builder,
  output::{Draw, SaveImageFileOutput},
  task::{OneShotTask, Task},
};
use tracing::info;

/// Hanjian 项目参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// ONNX 模型地址，例如 yolov8:///path/to/model.onnx?conf=0.35&iou=0.5
  #[arg(long, value_name = "MODEL")]
  pub model: Option<Url>,
  /// 输入图像，例如 image:///path/to/board.jpg
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,
  /// 输出路径，例如 image:///path/to/annotated.png
  #[arg(long, value_name = "OUTPUT")]
  pub output: Url,
  /// 标签字体文件
  #[arg(long, value_name = "FONT")]
  pub font: Option<PathBuf>,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  let builder = match &args.model {
    Some(url) => Yolov8Builder::from_url(url)?,
    None => Yolov8Builder::new(DEFAULT_MODEL_PATH),
  };
  info!("模型文件路径: {}", builder.model_path());
  info!("输入来源: {}", args.input);
  info!("输出路径: {}", args.output);

  let input_image = ImageFileInput::from_url(&args.input)?;
  let model = builder.build()?;
  let output = SaveImageFileOutput::from_url(&args.output)?;
  let inspector = match &args.font {
    Some(font) => Inspector::with_draw(model, Draw::with_font_path(font)),
    None => Inspector::new(model),
  };

  OneShotTask.run_task(input_image, &inspector, output)?;

  Ok(())
}
