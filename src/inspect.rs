// 该文件是 Hanjian （焊检） 项目的一部分。
// src/inspect.rs - 缺陷检测入口
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

use image::{DynamicImage, RgbImage};
use thiserror::Error;
use tracing::info;

use crate::{
  detection::{Detection, Detector, DetectorError},
  model::{DetectResult, Model},
  output::Draw,
};

#[derive(Error, Debug)]
pub enum InspectError {
  #[error("检测失败: {0}")]
  DetectorError(#[from] DetectorError),
}

/// 对外唯一入口：检测缺陷并返回标注图像与检测列表。
///
/// 模型与类别表在构造后只读，调用之间不保留状态。
pub struct Inspector<M> {
  detector: Detector<M>,
  draw: Draw,
}

impl<M, E> Inspector<M>
where
  M: Model<Input = RgbImage, Output = DetectResult, Error = E>,
  E: std::error::Error + Send + Sync + 'static,
{
  pub fn new(model: M) -> Self {
    Self::with_draw(model, Draw::default())
  }

  pub fn with_draw(model: M, draw: Draw) -> Self {
    Inspector {
      detector: Detector::new(model),
      draw,
    }
  }

  pub fn detector(&self) -> &Detector<M> {
    &self.detector
  }

  /// 返回的检测框为模型原始坐标，扩展只作用于绘制。
  ///
  /// 标注图像总是 RGB8，输入的透明通道会被丢弃。
  pub fn run(&self, image: &DynamicImage) -> Result<(RgbImage, Vec<Detection>), InspectError> {
    let now = std::time::Instant::now();
    info!("开始 PCB 缺陷检测...");

    let rgb = image.to_rgb8();
    let detections = self.detector.detect(&rgb)?;
    let annotated = self.draw.annotate(&rgb, &detections);

    let elapsed = now.elapsed();
    info!(
      "检测完成: {} 个缺陷, 耗时 {:.2}s",
      detections.len(),
      elapsed.as_secs_f64()
    );
    info!("使用类别: {}", self.detector.class_names());

    Ok((annotated, detections))
  }
}
