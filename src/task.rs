// 该文件是 Hanjian （焊检） 项目的一部分。
// src/task.rs - 任务流程
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

use std::time::Duration;

use image::{DynamicImage, RgbImage};
use tracing::{info, warn};

use crate::{
  detection::Detection,
  inspect::Inspector,
  model::{DetectResult, Model},
  output::Render,
};

pub trait Task<I, M, O>: Sized {
  type Error;
  fn run_task(self, input: I, inspector: &Inspector<M>, output: O) -> Result<(), Self::Error>;
}

pub struct OneShotTask;

impl<
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = DynamicImage>,
  M: Model<Input = RgbImage, Output = DetectResult, Error = ME>,
  O: Render<RgbImage, [Detection], Error = RE>,
> Task<I, M, O> for OneShotTask
{
  type Error = anyhow::Error;

  fn run_task(self, mut input: I, inspector: &Inspector<M>, output: O) -> Result<(), Self::Error> {
    info!("开始任务...");
    let image = input.next().ok_or_else(|| anyhow::anyhow!("没有输入图像"))?;
    info!("输入图像获取成功，开始检测...");
    let (annotated, detections) = inspector.run(&image)?;
    for det in &detections {
      info!(
        "  - {}: {:.2}% at {:?}",
        det.label,
        det.confidence * 100.0,
        det.bbox
      );
    }
    output.render_result(&annotated, detections.as_slice())?;
    info!("渲染完成");

    Ok(())
  }
}

/// 同一图像重复检测，用于统计平均耗时
#[derive(Debug)]
pub struct RepeatShotTask {
  times: usize,
}

const REPEAT_WARMUP: usize = 2;

impl Default for RepeatShotTask {
  fn default() -> Self {
    RepeatShotTask { times: 100 }
  }
}

impl RepeatShotTask {
  pub fn with_times(mut self, times: usize) -> Self {
    self.times = times;
    self
  }
}

impl<
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = DynamicImage>,
  M: Model<Input = RgbImage, Output = DetectResult, Error = ME>,
  O: Render<RgbImage, [Detection], Error = RE>,
> Task<I, M, O> for RepeatShotTask
{
  type Error = anyhow::Error;

  fn run_task(self, mut input: I, inspector: &Inspector<M>, output: O) -> Result<(), Self::Error> {
    if self.times <= REPEAT_WARMUP {
      anyhow::bail!("重复次数必须大于 {}", REPEAT_WARMUP);
    }

    info!("开始任务...");
    let image = input.next().ok_or_else(|| anyhow::anyhow!("没有输入图像"))?;
    info!("输入图像获取成功，开始检测...");
    let mut times = Vec::with_capacity(self.times);
    let mut last = None;
    for i in 0..self.times {
      let now = std::time::Instant::now();
      let result = inspector.run(&image)?;
      let elapsed = now.elapsed();
      info!("({})检测完成，耗时: {:.2?}", i, elapsed);
      times.push(elapsed);
      last = Some(result);
    }

    warn!(
      "平均检测时间: {:.2?}",
      times.iter().skip(REPEAT_WARMUP).sum::<Duration>() / (times.len() - REPEAT_WARMUP) as u32
    );

    if let Some((annotated, detections)) = last {
      output.render_result(&annotated, detections.as_slice())?;
    }

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    detection::tests::StubModel,
    input::ImageFileInput,
    model::DetectItem,
    output::{Draw, LabelFont},
  };
  use std::cell::RefCell;

  #[derive(Default)]
  struct Collect {
    rendered: RefCell<Vec<(RgbImage, Vec<Detection>)>>,
  }

  impl Render<RgbImage, [Detection]> for &Collect {
    type Error = std::io::Error;

    fn render_result(&self, image: &RgbImage, result: &[Detection]) -> Result<(), Self::Error> {
      self
        .rendered
        .borrow_mut()
        .push((image.clone(), result.to_vec()));
      Ok(())
    }
  }

  fn inspector() -> Inspector<StubModel> {
    Inspector::with_draw(
      StubModel::with_items(vec![DetectItem {
        class_id: 1,
        score: 0.8,
        bbox: [4.0, 4.0, 12.0, 12.0],
      }]),
      Draw::with_font(LabelFont::bitmap()),
    )
  }

  #[test]
  fn one_shot_renders_once() {
    let collect = Collect::default();
    let input = ImageFileInput::from(DynamicImage::new_rgb8(32, 32));
    OneShotTask.run_task(input, &inspector(), &collect).unwrap();

    let rendered = collect.rendered.borrow();
    assert_eq!(rendered.len(), 1);
    assert_eq!(rendered[0].1.len(), 1);
    assert_eq!(rendered[0].1[0].label, "short");
  }

  #[test]
  fn one_shot_without_input_fails() {
    let collect = Collect::default();
    let result = OneShotTask.run_task(std::iter::empty::<DynamicImage>(), &inspector(), &collect);
    assert!(result.is_err());
    assert!(collect.rendered.borrow().is_empty());
  }

  #[test]
  fn repeat_shot_renders_last_result() {
    let collect = Collect::default();
    let input = ImageFileInput::from(DynamicImage::new_rgb8(32, 32));
    RepeatShotTask::default()
      .with_times(4)
      .run_task(input, &inspector(), &collect)
      .unwrap();
    assert_eq!(collect.rendered.borrow().len(), 1);
  }

  #[test]
  fn repeat_shot_needs_more_than_warmup() {
    let collect = Collect::default();
    let input = ImageFileInput::from(DynamicImage::new_rgb8(8, 8));
    let result = RepeatShotTask::default()
      .with_times(2)
      .run_task(input, &inspector(), &collect);
    assert!(result.is_err());
  }
}
