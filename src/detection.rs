// 该文件是 Hanjian （焊检） 项目的一部分。
// src/detection.rs - 检测结果记录与检测器适配
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

use image::RgbImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::model::{ClassNames, DetectItem, DetectResult, Model};

/// 单个缺陷检测结果，坐标为原图整数像素 `[x_min, y_min, x_max, y_max]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
  #[serde(rename = "box")]
  pub bbox: [u32; 4],
  pub label: String,
  pub confidence: f32,
}

impl Detection {
  /// 坐标向零取整，类别编号转为名称
  pub fn from_item(item: &DetectItem, class_names: &ClassNames) -> Self {
    Detection {
      bbox: item.bbox.map(|v| v as u32),
      label: class_names.get(item.class_id).into_owned(),
      confidence: item.score,
    }
  }
}

#[derive(Error, Debug)]
pub enum DetectorError {
  #[error("模型推理错误: {0}")]
  ModelError(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// 检测器：调用模型并把原始输出整理为 [`Detection`] 列表
pub struct Detector<M> {
  model: M,
  class_names: ClassNames,
}

impl<M, E> Detector<M>
where
  M: Model<Input = RgbImage, Output = DetectResult, Error = E>,
  E: std::error::Error + Send + Sync + 'static,
{
  pub fn new(model: M) -> Self {
    let class_names = model.class_names().clone();
    Detector { model, class_names }
  }

  pub fn class_names(&self) -> &ClassNames {
    &self.class_names
  }

  pub fn detect(&self, image: &RgbImage) -> Result<Vec<Detection>, DetectorError> {
    info!("运行 YOLO 推理...");
    let result = self
      .model
      .infer(image)
      .map_err(|e| DetectorError::ModelError(Box::new(e)))?;

    let detections: Vec<Detection> = result
      .items
      .iter()
      .map(|item| Detection::from_item(item, &self.class_names))
      .collect();
    debug!("检测结果: {:?}", detections);

    info!("YOLO 检测到 {} 个缺陷", detections.len());
    Ok(detections)
  }
}

#[cfg(test)]
pub(crate) mod tests {
  use super::*;

  #[derive(Debug, Error)]
  #[error("模拟推理失败")]
  pub(crate) struct StubError;

  /// 返回固定结果的模型
  pub(crate) struct StubModel {
    pub items: Vec<DetectItem>,
    pub class_names: ClassNames,
    pub fail: bool,
  }

  impl StubModel {
    pub(crate) fn with_items(items: Vec<DetectItem>) -> Self {
      let class_names = ["scratch", "short", "spur"]
        .iter()
        .enumerate()
        .map(|(id, name)| (id as u32, name.to_string()))
        .collect();
      StubModel {
        items,
        class_names,
        fail: false,
      }
    }
  }

  impl Model for StubModel {
    type Input = RgbImage;
    type Output = DetectResult;
    type Error = StubError;

    fn infer(&self, _input: &RgbImage) -> Result<DetectResult, StubError> {
      if self.fail {
        return Err(StubError);
      }
      Ok(DetectResult {
        items: self.items.clone().into_boxed_slice(),
      })
    }

    fn class_names(&self) -> &ClassNames {
      &self.class_names
    }
  }

  #[test]
  fn converts_raw_items() {
    let detector = Detector::new(StubModel::with_items(vec![
      DetectItem {
        class_id: 1,
        score: 0.875,
        bbox: [10.9, 20.2, 30.5, 40.99],
      },
      DetectItem {
        class_id: 9,
        score: 0.5,
        bbox: [0.0, 0.0, 5.0, 5.0],
      },
    ]));

    let detections = detector.detect(&RgbImage::new(64, 64)).unwrap();
    assert_eq!(
      detections,
      vec![
        Detection {
          bbox: [10, 20, 30, 40],
          label: "short".to_string(),
          confidence: 0.875,
        },
        Detection {
          bbox: [0, 0, 5, 5],
          label: "class9".to_string(),
          confidence: 0.5,
        },
      ]
    );
  }

  #[test]
  fn no_boxes_is_empty_list() {
    let detector = Detector::new(StubModel::with_items(Vec::new()));
    assert!(detector.detect(&RgbImage::new(8, 8)).unwrap().is_empty());
  }

  #[test]
  fn model_failure_propagates() {
    let mut model = StubModel::with_items(Vec::new());
    model.fail = true;
    let detector = Detector::new(model);
    assert!(matches!(
      detector.detect(&RgbImage::new(8, 8)),
      Err(DetectorError::ModelError(_))
    ));
  }

  #[test]
  fn serializes_with_box_key() {
    let detection = Detection {
      bbox: [10, 10, 50, 50],
      label: "scratch".to_string(),
      confidence: 0.5,
    };
    let json = serde_json::to_value(&detection).unwrap();
    assert_eq!(
      json,
      serde_json::json!({ "box": [10, 10, 50, 50], "label": "scratch", "confidence": 0.5 })
    );
  }
}
