// 该文件是 Hanjian （焊检） 项目的一部分。
// src/model/yolov8.rs - YOLOv8 ONNX 模型
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

use std::{fmt, str::FromStr, sync::Mutex};

use image::{RgbImage, imageops::FilterType};
use ndarray::{Array4, ArrayViewD, Axis, Ix2};
use ort::{
  execution_providers::{CPUExecutionProvider, ExecutionProviderDispatch},
  session::{Session, builder::GraphOptimizationLevel},
  value::TensorRef,
};
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  model::{ClassNames, DetectItem, DetectResult, Model},
  url_file_path,
};

const YOLOV8_DEFAULT_INPUT_SIZE: u32 = 640;
const YOLOV8_PAD_VALUE: f32 = 114.0 / 255.0;
const YOLOV8_MAX_NMS: usize = 30000;
const YOLOV8_MAX_DET: usize = 300;

/// 默认置信度阈值
pub const DEFAULT_CONFIDENCE: f32 = 0.35;
/// 默认 NMS IoU 阈值
pub const DEFAULT_IOU: f32 = 0.5;

#[derive(Error, Debug)]
pub enum Yolov8Error {
  #[error("模型加载错误: {0}")]
  ModelLoadError(#[from] std::io::Error),
  #[error("ONNX Runtime 错误: {0}")]
  OrtError(String),
  #[error("模型路径错误: {0}")]
  ModelPathError(String),
  #[error("配置错误: {0}")]
  ConfigError(String),
  #[error("模型输出形状无效: {0:?}")]
  InvalidOutputShape(Vec<usize>),
  #[error("输入图像为空: {0}x{1}")]
  EmptyImage(u32, u32),
  #[error("推理会话锁已损坏")]
  SessionPoisoned,
}

impl Yolov8Error {
  fn ort(e: impl fmt::Display) -> Self {
    Yolov8Error::OrtError(e.to_string())
  }
}

/// 推理设备
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Device {
  #[default]
  Cpu,
  Cuda(i32),
}

impl FromStr for Device {
  type Err = Yolov8Error;

  // 兼容 `cpu`、`cuda`、`cuda:1` 以及直接写设备号 `0`
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let s = s.trim().to_ascii_lowercase();
    let invalid = || Yolov8Error::ConfigError(format!("无法识别的设备: {}", s));
    match s.as_str() {
      "cpu" => Ok(Device::Cpu),
      "cuda" => Ok(Device::Cuda(0)),
      other => {
        let id = other.strip_prefix("cuda:").unwrap_or(other);
        let id: u32 = id.parse().map_err(|_| invalid())?;
        i32::try_from(id).map(Device::Cuda).map_err(|_| invalid())
      }
    }
  }
}

impl fmt::Display for Device {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Device::Cpu => write!(f, "cpu"),
      Device::Cuda(id) => write!(f, "cuda:{}", id),
    }
  }
}

/// 固定推理参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InferenceConfig {
  pub confidence: f32,
  pub iou: f32,
  pub device: Device,
}

impl Default for InferenceConfig {
  fn default() -> Self {
    Self {
      confidence: DEFAULT_CONFIDENCE,
      iou: DEFAULT_IOU,
      device: Device::Cpu,
    }
  }
}

fn parse_threshold(key: &str, value: &str) -> Result<f32, Yolov8Error> {
  let threshold: f32 = value
    .parse()
    .map_err(|_| Yolov8Error::ConfigError(format!("{} 不是数字: {}", key, value)))?;
  if !(0.0..=1.0).contains(&threshold) {
    return Err(Yolov8Error::ConfigError(format!(
      "{} 超出范围 [0, 1]: {}",
      key, threshold
    )));
  }
  Ok(threshold)
}

pub struct Yolov8Builder {
  model_path: String,
  config: InferenceConfig,
}

impl FromUrlWithScheme for Yolov8Builder {
  const SCHEME: &'static str = "yolov8";
}

impl FromUrl for Yolov8Builder {
  type Error = Yolov8Error;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(Yolov8Error::ModelPathError(format!(
        "模型路径必须使用 {} 方案",
        Self::SCHEME
      )));
    }

    let mut config = InferenceConfig::default();
    for (key, value) in url.query_pairs() {
      match key.as_ref() {
        "conf" => config.confidence = parse_threshold("conf", &value)?,
        "iou" => config.iou = parse_threshold("iou", &value)?,
        "device" => config.device = value.parse()?,
        other => warn!("忽略未知的模型参数: {}={}", other, value),
      }
    }

    let model_path = url_file_path(url)
      .map_err(|e| Yolov8Error::ModelPathError(format!("路径解码失败: {}", e)))?
      .to_string_lossy()
      .into_owned();
    if model_path.is_empty() {
      return Err(Yolov8Error::ModelPathError("模型路径为空".to_string()));
    }

    Ok(Yolov8Builder { model_path, config })
  }
}

impl Yolov8Builder {
  pub fn new(model_path: impl Into<String>) -> Self {
    Yolov8Builder {
      model_path: model_path.into(),
      config: InferenceConfig::default(),
    }
  }

  pub fn config(mut self, config: InferenceConfig) -> Self {
    self.config = config;
    self
  }

  pub fn inference_config(&self) -> &InferenceConfig {
    &self.config
  }

  pub fn model_path(&self) -> &str {
    &self.model_path
  }

  fn execution_providers(&self) -> Vec<ExecutionProviderDispatch> {
    match self.config.device {
      Device::Cpu => vec![CPUExecutionProvider::default().build()],
      #[cfg(feature = "cuda")]
      Device::Cuda(id) => {
        use ort::execution_providers::CUDAExecutionProvider;
        vec![
          CUDAExecutionProvider::default().with_device_id(id).build(),
          CPUExecutionProvider::default().build(),
        ]
      }
      #[cfg(not(feature = "cuda"))]
      Device::Cuda(id) => {
        warn!("未启用 cuda 特性，设备 cuda:{} 回退到 CPU", id);
        vec![CPUExecutionProvider::default().build()]
      }
    }
  }

  pub fn build(self) -> Result<Yolov8, Yolov8Error> {
    info!("加载模型文件: {}", self.model_path);
    let model_data = std::fs::read(&self.model_path)?;
    debug!(
      "模型文件大小: {:.2} MB",
      model_data.len() as f64 / (1024.0 * 1024.0)
    );

    info!("创建 ONNX Runtime 推理会话, 设备: {}", self.config.device);
    let session = Session::builder()
      .map_err(Yolov8Error::ort)?
      .with_optimization_level(GraphOptimizationLevel::Level3)
      .map_err(Yolov8Error::ort)?
      .with_execution_providers(self.execution_providers())
      .map_err(Yolov8Error::ort)?
      .commit_from_memory(&model_data)
      .map_err(Yolov8Error::ort)?;

    let (class_names, imgsz) = {
      let metadata = session.metadata().map_err(Yolov8Error::ort)?;
      let names = metadata.custom("names").ok().flatten();
      let imgsz = metadata.custom("imgsz").ok().flatten();
      (names, imgsz)
    };

    let input = session
      .inputs
      .first()
      .ok_or_else(|| Yolov8Error::ConfigError("模型没有输入".to_string()))?;
    let input_dims = input
      .input_type
      .tensor_shape()
      .ok_or_else(|| Yolov8Error::ConfigError(format!("模型输入 {} 不是张量", input.name)))?;
    debug!("模型输入维度: {:?}", &input_dims[..]);
    let input_size = resolve_input_size(&input_dims[..], imgsz.as_deref());
    debug!("模型输入尺寸: {}x{}", input_size.0, input_size.1);

    let class_names = match class_names.as_deref().and_then(ClassNames::from_metadata) {
      Some(names) => names,
      None => {
        warn!("模型缺少类别元数据，使用默认名称");
        ClassNames::default()
      }
    };
    info!("类别加载完成: {}", class_names);
    info!("模型加载完成");

    Ok(Yolov8 {
      session: Mutex::new(session),
      class_names,
      config: self.config,
      input_size,
    })
  }
}

/// 取 `[1, 3, H, W]` 中的静态宽高，动态维度为非正数
fn static_input_size(dims: &[i64]) -> Option<(u32, u32)> {
  match dims {
    [_, _, h, w] if *h > 0 && *w > 0 => Some((u32::try_from(*w).ok()?, u32::try_from(*h).ok()?)),
    _ => None,
  }
}

/// 输入尺寸优先取模型输入维度，其次 `imgsz` 元数据，最后使用默认值
fn resolve_input_size(dims: &[i64], imgsz: Option<&str>) -> (u32, u32) {
  static_input_size(dims)
    .or_else(|| imgsz.and_then(parse_imgsz))
    .unwrap_or((YOLOV8_DEFAULT_INPUT_SIZE, YOLOV8_DEFAULT_INPUT_SIZE))
}

/// 解析 `[640, 640]` 形式的输入尺寸，顺序为高、宽
fn parse_imgsz(raw: &str) -> Option<(u32, u32)> {
  let body = raw.trim().trim_start_matches('[').trim_end_matches(']');
  let mut dims = body.split(',').map(|v| v.trim().parse::<u32>());
  let h = dims.next()?.ok()?;
  let w = match dims.next() {
    Some(w) => w.ok()?,
    None => h,
  };
  (h > 0 && w > 0).then_some((w, h))
}

pub struct Yolov8 {
  session: Mutex<Session>,
  class_names: ClassNames,
  config: InferenceConfig,
  input_size: (u32, u32), // (宽, 高)
}

/// 等比缩放并填充的参数，用于把结果映射回原图
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Letterbox {
  gain: f32,
  pad_x: f32,
  pad_y: f32,
  width: u32,
  height: u32,
}

pub(crate) fn letterbox(
  image: &RgbImage,
  target_w: u32,
  target_h: u32,
) -> Result<(Array4<f32>, Letterbox), Yolov8Error> {
  let (width, height) = image.dimensions();
  if width == 0 || height == 0 {
    return Err(Yolov8Error::EmptyImage(width, height));
  }

  let gain = (target_w as f32 / width as f32).min(target_h as f32 / height as f32);
  let new_w = ((width as f32 * gain).round() as u32).clamp(1, target_w);
  let new_h = ((height as f32 * gain).round() as u32).clamp(1, target_h);
  let dw = (target_w - new_w) as f32 / 2.0;
  let dh = (target_h - new_h) as f32 / 2.0;
  let left = (dw - 0.1).round().max(0.0) as usize;
  let top = (dh - 0.1).round().max(0.0) as usize;

  let resized = if (new_w, new_h) == (width, height) {
    image.clone()
  } else {
    image::imageops::resize(image, new_w, new_h, FilterType::Triangle)
  };

  let mut tensor =
    Array4::from_elem((1, 3, target_h as usize, target_w as usize), YOLOV8_PAD_VALUE);
  for (x, y, pixel) in resized.enumerate_pixels() {
    let (tx, ty) = (left + x as usize, top + y as usize);
    for c in 0..3 {
      tensor[[0, c, ty, tx]] = pixel[c] as f32 / 255.0;
    }
  }

  Ok((
    tensor,
    Letterbox {
      gain,
      pad_x: left as f32,
      pad_y: top as f32,
      width,
      height,
    },
  ))
}

fn iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
  let iw = (a[2].min(b[2]) - a[0].max(b[0])).max(0.0);
  let ih = (a[3].min(b[3]) - a[1].max(b[1])).max(0.0);
  let inter = iw * ih;
  let area_a = (a[2] - a[0]) * (a[3] - a[1]);
  let area_b = (b[2] - b[0]) * (b[3] - b[1]);
  let union = area_a + area_b - inter;
  if union <= 0.0 { 0.0 } else { inter / union }
}

/// 按类别进行非极大值抑制，不同类别的框互不抑制
fn non_max_suppression(mut candidates: Vec<DetectItem>, iou_threshold: f32) -> Vec<DetectItem> {
  candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
  candidates.truncate(YOLOV8_MAX_NMS);

  let mut keep: Vec<DetectItem> = Vec::new();
  for candidate in candidates {
    let suppressed = keep.iter().any(|kept| {
      kept.class_id == candidate.class_id && iou(&kept.bbox, &candidate.bbox) > iou_threshold
    });
    if !suppressed {
      keep.push(candidate);
      if keep.len() >= YOLOV8_MAX_DET {
        break;
      }
    }
  }
  keep
}

/// 解码 `[1, 4 + nc, N]` 输出，过滤、抑制并映射回原图坐标
pub(crate) fn postprocess(
  output: ArrayViewD<f32>,
  letterbox: &Letterbox,
  config: &InferenceConfig,
) -> Result<DetectResult, Yolov8Error> {
  let shape = output.shape().to_vec();
  if shape.len() != 3 || shape[0] != 1 || shape[1] <= 4 {
    return Err(Yolov8Error::InvalidOutputShape(shape));
  }

  let predictions = output
    .index_axis(Axis(0), 0)
    .into_dimensionality::<Ix2>()
    .map_err(|_| Yolov8Error::InvalidOutputShape(shape.clone()))?;
  let mut candidates = Vec::new();
  for anchor in predictions.axis_iter(Axis(1)) {
    let (class_id, score) = anchor
      .iter()
      .skip(4)
      .enumerate()
      .fold((0usize, f32::NEG_INFINITY), |best, (idx, &score)| {
        if score > best.1 { (idx, score) } else { best }
      });

    if !(score > config.confidence) {
      continue;
    }

    let (cx, cy, w, h) = (anchor[0], anchor[1], anchor[2], anchor[3]);
    candidates.push(DetectItem {
      class_id: class_id as u32,
      score,
      bbox: [cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0],
    });
  }
  debug!("置信度过滤后候选框数量: {}", candidates.len());

  let (width, height) = (letterbox.width as f32, letterbox.height as f32);
  let items = non_max_suppression(candidates, config.iou)
    .into_iter()
    .map(|mut item| {
      let [x1, y1, x2, y2] = item.bbox;
      item.bbox = [
        ((x1 - letterbox.pad_x) / letterbox.gain).clamp(0.0, width),
        ((y1 - letterbox.pad_y) / letterbox.gain).clamp(0.0, height),
        ((x2 - letterbox.pad_x) / letterbox.gain).clamp(0.0, width),
        ((y2 - letterbox.pad_y) / letterbox.gain).clamp(0.0, height),
      ];
      item
    })
    .collect::<Vec<_>>();

  debug!("检测到 {} 个物体", items.len());
  Ok(DetectResult {
    items: items.into_boxed_slice(),
  })
}

impl Yolov8 {
  pub fn config(&self) -> &InferenceConfig {
    &self.config
  }
}

impl Model for Yolov8 {
  type Input = RgbImage;
  type Output = DetectResult;
  type Error = Yolov8Error;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    debug!("预处理输入图像 {}x{}", input.width(), input.height());
    let (tensor, letterbox) = letterbox(input, self.input_size.0, self.input_size.1)?;

    let output = {
      let mut session = self
        .session
        .lock()
        .map_err(|_| Yolov8Error::SessionPoisoned)?;
      let input_value = TensorRef::from_array_view(&tensor).map_err(Yolov8Error::ort)?;

      debug!("执行模型推理");
      let outputs = session
        .run(ort::inputs![input_value])
        .map_err(Yolov8Error::ort)?;

      outputs[0]
        .try_extract_array::<f32>()
        .map_err(Yolov8Error::ort)?
        .into_owned()
    };
    debug!("模型输出形状: {:?}", output.shape());

    postprocess(output.view(), &letterbox, &self.config)
  }

  fn class_names(&self) -> &ClassNames {
    &self.class_names
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::Rgb;
  use ndarray::Array3;

  fn identity_letterbox(width: u32, height: u32) -> Letterbox {
    Letterbox {
      gain: 1.0,
      pad_x: 0.0,
      pad_y: 0.0,
      width,
      height,
    }
  }

  /// 构造 `[1, 4 + nc, N]` 的模型输出，每个锚点为 (cx, cy, w, h, class_id, score)
  fn raw_output(num_classes: usize, anchors: &[(f32, f32, f32, f32, usize, f32)]) -> Array3<f32> {
    let mut output = Array3::zeros((1, 4 + num_classes, anchors.len()));
    for (i, &(cx, cy, w, h, class_id, score)) in anchors.iter().enumerate() {
      output[[0, 0, i]] = cx;
      output[[0, 1, i]] = cy;
      output[[0, 2, i]] = w;
      output[[0, 3, i]] = h;
      output[[0, 4 + class_id, i]] = score;
    }
    output
  }

  #[test]
  fn parses_device() {
    assert_eq!("cpu".parse::<Device>().unwrap(), Device::Cpu);
    assert_eq!("CUDA".parse::<Device>().unwrap(), Device::Cuda(0));
    assert_eq!("cuda:1".parse::<Device>().unwrap(), Device::Cuda(1));
    assert_eq!("0".parse::<Device>().unwrap(), Device::Cuda(0));
    assert!("tpu".parse::<Device>().is_err());
    assert!("cuda:-1".parse::<Device>().is_err());
    assert!("-2".parse::<Device>().is_err());
    assert!("cuda:4294967295".parse::<Device>().is_err());
  }

  #[test]
  fn builder_from_url_uses_defaults() {
    let url = Url::parse("yolov8:///models/pcb.onnx").unwrap();
    let builder = Yolov8Builder::from_url(&url).unwrap();
    assert_eq!(builder.model_path(), "/models/pcb.onnx");
    assert_eq!(*builder.inference_config(), InferenceConfig::default());
    assert_eq!(builder.inference_config().confidence, 0.35);
    assert_eq!(builder.inference_config().iou, 0.5);
  }

  #[test]
  fn builder_from_url_reads_query() {
    let url = Url::parse("yolov8:Model/best.onnx?conf=0.25&iou=0.7&device=cuda:1").unwrap();
    let builder = Yolov8Builder::from_url(&url).unwrap();
    assert_eq!(builder.model_path(), "Model/best.onnx");
    assert_eq!(
      *builder.inference_config(),
      InferenceConfig {
        confidence: 0.25,
        iou: 0.7,
        device: Device::Cuda(1),
      }
    );
  }

  #[test]
  fn builder_rejects_bad_url() {
    let url = Url::parse("image:///models/pcb.onnx").unwrap();
    assert!(matches!(
      Yolov8Builder::from_url(&url),
      Err(Yolov8Error::ModelPathError(_))
    ));

    let url = Url::parse("yolov8:///models/pcb.onnx?conf=1.5").unwrap();
    assert!(matches!(
      Yolov8Builder::from_url(&url),
      Err(Yolov8Error::ConfigError(_))
    ));
  }

  #[test]
  fn missing_model_file_fails_to_build() {
    let result = Yolov8Builder::new("/nonexistent/model.onnx").build();
    assert!(matches!(result, Err(Yolov8Error::ModelLoadError(_))));
  }

  #[test]
  fn parses_imgsz_metadata() {
    assert_eq!(parse_imgsz("[640, 640]"), Some((640, 640)));
    assert_eq!(parse_imgsz("[480, 640]"), Some((640, 480)));
    assert_eq!(parse_imgsz("320"), Some((320, 320)));
    assert_eq!(parse_imgsz("[0, 640]"), None);
    assert_eq!(parse_imgsz("abc"), None);
  }

  #[test]
  fn input_size_prefers_static_dims() {
    assert_eq!(resolve_input_size(&[1, 3, 1024, 1024], None), (1024, 1024));
    assert_eq!(
      resolve_input_size(&[1, 3, 480, 800], Some("[640, 640]")),
      (800, 480)
    );
    // 动态维度回退到元数据
    assert_eq!(
      resolve_input_size(&[-1, 3, -1, -1], Some("[320, 416]")),
      (416, 320)
    );
    assert_eq!(resolve_input_size(&[1, 3, 0, 0], Some("512")), (512, 512));
    // 都没有时使用默认值
    assert_eq!(resolve_input_size(&[-1, 3, -1, -1], None), (640, 640));
    assert_eq!(resolve_input_size(&[1, 3, 640], Some("bad")), (640, 640));
  }

  #[test]
  fn builder_from_url_decodes_path() {
    let url = Url::parse("yolov8:///models/pcb defects/焊点.onnx?conf=0.4").unwrap();
    let builder = Yolov8Builder::from_url(&url).unwrap();
    assert_eq!(builder.model_path(), "/models/pcb defects/焊点.onnx");
    assert_eq!(builder.inference_config().confidence, 0.4);
  }

  #[test]
  fn letterbox_pads_and_centers() {
    let image = RgbImage::from_pixel(200, 100, Rgb([255, 0, 0]));
    let (tensor, lb) = letterbox(&image, 64, 64).unwrap();

    assert_eq!(tensor.shape(), &[1, 3, 64, 64]);
    assert_eq!(lb.gain, 0.32);
    assert_eq!((lb.pad_x, lb.pad_y), (0.0, 16.0));
    // 填充区域
    assert_eq!(tensor[[0, 0, 0, 0]], YOLOV8_PAD_VALUE);
    assert_eq!(tensor[[0, 0, 63, 0]], YOLOV8_PAD_VALUE);
    // 图像区域
    assert_eq!(tensor[[0, 0, 32, 32]], 1.0);
    assert_eq!(tensor[[0, 1, 32, 32]], 0.0);
  }

  #[test]
  fn letterbox_rejects_empty_image() {
    let image = RgbImage::new(0, 10);
    assert!(matches!(
      letterbox(&image, 64, 64),
      Err(Yolov8Error::EmptyImage(0, 10))
    ));
  }

  #[test]
  fn postprocess_filters_by_confidence() {
    let output = raw_output(
      2,
      &[
        (30.0, 30.0, 20.0, 20.0, 0, 0.9),
        (70.0, 70.0, 10.0, 10.0, 1, 0.35),
        (50.0, 50.0, 10.0, 10.0, 1, 0.1),
      ],
    );
    let result = postprocess(
      output.view().into_dyn(),
      &identity_letterbox(100, 100),
      &InferenceConfig::default(),
    )
    .unwrap();

    assert_eq!(result.len(), 1);
    assert_eq!(result.items[0].class_id, 0);
    assert_eq!(result.items[0].bbox, [20.0, 20.0, 40.0, 40.0]);
  }

  #[test]
  fn postprocess_with_no_candidates_is_empty() {
    let output = raw_output(3, &[(10.0, 10.0, 4.0, 4.0, 2, 0.2)]);
    let result = postprocess(
      output.view().into_dyn(),
      &identity_letterbox(100, 100),
      &InferenceConfig::default(),
    )
    .unwrap();
    assert!(result.is_empty());
  }

  #[test]
  fn nms_is_class_aware() {
    let output = raw_output(
      2,
      &[
        (50.0, 50.0, 20.0, 20.0, 0, 0.9),
        (51.0, 51.0, 20.0, 20.0, 0, 0.8),
        (51.0, 51.0, 20.0, 20.0, 1, 0.7),
        (10.0, 10.0, 8.0, 8.0, 0, 0.6),
      ],
    );
    let result = postprocess(
      output.view().into_dyn(),
      &identity_letterbox(100, 100),
      &InferenceConfig::default(),
    )
    .unwrap();

    let kept: Vec<(u32, f32)> = result.items.iter().map(|i| (i.class_id, i.score)).collect();
    assert_eq!(kept, vec![(0, 0.9), (1, 0.7), (0, 0.6)]);
  }

  #[test]
  fn postprocess_maps_back_to_source_image() {
    let lb = Letterbox {
      gain: 0.5,
      pad_x: 0.0,
      pad_y: 10.0,
      width: 200,
      height: 100,
    };
    let output = raw_output(1, &[(50.0, 35.0, 20.0, 10.0, 0, 0.8), (2.0, 12.0, 10.0, 10.0, 0, 0.8)]);
    let result = postprocess(output.view().into_dyn(), &lb, &InferenceConfig::default()).unwrap();

    assert_eq!(result.len(), 2);
    assert_eq!(result.items[0].bbox, [80.0, 40.0, 120.0, 60.0]);
    // 越界部分被裁剪到图像范围
    assert_eq!(result.items[1].bbox, [0.0, 0.0, 14.0, 14.0]);
  }

  #[test]
  fn postprocess_rejects_bad_shape() {
    let output = Array3::<f32>::zeros((1, 4, 10));
    assert!(matches!(
      postprocess(
        output.view().into_dyn(),
        &identity_letterbox(10, 10),
        &InferenceConfig::default()
      ),
      Err(Yolov8Error::InvalidOutputShape(_))
    ));
  }
}
