// 该文件是 Hanjian （焊检） 项目的一部分。
// src/output/draw.rs - 缺陷检测结果可视化
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

use std::path::{Path, PathBuf};

use ab_glyph::{FontArc, PxScale};
use image::{Rgb, RgbImage};
use imageproc::{
  drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size},
  rect::Rect,
};
use tracing::{debug, info, warn};

use crate::{
  bbox::{DEFAULT_EXPAND_SCALE, expand_bbox},
  detection::Detection,
  output::bitmap_font,
};

// 文本渲染常量
pub const PREFERRED_FONT: &str = "DejaVuSans.ttf";
const LABEL_FONT_SIZE: f32 = 32.0;
const BITMAP_FONT_SCALE: u32 = 3;
const FONT_SEARCH_DIRS: [&str; 6] = [
  "/usr/share/fonts/truetype/dejavu",
  "/usr/share/fonts/dejavu",
  "/usr/share/fonts/TTF",
  "/usr/local/share/fonts",
  "/Library/Fonts",
  "C:\\Windows\\Fonts",
];

const BOX_COLOR: [u8; 3] = [255, 0, 0]; // 红色
const BOX_WIDTH: i32 = 4;
const LABEL_BACKGROUND: [u8; 3] = [255, 255, 255];
const LABEL_TEXT_COLOR: [u8; 3] = [255, 0, 0];

/// 标签字体：优先使用 TrueType 字体，加载失败时使用内置点阵字体
pub enum LabelFont {
  Glyph { font: FontArc, scale: PxScale },
  Bitmap { scale: u32 },
}

impl LabelFont {
  /// 加载字体，从不失败。
  ///
  /// 只给出文件名时，会依次在常见的系统字体目录中查找。
  pub fn load(path: impl AsRef<Path>) -> Self {
    let path = path.as_ref();
    for candidate in font_candidates(path) {
      let Ok(data) = std::fs::read(&candidate) else {
        continue;
      };
      match FontArc::try_from_vec(data) {
        Ok(font) => {
          info!("加载字体: {}", candidate.display());
          return LabelFont::Glyph {
            font,
            scale: PxScale::from(LABEL_FONT_SIZE),
          };
        }
        Err(e) => warn!("字体文件无效 {}: {}", candidate.display(), e),
      }
    }

    warn!("无法加载字体 {}，使用内置点阵字体", path.display());
    LabelFont::bitmap()
  }

  pub fn bitmap() -> Self {
    LabelFont::Bitmap {
      scale: BITMAP_FONT_SCALE,
    }
  }

  pub fn is_bitmap(&self) -> bool {
    matches!(self, LabelFont::Bitmap { .. })
  }

  pub fn text_size(&self, text: &str) -> (u32, u32) {
    match self {
      LabelFont::Glyph { font, scale } => text_size(*scale, font, text),
      LabelFont::Bitmap { scale } => bitmap_font::text_size(text, *scale),
    }
  }

  pub fn draw_text(&self, image: &mut RgbImage, color: Rgb<u8>, x: i32, y: i32, text: &str) {
    match self {
      LabelFont::Glyph { font, scale } => draw_text_mut(image, color, x, y, *scale, font, text),
      LabelFont::Bitmap { scale } => bitmap_font::draw_text(image, color, x, y, *scale, text),
    }
  }
}

fn font_candidates(path: &Path) -> Vec<PathBuf> {
  let mut candidates = vec![path.to_path_buf()];
  let bare_name = path.parent().is_none_or(|p| p.as_os_str().is_empty());
  if bare_name {
    candidates.extend(FONT_SEARCH_DIRS.iter().map(|dir| Path::new(dir).join(path)));
  }
  candidates
}

pub struct Draw {
  font: LabelFont,
  expand_scale: f64,
  box_color: [u8; 3],
  box_width: i32,
  label_background: [u8; 3],
  label_text_color: [u8; 3],
}

impl Default for Draw {
  fn default() -> Self {
    Self::with_font(LabelFont::load(PREFERRED_FONT))
  }
}

impl Draw {
  pub fn with_font(font: LabelFont) -> Self {
    Self {
      font,
      expand_scale: DEFAULT_EXPAND_SCALE,
      box_color: BOX_COLOR,
      box_width: BOX_WIDTH,
      label_background: LABEL_BACKGROUND,
      label_text_color: LABEL_TEXT_COLOR,
    }
  }

  pub fn with_font_path(path: impl AsRef<Path>) -> Self {
    Self::with_font(LabelFont::load(path))
  }

  pub fn font(&self) -> &LabelFont {
    &self.font
  }

  /// 在输入图像的副本上绘制检测结果，输入图像保持不变
  pub fn annotate(&self, image: &RgbImage, detections: &[Detection]) -> RgbImage {
    let mut canvas = image.clone();
    for detection in detections {
      self.draw_detection(&mut canvas, detection);
    }
    debug!("绘制 {} 个检测框", detections.len());
    canvas
  }

  fn draw_detection(&self, image: &mut RgbImage, detection: &Detection) {
    let (w, h) = image.dimensions();
    let [x_min, y_min, x_max, y_max] =
      expand_bbox(detection.bbox, w, h, self.expand_scale).map(|v| v as i32);

    // 边框向内加粗，包含右下角坐标
    for t in 0..self.box_width {
      let (left, top, right, bottom) = (x_min + t, y_min + t, x_max - t, y_max - t);
      if left > right || top > bottom {
        break;
      }
      let rect = Rect::at(left, top).of_size((right - left + 1) as u32, (bottom - top + 1) as u32);
      draw_hollow_rect_mut(image, rect, Rgb(self.box_color));
    }

    let label = format!("{} ({:.2})", detection.label, detection.confidence);
    let (text_width, text_height) = self.font.text_size(&label);
    let (tw, th) = (text_width as i32, text_height as i32);

    // 标签背景紧贴扩展框左上角上方
    let background = Rect::at(x_min, y_min - th - 6).of_size(text_width + 9, text_height + 7);
    draw_filled_rect_mut(image, background, Rgb(self.label_background));

    self.font.draw_text(
      image,
      Rgb(self.label_text_color),
      x_min + 4,
      y_min - th - 4,
      &label,
    );
    debug!(
      "标签 {:?} 尺寸 {}x{} 位于 ({}, {})",
      label,
      tw,
      th,
      x_min,
      y_min - th - 6
    );
  }
}
