// 该文件是 Hanjian （焊检） 项目的一部分。
// src/bbox.rs - 检测框扩展
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

/// 绘制时使用的默认扩展比例
pub const DEFAULT_EXPAND_SCALE: f64 = 1.4;

/// 以中心为基准放大检测框，仅用于可视化。
///
/// `bbox` 为像素坐标 `[x_min, y_min, x_max, y_max]`，`scale` 大于 1 时放大。
/// 结果被限制在 `[0, width] x [0, height]` 内，并向零取整。
pub fn expand_bbox(bbox: [u32; 4], width: u32, height: u32, scale: f64) -> [u32; 4] {
  let [x1, y1, x2, y2] = bbox.map(f64::from);
  let (width, height) = (f64::from(width), f64::from(height));

  let cx = (x1 + x2) / 2.0;
  let cy = (y1 + y2) / 2.0;
  let w = (x2 - x1) * scale;
  let h = (y2 - y1) * scale;

  let nx1 = (cx - w / 2.0).clamp(0.0, width);
  let ny1 = (cy - h / 2.0).clamp(0.0, height);
  let nx2 = (cx + w / 2.0).clamp(0.0, width);
  let ny2 = (cy + h / 2.0).clamp(0.0, height);

  [nx1 as u32, ny1 as u32, nx2 as u32, ny2 as u32]
}
