// 该文件是 Hanjian （焊检） 项目的一部分。
// src/lib.rs - 库主文件
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

pub mod bbox;
pub mod detection;
pub mod input;
pub mod inspect;
pub mod model;
pub mod output;
pub mod task;

use std::path::PathBuf;

/// 默认模型文件路径
pub const DEFAULT_MODEL_PATH: &str = "Model/best_yolov8_pcb_defects.onnx";

pub trait FromUrl {
  type Error;
  fn from_url(url: &url::Url) -> Result<Self, Self::Error>
  where
    Self: Sized;
}

pub trait FromUrlWithScheme: FromUrl {
  const SCHEME: &'static str;
}

/// URL 路径经百分号解码后的本地文件路径
pub fn url_file_path(url: &url::Url) -> Result<PathBuf, std::str::Utf8Error> {
  let path = percent_encoding::percent_decode_str(url.path()).decode_utf8()?;
  Ok(PathBuf::from(path.as_ref()))
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::path::Path;

  #[test]
  fn decodes_url_path() {
    let url = url::Url::parse("image:///tmp/my board/焊点.png").unwrap();
    assert_eq!(url_file_path(&url).unwrap(), Path::new("/tmp/my board/焊点.png"));

    let url = url::Url::parse("image:///tmp/a%2Bb.png").unwrap();
    assert_eq!(url_file_path(&url).unwrap(), Path::new("/tmp/a+b.png"));

    let url = url::Url::parse("image:///tmp/bad%FF.png").unwrap();
    assert!(url_file_path(&url).is_err());
  }
}
