// 该文件是 Hanjian （焊检） 项目的一部分。
// src/output/save_image_file.rs - 保存图像文件
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

use image::RgbImage;
use thiserror::Error;
use tracing::info;
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, detection::Detection, output::Render, url_file_path};

/// 保存标注图像，并在同名 `.json` 文件中记录检测结果
pub struct SaveImageFileOutput {
  path: PathBuf,
  record: bool,
}

#[derive(Error, Debug)]
pub enum SaveImageFileError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("图像错误: {0}")]
  ImageError(#[from] image::ImageError),
  #[error("记录序列化错误: {0}")]
  RecordError(#[from] serde_json::Error),
  #[error("路径解码错误: {0}")]
  PathDecodeError(#[from] std::str::Utf8Error),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

impl FromUrlWithScheme for SaveImageFileOutput {
  const SCHEME: &'static str = "image";
}

impl FromUrl for SaveImageFileOutput {
  type Error = SaveImageFileError;

  fn from_url(uri: &Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(SaveImageFileError::SchemeMismatch(format!(
        "期望保存方式 '{}', 实际保存方式 '{}'",
        Self::SCHEME,
        uri.scheme()
      )));
    }

    let record = !uri
      .query_pairs()
      .any(|(k, v)| k == "record" && (v == "false" || v == "0"));

    Ok(SaveImageFileOutput {
      path: url_file_path(uri)?,
      record,
    })
  }
}

impl SaveImageFileOutput {
  pub fn new(path: impl AsRef<Path>) -> Self {
    SaveImageFileOutput {
      path: path.as_ref().to_path_buf(),
      record: true,
    }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  pub fn record_path(&self) -> Option<PathBuf> {
    self.record.then(|| self.path.with_extension("json"))
  }

  fn save_image(&self, image: &RgbImage) -> Result<(), SaveImageFileError> {
    if let Some(parent) = self.path.parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent)?;
    }

    image.save(&self.path)?;
    info!("保存图像到文件: {}", self.path.display());
    Ok(())
  }

  fn save_record(&self, detections: &[Detection]) -> Result<(), SaveImageFileError> {
    if let Some(path) = self.record_path() {
      let json = serde_json::to_string_pretty(detections)?;
      std::fs::write(&path, json)?;
      info!("保存检测记录到文件: {}", path.display());
    }
    Ok(())
  }
}

impl Render<RgbImage, [Detection]> for SaveImageFileOutput {
  type Error = SaveImageFileError;

  fn render_result(&self, image: &RgbImage, result: &[Detection]) -> Result<(), Self::Error> {
    self.save_image(image)?;
    self.save_record(result)
  }
}
