// 该文件是 Hanjian （焊检） 项目的一部分。
// src/model/labels.rs - 类别名称表
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

use std::{borrow::Cow, collections::BTreeMap, fmt};

/// 类别编号到名称的映射，模型加载后只读
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassNames {
  names: BTreeMap<u32, String>,
}

impl ClassNames {
  /// 解析 ONNX 元数据中的 `names` 字段。
  ///
  /// 导出工具写入的是 Python 字典字面量，例如
  /// `{0: 'missing_hole', 1: 'mouse_bite'}`，格式不符时返回 `None`。
  pub fn from_metadata(raw: &str) -> Option<Self> {
    let body = raw.trim().strip_prefix('{')?.strip_suffix('}')?;
    let mut chars = body.chars().peekable();
    let mut names = BTreeMap::new();

    loop {
      while chars.next_if(|c| c.is_whitespace() || *c == ',').is_some() {}
      if chars.peek().is_none() {
        break;
      }

      let mut key = String::new();
      while let Some(c) = chars.next_if(char::is_ascii_digit) {
        key.push(c);
      }
      let id: u32 = key.parse().ok()?;

      while chars.next_if(|c| c.is_whitespace()).is_some() {}
      chars.next_if_eq(&':')?;
      while chars.next_if(|c| c.is_whitespace()).is_some() {}

      let quote = chars.next_if(|c| *c == '\'' || *c == '"')?;
      let mut name = String::new();
      loop {
        match chars.next()? {
          '\\' => name.push(chars.next()?),
          c if c == quote => break,
          c => name.push(c),
        }
      }
      names.insert(id, name);
    }

    if names.is_empty() {
      None
    } else {
      Some(Self { names })
    }
  }

  /// 未登记的编号按 `class{id}` 命名
  pub fn get(&self, class_id: u32) -> Cow<'_, str> {
    match self.names.get(&class_id) {
      Some(name) => Cow::Borrowed(name.as_str()),
      None => Cow::Owned(default_name(class_id)),
    }
  }

  pub fn len(&self) -> usize {
    self.names.len()
  }

  pub fn is_empty(&self) -> bool {
    self.names.is_empty()
  }

  pub fn names(&self) -> impl Iterator<Item = &str> {
    self.names.values().map(String::as_str)
  }
}

fn default_name(class_id: u32) -> String {
  format!("class{}", class_id)
}

impl FromIterator<(u32, String)> for ClassNames {
  fn from_iter<I: IntoIterator<Item = (u32, String)>>(iter: I) -> Self {
    Self {
      names: iter.into_iter().collect(),
    }
  }
}

impl fmt::Display for ClassNames {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let names: Vec<&str> = self.names().collect();
    write!(f, "{:?}", names)
  }
}
