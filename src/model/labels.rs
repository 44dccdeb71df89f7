// 该文件是 Kahao （卡号） 项目的一部分。
// src/model/labels.rs - 类别标签表
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

use std::{path::Path, str::FromStr};

use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum LabelError {
  #[error("无法读取标签文件 {path}: {source}")]
  Io {
    path: String,
    source: std::io::Error,
  },
  #[error("标签文件为空")]
  Empty,
}

/// 类别标签表：第 N 行对应类别 N
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelTable {
  labels: Box<[String]>,
}

impl LabelTable {
  pub fn from_path(path: impl AsRef<Path>) -> Result<Self, LabelError> {
    let path = path.as_ref();
    info!("加载标签文件: {}", path.display());
    let contents = std::fs::read_to_string(path).map_err(|source| LabelError::Io {
      path: path.display().to_string(),
      source,
    })?;
    contents.parse()
  }

  pub fn symbol(&self, class_index: u32) -> Option<&str> {
    self.labels.get(class_index as usize).map(String::as_str)
  }

  pub fn len(&self) -> usize {
    self.labels.len()
  }

  pub fn is_empty(&self) -> bool {
    self.labels.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = &str> {
    self.labels.iter().map(String::as_str)
  }
}

impl FromStr for LabelTable {
  type Err = LabelError;

  fn from_str(contents: &str) -> Result<Self, Self::Err> {
    // 空行也占一个类别位置，只去掉行尾的 '\r'
    let labels: Box<[String]> = contents
      .lines()
      .map(|line| line.trim_end_matches('\r').to_string())
      .collect();

    if labels.iter().all(String::is_empty) {
      return Err(LabelError::Empty);
    }

    debug!("标签数量: {}", labels.len());
    Ok(Self { labels })
  }
}

impl<S: Into<String>> FromIterator<S> for LabelTable {
  fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
    Self {
      labels: iter.into_iter().map(Into::into).collect(),
    }
  }
}
