// 该文件是 Kahao （卡号） 项目的一部分。
// src/input/directory.rs - 按文件名顺序读取目录中的原始输出
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

use std::path::PathBuf;

use tracing::{error, info};
use url::Url;

use super::raw_file::{RawFileInputError, read_raw_file};
use crate::{FromUrl, FromUrlWithScheme, frame::RawFrame, url_path};

const FRAME_EXTENSION: &str = "bin";

/// 目录输入：`folder:///path/to/dir`，每个 `*.bin` 文件一帧
pub struct DirectoryInput {
  files: std::vec::IntoIter<PathBuf>,
  next_index: u64,
}

impl FromUrlWithScheme for DirectoryInput {
  const SCHEME: &'static str = "folder";
}

impl FromUrl for DirectoryInput {
  type Error = RawFileInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(RawFileInputError::SchemeMismatch);
    }

    let directory = url_path(url)?;
    let mut files = Vec::new();
    for entry in std::fs::read_dir(&directory)? {
      let path = entry?.path();
      if path.is_file() && path.extension().is_some_and(|ext| ext == FRAME_EXTENSION) {
        files.push(path);
      }
    }
    files.sort();
    info!("目录 {} 中共 {} 帧", directory.display(), files.len());

    Ok(DirectoryInput {
      files: files.into_iter(),
      next_index: 0,
    })
  }
}

impl Iterator for DirectoryInput {
  type Item = RawFrame;

  fn next(&mut self) -> Option<Self::Item> {
    for path in self.files.by_ref() {
      match read_raw_file(&path) {
        Ok(frame) => {
          let frame = frame.with_index(self.next_index);
          self.next_index += 1;
          return Some(frame);
        }
        Err(e) => error!("跳过 {}: {}", path.display(), e),
      }
    }
    None
  }
}
