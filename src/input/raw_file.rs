// 该文件是 Kahao （卡号） 项目的一部分。
// src/input/raw_file.rs - 读取原始输出文件
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

use std::path::Path;

use thiserror::Error;
use tracing::{error, info};
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, frame::RawFrame, url_path};

#[derive(Error, Debug)]
pub enum RawFileInputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("路径编码错误: {0}")]
  PathError(#[from] std::string::FromUtf8Error),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("文件 {path} 长度 {len} 不是 4 的整数倍")]
  Misaligned { path: String, len: usize },
}

/// 读取一个小端序 `f32` 原始输出文件
pub fn read_raw_file(path: &Path) -> Result<RawFrame, RawFileInputError> {
  let bytes = std::fs::read(path)?;
  RawFrame::from_le_bytes(&bytes).ok_or_else(|| RawFileInputError::Misaligned {
    path: path.display().to_string(),
    len: bytes.len(),
  })
}

/// 单帧输入：`raw:///path/to/output.bin`
pub struct RawFileInput {
  frame: Option<RawFrame>,
}

impl FromUrlWithScheme for RawFileInput {
  const SCHEME: &'static str = "raw";
}

impl FromUrl for RawFileInput {
  type Error = RawFileInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI 方案不匹配: 期望 '{}', 实际 '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(RawFileInputError::SchemeMismatch);
    }

    let path = url_path(url)?;
    let frame = read_raw_file(&path)?;
    info!("读取原始输出 {}: {} 个数值", path.display(), frame.len());
    Ok(RawFileInput { frame: Some(frame) })
  }
}

impl Iterator for RawFileInput {
  type Item = RawFrame;

  fn next(&mut self) -> Option<Self::Item> {
    self.frame.take()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Write;
  use tempfile::NamedTempFile;

  #[test]
  fn test_read_single_frame() {
    let mut file = NamedTempFile::new().unwrap();
    let frame = RawFrame::from(vec![1.0, -2.5, 0.25]);
    file.write_all(&frame.to_le_bytes()).unwrap();

    let url = Url::parse(&format!("raw://{}", file.path().display())).unwrap();
    let mut input = RawFileInput::from_url(&url).unwrap();
    assert_eq!(input.next(), Some(frame));
    assert_eq!(input.next(), None);
  }

  #[test]
  fn test_misaligned_file() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(&[0u8; 6]).unwrap();
    assert!(matches!(
      read_raw_file(file.path()),
      Err(RawFileInputError::Misaligned { len: 6, .. })
    ));
  }

  #[test]
  fn test_scheme_mismatch() {
    let url = Url::parse("jsonl:///tmp/x").unwrap();
    assert!(matches!(
      RawFileInput::from_url(&url),
      Err(RawFileInputError::SchemeMismatch)
    ));
  }
}
