// 该文件是 Kahao （卡号） 项目的一部分。
// src/input/json_lines.rs - JSON Lines 原始输出
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

use std::{
  fs::File,
  io::{BufRead, BufReader, Lines},
};

use thiserror::Error;
use tracing::{error, info};
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, frame::RawFrame, url_path};

#[derive(Error, Debug)]
pub enum JsonLinesInputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("路径编码错误: {0}")]
  PathError(#[from] std::string::FromUtf8Error),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
}

/// 每行一个数字数组：`jsonl:///path/to/frames.jsonl`。
///
/// 空行与无法解析的行会被跳过。
pub struct JsonLinesInput {
  lines: Lines<BufReader<File>>,
  line_number: usize,
  next_index: u64,
}

impl FromUrlWithScheme for JsonLinesInput {
  const SCHEME: &'static str = "jsonl";
}

impl FromUrl for JsonLinesInput {
  type Error = JsonLinesInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(JsonLinesInputError::SchemeMismatch);
    }
    let path = url_path(url)?;
    let file = File::open(&path)?;
    info!("打开 JSON Lines 输入: {}", path.display());
    Ok(JsonLinesInput {
      lines: BufReader::new(file).lines(),
      line_number: 0,
      next_index: 0,
    })
  }
}

impl Iterator for JsonLinesInput {
  type Item = RawFrame;

  fn next(&mut self) -> Option<Self::Item> {
    loop {
      let line = match self.lines.next()? {
        Ok(line) => line,
        Err(e) => {
          error!("读取第 {} 行之后失败: {}", self.line_number, e);
          return None;
        }
      };
      self.line_number += 1;
      if line.trim().is_empty() {
        continue;
      }
      match serde_json::from_str::<Vec<f32>>(&line) {
        Ok(data) => {
          let frame = RawFrame::from(data).with_index(self.next_index);
          self.next_index += 1;
          return Some(frame);
        }
        Err(e) => error!("跳过第 {} 行: {}", self.line_number, e),
      }
    }
  }
}
