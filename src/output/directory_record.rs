// 该文件是 Kahao （卡号） 项目的一部分。
// src/output/directory_record.rs - 按日期目录记录识别结果
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

use chrono::{Datelike, Utc};
use std::fs::File;
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU16, Ordering};
use thiserror::Error;
use tracing::debug;

use super::{Render, RenderOptions, ResultView};
use crate::{FromUrl, FromUrlWithScheme, frame::RawFrame, pipeline::FrameResult, url_path};

#[derive(Error, Debug)]
pub enum DirectoryRecordOutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("路径编码错误: {0}")]
  PathError(#[from] std::string::FromUtf8Error),
  #[error("JSON 序列化错误: {0}")]
  JsonError(#[from] serde_json::Error),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("目录 {0} 下同一秒内的文件名已用尽")]
  NamesExhausted(PathBuf),
}

/// 记录到 `folder:///dir`，文件位于 `YYYY/MM/DD/HH-MM-SS-XXXX.json`。
///
/// 查询参数：`always` 记录未识别的帧，`detections` 附带检测框，
/// `raw` 同时保存原始输出 `.bin` 以便回放。
pub struct DirectoryRecordOutput {
  directory: PathBuf,
  frame_counter: AtomicU16,
  options: RenderOptions,
  raw: bool,
}

impl FromUrlWithScheme for DirectoryRecordOutput {
  const SCHEME: &'static str = "folder";
}

impl FromUrl for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn from_url(uri: &url::Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(DirectoryRecordOutputError::SchemeMismatch);
    }

    let raw = uri.query_pairs().any(|(k, _)| k == "raw");

    Ok(DirectoryRecordOutput {
      directory: url_path(uri)?,
      frame_counter: AtomicU16::new(0),
      options: RenderOptions::from_url(uri),
      raw,
    })
  }
}

impl DirectoryRecordOutput {
  pub fn directory(&self) -> &Path {
    &self.directory
  }

  fn frame_id(&self) -> u16 {
    self.frame_counter.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
  }

  /// 在当天目录下新建记录文件，返回其路径（不含扩展名）与 JSON 文件。
  ///
  /// 计数器回绕或多个输出共用目录时文件名可能已存在，
  /// 此时换下一个编号，已有文件不会被覆盖。
  fn create_record(&self) -> Result<(PathBuf, File), DirectoryRecordOutputError> {
    let now = Utc::now();
    let directory = self
      .directory
      .join(now.year().to_string())
      .join(format!("{:02}", now.month()))
      .join(format!("{:02}", now.day()));
    std::fs::create_dir_all(&directory)?;

    let stamp = now.format("%H-%M-%S").to_string();
    for _ in 0..=u16::MAX {
      let path = directory.join(format!("{}-{:04X}", stamp, self.frame_id()));
      match File::create_new(path.with_extension("json")) {
        Ok(file) => return Ok((path, file)),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
          debug!("记录文件已存在，换下一个编号: {}", path.display());
        }
        Err(e) => return Err(e.into()),
      }
    }
    Err(DirectoryRecordOutputError::NamesExhausted(directory))
  }
}

impl Render<RawFrame, FrameResult> for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn render_result(&self, frame: &RawFrame, result: &FrameResult) -> Result<(), Self::Error> {
    if !self.options.accepts(result) {
      return Ok(());
    }

    let (path, file) = self.create_record()?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &ResultView::new(result, &self.options))?;
    writer.flush()?;
    debug!("记录第 {} 帧: {}", result.index, path.with_extension("json").display());

    if self.raw {
      File::create_new(path.with_extension("bin"))?.write_all(&frame.to_le_bytes())?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::pipeline::CardRecord;

  fn files(dir: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    for entry in std::fs::read_dir(dir).unwrap() {
      let path = entry.unwrap().path();
      if path.is_dir() {
        found.extend(files(&path));
      } else {
        found.push(path);
      }
    }
    found.sort();
    found
  }

  #[test]
  fn test_records_only_recognized_frames() {
    let dir = tempfile::tempdir().unwrap();
    let url = url::Url::parse(&format!("folder://{}?raw", dir.path().display())).unwrap();
    let output = DirectoryRecordOutput::from_url(&url).unwrap();
    assert_eq!(output.directory(), dir.path());

    let frame = RawFrame::from(vec![0.0; 18]);
    let empty = FrameResult {
      index: 0,
      detections: Vec::new(),
      record: None,
    };
    output.render_result(&frame, &empty).unwrap();
    assert!(files(dir.path()).is_empty());

    let found = FrameResult {
      index: 1,
      detections: Vec::new(),
      record: Some(CardRecord {
        card_number: "4111111111111111".to_string(),
        card_month: "12".to_string(),
        card_year: "30".to_string(),
      }),
    };
    output.render_result(&frame, &found).unwrap();

    let written = files(dir.path());
    assert_eq!(written.len(), 2);
    let json = written
      .iter()
      .find(|p| p.extension().is_some_and(|e| e == "json"))
      .unwrap();
    // YYYY/MM/DD/HH-MM-SS-0001.json
    let relative = json.strip_prefix(dir.path()).unwrap();
    assert_eq!(relative.components().count(), 4);
    assert!(json.to_string_lossy().ends_with("-0001.json"));

    let value: serde_json::Value =
      serde_json::from_str(&std::fs::read_to_string(json).unwrap()).unwrap();
    assert_eq!(value["record"]["cardNumber"], "4111111111111111");
    assert!(value.get("detections").is_none());

    let bin = written
      .iter()
      .find(|p| p.extension().is_some_and(|e| e == "bin"))
      .unwrap();
    assert_eq!(std::fs::read(bin).unwrap(), frame.to_le_bytes());
  }

  #[test]
  fn test_existing_records_are_never_overwritten() {
    let dir = tempfile::tempdir().unwrap();
    let url = url::Url::parse(&format!("folder://{}?always", dir.path().display())).unwrap();
    let first = DirectoryRecordOutput::from_url(&url).unwrap();
    let second = DirectoryRecordOutput::from_url(&url).unwrap();
    let frame = RawFrame::from(vec![0.0; 18]);
    let result = |index| FrameResult {
      index,
      detections: Vec::new(),
      record: None,
    };

    // 两个输出共用目录，编号都从 0001 开始
    first.render_result(&frame, &result(7)).unwrap();
    second.render_result(&frame, &result(8)).unwrap();
    // 计数器回绕后再次写入
    first.frame_counter.store(u16::MAX, Ordering::Relaxed);
    first.render_result(&frame, &result(9)).unwrap();
    second.frame_counter.store(0, Ordering::Relaxed);
    second.render_result(&frame, &result(10)).unwrap();

    let written = files(dir.path());
    assert_eq!(written.len(), 4);
    let mut indices: Vec<u64> = written
      .iter()
      .map(|p| {
        let value: serde_json::Value =
          serde_json::from_str(&std::fs::read_to_string(p).unwrap()).unwrap();
        value["index"].as_u64().unwrap()
      })
      .collect();
    indices.sort();
    assert_eq!(indices, vec![7, 8, 9, 10]);
  }
}
