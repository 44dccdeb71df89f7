// 该文件是 Kahao （卡号） 项目的一部分。
// src/output.rs - 输出
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

use serde::Serialize;
use thiserror::Error;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::RawFrame,
  model::Detection,
  pipeline::{CardRecord, FrameResult},
};

pub trait Render<Frame, Output>: Sized {
  type Error;
  fn render_result(&self, frame: &Frame, result: &Output) -> Result<(), Self::Error>;
}

mod stdout;
pub use self::stdout::{StdoutOutput, StdoutOutputError};

#[cfg(feature = "directory_record")]
mod directory_record;
#[cfg(feature = "directory_record")]
pub use self::directory_record::{DirectoryRecordOutput, DirectoryRecordOutputError};

/// 输出 URL 上的通用查询参数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
  /// 未识别的帧也输出
  pub always: bool,
  /// 附带 NMS 后的检测框
  pub detections: bool,
}

impl RenderOptions {
  pub fn from_url(url: &Url) -> Self {
    Self {
      always: url.query_pairs().any(|(k, _)| k == "always"),
      detections: url.query_pairs().any(|(k, _)| k == "detections"),
    }
  }

  pub fn accepts(&self, result: &FrameResult) -> bool {
    self.always || result.record.is_some()
  }
}

/// 按输出选项裁剪后的帧结果
#[derive(Serialize)]
pub(crate) struct ResultView<'a> {
  index: u64,
  #[serde(skip_serializing_if = "Option::is_none")]
  detections: Option<&'a [Detection]>,
  record: Option<&'a CardRecord>,
}

impl<'a> ResultView<'a> {
  pub(crate) fn new(result: &'a FrameResult, options: &RenderOptions) -> Self {
    Self {
      index: result.index,
      detections: options.detections.then_some(result.detections.as_slice()),
      record: result.record.as_ref(),
    }
  }
}

#[derive(Error, Debug)]
pub enum OutputError {
  #[error("标准输出错误: {0}")]
  StdoutOutputError(#[from] StdoutOutputError),
  #[cfg(feature = "directory_record")]
  #[error("目录记录输出错误: {0}")]
  DirectoryRecordOutputError(#[from] DirectoryRecordOutputError),
  #[error("URI 方案不匹配")]
  SchemeMismatch,
}

pub enum OutputWrapper {
  Stdout(StdoutOutput),
  #[cfg(feature = "directory_record")]
  DirectoryRecordOutput(DirectoryRecordOutput),
}

impl FromUrl for OutputWrapper {
  type Error = OutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    match url.scheme() {
      StdoutOutput::SCHEME => {
        let output = StdoutOutput::from_url(url)?;
        Ok(OutputWrapper::Stdout(output))
      }
      #[cfg(feature = "directory_record")]
      DirectoryRecordOutput::SCHEME => {
        let output = DirectoryRecordOutput::from_url(url)?;
        Ok(OutputWrapper::DirectoryRecordOutput(output))
      }
      _ => Err(OutputError::SchemeMismatch),
    }
  }
}

impl Render<RawFrame, FrameResult> for OutputWrapper {
  type Error = OutputError;

  fn render_result(&self, frame: &RawFrame, result: &FrameResult) -> Result<(), Self::Error> {
    match self {
      OutputWrapper::Stdout(output) => output
        .render_result(frame, result)
        .map_err(OutputError::from),
      #[cfg(feature = "directory_record")]
      OutputWrapper::DirectoryRecordOutput(output) => output
        .render_result(frame, result)
        .map_err(OutputError::from),
    }
  }
}
