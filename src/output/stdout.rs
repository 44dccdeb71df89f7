// 该文件是 Kahao （卡号） 项目的一部分。
// src/output/stdout.rs - 标准输出
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

use std::io::Write;

use thiserror::Error;

use super::{Render, RenderOptions, ResultView};
use crate::{FromUrl, FromUrlWithScheme, frame::RawFrame, pipeline::FrameResult};

#[derive(Error, Debug)]
pub enum StdoutOutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("JSON 序列化错误: {0}")]
  JsonError(#[from] serde_json::Error),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
}

/// 每帧一行 JSON：`stdout://?always&detections`
#[derive(Debug, Default)]
pub struct StdoutOutput {
  options: RenderOptions,
}

impl FromUrlWithScheme for StdoutOutput {
  const SCHEME: &'static str = "stdout";
}

impl FromUrl for StdoutOutput {
  type Error = StdoutOutputError;

  fn from_url(url: &url::Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(StdoutOutputError::SchemeMismatch);
    }
    Ok(StdoutOutput {
      options: RenderOptions::from_url(url),
    })
  }
}

impl StdoutOutput {
  /// 需要输出时返回这一帧的 JSON 行
  pub fn line(&self, result: &FrameResult) -> Result<Option<String>, StdoutOutputError> {
    if !self.options.accepts(result) {
      return Ok(None);
    }
    let view = ResultView::new(result, &self.options);
    Ok(Some(serde_json::to_string(&view)?))
  }
}

impl Render<RawFrame, FrameResult> for StdoutOutput {
  type Error = StdoutOutputError;

  fn render_result(&self, _frame: &RawFrame, result: &FrameResult) -> Result<(), Self::Error> {
    if let Some(line) = self.line(result)? {
      let mut stdout = std::io::stdout().lock();
      writeln!(stdout, "{}", line)?;
    }
    Ok(())
  }
}
