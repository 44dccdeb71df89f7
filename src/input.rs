// 该文件是 Kahao （卡号） 项目的一部分。
// src/input.rs - 输入
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

use thiserror::Error;

use crate::{FromUrl, frame::RawFrame};

#[cfg(feature = "raw_file_input")]
mod directory;
#[cfg(feature = "raw_file_input")]
mod raw_file;
#[cfg(feature = "raw_file_input")]
pub use self::directory::DirectoryInput;
#[cfg(feature = "raw_file_input")]
pub use self::raw_file::{RawFileInput, RawFileInputError, read_raw_file};

#[cfg(feature = "json_lines_input")]
mod json_lines;
#[cfg(feature = "json_lines_input")]
pub use self::json_lines::{JsonLinesInput, JsonLinesInputError};

#[derive(Error, Debug)]
pub enum InputError {
  #[cfg(feature = "raw_file_input")]
  #[error("原始输出文件输入错误: {0}")]
  RawFileInputError(#[from] RawFileInputError),
  #[cfg(feature = "json_lines_input")]
  #[error("JSON Lines 输入错误: {0}")]
  JsonLinesInputError(#[from] JsonLinesInputError),
  #[error("URI 方案不匹配")]
  SchemeMismatch,
}

/// 按 URL 方案选择的输入源
pub enum InputWrapper {
  #[cfg(feature = "raw_file_input")]
  RawFile(RawFileInput),
  #[cfg(feature = "raw_file_input")]
  Directory(DirectoryInput),
  #[cfg(feature = "json_lines_input")]
  JsonLines(JsonLinesInput),
}

impl FromUrl for InputWrapper {
  type Error = InputError;

  fn from_url(url: &url::Url) -> Result<Self, Self::Error> {
    #[cfg(feature = "raw_file_input")]
    {
      use crate::FromUrlWithScheme;

      if url.scheme() == RawFileInput::SCHEME {
        return Ok(InputWrapper::RawFile(RawFileInput::from_url(url)?));
      }
      if url.scheme() == DirectoryInput::SCHEME {
        return Ok(InputWrapper::Directory(DirectoryInput::from_url(url)?));
      }
    }
    #[cfg(feature = "json_lines_input")]
    {
      use crate::FromUrlWithScheme;

      if url.scheme() == JsonLinesInput::SCHEME {
        return Ok(InputWrapper::JsonLines(JsonLinesInput::from_url(url)?));
      }
    }
    Err(InputError::SchemeMismatch)
  }
}

impl Iterator for InputWrapper {
  type Item = RawFrame;

  fn next(&mut self) -> Option<Self::Item> {
    match self {
      #[cfg(feature = "raw_file_input")]
      InputWrapper::RawFile(input) => input.next(),
      #[cfg(feature = "raw_file_input")]
      InputWrapper::Directory(input) => input.next(),
      #[cfg(feature = "json_lines_input")]
      InputWrapper::JsonLines(input) => input.next(),
    }
  }
}
