// 该文件是 Kahao （卡号） 项目的一部分。
// src/model.rs - 模型
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

use std::convert::Infallible;

use crate::frame::RawFrame;

/// 推理协作方。
///
/// 模型加载与推理不属于本库；实现者只需把一帧输入变成一段扁平的 `f32`
/// 输出缓冲区，其布局由 [`crate::decode::OutputLayout`] 描述。
pub trait Model {
  type Input;
  type Output: AsRef<[f32]>;
  type Error;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error>;
}

/// 回放模型：输入已经是录制好的原始输出，原样返回
#[derive(Debug, Default, Clone, Copy)]
pub struct Replay;

impl Model for Replay {
  type Input = RawFrame;
  type Output = RawFrame;
  type Error = Infallible;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    Ok(input.clone())
  }
}

mod detection;
mod labels;

pub use self::detection::{BBox, Detection};
pub use self::labels::{LabelError, LabelTable};
