// 该文件是 Kahao （卡号） 项目的一部分。
// src/error.rs - 单帧错误定义
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

use crate::field::Field;

/// 模型输出缓冲区格式错误；解码整体失败，不产生任何检测结果
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
  #[error("输出缓冲区为空")]
  EmptyBuffer,
  #[error("输出布局无类别")]
  NoClasses,
  #[error("缓冲区长度 {len} 不是步长 {stride} 的整数倍")]
  StrideMismatch { len: usize, stride: usize },
  #[error("候选框 {candidate} 含有非有限值")]
  NonFinite { candidate: usize },
  #[error("候选框 {candidate} 宽高为负")]
  NegativeExtent { candidate: usize },
  #[error("候选框 {candidate} 置信度 {confidence} 超出 [0, 1]")]
  ScoreOutOfRange { candidate: usize, confidence: f32 },
}

/// 字段校验失败
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
  #[error("卡号校验和错误")]
  Checksum,
  #[error("月份无效: {0:?}")]
  Month(String),
  #[error("年份无效: {0:?}")]
  Year(String),
  #[error("有效期格式错误: {0:?}")]
  MalformedExpiry(String),
  #[error("类别 {0} 没有对应的标签")]
  UnknownGlyph(u32),
}

/// 单帧流水线错误。
///
/// 全部是帧内的、非致命的：调用方丢弃这一帧，在下一帧重试。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FrameError {
  #[error("解码失败: {0}")]
  DecodeFailure(#[from] DecodeError),
  #[error("未找到{field}区域")]
  AnchorNotFound { field: Field },
  #[error("{field}字形数量不符: 期望 {expected}, 实际 {found}")]
  FieldCountMismatch {
    field: Field,
    expected: usize,
    found: usize,
  },
  #[error("校验失败: {0}")]
  ValidationFailed(#[from] ValidationError),
}
