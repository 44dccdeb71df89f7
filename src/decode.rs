// 该文件是 Kahao （卡号） 项目的一部分。
// src/decode.rs - 模型输出解码
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

use tracing::debug;

use crate::{
  error::DecodeError,
  model::{BBox, Detection},
};

const BOX_COLUMNS: usize = 4;

/// 每个候选框的输出布局:
/// `[cx, cy, w, h, (objectness), class_score_0 .. class_score_{n-1}]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputLayout {
  num_classes: usize,
  objectness: bool,
}

impl OutputLayout {
  /// YOLOv5 导出格式：带 objectness 列
  pub const fn yolov5(num_classes: usize) -> Self {
    Self {
      num_classes,
      objectness: true,
    }
  }

  /// 无 objectness 列，置信度取最高类别分数
  pub const fn anchor_free(num_classes: usize) -> Self {
    Self {
      num_classes,
      objectness: false,
    }
  }

  pub const fn num_classes(&self) -> usize {
    self.num_classes
  }

  pub const fn has_objectness(&self) -> bool {
    self.objectness
  }

  pub const fn stride(&self) -> usize {
    BOX_COLUMNS + self.objectness as usize + self.num_classes
  }

  const fn class_offset(&self) -> usize {
    BOX_COLUMNS + self.objectness as usize
  }
}

/// 把扁平输出解码为检测结果列表。
///
/// 任何一个候选框格式错误，整个缓冲区都视为无效，不返回部分结果。
pub fn decode(buffer: &[f32], layout: &OutputLayout) -> Result<Vec<Detection>, DecodeError> {
  if layout.num_classes == 0 {
    return Err(DecodeError::NoClasses);
  }
  if buffer.is_empty() {
    return Err(DecodeError::EmptyBuffer);
  }

  let stride = layout.stride();
  if buffer.len() % stride != 0 {
    return Err(DecodeError::StrideMismatch {
      len: buffer.len(),
      stride,
    });
  }

  let mut detections = Vec::with_capacity(buffer.len() / stride);
  for (candidate, row) in buffer.chunks_exact(stride).enumerate() {
    if row.iter().any(|v| !v.is_finite()) {
      return Err(DecodeError::NonFinite { candidate });
    }

    // 找到最高类别分数，相同分数取靠前的类别
    let scores = &row[layout.class_offset()..];
    let mut max_class_score = scores[0];
    let mut max_class_id = 0usize;
    for (class_id, &score) in scores.iter().enumerate().skip(1) {
      if score > max_class_score {
        max_class_score = score;
        max_class_id = class_id;
      }
    }

    let confidence = if layout.objectness {
      row[BOX_COLUMNS]
    } else {
      max_class_score
    };
    if !(0.0..=1.0).contains(&confidence) {
      return Err(DecodeError::ScoreOutOfRange {
        candidate,
        confidence,
      });
    }

    let bbox = BBox::from_center(row[0], row[1], row[2], row[3])
      .ok_or(DecodeError::NegativeExtent { candidate })?;

    detections.push(Detection::new(max_class_id as u32, confidence, bbox));
  }

  debug!("解码得到 {} 个候选框", detections.len());
  Ok(detections)
}
