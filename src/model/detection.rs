// 该文件是 Kahao （卡号） 项目的一部分。
// src/model/detection.rs - 检测结果定义
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

/// 轴对齐边界框 [x_min, y_min, x_max, y_max]
///
/// 构造时保证 `min <= max`，之后不可变。
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BBox {
  min_x: f32,
  min_y: f32,
  max_x: f32,
  max_y: f32,
}

impl BBox {
  /// 坐标非有限值或 `min > max` 时返回 `None`
  pub fn new(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Option<Self> {
    let finite = [min_x, min_y, max_x, max_y].iter().all(|v| v.is_finite());
    if !finite || min_x > max_x || min_y > max_y {
      return None;
    }
    Some(Self {
      min_x,
      min_y,
      max_x,
      max_y,
    })
  }

  /// 由中心点和宽高构造（YOLO 输出格式）
  pub fn from_center(cx: f32, cy: f32, w: f32, h: f32) -> Option<Self> {
    if w < 0.0 || h < 0.0 {
      return None;
    }
    Self::new(cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0)
  }

  /// 两个角点张成的框，角点顺序任意
  pub(crate) fn spanning(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
    Self {
      min_x: x0.min(x1),
      min_y: y0.min(y1),
      max_x: x0.max(x1),
      max_y: y0.max(y1),
    }
  }

  pub fn min_x(&self) -> f32 {
    self.min_x
  }

  pub fn min_y(&self) -> f32 {
    self.min_y
  }

  pub fn max_x(&self) -> f32 {
    self.max_x
  }

  pub fn max_y(&self) -> f32 {
    self.max_y
  }

  pub fn width(&self) -> f32 {
    self.max_x - self.min_x
  }

  pub fn height(&self) -> f32 {
    self.max_y - self.min_y
  }

  pub fn area(&self) -> f32 {
    self.width() * self.height()
  }

  /// 计算两个边界框的 IoU
  pub fn iou(&self, other: &BBox) -> f32 {
    let x1 = self.min_x.max(other.min_x);
    let y1 = self.min_y.max(other.min_y);
    let x2 = self.max_x.min(other.max_x);
    let y2 = self.max_y.min(other.max_y);

    let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    let union = self.area() + other.area() - intersection;

    if union > 0.0 {
      intersection / union
    } else {
      0.0
    }
  }

  /// `inner` 的四条边都严格位于本框内部
  pub fn strictly_contains(&self, inner: &BBox) -> bool {
    inner.min_y > self.min_y
      && inner.max_y < self.max_y
      && inner.min_x > self.min_x
      && inner.max_x < self.max_x
  }

  /// 本框整体位于 `other` 的上方（不相交）
  pub fn is_strictly_above(&self, other: &BBox) -> bool {
    self.max_y < other.min_y
  }
}

/// 单个检测结果：字形或锚框
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Detection {
  class_index: u32,
  confidence: f32,
  bbox: BBox,
}

impl Detection {
  pub fn new(class_index: u32, confidence: f32, bbox: BBox) -> Self {
    Self {
      class_index,
      confidence,
      bbox,
    }
  }

  pub fn class_index(&self) -> u32 {
    self.class_index
  }

  pub fn confidence(&self) -> f32 {
    self.confidence
  }

  pub fn bbox(&self) -> &BBox {
    &self.bbox
  }

  /// 换一个边界框，得到新的检测结果
  pub(crate) fn with_bbox(self, bbox: BBox) -> Self {
    Self { bbox, ..self }
  }
}
