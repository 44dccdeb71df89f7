// 该文件是 Kahao （卡号） 项目的一部分。
// src/geometry.rs - 取景框与坐标换算
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

use serde::Deserialize;

use crate::model::BBox;

/// 左上角加宽高表示的矩形，用于屏幕取景框和裁剪区域
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Rect {
  pub x: f32,
  pub y: f32,
  pub width: f32,
  pub height: f32,
}

impl Rect {
  pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
    Self {
      x,
      y,
      width,
      height,
    }
  }
}

/// 由屏幕取景框求送入模型的正方形裁剪区域（图像坐标）。
///
/// 边长取取景框长边乘以 `image_scale`，短边方向居中扩展。
pub fn square_crop(guide: &Rect, image_scale: f32) -> Rect {
  let w = guide.width * image_scale;
  let h = guide.height * image_scale;
  let x = guide.x * image_scale;
  let y = guide.y * image_scale;

  if guide.width > guide.height {
    Rect::new(x, y - (w - h) / 2.0, w, w)
  } else {
    Rect::new(x - (h - w) / 2.0, y, h, h)
  }
}

/// 模型输入坐标到目标坐标的仿射换算:
/// `x' = start_x + iv_scale_x * img_scale_x * x`（y 同理）。
///
/// `img_scale` 把模型输入尺寸换算到图像尺寸，`iv_scale` 把图像换算到视图。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleParams {
  img_scale_x: f32,
  img_scale_y: f32,
  iv_scale_x: f32,
  iv_scale_y: f32,
  start_x: f32,
  start_y: f32,
}

impl Default for ScaleParams {
  fn default() -> Self {
    Self::identity()
  }
}

fn valid_scale(v: f32) -> bool {
  v.is_finite() && v > 0.0
}

impl ScaleParams {
  pub const fn identity() -> Self {
    Self {
      img_scale_x: 1.0,
      img_scale_y: 1.0,
      iv_scale_x: 1.0,
      iv_scale_y: 1.0,
      start_x: 0.0,
      start_y: 0.0,
    }
  }

  /// 缩放系数必须为正的有限值，起点必须有限
  pub fn new(
    img_scale: (f32, f32),
    iv_scale: (f32, f32),
    start: (f32, f32),
  ) -> Option<Self> {
    let scales = [img_scale.0, img_scale.1, iv_scale.0, iv_scale.1];
    if !scales.into_iter().all(valid_scale) || !start.0.is_finite() || !start.1.is_finite() {
      return None;
    }
    Some(Self {
      img_scale_x: img_scale.0,
      img_scale_y: img_scale.1,
      iv_scale_x: iv_scale.0,
      iv_scale_y: iv_scale.1,
      start_x: start.0,
      start_y: start.1,
    })
  }

  /// 模型输入（`input_width` x `input_height`）对应图像中的 `crop` 区域
  pub fn from_crop(crop: &Rect, input_width: f32, input_height: f32) -> Option<Self> {
    if !valid_scale(input_width) || !valid_scale(input_height) {
      return None;
    }
    Self::new(
      (crop.width / input_width, crop.height / input_height),
      (1.0, 1.0),
      (crop.x, crop.y),
    )
  }

  /// 继续换算到视图坐标；起点一并缩放
  pub fn with_view_scale(self, iv_scale_x: f32, iv_scale_y: f32) -> Option<Self> {
    Self::new(
      (self.img_scale_x, self.img_scale_y),
      (iv_scale_x, iv_scale_y),
      (self.start_x * iv_scale_x, self.start_y * iv_scale_y),
    )
  }

  pub fn is_identity(&self) -> bool {
    *self == Self::identity()
  }

  pub fn apply(&self, bbox: &BBox) -> BBox {
    let sx = self.iv_scale_x * self.img_scale_x;
    let sy = self.iv_scale_y * self.img_scale_y;
    BBox::spanning(
      self.start_x + sx * bbox.min_x(),
      self.start_y + sy * bbox.min_y(),
      self.start_x + sx * bbox.max_x(),
      self.start_y + sy * bbox.max_y(),
    )
  }
}
