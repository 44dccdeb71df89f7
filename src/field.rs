// 该文件是 Kahao （卡号） 项目的一部分。
// src/field.rs - 卡号/有效期字段定位与字形分组
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

use std::fmt;

use serde::Serialize;

use crate::model::Detection;

/// 卡号区域锚框的类别
pub const CARD_NUMBER_ANCHOR: u32 = 11;
/// 有效期区域锚框的类别
pub const EXPIRY_ANCHOR: u32 = 12;

/// 卡号字形数量
pub const NUMBER_GLYPHS: usize = 16;
/// 有效期字形数量：4 位数字加 1 个分隔符
pub const DATE_GLYPHS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
  CardNumber,
  ExpiryDate,
}

impl fmt::Display for Field {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Field::CardNumber => write!(f, "卡号"),
      Field::ExpiryDate => write!(f, "有效期"),
    }
  }
}

pub fn is_anchor(class_index: u32) -> bool {
  class_index == CARD_NUMBER_ANCHOR || class_index == EXPIRY_ANCHOR
}

/// 按左边界升序稳定排序
pub fn sort_by_x(detections: &mut [Detection]) {
  detections.sort_by(|a, b| a.bbox().min_x().total_cmp(&b.bbox().min_x()));
}

/// 按上边界升序稳定排序
pub fn sort_by_y(detections: &mut [Detection]) {
  detections.sort_by(|a, b| a.bbox().min_y().total_cmp(&b.bbox().min_y()));
}

mod grouper;
mod locator;
mod reconcile;

pub use self::grouper::{GlyphGroups, group_glyphs};
pub use self::locator::{AnchorPolicy, Anchors, locate_anchors};
pub use self::reconcile::{LINE_GLYPHS, LineLayout, LinePolicy, ReconciledNumber, reconcile_lines};
