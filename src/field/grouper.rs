// 该文件是 Kahao （卡号） 项目的一部分。
// src/field/grouper.rs - 字形分组
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

use super::{Anchors, DATE_GLYPHS, Field, NUMBER_GLYPHS, is_anchor};
use crate::{error::FrameError, model::Detection};

/// 落在两个锚框内的字形，保持 x 升序
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphGroups {
  pub number: Vec<Detection>,
  pub date: Vec<Detection>,
}

/// 把字形分配给严格包含它的锚框：先试卡号，再试有效期，都不在则丢弃。
///
/// `by_x` 需按 x 升序排列。
pub fn group_glyphs(by_x: &[Detection], anchors: &Anchors) -> Result<GlyphGroups, FrameError> {
  let mut number = Vec::with_capacity(NUMBER_GLYPHS);
  let mut date = Vec::with_capacity(DATE_GLYPHS);

  for det in by_x.iter().filter(|det| !is_anchor(det.class_index())) {
    if anchors.number.bbox().strictly_contains(det.bbox()) {
      number.push(*det);
    } else if anchors.expiry.bbox().strictly_contains(det.bbox()) {
      date.push(*det);
    }
  }

  debug!("卡号字形 {} 个, 有效期字形 {} 个", number.len(), date.len());

  check_count(Field::CardNumber, NUMBER_GLYPHS, number.len())?;
  check_count(Field::ExpiryDate, DATE_GLYPHS, date.len())?;

  Ok(GlyphGroups { number, date })
}

pub(crate) fn check_count(field: Field, expected: usize, found: usize) -> Result<(), FrameError> {
  if expected != found {
    return Err(FrameError::FieldCountMismatch {
      field,
      expected,
      found,
    });
  }
  Ok(())
}
