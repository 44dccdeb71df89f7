// 该文件是 Kahao （卡号） 项目的一部分。
// src/field/reconcile.rs - 单行/双行卡号判定
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

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Field, NUMBER_GLYPHS, grouper::check_count, sort_by_x, sort_by_y};
use crate::{error::FrameError, model::Detection};

/// 双行卡号每行的字形数量
pub const LINE_GLYPHS: usize = NUMBER_GLYPHS / 2;

/// 双行判定策略：这是按卡面字体调出来的经验规则，可按需调整
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LinePolicy {
  /// 逐一比较两行中这些位置上的字形，全部“上行在下行之上”才判为双行
  pub probe_positions: Vec<usize>,
}

impl Default for LinePolicy {
  fn default() -> Self {
    Self {
      probe_positions: vec![0, 3, 5],
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LineLayout {
  Single,
  Double,
}

/// 重排后的卡号字形，顺序即读出顺序
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciledNumber {
  pub layout: LineLayout,
  pub glyphs: Vec<Detection>,
}

/// 判断卡号是一行还是上下两行，并给出相应的字形顺序。
///
/// `number` 是按 x 升序、数量已校验的卡号字形。
pub fn reconcile_lines(
  number: &[Detection],
  policy: &LinePolicy,
) -> Result<ReconciledNumber, FrameError> {
  check_count(Field::CardNumber, NUMBER_GLYPHS, number.len())?;

  let mut by_y = number.to_vec();
  sort_by_y(&mut by_y);
  let mut line2 = by_y.split_off(LINE_GLYPHS);
  let mut line1 = by_y;
  sort_by_x(&mut line1);
  sort_by_x(&mut line2);

  // 没有判定位置时不能认定为双行
  let stacked = !policy.probe_positions.is_empty()
    && policy
      .probe_positions
      .iter()
      .all(|&p| match (line1.get(p), line2.get(p)) {
        (Some(upper), Some(lower)) => upper.bbox().is_strictly_above(lower.bbox()),
        _ => false,
      });

  if stacked {
    debug!("卡号判定为双行");
    line1.extend(line2);
    Ok(ReconciledNumber {
      layout: LineLayout::Double,
      glyphs: line1,
    })
  } else {
    debug!("卡号判定为单行");
    Ok(ReconciledNumber {
      layout: LineLayout::Single,
      glyphs: number.to_vec(),
    })
  }
}
