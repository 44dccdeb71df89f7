// 该文件是 Kahao （卡号） 项目的一部分。
// src/field/locator.rs - 锚框定位
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
use tracing::debug;

use super::{CARD_NUMBER_ANCHOR, EXPIRY_ANCHOR, Field};
use crate::{error::FrameError, model::Detection};

/// 同一类别出现多个锚框时的取舍策略
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnchorPolicy {
  /// 按 x 升序遍历，最后一个胜出（沿用线上行为，待产品确认）
  #[default]
  LastInXOrder,
  /// 置信度最高者胜出，并列时 x 较小者胜出
  HighestConfidence,
}

impl AnchorPolicy {
  fn pick<'a>(&self, candidates: impl Iterator<Item = &'a Detection>) -> Option<&'a Detection> {
    match self {
      AnchorPolicy::LastInXOrder => candidates.last(),
      AnchorPolicy::HighestConfidence => candidates.fold(None, |best, det| match best {
        Some(best) if best.confidence() >= det.confidence() => Some(best),
        _ => Some(det),
      }),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchors {
  pub number: Detection,
  pub expiry: Detection,
}

/// 在按 x 升序排列的检测结果中找出卡号与有效期锚框
pub fn locate_anchors(by_x: &[Detection], policy: AnchorPolicy) -> Result<Anchors, FrameError> {
  let of_class = |class| by_x.iter().filter(move |det| det.class_index() == class);

  let number = policy
    .pick(of_class(CARD_NUMBER_ANCHOR))
    .ok_or(FrameError::AnchorNotFound {
      field: Field::CardNumber,
    })?;
  let expiry = policy
    .pick(of_class(EXPIRY_ANCHOR))
    .ok_or(FrameError::AnchorNotFound {
      field: Field::ExpiryDate,
    })?;

  debug!("卡号区域: {:?}", number.bbox());
  debug!("有效期区域: {:?}", expiry.bbox());

  Ok(Anchors {
    number: *number,
    expiry: *expiry,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{field::testing::glyph, model::BBox};

  fn anchor(class_index: u32, confidence: f32, min_x: f32) -> Detection {
    Detection::new(
      class_index,
      confidence,
      BBox::new(min_x, 0.0, min_x + 100.0, 50.0).unwrap(),
    )
  }

  #[test]
  fn test_both_anchors_found() {
    let detections = vec![
      glyph(4, 5.0, 5.0, 10.0, 10.0),
      anchor(CARD_NUMBER_ANCHOR, 0.8, 0.0),
      anchor(EXPIRY_ANCHOR, 0.7, 200.0),
    ];
    let anchors = locate_anchors(&detections, AnchorPolicy::default()).unwrap();
    assert_eq!(anchors.number.class_index(), CARD_NUMBER_ANCHOR);
    assert_eq!(anchors.expiry.class_index(), EXPIRY_ANCHOR);
  }

  #[test]
  fn test_missing_anchor() {
    let detections = vec![anchor(CARD_NUMBER_ANCHOR, 0.8, 0.0)];
    assert_eq!(
      locate_anchors(&detections, AnchorPolicy::default()),
      Err(FrameError::AnchorNotFound {
        field: Field::ExpiryDate
      })
    );
    let detections = vec![anchor(EXPIRY_ANCHOR, 0.8, 0.0)];
    assert_eq!(
      locate_anchors(&detections, AnchorPolicy::default()),
      Err(FrameError::AnchorNotFound {
        field: Field::CardNumber
      })
    );
  }

  #[test]
  fn test_duplicate_anchor_policies() {
    let detections = vec![
      anchor(CARD_NUMBER_ANCHOR, 0.9, 0.0),
      anchor(CARD_NUMBER_ANCHOR, 0.5, 40.0),
      anchor(EXPIRY_ANCHOR, 0.6, 200.0),
      anchor(EXPIRY_ANCHOR, 0.6, 300.0),
    ];

    let last = locate_anchors(&detections, AnchorPolicy::LastInXOrder).unwrap();
    assert_eq!(last.number.bbox().min_x(), 40.0);
    assert_eq!(last.expiry.bbox().min_x(), 300.0);

    let best = locate_anchors(&detections, AnchorPolicy::HighestConfidence).unwrap();
    assert_eq!(best.number.bbox().min_x(), 0.0);
    assert_eq!(best.expiry.bbox().min_x(), 200.0);
  }
}
