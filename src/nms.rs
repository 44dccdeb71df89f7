// 该文件是 Kahao （卡号） 项目的一部分。
// src/nms.rs - 非极大值抑制
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

use crate::{geometry::ScaleParams, model::Detection};

pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.25;
pub const DEFAULT_IOU_THRESHOLD: f32 = 0.45;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NmsConfig {
  /// 置信度阈值，低于该值的候选框直接丢弃
  pub confidence_threshold: f32,
  /// NMS IOU 阈值，同类框 IoU 超过该值即被抑制
  pub iou_threshold: f32,
  /// 最多保留的检测数量
  pub max_detections: Option<usize>,
}

impl Default for NmsConfig {
  fn default() -> Self {
    Self {
      confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
      iou_threshold: DEFAULT_IOU_THRESHOLD,
      max_detections: None,
    }
  }
}

/// 按类别独立做贪心 NMS，再把保留下来的框换算到目标坐标。
///
/// 置信度相同的候选框保持输入顺序，先出现的优先保留。
/// 输出按置信度降序排列。
pub fn non_max_suppression(
  detections: Vec<Detection>,
  config: &NmsConfig,
  scale: &ScaleParams,
) -> Vec<Detection> {
  let mut candidates: Vec<Detection> = detections
    .into_iter()
    .filter(|det| det.confidence() >= config.confidence_threshold)
    .collect();

  // 稳定排序，保证并列时先出现者胜出
  candidates.sort_by(|a, b| b.confidence().total_cmp(&a.confidence()));

  let mut kept: Vec<Detection> = Vec::new();
  for candidate in candidates {
    if config.max_detections.is_some_and(|limit| kept.len() >= limit) {
      break;
    }

    let suppressed = kept.iter().any(|best| {
      best.class_index() == candidate.class_index()
        && best.bbox().iou(candidate.bbox()) > config.iou_threshold
    });
    if !suppressed {
      kept.push(candidate);
    }
  }

  debug!("NMS 后保留 {} 个检测结果", kept.len());

  if scale.is_identity() {
    return kept;
  }
  kept
    .into_iter()
    .map(|det| {
      let bbox = scale.apply(det.bbox());
      det.with_bbox(bbox)
    })
    .collect()
}
