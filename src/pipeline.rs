// 该文件是 Kahao （卡号） 项目的一部分。
// src/pipeline.rs - 单帧识别流水线
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

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::{
  config::{ConfigError, PipelineConfig},
  decode::{OutputLayout, decode},
  error::{FrameError, ValidationError},
  field::{
    self, EXPIRY_ANCHOR, Field, NUMBER_GLYPHS, group_glyphs, locate_anchors, reconcile_lines,
  },
  geometry::ScaleParams,
  model::{Detection, LabelTable},
  nms::non_max_suppression,
  validate::{split_expiry, validate_month, validate_number, validate_year},
};

/// 识别成功的卡片信息，只有全部校验通过才会产生
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardRecord {
  pub card_number: String,
  pub card_month: String,
  pub card_year: String,
}

impl CardRecord {
  /// 每 4 位一组、空格分隔的卡号
  pub fn grouped_number(&self) -> String {
    let chars: Vec<char> = self.card_number.chars().collect();
    chars
      .chunks(4)
      .map(|chunk| chunk.iter().collect::<String>())
      .collect::<Vec<_>>()
      .join(" ")
  }
}

impl fmt::Display for CardRecord {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "{}", self.grouped_number())?;
    write!(f, "{}/{}", self.card_month, self.card_year)
  }
}

/// 一帧的处理结果：NMS 后的检测结果（供外部叠加显示）以及可能的卡片信息
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameResult {
  pub index: u64,
  pub detections: Vec<Detection>,
  pub record: Option<CardRecord>,
}

#[derive(Error, Debug)]
pub enum ScannerError {
  #[error(transparent)]
  Config(#[from] ConfigError),
  #[error("输出布局没有类别")]
  NoClasses,
  #[error("输出布局只有 {0} 个类别，无法包含卡号与有效期锚框")]
  MissingAnchorClasses(usize),
  #[error("标签表只有 {labels} 项，少于模型类别数 {classes}")]
  LabelsTooShort { labels: usize, classes: usize },
}

/// 识别上下文：标签表、输出布局、配置与坐标换算参数。
///
/// 构造后只读，可在多个线程间共享。
#[derive(Debug, Clone)]
pub struct CardScanner {
  labels: LabelTable,
  layout: OutputLayout,
  config: PipelineConfig,
  scale: ScaleParams,
}

impl CardScanner {
  pub fn new(labels: LabelTable, config: PipelineConfig) -> Result<Self, ScannerError> {
    config.validate()?;
    let layout = config.model.layout(labels.len());
    let classes = layout.num_classes();
    if classes == 0 {
      return Err(ScannerError::NoClasses);
    }
    if classes <= EXPIRY_ANCHOR as usize {
      return Err(ScannerError::MissingAnchorClasses(classes));
    }
    if labels.len() < classes {
      return Err(ScannerError::LabelsTooShort {
        labels: labels.len(),
        classes,
      });
    }
    let scale = config
      .scale_params()
      .ok_or_else(|| ConfigError::Invalid("裁剪参数无效".to_string()))?;
    debug!("输出布局: {} 个类别, 步长 {}", classes, layout.stride());
    Ok(Self {
      labels,
      layout,
      config,
      scale,
    })
  }

  /// 覆盖由配置求得的坐标换算参数
  pub fn with_scale(mut self, scale: ScaleParams) -> Self {
    self.scale = scale;
    self
  }

  pub fn labels(&self) -> &LabelTable {
    &self.labels
  }

  pub fn layout(&self) -> &OutputLayout {
    &self.layout
  }

  pub fn config(&self) -> &PipelineConfig {
    &self.config
  }

  pub fn scale(&self) -> &ScaleParams {
    &self.scale
  }

  /// 解码并做 NMS；缓冲区格式错误时返回空列表
  pub fn detect(&self, buffer: &[f32]) -> Vec<Detection> {
    match decode(buffer, &self.layout) {
      Ok(detections) => non_max_suppression(detections, &self.config.nms, &self.scale),
      Err(e) => {
        debug!("丢弃本帧输出: {}", e);
        Vec::new()
      }
    }
  }

  pub fn try_scan(&self, buffer: &[f32]) -> Result<CardRecord, FrameError> {
    let detections = decode(buffer, &self.layout)?;
    let detections = non_max_suppression(detections, &self.config.nms, &self.scale);
    self.assemble(detections)
  }

  /// 单帧识别，失败时记录原因并返回 `None`
  pub fn scan(&self, buffer: &[f32]) -> Option<CardRecord> {
    match self.try_scan(buffer) {
      Ok(record) => Some(record),
      Err(e) => {
        debug!("本帧未识别: {}", e);
        None
      }
    }
  }

  pub fn scan_frame(&self, index: u64, buffer: &[f32]) -> FrameResult {
    let detections = self.detect(buffer);
    let record = match self.assemble(detections.clone()) {
      Ok(record) => Some(record),
      Err(e) => {
        debug!("第 {} 帧未识别: {}", index, e);
        None
      }
    };
    FrameResult {
      index,
      detections,
      record,
    }
  }

  /// 从 NMS 后的检测结果组装卡片信息
  pub fn assemble(&self, mut detections: Vec<Detection>) -> Result<CardRecord, FrameError> {
    field::sort_by_x(&mut detections);

    let anchors = locate_anchors(&detections, self.config.anchor_policy)?;
    let groups = group_glyphs(&detections, &anchors)?;
    debug!(
      "字形平均置信度: 卡号 {:.3}, 有效期 {:.3}",
      mean_confidence(&groups.number),
      mean_confidence(&groups.date)
    );

    let reconciled = reconcile_lines(&groups.number, &self.config.lines)?;
    let card_number = self.spell(&reconciled.glyphs)?;
    let found = card_number.chars().count();
    if found != NUMBER_GLYPHS {
      return Err(FrameError::FieldCountMismatch {
        field: Field::CardNumber,
        expected: NUMBER_GLYPHS,
        found,
      });
    }

    let date = self.spell(&groups.date)?;
    let (card_month, card_year) = split_expiry(&date)?;

    validate_number(&card_number)?;
    validate_month(&card_month)?;
    validate_year(&card_year, &self.config.expiry)?;

    debug!("识别成功: {} {}", card_number, date);
    Ok(CardRecord {
      card_number,
      card_month,
      card_year,
    })
  }

  fn spell(&self, glyphs: &[Detection]) -> Result<String, ValidationError> {
    glyphs
      .iter()
      .map(|det| {
        self
          .labels
          .symbol(det.class_index())
          .ok_or(ValidationError::UnknownGlyph(det.class_index()))
      })
      .collect()
  }
}

fn mean_confidence(glyphs: &[Detection]) -> f32 {
  if glyphs.is_empty() {
    return 0.0;
  }
  glyphs.iter().map(Detection::confidence).sum::<f32>() / glyphs.len() as f32
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    field::{CARD_NUMBER_ANCHOR, testing::row},
    model::BBox,
  };

  const LABELS: &str = "0\n1\n2\n3\n4\n5\n6\n7\n8\n9\n/\nnumber\ndate\n";

  fn scanner() -> CardScanner {
    CardScanner::new(LABELS.parse().unwrap(), PipelineConfig::default()).unwrap()
  }

  fn anchor(class_index: u32, min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Detection {
    Detection::new(
      class_index,
      0.95,
      BBox::new(min_x, min_y, max_x, max_y).unwrap(),
    )
  }

  fn date_row(date: &str) -> Vec<Detection> {
    row(date, 205.0, 225.0)
      .into_iter()
      .map(|det| {
        let b = det.bbox();
        det.with_bbox(BBox::new(b.min_x(), b.min_y(), b.max_x(), b.min_y() + 20.0).unwrap())
      })
      .collect()
  }

  fn card(lines: &[(&str, f32)], date: &str) -> Vec<Detection> {
    let mut detections = vec![
      anchor(CARD_NUMBER_ANCHOR, 10.0, 100.0, 330.0, 200.0),
      anchor(EXPIRY_ANCHOR, 200.0, 220.0, 330.0, 260.0),
    ];
    for (digits, y) in lines {
      detections.extend(row(digits, 15.0, *y));
    }
    detections.extend(date_row(date));
    detections
  }

  #[test]
  fn test_card_record_display() {
    let record = CardRecord {
      card_number: "4532015112830366".to_string(),
      card_month: "01".to_string(),
      card_year: "25".to_string(),
    };
    assert_eq!(record.grouped_number(), "4532 0151 1283 0366");
    assert_eq!(record.to_string(), "4532 0151 1283 0366\n01/25");
    assert_eq!(
      serde_json::to_string(&record).unwrap(),
      r#"{"cardNumber":"4532015112830366","cardMonth":"01","cardYear":"25"}"#
    );
  }

  #[test]
  fn test_assemble_single_line() {
    let record = scanner()
      .assemble(card(&[("4111111111111111", 140.0)], "12/30"))
      .unwrap();
    assert_eq!(record.card_number, "4111111111111111");
    assert_eq!(record.card_month, "12");
    assert_eq!(record.card_year, "30");
  }

  #[test]
  fn test_assemble_two_lines() {
    let record = scanner()
      .assemble(card(&[("45320151", 110.0), ("12830366", 160.0)], "01/25"))
      .unwrap();
    assert_eq!(record.card_number, "4532015112830366");
  }

  #[test]
  fn test_assemble_failures() {
    let scanner = scanner();
    assert_eq!(
      scanner.assemble(card(&[("4111111111111112", 140.0)], "12/30")),
      Err(FrameError::ValidationFailed(ValidationError::Checksum))
    );
    assert_eq!(
      scanner.assemble(card(&[("4111111111111111", 140.0)], "13/30")),
      Err(FrameError::ValidationFailed(ValidationError::Month(
        "13".to_string()
      )))
    );
    assert_eq!(
      scanner.assemble(card(&[("4111111111111111", 140.0)], "12/51")),
      Err(FrameError::ValidationFailed(ValidationError::Year(
        "51".to_string()
      )))
    );

    let mut no_expiry = card(&[("4111111111111111", 140.0)], "12/30");
    no_expiry.retain(|det| det.class_index() != EXPIRY_ANCHOR);
    assert_eq!(
      scanner.assemble(no_expiry),
      Err(FrameError::AnchorNotFound {
        field: Field::ExpiryDate
      })
    );
  }

  #[test]
  fn test_unknown_glyph() {
    let labels: LabelTable = LABELS.parse().unwrap();
    let config = PipelineConfig {
      model: crate::config::ModelConfig {
        num_classes: Some(14),
        ..Default::default()
      },
      ..Default::default()
    };
    assert!(matches!(
      CardScanner::new(labels.clone(), config),
      Err(ScannerError::LabelsTooShort {
        labels: 13,
        classes: 14
      })
    ));

    let mut detections = card(&[("4111111111111111", 140.0)], "12/30");
    let last = detections.len() - 1;
    detections[last] = Detection::new(20, 0.9, *detections[last].bbox());
    assert_eq!(
      scanner().assemble(detections),
      Err(FrameError::ValidationFailed(ValidationError::UnknownGlyph(20)))
    );

    // 标签为空字符串的类别会让卡号少一个字符
    let labels: LabelTable = "0\n1\n2\n3\n\n5\n6\n7\n8\n9\n/\nnumber\ndate\n"
      .parse()
      .unwrap();
    let scanner = CardScanner::new(labels, PipelineConfig::default()).unwrap();
    assert!(matches!(
      scanner.assemble(card(&[("4111111111111111", 140.0)], "12/30")),
      Err(FrameError::FieldCountMismatch { found: 15, .. })
    ));
  }

  #[test]
  fn test_too_few_classes() {
    let labels: LabelTable = "0\n1\n2".parse().unwrap();
    assert!(matches!(
      CardScanner::new(labels, PipelineConfig::default()),
      Err(ScannerError::MissingAnchorClasses(3))
    ));
  }

  #[test]
  fn test_malformed_buffer_is_no_record() {
    let scanner = scanner();
    assert!(scanner.detect(&[0.5; 17]).is_empty());
    assert!(scanner.scan(&[0.5; 17]).is_none());
    assert!(matches!(
      scanner.try_scan(&[]),
      Err(FrameError::DecodeFailure(_))
    ));
    let result = scanner.scan_frame(3, &[f32::NAN; 18]);
    assert_eq!(result.index, 3);
    assert!(result.detections.is_empty());
    assert!(result.record.is_none());
  }

  #[test]
  fn test_scanner_is_shareable() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<CardScanner>();
  }
}
