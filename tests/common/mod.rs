// 该文件是 Kahao （卡号） 项目的一部分。
// tests/common/mod.rs - 集成测试公共夹具
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

#![allow(dead_code)]

use std::path::PathBuf;

use kahao::{CardScanner, LabelTable, PipelineConfig};

pub const NUM_CLASSES: usize = 13;
pub const STRIDE: usize = 4 + 1 + NUM_CLASSES;

pub const SEPARATOR: u32 = 10;
pub const NUMBER_ANCHOR: u32 = 11;
pub const DATE_ANCHOR: u32 = 12;

/// 一个候选框，左上角加宽高
#[derive(Debug, Clone, Copy)]
pub struct Candidate {
  pub class_index: u32,
  pub confidence: f32,
  pub x: f32,
  pub y: f32,
  pub w: f32,
  pub h: f32,
}

impl Candidate {
  pub fn new(class_index: u32, confidence: f32, x: f32, y: f32, w: f32, h: f32) -> Self {
    Self {
      class_index,
      confidence,
      x,
      y,
      w,
      h,
    }
  }
}

/// 按 `[cx, cy, w, h, obj, one-hot classes]` 编码成模型原始输出
pub fn encode(candidates: &[Candidate]) -> Vec<f32> {
  let mut buffer = Vec::with_capacity(candidates.len() * STRIDE);
  for c in candidates {
    buffer.extend([c.x + c.w / 2.0, c.y + c.h / 2.0, c.w, c.h, c.confidence]);
    let mut scores = [0.0f32; NUM_CLASSES];
    scores[c.class_index as usize] = c.confidence;
    buffer.extend(scores);
  }
  buffer
}

fn class_of(c: char) -> u32 {
  c.to_digit(10).unwrap_or(SEPARATOR)
}

/// 一行数字字形，宽 16 高 30，间距 19
pub fn number_row(digits: &str, x: f32, y: f32) -> Vec<Candidate> {
  digits
    .chars()
    .enumerate()
    .map(|(i, c)| Candidate::new(class_of(c), 0.9, x + i as f32 * 19.0, y, 16.0, 30.0))
    .collect()
}

/// 有效期字形，宽 16 高 20
pub fn date_row(date: &str) -> Vec<Candidate> {
  date
    .chars()
    .enumerate()
    .map(|(i, c)| Candidate::new(class_of(c), 0.88, 205.0 + i as f32 * 19.0, 225.0, 16.0, 20.0))
    .collect()
}

pub fn anchors() -> Vec<Candidate> {
  vec![
    Candidate::new(NUMBER_ANCHOR, 0.95, 10.0, 100.0, 320.0, 100.0),
    Candidate::new(DATE_ANCHOR, 0.93, 200.0, 220.0, 130.0, 40.0),
  ]
}

/// 两行卡号 "45320151" / "12830366"，有效期 01/25
pub fn two_line_card() -> Vec<Candidate> {
  let mut candidates = anchors();
  candidates.extend(number_row("45320151", 20.0, 110.0));
  candidates.extend(number_row("12830366", 20.0, 160.0));
  candidates.extend(date_row("01/25"));
  candidates
}

pub fn single_line_card(number: &str, date: &str) -> Vec<Candidate> {
  let mut candidates = anchors();
  candidates.extend(number_row(number, 15.0, 140.0));
  candidates.extend(date_row(date));
  candidates
}

/// 加入重复框与低置信度噪声
pub fn with_noise(mut candidates: Vec<Candidate>) -> Vec<Candidate> {
  let duplicates: Vec<Candidate> = candidates
    .iter()
    .map(|c| Candidate::new(c.class_index, c.confidence * 0.8, c.x + 1.0, c.y + 1.0, c.w, c.h))
    .collect();
  candidates.extend(duplicates);
  candidates.push(Candidate::new(7, 0.1, 60.0, 140.0, 16.0, 30.0));
  candidates.push(Candidate::new(3, 0.05, 400.0, 400.0, 16.0, 30.0));
  candidates
}

pub fn labels_path() -> PathBuf {
  PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("labels/card.txt")
}

pub fn labels() -> LabelTable {
  LabelTable::from_path(labels_path()).unwrap()
}

pub fn scanner() -> CardScanner {
  CardScanner::new(labels(), PipelineConfig::default()).unwrap()
}
