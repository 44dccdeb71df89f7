// 该文件是 Kahao （卡号） 项目的一部分。
// src/config.rs - 流水线配置
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

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::{
  decode::OutputLayout,
  field::{AnchorPolicy, LINE_GLYPHS, LinePolicy},
  geometry::{Rect, ScaleParams, square_crop},
  nms::NmsConfig,
  validate::ExpiryWindow,
};

#[derive(Error, Debug)]
pub enum ConfigError {
  #[error("无法读取配置文件 {path}: {source}")]
  Io {
    path: String,
    source: std::io::Error,
  },
  #[error("配置文件格式错误: {0}")]
  Parse(#[from] toml::de::Error),
  #[error("配置无效: {0}")]
  Invalid(String),
}

/// 模型输出相关配置
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelConfig {
  /// 类别数量，缺省时取标签表长度
  pub num_classes: Option<usize>,
  /// 输出中是否带 objectness 列
  pub objectness: bool,
  /// 模型输入宽度
  pub input_width: f32,
  /// 模型输入高度
  pub input_height: f32,
}

impl Default for ModelConfig {
  fn default() -> Self {
    Self {
      num_classes: None,
      objectness: true,
      input_width: 640.0,
      input_height: 640.0,
    }
  }
}

impl ModelConfig {
  pub fn layout(&self, label_count: usize) -> OutputLayout {
    let num_classes = self.num_classes.unwrap_or(label_count);
    if self.objectness {
      OutputLayout::yolov5(num_classes)
    } else {
      OutputLayout::anchor_free(num_classes)
    }
  }
}

fn default_image_scale() -> f32 {
  1.0
}

/// 取景框裁剪：检测框会被换算回整幅图像坐标
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CropConfig {
  /// 屏幕上的取景框
  pub guide: Rect,
  /// 屏幕坐标到图像坐标的比例
  #[serde(default = "default_image_scale")]
  pub image_scale: f32,
  /// 图像坐标到视图坐标的比例，缺省不换算
  pub view_scale: Option<(f32, f32)>,
}

/// 流水线整体配置，各项均有默认值
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
  pub model: ModelConfig,
  pub nms: NmsConfig,
  pub anchor_policy: AnchorPolicy,
  pub lines: LinePolicy,
  pub expiry: ExpiryWindow,
  pub crop: Option<CropConfig>,
}

impl PipelineConfig {
  pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
    let path = path.as_ref();
    info!("加载配置文件: {}", path.display());
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
      path: path.display().to_string(),
      source,
    })?;
    Self::from_toml_str(&contents)
  }

  pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
    let config: PipelineConfig = toml::from_str(contents)?;
    config.validate()?;
    Ok(config)
  }

  pub fn validate(&self) -> Result<(), ConfigError> {
    let unit = 0.0f32..=1.0;
    if !unit.contains(&self.nms.confidence_threshold) {
      return Err(ConfigError::Invalid(format!(
        "置信度阈值 {} 不在 [0, 1] 内",
        self.nms.confidence_threshold
      )));
    }
    if !unit.contains(&self.nms.iou_threshold) {
      return Err(ConfigError::Invalid(format!(
        "NMS IOU 阈值 {} 不在 [0, 1] 内",
        self.nms.iou_threshold
      )));
    }
    if self.lines.probe_positions.is_empty() {
      return Err(ConfigError::Invalid("双行判定位置不能为空".to_string()));
    }
    if let Some(p) = self.lines.probe_positions.iter().find(|&&p| p >= LINE_GLYPHS) {
      return Err(ConfigError::Invalid(format!(
        "双行判定位置 {} 超出每行 {} 个字形",
        p, LINE_GLYPHS
      )));
    }
    if self.expiry.year_min > self.expiry.year_max || self.expiry.year_max > 99 {
      return Err(ConfigError::Invalid(format!(
        "年份范围 [{}, {}] 无效",
        self.expiry.year_min, self.expiry.year_max
      )));
    }
    if !(self.model.input_width > 0.0 && self.model.input_height > 0.0) {
      return Err(ConfigError::Invalid(format!(
        "模型输入尺寸 {}x{} 无效",
        self.model.input_width, self.model.input_height
      )));
    }
    if self.crop.is_some() && self.scale_params().is_none() {
      return Err(ConfigError::Invalid("裁剪参数无效".to_string()));
    }
    Ok(())
  }

  /// 由裁剪配置求坐标换算参数；未配置裁剪时为恒等换算
  pub fn scale_params(&self) -> Option<ScaleParams> {
    let Some(crop) = &self.crop else {
      return Some(ScaleParams::identity());
    };
    let region = square_crop(&crop.guide, crop.image_scale);
    let scale = ScaleParams::from_crop(
      &region,
      self.model.input_width,
      self.model.input_height,
    )?;
    match crop.view_scale {
      Some((x, y)) => scale.with_view_scale(x, y),
      None => Some(scale),
    }
  }
}
