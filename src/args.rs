// 该文件是 Kahao （卡号） 项目的一部分。
// src/args.rs - 命令行参数
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

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use url::Url;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskKind {
  /// 只处理第一帧
  Oneshot,
  /// 逐帧处理，识别成功即停止
  Continuous,
}

/// Kahao 卡号识别回放参数
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 标签文件，第 N 行对应类别 N
  #[arg(long, value_name = "FILE", default_value = "labels/card.txt")]
  pub labels: PathBuf,

  /// 输入来源
  /// 支持格式:
  /// - raw:///path/to/output.bin
  /// - folder:///path/to/dir
  /// - jsonl:///path/to/frames.jsonl
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,

  /// 输出
  /// 支持格式:
  /// - stdout://[?always][&detections]
  /// - folder:///path/to/dir[?always][&detections][&raw]
  #[arg(long, value_name = "OUTPUT", default_value = "stdout://")]
  pub output: Url,

  /// 流水线配置文件（TOML）
  #[arg(long, value_name = "FILE")]
  pub config: Option<PathBuf>,

  /// 置信度阈值 (0.0 - 1.0)，覆盖配置文件
  #[arg(long, value_name = "THRESHOLD")]
  pub confidence: Option<f32>,

  /// NMS IOU 阈值 (0.0 - 1.0)，覆盖配置文件
  #[arg(long, value_name = "THRESHOLD")]
  pub nms_threshold: Option<f32>,

  /// 任务类型
  #[arg(long, value_enum, default_value_t = TaskKind::Continuous)]
  pub task: TaskKind,

  /// 最大处理帧数
  #[arg(long, value_name = "COUNT")]
  pub frame_number: Option<usize>,

  /// 两次识别之间的最小间隔（毫秒）
  #[arg(long, value_name = "MS", default_value_t = 0)]
  pub min_interval_ms: u64,

  /// 识别成功后继续处理后续帧
  #[arg(long)]
  pub keep_going: bool,
}
