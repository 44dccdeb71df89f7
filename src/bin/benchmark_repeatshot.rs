// 该文件是 Kahao （卡号） 项目的一部分。
// src/bin/benchmark_repeatshot.rs - 重复处理同一帧，统计后处理耗时
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

use anyhow::Result;
use clap::Parser;
use url::Url;

use kahao::{
  CardScanner, FromUrl, LabelTable, PipelineConfig,
  input::InputWrapper,
  model::Replay,
  output::OutputWrapper,
  task::{DEFAULT_REPEAT, RepeatShotTask, Task},
};
use tracing::info;

/// Kahao 后处理基准测试参数
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 标签文件
  #[arg(long, value_name = "FILE", default_value = "labels/card.txt")]
  pub labels: PathBuf,
  /// 流水线配置文件（TOML）
  #[arg(long, value_name = "FILE")]
  pub config: Option<PathBuf>,
  /// 输入来源
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,
  /// 输出路径
  #[arg(long, value_name = "OUTPUT", default_value = "stdout://")]
  pub output: Url,
  /// 重复次数
  #[arg(long, default_value_t = DEFAULT_REPEAT)]
  pub repeat: usize,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("标签文件: {}", args.labels.display());
  info!("输入来源: {}", args.input);
  info!("输出路径: {}", args.output);

  let config = match &args.config {
    Some(path) => PipelineConfig::from_path(path)?,
    None => PipelineConfig::default(),
  };
  let scanner = CardScanner::new(LabelTable::from_path(&args.labels)?, config)?;
  let input = InputWrapper::from_url(&args.input)?;
  let output = OutputWrapper::from_url(&args.output)?;

  let record = RepeatShotTask::new(&scanner)
    .with_repeat(args.repeat)
    .run_task(input, Replay, output)?;
  if let Some(record) = record {
    info!("识别结果:\n{}", record);
  }

  Ok(())
}
