// 该文件是 Kahao （卡号） 项目的一部分。
// src/main.rs - 卡号识别回放
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

mod args;

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

use kahao::{
  CardScanner, FromUrl, LabelTable, PipelineConfig,
  input::InputWrapper,
  model::Replay,
  output::OutputWrapper,
  stream::CancelToken,
  task::{ContinuousTask, OneShotTask, Task},
};

use args::{Args, TaskKind};

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("标签文件: {}", args.labels.display());
  info!("输入来源: {}", args.input);
  info!("输出路径: {}", args.output);

  let mut config = match &args.config {
    Some(path) => PipelineConfig::from_path(path)?,
    None => PipelineConfig::default(),
  };
  if let Some(confidence) = args.confidence {
    config.nms.confidence_threshold = confidence;
  }
  if let Some(iou) = args.nms_threshold {
    config.nms.iou_threshold = iou;
  }
  info!(
    "置信度阈值: {}, NMS 阈值: {}",
    config.nms.confidence_threshold, config.nms.iou_threshold
  );

  let labels = LabelTable::from_path(&args.labels)?;
  let scanner = CardScanner::new(labels, config)?;

  let input = InputWrapper::from_url(&args.input)?;
  let output = OutputWrapper::from_url(&args.output)?;

  let record = match args.task {
    TaskKind::Oneshot => OneShotTask::new(&scanner).run_task(input, Replay, output)?,
    TaskKind::Continuous => {
      let cancel = CancelToken::new();
      cancel.install_ctrlc()?;
      ContinuousTask::new(&scanner)
        .with_frame_number(args.frame_number)
        .with_min_interval(Duration::from_millis(args.min_interval_ms))
        .with_keep_going(args.keep_going)
        .with_cancel(cancel)
        .run_task(input, Replay, output)?
    }
  };

  match record {
    Some(record) => info!("识别结果:\n{}", record),
    None => warn!("未识别到卡号"),
  }

  Ok(())
}
