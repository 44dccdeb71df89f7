// 该文件是 Kahao （卡号） 项目的一部分。
// src/task.rs - 任务
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

use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::{
  frame::RawFrame,
  model::Model,
  output::Render,
  pipeline::{CardRecord, CardScanner, FrameResult},
  stream::{CancelToken, RateLimiter},
};

pub trait Task<I, M, O>: Sized {
  type Error;
  /// 运行任务，返回识别到的卡片信息
  fn run_task(self, input: I, model: M, output: O) -> Result<Option<CardRecord>, Self::Error>;
}

fn process_frame<M, O, ME, RE>(
  scanner: &CardScanner,
  model: &M,
  output: &O,
  frame: &RawFrame,
) -> Result<FrameResult, anyhow::Error>
where
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  M: Model<Input = RawFrame, Error = ME>,
  O: Render<RawFrame, FrameResult, Error = RE>,
{
  let buffer = model.infer(frame)?;
  let result = scanner.scan_frame(frame.index(), buffer.as_ref());
  output.render_result(frame, &result)?;
  Ok(result)
}

pub struct OneShotTask<'a> {
  scanner: &'a CardScanner,
}

impl<'a> OneShotTask<'a> {
  pub fn new(scanner: &'a CardScanner) -> Self {
    Self { scanner }
  }
}

impl<ME, RE, I, M, O> Task<I, M, O> for OneShotTask<'_>
where
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = RawFrame>,
  M: Model<Input = RawFrame, Error = ME>,
  O: Render<RawFrame, FrameResult, Error = RE>,
{
  type Error = anyhow::Error;

  fn run_task(self, mut input: I, model: M, output: O) -> Result<Option<CardRecord>, Self::Error> {
    info!("开始任务...");
    let frame = input.next().ok_or_else(|| anyhow::anyhow!("没有输入帧"))?;
    info!("输入帧获取成功，开始识别...");
    let now = Instant::now();
    let result = process_frame(self.scanner, &model, &output, &frame)?;
    info!("识别完成，耗时: {:.2?}", now.elapsed());
    Ok(result.record)
  }
}

/// 基准测试默认重复次数
pub const DEFAULT_REPEAT: usize = 1000;

/// 对同一帧重复处理，统计平均耗时
pub struct RepeatShotTask<'a> {
  scanner: &'a CardScanner,
  repeat: usize,
}

impl<'a> RepeatShotTask<'a> {
  /// 计算平均值时跳过的预热次数
  const WARMUP: usize = 2;

  pub fn new(scanner: &'a CardScanner) -> Self {
    Self {
      scanner,
      repeat: DEFAULT_REPEAT,
    }
  }

  pub fn with_repeat(mut self, repeat: usize) -> Self {
    self.repeat = repeat.max(1);
    self
  }
}

impl<ME, RE, I, M, O> Task<I, M, O> for RepeatShotTask<'_>
where
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = RawFrame>,
  M: Model<Input = RawFrame, Error = ME>,
  O: Render<RawFrame, FrameResult, Error = RE>,
{
  type Error = anyhow::Error;

  fn run_task(self, mut input: I, model: M, output: O) -> Result<Option<CardRecord>, Self::Error> {
    info!("开始任务...");
    let frame = input.next().ok_or_else(|| anyhow::anyhow!("没有输入帧"))?;
    info!("输入帧获取成功，重复识别 {} 次...", self.repeat);
    let mut times = Vec::with_capacity(self.repeat);
    let mut record = None;
    for i in 0..self.repeat {
      let now = Instant::now();
      let result = process_frame(self.scanner, &model, &output, &frame)?;
      let elapsed = now.elapsed();
      debug!("({})识别完成，耗时: {:.2?}", i, elapsed);
      times.push(elapsed);
      record = result.record;
    }

    let measured = if times.len() > Self::WARMUP {
      &times[Self::WARMUP..]
    } else {
      &times[..]
    };
    warn!(
      "平均识别时间: {:.2?}",
      measured.iter().sum::<Duration>() / measured.len() as u32
    );

    Ok(record)
  }
}

/// 连续处理输入帧，直到识别成功、达到帧数、输入耗尽或被取消
pub struct ContinuousTask<'a> {
  scanner: &'a CardScanner,
  frame_number: Option<usize>,
  min_interval: Duration,
  cancel: CancelToken,
  keep_going: bool,
}

impl<'a> ContinuousTask<'a> {
  pub fn new(scanner: &'a CardScanner) -> Self {
    Self {
      scanner,
      frame_number: None,
      min_interval: Duration::ZERO,
      cancel: CancelToken::new(),
      keep_going: false,
    }
  }

  /// 最多读取的输入帧数，因间隔过短被跳过的帧也计入
  pub fn with_frame_number(mut self, frame_number: Option<usize>) -> Self {
    self.frame_number = frame_number;
    self
  }

  pub fn with_min_interval(mut self, min_interval: Duration) -> Self {
    self.min_interval = min_interval;
    self
  }

  pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
    self.cancel = cancel;
    self
  }

  /// 识别成功后不停止，继续处理后续帧
  pub fn with_keep_going(mut self, keep_going: bool) -> Self {
    self.keep_going = keep_going;
    self
  }
}

impl<ME, RE, I, M, O> Task<I, M, O> for ContinuousTask<'_>
where
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = RawFrame>,
  M: Model<Input = RawFrame, Error = ME>,
  O: Render<RawFrame, FrameResult, Error = RE>,
{
  type Error = anyhow::Error;

  fn run_task(self, input: I, model: M, output: O) -> Result<Option<CardRecord>, Self::Error> {
    info!("开始任务...");
    let limiter = RateLimiter::new(self.min_interval);
    let mut frame_count = 0usize;
    let mut record = None;
    let mut now = Instant::now();
    for frame in input {
      if self.cancel.is_cancelled() {
        warn!("中断信号接收，退出任务循环");
        break;
      }
      frame_count = frame_count.saturating_add(1);
      let reached = self.frame_number.is_some_and(|n| frame_count >= n);

      if limiter.try_admit() {
        debug!("处理第 {} 帧", frame.index());
        let result = process_frame(self.scanner, &model, &output, &frame)?;
        debug!("识别完成，耗时: {:.2?}", now.elapsed());
        now = Instant::now();

        if let Some(found) = result.record {
          info!("第 {} 帧识别成功", frame.index());
          record = Some(found);
          if !self.keep_going {
            break;
          }
        }
      } else {
        debug!("第 {} 帧间隔过短，跳过", frame.index());
      }

      if reached {
        info!("达到指定帧数 {}, 退出任务循环", frame_count);
        break;
      }
    }

    info!("任务完成，共 {} 帧", frame_count);
    Ok(record)
  }
}
