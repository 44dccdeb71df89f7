// 该文件是 Kahao （卡号） 项目的一部分。
// src/stream.rs - 帧流控制：限流、在途帧互斥与取消
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

use std::{
  iter::FusedIterator,
  sync::{
    Arc,
    atomic::{AtomicBool, AtomicU64, Ordering},
  },
  thread,
  time::{Duration, Instant},
};

use tracing::{debug, info, warn};

use crate::pipeline::{CardRecord, CardScanner};

/// 两次推理之间的默认最小间隔
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(200);

const NEVER: u64 = u64::MAX;

/// 无锁的最小间隔限流器，超出频率的帧直接丢弃
#[derive(Debug)]
pub struct RateLimiter {
  origin: Instant,
  min_interval: u64,
  last: AtomicU64,
}

impl Default for RateLimiter {
  fn default() -> Self {
    Self::new(DEFAULT_MIN_INTERVAL)
  }
}

impl RateLimiter {
  pub fn new(min_interval: Duration) -> Self {
    Self {
      origin: Instant::now(),
      min_interval: u64::try_from(min_interval.as_nanos()).unwrap_or(u64::MAX),
      last: AtomicU64::new(NEVER),
    }
  }

  pub fn min_interval(&self) -> Duration {
    Duration::from_nanos(self.min_interval)
  }

  pub fn try_admit(&self) -> bool {
    self.try_admit_at(Instant::now())
  }

  /// 距上次放行不少于最小间隔时放行，并记下 `now`
  pub fn try_admit_at(&self, now: Instant) -> bool {
    let now = u64::try_from(now.saturating_duration_since(self.origin).as_nanos())
      .unwrap_or(NEVER - 1);
    let mut last = self.last.load(Ordering::Acquire);
    loop {
      if last != NEVER && now.saturating_sub(last) < self.min_interval {
        return false;
      }
      match self
        .last
        .compare_exchange_weak(last, now, Ordering::AcqRel, Ordering::Acquire)
      {
        Ok(_) => return true,
        Err(actual) => last = actual,
      }
    }
  }
}

/// 同一时刻最多一帧在处理中
#[derive(Debug, Default)]
pub struct FrameGate {
  busy: AtomicBool,
}

impl FrameGate {
  pub fn new() -> Self {
    Self::default()
  }

  /// 已有帧在处理时返回 `None`，调用方应丢弃当前帧
  pub fn try_enter(&self) -> Option<FrameGuard<'_>> {
    self
      .busy
      .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
      .ok()
      .map(|_| FrameGuard { gate: self })
  }

  pub fn is_busy(&self) -> bool {
    self.busy.load(Ordering::Acquire)
  }
}

#[derive(Debug)]
pub struct FrameGuard<'a> {
  gate: &'a FrameGate,
}

impl Drop for FrameGuard<'_> {
  fn drop(&mut self) {
    self.gate.busy.store(false, Ordering::Release);
  }
}

#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn cancel(&self) {
    self.0.store(true, Ordering::Release);
  }

  pub fn is_cancelled(&self) -> bool {
    self.0.load(Ordering::Acquire)
  }

  /// 收到 Ctrl-C 时取消；30 秒内仍未退出则强制退出进程
  pub fn install_ctrlc(&self) -> Result<(), ctrlc::Error> {
    let token = self.clone();
    ctrlc::set_handler(move || {
      info!("收到中断信号，准备退出...");
      token.cancel();
      thread::spawn(|| {
        thread::sleep(Duration::from_secs(30));
        warn!("强制退出程序");
        std::process::exit(1);
      });
    })
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Offer {
  /// 上一帧仍在处理
  Dropped,
  /// 距上次推理太近
  Throttled,
  Scanned(Option<CardRecord>),
}

/// 可从任意线程投递帧的识别器
#[derive(Debug)]
pub struct SharedScanner {
  scanner: Arc<CardScanner>,
  gate: FrameGate,
  limiter: RateLimiter,
}

impl SharedScanner {
  pub fn new(scanner: Arc<CardScanner>, min_interval: Duration) -> Self {
    Self {
      scanner,
      gate: FrameGate::new(),
      limiter: RateLimiter::new(min_interval),
    }
  }

  pub fn scanner(&self) -> &CardScanner {
    &self.scanner
  }

  pub fn offer(&self, buffer: &[f32]) -> Offer {
    let Some(_guard) = self.gate.try_enter() else {
      debug!("上一帧仍在处理，丢弃本帧");
      return Offer::Dropped;
    };
    if !self.limiter.try_admit() {
      return Offer::Throttled;
    }
    Offer::Scanned(self.scanner.scan(buffer))
  }
}

/// 逐帧识别的惰性迭代器，每个放行的帧产生一项。
///
/// 输入耗尽或取消后结束，不可重启。
pub struct ScanStream<'a, I> {
  scanner: &'a CardScanner,
  frames: I,
  limiter: RateLimiter,
  cancel: CancelToken,
  done: bool,
}

impl<'a, I> ScanStream<'a, I>
where
  I: Iterator,
  I::Item: AsRef<[f32]>,
{
  pub fn new(scanner: &'a CardScanner, frames: I) -> Self {
    Self {
      scanner,
      frames,
      limiter: RateLimiter::new(Duration::ZERO),
      cancel: CancelToken::new(),
      done: false,
    }
  }

  pub fn with_min_interval(mut self, min_interval: Duration) -> Self {
    self.limiter = RateLimiter::new(min_interval);
    self
  }

  pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
    self.cancel = cancel;
    self
  }
}

impl<I> Iterator for ScanStream<'_, I>
where
  I: Iterator,
  I::Item: AsRef<[f32]>,
{
  type Item = Option<CardRecord>;

  fn next(&mut self) -> Option<Self::Item> {
    while !self.done {
      if self.cancel.is_cancelled() {
        debug!("识别流已取消");
        self.done = true;
        break;
      }
      let Some(frame) = self.frames.next() else {
        self.done = true;
        break;
      };
      if self.limiter.try_admit() {
        return Some(self.scanner.scan(frame.as_ref()));
      }
    }
    None
  }
}

impl<I> FusedIterator for ScanStream<'_, I>
where
  I: Iterator,
  I::Item: AsRef<[f32]>,
{
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::PipelineConfig;

  fn scanner() -> CardScanner {
    CardScanner::new(
      "0\n1\n2\n3\n4\n5\n6\n7\n8\n9\n/\nnumber\ndate".parse().unwrap(),
      PipelineConfig::default(),
    )
    .unwrap()
  }

  #[test]
  fn test_rate_limiter_interval() {
    let limiter = RateLimiter::default();
    assert_eq!(limiter.min_interval(), Duration::from_millis(200));
    let t0 = Instant::now();
    assert!(limiter.try_admit_at(t0));
    assert!(!limiter.try_admit_at(t0 + Duration::from_millis(100)));
    assert!(limiter.try_admit_at(t0 + Duration::from_millis(200)));
    assert!(!limiter.try_admit_at(t0 + Duration::from_millis(399)));
    assert!(limiter.try_admit_at(t0 + Duration::from_millis(450)));
  }

  #[test]
  fn test_zero_interval_admits_everything() {
    let limiter = RateLimiter::new(Duration::ZERO);
    let t0 = Instant::now();
    assert!(limiter.try_admit_at(t0));
    assert!(limiter.try_admit_at(t0));
    assert!(limiter.try_admit());
  }

  #[test]
  fn test_frame_gate() {
    let gate = FrameGate::new();
    let guard = gate.try_enter();
    assert!(guard.is_some());
    assert!(gate.is_busy());
    assert!(gate.try_enter().is_none());
    drop(guard);
    assert!(!gate.is_busy());
    assert!(gate.try_enter().is_some());
  }

  #[test]
  fn test_offer_drops_while_busy() {
    let shared = SharedScanner::new(Arc::new(scanner()), Duration::from_secs(3600));
    {
      let _busy = shared.gate.try_enter();
      assert_eq!(shared.offer(&[]), Offer::Dropped);
    }
    assert_eq!(shared.offer(&[]), Offer::Scanned(None));
    assert_eq!(shared.offer(&[]), Offer::Throttled);
  }

  #[test]
  fn test_offer_from_many_threads() {
    let shared = Arc::new(SharedScanner::new(Arc::new(scanner()), Duration::ZERO));
    let handles: Vec<_> = (0..4)
      .map(|_| {
        let shared = Arc::clone(&shared);
        thread::spawn(move || {
          (0..50)
            .map(|_| shared.offer(&[0.5; 17]))
            .filter(|offer| matches!(offer, Offer::Scanned(None) | Offer::Dropped))
            .count()
        })
      })
      .collect();
    for handle in handles {
      assert_eq!(handle.join().unwrap(), 50);
    }
    assert!(!shared.gate.is_busy());
  }

  #[test]
  fn test_scan_stream_yields_per_frame_and_cancels() {
    let scanner = scanner();
    let frames = vec![vec![0.5f32; 17]; 3];
    let results: Vec<_> = ScanStream::new(&scanner, frames.iter()).collect();
    assert_eq!(results, vec![None, None, None]);

    let cancel = CancelToken::new();
    let mut stream = ScanStream::new(&scanner, std::iter::repeat(vec![0.5f32; 17]))
      .with_cancel(cancel.clone());
    assert_eq!(stream.next(), Some(None));
    assert_eq!(stream.next(), Some(None));
    cancel.cancel();
    assert_eq!(stream.next(), None);
    assert_eq!(stream.next(), None);
  }

  #[test]
  fn test_scan_stream_throttles() {
    let scanner = scanner();
    let frames = vec![vec![0.5f32; 17]; 5];
    let results: Vec<_> = ScanStream::new(&scanner, frames.into_iter())
      .with_min_interval(Duration::from_secs(3600))
      .collect();
    assert_eq!(results.len(), 1);
  }
}
