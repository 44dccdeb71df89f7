// 该文件是 Kahao （卡号） 项目的一部分。
// src/frame.rs - 原始输出帧定义
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

/// 一帧模型原始输出：扁平的 `f32` 缓冲区
#[derive(Debug, Clone, PartialEq)]
pub struct RawFrame {
  index: u64,
  data: Box<[f32]>,
}

impl From<Vec<f32>> for RawFrame {
  fn from(data: Vec<f32>) -> Self {
    Self {
      index: 0,
      data: data.into_boxed_slice(),
    }
  }
}

impl RawFrame {
  pub fn with_index(mut self, index: u64) -> Self {
    self.index = index;
    self
  }

  pub fn index(&self) -> u64 {
    self.index
  }

  pub fn len(&self) -> usize {
    self.data.len()
  }

  pub fn is_empty(&self) -> bool {
    self.data.is_empty()
  }

  /// 按小端序解析字节；长度不是 4 的倍数时返回 `None`
  pub fn from_le_bytes(bytes: &[u8]) -> Option<Self> {
    if bytes.len() % 4 != 0 {
      return None;
    }
    let data: Vec<f32> = bytes
      .chunks_exact(4)
      .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
      .collect();
    Some(Self::from(data))
  }

  pub fn to_le_bytes(&self) -> Vec<u8> {
    self.data.iter().flat_map(|v| v.to_le_bytes()).collect()
  }
}

impl AsRef<[f32]> for RawFrame {
  fn as_ref(&self) -> &[f32] {
    &self.data
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_le_bytes() {
    let frame = RawFrame::from(vec![1.0, -0.5, 640.0]).with_index(7);
    let bytes = frame.to_le_bytes();
    assert_eq!(bytes.len(), 12);
    let parsed = RawFrame::from_le_bytes(&bytes).unwrap();
    assert_eq!(parsed.as_ref(), &[1.0, -0.5, 640.0]);
    assert_eq!(parsed.index(), 0);
    assert!(RawFrame::from_le_bytes(&bytes[..11]).is_none());
  }
}
