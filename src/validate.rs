// 该文件是 Kahao （卡号） 项目的一部分。
// src/validate.rs - 字段校验
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

use crate::error::ValidationError;

/// Luhn 校验；含非数字字符时返回 `false`
pub fn luhn(number: &str) -> bool {
  let mut sum = 0u32;
  for (i, c) in number.chars().rev().enumerate() {
    let Some(digit) = c.to_digit(10) else {
      return false;
    };
    sum += match (i % 2 == 1, digit) {
      (true, 9) => 9,
      (true, d) => (d * 2) % 9,
      (false, d) => d,
    };
  }
  sum % 10 == 0
}

/// 两位年份的接受范围。
///
/// 固定窗口，与日历无关，需要随时间调整。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExpiryWindow {
  pub year_min: u32,
  pub year_max: u32,
}

impl Default for ExpiryWindow {
  fn default() -> Self {
    Self {
      year_min: 10,
      year_max: 50,
    }
  }
}

fn parse_two_digits(s: &str) -> Option<u32> {
  if s.len() != 2 || !s.bytes().all(|b| b.is_ascii_digit()) {
    return None;
  }
  s.parse().ok()
}

pub fn validate_month(month: &str) -> Result<u32, ValidationError> {
  parse_two_digits(month)
    .filter(|m| (1..=12).contains(m))
    .ok_or_else(|| ValidationError::Month(month.to_string()))
}

pub fn validate_year(year: &str, window: &ExpiryWindow) -> Result<u32, ValidationError> {
  parse_two_digits(year)
    .filter(|y| (window.year_min..=window.year_max).contains(y))
    .ok_or_else(|| ValidationError::Year(year.to_string()))
}

/// 把 `MM/YY` 形式的 5 字符有效期拆成月份和年份；分隔符本身不检查
pub fn split_expiry(date: &str) -> Result<(String, String), ValidationError> {
  let chars: Vec<char> = date.chars().collect();
  if chars.len() != 5 {
    return Err(ValidationError::MalformedExpiry(date.to_string()));
  }
  let month = chars[..2].iter().collect();
  let year = chars[3..].iter().collect();
  Ok((month, year))
}

pub fn validate_number(number: &str) -> Result<(), ValidationError> {
  if !luhn(number) {
    return Err(ValidationError::Checksum);
  }
  Ok(())
}
