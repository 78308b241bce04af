use crate::utils::error::{RaffleError, Result};
use rand::seq::SliceRandom;
use rand::Rng;

/// The numbers `1..=total` in draw order.
///
/// `order[..cursor]` has been drawn, `order[cursor..]` is still to come, so
/// `drawn().len() + remaining().len() == total()` holds by construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberPool {
    total: u32,
    order: Vec<u32>,
    cursor: usize,
}

impl NumberPool {
    /// Shuffles `1..=total` with the thread-local RNG.
    pub fn create(total: u32) -> Result<Self> {
        Self::create_with_rng(total, &mut rand::rng())
    }

    /// `SliceRandom::shuffle` is the Durstenfeld form of Fisher-Yates: every
    /// one of the `total!` orders is equally likely, in linear time.
    pub fn create_with_rng<R: Rng + ?Sized>(total: u32, rng: &mut R) -> Result<Self> {
        if total < 1 {
            return Err(RaffleError::InvalidSize {
                size: i64::from(total),
            });
        }

        let mut order: Vec<u32> = (1..=total).collect();
        order.shuffle(rng);

        tracing::debug!("Created pool of {} numbers", total);
        Ok(Self {
            total,
            order,
            cursor: 0,
        })
    }

    /// Rebuilds a pool from its parts, checking that together they are
    /// exactly `1..=total` with no duplicates.
    pub fn from_parts(total: u32, remaining: Vec<u32>, drawn: Vec<u32>) -> Result<Self> {
        if total < 1 {
            return Err(RaffleError::InvalidSize {
                size: i64::from(total),
            });
        }

        let len = drawn.len() + remaining.len();
        if len != total as usize {
            return Err(RaffleError::CorruptSnapshot {
                reason: format!(
                    "{} drawn + {} remaining does not add up to total {}",
                    drawn.len(),
                    remaining.len(),
                    total
                ),
            });
        }

        let cursor = drawn.len();
        let mut order = drawn;
        order.extend(remaining);

        let mut seen = vec![false; total as usize + 1];
        for &number in &order {
            if number < 1 || number > total {
                return Err(RaffleError::CorruptSnapshot {
                    reason: format!("number {} is outside 1..={}", number, total),
                });
            }
            if std::mem::replace(&mut seen[number as usize], true) {
                return Err(RaffleError::CorruptSnapshot {
                    reason: format!("number {} appears more than once", number),
                });
            }
        }

        Ok(Self {
            total,
            order,
            cursor,
        })
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn remaining(&self) -> &[u32] {
        &self.order[self.cursor..]
    }

    pub fn drawn(&self) -> &[u32] {
        &self.order[..self.cursor]
    }

    /// The number the next `take_next` will return.
    pub fn peek_next(&self) -> Option<u32> {
        self.order.get(self.cursor).copied()
    }

    pub fn take_next(&mut self) -> Result<u32> {
        let next = self.peek_next().ok_or(RaffleError::PoolExhausted)?;
        self.cursor += 1;
        Ok(next)
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor == self.order.len()
    }
}
