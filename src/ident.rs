//! Identifier allocation: auto-increment signal, distributed time-ordered
//! ids, or random unique strings, selected per namespace.

use crate::error::{ConfigError, DataError};
use serde_json::Value;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// How new primary-key values are produced for a namespace.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum IdStrategy {
    /// No value assigned here; the executor reports the generated key.
    #[default]
    AutoIncrement,
    /// 64-bit time-ordered id from the per-process generator.
    Distributed,
    /// Random opaque string (UUID v4, compact form).
    RandomUnique,
}

impl IdStrategy {
    /// Numeric codes used by the configuration store: 1 auto, 2 distributed,
    /// 3 random.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(IdStrategy::AutoIncrement),
            2 => Some(IdStrategy::Distributed),
            3 => Some(IdStrategy::RandomUnique),
            _ => None,
        }
    }

    pub fn code(self) -> i64 {
        match self {
            IdStrategy::AutoIncrement => 1,
            IdStrategy::Distributed => 2,
            IdStrategy::RandomUnique => 3,
        }
    }
}

/// Time-ordered id generator.
///
/// Layout: (millisecond timestamp - epoch) << 16 | worker << 12 | sequence.
/// The narrow worker field (4 bits) keeps ids inside the JavaScript
/// safe-integer range for the lifetime of the epoch.
pub struct SnowflakeId {
    worker_id: i64,
    state: Mutex<GeneratorState>,
}

struct GeneratorState {
    last_timestamp: i64,
    sequence: i64,
}

/// 2018-01-01 00:00:00 UTC.
const EPOCH_MS: i64 = 1_514_736_000_000;

const WORKER_ID_BITS: u32 = 4;
const SEQUENCE_BITS: u32 = 12;
const TIMESTAMP_SHIFT: u32 = WORKER_ID_BITS + SEQUENCE_BITS;

/// Highest permitted worker id (15).
pub const MAX_WORKER_ID: i64 = (1 << WORKER_ID_BITS) - 1;

const SEQUENCE_MASK: i64 = (1 << SEQUENCE_BITS) - 1;

impl SnowflakeId {
    pub fn new(worker_id: i64) -> Result<Self, ConfigError> {
        if !(0..=MAX_WORKER_ID).contains(&worker_id) {
            return Err(ConfigError::Load(format!(
                "snowflake worker id {worker_id} out of range 0..={MAX_WORKER_ID}"
            )));
        }
        Ok(SnowflakeId {
            worker_id,
            state: Mutex::new(GeneratorState {
                last_timestamp: 0,
                sequence: 0,
            }),
        })
    }

    /// Generate the next id. The whole read-modify-write of the last
    /// timestamp and sequence happens under one lock; a clock observed
    /// behind the last recorded millisecond is fatal.
    pub fn next_id(&self) -> Result<i64, DataError> {
        let mut state = self.state.lock().unwrap();
        let mut timestamp = current_millis();

        if timestamp < state.last_timestamp {
            return Err(DataError::ClockRegression {
                behind_ms: state.last_timestamp - timestamp,
            });
        }

        if timestamp == state.last_timestamp {
            state.sequence = (state.sequence + 1) & SEQUENCE_MASK;
            if state.sequence == 0 {
                timestamp = wait_next_millis(state.last_timestamp);
            }
        } else {
            state.sequence = 0;
        }

        state.last_timestamp = timestamp;

        Ok(((timestamp - EPOCH_MS) << TIMESTAMP_SHIFT)
            | (self.worker_id << SEQUENCE_BITS)
            | state.sequence)
    }
}

fn current_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Spin until the wall clock passes `last`; sequence overflow within one
/// millisecond lands here.
fn wait_next_millis(last: i64) -> i64 {
    let mut now = current_millis();
    while now <= last {
        now = current_millis();
    }
    now
}

/// Allocator facing the CRUD template: maps a strategy to a concrete value,
/// or to no value at all for auto-increment keys.
pub struct IdAllocator {
    snowflake: SnowflakeId,
}

impl IdAllocator {
    pub fn new(worker_id: i64) -> Result<Self, ConfigError> {
        Ok(IdAllocator {
            snowflake: SnowflakeId::new(worker_id)?,
        })
    }

    /// Next id for the strategy: `None` for auto-increment, a number for
    /// distributed, a string for random-unique.
    pub fn next(&self, strategy: IdStrategy) -> Result<Option<Value>, DataError> {
        match strategy {
            IdStrategy::AutoIncrement => Ok(None),
            IdStrategy::Distributed => Ok(Some(Value::from(self.snowflake.next_id()?))),
            IdStrategy::RandomUnique => Ok(Some(Value::String(
                uuid::Uuid::new_v4().simple().to_string(),
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn generates_unique_ids() {
        let gen = SnowflakeId::new(1).unwrap();
        let mut seen = HashSet::new();
        for _ in 0..10_000 {
            assert!(seen.insert(gen.next_id().unwrap()));
        }
    }

    #[test]
    fn ids_are_time_ordered() {
        let gen = SnowflakeId::new(0).unwrap();
        let mut last = 0;
        for _ in 0..1_000 {
            let id = gen.next_id().unwrap();
            assert!(id > last);
            last = id;
        }
    }

    #[test]
    fn concurrent_callers_never_collide() {
        let gen = Arc::new(SnowflakeId::new(3).unwrap());
        let mut handles = Vec::new();
        for _ in 0..10 {
            let gen = Arc::clone(&gen);
            handles.push(std::thread::spawn(move || {
                (0..200).map(|_| gen.next_id().unwrap()).collect::<Vec<_>>()
            }));
        }
        let mut seen = HashSet::new();
        for h in handles {
            for id in h.join().unwrap() {
                assert!(seen.insert(id), "duplicate id {id}");
            }
        }
        assert_eq!(seen.len(), 2_000);
    }

    #[test]
    fn worker_id_lands_in_its_bit_field() {
        let gen = SnowflakeId::new(9).unwrap();
        let id = gen.next_id().unwrap();
        assert_eq!((id >> SEQUENCE_BITS) & MAX_WORKER_ID, 9);
    }

    #[test]
    fn backwards_clock_is_fatal() {
        let gen = SnowflakeId::new(0).unwrap();
        gen.next_id().unwrap();
        gen.state.lock().unwrap().last_timestamp = current_millis() + 60_000;
        match gen.next_id() {
            Err(DataError::ClockRegression { behind_ms }) => assert!(behind_ms > 0),
            other => panic!("expected clock regression, got {other:?}"),
        }
    }

    #[test]
    fn rejects_out_of_range_worker_id() {
        assert!(SnowflakeId::new(MAX_WORKER_ID + 1).is_err());
        assert!(SnowflakeId::new(-1).is_err());
        assert!(SnowflakeId::new(MAX_WORKER_ID).is_ok());
    }

    #[test]
    fn allocator_maps_strategies() {
        let alloc = IdAllocator::new(0).unwrap();
        assert_eq!(alloc.next(IdStrategy::AutoIncrement).unwrap(), None);

        let snow = alloc.next(IdStrategy::Distributed).unwrap().unwrap();
        assert!(snow.is_i64());

        let random = alloc.next(IdStrategy::RandomUnique).unwrap().unwrap();
        let s = random.as_str().unwrap();
        assert_eq!(s.len(), 32);
        assert!(s.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn strategy_codes_round_trip() {
        for s in [
            IdStrategy::AutoIncrement,
            IdStrategy::Distributed,
            IdStrategy::RandomUnique,
        ] {
            assert_eq!(IdStrategy::from_code(s.code()), Some(s));
        }
        assert_eq!(IdStrategy::from_code(9), None);
    }
}
