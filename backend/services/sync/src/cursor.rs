use attendance_common::error::AttendanceResult;
use attendance_store::checkpoint::models::SyncCheckpoint;
use attendance_store::checkpoint::repositories::CheckpointRepository;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::device::models::device_offset;

/// Inclusive fetch range sent to the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchWindow {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

/// Tracks the latest synchronized event time and derives the next window.
///
/// State is loaded once and every mutation is written through to the
/// repository before the call returns.
pub struct TimeWindowCursor<C> {
    repo: C,
    state: SyncCheckpoint,
    default_start: DateTime<FixedOffset>,
}

impl<C> TimeWindowCursor<C>
where
    C: CheckpointRepository,
{
    /// Load the checkpoint (creating it on first run). `import_start_date`
    /// at device-local midnight is used until something has been fetched.
    pub fn load(repo: C, import_start_date: NaiveDate, now: DateTime<Utc>) -> AttendanceResult<Self> {
        let state = repo.get_or_create(now)?;
        let default_start = start_of_day(import_start_date);

        tracing::info!(
            latest_fetched_time = ?state.latest_fetched_time,
            last_cleared = %state.last_cleared,
            default_start = %default_start,
            "checkpoint loaded"
        );

        Ok(Self {
            repo,
            state,
            default_start,
        })
    }

    pub fn start_time(&self) -> DateTime<FixedOffset> {
        self.state.latest_fetched_time.unwrap_or(self.default_start)
    }

    /// Today in device-local time, truncated to 23:59:00.
    ///
    /// Events in the final minute of a day are only picked up once the next
    /// day's window starts from the stored cursor.
    pub fn end_time(now: DateTime<Utc>) -> DateTime<FixedOffset> {
        let today = now.with_timezone(&device_offset()).date_naive();
        let cutoff = NaiveTime::from_hms_opt(23, 59, 0).unwrap_or_default();
        local_datetime(today.and_time(cutoff))
    }

    pub fn window(&self, now: DateTime<Utc>) -> FetchWindow {
        FetchWindow {
            start: self.start_time(),
            end: Self::end_time(now),
        }
    }

    /// Move the cursor forward to `new_time`.
    ///
    /// `None`, or a time not strictly after the stored one, leaves the cursor
    /// untouched. Returns whether anything was persisted.
    pub fn advance(&mut self, new_time: Option<DateTime<FixedOffset>>) -> AttendanceResult<bool> {
        let Some(new_time) = new_time else {
            return Ok(false);
        };

        if let Some(current) = self.state.latest_fetched_time {
            if new_time <= current {
                tracing::warn!(
                    current = %current,
                    rejected = %new_time,
                    "refusing to move cursor backwards"
                );
                return Ok(false);
            }
        }

        let mut next = self.state.clone();
        next.latest_fetched_time = Some(new_time);
        self.repo.save(&next)?;
        self.state = next;

        tracing::info!(latest_fetched_time = %new_time, "cursor advanced");
        Ok(true)
    }

    pub fn latest_fetched_time(&self) -> Option<DateTime<FixedOffset>> {
        self.state.latest_fetched_time
    }

    pub fn last_cleared(&self) -> DateTime<Utc> {
        self.state.last_cleared
    }

    pub fn mark_cleared(&mut self, at: DateTime<Utc>) -> AttendanceResult<()> {
        let mut next = self.state.clone();
        next.last_cleared = at;
        self.repo.save(&next)?;
        self.state = next;
        Ok(())
    }
}

fn start_of_day(date: NaiveDate) -> DateTime<FixedOffset> {
    local_datetime(date.and_time(NaiveTime::default()))
}

fn local_datetime(naive: chrono::NaiveDateTime) -> DateTime<FixedOffset> {
    // A fixed offset has no gaps or folds, so the mapping is always single.
    let offset = device_offset();
    let utc = naive - chrono::Duration::seconds(i64::from(offset.local_minus_utc()));
    offset.from_utc_datetime(&utc)
}
