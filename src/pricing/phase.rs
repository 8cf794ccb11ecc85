// Booking Phase Resolver
//
// Maps a calendar date onto the Early Bird / Regular / Spot pricing tier.
// Cutovers are inclusive on the early side: Aug 15 is still Early Bird and
// Oct 15 is still Regular.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

use crate::pricing::types::BookingPhase;

/// Last (month, day) billed at the early bird rate
pub const EARLY_BIRD_LAST_DAY: (u32, u32) = (8, 15);

/// Last (month, day) billed at the regular rate
pub const REGULAR_LAST_DAY: (u32, u32) = (10, 15);

/// Conference time zone offset (IST, UTC+05:30)
const CONFERENCE_UTC_OFFSET_SECS: i64 = 5 * 3600 + 30 * 60;

/// Phase calendar for one conference edition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseCalendar {
    year: i32,
}

impl PhaseCalendar {
    pub fn new(year: i32) -> Self {
        Self { year }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// Resolve the booking phase for a calendar date
    ///
    /// Total: every date maps to exactly one phase. Dates in earlier years
    /// are early bird, dates in later years are spot.
    pub fn resolve(&self, date: NaiveDate) -> BookingPhase {
        let key = (date.year(), date.month(), date.day());
        let early_end = (self.year, EARLY_BIRD_LAST_DAY.0, EARLY_BIRD_LAST_DAY.1);
        let regular_end = (self.year, REGULAR_LAST_DAY.0, REGULAR_LAST_DAY.1);

        if key <= early_end {
            BookingPhase::EarlyBird
        } else if key <= regular_end {
            BookingPhase::Regular
        } else {
            BookingPhase::Spot
        }
    }

    /// Resolve the phase for an instant, using the conference-local date
    pub fn resolve_at(&self, instant: DateTime<Utc>) -> BookingPhase {
        let local = instant.naive_utc() + Duration::seconds(CONFERENCE_UTC_OFFSET_SECS);
        self.resolve(local.date())
    }
}

/// Source of "now" for phase resolution
///
/// `Fixed` pins the date, used for rehearsals and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clock {
    System,
    Fixed(DateTime<Utc>),
}

impl Clock {
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::System => Utc::now(),
            Clock::Fixed(instant) => *instant,
        }
    }
}

/// Calendar plus clock: answers "which phase is it right now"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseResolver {
    calendar: PhaseCalendar,
    clock: Clock,
}

impl PhaseResolver {
    pub fn new(calendar: PhaseCalendar, clock: Clock) -> Self {
        Self { calendar, clock }
    }

    pub fn current_phase(&self) -> BookingPhase {
        self.calendar.resolve_at(self.clock.now())
    }

    pub fn calendar(&self) -> PhaseCalendar {
        self.calendar
    }
}
