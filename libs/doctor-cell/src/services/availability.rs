use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::{Datelike, Days, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use tracing::{debug, warn};
use uuid::Uuid;

use appointment_cell::AppointmentBookingService;
use shared_database::Store;
use shared_models::{AvailabilityWindow, DayOfWeek};

use crate::models::{DaySlots, DoctorError};

/// Length of one bookable slot.
pub const SLOT_MINUTES: u32 = 30;
/// Days offered, today included.
pub const HORIZON_DAYS: u64 = 14;
/// Same-day bookings must start at least this far ahead.
pub const BOOKING_LEAD_MINUTES: i64 = 60;

/// Lazily walks the booking horizon one day at a time.
///
/// Every day in the horizon is yielded, empty ones included. Slots on a day
/// come from all of that weekday's windows, merged and ascending.
pub struct SlotSchedule<'a> {
    availability: &'a [AvailabilityWindow],
    booked: &'a HashMap<NaiveDate, BTreeSet<NaiveTime>>,
    today: NaiveDate,
    earliest: NaiveDateTime,
    offset: u64,
}

impl<'a> SlotSchedule<'a> {
    pub fn new(
        availability: &'a [AvailabilityWindow],
        booked: &'a HashMap<NaiveDate, BTreeSet<NaiveTime>>,
        now: NaiveDateTime,
    ) -> Self {
        Self {
            availability,
            booked,
            today: now.date(),
            earliest: earliest_bookable(now),
            offset: 0,
        }
    }

    /// Last day of the horizon.
    pub fn horizon_end(today: NaiveDate) -> NaiveDate {
        today + Days::new(HORIZON_DAYS - 1)
    }

    fn slots_on(&self, date: NaiveDate) -> Vec<NaiveTime> {
        let day = DayOfWeek::from(date.weekday());
        let taken = self.booked.get(&date);

        let mut slots = BTreeSet::new();
        for window in self.availability.iter().filter(|window| window.day == day) {
            slots.extend(window_slots(window));
        }

        slots
            .into_iter()
            .filter(|slot| date.and_time(*slot) >= self.earliest)
            .filter(|slot| taken.map_or(true, |taken| !taken.contains(slot)))
            .collect()
    }
}

impl Iterator for SlotSchedule<'_> {
    type Item = DaySlots;

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset >= HORIZON_DAYS {
            return None;
        }
        let date = self.today + Days::new(self.offset);
        self.offset += 1;

        Some(DaySlots {
            date,
            day: DayOfWeek::from(date.weekday()),
            slots: self.slots_on(date),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = HORIZON_DAYS.saturating_sub(self.offset) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for SlotSchedule<'_> {}

/// Slot starts inside one window. A slot is kept only if it ends by the
/// window's end.
pub fn window_slots(window: &AvailabilityWindow) -> impl Iterator<Item = NaiveTime> {
    let start = window.start_time.num_seconds_from_midnight() / 60;
    let end = window.end_time.num_seconds_from_midnight() / 60;

    (start..)
        .step_by(SLOT_MINUTES as usize)
        .take_while(move |minute| minute + SLOT_MINUTES <= end)
        .filter_map(|minute| NaiveTime::from_num_seconds_from_midnight_opt(minute * 60, 0))
}

/// `now` plus the booking lead, rounded up to the next half hour.
pub fn earliest_bookable(now: NaiveDateTime) -> NaiveDateTime {
    let lead = now + Duration::minutes(BOOKING_LEAD_MINUTES);
    let step = i64::from(SLOT_MINUTES * 60);
    let seconds = i64::from(lead.time().num_seconds_from_midnight());
    let exact = seconds % step == 0 && lead.time().nanosecond() == 0;

    let midnight = lead.date().and_time(NaiveTime::MIN);
    let rounded = if exact { seconds } else { (seconds / step + 1) * step };
    midnight + Duration::seconds(rounded)
}

pub struct AvailabilityService {
    store: Arc<dyn Store>,
}

impl AvailabilityService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Open slots for an approved doctor over the booking horizon starting
    /// at `now`'s date.
    pub async fn get_available_slots(&self, doctor_id: Uuid, now: NaiveDateTime) -> Result<Vec<DaySlots>, DoctorError> {
        debug!("Calculating available slots for doctor {} from {}", doctor_id, now);

        let doctor = self.store.find_doctor(doctor_id).await?.ok_or(DoctorError::NotFound)?;
        if !doctor.is_bookable() {
            warn!("Slots requested for doctor {} with status {}", doctor.id, doctor.status);
            return Err(DoctorError::NotBookable);
        }

        let today = now.date();
        let booked = AppointmentBookingService::new(self.store.clone())
            .booked_between(doctor.id, today, SlotSchedule::horizon_end(today))
            .await?;

        let days: Vec<DaySlots> = SlotSchedule::new(&doctor.availability, &booked, now).collect();

        debug!(
            "Found {} open slots for doctor {}",
            days.iter().map(|day| day.slots.len()).sum::<usize>(),
            doctor.id
        );
        Ok(days)
    }
}
