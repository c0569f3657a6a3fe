use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{Datelike, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{AvailableSlot, BookedSlot, DayAvailability, Doctor, DoctorError};
use crate::services::DoctorService;

/// Free-slot lookups derived from a doctor's consultation hours and bookings.
pub struct AvailabilityService {
    supabase: SupabaseClient,
    doctors: DoctorService,
}

impl AvailabilityService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            doctors: DoctorService::new(config),
        }
    }

    pub async fn available_slots(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<AvailableSlot>, DoctorError> {
        let doctor = self.doctors.get(doctor_id, auth_token).await?;
        let booked = self.booked_between(doctor_id, date, date, auth_token).await?;
        let taken: HashSet<NaiveTime> = booked.into_iter().map(|b| b.time).collect();

        let now = Local::now().naive_local();
        Ok(free_slots(&doctor, date, &taken, now)
            .into_iter()
            .map(|time| AvailableSlot { time })
            .collect())
    }

    /// Day-by-day status for one calendar month (`month` is 1-based).
    pub async fn daily_availability(
        &self,
        doctor_id: Uuid,
        year: i32,
        month: u32,
        auth_token: &str,
    ) -> Result<BTreeMap<String, DayAvailability>, DoctorError> {
        let (first, last) = month_bounds(year, month).ok_or_else(|| {
            DoctorError::ValidationError(format!("Invalid month: {}-{}", year, month))
        })?;

        let doctor = self.doctors.get(doctor_id, auth_token).await?;
        let booked = self.booked_between(doctor_id, first, last, auth_token).await?;

        let mut taken: HashMap<NaiveDate, HashSet<NaiveTime>> = HashMap::new();
        for slot in booked {
            taken.entry(slot.date).or_default().insert(slot.time);
        }

        let now = Local::now().naive_local();
        let empty = HashSet::new();
        let mut days = BTreeMap::new();
        let mut day = first;
        while day <= last {
            let status = classify_day(&doctor, day, taken.get(&day).unwrap_or(&empty), now);
            days.insert(day.format("%Y-%m-%d").to_string(), status);
            day += Duration::days(1);
        }

        Ok(days)
    }

    async fn booked_between(
        &self,
        doctor_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<BookedSlot>, DoctorError> {
        let path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&date=gte.{}&date=lte.{}&status=neq.Cancelled&select=date,time",
            doctor_id, from, to
        );
        debug!("Fetching booked slots for doctor {} from {} to {}", doctor_id, from, to);
        Ok(self.supabase.select(&path, auth_token).await?)
    }
}

/// Slot start times from `start`, stepping by `step_minutes`, that end by `end`.
pub fn generate_slots(start: NaiveTime, end: NaiveTime, step_minutes: i32) -> Vec<NaiveTime> {
    if step_minutes <= 0 {
        return Vec::new();
    }
    let step = Duration::minutes(step_minutes as i64);
    let mut slots = Vec::new();
    let mut current = start;

    loop {
        let (slot_end, wrapped) = current.overflowing_add_signed(step);
        if wrapped != 0 || slot_end > end {
            break;
        }
        slots.push(current);
        current = slot_end;
    }

    slots
}

/// Slots the doctor could take on `date`, ignoring bookings. Empty on
/// non-working days, for unavailable doctors and for past dates; on the
/// current day, slots that already started are dropped.
pub fn open_slots(doctor: &Doctor, date: NaiveDate, now: NaiveDateTime) -> Vec<NaiveTime> {
    if !doctor.is_available || !doctor.works_on(date.weekday()) || date < now.date() {
        return Vec::new();
    }

    generate_slots(doctor.consultation_start, doctor.consultation_end, doctor.slot_duration_minutes)
        .into_iter()
        .filter(|slot| date > now.date() || *slot > now.time())
        .collect()
}

pub fn free_slots(
    doctor: &Doctor,
    date: NaiveDate,
    taken: &HashSet<NaiveTime>,
    now: NaiveDateTime,
) -> Vec<NaiveTime> {
    open_slots(doctor, date, now)
        .into_iter()
        .filter(|slot| !taken.contains(slot))
        .collect()
}

pub fn classify_day(
    doctor: &Doctor,
    date: NaiveDate,
    taken: &HashSet<NaiveTime>,
    now: NaiveDateTime,
) -> DayAvailability {
    let open = open_slots(doctor, date, now);
    let free = open.iter().filter(|slot| !taken.contains(slot)).count();

    if free == 0 {
        DayAvailability::Unavailable
    } else if free == open.len() {
        DayAvailability::FullyAvailable
    } else {
        DayAvailability::PartiallyAvailable
    }
}

fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((first, next.pred_opt()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Utc, Weekday};

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn doctor() -> Doctor {
        Doctor {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            hospital_id: None,
            specialty: "Cardiology".to_string(),
            qualifications: vec![],
            average_rating: 0.0,
            number_of_reviews: 0,
            is_available: true,
            consultation_start: t(9, 0),
            consultation_end: t(11, 0),
            slot_duration_minutes: 30,
            working_days: vec![Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri],
            created_at: Utc::now(),
            updated_at: Utc::now(),
            user: None,
        }
    }

    // 2025-03-10 is a Monday
    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
    }

    fn the_week_before() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 3).unwrap().and_time(t(8, 0))
    }

    #[test]
    fn test_generate_slots_fits_inside_hours() {
        assert_eq!(generate_slots(t(9, 0), t(10, 30), 30), vec![t(9, 0), t(9, 30), t(10, 0)]);
        assert_eq!(generate_slots(t(9, 0), t(10, 20), 30), vec![t(9, 0), t(9, 30)]);
        assert!(generate_slots(t(9, 0), t(10, 0), 0).is_empty());
    }

    #[test]
    fn test_generate_slots_stops_at_midnight() {
        assert_eq!(generate_slots(t(23, 0), t(23, 59), 30), vec![t(23, 0)]);
    }

    #[test]
    fn test_free_slots_skip_bookings() {
        let taken: HashSet<_> = [t(9, 30)].into_iter().collect();
        let free = free_slots(&doctor(), monday(), &taken, the_week_before());
        assert_eq!(free, vec![t(9, 0), t(10, 0), t(10, 30)]);
    }

    #[test]
    fn test_no_slots_on_weekend_or_when_unavailable() {
        let saturday = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();
        assert!(open_slots(&doctor(), saturday, the_week_before()).is_empty());

        let mut away = doctor();
        away.is_available = false;
        assert!(open_slots(&away, monday(), the_week_before()).is_empty());
    }

    #[test]
    fn test_past_slots_of_today_are_dropped() {
        let now = monday().and_time(t(9, 45));
        assert_eq!(open_slots(&doctor(), monday(), now), vec![t(10, 0), t(10, 30)]);

        let tomorrow_morning = monday().succ_opt().unwrap().and_time(t(7, 0));
        assert!(open_slots(&doctor(), monday(), tomorrow_morning).is_empty());
    }

    #[test]
    fn test_classify_day() {
        let none = HashSet::new();
        let some: HashSet<_> = [t(9, 0)].into_iter().collect();
        let all: HashSet<_> = [t(9, 0), t(9, 30), t(10, 0), t(10, 30)].into_iter().collect();
        let now = the_week_before();

        assert_eq!(classify_day(&doctor(), monday(), &none, now), DayAvailability::FullyAvailable);
        assert_eq!(classify_day(&doctor(), monday(), &some, now), DayAvailability::PartiallyAvailable);
        assert_eq!(classify_day(&doctor(), monday(), &all, now), DayAvailability::Unavailable);
    }

    #[test]
    fn test_month_bounds() {
        let feb = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        assert_eq!(month_bounds(2024, 2), Some((feb, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap())));
        assert_eq!(month_bounds(2025, 12).map(|(_, last)| last), NaiveDate::from_ymd_opt(2025, 12, 31));
        assert_eq!(month_bounds(2025, 13), None);
        assert_eq!(month_bounds(2025, 0), None);
    }
}
