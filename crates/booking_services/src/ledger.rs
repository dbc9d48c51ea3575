use chrono::NaiveDate;
use catalog_services::PricingUnit;

use crate::types::BookingError;

/// A date range and quantity held by an existing demand-holding booking
#[derive(Debug, Clone, Copy)]
pub struct HeldRange {
    /// First day of the held range
    pub check_in: NaiveDate,
    /// Day the held range ends (exclusive)
    pub check_out: NaiveDate,
    /// Units held across the range
    pub quantity: i32,
}

/// Returns true when the half-open ranges `[a_in, a_out)` and `[b_in, b_out)` share a day.
pub fn ranges_overlap(
    a_in: NaiveDate,
    a_out: NaiveDate,
    b_in: NaiveDate,
    b_out: NaiveDate,
) -> bool {
    a_in < b_out && b_in < a_out
}

/// Checks the ledger invariant: at no point inside the candidate range may the
/// concurrent demand of existing holds plus the new quantity exceed `capacity`.
///
/// Existing holds that merely touch the candidate range at a single boundary
/// day never conflict; holds that overlap only each other outside the
/// candidate range are not double-counted. A sweep over check-in/check-out
/// events inside the range finds the true maximum concurrency.
pub fn capacity_exceeded(
    existing: &[HeldRange],
    check_in: NaiveDate,
    check_out: NaiveDate,
    quantity: i32,
    capacity: i32,
) -> bool {
    if quantity > capacity {
        return true;
    }

    // Only holds overlapping the candidate range matter
    let overlapping: Vec<&HeldRange> = existing
        .iter()
        .filter(|h| ranges_overlap(h.check_in, h.check_out, check_in, check_out))
        .collect();

    if overlapping.is_empty() {
        return false;
    }

    // Sweep: +quantity at each (clipped) check-in, -quantity at each check-out
    let mut events: Vec<(NaiveDate, i32)> = Vec::with_capacity(overlapping.len() * 2);
    for hold in &overlapping {
        events.push((hold.check_in.max(check_in), hold.quantity));
        events.push((hold.check_out.min(check_out), -hold.quantity));
    }
    events.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));

    let mut concurrent = 0;
    for (_, delta) in events {
        concurrent += delta;
        if concurrent + quantity > capacity {
            return true;
        }
    }

    false
}

/// Number of billable units for a date range under the given pricing unit.
///
/// Per-night counts nights between check-in and check-out; per-day also bills
/// the check-out day (rentals are returned that day); per-person is a flat
/// charge independent of the range length.
pub fn billable_units(
    check_in: NaiveDate,
    check_out: NaiveDate,
    unit: PricingUnit,
) -> Result<i64, BookingError> {
    if check_out <= check_in {
        return Err(BookingError::InvalidDateRange);
    }

    let nights = (check_out - check_in).num_days();

    Ok(match unit {
        PricingUnit::PerNight => nights,
        PricingUnit::PerDay => nights + 1,
        PricingUnit::PerPerson => 1,
    })
}

/// Computes the total price in cents for a booking.
pub fn compute_total_cents(
    unit_price_cents: i64,
    unit: PricingUnit,
    check_in: NaiveDate,
    check_out: NaiveDate,
    quantity: i32,
) -> Result<i64, BookingError> {
    let units = billable_units(check_in, check_out, unit)?;
    Ok(unit_price_cents * units * quantity as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 7, d).unwrap()
    }

    fn hold(check_in: u32, check_out: u32, quantity: i32) -> HeldRange {
        HeldRange {
            check_in: day(check_in),
            check_out: day(check_out),
            quantity,
        }
    }

    #[test]
    fn back_to_back_stays_do_not_overlap() {
        assert!(!ranges_overlap(day(1), day(5), day(5), day(9)));
        assert!(!ranges_overlap(day(5), day(9), day(1), day(5)));
        assert!(ranges_overlap(day(1), day(5), day(4), day(9)));
        assert!(ranges_overlap(day(1), day(9), day(3), day(4)));
    }

    #[test]
    fn empty_ledger_accepts_anything_within_capacity() {
        assert!(!capacity_exceeded(&[], day(1), day(5), 3, 3));
        assert!(capacity_exceeded(&[], day(1), day(5), 4, 3));
    }

    #[test]
    fn single_overlapping_hold_counts() {
        let existing = [hold(1, 10, 2)];
        assert!(!capacity_exceeded(&existing, day(3), day(6), 1, 3));
        assert!(capacity_exceeded(&existing, day(3), day(6), 2, 3));
    }

    #[test]
    fn disjoint_holds_are_not_summed() {
        // Two holds of 2 that never coexist: peak concurrency is 2, not 4
        let existing = [hold(1, 5, 2), hold(5, 9, 2)];
        assert!(!capacity_exceeded(&existing, day(1), day(9), 1, 3));
        assert!(capacity_exceeded(&existing, day(1), day(9), 2, 3));
    }

    #[test]
    fn stacked_holds_inside_the_range_are_summed() {
        let existing = [hold(1, 9, 1), hold(3, 6, 1), hold(4, 5, 1)];
        // Peak concurrency is 3 on day 4
        assert!(!capacity_exceeded(&existing, day(2), day(8), 1, 4));
        assert!(capacity_exceeded(&existing, day(2), day(8), 2, 4));
    }

    #[test]
    fn holds_touching_only_the_boundary_are_ignored() {
        let existing = [hold(1, 3, 5)];
        // New stay starts the day the old one checks out
        assert!(!capacity_exceeded(&existing, day(3), day(6), 5, 5));
    }

    #[test]
    fn peak_outside_candidate_range_is_irrelevant() {
        // Both holds peak together on day 2, but the candidate starts day 5
        let existing = [hold(1, 4, 2), hold(1, 4, 2)];
        assert!(!capacity_exceeded(&existing, day(5), day(9), 3, 3));
    }

    #[test]
    fn per_night_counts_nights() {
        assert_eq!(
            billable_units(day(1), day(4), PricingUnit::PerNight).unwrap(),
            3
        );
    }

    #[test]
    fn per_day_includes_the_return_day() {
        assert_eq!(
            billable_units(day(1), day(4), PricingUnit::PerDay).unwrap(),
            4
        );
    }

    #[test]
    fn per_person_is_flat() {
        assert_eq!(
            billable_units(day(1), day(14), PricingUnit::PerPerson).unwrap(),
            1
        );
    }

    #[test]
    fn reversed_and_zero_length_ranges_are_rejected() {
        assert!(billable_units(day(4), day(1), PricingUnit::PerNight).is_err());
        assert!(billable_units(day(4), day(4), PricingUnit::PerNight).is_err());
    }

    #[test]
    fn totals_multiply_units_price_and_quantity() {
        // 3 nights x $45.00 x 2 pitches
        let total =
            compute_total_cents(4500, PricingUnit::PerNight, day(1), day(4), 2).unwrap();
        assert_eq!(total, 27_000);

        // flat $80.00 x 4 participants
        let total =
            compute_total_cents(8000, PricingUnit::PerPerson, day(1), day(2), 4).unwrap();
        assert_eq!(total, 32_000);
    }
}
