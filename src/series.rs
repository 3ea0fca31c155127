use crate::types::MetricId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One metric's daily history for one user.
///
/// Gaps are explicit absences. For continuous metrics a missing day means
/// "not measured" and is dropped at alignment time; for occurrence metrics a
/// missing day means the behavior did not happen and is read as 0 against the
/// partner series' dates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailySeries {
    pub id: MetricId,
    pub values: BTreeMap<NaiveDate, f64>,
}

impl DailySeries {
    pub fn new(id: MetricId) -> Self {
        Self {
            id,
            values: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, date: NaiveDate, value: f64) {
        if value.is_finite() {
            self.values.insert(date, value);
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn value_on(&self, date: NaiveDate) -> Option<f64> {
        match self.values.get(&date) {
            Some(v) => Some(*v),
            None if self.id.is_occurrence() => Some(0.0),
            None => None,
        }
    }
}

/// Two series aligned by calendar date into paired arrays.
#[derive(Debug, Clone)]
pub struct AlignedPair {
    pub dates: Vec<NaiveDate>,
    pub a: Vec<f64>,
    pub b: Vec<f64>,
}

impl AlignedPair {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// Align two series on their shared dates.
///
/// The base date set is driven by the continuous member(s): a continuous
/// metric contributes only measured days, while an occurrence metric reads as
/// 0 on any base date it lacks. Two occurrence metrics align on the union of
/// their dates.
pub fn align(a: &DailySeries, b: &DailySeries) -> AlignedPair {
    align_with_lag(a, b, 0)
}

/// Align `a[d]` against `b[d + lag_days]`.
///
/// A positive lag pairs today's A with B `lag_days` later ("A leads B");
/// callers swap arguments for the opposite direction.
pub fn align_with_lag(a: &DailySeries, b: &DailySeries, lag_days: i64) -> AlignedPair {
    let base_dates: Vec<NaiveDate> = match (a.id.is_occurrence(), b.id.is_occurrence()) {
        (false, false) => a.values.keys().copied().collect(),
        (false, true) => a.values.keys().copied().collect(),
        (true, false) => b
            .values
            .keys()
            .filter_map(|d| d.checked_sub_signed(chrono::Duration::days(lag_days)))
            .collect(),
        (true, true) => {
            let mut dates: Vec<NaiveDate> = a.values.keys().copied().collect();
            for d in b.values.keys() {
                if let Some(shifted) = d.checked_sub_signed(chrono::Duration::days(lag_days)) {
                    dates.push(shifted);
                }
            }
            dates.sort();
            dates.dedup();
            dates
        }
    };

    let mut out = AlignedPair {
        dates: Vec::with_capacity(base_dates.len()),
        a: Vec::with_capacity(base_dates.len()),
        b: Vec::with_capacity(base_dates.len()),
    };
    for date in base_dates {
        let Some(b_date) = date.checked_add_signed(chrono::Duration::days(lag_days)) else {
            continue;
        };
        let (Some(va), Some(vb)) = (a.value_on(date), b.value_on(b_date)) else {
            continue;
        };
        if !va.is_finite() || !vb.is_finite() {
            continue;
        }
        out.dates.push(date);
        out.a.push(va);
        out.b.push(vb);
    }
    out
}
