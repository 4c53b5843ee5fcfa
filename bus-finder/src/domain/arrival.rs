//! Arrival boards and the client-side view over them.

use std::cmp::Ordering;

use chrono::NaiveDateTime;

use super::station::StationKey;

/// Number of upcoming times shown per line.
pub const UPCOMING_SHOWN: usize = 3;

/// One bus line's upcoming arrivals at a station.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusArrival {
    pub line_number: String,
    pub operator_name: String,
    pub destination: String,
    pub description: String,
    /// Minutes until each upcoming arrival, ascending.
    arrival_minutes: Vec<u32>,
}

impl BusArrival {
    /// Create an arrival entry. The arrival times are sorted ascending.
    ///
    /// Returns `None` when there is no upcoming arrival at all.
    pub fn new(
        line_number: impl Into<String>,
        operator_name: impl Into<String>,
        destination: impl Into<String>,
        description: impl Into<String>,
        mut arrival_minutes: Vec<u32>,
    ) -> Option<Self> {
        if arrival_minutes.is_empty() {
            return None;
        }
        arrival_minutes.sort_unstable();

        Some(Self {
            line_number: line_number.into(),
            operator_name: operator_name.into(),
            destination: destination.into(),
            description: description.into(),
            arrival_minutes,
        })
    }

    pub fn arrival_minutes(&self) -> &[u32] {
        &self.arrival_minutes
    }

    /// Minutes until the nearest arrival.
    pub fn next_arrival_minutes(&self) -> u32 {
        // Non-empty by construction
        self.arrival_minutes[0]
    }

    /// The nearest few arrivals, for compact display.
    pub fn upcoming(&self) -> &[u32] {
        let n = self.arrival_minutes.len().min(UPCOMING_SHOWN);
        &self.arrival_minutes[..n]
    }

    pub fn urgency(&self) -> Urgency {
        Urgency::from_minutes(self.next_arrival_minutes())
    }
}

/// The full set of upcoming arrivals for one station at one point in time.
///
/// A board is replaced wholesale on every fetch, never merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrivalBoard {
    pub station_id: StationKey,
    /// Arrivals in backend order (nearest first).
    pub arrivals: Vec<BusArrival>,
    pub last_updated: NaiveDateTime,
    pub total_count: usize,
}

impl ArrivalBoard {
    pub fn is_empty(&self) -> bool {
        self.arrivals.is_empty()
    }

    /// Apply a client-side view without touching the board itself.
    pub fn view(&self, query: &BoardQuery) -> Vec<&BusArrival> {
        query.apply(&self.arrivals)
    }
}

/// How soon a bus arrives, for colour coding.
///
/// Each bucket is inclusive at its upper bound: 2 minutes is still
/// `Imminent`, 3 is `Soon`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Urgency {
    /// 0..=2 minutes
    Imminent,
    /// 3..=5 minutes
    Soon,
    /// 6..=10 minutes
    Approaching,
    /// More than 10 minutes
    Normal,
}

impl Urgency {
    pub fn from_minutes(minutes: u32) -> Self {
        match minutes {
            0..=2 => Urgency::Imminent,
            3..=5 => Urgency::Soon,
            6..=10 => Urgency::Approaching,
            _ => Urgency::Normal,
        }
    }
}

/// Ordering applied to a board for display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ArrivalSort {
    /// Keep the backend's order.
    #[default]
    AsReceived,
    /// Nearest arrival first; ties keep backend order.
    ByArrival,
    /// By line identifier: numerically when both parse as integers,
    /// lexically otherwise.
    ByLine,
}

/// A reactive, non-persisted view over a board: sort plus line filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardQuery {
    pub sort: ArrivalSort,
    /// Case-insensitive substring the line identifier must contain.
    pub line_filter: Option<String>,
}

impl BoardQuery {
    pub fn sorted(sort: ArrivalSort) -> Self {
        Self {
            sort,
            line_filter: None,
        }
    }

    pub fn with_line_filter(mut self, filter: impl Into<String>) -> Self {
        self.line_filter = Some(filter.into());
        self
    }

    pub fn apply<'a>(&self, arrivals: &'a [BusArrival]) -> Vec<&'a BusArrival> {
        let needle = self
            .line_filter
            .as_deref()
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(str::to_lowercase);

        let mut view: Vec<&BusArrival> = arrivals
            .iter()
            .filter(|a| match &needle {
                Some(n) => a.line_number.to_lowercase().contains(n.as_str()),
                None => true,
            })
            .collect();

        match self.sort {
            ArrivalSort::AsReceived => {}
            ArrivalSort::ByArrival => view.sort_by_key(|a| a.next_arrival_minutes()),
            ArrivalSort::ByLine => {
                insertion_sort_by(&mut view, |a, b| {
                    compare_lines(&a.line_number, &b.line_number)
                })
            }
        }

        view
    }
}

/// Compare two line identifiers.
///
/// Numeric when both parse as integers, lexical otherwise.
pub fn compare_lines(a: &str, b: &str) -> Ordering {
    match (a.trim().parse::<u64>(), b.trim().parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        _ => a.cmp(b),
    }
}

/// Stable sort that tolerates comparators which are not a total order.
///
/// Mixing numeric and lexical comparison is not transitive across mixed
/// inputs ("9" < "10" < "1a" < "9"), which the std sorts may reject.
/// Boards hold a few dozen lines at most.
fn insertion_sort_by<T, F>(items: &mut [T], mut cmp: F)
where
    F: FnMut(&T, &T) -> Ordering,
{
    for i in 1..items.len() {
        let mut j = i;
        while j > 0 && cmp(&items[j - 1], &items[j]) == Ordering::Greater {
            items.swap(j - 1, j);
            j -= 1;
        }
    }
}
