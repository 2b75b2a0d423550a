// ── Time-series downsampling ──
//
// Reduces raw samples to a chart-friendly point count. Charts use
// bucket averaging over a window-dependent width; compact snapshots use
// plain stride sampling. Neither reduction is idempotent: re-bucketing
// bucket midpoints can merge points differently.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use komari_api::RecordWindow;

/// Inputs at or below this length are returned sorted but otherwise untouched.
pub const BUCKET_THRESHOLD: usize = 200;

/// A single chart sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub time: DateTime<Utc>,
    pub value: f64,
}

impl ChartPoint {
    pub fn new(time: DateTime<Utc>, value: f64) -> Self {
        Self { time, value }
    }
}

/// How a series is reduced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Mean per fixed-width time bucket (above [`BUCKET_THRESHOLD`] points).
    BucketAverage { width: Duration },
    /// Keep every n-th point so at most about `max` remain.
    Stride { max: usize },
}

impl Strategy {
    /// The bucket strategy charts use for `window`.
    pub fn for_window(window: RecordWindow) -> Self {
        Self::BucketAverage {
            width: bucket_width(window),
        }
    }

    pub fn apply(&self, points: &[ChartPoint]) -> Vec<ChartPoint> {
        match *self {
            Self::BucketAverage { width } => bucket_average(points, width),
            Self::Stride { max } => stride_sample(points, max),
        }
    }
}

/// Bucket width used for a history window.
pub fn bucket_width(window: RecordWindow) -> Duration {
    match window {
        RecordWindow::Hour1 | RecordWindow::Hours4 => Duration::from_secs(60),
        RecordWindow::Hours6 | RecordWindow::Hours12 => Duration::from_secs(5 * 60),
        RecordWindow::Day1 => Duration::from_secs(15 * 60),
        RecordWindow::Days7 | RecordWindow::Days30 => Duration::from_secs(60 * 60),
    }
}

/// Average `points` into buckets of `width` once there are more than
/// [`BUCKET_THRESHOLD`] of them.
///
/// Output is always ascending by time. Small inputs come back as a
/// sorted copy.
pub fn bucket_average(points: &[ChartPoint], width: Duration) -> Vec<ChartPoint> {
    let mut sorted = points.to_vec();
    sorted.sort_by_key(|p| p.time);
    if sorted.len() <= BUCKET_THRESHOLD {
        return sorted;
    }
    average_buckets(&sorted, width)
}

/// Unconditionally average time-sorted `points` into `width` buckets.
///
/// The bucket index of a point is `floor((t - t0) / width)` where `t0` is
/// the first timestamp; each output point sits at its bucket's midpoint.
/// Offsets, indices and midpoints are all computed in nanoseconds, or in
/// microseconds when the series spans too long for nanoseconds to fit in
/// an `i64`. A zero width leaves the input unchanged.
pub fn average_buckets(sorted: &[ChartPoint], width: Duration) -> Vec<ChartPoint> {
    let (Some(first), Some(last)) = (sorted.first(), sorted.last()) else {
        return Vec::new();
    };
    if width.is_zero() {
        return sorted.to_vec();
    }
    let width = TimeDelta::from_std(width).unwrap_or(TimeDelta::MAX);
    let span = last.time - first.time;

    let (ticks, from_ticks): (fn(&TimeDelta) -> Option<i64>, fn(i64) -> TimeDelta) =
        if width.num_nanoseconds().is_some() && span.num_nanoseconds().is_some() {
            (TimeDelta::num_nanoseconds, TimeDelta::nanoseconds)
        } else {
            (TimeDelta::num_microseconds, TimeDelta::microseconds)
        };
    let width_ticks = ticks(&width).unwrap_or(i64::MAX);
    if width_ticks <= 0 {
        return sorted.to_vec();
    }

    let start = first.time;
    let mut buckets: BTreeMap<i64, (f64, u32)> = BTreeMap::new();
    for point in sorted {
        let offset = ticks(&(point.time - start)).unwrap_or(i64::MAX);
        let index = offset.div_euclid(width_ticks);
        let entry = buckets.entry(index).or_insert((0.0, 0));
        entry.0 += point.value;
        entry.1 += 1;
    }

    buckets
        .into_iter()
        .filter_map(|(index, (sum, count))| {
            let midpoint = index
                .saturating_mul(width_ticks)
                .saturating_add(width_ticks / 2);
            let time = start.checked_add_signed(from_ticks(midpoint))?;
            Some(ChartPoint::new(time, sum / f64::from(count)))
        })
        .collect()
}

/// Keep every `max(1, len / max)`-th point starting at index 0 when the
/// input is longer than `max`. `max == 0` means no limit.
pub fn stride_sample<T: Clone>(points: &[T], max: usize) -> Vec<T> {
    if max == 0 || points.len() <= max {
        return points.to_vec();
    }
    let stride = (points.len() / max).max(1);
    points.iter().step_by(stride).cloned().collect()
}

/// Stride-sample each key group separately, `max` per group.
///
/// Groups come out in key order; points within a group keep their input order.
pub fn stride_sample_by_key<T, K, F>(points: &[T], key: F, max: usize) -> Vec<T>
where
    T: Clone,
    K: Ord,
    F: Fn(&T) -> K,
{
    let mut groups: BTreeMap<K, Vec<T>> = BTreeMap::new();
    for point in points {
        groups.entry(key(point)).or_default().push(point.clone());
    }
    groups
        .into_values()
        .flat_map(|group| stride_sample(&group, max))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn at(secs: i64, value: f64) -> ChartPoint {
        ChartPoint::new(DateTime::from_timestamp(secs, 0).unwrap(), value)
    }

    fn secs(points: &[ChartPoint]) -> Vec<(i64, f64)> {
        points.iter().map(|p| (p.time.timestamp(), p.value)).collect()
    }

    #[test]
    fn empty_input_is_empty() {
        assert!(bucket_average(&[], Duration::from_secs(60)).is_empty());
        assert!(average_buckets(&[], Duration::from_secs(60)).is_empty());
    }

    #[test]
    fn small_input_is_only_sorted() {
        let points = vec![at(90, 3.0), at(0, 1.0), at(30, 2.0)];
        let out = bucket_average(&points, Duration::from_secs(60));
        assert_eq!(secs(&out), vec![(0, 1.0), (30, 2.0), (90, 3.0)]);
    }

    #[test]
    fn worked_example_buckets() {
        let points = vec![at(0, 10.0), at(30, 20.0), at(90, 30.0), at(150, 40.0)];
        let out = average_buckets(&points, Duration::from_secs(60));
        assert_eq!(secs(&out), vec![(30, 15.0), (90, 30.0), (150, 40.0)]);
    }

    #[test]
    fn large_input_averages_each_bucket() {
        // 400 points, one every 15s, value = index. Four points per 60s bucket.
        let points: Vec<ChartPoint> = (0..400)
            .rev()
            .map(|i| at(i * 15, f64::from(u32::try_from(i).unwrap())))
            .collect();
        let out = bucket_average(&points, Duration::from_secs(60));

        assert_eq!(out.len(), 100);
        assert!(out.windows(2).all(|w| w[0].time < w[1].time));
        // Bucket 0 holds values 0..=3, midpoint 30s.
        assert_eq!((out[0].time.timestamp(), out[0].value), (30, 1.5));
        // Bucket 99 holds values 396..=399.
        assert_eq!((out[99].time.timestamp(), out[99].value), (99 * 60 + 30, 397.5));
    }

    #[test]
    fn bucket_index_is_relative_to_first_sample() {
        let mut points: Vec<ChartPoint> = (0..201).map(|i| at(1_000 + i, 1.0)).collect();
        points.push(at(1_000 + 3_600, 5.0));
        let out = bucket_average(&points, Duration::from_secs(3_600));
        assert_eq!(secs(&out), vec![(1_000 + 1_800, 1.0), (1_000 + 3_600 + 1_800, 5.0)]);
    }

    #[test]
    fn sub_millisecond_widths_bucket_exactly() {
        // 1000 points, 100µs apart, value = index.
        let origin = DateTime::from_timestamp(0, 0).unwrap();
        let points: Vec<ChartPoint> = (0..1000)
            .map(|i| {
                ChartPoint::new(
                    origin + TimeDelta::microseconds(i * 100),
                    f64::from(u32::try_from(i).unwrap()),
                )
            })
            .collect();

        let out = bucket_average(&points, Duration::from_micros(500));
        assert_eq!(out.len(), 200);
        assert_eq!((out[0].time, out[0].value), (origin + TimeDelta::microseconds(250), 2.0));
        assert_eq!(out[199].time, origin + TimeDelta::microseconds(199 * 500 + 250));

        // 1.5ms is not a whole number of milliseconds: 15 points per bucket.
        let out = bucket_average(&points, Duration::from_micros(1_500));
        assert_eq!(out.len(), 67);
        assert_eq!((out[0].time, out[0].value), (origin + TimeDelta::microseconds(750), 7.0));
        assert_eq!((out[1].time, out[1].value), (origin + TimeDelta::microseconds(2_250), 22.0));
    }

    #[test]
    fn zero_width_keeps_input() {
        let points: Vec<ChartPoint> = (0..300).map(|i| at(i, 1.0)).collect();
        assert_eq!(average_buckets(&points, Duration::ZERO), points);
    }

    #[test]
    fn stride_keeps_every_nth_from_zero() {
        let points: Vec<u32> = (0..10).collect();
        assert_eq!(stride_sample(&points, 3), vec![0, 3, 6, 9]);
        assert_eq!(stride_sample(&points, 10), points);
        assert_eq!(stride_sample(&points, 0), points);
        // 10 / 6 = 1 → stride 1 keeps everything
        assert_eq!(stride_sample(&points, 6).len(), 10);
    }

    #[test]
    fn stride_by_key_limits_each_group() {
        let points: Vec<(u8, u32)> = (0..60).map(|i| (1, i)).chain((0..10).map(|i| (2, i))).collect();
        let out = stride_sample_by_key(&points, |p| p.0, 30);
        assert_eq!(out.iter().filter(|p| p.0 == 1).count(), 30);
        assert_eq!(out.iter().filter(|p| p.0 == 2).count(), 10);
    }

    #[test]
    fn window_widths() {
        assert_eq!(bucket_width(RecordWindow::Hours4), Duration::from_secs(60));
        assert_eq!(bucket_width(RecordWindow::Hours12), Duration::from_secs(300));
        assert_eq!(bucket_width(RecordWindow::Day1), Duration::from_secs(900));
        assert_eq!(bucket_width(RecordWindow::Days30), Duration::from_secs(3600));
        assert_eq!(
            Strategy::for_window(RecordWindow::Days7),
            Strategy::BucketAverage {
                width: Duration::from_secs(3600)
            }
        );
    }

    #[test]
    fn strategy_dispatch() {
        let points: Vec<ChartPoint> = (0..100).map(|i| at(i, 1.0)).collect();
        assert_eq!(Strategy::Stride { max: 10 }.apply(&points).len(), 10);
        assert_eq!(
            Strategy::BucketAverage {
                width: Duration::from_secs(60)
            }
            .apply(&points)
            .len(),
            100
        );
    }
}
