//! Integration tests for bitonic-pool
//!
//! These run the full engine: distributor thread, worker pool and kernel.

use bitonic_pool::engine::{
    kernel, Direction, NoopObserver, PhaseInfo, PhaseKind, PhaseObserver, SortEngine, Task,
};
use bitonic_pool::error::{ConfigError, FormatError, InputError, SortError};
use bitonic_pool::input::{random_values, read_array, write_array, InputFile};
use parking_lot::Mutex;
use std::thread;
use std::time::Duration;
use tempfile::tempdir;

fn sorted_copy(values: &[i32], direction: Direction) -> Vec<i32> {
    let mut expected = values.to_vec();
    expected.sort_unstable();
    if direction == Direction::Descending {
        expected.reverse();
    }
    expected
}

#[test]
fn test_all_layouts_sort_correctly() {
    for lg_size in 0..=10 {
        let size = 1usize << lg_size;
        let values = random_values(size, Some(lg_size as u64));

        for lg_workers in 0..=lg_size.min(4) {
            let workers = 1usize << lg_workers;
            for direction in [Direction::Ascending, Direction::Descending] {
                let engine = SortEngine::new(workers, direction).unwrap();
                let report = engine.sort(values.clone()).unwrap();

                assert!(
                    kernel::is_ordered(&report.values, direction),
                    "size {} workers {} {}",
                    size,
                    workers,
                    direction
                );
                assert_eq!(report.values, sorted_copy(&values, direction));
            }
        }
    }
}

#[test]
fn test_result_independent_of_worker_count() {
    let values = random_values(4096, Some(99));
    let results: Vec<Vec<i32>> = [1, 2, 4, 8]
        .iter()
        .map(|&w| {
            SortEngine::new(w, Direction::Ascending)
                .unwrap()
                .sort(values.clone())
                .unwrap()
                .values
        })
        .collect();

    for result in &results[1..] {
        assert_eq!(result, &results[0]);
    }
}

#[test]
fn test_descending_scenario() {
    let engine = SortEngine::new(2, Direction::Descending).unwrap();
    let report = engine.sort(vec![5, 3, 8, 1, 9, 2, 7, 4]).unwrap();
    assert_eq!(report.values, vec![9, 8, 7, 5, 4, 3, 2, 1]);
}

#[test]
fn test_one_element_per_worker() {
    let engine = SortEngine::new(4, Direction::Ascending).unwrap();
    let report = engine.sort(vec![1, 2, 3, 4]).unwrap();
    assert_eq!(report.values, vec![1, 2, 3, 4]);

    let kinds: Vec<PhaseKind> = report.phases.iter().map(|p| p.kind).collect();
    assert_eq!(kinds, vec![PhaseKind::Sort, PhaseKind::Merge, PhaseKind::Merge]);
    let widths: Vec<usize> = report.phases.iter().map(|p| p.width).collect();
    assert_eq!(widths, vec![1, 2, 4]);
}

#[test]
fn test_single_element_array() {
    let engine = SortEngine::new(1, Direction::Descending).unwrap();
    let report = engine.sort(vec![-5]).unwrap();
    assert_eq!(report.values, vec![-5]);
    assert_eq!(report.phase_count(), 0);
}

#[test]
fn test_invalid_layouts_rejected() {
    let engine = SortEngine::new(2, Direction::Ascending).unwrap();
    assert!(matches!(
        engine.sort(vec![1, 2, 3, 4, 5, 6]),
        Err(SortError::Format(FormatError::NotPowerOfTwo { size: 6 }))
    ));
    assert!(matches!(
        engine.sort(Vec::new()),
        Err(SortError::Format(FormatError::NotPowerOfTwo { size: 0 }))
    ));

    let engine = SortEngine::new(8, Direction::Ascending).unwrap();
    assert!(matches!(
        engine.sort(vec![1, 2, 3, 4]),
        Err(SortError::Config(ConfigError::UnevenPartition { size: 4, workers: 8 }))
    ));
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Event {
    Started { phase: u64, slot: usize },
    Finished { phase: u64, slot: usize },
    PhaseClosed { phase: u64 },
}

/// Records every hook and stalls one merge task
struct DelayingRecorder {
    events: Mutex<Vec<Event>>,
    delayed_slot: usize,
    delayed_phase: u64,
    delay: Duration,
}

impl PhaseObserver for DelayingRecorder {
    fn phase_finished(&self, info: &PhaseInfo, _elapsed: Duration) {
        self.events
            .lock()
            .push(Event::PhaseClosed { phase: info.phase });
    }

    fn task_started(&self, slot: usize, phase: u64, task: &Task) {
        self.events.lock().push(Event::Started { phase, slot });
        if slot == self.delayed_slot
            && phase == self.delayed_phase
            && matches!(task, Task::Merge { .. })
        {
            thread::sleep(self.delay);
        }
    }

    fn task_finished(&self, slot: usize, phase: u64, _task: &Task) {
        self.events.lock().push(Event::Finished { phase, slot });
    }
}

#[test]
fn test_next_phase_waits_for_delayed_merge() {
    let recorder = DelayingRecorder {
        events: Mutex::new(Vec::new()),
        delayed_slot: 1,
        delayed_phase: 1,
        delay: Duration::from_millis(100),
    };

    let engine = SortEngine::new(8, Direction::Descending).unwrap();
    let values = random_values(1024, Some(5));
    let report = engine.sort_observed(values.clone(), &recorder).unwrap();
    assert_eq!(report.values, sorted_copy(&values, Direction::Descending));

    let events = recorder.events.into_inner();

    // 8 sorts, then 4 + 2 + 1 merges.
    let started = events
        .iter()
        .filter(|e| matches!(e, Event::Started { .. }))
        .count();
    assert_eq!(started, 15);

    let delayed_done = events
        .iter()
        .position(|e| *e == Event::Finished { phase: 1, slot: 1 })
        .expect("delayed task finished");
    let next_start = events
        .iter()
        .position(|e| matches!(e, Event::Started { phase: 2, .. }))
        .expect("phase 2 started");
    assert!(delayed_done < next_start);

    // No task of phase k+1 starts before every task of phase k has finished.
    for (i, event) in events.iter().enumerate() {
        if let Event::Started { phase, .. } = event {
            let late_finish = events[i..].iter().any(|e| {
                matches!(e, Event::Finished { phase: earlier, .. } if earlier < phase)
            });
            assert!(!late_finish, "phase {} started before an earlier phase drained", phase);
        }
    }

    // Every phase closes after its last task finishes.
    for phase in 0..4u64 {
        let closed = events
            .iter()
            .position(|e| *e == Event::PhaseClosed { phase })
            .expect("phase closed");
        let last_finish = events
            .iter()
            .rposition(|e| matches!(e, Event::Finished { phase: p, .. } if *p == phase))
            .expect("phase had tasks");
        assert!(last_finish < closed);
    }
}

#[test]
fn test_sort_from_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("input.bin");
    let values = random_values(256, Some(11));
    write_array(&path, &values).unwrap();

    let input = InputFile::open(&path).unwrap();
    assert_eq!(input.len(), 256);

    let engine = SortEngine::new(4, Direction::Ascending).unwrap();
    let report = engine
        .sort_with(move || input.read_values(), &NoopObserver)
        .unwrap();
    assert_eq!(report.values, sorted_copy(&values, Direction::Ascending));
}

#[test]
fn test_unreadable_source_releases_workers() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("missing.bin");

    let engine = SortEngine::new(4, Direction::Descending).unwrap();
    let err = engine
        .sort_with(|| read_array(&missing), &NoopObserver)
        .unwrap_err();
    assert!(matches!(err, SortError::Input(InputError::Open { .. })));
}

#[test]
fn test_short_file_sorts_with_zero_tail() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("short.bin");

    let mut bytes = Vec::new();
    for word in [8i32, 5, -2, 7] {
        bytes.extend_from_slice(&word.to_ne_bytes());
    }
    std::fs::write(&path, bytes).unwrap();

    let values = read_array(&path).unwrap();
    let engine = SortEngine::new(2, Direction::Ascending).unwrap();
    let report = engine.sort(values).unwrap();
    assert_eq!(report.values, vec![-2, 0, 0, 0, 0, 0, 5, 7]);
}

#[test]
fn test_file_header_checked_against_pool() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("two.bin");
    write_array(&path, &[4, 9]).unwrap();

    let engine = SortEngine::new(4, Direction::Ascending).unwrap();
    let err = engine
        .sort_input(InputFile::open(&path).unwrap(), &NoopObserver)
        .unwrap_err();
    assert!(matches!(
        err,
        SortError::Config(ConfigError::UnevenPartition { size: 2, workers: 4 })
    ));

    let engine = SortEngine::new(2, Direction::Ascending).unwrap();
    let report = engine
        .sort_input(InputFile::open(&path).unwrap(), &NoopObserver)
        .unwrap();
    assert_eq!(report.values, vec![4, 9]);
}
