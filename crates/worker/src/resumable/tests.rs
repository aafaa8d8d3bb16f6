use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread::sleep;
use std::time::{Duration, Instant};

use livematch_primitives::Cancelled;
use parking_lot::Mutex;

use super::*;

fn wait_until(timeout: Duration, cond: impl Fn() -> bool) -> bool {
	let deadline = Instant::now() + timeout;
	while Instant::now() < deadline {
		if cond() {
			return true;
		}
		sleep(Duration::from_millis(5));
	}
	cond()
}

fn counting_loop(timeouts: DebounceTimeouts) -> (ResumableLoop, Arc<Mutex<Vec<Instant>>>) {
	let starts = Arc::new(Mutex::new(Vec::new()));
	let recorded = Arc::clone(&starts);
	let lp = ResumableLoop::new("counting", timeouts, move |_token| {
		recorded.lock().push(Instant::now());
		async { Ok(()) }
	})
	.expect("spawn loop");
	(lp, starts)
}

#[test]
fn zero_timeouts_inherit_previous_stage() {
	let t = DebounceTimeouts::from_millis(50, 0, 0);
	assert_eq!(t.stage(0), Duration::from_millis(50));
	assert_eq!(t.stage(1), Duration::from_millis(50));
	assert_eq!(t.stage(7), Duration::from_millis(50));

	let t = DebounceTimeouts::from_millis(10, 20, 0);
	assert_eq!(t.stage(2), Duration::from_millis(20));
}

#[test]
fn burst_of_restarts_runs_once() {
	let (lp, starts) = counting_loop(DebounceTimeouts::from_millis(33, 33, 444));

	for _ in 0..5 {
		lp.send_restart();
		sleep(Duration::from_millis(10));
	}
	let last_restart = Instant::now() - Duration::from_millis(10);

	assert!(wait_until(Duration::from_secs(2), || !starts.lock().is_empty()));
	sleep(Duration::from_millis(200));

	let starts = starts.lock();
	assert_eq!(starts.len(), 1, "debounce must coalesce the burst");
	let delay = starts[0].duration_since(last_restart);
	assert!(delay >= Duration::from_millis(33));
	assert!(delay < Duration::from_millis(400), "burst must not reach the settled stage: {delay:?}");
	drop(starts);
	lp.shutdown().expect("clean shutdown");
}

#[test]
fn stop_within_debounce_window_cancels_execution() {
	let (lp, starts) = counting_loop(DebounceTimeouts::from_millis(100, 100, 100));

	lp.send_restart();
	sleep(Duration::from_millis(20));
	lp.send_stop();
	sleep(Duration::from_millis(300));
	assert!(starts.lock().is_empty(), "stop must discard the pending run");
	assert_eq!(lp.state(), LoopState::Idle);

	lp.send_restart();
	assert!(wait_until(Duration::from_secs(2), || starts.lock().len() == 1));
	lp.shutdown().expect("clean shutdown");
}

/// Loop whose first `blocking` runs park until cancelled; later runs return at once.
fn parking_loop(timeouts: DebounceTimeouts, blocking: usize) -> (ResumableLoop, Arc<Mutex<Vec<Instant>>>) {
	let starts = Arc::new(Mutex::new(Vec::new()));
	let recorded = Arc::clone(&starts);
	let lp = ResumableLoop::new("parking", timeouts, move |token| {
		let run = {
			let mut starts = recorded.lock();
			starts.push(Instant::now());
			starts.len() - 1
		};
		async move {
			if run >= blocking {
				return Ok(());
			}
			while !token.is_cancelled() {
				tokio::time::sleep(Duration::from_millis(2)).await;
			}
			Err(Cancelled.into())
		}
	})
	.expect("spawn loop");
	(lp, starts)
}

#[test]
fn restart_sent_after_stop_still_runs() {
	let (lp, starts) = parking_loop(DebounceTimeouts::from_millis(20, 20, 20), 1);
	lp.send_redo_asap();
	assert!(wait_until(Duration::from_secs(1), || lp.state() == LoopState::Executing));

	lp.send_stop();
	lp.send_restart();
	assert!(wait_until(Duration::from_secs(2), || starts.lock().len() == 2), "restart after stop was dropped");
	lp.shutdown().expect("clean shutdown");
}

#[test]
fn redo_sent_after_stop_still_runs() {
	let (lp, starts) = parking_loop(DebounceTimeouts::from_millis(5_000, 5_000, 5_000), 1);
	lp.send_redo_asap();
	assert!(wait_until(Duration::from_secs(1), || lp.state() == LoopState::Executing));

	lp.send_stop();
	lp.send_redo_asap();
	assert!(wait_until(Duration::from_secs(2), || starts.lock().len() == 2));
	lp.shutdown().expect("clean shutdown");
}

#[test]
fn stop_sent_after_restart_wins() {
	let (lp, starts) = parking_loop(DebounceTimeouts::from_millis(20, 20, 20), 1);
	lp.send_redo_asap();
	assert!(wait_until(Duration::from_secs(1), || lp.state() == LoopState::Executing));

	lp.send_restart();
	lp.send_redo_asap();
	lp.send_stop();
	assert!(wait_until(Duration::from_secs(1), || lp.state() == LoopState::Idle));
	sleep(Duration::from_millis(200));
	assert_eq!(starts.lock().len(), 1);
	lp.shutdown().expect("clean shutdown");
}

#[test]
fn restarts_during_the_wait_hold_at_the_repeat_stage() {
	let (lp, starts) = counting_loop(DebounceTimeouts::from_millis(30, 30, 1_000));
	for _ in 0..3 {
		lp.send_restart();
		sleep(Duration::from_millis(10));
	}
	let last_restart = Instant::now() - Duration::from_millis(10);

	assert!(wait_until(Duration::from_secs(2), || !starts.lock().is_empty()));
	let delay = starts.lock()[0].duration_since(last_restart);
	assert!(delay >= Duration::from_millis(30), "waited {delay:?}");
	assert!(delay < Duration::from_millis(500), "escalated to the settled stage: {delay:?}");
	lp.shutdown().expect("clean shutdown");
}

#[test]
fn superseded_runs_escalate_the_opening_wait() {
	let (lp, starts) = parking_loop(DebounceTimeouts::from_millis(10, 10, 600), 2);
	lp.send_redo_asap();
	assert!(wait_until(Duration::from_secs(1), || starts.lock().len() == 1));

	// Cancels run 0; the next burst opens at `repeat`.
	lp.send_restart();
	assert!(wait_until(Duration::from_secs(1), || starts.lock().len() == 2));
	assert!(wait_until(Duration::from_secs(1), || lp.state() == LoopState::Executing));

	// Cancels run 1 as well; the next burst opens at `settled`.
	let sent = Instant::now();
	lp.send_restart();
	assert!(wait_until(Duration::from_secs(3), || starts.lock().len() == 3));
	assert!(starts.lock()[2].duration_since(sent) >= Duration::from_millis(500));

	// Run 2 finished, so the escalation is reset.
	assert!(wait_until(Duration::from_secs(1), || lp.state() == LoopState::Idle));
	let sent = Instant::now();
	lp.send_restart();
	assert!(wait_until(Duration::from_secs(2), || starts.lock().len() == 4));
	assert!(starts.lock()[3].duration_since(sent) < Duration::from_millis(400));
	lp.shutdown().expect("clean shutdown");
}

#[test]
fn redo_asap_skips_debounce() {
	let (lp, starts) = counting_loop(DebounceTimeouts::from_millis(5_000, 5_000, 5_000));
	let sent = Instant::now();
	lp.send_redo_asap();
	assert!(wait_until(Duration::from_secs(2), || starts.lock().len() == 1));
	assert!(starts.lock()[0].duration_since(sent) < Duration::from_millis(1_000));
	lp.shutdown().expect("clean shutdown");
}

#[test]
fn redo_asap_cuts_pending_debounce_short() {
	let (lp, starts) = counting_loop(DebounceTimeouts::from_millis(5_000, 5_000, 5_000));
	lp.send_restart();
	assert!(wait_until(Duration::from_secs(1), || lp.state() == LoopState::DebounceWaiting));
	lp.send_redo_asap();
	assert!(wait_until(Duration::from_secs(1), || starts.lock().len() == 1));
	lp.shutdown().expect("clean shutdown");
}

#[test]
fn restart_cancels_run_in_flight() {
	let runs = Arc::new(AtomicUsize::new(0));
	let saw_cancel = Arc::new(AtomicBool::new(false));
	let (runs_c, saw_c) = (Arc::clone(&runs), Arc::clone(&saw_cancel));

	let lp = ResumableLoop::new("cancel", DebounceTimeouts::from_millis(10, 10, 10), move |token| {
		let run = runs_c.fetch_add(1, Ordering::SeqCst);
		let saw = Arc::clone(&saw_c);
		async move {
			if run > 0 {
				return Ok(());
			}
			let deadline = Instant::now() + Duration::from_secs(5);
			while Instant::now() < deadline {
				if token.is_cancelled() {
					saw.store(true, Ordering::SeqCst);
					return Err(Cancelled.into());
				}
				tokio::time::sleep(Duration::from_millis(5)).await;
			}
			Ok(())
		}
	})
	.expect("spawn loop");

	lp.send_redo_asap();
	assert!(wait_until(Duration::from_secs(1), || lp.state() == LoopState::Executing));
	lp.send_restart();

	assert!(wait_until(Duration::from_secs(2), || runs.load(Ordering::SeqCst) == 2));
	assert!(saw_cancel.load(Ordering::SeqCst), "restart must cancel the in-flight token");
	lp.shutdown().expect("cancellation is not a fault");
}

#[test]
fn current_run_is_observable_while_executing() {
	let release = Arc::new(AtomicBool::new(false));
	let release_c = Arc::clone(&release);
	let lp = ResumableLoop::new("observe", DebounceTimeouts::default(), move |_token| {
		let release = Arc::clone(&release_c);
		async move {
			while !release.load(Ordering::SeqCst) {
				tokio::time::sleep(Duration::from_millis(2)).await;
			}
			Ok(())
		}
	})
	.expect("spawn loop");

	assert!(lp.current_run().is_none());
	lp.send_redo_asap();
	assert!(wait_until(Duration::from_secs(1), || lp.current_run().is_some()));
	let run = lp.current_run().expect("run in flight");
	assert!(!run.is_finished());
	assert!(!run.token().is_cancelled());
	let observer = lp.observer();
	assert_eq!(observer.state(), LoopState::Executing);
	assert!(observer.current_run().is_some());

	release.store(true, Ordering::SeqCst);
	assert!(wait_until(Duration::from_secs(1), || run.is_finished()));
	assert!(wait_until(Duration::from_secs(1), || lp.current_run().is_none()));
	lp.shutdown().expect("clean shutdown");
}

#[test]
fn failing_action_stops_the_worker() {
	let lp = ResumableLoop::new("failing", DebounceTimeouts::default(), |_token| async { Err(anyhow::anyhow!("boom")) }).expect("spawn loop");
	lp.send_redo_asap();
	assert!(wait_until(Duration::from_secs(2), || lp.state() == LoopState::Stopped));

	lp.send_restart();
	match lp.shutdown() {
		Err(LoopError::Action(err)) => assert_eq!(err.to_string(), "boom"),
		other => panic!("expected action failure, got {other:?}"),
	}
}

#[test]
fn cancellation_error_is_not_a_fault() {
	let runs = Arc::new(AtomicUsize::new(0));
	let runs_c = Arc::clone(&runs);
	let lp = ResumableLoop::new("cancelled", DebounceTimeouts::default(), move |_token| {
		runs_c.fetch_add(1, Ordering::SeqCst);
		async { Err(anyhow::Error::new(Cancelled).context("scan aborted")) }
	})
	.expect("spawn loop");

	lp.send_redo_asap();
	assert!(wait_until(Duration::from_secs(1), || runs.load(Ordering::SeqCst) == 1));
	lp.send_redo_asap();
	assert!(wait_until(Duration::from_secs(1), || runs.load(Ordering::SeqCst) == 2));
	assert_ne!(lp.state(), LoopState::Stopped);
	lp.shutdown().expect("clean shutdown");
}

#[test]
fn panicking_action_is_reported_on_shutdown() {
	fn explode() -> anyhow::Result<()> {
		panic!("loop-boom")
	}

	let lp = ResumableLoop::new("panicking", DebounceTimeouts::default(), |_token| async { explode() }).expect("spawn loop");
	lp.send_redo_asap();
	assert!(wait_until(Duration::from_secs(2), || lp.state() == LoopState::Stopped));
	match lp.shutdown() {
		Err(LoopError::Panicked(msg)) => assert!(msg.contains("loop-boom")),
		other => panic!("expected panic report, got {other:?}"),
	}
}
