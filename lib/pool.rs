//! A bounded pool of worker threads that run shell commands.
//!
//! Modeled on the dispatch loop in the original worker implementation: each
//! worker sits in a loop pulling the next job off a shared channel and
//! pushing its result onto another, rather than being handed a closure to
//! run synchronously. The dispatcher never talks to a worker directly; it
//! only ever touches the two channels. Workers are scoped threads borrowing
//! the `Host` for the duration of one build, so no `Arc`/`'static` bound is
//! needed.

use crate::host::{CommandOutput, Host};
use crossbeam_channel::{Receiver, Sender};

/// One unit of work handed to a worker.
pub struct Job {
	pub node_name: String,
	pub command: String,
}

/// What a worker reports back once a [`Job`] finishes.
pub struct JobResult {
	pub node_name: String,
	pub output: CommandOutput,
}

/// Spawn `jobs` worker threads sharing `host`, run `dispatch` with channel
/// handles to feed them and collect their results, then join every worker
/// once `dispatch` returns (and its `Sender<Job>` is dropped).
pub fn run_with_pool<H, R>(
	host: &H,
	jobs: usize,
	dispatch: impl FnOnce(Sender<Job>, Receiver<JobResult>) -> R,
) -> R
where
	H: Host + Sync,
{
	let (job_tx, job_rx) = crossbeam_channel::unbounded::<Job>();
	let (result_tx, result_rx) = crossbeam_channel::unbounded::<JobResult>();

	crossbeam::thread::scope(|scope| {
		for _ in 0..jobs {
			let job_rx = job_rx.clone();
			let result_tx = result_tx.clone();
			scope.spawn(move |_| {
				while let Ok(job) = job_rx.recv() {
					let output = host.call(&job.command).unwrap_or_else(|e| CommandOutput {
						success: false,
						stdout: Vec::new(),
						stderr: format!("{}", e).into_bytes(),
					});
					if result_tx
						.send(JobResult {
							node_name: job.node_name,
							output,
						})
						.is_err()
					{
						break;
					}
				}
			});
		}
		drop(job_rx);
		drop(result_tx);

		dispatch(job_tx, result_rx)
	})
	.expect("a worker thread panicked")
}
