//! Converting many image files under one progress and cancellation scope.
//!
//! Files are handed out to a bounded set of worker threads.  Each worker
//! decodes its file once, encodes the requested sizes, and writes its own
//! output files.  Workers share only the work queue index, the
//! completed-file counter, the result slots and the table of claimed output
//! paths.

use crate::cancel::CancelToken;
use crate::config::{ConvertSettings, OutputMode};
use crate::converter::{
    per_size_file_name, single_file_name, write_output, Converter,
};
use crate::error::ConvertError;
use crate::progress::{BatchProgress, ProgressSink};
use crate::sizes::TargetSizes;
use crate::source::SourceImage;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

//===========================================================================//

/// A set of input files to convert into one output directory.
#[derive(Clone, Debug)]
pub struct BatchJob {
    inputs: Vec<PathBuf>,
    output_dir: PathBuf,
    sizes: TargetSizes,
    mode: OutputMode,
    cancel: CancelToken,
}

impl BatchJob {
    /// Creates a job writing one ICO file per input.  Returns a
    /// `ConvertError::Validation` if `inputs` is empty or `output_dir` is an
    /// empty path.
    pub fn new<I, P>(
        inputs: I,
        output_dir: impl Into<PathBuf>,
        sizes: TargetSizes,
    ) -> Result<BatchJob, ConvertError>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let inputs: Vec<PathBuf> =
            inputs.into_iter().map(Into::into).collect();
        if inputs.is_empty() {
            invalid_request!("Input file list must not be empty");
        }
        let output_dir = output_dir.into();
        if output_dir.as_os_str().is_empty() {
            invalid_request!("Output directory must not be empty");
        }
        Ok(BatchJob {
            inputs,
            output_dir,
            sizes,
            mode: OutputMode::SingleFile,
            cancel: CancelToken::new(),
        })
    }

    /// Sets whether each input produces one file or one file per size.
    pub fn with_mode(mut self, mode: OutputMode) -> BatchJob {
        self.mode = mode;
        self
    }

    /// Uses `cancel` as this job's cancellation flag.
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> BatchJob {
        self.cancel = cancel;
        self
    }

    /// Returns the input files, in caller order.
    pub fn inputs(&self) -> &[PathBuf] {
        &self.inputs
    }

    /// Returns the directory outputs are written to.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Returns the requested sizes.
    pub fn sizes(&self) -> &TargetSizes {
        &self.sizes
    }

    /// Returns the output mode.
    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Returns the job's cancellation flag.  Call `cancel()` on it (or on a
    /// clone) to stop the batch.
    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }
}

//===========================================================================//

/// The outcome of converting one input file of a batch.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct BatchResult {
    input: PathBuf,
    outputs: Vec<PathBuf>,
    success: bool,
    cancelled: bool,
    error: Option<String>,
    elapsed: Duration,
}

impl BatchResult {
    fn new(
        input: &Path,
        outputs: Vec<PathBuf>,
        outcome: Result<(), ConvertError>,
        elapsed: Duration,
    ) -> BatchResult {
        let (success, cancelled, error) = match outcome {
            Ok(()) => (true, false, None),
            Err(error) => {
                (false, error.is_cancelled(), Some(error.to_string()))
            }
        };
        BatchResult {
            input: input.to_path_buf(),
            outputs,
            success,
            cancelled,
            error,
            elapsed,
        }
    }

    /// Returns the input file this result is for.
    pub fn input(&self) -> &Path {
        &self.input
    }

    /// Returns the files written for this input.  For a failed per-size
    /// conversion this lists the files written before the failure.
    pub fn outputs(&self) -> &[PathBuf] {
        &self.outputs
    }

    /// Returns true if every output for this input was written.
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Returns true if this input was abandoned because of cancellation.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Returns the error message, if the conversion failed.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Returns the wall time spent on this input.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

//===========================================================================//

/// Why a batch didn't run to completion.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    /// The batch couldn't start: the output directory couldn't be created.
    #[error(transparent)]
    Rejected(#[from] ConvertError),

    /// The batch was cancelled.  `completed` holds, in input order, the
    /// results of every file that was started before the cancellation took
    /// effect; files that were never started are absent.
    #[error("batch conversion cancelled after {started} of {total} files")]
    Cancelled {
        /// Results of the files that were started.
        completed: Vec<BatchResult>,
        /// The number of files that were started.
        started: usize,
        /// The number of files in the batch.
        total: usize,
    },
}

impl BatchError {
    /// Returns true if this is a `BatchError::Cancelled`.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, BatchError::Cancelled { .. })
    }

    /// Returns the results recorded before cancellation, or an empty slice.
    pub fn completed(&self) -> &[BatchResult] {
        match self {
            BatchError::Cancelled { completed, .. } => completed,
            BatchError::Rejected(_) => &[],
        }
    }
}

//===========================================================================//

/// Converts batches of image files in parallel.
#[derive(Clone, Debug, Default)]
pub struct BatchConverter {
    converter: Converter,
}

impl BatchConverter {
    /// Creates a batch converter using the given settings.
    pub fn new(settings: ConvertSettings) -> BatchConverter {
        BatchConverter { converter: Converter::new(settings) }
    }

    /// Returns the settings this converter was created with.
    pub fn settings(&self) -> &ConvertSettings {
        self.converter.settings()
    }

    /// Returns the single-file converter used for each input.
    pub fn converter(&self) -> &Converter {
        &self.converter
    }

    /// Creates a job for `inputs` using the default sizes and output mode
    /// from the settings.
    pub fn job_with_defaults<I, P>(
        &self,
        inputs: I,
        output_dir: impl Into<PathBuf>,
    ) -> Result<BatchJob, ConvertError>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let settings = self.settings();
        let sizes = settings.default_target_sizes()?;
        Ok(BatchJob::new(inputs, output_dir, sizes)?
            .with_mode(settings.output_mode))
    }

    /// Runs `job`, returning one result per input file in the job's input
    /// order.
    ///
    /// A failure in one file (missing, undecodable, unwritable) is recorded
    /// in that file's result and doesn't affect the others.  Cancellation is
    /// checked before each file and before each size; once it is seen no new
    /// work starts, and the batch returns `BatchError::Cancelled`.
    pub fn convert<P>(
        &self,
        job: &BatchJob,
        progress: &P,
    ) -> Result<Vec<BatchResult>, BatchError>
    where
        P: ProgressSink + ?Sized,
    {
        let total = job.inputs.len();
        fs::create_dir_all(&job.output_dir)
            .map_err(|error| ConvertError::io(&job.output_dir, error))?;
        let plans = plan_outputs(job);
        let workers = self.settings().worker_limit(total);
        log::info!(
            "Converting {} files ({}) into {} with {} workers",
            total,
            job.sizes,
            job.output_dir.display(),
            workers
        );

        let state = BatchState::new(total);
        progress.report(BatchProgress {
            total_files: total,
            completed_files: 0,
            current_file: None,
        });
        thread::scope(|scope| {
            for _ in 0..workers {
                scope.spawn(|| self.run_worker(job, &plans, &state, progress));
            }
        });

        let results: Vec<BatchResult> = state
            .slots
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .into_iter()
            .flatten()
            .collect();
        let started = results.len();
        if started < total || results.iter().any(BatchResult::is_cancelled) {
            log::warn!("Batch cancelled after {} of {} files", started, total);
            return Err(BatchError::Cancelled {
                completed: results,
                started,
                total,
            });
        }
        let failed = results.iter().filter(|r| !r.is_success()).count();
        log::info!(
            "Batch finished: {} succeeded, {} failed",
            total - failed,
            failed
        );
        Ok(results)
    }

    fn run_worker<P>(
        &self,
        job: &BatchJob,
        plans: &[Result<Vec<PlannedOutput>, String>],
        state: &BatchState,
        progress: &P,
    ) where
        P: ProgressSink + ?Sized,
    {
        loop {
            if job.cancel.is_cancelled() {
                return;
            }
            let index = state.next.fetch_add(1, Ordering::SeqCst);
            if index >= job.inputs.len() || job.cancel.is_cancelled() {
                return;
            }
            let input = &job.inputs[index];
            state.report_started(input, progress);
            let result = self.process_file(job, index, &plans[index], state);
            state.record(index, result, progress);
        }
    }

    fn process_file(
        &self,
        job: &BatchJob,
        index: usize,
        plan: &Result<Vec<PlannedOutput>, String>,
        state: &BatchState,
    ) -> BatchResult {
        let input = &job.inputs[index];
        let start = Instant::now();
        let mut outputs = Vec::new();
        let outcome =
            self.convert_planned(job, index, plan, state, &mut outputs);
        let elapsed = start.elapsed();
        match outcome {
            Ok(()) => log::info!(
                "Converted {} in {:?}",
                input.display(),
                elapsed
            ),
            Err(ref error) => {
                log::warn!("Failed to convert {}: {}", input.display(), error)
            }
        }
        BatchResult::new(input, outputs, outcome, elapsed)
    }

    fn convert_planned(
        &self,
        job: &BatchJob,
        index: usize,
        plan: &Result<Vec<PlannedOutput>, String>,
        state: &BatchState,
        outputs: &mut Vec<PathBuf>,
    ) -> Result<(), ConvertError> {
        let plan = match plan {
            Ok(plan) => plan,
            Err(message) => invalid_request!("{}", message),
        };
        let input = &job.inputs[index];
        let source = SourceImage::open(input)?;
        // Only inputs that decoded get to claim output paths, so a missing
        // or broken file never blocks a sibling with the same stem.
        if let Err((owner, path)) = state.claims.claim(index, plan) {
            log::warn!(
                "{} would overwrite {}, already claimed by {}",
                input.display(),
                path.display(),
                job.inputs[owner].display()
            );
            invalid_request!(
                "Output {} collides with the output of {}",
                path.display(),
                job.inputs[owner].display()
            );
        }
        let encoder = self.converter.encoder();
        for output in plan.iter() {
            let data = encoder.encode_with_cancel(
                &source,
                &output.sizes,
                Some(&job.cancel),
            )?;
            write_output(&output.path, &data)?;
            outputs.push(output.path.clone());
        }
        Ok(())
    }
}

//===========================================================================//

struct PlannedOutput {
    sizes: TargetSizes,
    path: PathBuf,
}

// Works out every input's output paths up front.  Collisions between inputs
// are settled later by `OutputClaims`, once it is known which inputs decode.
fn plan_outputs(job: &BatchJob) -> Vec<Result<Vec<PlannedOutput>, String>> {
    job.inputs
        .iter()
        .map(|input| {
            let stem = match input.file_stem() {
                Some(stem) => stem,
                None => {
                    return Err(format!(
                        "Input path {:?} has no file name",
                        input
                    ))
                }
            };
            Ok(match job.mode {
                OutputMode::SingleFile => vec![PlannedOutput {
                    sizes: job.sizes.clone(),
                    path: job.output_dir.join(single_file_name(stem)),
                }],
                OutputMode::PerSize => job
                    .sizes
                    .split()
                    .into_iter()
                    .map(|sizes| {
                        let name = per_size_file_name(stem, sizes.first());
                        let path = job.output_dir.join(name);
                        PlannedOutput { path, sizes }
                    })
                    .collect(),
            })
        })
        .collect()
}

// Output paths taken so far, mapped to the index of the input owning them.
#[derive(Default)]
struct OutputClaims {
    owners: Mutex<HashMap<PathBuf, usize>>,
}

impl OutputClaims {
    // Claims every path in `plan` for input `index`, or none of them.  On
    // failure returns the owner of the first path held by another input.
    fn claim(
        &self,
        index: usize,
        plan: &[PlannedOutput],
    ) -> Result<(), (usize, PathBuf)> {
        let mut owners =
            self.owners.lock().unwrap_or_else(PoisonError::into_inner);
        for output in plan.iter() {
            match owners.get(&output.path) {
                Some(&owner) if owner != index => {
                    return Err((owner, output.path.clone()));
                }
                _ => {}
            }
        }
        for output in plan.iter() {
            owners.entry(output.path.clone()).or_insert(index);
        }
        Ok(())
    }
}

//===========================================================================//

struct BatchState {
    total: usize,
    next: AtomicUsize,
    completed: AtomicUsize,
    // Held while calling the progress sink, so reports never interleave.
    report_lock: Mutex<()>,
    slots: Mutex<Vec<Option<BatchResult>>>,
    claims: OutputClaims,
}

impl BatchState {
    fn new(total: usize) -> BatchState {
        BatchState {
            total,
            next: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
            report_lock: Mutex::new(()),
            slots: Mutex::new(vec![None; total]),
            claims: OutputClaims::default(),
        }
    }

    fn report_started<P>(&self, input: &Path, progress: &P)
    where
        P: ProgressSink + ?Sized,
    {
        let name = input
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let _guard =
            self.report_lock.lock().unwrap_or_else(PoisonError::into_inner);
        progress.report(BatchProgress {
            total_files: self.total,
            completed_files: self.completed.load(Ordering::SeqCst),
            current_file: Some(name),
        });
    }

    fn record<P>(&self, index: usize, result: BatchResult, progress: &P)
    where
        P: ProgressSink + ?Sized,
    {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)[index] =
            Some(result);
        let _guard =
            self.report_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let completed = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
        progress.report(BatchProgress {
            total_files: self.total,
            completed_files: completed,
            current_file: None,
        });
    }
}

//===========================================================================//

#[cfg(test)]
mod tests {
    use super::{plan_outputs, BatchJob, OutputClaims, PlannedOutput};
    use crate::config::OutputMode;
    use crate::error::ConvertError;
    use crate::sizes::TargetSizes;
    use std::path::PathBuf;

    fn sizes() -> TargetSizes {
        TargetSizes::new([16, 32]).unwrap()
    }

    #[test]
    fn job_rejects_empty_inputs() {
        let result = BatchJob::new(Vec::<PathBuf>::new(), "out", sizes());
        assert!(matches!(result, Err(ConvertError::Validation(_))));
        let result = BatchJob::new(["a.png"], "", sizes());
        assert!(matches!(result, Err(ConvertError::Validation(_))));
    }

    #[test]
    fn plans_single_file_outputs() {
        let job = BatchJob::new(["in/a.png", "in/b.jpg"], "out", sizes())
            .unwrap();
        let plans = plan_outputs(&job);
        let paths: Vec<PathBuf> = plans
            .iter()
            .map(|plan| plan.as_ref().unwrap()[0].path.clone())
            .collect();
        assert_eq!(
            paths,
            vec![PathBuf::from("out/a.ico"), PathBuf::from("out/b.ico")]
        );
    }

    #[test]
    fn plans_per_size_outputs() {
        let job = BatchJob::new(["in/a.png"], "out", sizes())
            .unwrap()
            .with_mode(OutputMode::PerSize);
        let plans = plan_outputs(&job);
        let plan = plans[0].as_ref().unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].path, PathBuf::from("out/a_16x16.ico"));
        assert_eq!(plan[0].sizes.as_slice(), &[16]);
        assert_eq!(plan[1].path, PathBuf::from("out/a_32x32.ico"));
        assert_eq!(plan[1].sizes.as_slice(), &[32]);
    }

    fn planned(paths: &[&str]) -> Vec<PlannedOutput> {
        paths
            .iter()
            .map(|path| PlannedOutput {
                sizes: TargetSizes::new([16]).unwrap(),
                path: PathBuf::from(path),
            })
            .collect()
    }

    #[test]
    fn same_stem_inputs_plan_the_same_path() {
        let job =
            BatchJob::new(["one/logo.png", "two/logo.jpg"], "out", sizes())
                .unwrap();
        for plan in plan_outputs(&job) {
            let path = &plan.as_ref().unwrap()[0].path;
            assert_eq!(path, &PathBuf::from("out/logo.ico"));
        }
    }

    #[test]
    fn first_claim_wins() {
        let claims = OutputClaims::default();
        assert!(claims.claim(3, &planned(&["out/logo.ico"])).is_ok());
        let (owner, path) =
            claims.claim(0, &planned(&["out/logo.ico"])).unwrap_err();
        assert_eq!(owner, 3);
        assert_eq!(path, PathBuf::from("out/logo.ico"));
        // The owner may claim its own paths again.
        assert!(claims.claim(3, &planned(&["out/logo.ico"])).is_ok());
    }

    #[test]
    fn failed_claim_takes_nothing() {
        let claims = OutputClaims::default();
        assert!(claims.claim(0, &planned(&["out/a_16x16.ico"])).is_ok());
        let plan = planned(&["out/b_16x16.ico", "out/a_16x16.ico"]);
        assert!(claims.claim(1, &plan).is_err());
        assert!(claims.claim(2, &planned(&["out/b_16x16.ico"])).is_ok());
    }

    #[test]
    fn duplicate_sizes_in_one_input_do_not_collide() {
        let job = BatchJob::new(
            ["a.png"],
            "out",
            TargetSizes::new([32, 32]).unwrap(),
        )
        .unwrap()
        .with_mode(OutputMode::PerSize);
        let plans = plan_outputs(&job);
        let plan = plans[0].as_ref().unwrap();
        assert_eq!(plan[0].path, plan[1].path);
        assert!(OutputClaims::default().claim(0, plan).is_ok());
    }
}

//===========================================================================//
