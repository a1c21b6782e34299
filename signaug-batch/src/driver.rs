//! Batch augmentation driver
//!
//! A run discovers the dataset, prepares the mirrored output tree, optionally
//! copies the originals and then attempts every (video, transform) unit.
//! Output names are assigned in traversal order before any unit starts, so a
//! run with several workers names its outputs exactly like a sequential one.

use crate::discover::discover;
use crate::progress_tracker::ProgressTracker;
use crate::report::{RunSummary, UnitFailure};
use rayon::prelude::*;
use signaug_codec::Codec;
use signaug_core::{
    AugmentConfig, AugmentedAsset, CategoryTree, Error, NamingPolicy, Result, TransformSpec,
    VideoAsset,
};
use signaug_transform::{augment_video, LiftOptions, VideoStats};
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

/// One source video paired with one transform and its output path
#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    pub asset: VideoAsset,
    pub transform: TransformSpec,
    pub output: PathBuf,
}

/// Runs augmentation over a whole dataset tree
pub struct BatchDriver<C: Codec> {
    codec: C,
    config: AugmentConfig,
    naming: NamingPolicy,
}

impl<C: Codec> BatchDriver<C> {
    /// Creates a driver after validating `config`
    pub fn new(codec: C, config: AugmentConfig) -> Result<Self> {
        config.validate()?;
        let naming = NamingPolicy::new().with_extension(codec.output_extension());
        Ok(Self {
            codec,
            config,
            naming,
        })
    }

    /// Replaces the naming policy, e.g. to pin the run id
    pub fn with_naming(mut self, naming: NamingPolicy) -> Self {
        self.naming = naming;
        self
    }

    pub fn config(&self) -> &AugmentConfig {
        &self.config
    }

    pub fn naming(&self) -> &NamingPolicy {
        &self.naming
    }

    /// Runs the whole batch.
    ///
    /// Only a missing input root (or a worker pool that cannot start) fails
    /// the run; every unit failure is recorded in the summary instead.
    pub fn run(&self) -> Result<RunSummary> {
        let started = Instant::now();
        let tree = discover(&self.config)?;

        tracing::info!(
            run_id = self.naming.run_id(),
            categories = tree.category_count(),
            videos = tree.video_count(),
            transforms = self.config.transforms.len(),
            workers = self.config.workers,
            "starting augmentation run"
        );

        let mut summary = RunSummary {
            run_id: self.naming.run_id().to_string(),
            ..RunSummary::default()
        };

        if self.config.mirror {
            self.mirror(&tree);
        }
        if self.config.copy_originals {
            self.copy_originals(&tree, &mut summary);
        }

        let units = self.plan(&tree);
        let results = self.execute_all(&units)?;

        for (unit, result) in units.into_iter().zip(results) {
            match result {
                Ok(stats) => summary.record_success(AugmentedAsset {
                    path: unit.output,
                    source: unit.asset.path,
                    transform: unit.transform,
                    frames: stats.frames,
                    width: stats.width,
                    height: stats.height,
                }),
                Err(e) => summary.record_failure(UnitFailure::new(
                    unit.asset.path,
                    unit.transform.label(),
                    &e,
                )),
            }
        }

        summary.elapsed_secs = started.elapsed().as_secs_f64();
        tracing::info!(
            attempted = summary.attempted,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "augmentation run finished"
        );
        Ok(summary)
    }

    /// Lists every unit of `tree` in traversal order with its output path
    pub fn plan(&self, tree: &CategoryTree) -> Vec<Unit> {
        let mut units = Vec::with_capacity(tree.video_count() * self.config.transforms.len());
        for asset in tree.iter() {
            let dir = self.config.output_root.join(&asset.category);
            for transform in &self.config.transforms {
                units.push(Unit {
                    output: self.naming.output_path(&dir, asset, transform),
                    asset: asset.clone(),
                    transform: transform.clone(),
                });
            }
        }
        units
    }

    fn execute_all(&self, units: &[Unit]) -> Result<Vec<Result<VideoStats>>> {
        let tracker = ProgressTracker::new(units.len() as u64, "Augmenting");
        let interval = (units.len() as u64 / 20).max(1);
        let options = LiftOptions {
            fps: self.config.fps,
            timeout: self.config.unit_timeout(),
        };

        let run = |unit: &Unit| {
            let result = self.execute(unit, &options);
            tracker.finish_unit(result.is_ok(), interval);
            result
        };

        if self.config.workers <= 1 {
            return Ok(units.iter().map(run).collect());
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.workers)
            .thread_name(|i| format!("signaug-worker-{i}"))
            .build()
            .map_err(|e| Error::Config(format!("cannot start worker pool: {e}")))?;
        Ok(pool.install(|| units.par_iter().map(run).collect()))
    }

    fn execute(&self, unit: &Unit, options: &LiftOptions) -> Result<VideoStats> {
        if let Some(dir) = unit.output.parent() {
            fs::create_dir_all(dir).map_err(|e| Error::encode(dir, e))?;
        }

        let result = augment_video(
            &self.codec,
            &unit.asset.path,
            &unit.output,
            &unit.transform,
            options,
        );

        match &result {
            Ok(stats) => tracing::info!(
                source = %unit.asset.file_name(),
                transform = %unit.transform,
                output = %unit.output.display(),
                frames = stats.frames,
                "unit done"
            ),
            Err(e) => tracing::warn!(
                source = %unit.asset.path.display(),
                transform = %unit.transform,
                kind = %e.kind(),
                "skipping unit: {}",
                e
            ),
        }
        result
    }

    fn mirror(&self, tree: &CategoryTree) {
        let root = &self.config.output_root;
        if let Err(e) = fs::create_dir_all(root) {
            tracing::warn!(path = %root.display(), "could not create output root: {}", e);
            return;
        }
        for category in tree.categories() {
            let dir = root.join(category);
            if let Err(e) = fs::create_dir_all(&dir) {
                tracing::warn!(path = %dir.display(), "could not create category directory: {}", e);
            }
        }
    }

    fn copy_originals(&self, tree: &CategoryTree, summary: &mut RunSummary) {
        for asset in tree.iter() {
            let dir = self.config.output_root.join(&asset.category);
            let target = self.naming.original_path(&dir, asset);
            let copied = fs::create_dir_all(&dir).and_then(|_| fs::copy(&asset.path, &target));

            match copied {
                Ok(_) => {
                    tracing::debug!(source = %asset.file_name(), target = %target.display(), "copied original");
                    summary.originals_copied += 1;
                }
                Err(e) => {
                    let error = Error::Io(e);
                    tracing::warn!(source = %asset.path.display(), "could not copy original: {}", error);
                    summary
                        .copy_failures
                        .push(UnitFailure::new(&asset.path, "original", &error));
                }
            }
        }
    }
}
