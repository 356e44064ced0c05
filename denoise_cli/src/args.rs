use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use denoising::{Backend, NonLocalMeansParams, RuntimeConfig, SlicePolicy};

use crate::job::{JobFile, RangeSpec};

#[derive(Parser, Debug)]
#[command(
    name = "denoise",
    version,
    about = "Denoise slices of a TIFF stack with Non-Local Means"
)]
pub struct Cli {
    /// Input TIFF stack (8 or 16 bit grayscale).
    #[arg(short, long)]
    pub input: PathBuf,

    /// Folder the denoised stack is written to.
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// YAML job file. Flags override its values.
    #[arg(long)]
    pub job: Option<PathBuf>,

    /// Compute backend: cpu, auto, vulkan, metal, dx12 or gl. Defaults to $DENOISE_BACKEND or auto.
    #[arg(long)]
    pub backend: Option<Backend>,

    /// Backend to try if the requested one fails to start.
    #[arg(long)]
    pub fallback: Option<Backend>,

    /// Folder native assets are staged into.
    #[arg(long)]
    pub staging_dir: Option<PathBuf>,

    /// Log runtime diagnostics at info level.
    #[arg(short, long)]
    pub verbose: bool,

    /// Filtering strength, > 0.
    #[arg(long)]
    pub h: Option<f64>,

    #[arg(long)]
    pub half_search_size: Option<u32>,

    #[arg(long)]
    pub half_block_size: Option<u32>,

    /// Slices to denoise: current, all, N or FIRST-LAST.
    #[arg(long)]
    pub range: Option<RangeSpec>,

    /// Copy unselected slices into the output instead of omitting them.
    #[arg(long)]
    pub pass_through: bool,

    /// Output title, also the output file name.
    #[arg(long)]
    pub title: Option<String>,

    #[arg(long, default_value = "info")]
    pub log_level: String,

    #[arg(long)]
    pub log_dir: Option<PathBuf>,
}

/// Job file and flags merged.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub runtime: RuntimeConfig,
    pub range: RangeSpec,
    pub nlm: NonLocalMeansParams,
    pub slice_policy: SlicePolicy,
    pub title: Option<String>,
}

impl Cli {
    pub fn settings(&self) -> Result<Settings> {
        let job = match &self.job {
            Some(path) => JobFile::load(path)?,
            None => JobFile::default(),
        };
        self.merge(job)
    }

    fn merge(&self, job: JobFile) -> Result<Settings> {
        let backend = match self.backend.or(job.backend) {
            Some(backend) => backend,
            None => Backend::from_env()?,
        };

        let mut runtime = RuntimeConfig::new(backend).with_verbose(self.verbose || job.verbose);
        runtime.fallback = self.fallback.or(job.fallback);
        runtime.staging_dir = self.staging_dir.clone().or(job.staging_dir);

        let mut nlm = job.nlm;
        if let Some(h) = self.h {
            nlm.h = h;
        }
        if let Some(size) = self.half_search_size {
            nlm.half_search_size = size;
        }
        if let Some(size) = self.half_block_size {
            nlm.half_block_size = size;
        }

        let slice_policy = if self.pass_through || job.pass_through_unselected {
            SlicePolicy::PassThrough
        } else {
            SlicePolicy::Omit
        };

        Ok(Settings {
            runtime,
            range: self.range.or(job.range).unwrap_or_default(),
            nlm,
            slice_policy,
            title: self.title.clone().or(job.title),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("denoise").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn flags_without_job() {
        let cli = parse(&["-i", "in.tif", "--backend", "cpu", "--h", "1.5", "--range", "1-3"]);
        let settings = cli.merge(JobFile::default()).unwrap();

        assert_eq!(settings.runtime.backend, Backend::Cpu);
        assert_eq!(settings.nlm, NonLocalMeansParams::new(1.5));
        assert_eq!(settings.range, RangeSpec::Slices { first: 1, last: 3 });
        assert_eq!(settings.slice_policy, SlicePolicy::Omit);
        assert!(settings.title.is_none());
    }

    #[test]
    fn flags_override_job_values() {
        let job = JobFile::parse(
            "backend: vulkan\nfallback: cpu\nnlm:\n  h: 3.0\n  half_search_size: 7\nrange: all\npass_through_unselected: true\n",
        )
        .unwrap();
        let cli = parse(&["-i", "in.tif", "--backend", "CPU", "--h", "0.5"]);
        let settings = cli.merge(job).unwrap();

        assert_eq!(settings.runtime.backend, Backend::Cpu);
        assert_eq!(settings.runtime.fallback, Some(Backend::Cpu));
        assert_eq!(settings.nlm.h, 0.5);
        assert_eq!(settings.nlm.half_search_size, 7);
        assert_eq!(settings.range, "all".parse::<RangeSpec>().unwrap());
        assert_eq!(settings.slice_policy, SlicePolicy::PassThrough);
    }

    #[test]
    fn rejects_unknown_backend() {
        let result = Cli::try_parse_from(["denoise", "-i", "in.tif", "--backend", "cuda"]);
        assert!(result.is_err());
    }

    #[test]
    fn job_file_is_loaded_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let job = dir.path().join("job.yaml");
        std::fs::write(&job, "backend: cpu\ntitle: result\n").unwrap();

        let cli = parse(&["-i", "in.tif", "--job", job.to_str().unwrap()]);
        let settings = cli.settings().unwrap();
        assert_eq!(settings.runtime.backend, Backend::Cpu);
        assert_eq!(settings.title.as_deref(), Some("result"));
        assert_eq!(settings.range, RangeSpec::default());
    }
}
