//! Build command - Rewrite style modules and templates

use clap::Args;
use pochoir::config::load_config;
use pochoir::session::{BuildOptions, BuildSession};
use pochoir::tree::collect_inputs;
use std::path::PathBuf;
use std::time::Instant;

use super::{NamingArg, TemplateModeArg, TraversalArg};

#[derive(Args)]
pub struct BuildArgs {
    /// Project root holding `pochoir.config.json` (default: .)
    #[arg(default_value = ".")]
    pub root: PathBuf,

    /// Output directory (default: ./dist)
    #[arg(short, long, default_value = "./dist")]
    pub output: PathBuf,

    /// Namespace qualifying every module path (default: package.json name)
    #[arg(long)]
    pub namespace: Option<String>,

    /// Scoped name scheme
    #[arg(long, value_enum)]
    pub naming: Option<NamingArg>,

    /// Which style rules get their selectors rewritten
    #[arg(long, value_enum)]
    pub traversal: Option<TraversalArg>,

    /// How templates are read
    #[arg(long, value_enum)]
    pub template_mode: Option<TemplateModeArg>,

    /// Number of threads (default: number of CPUs)
    #[arg(short = 'j', long)]
    pub threads: Option<usize>,

    /// Write outputs even when some files failed
    #[arg(long)]
    pub continue_on_error: bool,
}

impl Default for BuildArgs {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            output: PathBuf::from("./dist"),
            namespace: None,
            naming: None,
            traversal: None,
            template_mode: None,
            threads: None,
            continue_on_error: false,
        }
    }
}

impl BuildArgs {
    /// Session options: config file first, flags on top.
    fn options(&self) -> (BuildOptions, PathBuf) {
        let config = load_config(&self.root);
        let mut options = BuildOptions::from_config(&config, &self.root);
        if let Some(namespace) = &self.namespace {
            options.namespace = namespace.clone();
        }
        if let Some(naming) = self.naming {
            options.naming = naming.into();
        }
        if let Some(traversal) = self.traversal {
            options.traversal = traversal.into();
        }
        if let Some(mode) = self.template_mode {
            options.template_mode = mode.into();
        }
        (options, config.styles_root(&self.root))
    }
}

pub fn run(args: BuildArgs) {
    let start = Instant::now();

    if let Some(threads) = args.threads {
        if let Err(e) = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
        {
            tracing::warn!("failed to configure thread pool: {}", e);
        }
    }

    let (options, styles_root) = args.options();
    let namespace = options.namespace.clone();
    tracing::debug!(
        "build: namespace {}, naming {}, traversal {}, templates {}",
        namespace,
        options.naming.as_str(),
        options.traversal.as_str(),
        options.template_mode.as_str()
    );

    let inputs = match collect_inputs(&styles_root) {
        Ok(inputs) => inputs,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    if inputs.is_empty() {
        eprintln!(
            "No .scoped.scss or .hbs files found under {}",
            styles_root.display()
        );
        std::process::exit(1);
    }

    let report = BuildSession::new(options).run(&inputs);

    for failure in &report.failures {
        eprintln!("Error rewriting {}: {}", failure.relative_path, failure.error);
    }
    for diagnostic in &report.diagnostics {
        tracing::warn!("{}", diagnostic);
    }

    let failed = report.failures.len();
    if failed == 0 || args.continue_on_error {
        if let Err(e) = report.write(&args.output, &namespace) {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }

    let success = report.file_count();
    let elapsed = start.elapsed();
    if failed > 0 {
        eprintln!(
            "✗ {} file(s) failed, {} rewritten in {:.4}s",
            failed,
            success,
            elapsed.as_secs_f64()
        );
        std::process::exit(1);
    }

    let file_word = if success == 1 { "file" } else { "files" };
    let warning_suffix = match report.diagnostics.len() {
        0 => String::new(),
        1 => ", 1 warning".to_string(),
        n => format!(", {} warnings", n),
    };
    eprintln!(
        "✓ {} {} rewritten in {:.4}s{}",
        success,
        file_word,
        elapsed.as_secs_f64(),
        warning_suffix
    );
}
