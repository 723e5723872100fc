//! `bounded-source` verifies that a source splits and reports progress correctly.

pub(crate) mod args;
pub(crate) mod verbose;

use std::fmt::Debug;
use std::hash::Hash;
use std::process;

use anyhow::Result;
use args::Args;
use bounded_source::exit_code::ExitCode;
use bounded_source::{
    BoundedSource, CountingSource, LineSource, Options, Output, Report, Suite, testing,
};
use clap::Parser;
use verbose::{Verbose, VerboseData};

fn main() -> process::ExitCode {
    env_logger::init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            // Help and version are printed to stdout, usage errors to stderr
            err.print().ok();
            return ExitCode::from(&err).into();
        }
    };

    match run(&args) {
        Ok(code) => code.into(),
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from_error(&err).into()
        }
    }
}

fn run(args: &Args) -> Result<ExitCode> {
    let options = args.to_options();
    let suite = args.to_suite()?;
    options.init_thread_pool_if_parallel()?;
    log::debug!("{options}");

    let report = match args.input() {
        Some(path) => {
            let source = LineSource::open(path, &options)?;
            let label = path.display().to_string();
            verify(args, &label, source, suite, &options)?
        }
        None => {
            let label = format!("count-{}", args.count());
            verify(args, &label, CountingSource::up_to(args.count()), suite, &options)?
        }
    };

    let mut output = Output::new(args.output())?;
    output.write_formatted_report(&report, options.format())?;

    if report.passed() {
        Ok(ExitCode::Success)
    } else {
        log::warn!("{} of {} checks failed", report.failures(), report.checks().len());
        Ok(ExitCode::DataError)
    }
}

fn verify<S>(args: &Args, label: &str, source: S, suite: Suite, options: &Options) -> Result<Report>
where
    S: BoundedSource,
    S::Item: Eq + Hash + Debug + Sync,
{
    if args.verbose() {
        let estimated_bytes = source.estimated_size_bytes(options)?;
        let data = VerboseData::new(label, estimated_bytes, &suite, options);
        Verbose::default().write_verbose_info(&data, options.format())?;
    }

    if suite.unsplittable() {
        suite.run(label, &testing::to_unsplittable_source(source), options)
    } else {
        suite.run(label, &source, options)
    }
}
